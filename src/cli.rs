//! Command-line surface (spec §6 "CLI surface").

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Variant-aware paired-end short-read aligner.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Reference genome FASTA file.
    #[arg(long)]
    pub genome: PathBuf,

    /// Variant catalogue file.
    #[arg(long)]
    pub variants: PathBuf,

    /// Directory for the cached FM-index; built and written here on a
    /// miss, loaded from here on a hit.
    #[arg(long)]
    pub index_dir: PathBuf,

    /// Mate 1 FASTQ file.
    #[arg(long)]
    pub reads1: PathBuf,

    /// Mate 2 FASTQ file.
    #[arg(long)]
    pub reads2: PathBuf,

    /// Output file for variant calls.
    #[arg(long)]
    pub output: PathBuf,

    /// Seed anchor selection strategy.
    #[arg(long, value_enum, default_value_t = SeedMode::Random)]
    pub seed_mode: SeedMode,

    /// Starting anchor position, read offset (spec §4.4).
    #[arg(long, default_value_t = 0)]
    pub seed_start: usize,

    /// Deterministic anchor step (spec §4.4, mode 2 only).
    #[arg(long, default_value_t = 1)]
    pub seed_step: usize,

    /// Seed for the anchor PRNG (spec §6 reproducibility note).
    #[arg(long, default_value_t = 0)]
    pub rng_seed: u64,

    /// Number of independent producer shards the read pairs are split
    /// across, distinct from `--workers` (spec §6): each shard feeds the
    /// same worker pool and posterior consumer, so raising it increases
    /// read-ingestion concurrency without changing extension
    /// concurrency.
    #[arg(long, default_value_t = 1)]
    pub process_parallelism: usize,

    /// Worker thread count; defaults to available parallelism.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Maximum candidate positions accepted per seed hit.
    #[arg(long, default_value_t = 50)]
    pub max_match: usize,

    /// Expected per-base sequencing error rate, for D* (spec §4.3).
    #[arg(long, default_value_t = 0.01)]
    pub error_rate: f64,

    /// Expected per-base variant rate, for D* (spec §4.3).
    #[arg(long, default_value_t = 0.001)]
    pub mutation_rate: f64,

    /// Overrides the computed distance threshold D*, in the extender's
    /// cost units (spec §4.3; see `distance::distance_threshold_cost`).
    #[arg(long)]
    pub distance_threshold: Option<f64>,

    /// Overrides the default iteration count (spec §4.4 "a small factor
    /// of D* + 1").
    #[arg(long)]
    pub iter_num: Option<usize>,

    /// Bounded channel capacity between pipeline stages.
    #[arg(long, default_value_t = 256)]
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeedMode {
    /// Uniform random anchor in [0, R) (spec §4.4 mode 1).
    Random,
    /// Deterministic p <- seed_start + iteration * seed_step (mode 2).
    Deterministic,
}

impl From<SeedMode> for crate::driver::AnchorMode {
    fn from(mode: SeedMode) -> Self {
        match mode {
            SeedMode::Random => crate::driver::AnchorMode::Random,
            SeedMode::Deterministic => crate::driver::AnchorMode::Deterministic,
        }
    }
}
