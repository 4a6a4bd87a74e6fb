use std::fs::{self, File};
use std::io::BufWriter;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use log::info;

use gencall::alphabet;
use gencall::catalogue_parsing::read_catalogue;
use gencall::cli::Cli;
use gencall::context::{Context, RunParameters};
use gencall::error;
use gencall::fasta_parsing::read_fasta;
use gencall::fastq_parsing::read_fastq_pairs;
use gencall::fm_index;
use gencall::output;
use gencall::pipeline;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    anyhow::ensure!(cli.process_parallelism >= 1, "--process-parallelism must be at least 1");

    let reference = read_fasta(&cli.genome).with_context(|| format!("loading {}", cli.genome.display()))?;
    let catalogue =
        read_catalogue(&cli.variants).with_context(|| format!("loading {}", cli.variants.display()))?;
    let reverse_fm = load_or_build_index(&cli, reference.bases())?;

    let parameters = RunParameters {
        error_rate: cli.error_rate,
        mutation_rate: cli.mutation_rate,
        max_match: cli.max_match,
        distance_threshold_override: cli.distance_threshold,
        iter_num_override: cli.iter_num,
        seed_start: cli.seed_start,
        seed_step: cli.seed_step,
        rng_seed: cli.rng_seed,
    };
    let context = Arc::new(Context {
        reference,
        reverse_fm,
        catalogue,
        parameters,
    });

    info!(
        "loaded reference ({} bp) and catalogue ({} loci)",
        context.reference.len(),
        context.catalogue.len()
    );

    let read_pairs = read_fastq_pairs(&cli.reads1, &cli.reads2)
        .with_context(|| format!("loading {} / {}", cli.reads1.display(), cli.reads2.display()))?;
    info!("loaded {} read pairs", read_pairs.len());

    let worker_count = cli.workers.unwrap_or_else(num_cpus_fallback);
    let (store, stats) = pipeline::run(
        Arc::clone(&context),
        read_pairs,
        cli.seed_mode.into(),
        cli.process_parallelism,
        worker_count,
        cli.channel_capacity,
    );
    stats.log_summary();

    let output_file = File::create(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;
    output::write_calls(BufWriter::new(output_file), &store, &context.reference)
        .with_context(|| format!("writing {}", cli.output.display()))?;

    info!("{} positions called", store.len());
    Ok(())
}

/// Loads the cached FM-index from `cli.index_dir` if present, otherwise
/// builds it from `reference_bases` and writes the cache for next time
/// (spec §6 "Forward and reverse FM-index directories").
fn load_or_build_index(cli: &Cli, reference_bases: &[u8]) -> Result<fm_index::FmIndex> {
    let cache_path = cli.index_dir.join("reverse.bin");
    if cache_path.exists() {
        info!("loading cached FM-index from {}", cache_path.display());
        let bytes = fs::read(&cache_path).with_context(|| format!("reading {}", cache_path.display()))?;
        let (index, _) = bincode::decode_from_slice(&bytes, bincode::config::standard())
            .map_err(error::GencallError::from)
            .with_context(|| format!("decoding {}", cache_path.display()))?;
        return Ok(index);
    }

    info!("building FM-index (no cache at {})", cache_path.display());
    let mut reversed: Vec<u8> = reference_bases.iter().rev().copied().collect();
    reversed.push(alphabet::SENTINEL);
    let index = fm_index::FmIndex::build(&reversed, fm_index::DEFAULT_CHECKPOINT_INTERVAL);

    fs::create_dir_all(&cli.index_dir)
        .with_context(|| format!("creating {}", cli.index_dir.display()))?;
    let bytes = bincode::encode_to_vec(&index, bincode::config::standard())
        .map_err(error::GencallError::from)?;
    fs::write(&cache_path, bytes).with_context(|| format!("writing {}", cache_path.display()))?;

    Ok(index)
}

fn num_cpus_fallback() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
