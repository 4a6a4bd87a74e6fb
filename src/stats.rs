//! Per-worker progress counters, folded at shutdown (spec §4.6
//! "Completion and reporting").

/// One worker's tally, folded with [`Stats::merge`] by the supervisor
/// once every worker thread has joined.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stats {
    pub pairs_seen: u64,
    pub ends_aligned: u64,
    pub ends_below_threshold: u64,
    pub ends_seed_exhausted: u64,
    pub events_emitted: u64,
}

impl Stats {
    pub fn merge(&mut self, other: &Stats) {
        self.pairs_seen += other.pairs_seen;
        self.ends_aligned += other.ends_aligned;
        self.ends_below_threshold += other.ends_below_threshold;
        self.ends_seed_exhausted += other.ends_seed_exhausted;
        self.events_emitted += other.events_emitted;
    }

    pub fn log_summary(&self) {
        log::info!(
            "pairs_seen={} ends_aligned={} ends_below_threshold={} ends_seed_exhausted={} events_emitted={}",
            self.pairs_seen,
            self.ends_aligned,
            self.ends_below_threshold,
            self.ends_seed_exhausted,
            self.events_emitted,
        );
    }
}
