//! The concurrent pipeline (spec §4.6): `process_parallelism` producer
//! shards, N extender workers, one posterior-updater consumer, joined
//! by bounded channels.
//!
//! The spec's producer/worker acknowledgement handshake exists to let
//! the producer reuse a single scratch buffer instead of allocating one
//! per read; its design notes explicitly allow the alternative of
//! handing ownership of a freshly allocated record per read "at the
//! cost of allocator pressure" as long as a worker never reads a
//! half-written record. `crossbeam_channel::Sender::send` already
//! transfers ownership, so that invariant holds with no extra
//! handshake — the simpler of the two licensed designs.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::bounded;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::buffers::WorkerBuffers;
use crate::context::Context;
use crate::distance::{distance_threshold, distance_threshold_cost};
use crate::driver::{self, AlignOutcome, AnchorMode};
use crate::events::AlleleEvent;
use crate::fastq_parsing::ReadPair;
use crate::posterior::PosteriorStore;
use crate::stats::Stats;

/// Runs the full pipeline over `read_pairs` and returns the accumulated
/// posterior store plus folded worker statistics (spec §4.6
/// "Completion and reporting").
///
/// `process_parallelism` is distinct from `worker_count` (spec §6): it
/// is the number of independent producer threads the input read pairs
/// are sharded across, each feeding the same worker pool and the same
/// consumer, so the posterior store is built from a single, correctly
/// ordered event stream regardless of how many shards fed it.
pub fn run(
    context: Arc<Context>,
    read_pairs: Vec<ReadPair>,
    anchor_mode: AnchorMode,
    process_parallelism: usize,
    worker_count: usize,
    channel_capacity: usize,
) -> (PosteriorStore, Stats) {
    let (read_tx, read_rx) = bounded::<ReadPair>(channel_capacity);
    let (event_tx, event_rx) = bounded::<AlleleEvent>(channel_capacity);

    let shard_count = process_parallelism.max(1);
    let shard_size = ((read_pairs.len() + shard_count - 1) / shard_count).max(1);
    let producers: Vec<_> = read_pairs
        .chunks(shard_size)
        .map(|chunk| chunk.to_vec())
        .map(|shard| {
            let read_tx = read_tx.clone();
            thread::spawn(move || {
                for pair in shard {
                    if read_tx.send(pair).is_err() {
                        break; // every worker has already gone away.
                    }
                }
                // Dropping this clone of `read_tx` when the thread exits
                // only closes the channel once every producer has done
                // the same.
            })
        })
        .collect();
    drop(read_tx);

    let worker_handles: Vec<_> = (0..worker_count.max(1))
        .map(|worker_index| {
            let context = Arc::clone(&context);
            let read_rx = read_rx.clone();
            let event_tx = event_tx.clone();
            thread::spawn(move || worker_loop(context, read_rx, event_tx, anchor_mode, worker_index))
        })
        .collect();
    drop(read_rx);
    drop(event_tx);

    let consumer = thread::spawn(move || {
        let mut store = PosteriorStore::new();
        while let Ok(event) = event_rx.recv() {
            let catalogue = &context.catalogue;
            let reference = &context.reference;
            store.apply_event(&event, catalogue, || {
                reference.base_at(event.position).unwrap_or(b'N')
            });
        }
        store
    });

    for producer in producers {
        producer.join().expect("producer thread panicked");
    }

    let mut stats = Stats::default();
    for handle in worker_handles {
        let worker_stats = handle.join().expect("worker thread panicked");
        stats.merge(&worker_stats);
    }

    let store = consumer.join().expect("consumer thread panicked");
    (store, stats)
}

fn worker_loop(
    context: Arc<Context>,
    read_rx: crossbeam_channel::Receiver<ReadPair>,
    event_tx: crossbeam_channel::Sender<AlleleEvent>,
    anchor_mode: AnchorMode,
    worker_index: usize,
) -> Stats {
    let params = context.parameters;
    let max_read_len = 512; // generous fixed ceiling; buffers grow on demand regardless.
    let mut buffers = WorkerBuffers::new(max_read_len);
    let mut rng = StdRng::seed_from_u64(params.rng_seed.wrapping_add(worker_index as u64));
    let mut stats = Stats::default();

    while let Ok(pair) = read_rx.recv() {
        stats.pairs_seen += 1;

        buffers.end1.load(&pair.end1.bases, &pair.end1.qualities);
        buffers.end2.load(&pair.end2.bases, &pair.end2.qualities);

        for end_index in 0..2 {
            let read_len = if end_index == 0 {
                buffers.end1.read_len()
            } else {
                buffers.end2.read_len()
            };
            if read_len == 0 {
                continue;
            }
            let distance_star_counts = distance_threshold(read_len, params.error_rate, params.mutation_rate);
            let distance_star = params.distance_threshold_override.unwrap_or_else(|| {
                distance_threshold_cost(read_len, params.error_rate, params.mutation_rate)
            });
            let iter_num = params
                .iter_num_override
                .unwrap_or_else(|| crate::distance::default_iteration_count(distance_star_counts));

            let end = if end_index == 0 { &buffers.end1 } else { &buffers.end2 };
            let result = driver::align_one_end(
                &context.reference,
                &context.reverse_fm,
                &context.catalogue,
                end,
                &mut buffers.left,
                &mut buffers.right,
                &mut buffers.positions,
                anchor_mode,
                params.seed_start,
                params.seed_step,
                params.max_match,
                distance_star,
                iter_num,
                &mut rng,
            );

            match result {
                AlignOutcome::Accepted(alignment) => {
                    stats.ends_aligned += 1;
                    for event in alignment.events {
                        stats.events_emitted += 1;
                        if event_tx.send(event).is_err() {
                            break; // consumer has gone away; keep draining reads.
                        }
                    }
                }
                AlignOutcome::BelowThreshold => stats.ends_below_threshold += 1,
                AlignOutcome::SeedExhausted => stats.ends_seed_exhausted += 1,
            }
        }
    }

    stats
}
