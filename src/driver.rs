//! The per-end driver (spec §4.4): at each anchor, tries the forward
//! read first and only falls back to the reverse-complement read when
//! the forward attempt does not yield an accepted alignment, stopping
//! at the first iteration that does.

use rand::rngs::StdRng;
use rand::Rng;

use crate::buffers::FlankMatrices;
use crate::events::AlleleEvent;
use crate::extender::{self, ExtensionResult};
use crate::fm_index::FmIndex;
use crate::reference::{ReadEndBuffers, Reference};
use crate::seed_finder;
use crate::variant_catalogue::VariantCatalogue;

/// How the driver picks the next anchor position (spec §6 `--seed-mode`).
#[derive(Debug, Clone, Copy)]
pub enum AnchorMode {
    /// `p <- seed_start + iteration * step`, clamped to the last valid
    /// read offset.
    Deterministic,
    /// Uniformly random offset in `[0, read_len)`, drawn from the
    /// worker's shared RNG (spec §6 `--rng-seed`).
    Random,
}

fn anchor_for_iteration(
    mode: AnchorMode,
    iteration: usize,
    seed_start: usize,
    step: usize,
    read_len: usize,
    rng: &mut StdRng,
) -> usize {
    match mode {
        AnchorMode::Deterministic => {
            (seed_start + iteration * step).min(read_len.saturating_sub(1))
        }
        AnchorMode::Random => rng.gen_range(0..read_len.max(1)),
    }
}

/// The winning alignment for one read end: its accumulated distance and
/// the allele events gathered from both flanks.
#[derive(Debug, Clone)]
pub struct DriverResult {
    pub distance: f64,
    pub events: Vec<AlleleEvent>,
}

/// How a read end's anchor sweep ended, distinguishing "never found a
/// seed to extend" from "extended but never cleared D*" (spec §4.4 /
/// §4.6 completion counters).
#[derive(Debug, Clone)]
pub enum AlignOutcome {
    Accepted(DriverResult),
    BelowThreshold,
    /// Every iteration's seed lookup came back `!ok` (no match, or more
    /// candidate positions than `max_match`), so extension was never
    /// even attempted.
    SeedExhausted,
}

/// Drives one read end to an alignment, per spec §4.4. `end` must
/// already be loaded (`ReadEndBuffers::load`); `distance_star` is the
/// `D*` threshold for this read's length (spec §4.3).
#[allow(clippy::too_many_arguments)]
pub fn align_one_end(
    reference: &Reference,
    reverse_fm: &FmIndex,
    catalogue: &VariantCatalogue,
    end: &ReadEndBuffers,
    left_buf: &mut FlankMatrices,
    right_buf: &mut FlankMatrices,
    positions: &mut Vec<usize>,
    mode: AnchorMode,
    seed_start: usize,
    step: usize,
    max_match: usize,
    distance_star: f64,
    iter_num: usize,
    rng: &mut StdRng,
) -> AlignOutcome {
    let read_len = end.read_len();
    if read_len == 0 {
        return AlignOutcome::SeedExhausted;
    }

    let mut any_seed_found = false;

    for iteration in 0..iter_num {
        let p = anchor_for_iteration(mode, iteration, seed_start, step, read_len, rng);

        let forward = try_strand(
            reference,
            reverse_fm,
            catalogue,
            left_buf,
            right_buf,
            positions,
            &end.bases,
            &end.qualities,
            &end.reverse,
            read_len,
            p,
            max_match,
            distance_star,
        );

        // The reverse-complement strand is only attempted when the
        // forward strand did not already produce an accepted alignment
        // (spec §4.4 steps 1-2): trying it unconditionally would let a
        // worse-but-accepted reverse-complement hit race a better
        // forward one for no benefit.
        let candidate = match forward {
            Some(ref f) if f.accepted => forward,
            _ => {
                let reverse_complement = try_strand(
                    reference,
                    reverse_fm,
                    catalogue,
                    left_buf,
                    right_buf,
                    positions,
                    &end.reverse_complement,
                    &end.reversed_quality,
                    &end.complement,
                    read_len,
                    p,
                    max_match,
                    distance_star,
                );
                match (forward, reverse_complement) {
                    (Some(f), Some(r)) => Some(if f.distance <= r.distance { f } else { r }),
                    (Some(f), None) => Some(f),
                    (None, Some(r)) => Some(r),
                    (None, None) => None,
                }
            }
        };

        let Some(candidate) = candidate else {
            continue;
        };
        any_seed_found = true;
        // Spec §3 invariant: "allele events are emitted only when the
        // full-read alignment distance d <= D*" — a rejected extension
        // is discarded outright, never kept as a fallback "best effort"
        // result, so a read that never clears the threshold yields no
        // events at all (spec §8 scenario E6).
        if !candidate.accepted {
            continue;
        }
        let ExtensionResult {
            distance,
            left_events,
            right_events,
            ..
        } = candidate;
        let mut events = left_events;
        events.extend(right_events);
        return AlignOutcome::Accepted(DriverResult { distance, events });
    }

    if any_seed_found {
        AlignOutcome::BelowThreshold
    } else {
        AlignOutcome::SeedExhausted
    }
}

/// Seeds and extends one strand's orientation of the read. `read`/`qual`
/// are already in the orientation to align against the forward
/// reference; `rev_read` is `read` reversed, for the backward search
/// (spec §4.2).
#[allow(clippy::too_many_arguments)]
fn try_strand(
    reference: &Reference,
    reverse_fm: &FmIndex,
    catalogue: &VariantCatalogue,
    left_buf: &mut FlankMatrices,
    right_buf: &mut FlankMatrices,
    positions: &mut Vec<usize>,
    read: &[u8],
    qual: &[u8],
    rev_read: &[u8],
    read_len: usize,
    p: usize,
    max_match: usize,
    distance_star: f64,
) -> Option<ExtensionResult> {
    let seed = seed_finder::find_seed(
        reverse_fm,
        rev_read,
        read_len,
        reference.len(),
        p,
        max_match,
        positions,
    );
    if !seed.ok {
        return None;
    }

    positions
        .iter()
        .map(|&anchor| {
            extender::extend(
                reference,
                catalogue,
                read,
                qual,
                seed.s,
                seed.e,
                anchor,
                distance_star,
                left_buf,
                right_buf,
            )
        })
        .min_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::SENTINEL;
    use rand::SeedableRng;

    fn reverse_fm_of(forward_reference: &[u8]) -> FmIndex {
        let mut reversed: Vec<u8> = forward_reference.iter().rev().copied().collect();
        reversed.push(SENTINEL);
        FmIndex::build(&reversed, 4)
    }

    #[test]
    fn deterministic_driver_finds_a_substitution() {
        let reference_bases = b"ACGTACGTACGTACGTACGT".to_vec();
        let reference = Reference::new(reference_bases.clone());
        let reverse_fm = reverse_fm_of(&reference_bases);
        let catalogue = VariantCatalogue::new(vec![]);

        let mut read_bases = reference_bases[0..16].to_vec();
        read_bases[6] = b'T'; // reference has 'G' at position 6
        let qualities = vec![b'I'; read_bases.len()];

        let mut end = ReadEndBuffers::default();
        end.load(&read_bases, &qualities);

        let mut left = FlankMatrices::default();
        let mut right = FlankMatrices::default();
        let mut positions = Vec::new();
        let mut rng = StdRng::seed_from_u64(1);

        // A single Q40 substitution costs roughly one
        // `reference_mismatch_cost` unit at the default error rate; give
        // the extension a generous cost budget so it is accepted.
        let distance_star = crate::distance::reference_mismatch_cost(0.01) * 4.0;

        let result = align_one_end(
            &reference,
            &reverse_fm,
            &catalogue,
            &end,
            &mut left,
            &mut right,
            &mut positions,
            AnchorMode::Deterministic,
            0,
            3,
            50,
            distance_star,
            8,
            &mut rng,
        );

        let result = match result {
            AlignOutcome::Accepted(result) => result,
            other => panic!("expected an accepted alignment, got {other:?}"),
        };
        assert!(result.events.iter().any(|e| e.position == 6 && e.bases == b"T"));
    }

    #[test]
    fn random_mode_is_reproducible_given_the_same_seed() {
        let reference_bases = b"ACGTACGTACGTACGTACGTACGT".to_vec();
        let reference = Reference::new(reference_bases.clone());
        let reverse_fm = reverse_fm_of(&reference_bases);
        let catalogue = VariantCatalogue::new(vec![]);

        let read_bases = reference_bases[4..20].to_vec();
        let qualities = vec![b'I'; read_bases.len()];
        let mut end = ReadEndBuffers::default();
        end.load(&read_bases, &qualities);

        let distance_star = crate::distance::reference_mismatch_cost(0.01) * 4.0;
        let run = |seed: u64| {
            let mut left = FlankMatrices::default();
            let mut right = FlankMatrices::default();
            let mut positions = Vec::new();
            let mut rng = StdRng::seed_from_u64(seed);
            align_one_end(
                &reference,
                &reverse_fm,
                &catalogue,
                &end,
                &mut left,
                &mut right,
                &mut positions,
                AnchorMode::Random,
                0,
                1,
                50,
                distance_star,
                8,
                &mut rng,
            )
        };

        let distance = |outcome: AlignOutcome| match outcome {
            AlignOutcome::Accepted(result) => Some(result.distance),
            _ => None,
        };
        assert_eq!(distance(run(42)), distance(run(42)));
    }

    #[test]
    fn empty_read_has_no_driver_result() {
        let reference = Reference::new(b"ACGTACGT".to_vec());
        let reverse_fm = reverse_fm_of(reference.bases());
        let catalogue = VariantCatalogue::new(vec![]);
        let end = ReadEndBuffers::default();
        let mut left = FlankMatrices::default();
        let mut right = FlankMatrices::default();
        let mut positions = Vec::new();
        let mut rng = StdRng::seed_from_u64(0);

        let result = align_one_end(
            &reference, &reverse_fm, &catalogue, &end, &mut left, &mut right, &mut positions,
            AnchorMode::Deterministic, 0, 1, 50, 8.0, 4, &mut rng,
        );
        assert!(matches!(result, AlignOutcome::SeedExhausted));
    }
}
