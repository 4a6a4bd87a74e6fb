//! The variant-aware extender (spec §4.3): quality-weighted affine-gap
//! alignment of a seed's flanks, with a cheap Hamming fast path and a
//! full DP fallback that can consume an entire catalogued allele in one
//! step.

use crate::buffers::FlankMatrices;
use crate::distance::{correct_call_cost, substitution_cost, GAP_EXT_COST, GAP_OPEN_COST};
use crate::dp_cell::{Direction, DpCell, Source};
use crate::events::AlleleEvent;
use crate::reference::Reference;
use crate::variant_catalogue::VariantCatalogue;

const INF: f64 = f64::INFINITY;

/// Multiplier applied to `D*` to bound the fast path: once the
/// accumulated Hamming cost exceeds this many times the read's share of
/// `D*`, DP is worth its cost. Kept generous since DP is the ground
/// truth and the fast path only needs to catch the common case.
const FAST_PATH_SLACK: f64 = 1.5;

/// Result of extending both flanks of one seed hit against one
/// candidate reference position (spec §4.3 "Extension output").
#[derive(Debug, Clone)]
pub struct ExtensionResult {
    pub distance: f64,
    pub left_events: Vec<AlleleEvent>,
    pub right_events: Vec<AlleleEvent>,
    pub accepted: bool,
}

/// `read`/`rev_read` are the full read and its reverse (spec §4.2's seed
/// finder already has both on hand); `s`/`e` bracket the seed; `anchor`
/// is the candidate forward-reference position of the seed's left
/// endpoint.
#[allow(clippy::too_many_arguments)]
pub fn extend(
    reference: &Reference,
    catalogue: &VariantCatalogue,
    read: &[u8],
    quality: &[u8],
    s: usize,
    e: usize,
    anchor: usize,
    distance_star: f64,
    left_buf: &mut FlankMatrices,
    right_buf: &mut FlankMatrices,
) -> ExtensionResult {
    let ref_left_end = anchor;
    let ref_right_start = anchor + (s - e + 1);

    let read_left = &read[0..e];
    let qual_left = &quality[0..e];
    let read_right = &read[s + 1..read.len()];
    let qual_right = &quality[s + 1..read.len()];

    let left_ref_len = flank_ref_len(catalogue, read_left.len(), |len| {
        (ref_left_end.saturating_sub(len), ref_left_end)
    });
    let right_ref_len = flank_ref_len(catalogue, read_right.len(), |len| {
        (ref_right_start, ref_right_start + len)
    });

    let left_ref_start = ref_left_end.saturating_sub(left_ref_len);
    let left_ref = reference.slice_clipped(left_ref_start, ref_left_end);
    // Reversed so index 0 of both read and reference is the base
    // immediately adjacent to the seed, growing outward.
    let left_read_rev: Vec<u8> = read_left.iter().rev().copied().collect();
    let left_qual_rev: Vec<u8> = qual_left.iter().rev().copied().collect();
    let left_ref_rev: Vec<u8> = left_ref.iter().rev().copied().collect();
    let left_pos_of_col = |j: usize| ref_left_end - j;

    let right_ref = reference.slice_clipped(ref_right_start, ref_right_start + right_ref_len);
    let right_pos_of_col = |j: usize| ref_right_start + j - 1;

    let (left_distance, left_events) = align_flank(
        &left_read_rev,
        &left_qual_rev,
        &left_ref_rev,
        left_pos_of_col,
        reference,
        catalogue,
        left_buf,
        distance_star,
    );
    let (right_distance, right_events) = align_flank(
        read_right,
        qual_right,
        right_ref,
        right_pos_of_col,
        reference,
        catalogue,
        right_buf,
        distance_star,
    );

    let distance = left_distance + right_distance;
    ExtensionResult {
        distance,
        left_events,
        right_events,
        accepted: distance <= distance_star,
    }
}

fn flank_ref_len(
    catalogue: &VariantCatalogue,
    read_len: usize,
    window_for_len: impl Fn(usize) -> (usize, usize),
) -> usize {
    let mut len = read_len;
    for _ in 0..8 {
        let (lo, hi) = window_for_len(len);
        let hi_inclusive = hi.saturating_sub(1);
        let extra = if lo <= hi_inclusive {
            catalogue.indel_loci_in_range(lo, hi_inclusive).len()
        } else {
            0
        };
        let new_len = read_len + extra;
        if new_len == len {
            break;
        }
        len = new_len;
    }
    len
}

/// Aligns one flank. `read`/`qual`/`ref_flank` are all already oriented
/// so that index 0 is where the alignment starts growing from the seed.
/// `pos_of_col(j)` maps a 1-indexed reference column to its absolute
/// reference offset, so callers can run the identical recurrence for
/// both flank directions.
#[allow(clippy::too_many_arguments)]
fn align_flank(
    read: &[u8],
    qual: &[u8],
    ref_flank: &[u8],
    pos_of_col: impl Fn(usize) -> usize,
    reference: &Reference,
    catalogue: &VariantCatalogue,
    buf: &mut FlankMatrices,
    distance_star: f64,
) -> (f64, Vec<AlleleEvent>) {
    if read.is_empty() && ref_flank.is_empty() {
        return (0.0, Vec::new());
    }

    if read.len() == ref_flank.len() {
        if let Some(result) = try_hamming_walk(read, qual, ref_flank, &pos_of_col, catalogue, distance_star) {
            return result;
        }
    }

    run_dp(read, qual, ref_flank, &pos_of_col, reference, catalogue, buf)
}

/// Cheap no-indel walk (spec §4.3 "Fast path"). Returns `None` to signal
/// "fall back to DP": on any indel locus, or once the accumulated cost
/// exceeds the slack-adjusted threshold.
fn try_hamming_walk(
    read: &[u8],
    qual: &[u8],
    ref_flank: &[u8],
    pos_of_col: &impl Fn(usize) -> usize,
    catalogue: &VariantCatalogue,
    distance_star: f64,
) -> Option<(f64, Vec<AlleleEvent>)> {
    let mut cost = 0.0;
    let mut events = Vec::new();
    let limit = distance_star * FAST_PATH_SLACK;

    for i in 0..read.len() {
        let abs_pos = pos_of_col(i + 1);
        let ref_base = ref_flank[i];
        let observed = read[i];
        let q = qual[i];

        if let Some(locus) = catalogue.locus_at(abs_pos) {
            if !locus.same_length {
                return None; // indel locus: fast path cannot represent this.
            }
            let allele_len = locus.allele_length().unwrap_or(1);
            if allele_len != 1 {
                return None; // multi-base substitution locus: leave to DP.
            }
            let (best_cost, best_allele) = best_matching_allele(&[observed], &[q], locus, ref_base);
            cost += best_cost;
            events.push(AlleleEvent::new(abs_pos, best_allele, vec![q]));
        } else if observed == ref_base {
            cost += correct_call_cost(q);
        } else {
            cost += substitution_cost(q);
            // The event must be recorded before any early-exit below —
            // an implementation that breaks first would silently drop
            // the evidence for this position (spec §9 design note (a)).
            events.push(AlleleEvent::new(abs_pos, vec![observed], vec![q]));
        }

        if cost > limit {
            return None;
        }
    }

    Some((cost, events))
}

/// Picks the allele (including the literal reference base as a
/// candidate) with the lowest cost against `observed`/`quals`, per the
/// likelihood rule in spec §4.3.
fn best_matching_allele(
    observed: &[u8],
    quals: &[u8],
    locus: &crate::variant_catalogue::Locus,
    reference_base: u8,
) -> (f64, Vec<u8>) {
    let ref_allele = vec![reference_base];
    let mut best_cost = base_match_cost(observed, quals, &ref_allele);
    let mut best_allele = ref_allele;

    for allele in &locus.alleles {
        if allele.len() != observed.len() {
            continue;
        }
        let freq = locus.frequency_of(allele).unwrap_or(f64::MIN_POSITIVE);
        let cost = base_match_cost(observed, quals, allele) - freq.max(f64::MIN_POSITIVE).ln();
        if cost < best_cost {
            best_cost = cost;
            best_allele = allele.clone();
        }
    }
    (best_cost, best_allele)
}

fn base_match_cost(observed: &[u8], quals: &[u8], allele: &[u8]) -> f64 {
    observed
        .iter()
        .zip(quals.iter())
        .zip(allele.iter())
        .map(|((&obs, &q), &a)| {
            if obs == a {
                correct_call_cost(q)
            } else {
                substitution_cost(q)
            }
        })
        .sum()
}

fn quality_term(q: u8) -> f64 {
    correct_call_cost(q)
}

fn run_dp(
    read: &[u8],
    qual: &[u8],
    ref_flank: &[u8],
    pos_of_col: &impl Fn(usize) -> usize,
    reference: &Reference,
    catalogue: &VariantCatalogue,
    buf: &mut FlankMatrices,
) -> (f64, Vec<AlleleEvent>) {
    let rows = read.len() + 1;
    let cols = ref_flank.len() + 1;
    buf.ensure_capacity(rows, cols);
    buf.clear_used();

    buf.m[0][0] = 0.0;
    buf.i_ref[0][0] = INF;
    buf.i_query[0][0] = INF;

    for i in 1..rows {
        let open = if i == 1 { GAP_OPEN_COST } else { GAP_EXT_COST };
        let prev = if i == 1 { buf.m[i - 1][0] } else { buf.i_ref[i - 1][0] };
        buf.i_ref[i][0] = prev + open + quality_term(qual[i - 1]);
        buf.m[i][0] = buf.i_ref[i][0];
        buf.i_query[i][0] = INF;
        buf.trace[i][0] = DpCell {
            direction: Direction::Up,
            source: Source::GapRef,
            variant_len: None,
        };
    }
    for j in 1..cols {
        let open = if j == 1 { GAP_OPEN_COST } else { GAP_EXT_COST };
        let prev = if j == 1 { buf.m[0][j - 1] } else { buf.i_query[0][j - 1] };
        buf.i_query[0][j] = prev + open;
        buf.m[0][j] = buf.i_query[0][j];
        buf.i_ref[0][j] = INF;
        buf.trace[0][j] = DpCell {
            direction: Direction::Left,
            source: Source::GapQuery,
            variant_len: None,
        };
    }

    for j in 1..cols {
        let abs_pos = pos_of_col(j);
        let locus = catalogue.locus_at(abs_pos);
        let ref_byte = reference.base_at(abs_pos).unwrap_or(ref_flank[j - 1]);

        for i in 1..rows {
            // M: substitution/allele-consumption transition.
            let sub_cost = if read[i - 1] == ref_byte {
                correct_call_cost(qual[i - 1])
            } else {
                substitution_cost(qual[i - 1])
            };
            let diag_best = min3(buf.m[i - 1][j - 1], buf.i_ref[i - 1][j - 1], buf.i_query[i - 1][j - 1]);
            let mut best = diag_best + sub_cost;
            let mut best_cell = DpCell {
                direction: Direction::Diag,
                source: Source::Match,
                variant_len: None,
            };

            if let Some(locus) = locus {
                for (allele, &freq) in locus.alleles.iter().zip(locus.frequencies.iter()) {
                    let len_a = allele.len();
                    if len_a == 0 || len_a > i {
                        continue;
                    }
                    let window = &read[i - len_a..i];
                    if window != allele.as_slice() {
                        continue;
                    }
                    let prior = -freq.max(f64::MIN_POSITIVE).ln();
                    let qcost: f64 = qual[i - len_a..i].iter().map(|&q| correct_call_cost(q)).sum();
                    let from = min3(
                        buf.m[i - len_a][j - 1],
                        buf.i_ref[i - len_a][j - 1],
                        buf.i_query[i - len_a][j - 1],
                    );
                    let candidate = from + qcost + prior;
                    if candidate < best {
                        best = candidate;
                        best_cell = DpCell {
                            direction: Direction::Diag,
                            source: Source::Match,
                            variant_len: Some(len_a),
                        };
                    }
                }
            }
            buf.m[i][j] = best;

            // I_r: gap in reference (read base inserted relative to ref).
            let open_cost = GAP_OPEN_COST + quality_term(qual[i - 1]);
            let ext_cost = GAP_EXT_COST + quality_term(qual[i - 1]);
            let from_m = buf.m[i - 1][j] + open_cost;
            let from_ir = buf.i_ref[i - 1][j] + ext_cost;
            buf.i_ref[i][j] = from_m.min(from_ir);

            // I_q: gap in read (reference base deleted).
            let from_m_q = buf.m[i][j - 1] + GAP_OPEN_COST;
            let from_iq = buf.i_query[i][j - 1] + GAP_EXT_COST;
            buf.i_query[i][j] = from_m_q.min(from_iq);

            buf.trace[i][j] = best_cell;
        }
    }

    let (distance, mut source_at_corner) = min3_with_source(
        buf.m[rows - 1][cols - 1],
        buf.i_ref[rows - 1][cols - 1],
        buf.i_query[rows - 1][cols - 1],
    );
    // On either boundary row/column there is no real "diagonal" step;
    // force the direction that the boundary initialisation actually
    // used so the traceback never indexes a nonexistent read/ref base.
    if rows == 1 && cols > 1 {
        source_at_corner = Source::GapQuery;
    } else if cols == 1 && rows > 1 {
        source_at_corner = Source::GapRef;
    }

    let events = traceback(
        read,
        qual,
        rows - 1,
        cols - 1,
        source_at_corner,
        pos_of_col,
        reference,
        catalogue,
        buf,
    );
    (distance, events)
}

fn min3(a: f64, b: f64, c: f64) -> f64 {
    a.min(b).min(c)
}

fn min3_with_source(m: f64, ir: f64, iq: f64) -> (f64, Source) {
    if m <= ir && m <= iq {
        (m, Source::Match)
    } else if ir <= iq {
        (ir, Source::GapRef)
    } else {
        (iq, Source::GapQuery)
    }
}

#[allow(clippy::too_many_arguments)]
fn traceback(
    read: &[u8],
    qual: &[u8],
    mut i: usize,
    mut j: usize,
    mut current_source: Source,
    pos_of_col: &impl Fn(usize) -> usize,
    reference: &Reference,
    catalogue: &VariantCatalogue,
    buf: &FlankMatrices,
) -> Vec<AlleleEvent> {
    let mut events = Vec::new();

    while i > 0 || j > 0 {
        match current_source {
            Source::GapRef => {
                // Consumed a read base with no reference advance: not a
                // locus column by construction, no event recorded
                // (spec §9 design note (c): the leading inserted base's
                // quality is dropped here, a known approximation).
                i -= 1;
                current_source = if i == 0 && j > 0 {
                    Source::GapQuery
                } else if i == 0 {
                    Source::Match
                } else {
                    buf.trace[i][j].source
                };
            }
            Source::GapQuery => {
                j -= 1;
                current_source = if j == 0 && i > 0 {
                    Source::GapRef
                } else if j == 0 {
                    Source::Match
                } else {
                    buf.trace[i][j].source
                };
            }
            Source::Match => {
                if i == 0 && j == 0 {
                    break;
                }
                let cell = buf.trace[i][j];
                let abs_pos = pos_of_col(j);
                let is_locus = catalogue.locus_at(abs_pos).is_some();
                let ref_base = reference.base_at(abs_pos);

                if let Some(len_a) = cell.variant_len {
                    let bases = read[i - len_a..i].to_vec();
                    let quals = qual[i - len_a..i].to_vec();
                    events.push(AlleleEvent::new(abs_pos, bases, quals));
                    i -= len_a;
                    j -= 1;
                } else {
                    if is_locus {
                        events.push(AlleleEvent::new(abs_pos, vec![read[i - 1]], vec![qual[i - 1]]));
                    } else if Some(read[i - 1]) != ref_base {
                        events.push(AlleleEvent::new(abs_pos, vec![read[i - 1]], vec![qual[i - 1]]));
                    }
                    i -= 1;
                    j -= 1;
                }
                current_source = if i == 0 && j == 0 {
                    Source::Match
                } else if i == 0 {
                    Source::GapQuery
                } else if j == 0 {
                    Source::GapRef
                } else {
                    buf.trace[i][j].source
                };
            }
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant_catalogue::Locus;

    fn ref_seq(s: &str) -> Reference {
        Reference::new(s.as_bytes().to_vec())
    }

    #[test]
    fn exact_match_has_near_zero_distance() {
        let reference = ref_seq("ACGTACGTACGT");
        let catalogue = VariantCatalogue::new(vec![]);
        let read = b"ACGTACGTACGT";
        let qual = vec![b'I'; read.len()];
        let mut left = FlankMatrices::default();
        let mut right = FlankMatrices::default();
        let result = extend(
            &reference, &catalogue, read, &qual, 11, 0, 0, 100.0, &mut left, &mut right,
        );
        assert!(result.distance < 0.1);
        assert!(result.left_events.is_empty() && result.right_events.is_empty());
    }

    #[test]
    fn substitution_is_reported_at_correct_position() {
        let reference = ref_seq("ACGTACGTACGT");
        let catalogue = VariantCatalogue::new(vec![]);
        let read = b"ACGTACCTACGT"; // index 6 differs from the reference
        let qual = vec![b'I'; read.len()];
        let mut left = FlankMatrices::default();
        let mut right = FlankMatrices::default();
        // Seed on the untouched tail "TACGT" (indices 7..=11), leaving
        // the mismatch at index 6 inside the left flank.
        let result = extend(
            &reference, &catalogue, read, &qual, 11, 7, 7, 100.0, &mut left, &mut right,
        );
        let all_events: Vec<_> = result
            .left_events
            .iter()
            .chain(result.right_events.iter())
            .collect();
        assert!(all_events.iter().any(|e| e.position == 6 && e.bases == b"C"));
    }

    #[test]
    fn known_insertion_locus_is_preferred_over_reference() {
        let reference = ref_seq("ACGTACGT");
        let catalogue = VariantCatalogue::new(vec![Locus::new(
            4,
            vec![b"A".to_vec(), b"AA".to_vec()],
            vec![0.6, 0.4],
        )]);
        let read = b"ACGTAACGT";
        let qual = vec![b'I'; read.len()];
        let mut left = FlankMatrices::default();
        let mut right = FlankMatrices::default();
        // Seed on the leading "ACG" (indices 0..=2), leaving the
        // catalogued insertion locus inside the right flank.
        let result = extend(
            &reference, &catalogue, read, &qual, 2, 0, 0, 100.0, &mut left, &mut right,
        );
        let all_events: Vec<_> = result
            .left_events
            .iter()
            .chain(result.right_events.iter())
            .collect();
        assert!(all_events.iter().any(|e| e.position == 4 && e.bases == b"AA"));
    }

    #[test]
    fn distance_monotonicity_holds() {
        let reference = ref_seq("ACGTACGTACGT");
        let catalogue = VariantCatalogue::new(vec![]);
        let read = b"ACGTACCTACGT";
        let qual = vec![b'I'; read.len()];
        let mut left = FlankMatrices::default();
        let mut right = FlankMatrices::default();
        let result = extend(
            &reference, &catalogue, read, &qual, 11, 7, 7, 1000.0, &mut left, &mut right,
        );
        let d = result.distance;

        let tighter = extend(
            &reference, &catalogue, read, &qual, 11, 7, 7, d - 0.5, &mut left, &mut right,
        );
        assert!(!tighter.accepted);

        let looser = extend(
            &reference, &catalogue, read, &qual, 11, 7, 7, d + 0.5, &mut left, &mut right,
        );
        assert!(looser.accepted);
    }
}
