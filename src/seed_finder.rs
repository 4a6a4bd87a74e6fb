//! The seed finder (spec §4.2): backward search on the reverse-reference
//! FM-index, translated back into forward-reference coordinates.

use crate::fm_index::{BackwardSearch, FmIndex};

/// A maximal exact match anchored at `p` (spec §3 "Seed hit"). Its
/// candidate forward reference positions are written into the caller's
/// scratch buffer rather than owned here, so a worker thread can reuse
/// the same allocation across every seed lookup it performs.
#[derive(Debug, Clone)]
pub struct SeedHit {
    /// Right endpoint of the match in read coordinates.
    pub s: usize,
    /// Left endpoint of the match in read coordinates.
    pub e: usize,
    pub ok: bool,
}

impl SeedHit {
    fn sentinel() -> Self {
        SeedHit {
            s: 0,
            e: 0,
            ok: false,
        }
    }
}

/// Finds the seed anchored at read offset `p` (spec §4.2).
///
/// `rev_read` is the read reversed (not complemented). Backward search
/// walks `rev_read` from `start = R - 1 - p` down to index 0, which is
/// exactly the original read walked forward from `p` to `R - 1` — so
/// the match grows rightward from the anchor, and the search's final
/// `left_index` in `rev_read` coordinates becomes the read's right
/// endpoint `s`. `reverse_fm` must be built over the reverse reference
/// (plus sentinel).
///
/// `positions` is the caller's reusable scratch buffer (spec §5 "buffer
/// lifetime"): cleared on entry and filled with this seed's candidate
/// forward-reference positions, or left empty when `ok` is false.
pub fn find_seed(
    reverse_fm: &FmIndex,
    rev_read: &[u8],
    read_len: usize,
    reference_len: usize,
    p: usize,
    max_match: usize,
    positions: &mut Vec<usize>,
) -> SeedHit {
    debug_assert!(p < read_len);
    debug_assert_eq!(rev_read.len(), read_len);
    positions.clear();
    let start = read_len - 1 - p;

    match reverse_fm.backward_search_from(rev_read, start) {
        BackwardSearch::NoMatch => SeedHit::sentinel(),
        BackwardSearch::Match { sp, ep, left_index } => {
            let s = read_len - 1 - left_index;
            let e = p;
            let count = ep - sp + 1;
            if count > max_match {
                return SeedHit { s, e, ok: false };
            }
            let match_len = s - e + 1;
            positions.extend((sp..=ep).map(|row| {
                let sa_value = reverse_fm.suffix_array_value(row);
                (reference_len - 1 - sa_value).saturating_sub(match_len - 1)
            }));
            SeedHit { s, e, ok: true }
        }
    }
}
