//! The FM-index query surface (spec §4.1).
//!
//! Backward search is the only operation the rest of the crate needs;
//! construction (suffix array + BWT + rank checkpoints) is kept here
//! too, generalised from the teacher's `fm_index.rs`, because the core
//! algorithms need a concrete index to run end-to-end against. The
//! construction method itself (naive suffix sort) is not part of the
//! spec's contract and may be swapped for a linear-time one without
//! touching any caller.

use bincode::{Decode, Encode};

use crate::alphabet::{SymbolTable, ALPHABET, SENTINEL};

/// Default spacing between stored rank checkpoints. Smaller values trade
/// memory for faster `occ` queries; every position is still scanned
/// linearly between checkpoints, matching the teacher's approach.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 32;

/// Outcome of [`FmIndex::backward_search_from`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackwardSearch {
    /// `pattern[start]` does not occur anywhere in the indexed text.
    NoMatch,
    /// A non-empty interval `[sp, ep]` (inclusive) of suffix-array rows
    /// whose suffixes are prefixed by `pattern[left_index..=start]`.
    Match {
        sp: usize,
        ep: usize,
        left_index: usize,
    },
}

/// An FM-index over a sentinel-terminated text, with backward search and
/// direct suffix-array access.
#[derive(Debug, Encode, Decode)]
pub struct FmIndex {
    bwt: Vec<u8>,
    suffix_array: Vec<usize>,
    /// Cumulative count, in sorted symbol order, of all symbols strictly
    /// less than each symbol (the classic FM-index `C` array).
    first_column_offset: SymbolTableWire,
    /// `checkpoints.get(sym)[k]` is the number of occurrences of `sym`
    /// in `bwt[0..k*checkpoint_interval]`.
    checkpoints: CheckpointTable,
    checkpoint_interval: usize,
}

// bincode::Encode/Decode need concrete, non-generic types; SymbolTable<T>
// is generic purely for ergonomics inside this module, so the on-disk
// shape is spelled out explicitly here.
#[derive(Debug, Encode, Decode)]
struct SymbolTableWire {
    dollar: usize,
    a: usize,
    c: usize,
    g: usize,
    n: usize,
    t: usize,
}

impl From<SymbolTable<usize>> for SymbolTableWire {
    fn from(t: SymbolTable<usize>) -> Self {
        SymbolTableWire {
            dollar: t.dollar,
            a: t.a,
            c: t.c,
            g: t.g,
            n: t.n,
            t: t.t,
        }
    }
}

impl SymbolTableWire {
    fn get(&self, symbol: u8) -> usize {
        match symbol {
            SENTINEL => self.dollar,
            b'A' => self.a,
            b'C' => self.c,
            b'G' => self.g,
            b'N' => self.n,
            b'T' => self.t,
            other => panic!("{} is not in the reference alphabet", other as char),
        }
    }
}

#[derive(Debug, Encode, Decode)]
struct CheckpointTable {
    dollar: Vec<usize>,
    a: Vec<usize>,
    c: Vec<usize>,
    g: Vec<usize>,
    n: Vec<usize>,
    t: Vec<usize>,
}

impl CheckpointTable {
    fn get(&self, symbol: u8) -> &[usize] {
        match symbol {
            SENTINEL => &self.dollar,
            b'A' => &self.a,
            b'C' => &self.c,
            b'G' => &self.g,
            b'N' => &self.n,
            b'T' => &self.t,
            other => panic!("{} is not in the reference alphabet", other as char),
        }
    }
}

impl FmIndex {
    /// Builds an index over `text`, which must already end with the
    /// sentinel byte and contain no other occurrence of it.
    pub fn build(text: &[u8], checkpoint_interval: usize) -> Self {
        assert_eq!(
            text.last().copied(),
            Some(SENTINEL),
            "indexed text must be sentinel-terminated"
        );
        assert_eq!(
            text.iter().filter(|&&b| b == SENTINEL).count(),
            1,
            "sentinel must occur exactly once"
        );

        let suffix_array = construct_suffix_array(text);
        let bwt = construct_bwt(text, &suffix_array);

        let mut counts = SymbolTable::<usize>::default();
        for &sym in &ALPHABET {
            *counts.get_mut(sym) = bwt.iter().filter(|&&b| b == sym).count();
        }
        let mut running = 0usize;
        let mut first_column_offset = SymbolTable::<usize>::default();
        for &sym in &ALPHABET {
            *first_column_offset.get_mut(sym) = running;
            running += counts.get(sym);
        }

        let mut live = SymbolTable::<usize>::default();
        let mut checkpoints = CheckpointTable {
            dollar: Vec::new(),
            a: Vec::new(),
            c: Vec::new(),
            g: Vec::new(),
            n: Vec::new(),
            t: Vec::new(),
        };
        for (i, &sym) in bwt.iter().enumerate() {
            if i % checkpoint_interval == 0 {
                for &s in &ALPHABET {
                    checkpoint_push(&mut checkpoints, s, *live.get(s));
                }
            }
            *live.get_mut(sym) += 1;
        }

        FmIndex {
            bwt,
            suffix_array,
            first_column_offset: first_column_offset.into(),
            checkpoints,
            checkpoint_interval,
        }
    }

    pub fn len(&self) -> usize {
        self.bwt.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bwt.is_empty()
    }

    pub fn suffix_array_value(&self, row: usize) -> usize {
        self.suffix_array[row]
    }

    /// Number of occurrences of `symbol` in `bwt[0..=upto]`, or `0` if
    /// `upto` underflows (treated as "before the start of the BWT").
    fn occ_inclusive(&self, symbol: u8, upto: Option<usize>) -> usize {
        let Some(upto) = upto else { return 0 };
        let checkpoint_index = upto / self.checkpoint_interval;
        let checkpoint_pos = checkpoint_index * self.checkpoint_interval;
        let base = self.checkpoints.get(symbol)[checkpoint_index];
        let scanned = self.bwt[checkpoint_pos..=upto]
            .iter()
            .filter(|&&b| b == symbol)
            .count();
        base + scanned
    }

    fn total_occurrences(&self, symbol: u8) -> usize {
        if self.bwt.is_empty() {
            0
        } else {
            self.occ_inclusive(symbol, Some(self.bwt.len() - 1))
        }
    }

    /// Backward search from `start` down to `0` (spec §4.1). `pattern`
    /// must be at least `start + 1` bytes long.
    pub fn backward_search_from(&self, pattern: &[u8], start: usize) -> BackwardSearch {
        let first = pattern[start];
        let total = self.total_occurrences(first);
        if total == 0 {
            return BackwardSearch::NoMatch;
        }

        let base = self.first_column_offset.get(first);
        let mut sp = base;
        let mut ep = base + total - 1;
        let mut left_index = start;

        for i in (0..start).rev() {
            let c = pattern[i];
            let new_sp = self.first_column_offset.get(c) + self.occ_inclusive(c, sp.checked_sub(1));
            let new_ep_occ = self.occ_inclusive(c, Some(ep));
            if new_ep_occ == 0 || self.first_column_offset.get(c) + new_ep_occ - 1 < new_sp {
                // Interval before the failing step, and the index
                // immediately to the right of the failing position.
                return BackwardSearch::Match {
                    sp,
                    ep,
                    left_index: i + 1,
                };
            }
            sp = new_sp;
            ep = self.first_column_offset.get(c) + new_ep_occ - 1;
            left_index = i;
        }

        BackwardSearch::Match {
            sp,
            ep,
            left_index,
        }
    }
}

fn checkpoint_push(table: &mut CheckpointTable, symbol: u8, value: usize) {
    match symbol {
        SENTINEL => table.dollar.push(value),
        b'A' => table.a.push(value),
        b'C' => table.c.push(value),
        b'G' => table.g.push(value),
        b'N' => table.n.push(value),
        b'T' => table.t.push(value),
        other => panic!("{} is not in the reference alphabet", other as char),
    }
}

fn construct_suffix_array(text: &[u8]) -> Vec<usize> {
    let mut suffix_array: Vec<usize> = (0..text.len()).collect();
    suffix_array.sort_by_key(|&i| &text[i..]);
    suffix_array
}

fn construct_bwt(text: &[u8], suffix_array: &[usize]) -> Vec<u8> {
    let n = text.len();
    suffix_array
        .iter()
        .map(|&pos| text[(pos + n - 1) % n])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(text: &str) -> FmIndex {
        FmIndex::build(text.as_bytes(), 4)
    }

    fn occurrences(fm: &FmIndex, pattern: &[u8]) -> Vec<usize> {
        match fm.backward_search_from(pattern, pattern.len() - 1) {
            BackwardSearch::NoMatch => Vec::new(),
            BackwardSearch::Match { sp, ep, left_index } => {
                if left_index != 0 {
                    Vec::new()
                } else {
                    (sp..=ep).map(|row| fm.suffix_array_value(row)).collect()
                }
            }
        }
    }

    #[test]
    fn finds_all_occurrences() {
        let fm = index_of("ACGTACGTACGT$");
        let mut got = occurrences(&fm, b"CGT");
        got.sort();
        assert_eq!(got, vec![1, 5, 9]);
    }

    #[test]
    fn missing_pattern_is_no_match() {
        let fm = index_of("ACGTACGT$");
        assert!(occurrences(&fm, b"TTTT").is_empty());
    }

    #[test]
    fn partial_match_reports_failing_boundary() {
        let fm = index_of("ACGTACGT$");
        // "CCGT" shares a "CGT" suffix with the text but the leading C
        // fails to extend from wherever "CGT" is found.
        match fm.backward_search_from(b"CCGT", 3) {
            BackwardSearch::Match { left_index, .. } => assert_eq!(left_index, 1),
            BackwardSearch::NoMatch => panic!("expected a partial match"),
        }
    }

    #[test]
    fn single_symbol_text_round_trips() {
        let fm = index_of("AAAA$");
        let got = occurrences(&fm, b"AAAA");
        assert_eq!(got, vec![0]);
    }
}
