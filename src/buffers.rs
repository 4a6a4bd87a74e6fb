//! Per-worker reusable scratch space (spec §5 "Buffer lifetime").
//!
//! Every DP matrix here is allocated once, to `(2R+1) x (2R+1)` where
//! `R` is the configured maximum read length, and reused across reads:
//! rows/columns actually in use for a given flank are a sub-rectangle
//! of the allocation, and `clear_used` only resets that sub-rectangle,
//! never the backing `Vec`s.

use crate::dp_cell::DpCell;
use crate::reference::ReadEndBuffers;

/// The three affine-gap state matrices plus one tagged traceback grid,
/// replacing the naive three-parallel-traceback-array layout (spec §9).
#[derive(Debug, Default)]
pub struct FlankMatrices {
    pub m: Vec<Vec<f64>>,
    pub i_ref: Vec<Vec<f64>>,
    pub i_query: Vec<Vec<f64>>,
    pub trace: Vec<Vec<DpCell>>,
    rows: usize,
    cols: usize,
}

impl FlankMatrices {
    /// Grows the backing storage if needed; never shrinks it, so a
    /// worker that has seen a long flank keeps that allocation for the
    /// rest of its lifetime.
    pub fn ensure_capacity(&mut self, rows: usize, cols: usize) {
        if self.m.len() < rows {
            self.m.resize_with(rows, Vec::new);
            self.i_ref.resize_with(rows, Vec::new);
            self.i_query.resize_with(rows, Vec::new);
            self.trace.resize_with(rows, Vec::new);
        }
        for r in 0..rows {
            if self.m[r].len() < cols {
                self.m[r].resize(cols, 0.0);
                self.i_ref[r].resize(cols, 0.0);
                self.i_query[r].resize(cols, 0.0);
                self.trace[r].resize(cols, DpCell::default());
            }
        }
        self.rows = rows;
        self.cols = cols;
    }

    /// Resets the sub-rectangle sized by the last `ensure_capacity` call
    /// back to its default value, leaving the rest of the backing
    /// allocation (and any stale data in it) untouched.
    pub fn clear_used(&mut self) {
        for r in 0..self.rows {
            self.m[r][..self.cols].fill(0.0);
            self.i_ref[r][..self.cols].fill(0.0);
            self.i_query[r][..self.cols].fill(0.0);
            self.trace[r][..self.cols].fill(DpCell::default());
        }
    }
}

/// Everything one worker thread owns exclusively for the lifetime of
/// the pipeline: DP state for both flank directions on both read ends,
/// and the four derived-buffer sets for a read pair.
#[derive(Debug, Default)]
pub struct WorkerBuffers {
    pub left: FlankMatrices,
    pub right: FlankMatrices,
    pub end1: ReadEndBuffers,
    pub end2: ReadEndBuffers,
    /// Scratch for seed-finder candidate positions (spec §3 "Seed hit").
    pub positions: Vec<usize>,
}

impl WorkerBuffers {
    pub fn new(max_read_len: usize) -> Self {
        let mut buffers = WorkerBuffers::default();
        let dim = 2 * max_read_len + 1;
        buffers.left.ensure_capacity(dim, dim);
        buffers.right.ensure_capacity(dim, dim);
        buffers.positions = Vec::with_capacity(64);
        buffers
    }
}
