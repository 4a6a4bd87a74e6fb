//! The tagged traceback cell (spec §9 design note: "replace triple-nested
//! traceback arrays with one traceback cell per DP cell").

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Diag,
    Up,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Source {
    #[default]
    Match,
    GapRef,
    GapQuery,
}

/// One DP cell's traceback record: which neighbour it came from, which
/// state matrix that neighbour was in, and — only set when the step
/// consumed a whole catalogued allele in one go — how many read bases
/// that step consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DpCell {
    pub direction: Direction,
    pub source: Source,
    pub variant_len: Option<usize>,
}
