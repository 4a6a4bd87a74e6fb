//! Reference sequence storage and the per-read derived-buffer set
//! (spec §3 "Read").

use crate::alphabet::complement_base;

/// The forward reference, 0-indexed, loaded once and shared read-only
/// for the life of the run.
#[derive(Debug)]
pub struct Reference {
    bases: Vec<u8>,
}

impl Reference {
    pub fn new(bases: Vec<u8>) -> Self {
        Reference { bases }
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    pub fn bases(&self) -> &[u8] {
        &self.bases
    }

    /// `reference[start..end]`, clipped to `[0, len()]` (spec §4.3:
    /// "flanks are clipped to `[0, L]`").
    pub fn slice_clipped(&self, start: usize, end: usize) -> &[u8] {
        let len = self.bases.len();
        let start = start.min(len);
        let end = end.clamp(start, len);
        &self.bases[start..end]
    }

    pub fn base_at(&self, pos: usize) -> Option<u8> {
        self.bases.get(pos).copied()
    }
}

/// One read end plus its four derived buffers, all owned by whichever
/// worker processes the read (spec §3 "Ownership and lifecycle").
#[derive(Debug, Default)]
pub struct ReadEndBuffers {
    pub bases: Vec<u8>,
    pub qualities: Vec<u8>,
    pub reverse: Vec<u8>,
    pub complement: Vec<u8>,
    pub reverse_complement: Vec<u8>,
    pub reversed_quality: Vec<u8>,
}

impl ReadEndBuffers {
    /// Repopulates every derived buffer from `bases`/`qualities`,
    /// reusing prior allocations (spec §5 "Buffer lifetime").
    pub fn load(&mut self, bases: &[u8], qualities: &[u8]) {
        self.bases.clear();
        self.bases.extend_from_slice(bases);
        self.qualities.clear();
        self.qualities.extend_from_slice(qualities);

        self.reverse.clear();
        self.reverse.extend(bases.iter().rev().copied());

        self.complement.clear();
        self.complement
            .extend(bases.iter().map(|&b| complement_base(b)));

        self.reverse_complement.clear();
        self.reverse_complement
            .extend(bases.iter().rev().map(|&b| complement_base(b)));

        self.reversed_quality.clear();
        self.reversed_quality.extend(qualities.iter().rev().copied());
    }

    pub fn read_len(&self) -> usize {
        self.bases.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_complement_round_trip() {
        let mut buf = ReadEndBuffers::default();
        buf.load(b"ACGTN", b"IIIII");
        assert_eq!(buf.reverse, b"NTGCA");
        assert_eq!(buf.complement, b"TGCAN");
        assert_eq!(buf.reverse_complement, b"NACGT");

        // Applying the pair-wise derivation twice yields the original.
        let mut buf2 = ReadEndBuffers::default();
        buf2.load(&buf.reverse_complement, &buf.reversed_quality);
        assert_eq!(buf2.reverse_complement, buf.bases);
    }

    #[test]
    fn slice_clipped_stays_in_bounds() {
        let reference = Reference::new(b"ACGTACGT".to_vec());
        assert_eq!(reference.slice_clipped(6, 20), b"GT");
        assert_eq!(reference.slice_clipped(20, 30), b"");
        assert_eq!(reference.slice_clipped(0, 4), b"ACGT");
    }
}
