//! The known-variant catalogue (spec §3 "Variant catalogue").

use std::collections::HashMap;

/// One catalogued locus: its allele set, their prior frequencies, and
/// whether every allele has the same length (substitution-only locus,
/// set `S` in spec §3).
#[derive(Debug, Clone)]
pub struct Locus {
    pub position: usize,
    pub alleles: Vec<Vec<u8>>,
    pub frequencies: Vec<f64>,
    pub same_length: bool,
}

impl Locus {
    pub fn new(position: usize, alleles: Vec<Vec<u8>>, frequencies: Vec<f64>) -> Self {
        assert!(!alleles.is_empty(), "a catalogued locus needs >= 1 allele");
        assert_eq!(alleles.len(), frequencies.len());
        let same_length = alleles.windows(2).all(|w| w[0].len() == w[1].len());
        Locus {
            position,
            alleles,
            frequencies,
            same_length,
        }
    }

    pub fn allele_length(&self) -> Option<usize> {
        self.same_length.then(|| self.alleles[0].len())
    }

    pub fn frequency_of(&self, allele: &[u8]) -> Option<f64> {
        self.alleles
            .iter()
            .position(|a| a.as_slice() == allele)
            .map(|i| self.frequencies[i])
    }
}

/// The full catalogue, keyed by reference position, with a sorted
/// position index supporting interval-hit queries (spec testable
/// property 1).
#[derive(Debug, Default)]
pub struct VariantCatalogue {
    loci: HashMap<usize, Locus>,
    sorted_positions: Vec<usize>,
}

impl VariantCatalogue {
    pub fn new(loci: Vec<Locus>) -> Self {
        let mut map = HashMap::with_capacity(loci.len());
        let mut positions = Vec::with_capacity(loci.len());
        for locus in loci {
            positions.push(locus.position);
            map.insert(locus.position, locus);
        }
        positions.sort_unstable();
        VariantCatalogue {
            loci: map,
            sorted_positions: positions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.loci.is_empty()
    }

    pub fn len(&self) -> usize {
        self.loci.len()
    }

    pub fn locus_at(&self, position: usize) -> Option<&Locus> {
        self.loci.get(&position)
    }

    pub fn is_substitution_only(&self, position: usize) -> bool {
        self.loci
            .get(&position)
            .map(|l| l.same_length)
            .unwrap_or(false)
    }

    pub fn is_indel_locus(&self, position: usize) -> bool {
        self.loci
            .get(&position)
            .map(|l| !l.same_length)
            .unwrap_or(false)
    }

    /// True iff some catalogued position falls in `[low, high]`
    /// inclusive (spec testable property 1).
    pub fn interval_contains_variant(&self, low: usize, high: usize) -> bool {
        if low > high {
            return false;
        }
        let start = self.sorted_positions.partition_point(|&p| p < low);
        self.sorted_positions
            .get(start)
            .is_some_and(|&p| p <= high)
    }

    pub fn indel_loci_in_range(&self, low: usize, high: usize) -> Vec<usize> {
        if low > high {
            return Vec::new();
        }
        let start = self.sorted_positions.partition_point(|&p| p < low);
        let end = self.sorted_positions.partition_point(|&p| p <= high);
        self.sorted_positions[start..end]
            .iter()
            .copied()
            .filter(|&p| self.is_indel_locus(p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue() -> VariantCatalogue {
        VariantCatalogue::new(vec![
            Locus::new(10, vec![b"T".to_vec(), b"C".to_vec()], vec![0.7, 0.3]),
            Locus::new(40, vec![b"A".to_vec(), b"AA".to_vec()], vec![0.6, 0.4]),
        ])
    }

    #[test]
    fn interval_hit_matches_linear_scan() {
        let cat = catalogue();
        for low in 0..50 {
            for high in low..50 {
                let expected = [10usize, 40].iter().any(|&p| low <= p && p <= high);
                assert_eq!(
                    cat.interval_contains_variant(low, high),
                    expected,
                    "low={low} high={high}"
                );
            }
        }
    }

    #[test]
    fn same_length_flag_distinguishes_substitution_from_indel() {
        let cat = catalogue();
        assert!(cat.is_substitution_only(10));
        assert!(cat.is_indel_locus(40));
    }
}
