//! The immutable run context (spec §9 design note "share one read-only
//! bundle across workers instead of threading five Arcs separately").

use crate::alphabet::SENTINEL;
use crate::fm_index::{FmIndex, DEFAULT_CHECKPOINT_INTERVAL};
use crate::reference::Reference;
use crate::variant_catalogue::VariantCatalogue;

/// Run-wide parameters that do not vary per read (spec §6 CLI flags).
#[derive(Debug, Clone, Copy)]
pub struct RunParameters {
    pub error_rate: f64,
    pub mutation_rate: f64,
    pub max_match: usize,
    /// Overrides the computed, cost-scaled D* (spec §6 "distance
    /// threshold override"); `None` means "derive it from error/mutation
    /// rate and read length".
    pub distance_threshold_override: Option<f64>,
    /// Overrides the per-read default iteration count (spec §4.4 "a
    /// small factor of D* + 1"); `None` means "compute it from D*".
    pub iter_num_override: Option<usize>,
    pub seed_start: usize,
    pub seed_step: usize,
    pub rng_seed: u64,
}

/// Everything a worker needs to align reads, built once in `main` and
/// shared behind an `Arc` (spec §5 "Ownership and lifecycle").
pub struct Context {
    pub reference: Reference,
    pub reverse_fm: FmIndex,
    pub catalogue: VariantCatalogue,
    pub parameters: RunParameters,
}

impl Context {
    /// Builds the reverse-reference FM-index from `reference` and
    /// bundles it with the catalogue and run parameters.
    pub fn new(reference: Reference, catalogue: VariantCatalogue, parameters: RunParameters) -> Self {
        let mut reversed: Vec<u8> = reference.bases().iter().rev().copied().collect();
        reversed.push(SENTINEL);
        let reverse_fm = FmIndex::build(&reversed, DEFAULT_CHECKPOINT_INTERVAL);
        Context {
            reference,
            reverse_fm,
            catalogue,
            parameters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant_catalogue::VariantCatalogue;

    #[test]
    fn builds_a_reverse_index_over_the_reference() {
        let reference = Reference::new(b"ACGTACGT".to_vec());
        let params = RunParameters {
            error_rate: 0.01,
            mutation_rate: 0.001,
            max_match: 50,
            distance_threshold_override: None,
            iter_num_override: Some(8),
            seed_start: 0,
            seed_step: 5,
            rng_seed: 0,
        };
        let context = Context::new(reference, VariantCatalogue::new(vec![]), params);
        assert_eq!(context.reverse_fm.len(), context.reference.len() + 1);
    }
}
