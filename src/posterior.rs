//! The per-locus posterior updater (spec §4.5): a categorical
//! distribution over observed allele strings at each reference
//! position, updated from allele events via quality-derived likelihoods.

use std::collections::HashMap;

use crate::distance::correct_call_cost;
use crate::events::AlleleEvent;
use crate::variant_catalogue::{Locus, VariantCatalogue};

/// The small floor `ε₀` from spec §4.5's initialisation rule: every
/// non-reference standard base starts with `ε₀` mass, the reference
/// base starts with `1 − 3·ε₀`, and any catalogued allele's frequency
/// is floored at `ε₀` after subtracting `|A(p)|·ε₀` for the others.
/// Large enough that a single high-quality disagreeing read can move
/// the posterior to a reportable confidence without a long run of
/// supporting reads (spec §8 scenario E2 expects a Phred-scaled call
/// from one Q40 mismatch).
const EPSILON0: f64 = 0.1;

const STANDARD_BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// One position's categorical distribution over allele strings.
#[derive(Debug, Clone, Default)]
pub struct LocusPosterior {
    probabilities: HashMap<Vec<u8>, f64>,
}

impl LocusPosterior {
    /// Seeds the distribution from a catalogued locus's allele
    /// frequencies: each allele at `max(freq - |A(p)|*ε₀, ε₀)` (spec
    /// §4.5 "Initialisation, catalogued case"). Catalogues are expected
    /// to list the reference allele explicitly among their alleles, so
    /// unlike the spec's literal wording this does not separately
    /// insert it — there is no back-reference from a `Locus` to the
    /// reference base to insert.
    pub fn from_locus(locus: &Locus) -> Self {
        let floor_total = locus.alleles.len() as f64 * EPSILON0;
        let mut probabilities = HashMap::with_capacity(locus.alleles.len());
        for (allele, &freq) in locus.alleles.iter().zip(locus.frequencies.iter()) {
            probabilities.insert(allele.clone(), (freq - floor_total).max(EPSILON0));
        }
        let mut posterior = LocusPosterior { probabilities };
        posterior.normalize();
        posterior
    }

    /// Seeds the distribution with the reference base at `1 - 3ε₀` and
    /// every other standard base at `ε₀` (spec §4.5 "Initialisation,
    /// uncatalogued case").
    pub fn from_reference(reference_base: u8) -> Self {
        let mut probabilities = HashMap::with_capacity(STANDARD_BASES.len());
        for &base in STANDARD_BASES.iter() {
            let mass = if base == reference_base {
                1.0 - 3.0 * EPSILON0
            } else {
                EPSILON0
            };
            probabilities.insert(vec![base], mass);
        }
        LocusPosterior { probabilities }
    }

    /// Bayesian update from one observed allele string and its
    /// base-quality string: scales each hypothesis' prior mass by the
    /// likelihood of observing `allele` given that hypothesis is truth,
    /// then renormalises (spec §4.5 "Update rule", generalised from a
    /// single base to an arbitrary-length allele).
    pub fn update(&mut self, observed_allele: &[u8], qualities: &[u8]) {
        if !self.probabilities.contains_key(observed_allele) {
            self.probabilities.insert(observed_allele.to_vec(), EPSILON0);
        }

        for (hypothesis, mass) in self.probabilities.iter_mut() {
            let likelihood = allele_likelihood(hypothesis, observed_allele, qualities);
            *mass *= likelihood;
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        let total: f64 = self.probabilities.values().sum();
        if total <= 0.0 || !total.is_finite() {
            return;
        }
        for mass in self.probabilities.values_mut() {
            *mass /= total;
        }
    }

    /// The most probable allele and its mass, breaking ties by allele
    /// bytes for determinism (spec testable property 4: "sums to 1
    /// within 1e-9").
    pub fn argmax(&self) -> Option<(&[u8], f64)> {
        self.probabilities
            .iter()
            .max_by(|a, b| {
                a.1.partial_cmp(b.1)
                    .unwrap()
                    .then_with(|| b.0.cmp(a.0))
            })
            .map(|(allele, &p)| (allele.as_slice(), p))
    }

    pub fn total_mass(&self) -> f64 {
        self.probabilities.values().sum()
    }
}

/// Likelihood of observing `observed` (with `qualities`) if `hypothesis`
/// is the true allele: the product of per-base correct/incorrect-call
/// terms when lengths match, or a flat mismatch penalty for indel
/// hypotheses of a different length (spec §4.5).
fn allele_likelihood(hypothesis: &[u8], observed: &[u8], qualities: &[u8]) -> f64 {
    if hypothesis.len() != observed.len() {
        return 1e-6;
    }
    observed
        .iter()
        .zip(qualities.iter())
        .zip(hypothesis.iter())
        .map(|((&obs, &q), &hyp)| {
            let correct = (-correct_call_cost(q)).exp();
            if obs == hyp {
                correct
            } else {
                (1.0 - correct).max(1e-12) / 3.0
            }
        })
        .product()
}

/// All per-position posteriors accumulated over a run, keyed by
/// reference position (spec §4.5 "Store").
#[derive(Debug, Default)]
pub struct PosteriorStore {
    loci: HashMap<usize, LocusPosterior>,
}

impl PosteriorStore {
    pub fn new() -> Self {
        PosteriorStore::default()
    }

    /// Applies one allele event, lazily initialising the position's
    /// posterior from the catalogue (if catalogued) or the reference
    /// base (otherwise).
    pub fn apply_event(
        &mut self,
        event: &AlleleEvent,
        catalogue: &VariantCatalogue,
        reference_base: impl FnOnce() -> u8,
    ) {
        let posterior = self.loci.entry(event.position).or_insert_with(|| {
            match catalogue.locus_at(event.position) {
                Some(locus) => LocusPosterior::from_locus(locus),
                None => LocusPosterior::from_reference(reference_base()),
            }
        });
        posterior.update(&event.bases, &event.qualities);
    }

    pub fn get(&self, position: usize) -> Option<&LocusPosterior> {
        self.loci.get(&position)
    }

    pub fn positions(&self) -> impl Iterator<Item = &usize> {
        self.loci.keys()
    }

    pub fn len(&self) -> usize {
        self.loci.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loci.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncatalogued_posterior_sums_to_one() {
        let mut posterior = LocusPosterior::from_reference(b'A');
        posterior.update(b"A", &[b'I']);
        posterior.update(b"A", &[b'I']);
        posterior.update(b"G", &[b'#']);
        assert!((posterior.total_mass() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn repeated_alternative_calls_shift_the_argmax() {
        let mut posterior = LocusPosterior::from_reference(b'A');
        for _ in 0..20 {
            posterior.update(b"G", &[b'I']);
        }
        let (allele, _) = posterior.argmax().unwrap();
        assert_eq!(allele, b"G");
    }

    #[test]
    fn catalogued_posterior_respects_prior_frequencies() {
        let locus = Locus::new(10, vec![b"A".to_vec(), b"T".to_vec()], vec![0.9, 0.1]);
        let posterior = LocusPosterior::from_locus(&locus);
        let (allele, mass) = posterior.argmax().unwrap();
        assert_eq!(allele, b"A");
        assert!(mass > 0.8);
    }

    #[test]
    fn store_apply_event_initialises_lazily() {
        let mut store = PosteriorStore::new();
        let catalogue = VariantCatalogue::new(vec![]);
        let event = AlleleEvent::new(5, b"G".to_vec(), vec![b'I']);
        store.apply_event(&event, &catalogue, || b'A');
        assert!(store.get(5).is_some());
        assert_eq!(store.len(), 1);
    }
}
