//! Distance threshold `D*` and the cost model shared by the fast-path
//! Hamming walk and the DP extender (spec §4.3).

/// Error- and mutation-variance factors `k1`/`k2` from spec §4.3.
pub const K1_ERROR_VARIANCE_FACTOR: f64 = 3.0;
pub const K2_MUTATION_VARIANCE_FACTOR: f64 = 3.0;

/// Negative-log prior rate for a de novo substitution not explained by
/// the catalogue.
pub const SUB_COST: f64 = 3.0;
/// Negative-log prior rate for opening a de novo indel.
pub const GAP_OPEN_COST: f64 = 6.0;
/// Negative-log prior rate for extending a de novo indel by one base.
pub const GAP_EXT_COST: f64 = 1.0;

/// `D* = ceil(eR + k1*sqrt(R*e*(1-e))) + ceil(uR + k2*sqrt(R*u*(1-u)))`
/// (spec §4.3). Expressed as a count of expected errors and variants.
pub fn distance_threshold(read_len: usize, error_rate: f64, mutation_rate: f64) -> usize {
    let r = read_len as f64;
    let error_term = (error_rate * r
        + K1_ERROR_VARIANCE_FACTOR * (r * error_rate * (1.0 - error_rate)).sqrt())
    .ceil();
    let mutation_term = (mutation_rate * r
        + K2_MUTATION_VARIANCE_FACTOR * (r * mutation_rate * (1.0 - mutation_rate)).sqrt())
    .ceil();
    (error_term + mutation_term).max(0.0) as usize
}

/// The negative-log-probability cost of one mismatch against the
/// expected, genome-wide error rate — the same shape as
/// `substitution_cost`, but driven by `error_rate` rather than a
/// single base's Phred quality.
///
/// The extender's DP accumulates quality-weighted negative-log-
/// probabilities (nats), while `distance_threshold` counts expected
/// errors and variants. The two are not the same unit: a single
/// confidently-called mismatch (high Phred quality) costs several
/// nats even though it counts as "one" error. This factor converts
/// the count-based threshold into the DP's cost units by pricing one
/// expected error at the genome-wide rate, so a read whose observed
/// mismatches are no more surprising than the configured error model
/// clears the threshold.
pub fn reference_mismatch_cost(error_rate: f64) -> f64 {
    -(error_rate / 3.0).ln() + SUB_COST
}

/// `distance_threshold`, rescaled into the extender's cost units via
/// `reference_mismatch_cost` (see its doc comment).
pub fn distance_threshold_cost(read_len: usize, error_rate: f64, mutation_rate: f64) -> f64 {
    distance_threshold(read_len, error_rate, mutation_rate) as f64 * reference_mismatch_cost(error_rate)
}

/// Default iteration count for the per-end driver: "a small factor of
/// `D* + 1`" (spec §4.4).
pub fn default_iteration_count(distance_threshold: usize) -> usize {
    4 * (distance_threshold + 1)
}

/// `-log(1 - 10^(-(Q-33)/10))`: cost of a correct base call.
pub fn correct_call_cost(quality: u8) -> f64 {
    let p_err = error_probability(quality);
    -(1.0 - p_err).ln()
}

/// `-log(10^(-(Q-33)/10) / 3) + SUB_COST`: cost of an observed
/// substitution given the base-call error probability.
pub fn substitution_cost(quality: u8) -> f64 {
    let p_err = error_probability(quality);
    -(p_err / 3.0).ln() + SUB_COST
}

/// Phred+33 error probability `10^(-(Q-33)/10)`. `Q == 33` is the
/// "no information" sentinel (spec §7) and yields probability `1`.
pub fn error_probability(quality: u8) -> f64 {
    let q = quality as f64 - 33.0;
    10f64.powf(-q / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn distance_threshold_is_nonnegative_and_monotone_in_length() {
        let short = distance_threshold(40, 0.01, 0.001);
        let long = distance_threshold(150, 0.01, 0.001);
        assert!(long >= short);
    }

    #[test]
    fn quality_33_is_neutral() {
        // Q=33 => error probability 1 => "correct" cost is -log(0) = inf,
        // but it contributes neutrally only in the sense that it signals
        // total uncertainty, not a floor violation (spec §7).
        let p = error_probability(33);
        assert_relative_eq!(p, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn high_quality_favors_the_observed_base() {
        let q = correct_call_cost(40); // Phred 40 (the 'I' fastq char)
        let s = substitution_cost(40);
        assert!(q < s, "a correct call at Q40 must be cheaper than a mismatch");
    }

    #[test]
    fn a_single_expected_error_clears_its_own_rescaled_threshold() {
        // A lone Q40 mismatch should read as "about one error" once the
        // threshold is expressed in the DP's cost units at the same
        // error rate that produced the mismatch.
        let error_rate = 0.01;
        let threshold = reference_mismatch_cost(error_rate);
        assert!(substitution_cost(40) <= threshold * 2.0);
    }

    #[test]
    fn rescaled_threshold_scales_with_read_length() {
        let short = distance_threshold_cost(40, 0.01, 0.001);
        let long = distance_threshold_cost(150, 0.01, 0.001);
        assert!(long >= short);
    }
}
