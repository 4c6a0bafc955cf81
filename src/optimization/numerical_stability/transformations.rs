//! Stable building blocks for softmax-based likelihoods.
//!
//! Exponentials are always taken after subtracting the maximum utility, so
//! utilities of any magnitude map to probabilities in `[0, 1]` that sum to one
//! without overflow.

/// Floor added to a chosen probability before taking its log, so a
/// probability that underflowed to zero contributes `ln(1e-10)` instead of
/// `-∞`.
pub const PROB_FLOOR: f64 = 1e-10;

/// Eigenvalues of an information matrix at or below this threshold are
/// treated as zero when forming its pseudo-inverse.
pub const EIGEN_EPS: f64 = 1e-10;

/// Softmax of `utilities` written into `out`.
///
/// `out` must have the same length as `utilities`. With finite inputs every
/// entry lies in `[0, 1]` and the entries sum to one up to rounding; the
/// maximal utility always receives a strictly positive probability.
pub fn stable_softmax_into(utilities: &[f64], out: &mut [f64]) {
    debug_assert_eq!(utilities.len(), out.len());
    let max = utilities.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut total = 0.0;
    for (o, &u) in out.iter_mut().zip(utilities) {
        *o = (u - max).exp();
        total += *o;
    }
    for o in out.iter_mut() {
        *o /= total;
    }
}

/// Allocating variant of [`stable_softmax_into`].
pub fn stable_softmax(utilities: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; utilities.len()];
    stable_softmax_into(utilities, &mut out);
    out
}

/// `ln(p + PROB_FLOOR)`.
#[inline]
pub fn floored_ln(p: f64) -> f64 {
    (p + PROB_FLOOR).ln()
}
