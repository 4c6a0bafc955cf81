//! Coefficient standard errors from the observed information matrix.
//!
//! Purpose
//! -------
//! Turn a fitted coefficient vector into standard errors without requiring
//! the model to supply second derivatives: the observed information is the
//! finite-difference Jacobian of the negative log-likelihood gradient at `β̂`.
//!
//! Key behaviors
//! -------------
//! - Classical: `se = sqrt(diag(I⁺))`.
//! - Robust (sandwich): `se = sqrt(diag(I⁺ M I⁺))`, with `M` the outer product
//!   of per-choice-set scores built by [`score_outer_product`].
//! - `I⁺` is the eigen pseudo-inverse: eigenvalues `≤ EIGEN_EPS` are dropped,
//!   so a direction the data cannot identify (e.g. a constant column) gets a
//!   zero standard error instead of an error.
//!
//! Testing notes
//! -------------
//! - Quadratic objectives with known curvature check the classical path; a
//!   scaled identity check covers the sandwich path.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::finite_diff::compute_hessian,
    numerical_stability::EIGEN_EPS,
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// Standard errors at `theta_hat`.
///
/// `neg_grad` must map `β` to `-∇ℓ(β)`, so its Jacobian is the observed
/// information. Passing `meat = Some(M)` switches to the sandwich estimator.
///
/// # Errors
/// - Hessian validation failures from
///   [`compute_hessian`](crate::optimization::loglik_optimizer::finite_diff::compute_hessian).
/// - `HessianDimMismatch` if `meat` is not `k × k`.
pub fn calc_standard_errors<F: Fn(&Array1<f64>) -> Array1<f64>>(
    neg_grad: &F, theta_hat: &Array1<f64>, meat: Option<&Array2<f64>>,
) -> OptResult<Array1<f64>> {
    let k = theta_hat.len();
    let obs_info = compute_hessian(neg_grad, theta_hat)?;
    let pinv = pseudo_inverse(&to_dmatrix(&obs_info));
    match meat {
        None => Ok(Array1::from_iter((0..k).map(|i| pinv[(i, i)].max(0.0).sqrt()))),
        Some(m) => {
            if m.dim() != (k, k) {
                return Err(OptError::HessianDimMismatch { expected: k, found: m.dim() });
            }
            let sandwich = &pinv * to_dmatrix(m) * &pinv;
            Ok(Array1::from_iter((0..k).map(|i| sandwich[(i, i)].max(0.0).sqrt())))
        }
    }
}

/// `Σ_i s_i s_iᵀ` over the rows `s_i` of `scores` (one row per choice set).
pub fn score_outer_product(scores: &Array2<f64>) -> Array2<f64> {
    scores.t().dot(scores)
}

// ---- Helper methods ----

fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

/// `Q Λ⁺ Qᵀ` for a symmetric matrix, keeping eigenvalues above `EIGEN_EPS`.
fn pseudo_inverse(sym: &DMatrix<f64>) -> DMatrix<f64> {
    let eigen = sym.clone().symmetric_eigen();
    let q = &eigen.eigenvectors;
    let n = sym.nrows();
    let mut out = DMatrix::<f64>::zeros(n, n);
    for (k, &lambda) in eigen.eigenvalues.iter().enumerate() {
        if lambda <= EIGEN_EPS {
            continue;
        }
        let col = q.column(k);
        out += (col * col.transpose()) / lambda;
    }
    out
}
