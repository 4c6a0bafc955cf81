//! loglik_optimizer::finite_diff — numerical derivatives with validation.
//!
//! Purpose
//! -------
//! Supply gradients for log-likelihoods that do not implement
//! [`LogLikelihood::grad`](super::LogLikelihood::grad), and observed-information
//! Hessians for post-fit standard errors, without exposing the `finitediff`
//! API to the rest of the crate.
//!
//! Key behaviors
//! -------------
//! - [`fd_gradient`] tries central differences first and falls back to
//!   forward differences when the objective fails or the central estimate is
//!   not finite.
//! - [`run_fd_diff`] is the forward-difference step with error capture.
//! - [`compute_hessian`] differentiates a gradient map (central, then
//!   forward) and symmetrizes the result.
//!
//! Conventions
//! -----------
//! - `finitediff` closures must return plain `f64`, so objective errors are
//!   parked in a `RefCell<Option<Error>>` and the closure returns `NaN`; the
//!   parked error is re-raised once differencing finishes.
//! - Every gradient or Hessian leaving this module has passed
//!   [`validate_grad`] / [`validate_hessian`].
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        Grad, Theta,
        types::Hessian,
        validation::{validate_grad, validate_hessian},
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Finite-difference gradient of a fallible scalar objective.
///
/// Central differences are used when every evaluation succeeds and the
/// estimate is finite; otherwise the gradient is recomputed with forward
/// differences, and any objective error raised there is returned.
pub fn fd_gradient<G>(theta: &Theta, objective: &G) -> Result<Grad, Error>
where
    G: Fn(&Theta) -> Result<f64, Error>,
{
    let closure_err: RefCell<Option<Error>> = RefCell::new(None);
    let func = |x: &Theta| -> f64 {
        match objective(x) {
            Ok(v) => v,
            Err(e) => {
                let mut slot = closure_err.borrow_mut();
                if slot.is_none() {
                    *slot = Some(e);
                }
                f64::NAN
            }
        }
    };
    let central = theta.central_diff(&func);
    if closure_err.borrow().is_none() && validate_grad(&central, theta.len()).is_ok() {
        return Ok(central);
    }
    Ok(run_fd_diff(theta, &func, &closure_err)?)
}

/// Forward-difference gradient of `func` at `theta`.
///
/// Clears `closure_err`, differentiates, then returns the first error the
/// closure parked (if any) before validating the gradient.
///
/// # Errors
/// - The parked closure error, converted into `OptError`.
/// - `GradientDimMismatch` / `InvalidGradient` from validation.
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

/// Hessian of the scalar function whose gradient map is `f`, evaluated at
/// `theta`.
///
/// Passing `β ↦ -∇ℓ(β)` yields the observed information matrix. The central
/// scheme is tried first; only the forward-scheme validation error is
/// surfaced when both fail. The returned matrix is symmetric.
pub fn compute_hessian<F: Fn(&Theta) -> Grad>(f: &F, theta: &Theta) -> OptResult<Hessian> {
    let dim = theta.len();
    let mut hess = theta.central_hessian(f);
    if validate_hessian(&hess, dim).is_err() {
        hess = theta.forward_hessian(f);
        validate_hessian(&hess, dim)?;
    }
    symmetrize_hess(&mut hess);
    Ok(hess)
}

// ---- Helper methods ----

/// Replace each off-diagonal pair by its average. Diagonal is untouched.
fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}
