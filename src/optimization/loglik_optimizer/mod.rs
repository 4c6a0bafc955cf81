//! loglik_optimizer — maximum-likelihood fitting on top of argmin's L-BFGS.
//!
//! Purpose
//! -------
//! Let a model describe its log-likelihood `ℓ(β)` once, through
//! [`LogLikelihood`], and get back a fitted coefficient vector with
//! convergence diagnostics from [`maximize`].
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] turns the maximization into argmin's
//!   minimization of `c(β) = -ℓ(β)`.
//! - [`builders`] configure L-BFGS for the chosen [`traits::LineSearcher`];
//!   [`run::run_lbfgs`] executes it and logs start/finish through `tracing`.
//! - [`finite_diff`] supplies gradients when a model has none and Hessians
//!   for post-fit inference.
//!
//! Conventions
//! -----------
//! - Models return `ℓ` and `∇ℓ`, never the cost. [`OptimOutcome::value`] is
//!   reported on the `ℓ` scale.
//! - Reaching the iteration cap is not convergence: the best iterate is still
//!   returned, with `converged == false`.
//! - Errors are [`OptError`](crate::optimization::errors::OptError); nothing
//!   here panics on bad numeric input.
//!
//! Testing notes
//! -------------
//! - Submodules test their local contracts. `api` fits a one-parameter binary
//!   logit with both line searches and with finite differences.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

pub use self::api::maximize;
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Hessian, Theta};

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}
