//! optimization — likelihood maximization, numerically stable primitives, and
//! the shared optimizer error type.
//!
//! - [`loglik_optimizer`]: `LogLikelihood` trait, `maximize`, finite
//!   differences.
//! - [`numerical_stability`]: log-sum-exp, softmax with an overflow guard, and
//!   the probability floor used inside log-likelihoods.
//! - [`errors`]: [`OptError`](errors::OptError) / `OptResult`.
//!
//! Nothing in this module performs I/O. Progress is reported through
//! `tracing` events only.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
