//! inference — post-fit uncertainty for conditional-logit coefficients.
//!
//! - [`hessian`]: classical and score-sandwich standard errors from a
//!   finite-difference observed information matrix.
//! - [`summary`]: the Wald table stored in fitted artifacts.

pub mod hessian;
pub mod summary;

pub use self::hessian::{calc_standard_errors, score_outer_product};
pub use self::summary::{CoefficientSummary, wald_table};

pub mod prelude {
    pub use super::hessian::{calc_standard_errors, score_outer_product};
    pub use super::summary::{CoefficientSummary, wald_table};
}
