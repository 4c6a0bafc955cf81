//! numerical_stability — overflow-safe softmax primitives and shared numeric
//! thresholds.
//!
//! Used by the conditional-logit likelihood, the predictor, and the
//! standard-error routines. Pure functions only; no logging, no I/O.

pub mod transformations;

pub use self::transformations::{
    EIGEN_EPS, PROB_FLOOR, floored_ln, stable_softmax, stable_softmax_into,
};

pub mod prelude {
    pub use super::transformations::{
        EIGEN_EPS, PROB_FLOOR, floored_ln, stable_softmax,
    };
}
