//! models — estimable discrete-choice models.
//!
//! [`ConditionalLogit`] implements
//! [`LogLikelihood`](crate::optimization::loglik_optimizer::LogLikelihood)
//! over encoded [`DesignMatrices`](crate::choice::core::encoder::DesignMatrices)
//! and drives the L-BFGS optimizer, the unpenalized reporting likelihood,
//! sign checks, and optional standard errors.

pub mod logit;

pub use self::logit::{
    ConditionalLogit, ExpectedSign, FitReport, SignViolation, choice_probabilities,
    sign_violations,
};

pub mod prelude {
    pub use super::logit::{ConditionalLogit, FitReport, choice_probabilities};
}
