//! optimization::errors — unified error surface for the MLE engine.
//!
//! Every fallible routine in [`crate::optimization`] and the inference helpers
//! built on it returns [`OptResult`]. Backend (argmin) failures are folded into
//! [`OptError`] through `From<argmin::core::Error>`, so callers never match on
//! solver-specific error types.
use argmin::core::{ArgminError, Error};

/// Result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// The log-likelihood has no analytic gradient; finite differences are used.
    GradientNotImplemented,

    /// Gradient length differs from the parameter length.
    GradientDimMismatch { expected: usize, found: usize },

    /// Gradient entry is NaN or infinite.
    InvalidGradient { index: usize, value: f64, reason: &'static str },

    // ---- MLEOptions ----
    /// Gradient-norm tolerance must be finite and positive.
    InvalidTolGrad { tol: f64, reason: &'static str },

    /// Cost-change tolerance must be finite and positive.
    InvalidTolCost { tol: f64, reason: &'static str },

    /// Iteration cap must be positive.
    InvalidMaxIter { max_iter: usize, reason: &'static str },

    /// Neither a tolerance nor an iteration cap was given.
    NoTolerancesProvided,

    /// Unknown line-search name.
    InvalidLineSearch { name: String, reason: &'static str },

    /// L-BFGS history must hold at least one pair.
    InvalidLBFGSMem { mem: usize, reason: &'static str },

    // ---- Cost function ----
    /// Objective evaluated to NaN or ±∞.
    NonFiniteCost { value: f64 },

    // ---- Optimizer outcome ----
    /// Estimated coefficient is NaN or infinite.
    InvalidThetaHat { index: usize, value: f64, reason: &'static str },

    /// Solver finished without a best parameter vector.
    MissingThetaHat,

    // ---- Argmin ----
    InvalidParameter { text: String },
    NotImplemented { text: String },
    NotInitialized { text: String },
    ConditionViolated { text: String },
    CheckPointNotFound { text: String },
    PotentialBug { text: String },
    ImpossibleError { text: String },
    /// Any other argmin error, rendered as text.
    BackendError { text: String },

    // ---- Finite differences ----
    /// Hessian is not `dim × dim`.
    HessianDimMismatch { expected: usize, found: (usize, usize) },

    /// Hessian entry is NaN or infinite.
    InvalidHessian { row: usize, col: usize, value: f64 },

    // ---- Model inputs ----
    /// Coefficient vector length differs from the number of feature columns.
    ThetaLengthMismatch { expected: usize, actual: usize },

    /// Coefficient entry is NaN or infinite.
    InvalidThetaInput { index: usize, value: f64 },

    /// No choice sets to evaluate the likelihood on.
    EmptyChoiceData,

    /// A choice set's design matrix has a different column count than the model.
    DesignWidthMismatch { set_index: usize, expected: usize, found: usize },

    /// A chosen index points outside its choice set.
    ChosenOutOfRange { set_index: usize, chosen: usize, n_alternatives: usize },

    /// A choice set reached the likelihood without a chosen alternative.
    MissingChosen { set_index: usize },

    /// L2 penalty must be finite and non-negative.
    InvalidPenalty { value: f64 },

    // ---- Fallback ----
    UnknownError,
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Gradient ----
            OptError::GradientNotImplemented => {
                write!(f, "Analytic gradient not implemented")
            }
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- MLEOptions ----
            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost change tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::NoTolerancesProvided => {
                write!(f, "No tolerances or iteration cap provided")
            }
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            OptError::InvalidLBFGSMem { mem, reason } => {
                write!(f, "Invalid L-BFGS memory {mem}: {reason}")
            }

            // ---- Cost function ----
            OptError::NonFiniteCost { value } => {
                write!(f, "Non-finite objective value: {value}")
            }

            // ---- Optimizer outcome ----
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid estimated coefficient at index {index}: {value}: {reason}")
            }
            OptError::MissingThetaHat => {
                write!(f, "Solver returned no estimated coefficients")
            }

            // ---- Argmin ----
            OptError::InvalidParameter { text } => write!(f, "Invalid parameter: {text}"),
            OptError::NotImplemented { text } => write!(f, "Not implemented: {text}"),
            OptError::NotInitialized { text } => write!(f, "Not initialized: {text}"),
            OptError::ConditionViolated { text } => write!(f, "Condition violated: {text}"),
            OptError::CheckPointNotFound { text } => write!(f, "Checkpoint not found: {text}"),
            OptError::PotentialBug { text } => write!(f, "Potential bug: {text}"),
            OptError::ImpossibleError { text } => write!(f, "Impossible error: {text}"),
            OptError::BackendError { text } => write!(f, "Backend error: {text}"),

            // ---- Finite differences ----
            OptError::HessianDimMismatch { expected, found } => {
                write!(
                    f,
                    "Hessian dimension mismatch: expected ({expected}, {expected}), found {found:?}"
                )
            }
            OptError::InvalidHessian { row, col, value } => {
                write!(f, "Invalid Hessian at ({row}, {col}): {value}, must be finite")
            }

            // ---- Model inputs ----
            OptError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Coefficient length mismatch: expected {expected}, actual {actual}")
            }
            OptError::InvalidThetaInput { index, value } => {
                write!(f, "Coefficient at index {index} must be finite, got {value}")
            }
            OptError::EmptyChoiceData => {
                write!(f, "No choice sets available for likelihood evaluation")
            }
            OptError::DesignWidthMismatch { set_index, expected, found } => {
                write!(
                    f,
                    "Choice set {set_index} has {found} feature columns, model expects {expected}"
                )
            }
            OptError::ChosenOutOfRange { set_index, chosen, n_alternatives } => {
                write!(
                    f,
                    "Choice set {set_index}: chosen index {chosen} outside 0..{n_alternatives}"
                )
            }
            OptError::MissingChosen { set_index } => {
                write!(f, "Choice set {set_index} has no chosen alternative")
            }
            OptError::InvalidPenalty { value } => {
                write!(f, "L2 penalty must be finite and >= 0, got {value}")
            }

            // ---- Fallback ----
            OptError::UnknownError => write!(f, "Unknown error"),
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        // A user error raised inside a cost/gradient closure travels through
        // argmin boxed; recover it before falling back to the argmin variants.
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}
