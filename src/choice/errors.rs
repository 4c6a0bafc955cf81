//! Errors for the discrete-choice layer: data preparation, schema and
//! encoding, evaluation, and artifact persistence.
//!
//! Two enums are defined:
//! - [`ChoiceError`]: everything between the raw data file and a fitted
//!   coefficient vector, plus inference-time encoding.
//! - [`ArtifactError`]: reading, writing, and validating a persisted model.
//!
//! ## Conventions
//! - `choice_set_id` values are the ids carried by the data (0-based row index
//!   of the wide file); `set_index` values are positions in an encoded batch.
//! - Alternative positions in messages are **1-based**, matching the column
//!   suffixes of the data file.
//! - Optimizer failures are wrapped unchanged in [`ChoiceError::Optimization`],
//!   artifact assembly failures in [`ChoiceError::Artifact`].
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

use crate::optimization::errors::OptError;

/// Result alias for data, schema, encoding, fitting and evaluation paths.
pub type ChoiceResult<T> = Result<T, ChoiceError>;

/// Result alias for artifact persistence.
pub type ArtifactResult<T> = Result<T, ArtifactError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ChoiceError {
    // ---- Options ----
    /// A choice set needs at least two alternatives.
    InvalidAlternativeCount { value: usize, reason: &'static str },

    /// Validation share must lie in `[0, 1)`.
    InvalidValidationFraction { value: f64 },

    /// L2 penalty must be finite and `>= 0`.
    InvalidPenalty { value: f64 },

    /// A base category normalized to the empty string.
    EmptyBaseCategory { attribute: &'static str },

    // ---- Input data ----
    /// Reading the data file failed.
    Read { text: String },

    /// Required column absent from the data file header.
    MissingColumn { column: String },

    /// No usable choice sets.
    EmptyData,

    /// Two rows claim the same alternative position in one choice set.
    DuplicateAlternative { choice_set_id: usize, alternative_id: usize },

    /// Alternative position outside `1..=n_alternatives`.
    InvalidAlternativeId { choice_set_id: usize, alternative_id: usize, n_alternatives: usize },

    /// Choice set does not have exactly `expected` alternatives.
    WrongAlternativeCount { choice_set_id: usize, expected: usize, found: usize },

    /// Choice set does not have exactly one chosen alternative.
    ChosenCountMismatch { choice_set_id: usize, found: usize },

    /// Split left no choice sets for training.
    EmptyTrainingSplit,

    // ---- Schema ----
    /// Configured base category is not among the observed levels.
    MissingBaseCategory { attribute: &'static str, base: String, levels: Vec<String> },

    /// The same column name was generated twice.
    DuplicateFeatureColumn { name: String },

    // ---- Encoding / scaling ----
    /// Scaler was fit on different numeric features than the schema declares.
    ScalerMismatch { expected: Vec<String>, found: Vec<String> },

    /// A numeric attribute handed to the encoder is NaN or infinite.
    NonFiniteAttribute { row: usize, attribute: &'static str, value: f64 },

    /// Inference was asked to score zero candidates.
    EmptyCandidates,

    /// Coefficient vector does not match the design width.
    CoefficientLengthMismatch { expected: usize, actual: usize },

    // ---- Evaluation ----
    /// Predictions and ground truth have different lengths.
    EvaluationLengthMismatch { predictions: usize, chosen: usize },

    /// Chosen index outside the prediction vector.
    ChosenOutOfRange { set_index: usize, chosen: usize, n_alternatives: usize },

    /// Choice set passed to evaluation without a chosen alternative.
    UnlabelledChoiceSet { set_index: usize },

    // ---- Estimation ----
    /// Optimizer or inference failure.
    Optimization(OptError),
    /// A freshly trained model failed artifact validation.
    Artifact(ArtifactError),
}

impl std::error::Error for ChoiceError {}

impl std::fmt::Display for ChoiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Options ----
            ChoiceError::InvalidAlternativeCount { value, reason } => {
                write!(f, "Invalid number of alternatives {value}: {reason}")
            }
            ChoiceError::InvalidValidationFraction { value } => {
                write!(f, "Validation fraction must lie in [0, 1); got {value}")
            }
            ChoiceError::InvalidPenalty { value } => {
                write!(f, "L2 penalty must be finite and >= 0; got {value}")
            }
            ChoiceError::EmptyBaseCategory { attribute } => {
                write!(f, "Base category for '{attribute}' is empty after normalization")
            }

            // ---- Input data ----
            ChoiceError::Read { text } => write!(f, "Failed to read choice data: {text}"),
            ChoiceError::MissingColumn { column } => {
                write!(f, "Required column '{column}' is missing from the data file")
            }
            ChoiceError::EmptyData => write!(f, "No usable choice sets in the data"),
            ChoiceError::DuplicateAlternative { choice_set_id, alternative_id } => {
                write!(
                    f,
                    "Choice set {choice_set_id} lists alternative {alternative_id} more than once"
                )
            }
            ChoiceError::InvalidAlternativeId { choice_set_id, alternative_id, n_alternatives } => {
                write!(
                    f,
                    "Choice set {choice_set_id}: alternative position {alternative_id} outside 1..={n_alternatives}"
                )
            }
            ChoiceError::WrongAlternativeCount { choice_set_id, expected, found } => {
                write!(
                    f,
                    "Choice set {choice_set_id} has {found} alternatives, expected exactly {expected}"
                )
            }
            ChoiceError::ChosenCountMismatch { choice_set_id, found } => {
                write!(
                    f,
                    "Choice set {choice_set_id} has {found} chosen alternatives, expected exactly 1"
                )
            }
            ChoiceError::EmptyTrainingSplit => {
                write!(f, "Train/validation split left no training choice sets")
            }

            // ---- Schema ----
            ChoiceError::MissingBaseCategory { attribute, base, levels } => {
                write!(
                    f,
                    "Base category '{base}' for '{attribute}' not found in training levels {levels:?}"
                )
            }
            ChoiceError::DuplicateFeatureColumn { name } => {
                write!(f, "Feature column '{name}' is generated more than once")
            }

            // ---- Encoding / scaling ----
            ChoiceError::ScalerMismatch { expected, found } => {
                write!(f, "Scaler features {found:?} do not match schema numerics {expected:?}")
            }
            ChoiceError::NonFiniteAttribute { row, attribute, value } => {
                write!(f, "Attribute '{attribute}' of row {row} must be finite; got {value}")
            }
            ChoiceError::EmptyCandidates => write!(f, "No candidate alternatives to score"),
            ChoiceError::CoefficientLengthMismatch { expected, actual } => {
                write!(
                    f,
                    "Coefficient vector has length {actual}, design has {expected} feature columns"
                )
            }

            // ---- Evaluation ----
            ChoiceError::EvaluationLengthMismatch { predictions, chosen } => {
                write!(f, "Got {predictions} prediction vectors but {chosen} chosen indices")
            }
            ChoiceError::ChosenOutOfRange { set_index, chosen, n_alternatives } => {
                write!(
                    f,
                    "Choice set {set_index}: chosen index {chosen} outside 0..{n_alternatives}"
                )
            }
            ChoiceError::UnlabelledChoiceSet { set_index } => {
                write!(f, "Choice set {set_index} has no chosen alternative to evaluate against")
            }

            // ---- Estimation ----
            ChoiceError::Optimization(err) => write!(f, "Estimation failed: {err}"),
            ChoiceError::Artifact(err) => write!(f, "Trained model is not a valid artifact: {err}"),
        }
    }
}

impl From<OptError> for ChoiceError {
    fn from(err: OptError) -> ChoiceError {
        ChoiceError::Optimization(err)
    }
}

impl From<ArtifactError> for ChoiceError {
    fn from(err: ArtifactError) -> ChoiceError {
        ChoiceError::Artifact(err)
    }
}

impl From<csv::Error> for ChoiceError {
    fn from(err: csv::Error) -> ChoiceError {
        ChoiceError::Read { text: err.to_string() }
    }
}

impl From<std::io::Error> for ChoiceError {
    fn from(err: std::io::Error) -> ChoiceError {
        ChoiceError::Read { text: err.to_string() }
    }
}

/// Convert a [`ChoiceError`] into a Python `ValueError` carrying its message.
#[cfg(feature = "python-bindings")]
impl From<ChoiceError> for PyErr {
    fn from(err: ChoiceError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// Failures while persisting or restoring a [`ModelArtifact`](super::artifact::ModelArtifact).
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactError {
    // ---- I/O and formats ----
    Io { text: String },
    Json { text: String },
    Csv { text: String },

    // ---- Compatibility ----
    /// `format_version` this build does not understand.
    UnsupportedVersion { found: u32, supported: u32 },

    /// Coefficient count differs from `feature_cols`.
    CoefficientLengthMismatch { coefficients: usize, feature_cols: usize },

    /// A coefficient is NaN or infinite.
    NonFiniteCoefficient { index: usize, value: f64 },

    /// `feature_cols` repeats a name.
    DuplicateFeatureColumn { name: String },

    /// `feature_cols` is not the concatenation of the schema's column groups.
    InconsistentSchema { reason: String },

    /// Scaler does not cover exactly the schema's numeric features, or holds a
    /// non-positive or non-finite parameter.
    InvalidScaler { reason: String },
}

impl std::error::Error for ArtifactError {}

impl std::fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactError::Io { text } => write!(f, "Artifact I/O error: {text}"),
            ArtifactError::Json { text } => write!(f, "Artifact JSON error: {text}"),
            ArtifactError::Csv { text } => write!(f, "Coefficient CSV error: {text}"),
            ArtifactError::UnsupportedVersion { found, supported } => {
                write!(f, "Unsupported artifact format_version {found}; this build reads {supported}")
            }
            ArtifactError::CoefficientLengthMismatch { coefficients, feature_cols } => {
                write!(
                    f,
                    "Artifact has {coefficients} coefficients but {feature_cols} feature columns"
                )
            }
            ArtifactError::NonFiniteCoefficient { index, value } => {
                write!(f, "Artifact coefficient {index} is not finite: {value}")
            }
            ArtifactError::DuplicateFeatureColumn { name } => {
                write!(f, "Artifact feature column '{name}' appears more than once")
            }
            ArtifactError::InconsistentSchema { reason } => {
                write!(f, "Artifact schema is inconsistent: {reason}")
            }
            ArtifactError::InvalidScaler { reason } => {
                write!(f, "Artifact scaler is invalid: {reason}")
            }
        }
    }
}

impl From<std::io::Error> for ArtifactError {
    fn from(err: std::io::Error) -> ArtifactError {
        ArtifactError::Io { text: err.to_string() }
    }
}

impl From<serde_json::Error> for ArtifactError {
    fn from(err: serde_json::Error) -> ArtifactError {
        ArtifactError::Json { text: err.to_string() }
    }
}

impl From<csv::Error> for ArtifactError {
    fn from(err: csv::Error) -> ArtifactError {
        ArtifactError::Csv { text: err.to_string() }
    }
}

/// Convert an [`ArtifactError`] into a Python `ValueError` carrying its message.
#[cfg(feature = "python-bindings")]
impl From<ArtifactError> for PyErr {
    fn from(err: ArtifactError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
