//! choice — conditional-logit discrete-choice modelling.
//!
//! Purpose
//! -------
//! Everything between a wide survey file and a deployable model: data
//! preparation and encoding ([`core`]), estimation ([`models`]), prediction
//! ([`predict`]), evaluation ([`evaluate`]), persistence ([`artifact`]), and
//! the batch training driver ([`pipeline`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - Schema and scaler are fit on the training split only and never mutated
//!   afterwards; validation and inference reuse them unchanged.
//! - Every design matrix follows `FeatureSchema::feature_cols` column order.
//! - Interaction columns are computed from scaled numerics.
//!
//! Conventions
//! -----------
//! - Alternative positions are 1-based in files and column names
//!   (`price3`, `asc_alt3`) and 0-based in `chosen` indices.
//! - Data-side failures are [`ChoiceError`]; persistence failures are
//!   [`ArtifactError`].

pub mod artifact;
pub mod core;
pub mod errors;
pub mod evaluate;
pub mod models;
pub mod pipeline;
pub mod predict;

pub use self::artifact::{ARTIFACT_FORMAT_VERSION, FitSummary, ModelArtifact};
pub use self::errors::{ArtifactError, ArtifactResult, ChoiceError, ChoiceResult};
pub use self::evaluate::{EvalMetrics, evaluate, evaluate_design};
pub use self::models::{ConditionalLogit, FitReport};
pub use self::pipeline::{train_from_csv, train_pipeline};
pub use self::predict::{Predictor, RankedCandidate, predict_proba};

pub mod prelude {
    pub use super::artifact::ModelArtifact;
    pub use super::core::{
        data::{Alternative, Demographics},
        options::{FitOptions, SchemaOptions, SplitOptions, StdErrorKind, TrainOptions},
    };
    pub use super::errors::{ChoiceError, ChoiceResult};
    pub use super::pipeline::{train_from_csv, train_pipeline};
    pub use super::predict::{Predictor, predict_proba};
}
