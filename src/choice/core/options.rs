//! Choice-model options — configuration for reshaping, schema building,
//! fitting, splitting, and the end-to-end training pipeline.
//!
//! Purpose
//! -------
//! Gather every knob of a training run into validated value types so that the
//! pipeline, the CLI, and tests construct runs the same way. Defaults
//! reproduce the batch training job: six alternatives per choice set, base
//! categories `van` / `gasoline`, `λ = 1e-4`, a 20 % validation share drawn
//! with seed 42.
//!
//! Key behaviors
//! -------------
//! - [`ReshapeOptions`] fixes the number of alternatives `A`.
//! - [`SchemaOptions`] holds the reference categories and the interaction
//!   definitions.
//! - [`FitOptions`] bundles the L2 penalty, optimizer options, and the
//!   standard-error policy.
//! - [`SplitOptions`] controls the seeded train/validation partition.
//! - [`TrainOptions`] packages all of the above.
//!
//! Invariants & assumptions
//! ------------------------
//! - Constructors normalize category names (trim + lowercase) and validate
//!   ranges; struct literals bypass validation and are only used in tests.
//!
//! Testing notes
//! -------------
//! - Unit tests cover defaults, normalization, and every rejection path.
use crate::choice::{
    core::schema::{Demographic, InteractionOperand, InteractionSpec, NumericFeature},
    errors::{ChoiceError, ChoiceResult},
};
use crate::optimization::loglik_optimizer::MLEOptions;
use serde::{Deserialize, Serialize};

/// Alternatives per choice set in the reference survey.
pub const DEFAULT_N_ALTERNATIVES: usize = 6;

pub const DEFAULT_TYPE_BASE: &str = "van";

pub const DEFAULT_FUEL_BASE: &str = "gasoline";

pub const DEFAULT_L2: f64 = 1e-4;

pub const DEFAULT_VALIDATION_FRACTION: f64 = 0.2;

pub const DEFAULT_SEED: u64 = 42;

/// Trim and lowercase a category label.
pub fn normalize_category(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Shape of the wide data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReshapeOptions {
    pub n_alternatives: usize,
}

impl ReshapeOptions {
    pub fn new(n_alternatives: usize) -> ChoiceResult<Self> {
        if n_alternatives < 2 {
            return Err(ChoiceError::InvalidAlternativeCount {
                value: n_alternatives,
                reason: "A choice set needs at least two alternatives.",
            });
        }
        Ok(Self { n_alternatives })
    }
}

impl Default for ReshapeOptions {
    fn default() -> Self {
        Self { n_alternatives: DEFAULT_N_ALTERNATIVES }
    }
}

/// Reference categories and interaction definitions for a new schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaOptions {
    pub type_base: String,
    pub fuel_base: String,
    pub interactions: Vec<InteractionSpec>,
}

impl SchemaOptions {
    /// Build schema options with normalized base categories and the default
    /// interaction set.
    ///
    /// Errors
    /// ------
    /// - `EmptyBaseCategory` if either base is blank after trimming.
    pub fn new(type_base: &str, fuel_base: &str) -> ChoiceResult<Self> {
        let type_base = normalize_category(type_base);
        let fuel_base = normalize_category(fuel_base);
        if type_base.is_empty() {
            return Err(ChoiceError::EmptyBaseCategory { attribute: "type" });
        }
        if fuel_base.is_empty() {
            return Err(ChoiceError::EmptyBaseCategory { attribute: "fuel" });
        }
        Ok(Self { type_base, fuel_base, interactions: default_interactions() })
    }

    /// Replace the interaction list.
    pub fn with_interactions(mut self, interactions: Vec<InteractionSpec>) -> Self {
        self.interactions = interactions;
        self
    }
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            type_base: DEFAULT_TYPE_BASE.to_string(),
            fuel_base: DEFAULT_FUEL_BASE.to_string(),
            interactions: default_interactions(),
        }
    }
}

/// `college × fuel_electric`, `hsg2 × size`, `coml5 × price`.
pub fn default_interactions() -> Vec<InteractionSpec> {
    vec![
        InteractionSpec::new(
            Demographic::College,
            InteractionOperand::Indicator("fuel_electric".to_string()),
        ),
        InteractionSpec::new(Demographic::Hsg2, InteractionOperand::Numeric(NumericFeature::Size)),
        InteractionSpec::new(
            Demographic::Coml5,
            InteractionOperand::Numeric(NumericFeature::Price),
        ),
    ]
}

/// Which coefficient standard errors to compute after fitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StdErrorKind {
    #[default]
    None,
    /// Inverse observed information.
    Classical,
    /// Sandwich estimator clustered by choice set.
    Robust,
}

impl std::str::FromStr for StdErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(StdErrorKind::None),
            "classical" => Ok(StdErrorKind::Classical),
            "robust" => Ok(StdErrorKind::Robust),
            other => Err(format!("unknown standard-error kind '{other}'")),
        }
    }
}

/// Estimation configuration for the conditional logit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    /// Coefficient of `‖β‖²` in the training objective.
    pub l2: f64,
    pub mle_opts: MLEOptions,
    pub std_errors: StdErrorKind,
}

impl FitOptions {
    /// Errors
    /// ------
    /// - `InvalidPenalty` if `l2` is negative, NaN, or infinite.
    pub fn new(l2: f64, mle_opts: MLEOptions, std_errors: StdErrorKind) -> ChoiceResult<Self> {
        if !l2.is_finite() || l2 < 0.0 {
            return Err(ChoiceError::InvalidPenalty { value: l2 });
        }
        Ok(Self { l2, mle_opts, std_errors })
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self { l2: DEFAULT_L2, mle_opts: MLEOptions::default(), std_errors: StdErrorKind::None }
    }
}

/// Seeded train/validation partition by choice set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitOptions {
    pub validation_fraction: f64,
    pub seed: u64,
}

impl SplitOptions {
    pub fn new(validation_fraction: f64, seed: u64) -> ChoiceResult<Self> {
        if !(0.0..1.0).contains(&validation_fraction) {
            return Err(ChoiceError::InvalidValidationFraction { value: validation_fraction });
        }
        Ok(Self { validation_fraction, seed })
    }
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self { validation_fraction: DEFAULT_VALIDATION_FRACTION, seed: DEFAULT_SEED }
    }
}

/// Everything a training run needs besides the data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrainOptions {
    pub reshape: ReshapeOptions,
    pub schema: SchemaOptions,
    pub fit: FitOptions,
    pub split: SplitOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Defaults reproduce the reference training configuration.
    //
    // Given
    // -----
    // - `TrainOptions::default()`.
    //
    // Expect
    // ------
    // - `A = 6`, bases `van`/`gasoline`, three interactions, `λ = 1e-4`,
    //   validation share `0.2`, seed `42`, no standard errors.
    fn defaults_match_reference_training_run() {
        let opts = TrainOptions::default();

        assert_eq!(opts.reshape.n_alternatives, 6);
        assert_eq!(opts.schema.type_base, "van");
        assert_eq!(opts.schema.fuel_base, "gasoline");
        assert_eq!(opts.schema.interactions.len(), 3);
        assert_eq!(opts.fit.l2, 1e-4);
        assert_eq!(opts.fit.std_errors, StdErrorKind::None);
        assert_eq!(opts.split.validation_fraction, 0.2);
        assert_eq!(opts.split.seed, 42);
    }

    #[test]
    // Purpose
    // -------
    // Base categories are normalized and blank ones rejected.
    //
    // Given
    // -----
    // - `("  SUV ", "Diesel")` and `("van", "   ")`.
    //
    // Expect
    // ------
    // - `suv` / `diesel`; `EmptyBaseCategory { attribute: "fuel" }`.
    fn schema_options_normalize_and_reject_blank_bases() {
        let opts = SchemaOptions::new("  SUV ", "Diesel").unwrap();

        assert_eq!(opts.type_base, "suv");
        assert_eq!(opts.fuel_base, "diesel");
        assert_eq!(
            SchemaOptions::new("van", "   "),
            Err(ChoiceError::EmptyBaseCategory { attribute: "fuel" })
        );
    }

    #[test]
    // Purpose
    // -------
    // Range checks on the numeric options.
    //
    // Given
    // -----
    // - `A = 1`, `λ = -1`, `λ = NaN`, validation share `1.0`.
    //
    // Expect
    // ------
    // - Each constructor returns its matching error.
    fn option_constructors_reject_out_of_range_values() {
        assert!(matches!(
            ReshapeOptions::new(1),
            Err(ChoiceError::InvalidAlternativeCount { value: 1, .. })
        ));
        assert!(matches!(
            FitOptions::new(-1.0, MLEOptions::default(), StdErrorKind::None),
            Err(ChoiceError::InvalidPenalty { .. })
        ));
        assert!(FitOptions::new(f64::NAN, MLEOptions::default(), StdErrorKind::None).is_err());
        assert_eq!(
            SplitOptions::new(1.0, 7),
            Err(ChoiceError::InvalidValidationFraction { value: 1.0 })
        );
        assert!(SplitOptions::new(0.0, 7).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Standard-error policy parses from CLI-style strings.
    //
    // Given
    // -----
    // - `"Robust"`, `" classical "`, `"bootstrap"`.
    //
    // Expect
    // ------
    // - `Robust`, `Classical`, and an error.
    fn std_error_kind_parses_case_insensitively() {
        assert_eq!("Robust".parse::<StdErrorKind>(), Ok(StdErrorKind::Robust));
        assert_eq!(" classical ".parse::<StdErrorKind>(), Ok(StdErrorKind::Classical));
        assert!("bootstrap".parse::<StdErrorKind>().is_err());
    }
}
