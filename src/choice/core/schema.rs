//! Feature schema — the column contract shared by training and inference.
//!
//! Purpose
//! -------
//! Fix, from the training split alone, which categorical levels exist, which
//! are the reference levels, and the exact ordered list of feature columns
//! (`feature_cols`) every design matrix must follow afterwards.
//!
//! Key behaviors
//! -------------
//! - [`FeatureSchema::fit`] collects sorted unique `type` / `fuel` levels,
//!   fails if a configured base level is absent, and emits columns in the
//!   order: type indicators, fuel indicators, numeric features, ASC
//!   indicators for positions `2..=A`, interactions.
//! - Interaction columns are declared here but valued by the encoder, after
//!   scaling.
//!
//! Invariants & assumptions
//! ------------------------
//! - `feature_cols` is never reordered after `fit`; a schema is a value object
//!   and every field is read-only by convention.
//! - `feature_cols` equals [`FeatureSchema::expected_columns`]; artifacts
//!   check this on load.
//!
//! Conventions
//! -----------
//! - Indicator names: `type_{level}`, `fuel_{level}`, `asc_alt{j}`.
//! - Interaction names: `{demographic}_x_{operand}`, e.g. `hsg2_x_size`.
use crate::choice::{
    core::{
        data::{Alternative, ChoiceData, Demographics},
        options::SchemaOptions,
    },
    errors::{ChoiceError, ChoiceResult},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// The four scaled numeric attributes, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericFeature {
    Price,
    Speed,
    Pollution,
    Size,
}

impl NumericFeature {
    pub const ALL: [NumericFeature; 4] =
        [NumericFeature::Price, NumericFeature::Speed, NumericFeature::Pollution, NumericFeature::Size];

    pub fn name(self) -> &'static str {
        match self {
            NumericFeature::Price => "price",
            NumericFeature::Speed => "speed",
            NumericFeature::Pollution => "pollution",
            NumericFeature::Size => "size",
        }
    }

    pub fn value(self, alt: &Alternative) -> f64 {
        match self {
            NumericFeature::Price => alt.price,
            NumericFeature::Speed => alt.speed,
            NumericFeature::Pollution => alt.pollution,
            NumericFeature::Size => alt.size,
        }
    }
}

/// Choice-set-level covariates usable in interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Demographic {
    College,
    Hsg2,
    Coml5,
}

impl Demographic {
    pub fn name(self) -> &'static str {
        match self {
            Demographic::College => "college",
            Demographic::Hsg2 => "hsg2",
            Demographic::Coml5 => "coml5",
        }
    }

    pub fn value(self, d: &Demographics) -> f64 {
        match self {
            Demographic::College => d.college,
            Demographic::Hsg2 => d.hsg2,
            Demographic::Coml5 => d.coml5,
        }
    }
}

/// Second factor of an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "column", rename_all = "lowercase")]
pub enum InteractionOperand {
    /// An indicator column such as `fuel_electric`. If the schema has no
    /// such column the interaction is identically zero.
    Indicator(String),
    /// A scaled numeric feature.
    Numeric(NumericFeature),
}

impl InteractionOperand {
    pub fn column_name(&self) -> &str {
        match self {
            InteractionOperand::Indicator(name) => name,
            InteractionOperand::Numeric(feature) => feature.name(),
        }
    }
}

/// `demographic × operand`, emitted as column `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionSpec {
    pub name: String,
    pub demographic: Demographic,
    pub operand: InteractionOperand,
}

impl InteractionSpec {
    pub fn new(demographic: Demographic, operand: InteractionOperand) -> Self {
        let name = format!("{}_x_{}", demographic.name(), operand.column_name());
        InteractionSpec { name, demographic, operand }
    }
}

/// Levels, bases, and column order derived from training data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub type_base: String,
    pub fuel_base: String,
    /// Sorted unique `type` levels seen in training, base included.
    pub type_levels: Vec<String>,
    /// Sorted unique `fuel` levels seen in training, base included.
    pub fuel_levels: Vec<String>,
    pub type_features: Vec<String>,
    pub fuel_features: Vec<String>,
    pub numeric_features: Vec<NumericFeature>,
    pub asc_features: Vec<String>,
    pub interactions: Vec<InteractionSpec>,
    pub n_alternatives: usize,
    pub feature_cols: Vec<String>,
}

impl FeatureSchema {
    /// Derive the schema from training choice sets.
    ///
    /// Errors
    /// ------
    /// - `MissingBaseCategory` if `type_base` or `fuel_base` never occurs.
    /// - `DuplicateFeatureColumn` if an interaction name collides with another
    ///   column.
    pub fn fit(train: &ChoiceData, opts: &SchemaOptions) -> ChoiceResult<Self> {
        let mut types = BTreeSet::new();
        let mut fuels = BTreeSet::new();
        for alt in train.sets().iter().flat_map(|s| s.alternatives.iter()) {
            types.insert(alt.vehicle_type.clone());
            fuels.insert(alt.fuel.clone());
        }
        let type_levels: Vec<String> = types.into_iter().collect();
        let fuel_levels: Vec<String> = fuels.into_iter().collect();
        check_base("type", &opts.type_base, &type_levels)?;
        check_base("fuel", &opts.fuel_base, &fuel_levels)?;

        let indicators = |prefix: &str, levels: &[String], base: &str| -> Vec<String> {
            levels.iter().filter(|l| *l != base).map(|l| format!("{prefix}_{l}")).collect()
        };
        let type_features = indicators("type", &type_levels, &opts.type_base);
        let fuel_features = indicators("fuel", &fuel_levels, &opts.fuel_base);
        let asc_features = (2..=train.n_alternatives()).map(|j| format!("asc_alt{j}")).collect();

        let mut schema = FeatureSchema {
            type_base: opts.type_base.clone(),
            fuel_base: opts.fuel_base.clone(),
            type_levels,
            fuel_levels,
            type_features,
            fuel_features,
            numeric_features: NumericFeature::ALL.to_vec(),
            asc_features,
            interactions: opts.interactions.clone(),
            n_alternatives: train.n_alternatives(),
            feature_cols: Vec::new(),
        };
        schema.feature_cols = schema.expected_columns();
        if let Some(name) = first_duplicate(&schema.feature_cols) {
            return Err(ChoiceError::DuplicateFeatureColumn { name: name.to_string() });
        }
        Ok(schema)
    }

    /// Concatenation of the column groups in canonical order.
    pub fn expected_columns(&self) -> Vec<String> {
        self.type_features
            .iter()
            .chain(&self.fuel_features)
            .cloned()
            .chain(self.numeric_features.iter().map(|f| f.name().to_string()))
            .chain(self.asc_features.iter().cloned())
            .chain(self.interactions.iter().map(|i| i.name.clone()))
            .collect()
    }

    pub fn n_features(&self) -> usize {
        self.feature_cols.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.feature_cols.iter().position(|c| c == name)
    }

    /// Numeric feature names in column order.
    pub fn numeric_names(&self) -> Vec<String> {
        self.numeric_features.iter().map(|f| f.name().to_string()).collect()
    }
}

/// First name that occurs twice in `cols`, if any.
pub fn first_duplicate(cols: &[String]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(cols.len());
    cols.iter().find(|c| !seen.insert(c.as_str())).map(String::as_str)
}

fn check_base(attribute: &'static str, base: &str, levels: &[String]) -> ChoiceResult<()> {
    if levels.iter().any(|l| l == base) {
        Ok(())
    } else {
        Err(ChoiceError::MissingBaseCategory {
            attribute,
            base: base.to_string(),
            levels: levels.to_vec(),
        })
    }
}
