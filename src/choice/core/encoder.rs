//! Encoder — choice sets to design matrices in schema column order.
//!
//! Purpose
//! -------
//! Produce, for every choice set, an `A × K` matrix whose columns are exactly
//! `FeatureSchema::feature_cols`. Training, validation, and inference all go
//! through the same two phases.
//!
//! Key behaviors
//! -------------
//! - Phase 1, [`Encoder::encode_raw`] / [`Encoder::encode_candidates_raw`]:
//!   indicator, ASC, and unscaled numeric columns. Interaction columns are
//!   left at zero.
//! - Phase 2, [`RawEncoding::apply_scaling_and_interactions`]: standardize
//!   the numeric columns with a fitted [`Scaler`], then value the
//!   interactions from the *scaled* numerics.
//! - A [`Scaler`] can only be fit from a [`RawEncoding`], so scaling always
//!   sees unscaled values and interactions always see scaled ones.
//!
//! Invariants & assumptions
//! ------------------------
//! - Levels absent from the schema (including base levels) set no indicator;
//!   the row is all-zero across that attribute's indicator block.
//! - ASC column `asc_alt{j}` is set for the alternative at 1-based position
//!   `j`; positions without a column (position 1, or beyond `A` at
//!   inference) set nothing.
//! - Column positions are derived from the schema's group layout, which
//!   `feature_cols` follows by construction and artifacts verify on load.
//!
//! Testing notes
//! -------------
//! - Unit tests check determinism, unseen-level handling, interaction
//!   ordering, and that validation encoding leaves the scaler untouched.
use crate::choice::{
    core::{
        data::{Alternative, ChoiceData, Demographics},
        options::normalize_category,
        scaler::Scaler,
        schema::{Demographic, FeatureSchema, InteractionOperand, NumericFeature},
    },
    errors::{ChoiceError, ChoiceResult},
};
use ndarray::{Array2, ArrayViewMut1};
use std::collections::HashMap;

/// One encoded choice set. `chosen` is `None` for inference candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedSet {
    pub id: usize,
    pub x: Array2<f64>,
    pub chosen: Option<usize>,
}

/// Fully encoded batch, ready for the likelihood or the predictor.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrices {
    pub feature_cols: Vec<String>,
    pub sets: Vec<EncodedSet>,
}

impl DesignMatrices {
    pub fn n_features(&self) -> usize {
        self.feature_cols.len()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Precomputed column lookups for one schema.
#[derive(Debug, Clone)]
pub struct Encoder<'s> {
    schema: &'s FeatureSchema,
    type_cols: HashMap<&'s str, usize>,
    fuel_cols: HashMap<&'s str, usize>,
    numeric_offset: usize,
    asc_offset: usize,
    interactions: Vec<InteractionPlan>,
}

#[derive(Debug, Clone, Copy)]
struct InteractionPlan {
    target: usize,
    demographic: Demographic,
    /// Operand column; `None` when the operand indicator is not in the schema.
    operand: Option<usize>,
}

impl<'s> Encoder<'s> {
    pub fn new(schema: &'s FeatureSchema) -> Self {
        let n_type = schema.type_features.len();
        let n_fuel = schema.fuel_features.len();
        let numeric_offset = n_type + n_fuel;
        let asc_offset = numeric_offset + schema.numeric_features.len();
        let interaction_offset = asc_offset + schema.asc_features.len();

        let level_map = |prefix: &str, names: &'s [String], offset: usize| {
            names
                .iter()
                .enumerate()
                .filter_map(|(i, name)| {
                    name.strip_prefix(prefix).map(|level| (level, offset + i))
                })
                .collect::<HashMap<&'s str, usize>>()
        };
        let type_cols = level_map("type_", &schema.type_features, 0);
        let fuel_cols = level_map("fuel_", &schema.fuel_features, n_type);

        let interactions = schema
            .interactions
            .iter()
            .enumerate()
            .map(|(i, spec)| InteractionPlan {
                target: interaction_offset + i,
                demographic: spec.demographic,
                operand: match &spec.operand {
                    InteractionOperand::Numeric(feature) => schema
                        .numeric_features
                        .iter()
                        .position(|f| f == feature)
                        .map(|k| numeric_offset + k),
                    InteractionOperand::Indicator(name) => {
                        schema.feature_cols.iter().take(interaction_offset).position(|c| c == name)
                    }
                },
            })
            .collect();

        Encoder { schema, type_cols, fuel_cols, numeric_offset, asc_offset, interactions }
    }

    pub fn schema(&self) -> &'s FeatureSchema {
        self.schema
    }

    /// Phase 1 for labelled data.
    pub fn encode_raw(&self, data: &ChoiceData) -> RawEncoding<'s> {
        let k = self.schema.n_features();
        let sets = data
            .sets()
            .iter()
            .map(|set| {
                let mut x = Array2::<f64>::zeros((set.alternatives.len(), k));
                for (j, (alt, row)) in set.alternatives.iter().zip(x.rows_mut()).enumerate() {
                    self.fill_row(alt, j + 1, row);
                }
                RawSet {
                    id: set.id,
                    x,
                    demographics: set.demographics,
                    chosen: Some(set.chosen),
                }
            })
            .collect();
        self.wrap(sets)
    }

    /// Phase 1 for one inference request. Candidates take positions
    /// `1..=n` in input order; category labels are normalized here.
    ///
    /// # Errors
    /// - `EmptyCandidates` for an empty slice.
    /// - `NonFiniteAttribute` if a numeric attribute or the profile is NaN/±∞.
    pub fn encode_candidates_raw(
        &self, candidates: &[Alternative], profile: &Demographics,
    ) -> ChoiceResult<RawEncoding<'s>> {
        if candidates.is_empty() {
            return Err(ChoiceError::EmptyCandidates);
        }
        for (row, alt) in candidates.iter().enumerate() {
            for feature in NumericFeature::ALL {
                let value = feature.value(alt);
                if !value.is_finite() {
                    return Err(ChoiceError::NonFiniteAttribute {
                        row,
                        attribute: feature.name(),
                        value,
                    });
                }
            }
        }
        for demographic in [Demographic::College, Demographic::Hsg2, Demographic::Coml5] {
            let value = demographic.value(profile);
            if !value.is_finite() {
                return Err(ChoiceError::NonFiniteAttribute {
                    row: 0,
                    attribute: demographic.name(),
                    value,
                });
            }
        }

        let mut x = Array2::<f64>::zeros((candidates.len(), self.schema.n_features()));
        for (j, (alt, row)) in candidates.iter().zip(x.rows_mut()).enumerate() {
            let normalized = Alternative {
                vehicle_type: normalize_category(&alt.vehicle_type),
                fuel: normalize_category(&alt.fuel),
                ..alt.clone()
            };
            self.fill_row(&normalized, j + 1, row);
        }
        Ok(self.wrap(vec![RawSet { id: 0, x, demographics: *profile, chosen: None }]))
    }

    fn fill_row(&self, alt: &Alternative, position: usize, mut row: ArrayViewMut1<'_, f64>) {
        if let Some(&c) = self.type_cols.get(alt.vehicle_type.as_str()) {
            row[c] = 1.0;
        }
        if let Some(&c) = self.fuel_cols.get(alt.fuel.as_str()) {
            row[c] = 1.0;
        }
        for (k, feature) in self.schema.numeric_features.iter().enumerate() {
            row[self.numeric_offset + k] = feature.value(alt);
        }
        if position >= 2 && position - 2 < self.schema.asc_features.len() {
            row[self.asc_offset + position - 2] = 1.0;
        }
    }

    fn wrap(&self, sets: Vec<RawSet>) -> RawEncoding<'s> {
        RawEncoding {
            schema: self.schema,
            numeric_offset: self.numeric_offset,
            interactions: self.interactions.clone(),
            sets,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct RawSet {
    id: usize,
    x: Array2<f64>,
    demographics: Demographics,
    chosen: Option<usize>,
}

/// Output of phase 1: unscaled numerics, interaction columns still zero.
#[derive(Debug, Clone)]
pub struct RawEncoding<'s> {
    schema: &'s FeatureSchema,
    numeric_offset: usize,
    interactions: Vec<InteractionPlan>,
    sets: Vec<RawSet>,
}

impl<'s> RawEncoding<'s> {
    pub fn schema(&self) -> &'s FeatureSchema {
        self.schema
    }

    pub fn n_rows(&self) -> usize {
        self.sets.iter().map(|s| s.x.nrows()).sum()
    }

    /// Unscaled values of numeric feature `k` across every row.
    pub fn numeric_values(&self, k: usize) -> impl Iterator<Item = f64> + Clone + '_ {
        let col = self.numeric_offset + k;
        self.sets.iter().flat_map(move |s| s.x.column(col).into_iter().copied())
    }

    /// Phase 2: standardize numerics, then value interactions.
    ///
    /// # Errors
    /// `ScalerMismatch` if `scaler` was fit for different numeric features.
    pub fn apply_scaling_and_interactions(self, scaler: &Scaler) -> ChoiceResult<DesignMatrices> {
        scaler.check_matches(self.schema)?;
        let n_numeric = self.schema.numeric_features.len();
        let sets = self
            .sets
            .into_iter()
            .map(|RawSet { id, mut x, demographics, chosen }| {
                for mut row in x.rows_mut() {
                    for k in 0..n_numeric {
                        let c = self.numeric_offset + k;
                        row[c] = scaler.transform(k, row[c]);
                    }
                    for plan in &self.interactions {
                        let operand = plan.operand.map_or(0.0, |c| row[c]);
                        row[plan.target] = plan.demographic.value(&demographics) * operand;
                    }
                }
                EncodedSet { id, x, chosen }
            })
            .collect();
        Ok(DesignMatrices { feature_cols: self.schema.feature_cols.clone(), sets })
    }
}

/// Both phases with an already-fitted scaler.
pub fn encode_with_scaler(
    schema: &FeatureSchema, scaler: &Scaler, data: &ChoiceData,
) -> ChoiceResult<DesignMatrices> {
    Encoder::new(schema).encode_raw(data).apply_scaling_and_interactions(scaler)
}
