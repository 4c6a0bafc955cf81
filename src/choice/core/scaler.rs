//! Standardization of the numeric attributes.
use crate::choice::{
    core::{encoder::RawEncoding, schema::{FeatureSchema, NumericFeature}},
    errors::{ChoiceError, ChoiceResult},
};
use serde::{Deserialize, Serialize};

/// Per-feature location and scale: `z = (x - mean) / scale`.
///
/// `scale` is the population standard deviation (ddof 0) of the training
/// values, or `1.0` when that deviation is numerically zero, so a constant
/// column maps to zeros rather than to NaN. Once fit, a scaler is never
/// modified; validation and inference reuse it as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub features: Vec<NumericFeature>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler {
    /// Fit on the unscaled numeric columns of a training encoding.
    ///
    /// # Errors
    /// `EmptyData` if the encoding has no rows.
    pub fn fit(raw: &RawEncoding<'_>) -> ChoiceResult<Scaler> {
        if raw.n_rows() == 0 {
            return Err(ChoiceError::EmptyData);
        }
        let features = raw.schema().numeric_features.clone();
        let mut mean = Vec::with_capacity(features.len());
        let mut scale = Vec::with_capacity(features.len());
        for k in 0..features.len() {
            let (m, s) = mean_and_scale(raw.numeric_values(k));
            mean.push(m);
            scale.push(s);
        }
        Ok(Scaler { features, mean, scale })
    }

    /// Standardize `x` as feature `k`.
    #[inline]
    pub fn transform(&self, k: usize, x: f64) -> f64 {
        (x - self.mean[k]) / self.scale[k]
    }

    /// The scaler must cover exactly the schema's numeric features, in order.
    pub fn check_matches(&self, schema: &FeatureSchema) -> ChoiceResult<()> {
        if self.features != schema.numeric_features
            || self.mean.len() != self.features.len()
            || self.scale.len() != self.features.len()
        {
            return Err(ChoiceError::ScalerMismatch {
                expected: schema.numeric_names(),
                found: self.features.iter().map(|f| f.name().to_string()).collect(),
            });
        }
        Ok(())
    }
}

fn mean_and_scale(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let (sum, n) = values.clone().fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
    let mean = sum / n as f64;
    let var = values.map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    let std = var.sqrt();
    // Rounding in `mean` leaves a constant column with a tiny non-zero spread.
    let scale = if std > 10.0 * f64::EPSILON * mean.abs().max(1.0) { std } else { 1.0 };
    (mean, scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    // Purpose
    // -------
    // Population standard deviation is used.
    //
    // Given
    // -----
    // - Values `[1, 2, 3, 4]`.
    //
    // Expect
    // ------
    // - `mean = 2.5`, `scale = sqrt(1.25)`.
    fn mean_and_scale_uses_population_std() {
        let (m, s) = mean_and_scale([1.0, 2.0, 3.0, 4.0].into_iter());

        assert_relative_eq!(m, 2.5);
        assert_relative_eq!(s, 1.25_f64.sqrt());
    }

    #[test]
    // Purpose
    // -------
    // A constant column gets unit scale even when the mean is inexact.
    //
    // Given
    // -----
    // - Ten copies of `0.1`.
    //
    // Expect
    // ------
    // - `scale == 1.0` and transformed values `≈ 0`.
    fn constant_column_gets_unit_scale() {
        let (m, s) = mean_and_scale(std::iter::repeat(0.1).take(10));

        assert_eq!(s, 1.0);
        assert!((0.1 - m).abs() < 1e-15);
    }
}
