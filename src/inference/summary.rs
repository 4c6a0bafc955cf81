//! Wald table for fitted coefficients.
use crate::optimization::errors::{OptError, OptResult};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;

/// One row of the coefficient table.
///
/// `z` and `p_value` are `None` when the standard error is zero (an
/// unidentified coefficient), since the Wald statistic is undefined there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientSummary {
    pub feature: String,
    pub beta: f64,
    pub std_err: f64,
    pub z: Option<f64>,
    pub p_value: Option<f64>,
}

/// Pair each coefficient with its standard error, z statistic and two-sided
/// standard-normal p-value `erfc(|z| / √2)`.
///
/// # Errors
/// `ThetaLengthMismatch` if `features`, `beta` and `std_err` differ in length.
pub fn wald_table(
    features: &[String], beta: &Array1<f64>, std_err: &Array1<f64>,
) -> OptResult<Vec<CoefficientSummary>> {
    if beta.len() != features.len() {
        return Err(OptError::ThetaLengthMismatch { expected: features.len(), actual: beta.len() });
    }
    if std_err.len() != features.len() {
        return Err(OptError::ThetaLengthMismatch {
            expected: features.len(),
            actual: std_err.len(),
        });
    }
    Ok(features
        .iter()
        .zip(beta.iter().zip(std_err.iter()))
        .map(|(feature, (&b, &se))| {
            let (z, p_value) = if se > 0.0 && se.is_finite() {
                let z = b / se;
                (Some(z), Some(erfc(z.abs() / std::f64::consts::SQRT_2)))
            } else {
                (None, None)
            };
            CoefficientSummary { feature: feature.clone(), beta: b, std_err: se, z, p_value }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // z statistics and p-values follow the standard normal.
    //
    // Given
    // -----
    // - `beta = [1.96, 0.5]`, `se = [1, 0]`.
    //
    // Expect
    // ------
    // - Row 0: `z = 1.96`, `p ≈ 0.05`. Row 1: no z, no p-value.
    fn wald_table_reports_two_sided_p_values() {
        let names = vec!["price".to_string(), "speed".to_string()];

        let rows = wald_table(&names, &array![1.96, 0.5], &array![1.0, 0.0]).unwrap();

        assert_eq!(rows[0].feature, "price");
        assert_abs_diff_eq!(rows[0].z.unwrap(), 1.96, epsilon = 1e-12);
        assert_abs_diff_eq!(rows[0].p_value.unwrap(), 0.05, epsilon = 1e-3);
        assert_eq!(rows[1].z, None);
        assert_eq!(rows[1].p_value, None);
    }

    #[test]
    // Purpose
    // -------
    // Misaligned inputs are rejected.
    //
    // Given
    // -----
    // - One feature name, two coefficients.
    //
    // Expect
    // ------
    // - `ThetaLengthMismatch { expected: 1, actual: 2 }`.
    fn wald_table_rejects_length_mismatch() {
        let names = vec!["price".to_string()];

        let err = wald_table(&names, &array![1.0, 2.0], &array![1.0]).unwrap_err();

        assert_eq!(err, OptError::ThetaLengthMismatch { expected: 1, actual: 2 });
    }
}
