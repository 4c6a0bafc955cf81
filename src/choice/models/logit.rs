//! Conditional logit: penalized log-likelihood, analytic gradient, fitting.
//!
//! For choice set `i` with design `X_i` (`A × K`) the utilities are
//! `U_i = X_i β` and the choice probabilities `P_i = softmax(U_i)`, computed
//! with max-subtraction. The training objective maximized by L-BFGS is
//!
//! `ℓ_λ(β) = Σ_i ln(P_i,c(i) + 1e-10) − λ‖β‖²`
//!
//! and its gradient is `Σ_i w_i X_iᵀ(y_i − P_i) − 2λβ` with
//! `w_i = P_c / (P_c + 1e-10)`, the exact derivative of the floored log.
//!
//! Per-set terms are independent; with the `parallel` feature they are
//! evaluated on the rayon pool and summed in set order, so results do not
//! depend on the thread count.
use crate::{
    choice::{
        core::{
            encoder::{DesignMatrices, EncodedSet},
            options::{FitOptions, StdErrorKind},
        },
        errors::ChoiceResult,
    },
    inference::{CoefficientSummary, calc_standard_errors, score_outer_product, wald_table},
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{
            Grad, LogLikelihood, OptimOutcome, Theta, maximize,
            validation::validate_theta_input,
        },
        numerical_stability::{PROB_FLOOR, floored_ln, stable_softmax},
    },
};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Softmax choice probabilities for one choice set.
///
/// `x` must have `beta.len()` columns; callers that cannot guarantee this go
/// through [`predict_proba`](crate::choice::predict::predict_proba).
pub fn choice_probabilities(beta: &Array1<f64>, x: &Array2<f64>) -> Array1<f64> {
    let utilities = x.dot(beta);
    Array1::from(stable_softmax(&utilities.to_vec()))
}

/// Direction a coefficient is expected to take on economic grounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedSign {
    Negative,
    Positive,
    NonNegative,
}

impl ExpectedSign {
    pub fn holds(self, beta: f64) -> bool {
        match self {
            ExpectedSign::Negative => beta < 0.0,
            ExpectedSign::Positive => beta > 0.0,
            ExpectedSign::NonNegative => beta >= 0.0,
        }
    }
}

/// Advisory sign expectations for the numeric attributes.
pub const EXPECTED_SIGNS: [(&str, ExpectedSign); 4] = [
    ("price", ExpectedSign::Negative),
    ("pollution", ExpectedSign::Negative),
    ("speed", ExpectedSign::Positive),
    ("size", ExpectedSign::NonNegative),
];

/// A fitted coefficient whose sign contradicts [`EXPECTED_SIGNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignViolation {
    pub feature: String,
    pub beta: f64,
    pub expected: ExpectedSign,
}

/// Sign checks for whichever of the expected features appear in
/// `feature_cols`. Never an error; the caller decides how loudly to report.
pub fn sign_violations(feature_cols: &[String], beta: &Array1<f64>) -> Vec<SignViolation> {
    EXPECTED_SIGNS
        .iter()
        .filter_map(|&(name, expected)| {
            let idx = feature_cols.iter().position(|c| c == name)?;
            let b = *beta.get(idx)?;
            (!expected.holds(b)).then(|| SignViolation { feature: name.to_string(), beta: b, expected })
        })
        .collect()
}

/// Everything a fit produces besides the solver trace.
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    pub coefficients: Array1<f64>,
    pub feature_cols: Vec<String>,
    /// Unpenalized `Σ ln(P_c + 1e-10)` at the optimum.
    pub log_likelihood: f64,
    /// Penalized objective at the optimum.
    pub objective: f64,
    pub n_observations: usize,
    pub l2: f64,
    pub converged: bool,
    pub iterations: usize,
    pub status: String,
    pub std_errors: Option<Vec<CoefficientSummary>>,
    pub sign_violations: Vec<SignViolation>,
}

/// Conditional (multinomial) logit with an L2 penalty.
///
/// After [`fit`](ConditionalLogit::fit), `results` holds the raw optimizer
/// outcome and `report` the reporting-side summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalLogit {
    pub options: FitOptions,
    pub results: Option<OptimOutcome>,
    pub report: Option<FitReport>,
}

impl ConditionalLogit {
    pub fn new(options: FitOptions) -> ConditionalLogit {
        ConditionalLogit { options, results: None, report: None }
    }

    /// Fit by maximum penalized likelihood from `β = 0`.
    ///
    /// Non-convergence within the iteration cap is logged and the best
    /// iterate is kept. Standard errors follow `options.std_errors`.
    ///
    /// # Errors
    /// - Data checks of [`LogLikelihood::check`] (empty data, width or chosen
    ///   index problems), wrapped in `ChoiceError::Optimization`.
    /// - Solver and standard-error failures, likewise wrapped.
    pub fn fit(&mut self, data: &DesignMatrices) -> ChoiceResult<&FitReport> {
        let theta0 = Array1::zeros(data.n_features());
        let outcome = maximize(&*self, theta0, data, &self.options.mle_opts)?;
        if !outcome.converged {
            warn!(
                status = %outcome.status,
                iterations = outcome.iterations,
                "optimizer did not converge; using best iterate"
            );
        }

        let beta = outcome.theta_hat.clone();
        let log_likelihood = self.loglik_sum(&beta, data)?;
        let violations = sign_violations(&data.feature_cols, &beta);
        for v in &violations {
            warn!(feature = %v.feature, beta = v.beta, expected = ?v.expected, "unexpected coefficient sign");
        }
        let std_errors = match self.options.std_errors {
            StdErrorKind::None => None,
            kind => Some(self.coefficient_table(&beta, data, kind)?),
        };
        info!(
            log_likelihood,
            n_observations = data.len(),
            n_parameters = beta.len(),
            converged = outcome.converged,
            iterations = outcome.iterations,
            "conditional logit fitted"
        );

        let report = FitReport {
            coefficients: beta,
            feature_cols: data.feature_cols.clone(),
            log_likelihood,
            objective: outcome.value,
            n_observations: data.len(),
            l2: self.options.l2,
            converged: outcome.converged,
            iterations: outcome.iterations,
            status: outcome.status.clone(),
            std_errors,
            sign_violations: violations,
        };
        self.results = Some(outcome);
        Ok(self.report.insert(report))
    }

    /// Unpenalized log-likelihood `Σ ln(P_c + 1e-10)` at `beta`.
    pub fn log_likelihood(&self, beta: &Theta, data: &DesignMatrices) -> OptResult<f64> {
        self.check(beta, data)?;
        self.loglik_sum(beta, data)
    }

    /// Per-choice-set scores of the unpenalized log-likelihood, one row per
    /// set.
    pub fn scores(&self, beta: &Theta, data: &DesignMatrices) -> OptResult<Array2<f64>> {
        self.check(beta, data)?;
        self.score_matrix(beta, data)
    }

    fn coefficient_table(
        &self, beta: &Theta, data: &DesignMatrices, kind: StdErrorKind,
    ) -> OptResult<Vec<CoefficientSummary>> {
        let k = beta.len();
        let neg_grad = |b: &Array1<f64>| match self.score_matrix(b, data) {
            Ok(scores) => -scores.sum_axis(Axis(0)),
            Err(_) => Array1::from_elem(k, f64::NAN),
        };
        let meat = match kind {
            StdErrorKind::Robust => Some(score_outer_product(&self.score_matrix(beta, data)?)),
            _ => None,
        };
        let se = calc_standard_errors(&neg_grad, beta, meat.as_ref())?;
        wald_table(&data.feature_cols, beta, &se)
    }

    fn loglik_sum(&self, beta: &Theta, data: &DesignMatrices) -> OptResult<f64> {
        let terms = per_set(data, |i, set| {
            let c = chosen_index(i, set.chosen)?;
            Ok(floored_ln(choice_probabilities(beta, &set.x)[c]))
        })?;
        Ok(terms.iter().sum())
    }

    fn score_matrix(&self, beta: &Theta, data: &DesignMatrices) -> OptResult<Array2<f64>> {
        let rows = per_set(data, |i, set| {
            let c = chosen_index(i, set.chosen)?;
            let mut resid = -choice_probabilities(beta, &set.x);
            let weight = -resid[c] / (-resid[c] + PROB_FLOOR);
            resid[c] += 1.0;
            Ok(set.x.t().dot(&resid) * weight)
        })?;
        let mut out = Array2::<f64>::zeros((rows.len(), beta.len()));
        for (mut dst, src) in out.rows_mut().into_iter().zip(&rows) {
            dst.assign(src);
        }
        Ok(out)
    }
}

impl LogLikelihood for ConditionalLogit {
    type Data = DesignMatrices;

    /// Penalized log-likelihood `Σ ln(P_c + 1e-10) − λ‖β‖²`.
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<f64> {
        Ok(self.loglik_sum(theta, data)? - self.options.l2 * theta.dot(theta))
    }

    /// Validate `θ`, the penalty, and every encoded set before a run.
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()> {
        if !self.options.l2.is_finite() || self.options.l2 < 0.0 {
            return Err(OptError::InvalidPenalty { value: self.options.l2 });
        }
        if data.is_empty() {
            return Err(OptError::EmptyChoiceData);
        }
        let k = data.n_features();
        validate_theta_input(theta, k)?;
        for (set_index, set) in data.sets.iter().enumerate() {
            if set.x.ncols() != k {
                return Err(OptError::DesignWidthMismatch {
                    set_index,
                    expected: k,
                    found: set.x.ncols(),
                });
            }
            let chosen = chosen_index(set_index, set.chosen)?;
            if chosen >= set.x.nrows() {
                return Err(OptError::ChosenOutOfRange {
                    set_index,
                    chosen,
                    n_alternatives: set.x.nrows(),
                });
            }
        }
        Ok(())
    }

    fn grad(&self, theta: &Theta, data: &Self::Data) -> OptResult<Grad> {
        let scores = self.score_matrix(theta, data)?;
        Ok(scores.sum_axis(Axis(0)) - theta * (2.0 * self.options.l2))
    }
}

// ---- Helper methods ----

fn chosen_index(set_index: usize, chosen: Option<usize>) -> OptResult<usize> {
    chosen.ok_or(OptError::MissingChosen { set_index })
}

/// Evaluate `f` on every set, in parallel under the `parallel` feature,
/// collecting results in set order.
fn per_set<T, F>(data: &DesignMatrices, f: F) -> OptResult<Vec<T>>
where
    T: Send,
    F: Fn(usize, &EncodedSet) -> OptResult<T> + Sync,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        data.sets.par_iter().enumerate().map(|(i, set)| f(i, set)).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        data.sets.iter().enumerate().map(|(i, set)| f(i, set)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        choice::{
            core::{
                data::{Alternative, ChoiceData, Demographics, LongRow},
                encoder::Encoder,
                options::{ReshapeOptions, SchemaOptions},
                scaler::Scaler,
                schema::FeatureSchema,
            },
            errors::ChoiceError,
        },
        optimization::loglik_optimizer::{LineSearcher, MLEOptions, Tolerances},
    };
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn separable_toy() -> DesignMatrices {
        let specs: [[(&str, &str, f64); 3]; 2] = [
            [("van", "gasoline", 30.0), ("sedan", "hybrid", 10.0), ("suv", "gasoline", 20.0)],
            [("sedan", "hybrid", 28.0), ("van", "gasoline", 35.0), ("suv", "gasoline", 11.0)],
        ];
        let chosen = [1, 2];
        let rows = specs
            .iter()
            .enumerate()
            .flat_map(|(id, set)| {
                set.iter().enumerate().map(move |(j, &(t, f, price))| LongRow {
                    choice_set_id: id,
                    alternative_id: j + 1,
                    chosen: j == chosen[id],
                    alternative: Alternative::new(t, f, price, 100.0, 0.3, 3.0),
                    demographics: Demographics::default(),
                })
            })
            .collect();
        let data = ChoiceData::from_long_rows(rows, &ReshapeOptions::new(3).unwrap()).unwrap();
        let schema = FeatureSchema::fit(&data, &SchemaOptions::default()).unwrap();
        let raw = Encoder::new(&schema).encode_raw(&data);
        let scaler = Scaler::fit(&raw).unwrap();
        raw.apply_scaling_and_interactions(&scaler).unwrap()
    }

    fn mixed_design() -> DesignMatrices {
        let x = |rows: [[f64; 2]; 3]| Array2::from_shape_vec((3, 2), rows.concat()).unwrap();
        let sets = [
            (x([[1.0, 0.2], [0.0, 1.0], [-1.0, 0.5]]), 0),
            (x([[0.5, -0.3], [1.5, 0.1], [0.0, 0.0]]), 2),
            (x([[-0.7, 1.2], [0.3, -0.4], [1.1, 0.6]]), 1),
            (x([[0.0, 0.9], [-1.2, 0.0], [0.4, -1.0]]), 0),
            (x([[0.8, 0.8], [0.2, -0.2], [-0.5, 0.3]]), 1),
            (x([[1.3, -0.6], [-0.1, 0.7], [0.6, 0.0]]), 2),
        ];
        DesignMatrices {
            feature_cols: vec!["price".to_string(), "speed".to_string()],
            sets: sets
                .into_iter()
                .enumerate()
                .map(|(id, (x, c))| EncodedSet { id, x, chosen: Some(c) })
                .collect(),
        }
    }

    fn options(l2: f64, std_errors: StdErrorKind) -> FitOptions {
        let tols = Tolerances::new(Some(1e-6), None, Some(500)).unwrap();
        let mle = MLEOptions::new(tols, LineSearcher::MoreThuente, false, None).unwrap();
        FitOptions::new(l2, mle, std_errors).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // On a set where the cheapest alternative is always chosen, an
    // unpenalized fit learns a negative price effect.
    //
    // Given
    // -----
    // - Two 3-alternative sets over `{sedan, suv, van}` × `{gasoline, hybrid}`,
    //   the lowest price chosen in each, `λ = 0`.
    //
    // Expect
    // ------
    // - `β_price < 0` and the cheapest alternative gets probability `> 0.9`
    //   in both sets.
    fn fit_on_separable_toy_learns_negative_price() {
        let design = separable_toy();
        let mut model = ConditionalLogit::new(options(0.0, StdErrorKind::None));

        let report = model.fit(&design).unwrap().clone();

        let price = design.feature_cols.iter().position(|c| c == "price").unwrap();
        assert!(report.coefficients[price] < 0.0);
        for set in &design.sets {
            let p = choice_probabilities(&report.coefficients, &set.x);
            assert!(p[set.chosen.unwrap()] > 0.9, "p = {p}");
        }
        assert_eq!(report.n_observations, 2);
        assert!(model.results.is_some());
    }

    #[test]
    // Purpose
    // -------
    // At `β = 0` every alternative has probability `1/A`.
    //
    // Given
    // -----
    // - The six-set mixed design, `λ = 0.5`.
    //
    // Expect
    // ------
    // - `value(0) = 6 · ln(1/3 + 1e-10)`.
    fn value_at_zero_is_uniform_loglik() {
        let model = ConditionalLogit::new(options(0.5, StdErrorKind::None));
        let design = mixed_design();

        let v = model.value(&Array1::zeros(2), &design).unwrap();

        assert_abs_diff_eq!(v, 6.0 * (1.0 / 3.0 + PROB_FLOOR).ln(), epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // The analytic gradient matches central differences of the penalized
    // objective.
    //
    // Given
    // -----
    // - The mixed design, `λ = 0.1`, `β = (0.4, -0.7)`.
    //
    // Expect
    // ------
    // - Agreement within `1e-6` per coordinate.
    fn analytic_gradient_matches_finite_differences() {
        let model = ConditionalLogit::new(options(0.1, StdErrorKind::None));
        let design = mixed_design();
        let beta = array![0.4, -0.7];
        let h = 1e-6;

        let grad = model.grad(&beta, &design).unwrap();

        for k in 0..2 {
            let mut up = beta.clone();
            let mut down = beta.clone();
            up[k] += h;
            down[k] -= h;
            let fd = (model.value(&up, &design).unwrap() - model.value(&down, &design).unwrap())
                / (2.0 * h);
            assert_abs_diff_eq!(grad[k], fd, epsilon = 1e-6);
        }
    }

    #[test]
    // Purpose
    // -------
    // Malformed designs are rejected before the solver starts.
    //
    // Given
    // -----
    // - A start vector of the wrong length; a set without a chosen index;
    //   an empty design.
    //
    // Expect
    // ------
    // - `ThetaLengthMismatch`, `MissingChosen { set_index: 3 }`,
    //   `EmptyChoiceData`, each wrapped by `fit` in `Optimization`.
    fn check_rejects_malformed_inputs() {
        let model = ConditionalLogit::new(FitOptions::default());
        let mut design = mixed_design();

        assert_eq!(
            model.check(&Array1::zeros(3), &design),
            Err(OptError::ThetaLengthMismatch { expected: 2, actual: 3 })
        );

        design.sets[3].chosen = None;
        assert_eq!(
            model.check(&Array1::zeros(2), &design),
            Err(OptError::MissingChosen { set_index: 3 })
        );

        let empty = DesignMatrices { feature_cols: design.feature_cols.clone(), sets: Vec::new() };
        let err = ConditionalLogit::new(FitOptions::default()).fit(&empty).unwrap_err();
        assert_eq!(err, ChoiceError::Optimization(OptError::EmptyChoiceData));
    }

    #[test]
    // Purpose
    // -------
    // Classical and robust standard errors are finite, positive, and come
    // with a Wald table aligned to the columns.
    //
    // Given
    // -----
    // - The mixed (non-separable) design, `λ = 0.01`.
    //
    // Expect
    // ------
    // - Two rows named `price`, `speed` with `std_err > 0`, `p ∈ [0, 1]`, for
    //   both estimators.
    fn fit_reports_standard_errors() {
        for kind in [StdErrorKind::Classical, StdErrorKind::Robust] {
            let mut model = ConditionalLogit::new(options(0.01, kind));

            let report = model.fit(&mixed_design()).unwrap();

            let table = report.std_errors.as_ref().unwrap();
            assert_eq!(table.len(), 2);
            assert_eq!(table[0].feature, "price");
            for row in table {
                assert!(row.std_err.is_finite() && row.std_err > 0.0);
                let p = row.p_value.unwrap();
                assert!((0.0..=1.0).contains(&p));
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Sign checks flag only the listed features that violate expectations.
    //
    // Given
    // -----
    // - Columns `price, speed, size, type_suv` with `β = (0.5, -1, 0, 3)`.
    //
    // Expect
    // ------
    // - `price` and `speed` flagged; `size = 0` passes; `type_suv` ignored.
    fn sign_violations_flags_unexpected_signs() {
        let cols: Vec<String> =
            ["price", "speed", "size", "type_suv"].iter().map(|s| s.to_string()).collect();

        let v = sign_violations(&cols, &array![0.5, -1.0, 0.0, 3.0]);

        let names: Vec<&str> = v.iter().map(|s| s.feature.as_str()).collect();
        assert_eq!(names, vec!["price", "speed"]);
        assert_eq!(v[0].expected, ExpectedSign::Negative);
    }
}
