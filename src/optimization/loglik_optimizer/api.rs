//! Entry point of the optimizer.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::run_lbfgs,
        traits::{LineSearcher, LogLikelihood, MLEOptions},
    },
};

/// Maximize `f`'s log-likelihood on `data`, starting from `theta0`.
///
/// [`LogLikelihood::check`] runs on the starting point first, so shape and
/// domain errors surface before any solver state exists. The line search in
/// `opts` picks the L-BFGS flavor.
///
/// # Errors
/// Anything raised by `check`, by the builders, by the objective during the
/// run, or by outcome validation.
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            run_lbfgs(theta0, opts, problem, build_optimizer_more_thuente(opts)?)
        }
        LineSearcher::HagerZhang => {
            run_lbfgs(theta0, opts, problem, build_optimizer_hager_zhang(opts)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{
        errors::OptError,
        loglik_optimizer::{Cost, Grad, Tolerances},
    };
    use ndarray::array;

    /// Two-alternative logit with one coefficient: the first option is chosen
    /// `k` times out of `n`, so the maximizer is `log(k / (n - k))`.
    struct Binary {
        analytic: bool,
    }

    impl LogLikelihood for Binary {
        type Data = (f64, f64);

        fn value(&self, theta: &Theta, data: &(f64, f64)) -> OptResult<Cost> {
            let (k, n) = *data;
            let b = theta[0];
            // Overflow-safe softplus: ln(1 + e^b).
            let softplus = b.max(0.0) + (-b.abs()).exp().ln_1p();
            Ok(k * b - n * softplus)
        }

        fn check(&self, theta: &Theta, _data: &(f64, f64)) -> OptResult<()> {
            if theta.len() != 1 {
                return Err(OptError::ThetaLengthMismatch { expected: 1, actual: theta.len() });
            }
            Ok(())
        }

        fn grad(&self, theta: &Theta, data: &(f64, f64)) -> OptResult<Grad> {
            if !self.analytic {
                return Err(OptError::GradientNotImplemented);
            }
            let (k, n) = *data;
            let p = 1.0 / (1.0 + (-theta[0]).exp());
            Ok(array![k - n * p])
        }
    }

    #[test]
    // Purpose
    // -------
    // Both line searches reach the closed-form maximizer with an analytic
    // gradient, even when a trial step lands far out in the tail.
    //
    // Given
    // -----
    // - `k = 30`, `n = 40`, starting at `0`; the objective stays finite for
    //   any finite step, so Hager-Zhang's long first probe is usable.
    //
    // Expect
    // ------
    // - `theta_hat ≈ ln 3` within `1e-4` and `converged == true`.
    fn maximize_recovers_binary_logit_estimate() {
        let model = Binary { analytic: true };
        for ls in [LineSearcher::MoreThuente, LineSearcher::HagerZhang] {
            let opts = MLEOptions { line_searcher: ls, ..MLEOptions::default() };

            let out = maximize(&model, array![0.0], &(30.0, 40.0), &opts).unwrap();

            assert!((out.theta_hat[0] - 3.0_f64.ln()).abs() < 1e-4, "{ls:?}: {}", out.theta_hat);
            assert!(out.converged, "{ls:?}: {}", out.status);
        }
    }

    #[test]
    // Purpose
    // -------
    // The finite-difference path reaches the same estimate.
    //
    // Given
    // -----
    // - `Binary { analytic: false }`, `k = 10`, `n = 40`, `tol_grad = 1e-6`.
    //
    // Expect
    // ------
    // - `theta_hat ≈ ln(1/3)` within `1e-3`.
    fn maximize_without_analytic_gradient_uses_finite_differences() {
        let model = Binary { analytic: false };
        let tols = Tolerances::new(Some(1e-6), None, Some(500)).unwrap();
        let opts = MLEOptions::new(tols, LineSearcher::MoreThuente, false, None).unwrap();

        let out = maximize(&model, array![0.5], &(10.0, 40.0), &opts).unwrap();

        assert!((out.theta_hat[0] - (1.0_f64 / 3.0).ln()).abs() < 1e-3);
    }

    #[test]
    // Purpose
    // -------
    // `check` failures stop the fit before the solver runs.
    //
    // Given
    // -----
    // - A length-2 starting vector.
    //
    // Expect
    // ------
    // - `ThetaLengthMismatch { expected: 1, actual: 2 }`.
    fn maximize_rejects_bad_start_via_check() {
        let model = Binary { analytic: true };

        let err = maximize(&model, array![0.0, 0.0], &(1.0, 2.0), &MLEOptions::default())
            .unwrap_err();

        assert_eq!(err, OptError::ThetaLengthMismatch { expected: 1, actual: 2 });
    }
}
