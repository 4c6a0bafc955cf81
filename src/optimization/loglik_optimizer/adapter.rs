//! Bridge from [`LogLikelihood`] to argmin's `CostFunction` / `Gradient`.
//!
//! argmin minimizes, so the adapter exposes `c(β) = -ℓ(β)` and `∇c = -∇ℓ`.
//! When the model has no analytic gradient the cost itself is differenced,
//! which already carries the right sign.
use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{
        finite_diff::fd_gradient,
        traits::LogLikelihood,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};

/// Borrowed model plus data, presented to argmin as a minimization problem.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

impl<'a, F: LogLikelihood> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// `-ℓ(β)`. A non-finite log-likelihood is reported as
    /// [`OptError::NonFiniteCost`] rather than handed to the line search.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let ll = self.f.value(theta, self.data)?;
        if !ll.is_finite() {
            return Err(OptError::NonFiniteCost { value: ll }.into());
        }
        Ok(-ll)
    }
}

impl<'a, F: LogLikelihood> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, theta.len())?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => fd_gradient(theta, &|x: &Theta| self.cost(x)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use ndarray::array;

    /// `ℓ(β) = -(β₀ - 1)² - (β₁ + 2)²`, with or without an analytic gradient.
    struct Bowl {
        analytic: bool,
    }

    impl LogLikelihood for Bowl {
        type Data = ();

        fn value(&self, theta: &Theta, _data: &()) -> OptResult<Cost> {
            Ok(-(theta[0] - 1.0).powi(2) - (theta[1] + 2.0).powi(2))
        }

        fn check(&self, _theta: &Theta, _data: &()) -> OptResult<()> {
            Ok(())
        }

        fn grad(&self, theta: &Theta, _data: &()) -> OptResult<Grad> {
            if self.analytic {
                Ok(array![-2.0 * (theta[0] - 1.0), -2.0 * (theta[1] + 2.0)])
            } else {
                Err(OptError::GradientNotImplemented)
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Cost and analytic gradient are both sign-flipped.
    //
    // Given
    // -----
    // - `Bowl` with an analytic gradient at `β = [0, 0]`.
    //
    // Expect
    // ------
    // - `cost = 1 + 4 = 5`, `gradient = [-2, 4]`.
    fn adapter_negates_value_and_analytic_gradient() {
        let model = Bowl { analytic: true };
        let adapter = ArgMinAdapter::new(&model, &());
        let theta = array![0.0, 0.0];

        assert!((adapter.cost(&theta).unwrap() - 5.0).abs() < 1e-12);
        let g = adapter.gradient(&theta).unwrap();
        assert!((g[0] + 2.0).abs() < 1e-12);
        assert!((g[1] - 4.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Without an analytic gradient the adapter differences the cost and lands
    // on the same vector as the analytic branch.
    //
    // Given
    // -----
    // - `Bowl { analytic: false }` at `β = [0, 0]`.
    //
    // Expect
    // ------
    // - Gradient `≈ [-2, 4]` within `1e-5`.
    fn adapter_falls_back_to_finite_differences() {
        let model = Bowl { analytic: false };
        let adapter = ArgMinAdapter::new(&model, &());
        let theta = array![0.0, 0.0];

        let g = adapter.gradient(&theta).unwrap();

        assert!((g[0] + 2.0).abs() < 1e-5);
        assert!((g[1] - 4.0).abs() < 1e-5);
    }
}
