//! loglik_optimizer::types — numeric aliases and solver wiring.
//!
//! Coefficient vectors, gradients, and Hessians are `ndarray` containers over
//! `f64`; the L-BFGS aliases pin argmin's generic parameters to those shapes so
//! the rest of the optimizer never spells out argmin generics.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Coefficient vector `β` in optimizer space.
pub type Theta = Array1<f64>;

/// Gradient vector with the same length as [`Theta`].
pub type Grad = Array1<f64>;

/// Dense `k × k` matrix of second derivatives.
pub type Hessian = Array2<f64>;

/// Scalar objective. Inside the solver this is the cost `c(β) = -ℓ(β)`.
pub type Cost = f64;

/// Function-evaluation counters keyed by argmin's counter names
/// (`"cost_count"`, `"gradient_count"`).
pub type FnEvalMap = HashMap<String, u64>;

/// Default L-BFGS history length.
pub const DEFAULT_LBFGS_MEM: usize = 7;

pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
