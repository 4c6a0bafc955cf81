//! rust_choicemodels — conditional (multinomial) logit discrete-choice models
//! with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes training, persisted-model loading, and inference to Python via the
//! `_rust_choicemodels` extension module.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules: [`choice`] (data preparation, model,
//!   prediction, evaluation, artifacts), [`optimization`] (the L-BFGS
//!   log-likelihood maximizer), and [`inference`] (standard errors).
//! - With `python-bindings`, define the `ChoiceModel` class plus the
//!   `predict_proba` and `evaluate` functions, registered under
//!   `rust_choicemodels.choice_models`.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file performs only
//!   FFI glue, input conversion, and error mapping.
//! - A `ChoiceModel` always wraps a validated [`ModelArtifact`]; artifacts
//!   are never mutated after construction.
//!
//! Conventions
//! -----------
//! - Candidates cross the boundary as dicts with keys `type`, `fuel`,
//!   `price`, `speed`, `pollution`, `size`; profiles as dicts with optional
//!   `college`, `hsg2`, `coml5`.
//! - Core errors become `ValueError`; missing dict keys become `KeyError`.
//!
//! Testing notes
//! -------------
//! - Numerical behavior is covered by the unit tests of the inner modules and
//!   the pipeline integration tests under `tests/`.

pub mod choice;
pub mod inference;
pub mod optimization;
pub mod utils;

#[cfg(feature = "python-bindings")]
use ndarray::Array1;

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::PyValueError,
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use crate::{
    choice::{
        artifact::ModelArtifact,
        core::data::Alternative,
        evaluate::evaluate as evaluate_probs,
        pipeline::train_from_csv,
        predict::{Predictor, predict_proba as predict_proba_rs},
    },
    utils::{
        build_train_options, extract_alternative, extract_demographics, extract_f64_array,
        extract_f64_matrix,
    },
};

/// ChoiceModel — Python-facing wrapper around a fitted [`ModelArtifact`].
///
/// Purpose
/// -------
/// Load or train a conditional logit and score candidate alternatives from
/// Python with the exact schema and scaler the coefficients were fit with.
///
/// Parameters
/// ----------
/// Constructed from Python via:
/// - `ChoiceModel.load(path)` / `ChoiceModel.from_json(text)`
/// - `ChoiceModel.train(path, alternatives=6, l2=1e-4, ...)`
///
/// Notes
/// -----
/// - Rust callers should use [`ModelArtifact`] and [`Predictor`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_choicemodels.choice_models")]
pub struct ChoiceModel {
    inner: ModelArtifact,
}

#[cfg(feature = "python-bindings")]
impl ChoiceModel {
    fn candidates(raw: &Bound<'_, PyAny>) -> PyResult<Vec<Alternative>> {
        let dicts: Vec<Bound<'_, PyDict>> = raw.extract()?;
        dicts.iter().map(extract_alternative).collect()
    }
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl ChoiceModel {
    #[staticmethod]
    #[pyo3(text_signature = "(path, /)")]
    pub fn load(path: &str) -> PyResult<Self> {
        Ok(ChoiceModel { inner: ModelArtifact::load(path)? })
    }

    #[staticmethod]
    #[pyo3(text_signature = "(text, /)")]
    pub fn from_json(text: &str) -> PyResult<Self> {
        Ok(ChoiceModel { inner: ModelArtifact::from_json(text)? })
    }

    /// Run the full training pipeline on a wide CSV file.
    #[staticmethod]
    #[pyo3(
        signature = (
            path,
            alternatives = None,
            l2 = None,
            max_iter = None,
            tol_grad = None,
            line_searcher = None,
            validation_fraction = None,
            seed = None,
            type_base = None,
            fuel_base = None,
            std_errors = None,
        ),
        text_signature = "(path, /, alternatives=6, l2=1e-4, max_iter=2000, tol_grad=1e-5, \
                          line_searcher='MoreThuente', validation_fraction=0.2, seed=42, \
                          type_base='van', fuel_base='gasoline', std_errors='none')"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn train(
        path: &str, alternatives: Option<usize>, l2: Option<f64>, max_iter: Option<usize>,
        tol_grad: Option<f64>, line_searcher: Option<&str>, validation_fraction: Option<f64>,
        seed: Option<u64>, type_base: Option<&str>, fuel_base: Option<&str>,
        std_errors: Option<&str>,
    ) -> PyResult<Self> {
        let opts = build_train_options(
            alternatives,
            l2,
            max_iter,
            tol_grad,
            line_searcher,
            validation_fraction,
            seed,
            type_base,
            fuel_base,
            std_errors,
        )?;
        Ok(ChoiceModel { inner: train_from_csv(path, &opts)? })
    }

    pub fn save(&self, path: &str) -> PyResult<()> {
        Ok(self.inner.save(path)?)
    }

    pub fn to_json(&self) -> PyResult<String> {
        Ok(self.inner.to_json()?)
    }

    pub fn export_coefficients(&self, path: &str) -> PyResult<()> {
        Ok(self.inner.export_coefficients_to_path(path)?)
    }

    /// Probability per candidate, in input order.
    #[pyo3(signature = (candidates, profile = None), text_signature = "(self, candidates, /, profile=None)")]
    pub fn predict(
        &self, candidates: &Bound<'_, PyAny>, profile: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Vec<f64>> {
        let cands = Self::candidates(candidates)?;
        let profile = extract_demographics(profile)?;
        Ok(Predictor::new(&self.inner).predict_candidates(&cands, Some(&profile))?)
    }

    /// `(index, probability)` pairs, most probable first.
    #[pyo3(signature = (candidates, profile = None), text_signature = "(self, candidates, /, profile=None)")]
    pub fn rank(
        &self, candidates: &Bound<'_, PyAny>, profile: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Vec<(usize, f64)>> {
        let cands = Self::candidates(candidates)?;
        let profile = extract_demographics(profile)?;
        let ranked = Predictor::new(&self.inner).rank_candidates(&cands, Some(&profile))?;
        Ok(ranked.into_iter().map(|r| (r.index, r.probability)).collect())
    }

    #[getter]
    pub fn feature_cols(&self) -> Vec<String> {
        self.inner.feature_cols().to_vec()
    }

    #[getter]
    pub fn coefficients(&self) -> Vec<f64> {
        self.inner.coefficients.clone()
    }

    #[getter]
    pub fn log_likelihood(&self) -> f64 {
        self.inner.summary.log_likelihood
    }

    #[getter]
    pub fn n_observations(&self) -> usize {
        self.inner.summary.n_observations
    }

    #[getter]
    pub fn converged(&self) -> bool {
        self.inner.summary.converged
    }

    /// `(feature, beta, std_err, z, p_value)` rows when standard errors were
    /// computed at training time, else an empty list.
    #[getter]
    pub fn coefficient_table(&self) -> Vec<(String, f64, f64, Option<f64>, Option<f64>)> {
        self.inner
            .summary
            .std_errors
            .iter()
            .flatten()
            .map(|r| (r.feature.clone(), r.beta, r.std_err, r.z, r.p_value))
            .collect()
    }
}

/// Softmax probabilities of the rows of `x` under `beta`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(text_signature = "(beta, x, /)")]
fn predict_proba<'py>(
    py: Python<'py>, beta: &Bound<'py, PyAny>, x: &Bound<'py, PyAny>,
) -> PyResult<Vec<f64>> {
    let beta_arr = extract_f64_array(py, beta)?;
    let beta_slice = beta_arr
        .as_slice()
        .map_err(|_| PyValueError::new_err("beta must be a 1-D contiguous float64 array"))?;
    let beta = Array1::from(beta_slice.to_vec());
    let x = extract_f64_matrix(x)?;
    Ok(predict_proba_rs(&beta, &x)?)
}

/// `(accuracy, avg_chosen_prob)` for probability vectors and 0-based
/// chosen indices.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(text_signature = "(probs, chosen, /)")]
fn evaluate(probs: Vec<Vec<f64>>, chosen: Vec<usize>) -> PyResult<(f64, f64)> {
    let m = evaluate_probs(&probs, &chosen)?;
    Ok((m.accuracy, m.avg_chosen_prob))
}

/// _rust_choicemodels — PyO3 module initializer.
///
/// Creates the `choice_models` submodule, attaches it to the parent, and
/// registers it in `sys.modules` so dotted imports work.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_choicemodels<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let choice_models_mod = PyModule::new(_py, "choice_models")?;
    choice_models(_py, m, &choice_models_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    _py.import("sys")?
        .getattr("modules")?
        .set_item("rust_choicemodels.choice_models", choice_models_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn choice_models<'py>(
    _py: Python, rust_choicemodels: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<ChoiceModel>()?;
    m.add_function(wrap_pyfunction!(predict_proba, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate, m)?)?;
    rust_choicemodels.add_submodule(m)?;
    Ok(())
}
