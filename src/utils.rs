//! utils — PyO3 extraction helpers shared by the Python bindings.
//!
//! Everything here converts loosely-typed Python inputs (dicts, sequences,
//! numpy arrays, keyword arguments) into the validated Rust types of
//! [`crate::choice`], mapping failures to `ValueError` / `KeyError` /
//! `TypeError`. Apart from [`dense_matrix`], compiled only with the
//! `python-bindings` feature.
//!
//! Arrays cross the boundary as plain `f64` buffers, never as `ndarray`
//! types: `numpy` may link a different `ndarray` major than this crate.
use ndarray::{Array2, ShapeError};

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyKeyError, PyTypeError, PyValueError},
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArrayMethods, PyReadonlyArray1, PyReadonlyArray2};

#[cfg(feature = "python-bindings")]
use crate::{
    choice::{
        core::{
            data::{Alternative, Demographics},
            options::{
                FitOptions, ReshapeOptions, SchemaOptions, SplitOptions, StdErrorKind,
                TrainOptions,
            },
        },
        errors::ChoiceError,
    },
    optimization::loglik_optimizer::{LineSearcher, MLEOptions, Tolerances},
};

/// Borrow a contiguous 1-D `float64` view of an ndarray, pandas Series, or
/// plain sequence, copying only when the input is not already contiguous.
#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr) = raw.extract::<PyReadonlyArray1<f64>>() {
        if arr.as_slice().is_ok() {
            return Ok(arr);
        }
    }
    if let Ok(obj) = raw.call_method("to_numpy", (false,), None) {
        if let Ok(series) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series.as_slice().is_ok() {
                return Ok(series);
            }
        }
    }
    let vec: Vec<f64> = raw.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Owned copy of a 2-D `float64` array (one row per alternative).
#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix(raw: &Bound<'_, PyAny>) -> PyResult<Array2<f64>> {
    let shape_err = |e: ShapeError| PyValueError::new_err(e.to_string());
    if let Ok(arr) = raw.extract::<PyReadonlyArray2<f64>>() {
        let view = arr.as_array();
        let (nrows, ncols) = view.dim();
        return dense_matrix(nrows, ncols, view.iter().copied().collect()).map_err(shape_err);
    }
    let rows: Vec<Vec<f64>> = raw.extract().map_err(|_| {
        PyTypeError::new_err("expected a 2-D numpy.ndarray or a sequence of float64 rows")
    })?;
    let ncols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != ncols) {
        return Err(PyValueError::new_err("all rows must have the same length"));
    }
    let nrows = rows.len();
    dense_matrix(nrows, ncols, rows.into_iter().flatten().collect()).map_err(shape_err)
}

/// Row-major `nrows × ncols` matrix owned by this crate's `ndarray`.
#[cfg_attr(not(feature = "python-bindings"), allow(dead_code))]
pub(crate) fn dense_matrix(
    nrows: usize, ncols: usize, values: Vec<f64>,
) -> Result<Array2<f64>, ShapeError> {
    Array2::from_shape_vec((nrows, ncols), values)
}

/// One candidate from a dict with keys `type`, `fuel`, `price`, `speed`,
/// `pollution`, `size`.
#[cfg(feature = "python-bindings")]
pub fn extract_alternative(dict: &Bound<'_, PyDict>) -> PyResult<Alternative> {
    let text = |key: &str| -> PyResult<String> { required_item(dict, key)?.extract() };
    let number = |key: &str| -> PyResult<f64> { required_item(dict, key)?.extract() };
    Ok(Alternative {
        vehicle_type: text("type")?,
        fuel: text("fuel")?,
        price: number("price")?,
        speed: number("speed")?,
        pollution: number("pollution")?,
        size: number("size")?,
    })
}

/// Demographic profile from an optional dict; absent keys default to 0.
#[cfg(feature = "python-bindings")]
pub fn extract_demographics(dict: Option<&Bound<'_, PyDict>>) -> PyResult<Demographics> {
    let Some(dict) = dict else {
        return Ok(Demographics::default());
    };
    let number = |key: &str| -> PyResult<f64> {
        match dict.get_item(key)? {
            Some(v) => v.extract(),
            None => Ok(0.0),
        }
    };
    Ok(Demographics::new(number("college")?, number("hsg2")?, number("coml5")?))
}

/// Training configuration from keyword arguments; `None` keeps the default.
#[cfg(feature = "python-bindings")]
#[allow(clippy::too_many_arguments)]
pub fn build_train_options(
    alternatives: Option<usize>, l2: Option<f64>, max_iter: Option<usize>, tol_grad: Option<f64>,
    line_searcher: Option<&str>, validation_fraction: Option<f64>, seed: Option<u64>,
    type_base: Option<&str>, fuel_base: Option<&str>, std_errors: Option<&str>,
) -> PyResult<TrainOptions> {
    use std::str::FromStr;

    let defaults = TrainOptions::default();
    let reshape = match alternatives {
        Some(a) => ReshapeOptions::new(a)?,
        None => defaults.reshape,
    };
    let schema = SchemaOptions::new(
        type_base.unwrap_or(&defaults.schema.type_base),
        fuel_base.unwrap_or(&defaults.schema.fuel_base),
    )?;

    let tols = Tolerances::new(
        tol_grad.or(defaults.fit.mle_opts.tols.tol_grad),
        None,
        max_iter.or(defaults.fit.mle_opts.tols.max_iter),
    )
    .map_err(ChoiceError::from)?;
    let ls = match line_searcher {
        Some(name) => LineSearcher::from_str(name).map_err(ChoiceError::from)?,
        None => defaults.fit.mle_opts.line_searcher,
    };
    let mle_opts = MLEOptions::new(tols, ls, false, None).map_err(ChoiceError::from)?;
    let std_errors = match std_errors {
        Some(kind) => StdErrorKind::from_str(kind).map_err(PyValueError::new_err)?,
        None => defaults.fit.std_errors,
    };
    let fit = FitOptions::new(l2.unwrap_or(defaults.fit.l2), mle_opts, std_errors)?;
    let split = SplitOptions::new(
        validation_fraction.unwrap_or(defaults.split.validation_fraction),
        seed.unwrap_or(defaults.split.seed),
    )?;
    Ok(TrainOptions { reshape, schema, fit, split })
}

#[cfg(feature = "python-bindings")]
fn required_item<'py>(dict: &Bound<'py, PyDict>, key: &str) -> PyResult<Bound<'py, PyAny>> {
    dict.get_item(key)?
        .ok_or_else(|| PyKeyError::new_err(format!("candidate is missing required key '{key}'")))
}
