//! Evaluator — aggregate accuracy of predicted choice probabilities.
use crate::{
    choice::{
        core::encoder::DesignMatrices,
        errors::{ChoiceError, ChoiceResult},
        predict::predict_design,
    },
    optimization::numerical_stability::floored_ln,
};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Metrics over a batch of choice sets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    /// Share of sets whose most probable alternative was chosen.
    pub accuracy: f64,
    /// Mean probability assigned to the chosen alternative.
    pub avg_chosen_prob: f64,
    /// Mean of `ln(P_chosen + 1e-10)`.
    pub mean_log_likelihood: f64,
    pub correct: usize,
    pub total: usize,
}

/// Score `probs[i]` against the 0-based `chosen[i]`.
///
/// Ties in the arg-max resolve to the first maximal index.
///
/// # Errors
/// - `EvaluationLengthMismatch` if the slices differ in length.
/// - `EmptyData` for zero choice sets.
/// - `ChosenOutOfRange` if a chosen index exceeds its probability vector.
pub fn evaluate(probs: &[Vec<f64>], chosen: &[usize]) -> ChoiceResult<EvalMetrics> {
    if probs.len() != chosen.len() {
        return Err(ChoiceError::EvaluationLengthMismatch {
            predictions: probs.len(),
            chosen: chosen.len(),
        });
    }
    if probs.is_empty() {
        return Err(ChoiceError::EmptyData);
    }
    let mut correct = 0usize;
    let mut chosen_prob = 0.0;
    let mut loglik = 0.0;
    for (set_index, (p, &c)) in probs.iter().zip(chosen).enumerate() {
        let p_c = *p.get(c).ok_or(ChoiceError::ChosenOutOfRange {
            set_index,
            chosen: c,
            n_alternatives: p.len(),
        })?;
        if first_argmax(p) == Some(c) {
            correct += 1;
        }
        chosen_prob += p_c;
        loglik += floored_ln(p_c);
    }
    let total = probs.len();
    Ok(EvalMetrics {
        accuracy: correct as f64 / total as f64,
        avg_chosen_prob: chosen_prob / total as f64,
        mean_log_likelihood: loglik / total as f64,
        correct,
        total,
    })
}

/// Predict every set of a labelled design under `beta`, then [`evaluate`].
///
/// # Errors
/// `UnlabelledChoiceSet` for a set without a chosen index, plus the errors of
/// [`predict_design`] and [`evaluate`].
pub fn evaluate_design(beta: &Array1<f64>, design: &DesignMatrices) -> ChoiceResult<EvalMetrics> {
    let chosen = design
        .sets
        .iter()
        .enumerate()
        .map(|(set_index, set)| set.chosen.ok_or(ChoiceError::UnlabelledChoiceSet { set_index }))
        .collect::<ChoiceResult<Vec<usize>>>()?;
    evaluate(&predict_design(beta, design)?, &chosen)
}

fn first_argmax(p: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in p.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
