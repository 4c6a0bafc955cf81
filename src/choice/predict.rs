//! Predictor — choice probabilities from coefficients and encoded designs.
//!
//! Two entry points:
//! - [`predict_proba`] for a coefficient vector and one already-encoded
//!   design matrix.
//! - [`Predictor`] for the inference call contract: raw candidate
//!   attributes plus an optional demographic profile, encoded through the
//!   artifact's schema and scaler, probabilities returned in input order.
use crate::choice::{
    artifact::ModelArtifact,
    core::{
        data::{Alternative, Demographics},
        encoder::{DesignMatrices, Encoder},
    },
    errors::{ChoiceError, ChoiceResult},
    models::choice_probabilities,
};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Softmax probabilities of the rows of `x` under `beta`.
///
/// # Errors
/// `CoefficientLengthMismatch` if `x` does not have `beta.len()` columns.
pub fn predict_proba(beta: &Array1<f64>, x: &Array2<f64>) -> ChoiceResult<Vec<f64>> {
    if x.ncols() != beta.len() {
        return Err(ChoiceError::CoefficientLengthMismatch {
            expected: x.ncols(),
            actual: beta.len(),
        });
    }
    Ok(choice_probabilities(beta, x).to_vec())
}

/// [`predict_proba`] for every set of an encoded batch.
pub fn predict_design(beta: &Array1<f64>, design: &DesignMatrices) -> ChoiceResult<Vec<Vec<f64>>> {
    design.sets.iter().map(|set| predict_proba(beta, &set.x)).collect()
}

/// A candidate's input position and its choice probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub index: usize,
    pub probability: f64,
}

/// Scores raw candidates with a fitted artifact.
///
/// Holds borrowed views of the artifact's schema and scaler; neither is
/// modified, so one artifact can back any number of predictors.
#[derive(Debug, Clone)]
pub struct Predictor<'a> {
    artifact: &'a ModelArtifact,
    encoder: Encoder<'a>,
    beta: Array1<f64>,
}

impl<'a> Predictor<'a> {
    pub fn new(artifact: &'a ModelArtifact) -> Self {
        Predictor { artifact, encoder: Encoder::new(&artifact.schema), beta: artifact.beta() }
    }

    /// Probability per candidate, in input order, summing to one.
    ///
    /// Candidates occupy alternative positions `1..=n` for the ASC columns.
    /// Unseen `type`/`fuel` levels encode as all-zero indicators. A missing
    /// profile means all demographics are zero.
    ///
    /// # Errors
    /// - `EmptyCandidates` for an empty slice.
    /// - `NonFiniteAttribute` for a NaN/±∞ numeric attribute or profile
    ///   value.
    pub fn predict_candidates(
        &self, candidates: &[Alternative], profile: Option<&Demographics>,
    ) -> ChoiceResult<Vec<f64>> {
        let profile = profile.copied().unwrap_or_default();
        let design = self
            .encoder
            .encode_candidates_raw(candidates, &profile)?
            .apply_scaling_and_interactions(&self.artifact.scaler)?;
        let mut probs = predict_design(&self.beta, &design)?;
        probs.pop().ok_or(ChoiceError::EmptyCandidates)
    }

    /// Candidates ordered by decreasing probability; ties keep input order.
    pub fn rank_candidates(
        &self, candidates: &[Alternative], profile: Option<&Demographics>,
    ) -> ChoiceResult<Vec<RankedCandidate>> {
        let probs = self.predict_candidates(candidates, profile)?;
        let mut ranked: Vec<RankedCandidate> = probs
            .into_iter()
            .enumerate()
            .map(|(index, probability)| RankedCandidate { index, probability })
            .collect();
        ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        Ok(ranked)
    }

    pub fn artifact(&self) -> &'a ModelArtifact {
        self.artifact
    }
}
