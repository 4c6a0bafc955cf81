//! Model artifact — the versioned bundle deployed for inference.
//!
//! Purpose
//! -------
//! Keep the coefficient vector, the [`FeatureSchema`] that defines its column
//! order, and the [`Scaler`] fit alongside it in one JSON document, so an
//! inference process needs nothing else.
//!
//! Key behaviors
//! -------------
//! - [`ModelArtifact::save`] / [`ModelArtifact::to_json`] write pretty JSON
//!   with a top-level `format_version`.
//! - [`ModelArtifact::load`] / [`ModelArtifact::from_json`] read the version
//!   first, then the full document, then run [`ModelArtifact::validate`];
//!   no coefficient is usable before validation passes.
//! - [`ModelArtifact::export_coefficients`] writes the `feature,beta` table.
//!
//! Invariants & assumptions
//! ------------------------
//! - `coefficients.len() == schema.feature_cols.len()`, all finite.
//! - `schema.feature_cols` has no duplicates and equals
//!   `schema.expected_columns()`; indicator names follow from the stored
//!   levels and bases.
//! - The scaler covers exactly the schema's numeric features with finite
//!   means and positive finite scales.
use crate::{
    choice::{
        core::{scaler::Scaler, schema::{FeatureSchema, first_duplicate}},
        errors::{ArtifactError, ArtifactResult},
        evaluate::EvalMetrics,
        models::{FitReport, SignViolation},
    },
    inference::CoefficientSummary,
};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};
use tracing::info;

/// Artifact layout version written by this build.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Informational fit statistics stored with the coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    /// Unpenalized log-likelihood on the training split.
    pub log_likelihood: f64,
    /// Number of training choice sets.
    pub n_observations: usize,
    pub n_parameters: usize,
    pub l2: f64,
    pub converged: bool,
    pub iterations: usize,
    pub status: String,
    #[serde(default)]
    pub std_errors: Option<Vec<CoefficientSummary>>,
    #[serde(default)]
    pub sign_violations: Vec<SignViolation>,
    #[serde(default)]
    pub train_metrics: Option<EvalMetrics>,
    #[serde(default)]
    pub validation_metrics: Option<EvalMetrics>,
}

impl FitSummary {
    pub fn from_report(
        report: &FitReport, train_metrics: Option<EvalMetrics>,
        validation_metrics: Option<EvalMetrics>,
    ) -> Self {
        FitSummary {
            log_likelihood: report.log_likelihood,
            n_observations: report.n_observations,
            n_parameters: report.coefficients.len(),
            l2: report.l2,
            converged: report.converged,
            iterations: report.iterations,
            status: report.status.clone(),
            std_errors: report.std_errors.clone(),
            sign_violations: report.sign_violations.clone(),
            train_metrics,
            validation_metrics,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    /// Aligned 1:1 with `schema.feature_cols`.
    pub coefficients: Vec<f64>,
    pub schema: FeatureSchema,
    pub scaler: Scaler,
    pub summary: FitSummary,
}

#[derive(Deserialize)]
struct VersionProbe {
    format_version: u32,
}

impl ModelArtifact {
    /// Assemble and validate an artifact at the current format version.
    pub fn new(
        coefficients: Vec<f64>, schema: FeatureSchema, scaler: Scaler, summary: FitSummary,
    ) -> ArtifactResult<Self> {
        let artifact = ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            coefficients,
            schema,
            scaler,
            summary,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    /// Coefficients as an `ndarray` vector.
    pub fn beta(&self) -> Array1<f64> {
        Array1::from(self.coefficients.clone())
    }

    pub fn feature_cols(&self) -> &[String] {
        &self.schema.feature_cols
    }

    /// Check every structural invariant listed in the module docs.
    pub fn validate(&self) -> ArtifactResult<()> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: self.format_version,
                supported: ARTIFACT_FORMAT_VERSION,
            });
        }
        let cols = &self.schema.feature_cols;
        if self.coefficients.len() != cols.len() {
            return Err(ArtifactError::CoefficientLengthMismatch {
                coefficients: self.coefficients.len(),
                feature_cols: cols.len(),
            });
        }
        if let Some(index) = self.coefficients.iter().position(|b| !b.is_finite()) {
            return Err(ArtifactError::NonFiniteCoefficient {
                index,
                value: self.coefficients[index],
            });
        }
        if let Some(name) = first_duplicate(cols) {
            return Err(ArtifactError::DuplicateFeatureColumn { name: name.to_string() });
        }
        self.validate_schema()?;
        self.validate_scaler()
    }

    fn validate_schema(&self) -> ArtifactResult<()> {
        let s = &self.schema;
        let inconsistent = |reason: String| Err(ArtifactError::InconsistentSchema { reason });
        if s.feature_cols != s.expected_columns() {
            return inconsistent("feature_cols do not follow the column groups".to_string());
        }
        for (attr, base, levels, features) in [
            ("type", &s.type_base, &s.type_levels, &s.type_features),
            ("fuel", &s.fuel_base, &s.fuel_levels, &s.fuel_features),
        ] {
            if !levels.contains(base) {
                return inconsistent(format!("{attr} base '{base}' not among its levels"));
            }
            let expected: Vec<String> =
                levels.iter().filter(|l| *l != base).map(|l| format!("{attr}_{l}")).collect();
            if *features != expected {
                return inconsistent(format!("{attr} indicators do not match its levels"));
            }
        }
        let expected_asc: Vec<String> =
            (2..=s.n_alternatives).map(|j| format!("asc_alt{j}")).collect();
        if s.asc_features != expected_asc {
            return inconsistent(format!(
                "ASC columns do not match {} alternatives",
                s.n_alternatives
            ));
        }
        Ok(())
    }

    fn validate_scaler(&self) -> ArtifactResult<()> {
        self.scaler
            .check_matches(&self.schema)
            .map_err(|e| ArtifactError::InvalidScaler { reason: e.to_string() })?;
        let bad_mean = self.scaler.mean.iter().any(|m| !m.is_finite());
        let bad_scale = self.scaler.scale.iter().any(|s| !s.is_finite() || *s <= 0.0);
        if bad_mean || bad_scale {
            return Err(ArtifactError::InvalidScaler {
                reason: "means must be finite and scales finite and positive".to_string(),
            });
        }
        Ok(())
    }

    // ---- Persistence ----

    pub fn to_json(&self) -> ArtifactResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate. An unknown `format_version` is reported as
    /// `UnsupportedVersion` even when the rest of the document no longer
    /// matches this layout.
    pub fn from_json(text: &str) -> ArtifactResult<Self> {
        let probe: VersionProbe = serde_json::from_str(text)?;
        if probe.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: probe.format_version,
                supported: ARTIFACT_FORMAT_VERSION,
            });
        }
        let artifact: ModelArtifact = serde_json::from_str(text)?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> ArtifactResult<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        info!(path = %path.display(), n_features = self.coefficients.len(), "saved model artifact");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> ArtifactResult<Self> {
        let path = path.as_ref();
        let mut text = String::new();
        BufReader::new(File::open(path)?).read_to_string(&mut text)?;
        let artifact = Self::from_json(&text)?;
        info!(path = %path.display(), n_features = artifact.coefficients.len(), "loaded model artifact");
        Ok(artifact)
    }

    /// Write the `feature,beta` table in column order.
    pub fn export_coefficients<W: Write>(&self, writer: W) -> ArtifactResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["feature", "beta"])?;
        for (name, beta) in self.schema.feature_cols.iter().zip(&self.coefficients) {
            csv.write_record([name.as_str(), beta.to_string().as_str()])?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn export_coefficients_to_path<P: AsRef<Path>>(&self, path: P) -> ArtifactResult<()> {
        self.export_coefficients(File::create(path)?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::choice::{
        core::{
            data::{Alternative, ChoiceData, Demographics, LongRow},
            encoder::Encoder,
            options::{ReshapeOptions, SchemaOptions},
        },
        predict::Predictor,
    };

    /// Artifact over `{sedan, suv, van} × {electric, gasoline, hybrid}` with
    /// `A = 3`, a price coefficient of `-1`, small category effects, and
    /// zero ASCs.
    pub(crate) fn toy_artifact() -> ModelArtifact {
        let specs = [
            [("van", "gasoline", 30.0), ("sedan", "hybrid", 10.0), ("suv", "electric", 20.0)],
            [("sedan", "gasoline", 28.0), ("van", "hybrid", 35.0), ("suv", "gasoline", 11.0)],
        ];
        let rows = specs
            .iter()
            .enumerate()
            .flat_map(|(id, set)| {
                set.iter().enumerate().map(move |(j, &(t, f, price))| LongRow {
                    choice_set_id: id,
                    alternative_id: j + 1,
                    chosen: j == 0,
                    alternative: Alternative::new(t, f, price, 90.0 + j as f64, 0.3, 3.0),
                    demographics: Demographics::new(id as f64, 1.0, 0.0),
                })
            })
            .collect();
        let data = ChoiceData::from_long_rows(rows, &ReshapeOptions::new(3).unwrap()).unwrap();
        let schema = FeatureSchema::fit(&data, &SchemaOptions::default()).unwrap();
        let scaler = Scaler::fit(&Encoder::new(&schema).encode_raw(&data)).unwrap();
        let coefficients = schema
            .feature_cols
            .iter()
            .map(|c| match c.as_str() {
                "price" => -1.0,
                "speed" => 0.25,
                "type_sedan" => 0.3,
                "fuel_hybrid" => -0.2,
                "hsg2_x_size" => 0.1,
                _ => 0.0,
            })
            .collect();
        let summary = FitSummary {
            log_likelihood: -1.5,
            n_observations: 2,
            n_parameters: schema.n_features(),
            l2: 1e-4,
            converged: true,
            iterations: 7,
            status: "SolverConverged".to_string(),
            std_errors: None,
            sign_violations: Vec::new(),
            train_metrics: None,
            validation_metrics: None,
        };
        ModelArtifact::new(coefficients, schema, scaler, summary).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // JSON round trip reproduces the artifact and its predictions exactly.
    //
    // Given
    // -----
    // - The toy artifact written to a temporary file and loaded back.
    //
    // Expect
    // ------
    // - Equal artifacts and bitwise-identical probabilities for a fixed
    //   candidate list.
    fn save_load_round_trip_preserves_predictions() {
        let artifact = toy_artifact();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        artifact.save(&path).unwrap();
        let loaded = ModelArtifact::load(&path).unwrap();

        assert_eq!(loaded, artifact);
        let cands = [
            Alternative::new("suv", "electric", 18.0, 95.0, 0.1, 3.0),
            Alternative::new("van", "gasoline", 22.0, 90.0, 0.6, 4.0),
        ];
        let profile = Demographics::new(1.0, 0.0, 1.0);
        let before = Predictor::new(&artifact).predict_candidates(&cands, Some(&profile)).unwrap();
        let after = Predictor::new(&loaded).predict_candidates(&cands, Some(&profile)).unwrap();
        assert_eq!(
            before.iter().map(|p| p.to_bits()).collect::<Vec<_>>(),
            after.iter().map(|p| p.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    // Purpose
    // -------
    // Corrupt artifacts are rejected before use.
    //
    // Given
    // -----
    // - One coefficient removed; a future format version; a duplicated
    //   feature column; a zero scale.
    //
    // Expect
    // ------
    // - `CoefficientLengthMismatch`, `UnsupportedVersion`,
    //   `DuplicateFeatureColumn`, `InvalidScaler`.
    fn validate_rejects_corrupt_artifacts() {
        let good = toy_artifact();
        let k = good.coefficients.len();

        let mut short = good.clone();
        short.coefficients.pop();
        assert_eq!(
            ModelArtifact::from_json(&short.to_json().unwrap()).unwrap_err(),
            ArtifactError::CoefficientLengthMismatch { coefficients: k - 1, feature_cols: k }
        );

        let mut future = good.clone();
        future.format_version = 2;
        assert_eq!(
            ModelArtifact::from_json(&future.to_json().unwrap()).unwrap_err(),
            ArtifactError::UnsupportedVersion { found: 2, supported: 1 }
        );

        let mut dup = good.clone();
        dup.schema.feature_cols[1] = dup.schema.feature_cols[0].clone();
        assert!(matches!(dup.validate(), Err(ArtifactError::DuplicateFeatureColumn { .. })));

        let mut zero_scale = good;
        zero_scale.scaler.scale[0] = 0.0;
        assert!(matches!(zero_scale.validate(), Err(ArtifactError::InvalidScaler { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Reordered columns are caught even when names and lengths match.
    //
    // Given
    // -----
    // - The toy artifact with its first two feature columns swapped.
    //
    // Expect
    // ------
    // - `InconsistentSchema`.
    fn validate_rejects_reordered_columns() {
        let mut artifact = toy_artifact();
        artifact.schema.feature_cols.swap(0, 1);

        assert!(matches!(artifact.validate(), Err(ArtifactError::InconsistentSchema { .. })));
    }

    #[test]
    // Purpose
    // -------
    // The coefficient export is a two-column CSV in column order.
    //
    // Given
    // -----
    // - The toy artifact exported to memory.
    //
    // Expect
    // ------
    // - Header `feature,beta`, one line per column, `price,-1` present.
    fn export_coefficients_writes_feature_beta_table() {
        let artifact = toy_artifact();
        let mut buf = Vec::new();

        artifact.export_coefficients(&mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "feature,beta");
        assert_eq!(lines.len(), artifact.coefficients.len() + 1);
        assert!(lines.contains(&"price,-1"));
        assert!(lines[1].starts_with(&format!("{},", artifact.feature_cols()[0])));
    }
}
