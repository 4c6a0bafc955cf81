//! Batch training: wide records in, validated [`ModelArtifact`] out.
//!
//! Steps, in order: reshape and clean → split by choice set → fit the schema
//! on the training split → phase-1 encode → fit the scaler → phase-2 encode
//! (train, then validation with the same scaler) → fit the conditional logit
//! → evaluate → assemble the artifact.
use crate::choice::{
    artifact::{FitSummary, ModelArtifact},
    core::{
        encoder::Encoder,
        io::read_wide_csv,
        options::TrainOptions,
        reshape::{WideRecord, reshape_to_choice_data},
        scaler::Scaler,
        schema::FeatureSchema,
        split::train_validation_split,
    },
    errors::ChoiceResult,
    evaluate::evaluate_design,
    models::ConditionalLogit,
};
use std::path::Path;
use tracing::info;

/// Train on in-memory wide records.
///
/// The result passes the same [`ModelArtifact::validate`] checks as a loaded
/// artifact.
///
/// # Errors
/// Any hard failure of the individual steps: malformed choice sets, missing
/// base categories, an empty training split, a failed optimization, or
/// `Artifact` when the fitted model does not form a valid artifact.
pub fn train_pipeline(records: &[WideRecord], opts: &TrainOptions) -> ChoiceResult<ModelArtifact> {
    let data = reshape_to_choice_data(records, &opts.reshape)?;
    let n_dropped = data.n_dropped();
    let (train, valid) = train_validation_split(data, &opts.split)?;

    let schema = FeatureSchema::fit(&train, &opts.schema)?;
    let encoder = Encoder::new(&schema);
    let raw_train = encoder.encode_raw(&train);
    let scaler = Scaler::fit(&raw_train)?;
    let train_x = raw_train.apply_scaling_and_interactions(&scaler)?;
    let valid_x = if valid.is_empty() {
        None
    } else {
        Some(encoder.encode_raw(&valid).apply_scaling_and_interactions(&scaler)?)
    };
    info!(
        n_train = train_x.len(),
        n_validation = valid.len(),
        n_dropped,
        n_features = schema.n_features(),
        "encoded design matrices"
    );

    let mut model = ConditionalLogit::new(opts.fit.clone());
    let report = model.fit(&train_x)?;
    let train_metrics = evaluate_design(&report.coefficients, &train_x)?;
    let validation_metrics =
        valid_x.as_ref().map(|v| evaluate_design(&report.coefficients, v)).transpose()?;
    info!(
        accuracy = train_metrics.accuracy,
        avg_chosen_prob = train_metrics.avg_chosen_prob,
        "training metrics"
    );
    if let Some(m) = &validation_metrics {
        info!(accuracy = m.accuracy, avg_chosen_prob = m.avg_chosen_prob, "validation metrics");
    }

    let summary = FitSummary::from_report(report, Some(train_metrics), validation_metrics);
    let coefficients = report.coefficients.to_vec();
    Ok(ModelArtifact::new(coefficients, schema, scaler, summary)?)
}

/// [`read_wide_csv`] followed by [`train_pipeline`].
pub fn train_from_csv<P: AsRef<Path>>(path: P, opts: &TrainOptions) -> ChoiceResult<ModelArtifact> {
    let records = read_wide_csv(path, &opts.reshape)?;
    train_pipeline(&records, opts)
}
