//! Train a conditional logit on a wide choice-survey CSV.
//!
//! Usage:
//!   train_mnl --data <CSV> [OPTIONS]
//!
//! Writes the model artifact (JSON) and the `feature,beta` coefficient table,
//! then prints a short fit summary. Logging goes to stderr and honours
//! `RUST_LOG` (default `info`).
//!
//! Example:
//!   RUST_LOG=debug train_mnl --data car_choice.csv --std-errors robust

use clap::Parser;
use rust_choicemodels::{
    choice::{
        artifact::ModelArtifact,
        core::options::{
            FitOptions, ReshapeOptions, SchemaOptions, SplitOptions, StdErrorKind, TrainOptions,
            DEFAULT_FUEL_BASE, DEFAULT_L2, DEFAULT_N_ALTERNATIVES, DEFAULT_SEED,
            DEFAULT_TYPE_BASE, DEFAULT_VALIDATION_FRACTION,
        },
        pipeline::train_from_csv,
    },
    optimization::loglik_optimizer::{LineSearcher, MLEOptions, Tolerances},
};
use std::{error::Error, path::PathBuf, process::ExitCode};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "train_mnl")]
#[command(version, about = "Fit a conditional logit choice model and export the artifact")]
struct Cli {
    /// Wide-format choice data (one row per choice task)
    #[arg(long)]
    data: PathBuf,

    /// Where to write the model artifact
    #[arg(long, default_value = "mnl_model.json")]
    model_out: PathBuf,

    /// Where to write the feature,beta table
    #[arg(long, default_value = "mnl_coefficients.csv")]
    coefficients_out: PathBuf,

    /// Alternatives per choice task
    #[arg(long, default_value_t = DEFAULT_N_ALTERNATIVES)]
    alternatives: usize,

    /// L2 penalty on the coefficients
    #[arg(long, default_value_t = DEFAULT_L2)]
    l2: f64,

    /// Iteration cap for L-BFGS
    #[arg(long, default_value_t = 2000)]
    max_iter: usize,

    /// Gradient-norm convergence tolerance
    #[arg(long, default_value_t = 1e-5)]
    tol_grad: f64,

    /// Line search: MoreThuente or HagerZhang
    #[arg(long, default_value = "MoreThuente")]
    line_searcher: LineSearcher,

    /// Share of choice sets held out for validation, in [0, 1)
    #[arg(long, default_value_t = DEFAULT_VALIDATION_FRACTION)]
    validation_fraction: f64,

    /// Seed for the train/validation split
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Reference level for vehicle type
    #[arg(long, default_value = DEFAULT_TYPE_BASE)]
    type_base: String,

    /// Reference level for fuel
    #[arg(long, default_value = DEFAULT_FUEL_BASE)]
    fuel_base: String,

    /// Standard errors: none, classical, robust
    #[arg(long, default_value = "none")]
    std_errors: StdErrorKind,
}

impl Cli {
    fn train_options(&self) -> Result<TrainOptions, Box<dyn Error>> {
        let tols = Tolerances::new(Some(self.tol_grad), None, Some(self.max_iter))?;
        let mle_opts = MLEOptions::new(tols, self.line_searcher, false, None)?;
        Ok(TrainOptions {
            reshape: ReshapeOptions::new(self.alternatives)?,
            schema: SchemaOptions::new(&self.type_base, &self.fuel_base)?,
            fit: FitOptions::new(self.l2, mle_opts, self.std_errors)?,
            split: SplitOptions::new(self.validation_fraction, self.seed)?,
        })
    }
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "training failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let opts = cli.train_options()?;
    info!(data = %cli.data.display(), "training conditional logit");
    let artifact = train_from_csv(&cli.data, &opts)?;
    artifact.save(&cli.model_out)?;
    artifact.export_coefficients_to_path(&cli.coefficients_out)?;
    print_summary(&artifact);
    Ok(())
}

fn print_summary(artifact: &ModelArtifact) {
    let s = &artifact.summary;
    println!("log-likelihood   {:.4}", s.log_likelihood);
    println!("choice sets      {}", s.n_observations);
    println!("parameters       {}", s.n_parameters);
    println!("converged        {} ({}, {} iterations)", s.converged, s.status, s.iterations);
    if let Some(m) = &s.train_metrics {
        println!("train accuracy   {:.4} (avg chosen prob {:.4})", m.accuracy, m.avg_chosen_prob);
    }
    if let Some(m) = &s.validation_metrics {
        println!("valid accuracy   {:.4} (avg chosen prob {:.4})", m.accuracy, m.avg_chosen_prob);
    }
    match &s.std_errors {
        Some(table) => {
            println!("\n{:<28} {:>10} {:>10} {:>8} {:>8}", "feature", "beta", "std_err", "z", "p");
            for row in table {
                let fmt = |v: Option<f64>| v.map_or("-".to_string(), |x| format!("{x:.3}"));
                println!(
                    "{:<28} {:>10.4} {:>10.4} {:>8} {:>8}",
                    row.feature,
                    row.beta,
                    row.std_err,
                    fmt(row.z),
                    fmt(row.p_value)
                );
            }
        }
        None => {
            println!();
            for (name, beta) in artifact.feature_cols().iter().zip(&artifact.coefficients) {
                println!("{name:<28} {beta:>10.4}");
            }
        }
    }
}
