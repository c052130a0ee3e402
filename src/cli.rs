use clap::{Args, Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

use crate::api::{ApiServer, AppState};
use crate::artifacts::load_context;
use crate::config::AppConfig;
use crate::context::ModelContext;
use crate::error::{ReingresoError, Result};
use crate::features::{CategoricalField, InputRecord};
use crate::predictor::PredictionResult;

#[derive(Parser, Debug)]
#[command(name = "reingreso")]
#[command(version)]
#[command(about = "Hospital readmission inference service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding default.toml and per-environment config files
    #[arg(short, long, default_value = "config", env = "REINGRESO_CONFIG_DIR")]
    pub config_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the prediction API (default)
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,
        /// HTTP port
        #[arg(short, long)]
        port: Option<u16>,
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Load and validate the model artifacts, then print a summary
    Check {
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Run a single JSON record through the model
    Predict {
        /// JSON file with the record, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,
        #[command(flatten)]
        model: ModelArgs,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct ModelArgs {
    /// Directory holding the model and column artifacts
    #[arg(long)]
    pub model_dir: Option<PathBuf>,
}

impl ModelArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.model_dir {
            config.model.dir = dir.clone();
        }
    }
}

/// Loads the artifacts and serves HTTP until shutdown.
pub async fn run_serve(config: AppConfig) -> Result<()> {
    let context = load_context(&config.model)?;
    info!(
        "Model ready: {} over {} columns",
        context.predictor().classifier().kind(),
        context.schema().len()
    );
    ApiServer::new(AppState::new(context), config.server)
        .run()
        .await
}

/// Validates the artifacts and prints what was loaded.
pub fn run_check(config: &AppConfig) -> Result<()> {
    let context = load_context(&config.model)?;
    print!("{}", describe(&context));
    Ok(())
}

pub fn describe(context: &ModelContext) -> String {
    let classifier = context.predictor().classifier();
    let schema = context.schema();
    let mut out = String::new();
    out.push_str(&format!("model:    {}\n", classifier.kind()));
    out.push_str(&format!("features: {}\n", schema.len()));
    for field in CategoricalField::ALL {
        let values: Vec<&str> = schema.categories(field).values().collect();
        out.push_str(&format!("{:<9} {}\n", format!("{field}:"), values.join(", ")));
    }
    match classifier.classes() {
        Some(classes) => {
            let classes: Vec<String> = classes.iter().map(ToString::to_string).collect();
            out.push_str(&format!("classes:  [{}]\n", classes.join(", ")));
        }
        None => out.push_str("classes:  none (probability always 0.0)\n"),
    }
    if let Some(positive) = context.predictor().positive_class() {
        out.push_str(&format!(
            "positive: {} ({})\n",
            positive.label, positive.source
        ));
    }
    out
}

/// Predicts one record read from `input` (`-` = stdin).
pub fn run_predict(config: &AppConfig, input: &str) -> Result<PredictionResult> {
    let raw = if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input)?
    };
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    let record = InputRecord::from_value(value).map_err(ReingresoError::from)?;

    let context = load_context(&config.model)?;
    context.predict(&record)
}
