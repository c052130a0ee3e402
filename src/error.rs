use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the readmission service
#[derive(Error, Debug)]
pub enum ReingresoError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Startup artifact errors
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    // Per-request errors
    #[error("Invalid input: {0}")]
    Encode(#[from] EncodeError),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for ReingresoError
pub type Result<T> = std::result::Result<T, ReingresoError>;

/// Fatal errors raised while loading the model artifacts at startup
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("artifact {path} does not exist; {listing}")]
    Missing { path: PathBuf, listing: String },

    #[error("failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("invalid feature schema: {0}")]
    InvalidSchema(String),

    #[error("model and schema are incompatible: {0}")]
    Incompatible(String),
}

/// Per-request errors raised while building the feature vector
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("field '{field}' must be numeric, got {value}")]
    NotNumeric { field: String, value: String },

    #[error("field '{field}' must be a finite number")]
    NotFinite { field: String },

    #[error("field '{field}' must be a string, got {value}")]
    NotText { field: String, value: String },
}

/// Per-request errors raised by the classifier or while reading its output
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("feature vector has {got} values, model expects {expected}")]
    ShapeMismatch { got: usize, expected: usize },

    #[error("predicted label {0} cannot be coerced to an integer")]
    LabelNotInteger(String),

    #[error("probability row has {got} columns, model reports {expected} classes")]
    ProbabilityShape { got: usize, expected: usize },

    #[error("positive-class probability {0} is outside [0, 1]")]
    ProbabilityOutOfRange(f64),

    #[error("model evaluation failed: {0}")]
    Model(String),
}
