pub mod api;
pub mod artifacts;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod features;
pub mod logging;
pub mod ml;
pub mod predictor;

pub use artifacts::load_context;
pub use config::AppConfig;
pub use context::ModelContext;
pub use error::{ArtifactError, EncodeError, InferenceError, ReingresoError, Result};
pub use features::{encode, EncodedFeatures, FeatureSchema, InputRecord};
pub use ml::{ClassLabel, Classifier, Model, ModelArtifact};
pub use predictor::{PositiveClass, PositiveClassSource, PredictionResult, Predictor};
