//! Deploy-safe classifier inference.
//!
//! Models are exported by the training pipeline as JSON documents tagged by
//! `kind`, evaluated in pure Rust without a Python runtime.

pub mod classifier;
pub mod dense;
pub mod forest;
pub mod linear;

use serde::{Deserialize, Serialize};

pub use classifier::{ClassLabel, Classifier};
pub use dense::{Activation, DenseLayer, DenseNetwork};
pub use forest::{DecisionTree, TreeEnsemble};
pub use linear::LinearModel;

use crate::error::InferenceError;

/// Every model kind the service can serve.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Model {
    LogisticRegression(LinearModel),
    /// Same parameters as logistic regression, no probability interface.
    LinearSvm(LinearModel),
    DecisionTree(TreeEnsemble),
    RandomForest(TreeEnsemble),
    Mlp(DenseNetwork),
}

impl Model {
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Self::LogisticRegression(m) | Self::LinearSvm(m) => m.validate(),
            Self::DecisionTree(m) => {
                if m.trees.len() != 1 {
                    return Err(format!(
                        "decision_tree must contain exactly 1 tree, got {}",
                        m.trees.len()
                    ));
                }
                m.validate()
            }
            Self::RandomForest(m) => m.validate(),
            Self::Mlp(m) => m.validate(),
        }
    }
}

impl Classifier for Model {
    fn kind(&self) -> &'static str {
        match self {
            Self::LogisticRegression(_) => "logistic_regression",
            Self::LinearSvm(_) => "linear_svm",
            Self::DecisionTree(_) => "decision_tree",
            Self::RandomForest(_) => "random_forest",
            Self::Mlp(m) => m.kind(),
        }
    }

    fn n_features(&self) -> usize {
        match self {
            Self::LogisticRegression(m) | Self::LinearSvm(m) => m.n_features(),
            Self::DecisionTree(m) | Self::RandomForest(m) => m.n_features,
            Self::Mlp(m) => m.n_features(),
        }
    }

    fn classes(&self) -> Option<&[ClassLabel]> {
        match self {
            Self::LogisticRegression(m) | Self::LinearSvm(m) => Some(m.classes.as_slice()),
            Self::DecisionTree(m) | Self::RandomForest(m) => Some(m.classes.as_slice()),
            Self::Mlp(m) => m.classes(),
        }
    }

    fn predict(&self, row: &[f64]) -> std::result::Result<ClassLabel, InferenceError> {
        match self {
            Self::LogisticRegression(m) | Self::LinearSvm(m) => m.predict(row),
            Self::DecisionTree(m) | Self::RandomForest(m) => m.predict(row),
            Self::Mlp(m) => m.predict(row),
        }
    }

    fn predict_proba(&self, row: &[f64]) -> Option<std::result::Result<Vec<f64>, InferenceError>> {
        match self {
            Self::LogisticRegression(m) => Some(m.predict_proba(row)),
            Self::LinearSvm(_) => None,
            Self::DecisionTree(m) | Self::RandomForest(m) => Some(m.predict_proba(row)),
            Self::Mlp(m) => m.predict_proba(row),
        }
    }
}

/// The serialized classifier artifact: a model plus optional training-time
/// metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    #[serde(flatten)]
    pub model: Model,

    /// Class whose probability is reported, when declared at training time.
    #[serde(default)]
    pub positive_class: Option<ClassLabel>,

    /// Optional free-form metadata (versioning, training info, etc).
    #[serde(default)]
    pub metadata: serde_json::Value,
}
