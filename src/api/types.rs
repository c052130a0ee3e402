use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ml::ClassLabel;
use crate::predictor::PositiveClass;

/// Body of every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub model_kind: String,
    pub n_features: usize,
}

/// Known dummy-column values per categorical field
#[derive(Debug, Clone, Serialize)]
pub struct KnownCategories {
    pub genero: Vec<String>,
    pub enfermedad: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub kind: String,
    pub n_features: usize,
    pub columns: Vec<String>,
    pub categories: KnownCategories,
    pub classes: Option<Vec<ClassLabel>>,
    pub positive_class: Option<PositiveClass>,
    pub metadata: serde_json::Value,
}
