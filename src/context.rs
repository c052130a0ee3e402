//! Immutable bundle of everything a request needs, built once at startup.

use std::sync::Arc;

use crate::error::{ArtifactError, ReingresoError, Result};
use crate::features::{encode, FeatureSchema, InputRecord};
use crate::ml::{ClassLabel, Classifier};
use crate::predictor::{PredictionResult, Predictor};

#[derive(Debug, Clone)]
pub struct ModelContext {
    schema: Arc<FeatureSchema>,
    predictor: Predictor,
    metadata: serde_json::Value,
}

impl ModelContext {
    /// Pairs a schema with a classifier; their widths must agree.
    pub fn new(
        schema: FeatureSchema,
        model: Arc<dyn Classifier>,
        declared_positive: Option<&ClassLabel>,
    ) -> std::result::Result<Self, ArtifactError> {
        if model.n_features() != schema.len() {
            return Err(ArtifactError::Incompatible(format!(
                "{} model expects {} features, column list has {}",
                model.kind(),
                model.n_features(),
                schema.len()
            )));
        }
        let predictor = Predictor::new(model, declared_positive)?;
        Ok(Self {
            schema: Arc::new(schema),
            predictor,
            metadata: serde_json::Value::Null,
        })
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    /// Encoder → predictor for one record.
    pub fn predict(&self, record: &InputRecord) -> Result<PredictionResult> {
        let features = encode(record, &self.schema)?;
        self.predictor
            .predict(&features.values)
            .map_err(ReingresoError::from)
    }
}
