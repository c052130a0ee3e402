use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use crate::api::{
    error::ApiError,
    state::AppState,
    types::{HealthResponse, KnownCategories, ModelInfo},
};
use crate::features::{CategoricalField, InputRecord};
use crate::predictor::PredictionResult;

/// POST /api/prediction/predict
pub async fn predict(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<Json<PredictionResult>, ApiError> {
    let Json(body) = payload?;
    debug!(record = %body, "Prediction request received");

    let record = InputRecord::from_value(body)?;
    let result = state.context.predict(&record)?;

    debug!(
        prediccion = result.label,
        probabilidad = result.probability,
        "Prediction served"
    );
    Ok(Json(result))
}

/// GET /api/prediction/model
pub async fn model_info(State(state): State<AppState>) -> Json<ModelInfo> {
    let ctx = &state.context;
    let schema = ctx.schema();
    let classifier = ctx.predictor().classifier();

    let known = |field: CategoricalField| -> Vec<String> {
        schema
            .categories(field)
            .values()
            .map(str::to_string)
            .collect()
    };

    Json(ModelInfo {
        kind: classifier.kind().to_string(),
        n_features: classifier.n_features(),
        columns: schema.columns().to_vec(),
        categories: KnownCategories {
            genero: known(CategoricalField::Genero),
            enfermedad: known(CategoricalField::Enfermedad),
        },
        classes: classifier.classes().map(<[_]>::to_vec),
        positive_class: ctx.predictor().positive_class().cloned(),
        metadata: ctx.metadata().clone(),
    })
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let classifier = state.context.predictor().classifier();
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        uptime_seconds: state.uptime_seconds(),
        model_kind: classifier.kind().to_string(),
        n_features: classifier.n_features(),
    })
}

/// GET /healthz - is the process alive?
pub async fn liveness() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /readyz - the server only starts once the model context is loaded.
pub async fn readiness(State(_state): State<AppState>) -> impl IntoResponse {
    StatusCode::OK
}
