use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::api::{handlers, state::AppState};
use crate::error::{ReingresoError, Result};

pub fn create_router(state: AppState, cors_origins: &[String]) -> Result<Router> {
    let cors = cors_layer(cors_origins)?;

    Ok(Router::new()
        // Prediction endpoints
        .route("/api/prediction/predict", post(handlers::predict))
        .route("/api/prediction/model", get(handlers::model_info))
        // Probes
        .route("/health", get(handlers::health))
        .route("/healthz", get(handlers::liveness))
        .route("/readyz", get(handlers::readiness))
        // Add state and CORS
        .with_state(state)
        .layer(cors))
}

/// Any origin when `origins` is empty; otherwise only the listed origins,
/// with credentials allowed.
fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o.trim())
                .map_err(|e| ReingresoError::Internal(format!("invalid CORS origin '{o}': {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}
