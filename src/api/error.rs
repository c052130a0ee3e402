//! Maps typed failures to deterministic status codes.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::api::types::ErrorBody;
use crate::error::{EncodeError, InferenceError, ReingresoError};

#[derive(Debug)]
pub enum ApiError {
    /// Body is not valid JSON.
    InvalidBody(String),
    /// Record could not be encoded.
    InvalidInput(EncodeError),
    /// Classifier failed; detail is logged, not returned.
    Inference(InferenceError),
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidBody(_) | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Inference(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::InvalidBody(_) => "invalid_body",
            Self::InvalidInput(_) => "invalid_input",
            Self::Inference(_) => "inference_error",
            Self::Internal(_) => "internal_error",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::InvalidBody(msg) => format!("invalid request body: {msg}"),
            Self::InvalidInput(e) => format!("invalid numeric or text field: {e}"),
            Self::Inference(_) => "the model could not produce a prediction".to_string(),
            Self::Internal(_) => "internal server error".to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

impl From<ReingresoError> for ApiError {
    fn from(err: ReingresoError) -> Self {
        match err {
            ReingresoError::Encode(EncodeError::NotAnObject) => {
                Self::InvalidBody(EncodeError::NotAnObject.to_string())
            }
            ReingresoError::Encode(e) => Self::InvalidInput(e),
            ReingresoError::Inference(e) => Self::Inference(e),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<EncodeError> for ApiError {
    fn from(err: EncodeError) -> Self {
        ReingresoError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::InvalidBody(msg) => warn!("Rejected request body: {}", msg),
            Self::InvalidInput(e) => warn!("Rejected prediction input: {}", e),
            Self::Inference(e) => error!("Prediction failed: {}", e),
            Self::Internal(msg) => error!("Internal error: {}", msg),
        }
        let body = ErrorBody {
            error: self.message(),
            code: self.code().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
