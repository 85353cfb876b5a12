use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PREDICTION_NOT_FOUND: &str = "request with this ID not found";
pub const HISTORY_FILE_NOT_FOUND: &str = "history file not found";

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("{0}")]
    NotFound(String),

    #[error("failed to persist prediction history: {0}")]
    Persistence(String),
}

impl PredictError {
    pub fn status(&self) -> StatusCode {
        match self {
            PredictError::Validation { .. } => StatusCode::BAD_REQUEST,
            PredictError::NotFound(_) => StatusCode::NOT_FOUND,
            PredictError::Inference(_) | PredictError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            PredictError::Validation { .. } => "VALIDATION_ERROR",
            PredictError::Inference(_) => "INFERENCE_ERROR",
            PredictError::NotFound(_) => "NOT_FOUND",
            PredictError::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        let details = match self {
            PredictError::Validation { field, .. } => Some(field.clone()),
            _ => None,
        };
        ErrorEnvelope {
            error: ErrorPayload {
                code: self.code().to_string(),
                message: self.to_string(),
                details,
            },
        }
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            tracing::error!(code = self.code(), "{}", self);
        } else {
            tracing::debug!(code = self.code(), "{}", self);
        }
        (self.status(), Json(self.envelope())).into_response()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}
