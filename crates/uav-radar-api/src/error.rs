//! # API Error Types
//!
//! Unified error handling for the HTTP layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use uav_simulator::SimError;

/// API-level errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Entity not found: {entity_type} with id '{id}'")]
    NotFound { entity_type: String, id: String },

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimError),
}

impl ApiError {
    /// Get HTTP status code for this error
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Simulation(SimError::SnapshotOverflow { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Simulation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get machine-readable error code
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Simulation(SimError::SnapshotOverflow { .. }) => "SUBSCRIBER_UNAVAILABLE",
            Self::Simulation(_) => "SIMULATION_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": {
                "message": self.to_string(),
                "code": self.error_code(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;
