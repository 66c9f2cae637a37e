use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Machine-readable error category: "upstream_unavailable",
    /// "schema_validation", "storage" or "bad_request"
    pub kind: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Non-2xx status, transport failure or timeout from the forecast provider.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Provider answered, but not with the expected hourly series.
    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::UpstreamUnavailable(_) => "upstream_unavailable",
            AppError::SchemaValidation(_) => "schema_validation",
            AppError::Storage(_) => "storage",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::UpstreamUnavailable(_) | AppError::SchemaValidation(_) => {
                tracing::warn!("{}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::Storage(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error: internal database error".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: message,
            kind: self.kind().to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}
