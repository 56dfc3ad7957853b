use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by every endpoint on failure
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Item not found or access denied.",
    "request_id": "req-abc123xyz",
    "timestamp": "2024-12-09T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// Human-readable error description
    #[schema(example = "Item not found or access denied.")]
    pub error: String,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "req-abc123xyz")]
    pub request_id: Option<String>,
    /// ISO 8601 timestamp when error occurred
    #[schema(example = "2024-12-09T10:30:00.000Z")]
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    /// Rejection coming from the session validator, forwarded as-is.
    #[error("Session error ({status}): {message}")]
    Session { status: StatusCode, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    /// Server-side failure already logged; carries only the public message.
    #[error("{0}")]
    Opaque(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ServiceError {
    fn from(rejection: QueryRejection) -> Self {
        ServiceError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl ServiceError {
    /// Whether this error originates on the server side and must not leak.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::DatabaseError(_) | Self::InternalError(_))
    }

    /// Logs internal failures and replaces them with `public_message`.
    /// Client errors (validation, not-found, session) pass through untouched.
    pub fn mask(self, public_message: &str) -> Self {
        if self.is_internal() {
            error!(error = %self, "{}", public_message);
            ServiceError::Opaque(public_message.to_string())
        } else {
            self
        }
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Session { status, .. } => *status,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::DatabaseError(_) | Self::InternalError(_) | Self::Opaque(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) | Self::InternalError(_) => "Internal server error".to_string(),
            Self::Session { message, .. } => message.clone(),
            Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::ValidationError(msg)
            | Self::Opaque(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.response_message(),
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

pub type AppError = ServiceError;
