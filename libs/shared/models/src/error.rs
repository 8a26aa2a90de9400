use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Failure classes every core operation reports into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Malformed or missing input. Nothing changed.
    Validation,
    /// Slot taken or a concurrent write won. Retry with fresh data.
    Conflict,
    Forbidden,
    NotFound,
    /// The appointment already sits in the requested terminal state.
    Terminal,
    SignatureInvalid,
    /// Payment processor or store unreachable. Nothing changed, retry.
    ExternalService,
    Internal,
}

impl FailureKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureKind::Conflict | FailureKind::ExternalService)
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Terminal state: {0}")]
    Terminal(String),

    #[error("Signature invalid: {0}")]
    SignatureInvalid(String),

    #[error("External service error: {0}")]
    ExternalService(String),
}

impl AppError {
    /// Builds the HTTP-facing error for a classified core failure.
    pub fn from_kind(kind: FailureKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            FailureKind::Validation => AppError::ValidationError(message),
            FailureKind::Conflict => AppError::Conflict(message),
            FailureKind::Forbidden => AppError::Forbidden(message),
            FailureKind::NotFound => AppError::NotFound(message),
            FailureKind::Terminal => AppError::Terminal(message),
            FailureKind::SignatureInvalid => AppError::SignatureInvalid(message),
            FailureKind::ExternalService => AppError::ExternalService(message),
            FailureKind::Internal => AppError::Internal(message),
        }
    }

    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            AppError::Auth(_) => None,
            AppError::Forbidden(_) => Some(FailureKind::Forbidden),
            AppError::NotFound(_) => Some(FailureKind::NotFound),
            AppError::BadRequest(_) | AppError::ValidationError(_) => Some(FailureKind::Validation),
            AppError::Internal(_) | AppError::Database(_) => Some(FailureKind::Internal),
            AppError::Conflict(_) => Some(FailureKind::Conflict),
            AppError::Terminal(_) => Some(FailureKind::Terminal),
            AppError::SignatureInvalid(_) => Some(FailureKind::SignatureInvalid),
            AppError::ExternalService(_) => Some(FailureKind::ExternalService),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "unauthenticated",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) | AppError::ValidationError(_) => "validation",
            AppError::Internal(_) | AppError::Database(_) => "internal",
            AppError::Conflict(_) => "conflict",
            AppError::Terminal(_) => "terminal",
            AppError::SignatureInvalid(_) => "signature_invalid",
            AppError::ExternalService(_) => "external_service",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Database(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Terminal(msg) => (StatusCode::CONFLICT, msg),
            AppError::SignatureInvalid(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::ExternalService(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        if status.is_server_error() {
            tracing::error!("Error: {}: {}", status, message);
        } else {
            tracing::debug!("Request rejected: {}: {}", status, message);
        }

        let retryable = self.kind().map(|k| k.is_retryable()).unwrap_or(false);

        let body = Json(json!({
            "success": false,
            "error": message,
            "code": self.code(),
            "retryable": retryable
        }));

        (status, body).into_response()
    }
}
