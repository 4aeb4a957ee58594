use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    /// Required OAuth credentials or endpoints are missing from configuration.
    Configuration(String),
    /// The caller's request is malformed (missing parameters, bad payload).
    BadRequest(String),
    /// CSRF state token is unknown, already consumed, or expired.
    InvalidState(String),
    /// No valid cached Atlassian token and no way to obtain one.
    AuthenticationRequired(String),
    /// Atlassian answered with a non-success status; the original status and
    /// body are preserved alongside a fixed descriptive tag.
    Upstream {
        tag: String,
        status: u16,
        body: String,
    },
    /// Transport-level failure talking to Atlassian (connect, timeout).
    UpstreamUnavailable(String),
    Internal(String),
}

impl AppError {
    pub fn upstream(tag: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        AppError::Upstream {
            tag: tag.into(),
            status,
            body: body.into(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            AppError::AuthenticationRequired(msg) => {
                write!(f, "Authentication required: {}", msg)
            }
            AppError::Upstream { tag, status, body } => {
                write!(f, "{} (upstream status {}): {}", tag, status, body)
            }
            AppError::UpstreamUnavailable(msg) => write!(f, "Upstream unavailable: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::UpstreamUnavailable(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_kind) = match &self {
            AppError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::InvalidState(_) => (StatusCode::BAD_REQUEST, "invalid_state"),
            AppError::AuthenticationRequired(_) => {
                (StatusCode::UNAUTHORIZED, "authentication_required")
            }
            AppError::Upstream { status, .. } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                "upstream_error",
            ),
            AppError::UpstreamUnavailable(_) => (StatusCode::BAD_GATEWAY, "upstream_unavailable"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };

        let body = match &self {
            AppError::Upstream {
                tag,
                status: upstream_status,
                body,
            } => Json(json!({
                "error": error_kind,
                "message": tag,
                "upstream_status": upstream_status,
                "upstream_body": body,
            })),
            _ => Json(json!({
                "error": error_kind,
                "message": self.to_string(),
            })),
        };

        (status, body).into_response()
    }
}
