use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::bungie::PipelineError;
use crate::oauth::OAuthError;
use crate::storage::StorageError;

/// Error type for the web boundary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Bungie.net error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Bungie.net error: {0}")]
    Gateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    message: String,
    r#type: String,
    code: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } if *status == 401 => StatusCode::UNAUTHORIZED,
            Self::Upstream { .. } | Self::Gateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Unauthorized(_) => "authentication_error",
            Self::NotFound(_) => "not_found_error",
            Self::BadRequest(_) => "invalid_request_error",
            Self::Upstream { .. } | Self::Gateway(_) => "api_error",
            Self::Internal(_) => "server_error",
        }
    }

    fn error_code(&self) -> Option<&str> {
        match self {
            Self::Unauthorized(_) => Some("not_signed_in"),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorDetail {
                message: self.to_string(),
                r#type: self.error_type().to_string(),
                code: self.error_code().map(String::from),
            },
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        tracing::error!(error = %err, "Storage error");
        Self::Internal(err.to_string())
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::MissingCredentials => Self::Unauthorized(err.to_string()),
            PipelineError::NoLinkedProfiles => Self::NotFound(err.to_string()),
            PipelineError::Status { status, .. } => Self::Upstream {
                status,
                message: err.to_string(),
            },
            PipelineError::Storage(e) => e.into(),
            PipelineError::MalformedResponse(_)
            | PipelineError::Decode { .. }
            | PipelineError::Http(_) => Self::Gateway(err.to_string()),
        }
    }
}

impl From<OAuthError> for AppError {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::StateMismatch | OAuthError::Denied { .. } => {
                Self::BadRequest(err.to_string())
            }
            OAuthError::Provider { .. } => Self::Unauthorized(err.to_string()),
            OAuthError::Storage(e) => e.into(),
            OAuthError::Decode(_) | OAuthError::Http(_) => Self::Gateway(err.to_string()),
        }
    }
}
