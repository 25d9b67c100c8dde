//! # ApiError
//!
//! Every failure leaves the API as `{"code": "...", "message": "..."}`.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::DomainError;
use serde::Serialize;
use tracing::{error, warn};

/// Error code of a failed response, read back by the metrics middleware.
#[derive(Debug, Clone)]
pub struct ErrorCode(pub String);

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Debug)]
pub struct ApiError(pub DomainError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(DomainError::Validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(DomainError::Validation(rejection.body_text()))
    }
}

fn status_of(err: &DomainError) -> StatusCode {
    match err {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::InvalidCredentials | DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::DuplicateEmail(_) | DomainError::AlreadySubscribed { .. } => {
            StatusCode::CONFLICT
        }
        DomainError::ExternalService(_)
        | DomainError::EmailSendFailure(_)
        | DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Client-facing message. Server-side details stay in the log.
fn public_message(err: &DomainError) -> String {
    match err {
        DomainError::Internal(_) => "internal server error".into(),
        DomainError::ExternalService(_) => "AI content generation failed".into(),
        DomainError::EmailSendFailure(_) => "failed to send verification email".into(),
        other => other.to_string(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = status_of(&err);
        let code = err.code();

        if status.is_server_error() {
            error!(%code, error = %err, "request failed");
        } else {
            warn!(%code, error = %err, "request rejected");
        }

        let body = ErrorBody {
            code: code.clone(),
            message: public_message(&err),
        };
        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(ErrorCode(code));
        response
    }
}
