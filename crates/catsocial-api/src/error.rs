use std::fmt::Display;

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use catsocial_db::DbError;
use catsocial_types::api::ErrorBody;
use tracing::error;

/// Error type returned by every handler. Rendered as
/// `{"status": "Error", "message": ...}` with the matching status code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log `err` and hide it behind a generic 500.
    pub(crate) fn internal(context: &str, err: impl Display) -> Self {
        error!("{}: {}", context, err);
        ApiError::Internal
    }

    /// Like `From<DbError>`, but with a caller-specific 404 message.
    pub(crate) fn or_not_found(err: DbError, message: &str) -> Self {
        match err {
            DbError::NotFound => ApiError::NotFound(message.to_string()),
            other => other.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: "Error".to_string(),
            message: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => ApiError::NotFound(err.to_string()),
            DbError::DuplicateEmail => ApiError::Conflict(err.to_string()),
            DbError::SexLocked | DbError::MatchRule(_) | DbError::MatchClosed(_) => {
                ApiError::BadRequest(err.to_string())
            }
            DbError::NotParticipant | DbError::NotIssuer => ApiError::Forbidden(err.to_string()),
            DbError::Sqlite(_) | DbError::Pool(_) => ApiError::internal("Database failure", err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
