use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use campus_db::DbError;
use campus_types::api::MessageBody;
use thiserror::Error;
use tracing::error;

/// Every failure a handler can surface. Bodies are always `{ "message": .. }`
/// and never carry store or crypto detail.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    /// Kept generic so responses never reveal whether a username exists.
    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("store failure: {0}")]
    Store(DbError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::DuplicateKey(_) => ApiError::Conflict("Already taken"),
            other => ApiError::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("{}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(MessageBody::new(message))).into_response()
    }
}
