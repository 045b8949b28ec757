//! API Error Handling
//!
//! Maps service errors onto HTTP responses with an `{"error": ..}` body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use locker_core::dto::ErrorBody;

use crate::repository::StorageError;
use crate::service::LockError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Conflict(String),
    StorageError(StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::StorageError(err) => {
                tracing::error!("Storage error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<LockError> for ApiError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Validation(e) => ApiError::BadRequest(e.to_string()),
            LockError::AlreadyLocked => ApiError::Conflict(LockError::AlreadyLocked.to_string()),
            LockError::Storage(e) => ApiError::StorageError(e),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use locker_core::domain::ValidationError;

    #[test]
    fn test_validation_error_is_bad_request() {
        let response = ApiError::from(LockError::Validation(ValidationError::ProjectEmpty))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_already_locked_is_conflict() {
        let response = ApiError::from(LockError::AlreadyLocked).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_storage_error_is_internal() {
        let err = LockError::Storage(StorageError::Poisoned("boom".to_string()));
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
