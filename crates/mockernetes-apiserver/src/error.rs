use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found (404)
    NotFound(String),

    /// Resource already exists (409)
    AlreadyExists(String),

    /// Conflict - the store refused the write (409)
    Conflict(String),

    /// Invalid input (400)
    BadRequest(String),

    /// Internal server error (500)
    Internal(String),
}

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AlreadyExists(_) | ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::NotFound(msg)
            | ApiError::AlreadyExists(msg)
            | ApiError::Conflict(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = Json(json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": self.message(),
            "reason": "Invalid",
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<mockernetes_storage::StorageError> for ApiError {
    fn from(err: mockernetes_storage::StorageError) -> Self {
        use mockernetes_storage::StorageError;

        match err {
            StorageError::NameRequired { .. } => ApiError::Conflict(err.to_string()),
            StorageError::AlreadyExists { .. } => ApiError::AlreadyExists(err.to_string()),
            StorageError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            StorageError::SerializationError { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("JSON error: {}", err))
    }
}
