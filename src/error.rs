//! Error types for Biblio server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Book {0} has no available copies")]
    BookUnavailable(i64),

    #[error("Borrow record {0} is already returned")]
    AlreadyReturned(i64),

    #[error("User {user_id} is already borrowing book {book_id}")]
    AlreadyBorrowing { user_id: i64, book_id: i64 },

    #[error("User {user_id} has reached the borrow limit ({limit})")]
    BorrowLimitReached { user_id: i64, limit: u32 },
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl AppError {
    /// Stable machine-readable kind, used in response bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Authentication(_) => "authentication",
            AppError::Authorization(_) => "authorization",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation",
            AppError::Database(_) => "database",
            AppError::Conflict(_) => "conflict",
            AppError::BadRequest(_) => "bad_request",
            AppError::Internal(_) => "internal",
            AppError::BookUnavailable(_) => "book_unavailable",
            AppError::AlreadyReturned(_) => "already_returned",
            AppError::AlreadyBorrowing { .. } => "already_borrowing",
            AppError::BorrowLimitReached { .. } => "borrow_limit_reached",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Conflict(_)
            | AppError::BookUnavailable(_)
            | AppError::AlreadyReturned(_)
            | AppError::AlreadyBorrowing { .. }
            | AppError::BorrowLimitReached { .. } => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            error: self.kind().to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_class_errors_map_to_409() {
        for err in [
            AppError::BookUnavailable(1),
            AppError::AlreadyReturned(1),
            AppError::AlreadyBorrowing { user_id: 1, book_id: 2 },
            AppError::BorrowLimitReached { user_id: 1, limit: 5 },
            AppError::Conflict("duplicate".into()),
        ] {
            assert_eq!(err.status(), StatusCode::CONFLICT, "{}", err.kind());
        }
    }

    #[test]
    fn lookup_failures_map_to_404() {
        assert_eq!(
            AppError::NotFound("book 7".into()).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn store_failures_map_to_500() {
        assert_eq!(
            AppError::Database(sqlx::Error::PoolTimedOut).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
