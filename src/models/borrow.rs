//! Borrow record model and projections

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// One borrow event. A new row is inserted per borrow; `returned_at` is
/// stamped on return and the row is never deleted.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BorrowRecord {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub borrowed_at: DateTime<Utc>,
    /// `None` while the book is on loan
    pub returned_at: Option<DateTime<Utc>>,
}

impl BorrowRecord {
    /// An active record is one whose book has not been returned yet.
    pub fn is_active(&self) -> bool {
        self.returned_at.is_none()
    }
}

/// Borrow record joined with user and book names, for history listings
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BorrowRecordDetails {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub book_id: i64,
    pub title: String,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}
