//! Borrow lifecycle service

use crate::{
    config::BorrowingConfig,
    error::AppResult,
    models::borrow::{BorrowRecord, BorrowRecordDetails},
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowsService {
    repository: Repository,
    policy: BorrowingConfig,
}

impl BorrowsService {
    pub fn new(repository: Repository, policy: BorrowingConfig) -> Self {
        Self { repository, policy }
    }

    /// Borrow a book for a user. Enforces the configured per-user cap and
    /// delegates the atomic count-and-record transition to the ledger.
    pub async fn borrow_book(&self, user_id: i64, book_id: i64) -> AppResult<BorrowRecord> {
        // Verify user exists
        self.repository.users.get_by_id(user_id).await?;
        self.repository
            .borrows
            .borrow_book(user_id, book_id, self.policy.max_books_per_user)
            .await
    }

    /// Return a borrowed book by record ID
    pub async fn return_book(&self, record_id: i64) -> AppResult<BorrowRecord> {
        self.repository.borrows.return_book(record_id).await
    }

    /// Borrow history for one user, newest first
    pub async fn history_for_user(
        &self,
        user_id: i64,
        cursor: i64,
        limit: i64,
    ) -> AppResult<Vec<BorrowRecordDetails>> {
        self.repository.borrows.list_by_user(user_id, cursor, limit).await
    }

    /// Active loans for one user
    pub async fn active_loans(&self, user_id: i64) -> AppResult<Vec<BorrowRecordDetails>> {
        // Verify user exists
        self.repository.users.get_by_id(user_id).await?;
        self.repository.borrows.list_active_by_user(user_id).await
    }

    /// Borrow history across all users, newest first
    pub async fn history(&self, cursor: i64, limit: i64) -> AppResult<Vec<BorrowRecordDetails>> {
        self.repository.borrows.list_all(cursor, limit).await
    }

    /// Most recent borrow record for a (user, book) pair
    pub async fn get_record(&self, user_id: i64, book_id: i64) -> AppResult<BorrowRecord> {
        self.repository.borrows.get_record(user_id, book_id).await
    }

    /// Number of books a user currently has on loan
    pub async fn count_active(&self, user_id: i64) -> AppResult<i64> {
        self.repository.borrows.count_active(user_id).await
    }
}
