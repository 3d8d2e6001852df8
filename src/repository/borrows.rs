//! Borrow ledger repository.
//!
//! Every multi-step mutation here runs inside a single transaction: the
//! availability count and the borrow record move together or not at all.
//! The availability check-and-decrement is one conditional UPDATE, so two
//! concurrent borrows of the last copy cannot both succeed.

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::borrow::{BorrowRecord, BorrowRecordDetails},
    repository::books::BooksRepository,
};

/// Partial unique index guarding "one active loan per (user, book)".
const ACTIVE_LOAN_INDEX: &str = "borrow_history_active_idx";

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
    books: BooksRepository,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>, books: BooksRepository) -> Self {
        Self { pool, books }
    }

    /// Borrow a book for a user: take one available copy and insert the
    /// borrow record, atomically.
    ///
    /// `max_active` is the optional per-user cap on simultaneous loans. The
    /// cap and the already-borrowing pre-checks read within the same
    /// transaction; the already-borrowing rule is additionally enforced by
    /// the partial unique index, so a racing duplicate insert surfaces as
    /// `AlreadyBorrowing` rather than a raw constraint error.
    pub async fn borrow_book(
        &self,
        user_id: i64,
        book_id: i64,
        max_active: Option<u32>,
    ) -> AppResult<BorrowRecord> {
        let mut tx = self.pool.begin().await?;

        let already_borrowing: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM borrow_history
                WHERE user_id = $1 AND book_id = $2 AND returned_at IS NULL
            )
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_borrowing {
            return Err(AppError::AlreadyBorrowing { user_id, book_id });
        }

        if let Some(limit) = max_active {
            let active = Self::count_active_on(&mut tx, user_id).await?;
            if active >= i64::from(limit) {
                return Err(AppError::BorrowLimitReached { user_id, limit });
            }
        }

        if !self.books.decrement_available(&mut tx, book_id).await? {
            // No row changed: either the book is missing or out of copies.
            return Err(if self.books.exists(&mut tx, book_id).await? {
                AppError::BookUnavailable(book_id)
            } else {
                AppError::NotFound(format!("Book with id {} not found", book_id))
            });
        }

        let record = sqlx::query_as::<_, BorrowRecord>(
            r#"
            INSERT INTO borrow_history (user_id, book_id)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| Self::map_insert_error(e, user_id, book_id))?;

        tx.commit().await?;

        Ok(record)
    }

    /// Return a borrowed book: stamp the record and put the copy back,
    /// atomically.
    pub async fn return_book(&self, id: i64) -> AppResult<BorrowRecord> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, BorrowRecord>(
            "SELECT * FROM borrow_history WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrow record with id {} not found", id)))?;

        if existing.returned_at.is_some() {
            return Err(AppError::AlreadyReturned(id));
        }

        // The predicate re-checks under the row lock: a racing return of the
        // same record sees zero rows here and fails instead of double
        // incrementing the count.
        let record = sqlx::query_as::<_, BorrowRecord>(
            r#"
            UPDATE borrow_history
            SET returned_at = now()
            WHERE id = $1 AND returned_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::AlreadyReturned(id))?;

        self.books.increment_available(&mut tx, record.book_id).await?;

        tx.commit().await?;

        Ok(record)
    }

    /// List borrow history for one user, newest first, cursor-paginated.
    pub async fn list_by_user(
        &self,
        user_id: i64,
        cursor: i64,
        limit: i64,
    ) -> AppResult<Vec<BorrowRecordDetails>> {
        let rows = if cursor > 0 {
            sqlx::query_as::<_, BorrowRecordDetails>(
                r#"
                SELECT bh.id, bh.user_id, u.username, bh.book_id, b.title,
                       bh.borrowed_at, bh.returned_at
                FROM borrow_history bh
                JOIN users u ON bh.user_id = u.id
                JOIN books b ON bh.book_id = b.id
                WHERE bh.user_id = $1 AND bh.id < $2
                ORDER BY bh.id DESC
                LIMIT $3
                "#,
            )
            .bind(user_id)
            .bind(cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, BorrowRecordDetails>(
                r#"
                SELECT bh.id, bh.user_id, u.username, bh.book_id, b.title,
                       bh.borrowed_at, bh.returned_at
                FROM borrow_history bh
                JOIN users u ON bh.user_id = u.id
                JOIN books b ON bh.book_id = b.id
                WHERE bh.user_id = $1
                ORDER BY bh.id DESC
                LIMIT $2
                "#,
            )
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(rows)
    }

    /// List borrow history across all users, newest first, cursor-paginated.
    pub async fn list_all(&self, cursor: i64, limit: i64) -> AppResult<Vec<BorrowRecordDetails>> {
        let rows = if cursor > 0 {
            sqlx::query_as::<_, BorrowRecordDetails>(
                r#"
                SELECT bh.id, bh.user_id, u.username, bh.book_id, b.title,
                       bh.borrowed_at, bh.returned_at
                FROM borrow_history bh
                JOIN users u ON bh.user_id = u.id
                JOIN books b ON bh.book_id = b.id
                WHERE bh.id < $1
                ORDER BY bh.id DESC
                LIMIT $2
                "#,
            )
            .bind(cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, BorrowRecordDetails>(
                r#"
                SELECT bh.id, bh.user_id, u.username, bh.book_id, b.title,
                       bh.borrowed_at, bh.returned_at
                FROM borrow_history bh
                JOIN users u ON bh.user_id = u.id
                JOIN books b ON bh.book_id = b.id
                ORDER BY bh.id DESC
                LIMIT $1
                "#,
            )
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(rows)
    }

    /// Active loans for one user (records not yet returned), oldest first
    pub async fn list_active_by_user(&self, user_id: i64) -> AppResult<Vec<BorrowRecordDetails>> {
        let rows = sqlx::query_as::<_, BorrowRecordDetails>(
            r#"
            SELECT bh.id, bh.user_id, u.username, bh.book_id, b.title,
                   bh.borrowed_at, bh.returned_at
            FROM borrow_history bh
            JOIN users u ON bh.user_id = u.id
            JOIN books b ON bh.book_id = b.id
            WHERE bh.user_id = $1 AND bh.returned_at IS NULL
            ORDER BY bh.borrowed_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Most recent borrow record for a (user, book) pair
    pub async fn get_record(&self, user_id: i64, book_id: i64) -> AppResult<BorrowRecord> {
        sqlx::query_as::<_, BorrowRecord>(
            r#"
            SELECT * FROM borrow_history
            WHERE user_id = $1 AND book_id = $2
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No borrow record for user {} and book {}",
                user_id, book_id
            ))
        })
    }

    /// Count a user's active loans
    pub async fn count_active(&self, user_id: i64) -> AppResult<i64> {
        let mut conn = self.pool.acquire().await?;
        Self::count_active_on(&mut conn, user_id).await
    }

    async fn count_active_on(conn: &mut sqlx::PgConnection, user_id: i64) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_history WHERE user_id = $1 AND returned_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(conn)
        .await?;
        Ok(count)
    }

    fn map_insert_error(e: sqlx::Error, user_id: i64, book_id: i64) -> AppError {
        match e {
            sqlx::Error::Database(db) if db.constraint() == Some(ACTIVE_LOAN_INDEX) => {
                AppError::AlreadyBorrowing { user_id, book_id }
            }
            other => AppError::Database(other),
        }
    }
}
