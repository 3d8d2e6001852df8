//! Books repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookUpdate, NewBook, SortOrder},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Create a new book. No field validation: empty title/author rows are
    /// accepted, only the non-negative count constraint applies.
    pub async fn create(&self, book: &NewBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, category, cover, available_count)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(&book.cover)
        .bind(book.available_count)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Full replace of a book's mutable fields
    pub async fn update(&self, id: i64, book: &BookUpdate) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author = $2, category = $3, cover = $4,
                available_count = $5, updated_at = now()
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(&book.cover)
        .bind(book.available_count)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Delete a book by ID. Idempotent: deleting a missing id succeeds.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// List books with cursor pagination. A cursor of 0 (or below) starts
    /// from the first page in the requested order.
    pub async fn list(&self, cursor: i64, limit: i64, order: SortOrder) -> AppResult<Vec<Book>> {
        let books = match order {
            SortOrder::Asc if cursor > 0 => {
                sqlx::query_as::<_, Book>(
                    "SELECT * FROM books WHERE id > $1 ORDER BY id ASC LIMIT $2",
                )
                .bind(cursor)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            SortOrder::Asc => {
                sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY id ASC LIMIT $1")
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            SortOrder::Desc if cursor > 0 => {
                sqlx::query_as::<_, Book>(
                    "SELECT * FROM books WHERE id < $1 ORDER BY id DESC LIMIT $2",
                )
                .bind(cursor)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            SortOrder::Desc => {
                sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY id DESC LIMIT $1")
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(books)
    }

    /// Atomically take one copy: decrements `available_count` only while it
    /// is positive. Returns whether a copy was taken. Runs on the caller's
    /// connection so it joins the borrow transaction.
    pub async fn decrement_available(&self, conn: &mut PgConnection, id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_count = available_count - 1, updated_at = now()
            WHERE id = $1 AND available_count > 0
            "#,
        )
        .bind(id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Put one copy back. Runs on the caller's connection so it joins the
    /// return transaction.
    pub async fn increment_available(&self, conn: &mut PgConnection, id: i64) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE books
            SET available_count = available_count + 1, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Check whether a book row exists, on the caller's connection.
    pub async fn exists(&self, conn: &mut PgConnection, id: i64) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(conn)
            .await?;
        Ok(exists)
    }
}
