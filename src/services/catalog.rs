//! Catalog management service

use crate::{
    error::AppResult,
    models::book::{Book, BookUpdate, NewBook, SortOrder},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Add a book to the catalog
    pub async fn add_book(&self, book: NewBook) -> AppResult<Book> {
        self.repository.books.create(&book).await
    }

    /// Get a book by ID
    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Replace a book's mutable fields
    pub async fn update_book(&self, id: i64, book: BookUpdate) -> AppResult<Book> {
        self.repository.books.update(id, &book).await
    }

    /// Remove a book from the catalog. Idempotent.
    pub async fn remove_book(&self, id: i64) -> AppResult<()> {
        self.repository.books.delete(id).await
    }

    /// List books with cursor pagination
    pub async fn list_books(
        &self,
        cursor: i64,
        limit: i64,
        order: SortOrder,
    ) -> AppResult<Vec<Book>> {
        self.repository.books.list(cursor, limit, order).await
    }
}
