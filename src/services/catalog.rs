//! Catalog management service

use crate::{
    error::AppResult,
    models::book::{Book, BookAvailability, BookQuery, CreateBook, UpdateBook},
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

    /// Search books with filters
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query).await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Availability snapshot for a book
    pub async fn availability(&self, id: i32) -> AppResult<BookAvailability> {
        self.repository.books.availability(id).await
    }

    /// Create a new book
    pub async fn create_book(&self, book: &CreateBook) -> AppResult<Book> {
        let created = self.repository.books.create(book).await?;
        tracing::info!(book_id = created.id, copies = created.total_copies, "book created");
        Ok(created)
    }

    /// Update a book, routing copy-count changes through the inventory
    /// adjustment that keeps availability consistent.
    pub async fn update_book(&self, id: i32, update: &UpdateBook) -> AppResult<Book> {
        self.repository.books.update(id, update).await
    }

    /// Deactivate a book (no hard deletes; the ledger references it)
    pub async fn deactivate_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.deactivate(id).await
    }
}
