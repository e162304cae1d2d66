//! Book catalog service

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, CreateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get all books
    pub async fn find_all(&self) -> AppResult<Vec<Book>> {
        self.repository.books.get_all().await
    }

    /// Get a book by ID
    pub async fn find_by_id(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new book, AVAILABLE by default
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let created = self.repository.books.create(book).await?;
        tracing::info!(book_id = created.id, title = %created.title, "Book created");
        Ok(created)
    }

    /// Delete a book by ID
    pub async fn delete_by_id(&self, id: i32) -> AppResult<()> {
        let deleted = self.repository.books.delete_by_id(id).await?;
        if deleted == 0 {
            return Err(AppError::Internal(format!(
                "Failed to delete book with id {}",
                id
            )));
        }
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    /// Search books by title keyword
    pub async fn search(&self, keyword: &str) -> AppResult<Vec<Book>> {
        self.repository.books.search(keyword).await
    }

    /// Get the most borrowed books
    pub async fn find_popular(&self) -> AppResult<Vec<Book>> {
        self.repository.books.get_popular(10).await
    }
}
