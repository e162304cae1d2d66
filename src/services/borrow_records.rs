//! Borrowing service

use crate::{
    error::AppResult,
    models::borrow_record::{BorrowRecord, CreateBorrowRecord},
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowRecordsService {
    repository: Repository,
}

impl BorrowRecordsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get all borrow records
    pub async fn find_all(&self) -> AppResult<Vec<BorrowRecord>> {
        self.repository.borrow_records.get_all().await
    }

    /// Get borrow records for a user
    pub async fn find_by_user_id(&self, user_id: i32) -> AppResult<Vec<BorrowRecord>> {
        self.repository.borrow_records.get_by_user_id(user_id).await
    }

    /// Get borrow records for a book
    pub async fn find_by_book_id(&self, book_id: i32) -> AppResult<Vec<BorrowRecord>> {
        self.repository.borrow_records.get_by_book_id(book_id).await
    }

    /// Borrow a book for a user.
    ///
    /// Returns false when the book exists but is not AVAILABLE. The borrowing
    /// user must exist; the referenced book must exist.
    pub async fn create(&self, record: &CreateBorrowRecord) -> AppResult<bool> {
        // Surfaces a missing user as 404 instead of a foreign key violation
        self.repository.users.get_by_id(record.user_id).await?;

        let borrowed = self.repository.borrow_records.create_if_available(record).await?;
        if borrowed {
            tracing::info!(
                user_id = record.user_id,
                book_id = record.book_id,
                "Book borrowed"
            );
        }
        Ok(borrowed)
    }

    /// Return a borrowed book and close its borrow record
    pub async fn return_book(&self, borrow_record_id: i32, book_id: i32) -> AppResult<()> {
        self.repository
            .borrow_records
            .return_record(borrow_record_id, book_id)
            .await?;
        tracing::info!(borrow_record_id, book_id, "Book returned");
        Ok(())
    }
}
