//! Borrow records repository for database operations
//!
//! Borrow and return each run inside a single database transaction so the
//! book status and the borrow record never diverge.

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookStatus,
        borrow_record::{BorrowRecord, CreateBorrowRecord},
    },
};

#[derive(Clone)]
pub struct BorrowRecordsRepository {
    pool: Pool<Postgres>,
}

impl BorrowRecordsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get all borrow records
    pub async fn get_all(&self) -> AppResult<Vec<BorrowRecord>> {
        let records =
            sqlx::query_as::<_, BorrowRecord>("SELECT * FROM borrow_records ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(records)
    }

    /// Get borrow records for a user
    pub async fn get_by_user_id(&self, user_id: i32) -> AppResult<Vec<BorrowRecord>> {
        let records = sqlx::query_as::<_, BorrowRecord>(
            "SELECT * FROM borrow_records WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Get borrow records for a book
    pub async fn get_by_book_id(&self, book_id: i32) -> AppResult<Vec<BorrowRecord>> {
        let records = sqlx::query_as::<_, BorrowRecord>(
            "SELECT * FROM borrow_records WHERE book_id = $1 ORDER BY id",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Borrow a book if it is currently AVAILABLE.
    ///
    /// Returns false, with no side effects, when the book is not available.
    /// The status flip carries an AVAILABLE guard and the affected-row count
    /// decides the outcome, so two concurrent borrows of the same book cannot
    /// both succeed.
    pub async fn create_if_available(&self, record: &CreateBorrowRecord) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let status = sqlx::query_scalar::<_, BookStatus>("SELECT status FROM books WHERE id = $1")
            .bind(record.book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Book with id {} not found", record.book_id))
            })?;

        if status != BookStatus::Available {
            return Ok(false);
        }

        // Compare-and-swap: zero rows means a concurrent borrow won the race.
        let updated = sqlx::query("UPDATE books SET status = $1 WHERE id = $2 AND status = $3")
            .bind(BookStatus::Borrowed)
            .bind(record.book_id)
            .bind(BookStatus::Available)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if updated == 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO borrow_records (user_id, book_id, borrowed_date) VALUES ($1, $2, $3)",
        )
        .bind(record.user_id)
        .bind(record.book_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Close a borrow record and mark its book AVAILABLE again.
    ///
    /// The record must reference the given book and still be open; the row
    /// lock serializes concurrent returns of the same record.
    pub async fn return_record(&self, borrow_record_id: i32, book_id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, BorrowRecord>(
            "SELECT * FROM borrow_records WHERE id = $1 FOR UPDATE",
        )
        .bind(borrow_record_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Borrow record with id {} not found",
                borrow_record_id
            ))
        })?;

        if record.book_id != book_id {
            return Err(AppError::Validation(format!(
                "Borrow record {} does not reference book {}",
                borrow_record_id, book_id
            )));
        }

        if record.returned_date.is_some() {
            return Err(AppError::Conflict(format!(
                "Borrow record {} has already been returned",
                borrow_record_id
            )));
        }

        sqlx::query("UPDATE borrow_records SET returned_date = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(borrow_record_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE books SET status = $1 WHERE id = $2")
            .bind(BookStatus::Available)
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
