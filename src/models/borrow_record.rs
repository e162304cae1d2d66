//! Borrow record model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Borrow record from database: one lending transaction linking a user to a
/// book. `returned_date` is NULL while the loan is open.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowRecord {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub borrowed_date: Option<DateTime<Utc>>,
    pub returned_date: Option<DateTime<Utc>>,
}

/// Candidate borrow record (borrow request body)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBorrowRecord {
    #[validate(range(min = 1, message = "user_id must be positive"))]
    pub user_id: i32,
    #[validate(range(min = 1, message = "book_id must be positive"))]
    pub book_id: i32,
}
