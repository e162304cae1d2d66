//! Data models for Shelfmark

pub mod book;
pub mod borrow_record;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookStatus};
pub use borrow_record::BorrowRecord;
pub use user::{Role, User};
