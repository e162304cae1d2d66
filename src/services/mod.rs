//! Business logic services

pub mod books;
pub mod borrow_records;
pub mod users;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub borrow_records: borrow_records::BorrowRecordsService,
    pub users: users::UsersService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            books: books::BooksService::new(repository.clone()),
            borrow_records: borrow_records::BorrowRecordsService::new(repository.clone()),
            users: users::UsersService::new(repository, auth_config),
        }
    }
}
