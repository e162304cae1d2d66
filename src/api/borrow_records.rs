//! Borrow record endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::borrow_record::{BorrowRecord, CreateBorrowRecord},
    models::user::Permission,
};

use super::{check_positive, AuthenticatedUser};

/// Identifier query for record lookups
#[derive(Deserialize)]
pub struct IdQuery {
    pub id: i32,
}

/// List all borrow records
#[utoipa::path(
    get,
    path = "/borrow_records",
    tag = "borrow_records",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All borrow records", body = Vec<BorrowRecord>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_borrow_records(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowRecord>>> {
    let records = state.services.borrow_records.find_all().await?;
    Ok(Json(records))
}

/// List borrow records for a user
#[utoipa::path(
    get,
    path = "/borrow_records/users",
    tag = "borrow_records",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Query, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's borrow records", body = Vec<BorrowRecord>),
        (status = 400, description = "Invalid user ID"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_by_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<IdQuery>,
) -> AppResult<Json<Vec<BorrowRecord>>> {
    check_positive(query.id, "User id")?;

    let records = state.services.borrow_records.find_by_user_id(query.id).await?;
    Ok(Json(records))
}

/// List borrow records for a book
#[utoipa::path(
    get,
    path = "/borrow_records/books",
    tag = "borrow_records",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Query, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book's borrow records", body = Vec<BorrowRecord>),
        (status = 400, description = "Invalid book ID"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_by_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<IdQuery>,
) -> AppResult<Json<Vec<BorrowRecord>>> {
    check_positive(query.id, "Book id")?;

    let records = state.services.borrow_records.find_by_book_id(query.id).await?;
    Ok(Json(records))
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/borrow_records",
    tag = "borrow_records",
    security(("bearer_auth" = [])),
    request_body = CreateBorrowRecord,
    responses(
        (status = 204, description = "Book borrowed"),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "User or book not found"),
        (status = 409, description = "Book is not available")
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(record): Json<CreateBorrowRecord>,
) -> AppResult<StatusCode> {
    claims.require(Permission::BorrowBooks)?;
    record.validate()?;

    let borrowed = state.services.borrow_records.create(&record).await?;
    if !borrowed {
        return Err(AppError::Unavailable(format!(
            "Book {} is not available for borrowing",
            record.book_id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Return a borrowed book
#[utoipa::path(
    put,
    path = "/borrow_records/{borrow_record_id}/books/{book_id}",
    tag = "borrow_records",
    security(("bearer_auth" = [])),
    params(
        ("borrow_record_id" = i32, Path, description = "Borrow record ID"),
        ("book_id" = i32, Path, description = "Book ID the record must reference")
    ),
    responses(
        (status = 204, description = "Book returned"),
        (status = 400, description = "Invalid IDs or record does not reference the book"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Borrow record not found"),
        (status = 409, description = "Borrow record already returned")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((borrow_record_id, book_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    claims.require(Permission::BorrowBooks)?;
    check_positive(borrow_record_id, "Borrow record id")?;
    check_positive(book_id, "Book id")?;

    state
        .services
        .borrow_records
        .return_book(borrow_record_id, book_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
