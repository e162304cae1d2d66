//! Book catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, CreateBook},
    models::user::Permission,
};

use super::{check_positive, AuthenticatedUser};

/// Book search query
#[derive(Deserialize)]
pub struct SearchQuery {
    pub keyword: Option<String>,
}

/// List all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "List of books", body = Vec<Book>)
    )
)]
pub async fn list_books(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.find_all().await?;
    Ok(Json(books))
}

/// Get a book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 400, description = "Invalid book ID"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    check_positive(id, "Book id")?;

    let book = state.services.books.find_by_id(id).await?;
    Ok(Json(book))
}

/// Search books by title keyword
#[utoipa::path(
    get,
    path = "/books/search",
    tag = "books",
    params(
        ("keyword" = String, Query, description = "Title keyword")
    ),
    responses(
        (status = 200, description = "Matching books", body = Vec<Book>),
        (status = 400, description = "Missing or blank keyword")
    )
)]
pub async fn search_books(
    State(state): State<crate::AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let keyword = query
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::Validation("Search keyword must not be blank".to_string()))?;

    let books = state.services.books.search(keyword).await?;
    Ok(Json(books))
}

/// List the most borrowed books
#[utoipa::path(
    get,
    path = "/books/popular",
    tag = "books",
    responses(
        (status = 200, description = "Most borrowed books", body = Vec<Book>)
    )
)]
pub async fn popular_books(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.find_popular().await?;
    Ok(Json(books))
}

/// Add a new book to the catalog
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 204, description = "Book created"),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not allowed to manage books")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(book): Json<CreateBook>,
) -> AppResult<StatusCode> {
    claims.require(Permission::ManageBooks)?;
    book.validate()?;

    state.services.books.create(&book).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a book from the catalog
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 400, description = "Invalid book ID"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not allowed to manage books"),
        (status = 500, description = "Book could not be deleted")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require(Permission::ManageBooks)?;
    check_positive(id, "Book id")?;

    state.services.books.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
