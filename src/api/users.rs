//! User management endpoints

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::{error::AppResult, models::user::{CreateUser, User}};

/// Register a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User registered", body = User),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Name or email already registered")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(user): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    user.validate()?;

    let created = state.services.users.register(&user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
