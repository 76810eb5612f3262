//! User handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use uuid::Uuid;

use crate::api::extractors::ValidatedJson;
use crate::api::schemas::{UserCreate, UserRead, UserUpdate};
use crate::api::AppState;
use crate::errors::{AppResult, ErrorResponse};

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

/// List all users
#[utoipa::path(
    get,
    path = "/users/",
    tag = "Users",
    responses(
        (status = 200, description = "List of all users", body = Vec<UserRead>)
    )
)]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserRead>>> {
    let users = state.user_service.get_all_users().await?;
    Ok(Json(users.into_iter().map(UserRead::from).collect()))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserRead),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserRead>> {
    let user = state.user_service.get_user(id).await?;
    Ok(Json(UserRead::from(user)))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/users/",
    tag = "Users",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created successfully", body = UserRead),
        (status = 409, description = "Email already in use", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<UserCreate>,
) -> AppResult<(StatusCode, Json<UserRead>)> {
    let user = state.user_service.create_user(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(UserRead::from(user))))
}

/// Partially update a user
#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "User updated successfully", body = UserRead),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already in use by another user", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UserUpdate>,
) -> AppResult<Json<UserRead>> {
    let user = state
        .user_service
        .update_user(id, payload.into_changes())
        .await?;
    Ok(Json(UserRead::from(user)))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.user_service.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
