use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension,
};
use std::sync::Arc;

use crate::auth::hash_password;
use crate::database::models::user::{User, UserCreate, UserUpdate};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{parse_body, parse_id, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

use super::utils::ListQuery;

fn users(state: &AppState) -> Repository<User> {
    Repository::new(User::TABLE, state.pool.clone())
}

fn user_not_found() -> ApiError {
    ApiError::not_found("User not found")
}

/// GET /me
pub async fn me_get(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<User> {
    let user = users(&state)
        .select_id(auth.user_id)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(ApiResponse::success(user))
}

/// GET /users (admin)
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Vec<User>> {
    auth.require_admin()?;
    let (limit, offset) = query.window(&state.config.api)?;

    let rows = users(&state)
        .select_any(FilterData::new().order("name asc").page(limit, offset))
        .await?;
    Ok(ApiResponse::success(rows))
}

/// GET /users/:id (self or admin)
pub async fn get(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<User> {
    let id = parse_id(&id)?;
    auth.require_self_or_admin(id)?;

    let user = users(&state).select_id(id).await?.ok_or_else(user_not_found)?;
    Ok(ApiResponse::success(user))
}

/// POST /users (admin)
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    body: Bytes,
) -> ApiResult<User> {
    auth.require_admin()?;
    let mut payload: UserCreate = parse_body(&body)?;
    let role = payload.validate()?;

    let password = std::mem::take(&mut payload.password);
    let password_hash = hash_password(password, state.config.security.bcrypt_cost).await?;

    let user = users(&state).insert(payload.into_changes(role, password_hash)).await?;
    tracing::info!("User {} ({}) created by {}", user.id, user.role, auth.user_id);
    Ok(ApiResponse::created(user))
}

/// PUT /users/:id (admin)
pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<User> {
    auth.require_admin()?;
    let id = parse_id(&id)?;
    let mut payload: UserUpdate = parse_body(&body)?;
    let role = payload.validate()?;

    let repo = users(&state);
    repo.select_id(id).await?.ok_or_else(user_not_found)?;

    let password_hash = match payload.password.take() {
        Some(password) => Some(hash_password(password, state.config.security.bcrypt_cost).await?),
        None => None,
    };

    let user = repo
        .update_id(id, payload.into_changes(role, password_hash))
        .await?
        .ok_or_else(user_not_found)?;
    Ok(ApiResponse::success(user))
}

/// DELETE /users/:id (admin, never one's own account)
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    auth.require_admin()?;
    let id = parse_id(&id)?;
    if id == auth.user_id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }

    if !users(&state).delete_id(id).await? {
        return Err(user_not_found());
    }
    tracing::info!("User {} deleted by {}", id, auth.user_id);
    Ok(ApiResponse::no_content())
}
