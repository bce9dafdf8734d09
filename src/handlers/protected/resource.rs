//! Generic CRUD handlers for any [`Resource`].
//!
//! Permission checks run before the body is read, so a caller without write
//! access gets 403 whatever they sent.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{parse_body, parse_id, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::resource::Resource;
use crate::state::AppState;

use super::utils::ListQuery;

fn repository<R: Resource>(state: &AppState) -> Repository<R> {
    Repository::new(R::TABLE, state.pool.clone())
}

fn not_found<R: Resource>() -> ApiError {
    ApiError::not_found(format!("{} not found", R::NAME))
}

/// GET /{resource}
pub async fn list<R: Resource>(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Vec<R>> {
    auth.require(R::READ)?;
    let (limit, offset) = query.window(&state.config.api)?;

    let rows = repository::<R>(&state)
        .select_any(FilterData::new().order(R::ORDER).page(limit, offset))
        .await?;
    Ok(ApiResponse::success(rows))
}

/// GET /{resource}/:id
pub async fn get<R: Resource>(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<R> {
    auth.require(R::READ)?;
    let id = parse_id(&id)?;

    let row = repository::<R>(&state)
        .select_id(id)
        .await?
        .ok_or_else(not_found::<R>)?;
    Ok(ApiResponse::success(row))
}

/// POST /{resource}
pub async fn create<R: Resource>(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    body: Bytes,
) -> ApiResult<R> {
    auth.require(R::WRITE)?;
    let payload: R::Create = parse_body(&body)?;
    let changes = R::create_changes(payload, auth.user_id)?.set("id", Uuid::new_v4());

    let row = repository::<R>(&state).insert(changes).await?;
    tracing::info!("{} created by {}", R::NAME, auth.user_id);
    Ok(ApiResponse::created(row))
}

/// PUT /{resource}/:id
pub async fn update<R: Resource>(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<R> {
    auth.require(R::WRITE)?;
    let id = parse_id(&id)?;
    let payload: R::Update = parse_body(&body)?;

    let repo = repository::<R>(&state);
    let current = repo.select_id(id).await?.ok_or_else(not_found::<R>)?;
    let changes = R::update_changes(payload, &current)?.touch();

    let row = repo.update_id(id, changes).await?.ok_or_else(not_found::<R>)?;
    Ok(ApiResponse::success(row))
}

/// DELETE /{resource}/:id. Deleting an absent row still succeeds.
pub async fn delete<R: Resource>(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    auth.require(R::WRITE)?;
    let id = parse_id(&id)?;

    if repository::<R>(&state).delete_id(id).await? {
        tracing::info!("{} {} deleted by {}", R::NAME, id, auth.user_id);
    }
    Ok(ApiResponse::no_content())
}
