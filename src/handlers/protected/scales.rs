//! Weekly scales (rosters) and their assignments.
//!
//! Members only ever see PUBLISHED scales; a draft looks like a missing one.
//! Publication notifies the assignees once the write has committed.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension,
};
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::models::scale::{
    Assignment, Scale, ScaleAssignment, ScaleCreate, ScaleDetail, ScaleStatus, ScaleUpdate,
};
use crate::database::query_builder::QueryBuilder;
use crate::database::{DatabaseError, Repository};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{parse_body, parse_id, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::notify::{fan_out, NotificationBatch};
use crate::state::AppState;
use crate::validation::Validator;

use super::utils::IdQuery;

const SCALES_TABLE: &str = "scales";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleQuery {
    pub group_id: Option<Uuid>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn scales(pool: &PgPool) -> Repository<Scale> {
    Repository::new(SCALES_TABLE, pool.clone())
}

fn scale_not_found() -> ApiError {
    ApiError::not_found("Scale not found")
}

fn visible_to(scale: &Scale, auth: &AuthUser) -> bool {
    auth.is_admin() || scale.is_published()
}

/// Assignments for several scales in one round trip, keyed by scale id.
async fn load_assignments(pool: &PgPool, scale_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Assignment>>, DatabaseError> {
    #[derive(sqlx::FromRow)]
    struct Row {
        scale_id: Uuid,
        user_id: Uuid,
        name: String,
        viewed_at: Option<chrono::DateTime<chrono::Utc>>,
    }

    let rows: Vec<Row> = sqlx::query_as(
        "SELECT sa.scale_id, sa.user_id, u.name, sa.viewed_at \
         FROM scale_assignments sa JOIN users u ON u.id = sa.user_id \
         WHERE sa.scale_id = ANY($1) ORDER BY u.name",
    )
    .bind(scale_ids)
    .fetch_all(pool)
    .await?;

    let mut by_scale: HashMap<Uuid, Vec<Assignment>> = HashMap::new();
    for row in rows {
        by_scale.entry(row.scale_id).or_default().push(Assignment {
            user_id: row.user_id,
            name: row.name,
            viewed_at: row.viewed_at,
        });
    }
    Ok(by_scale)
}

async fn with_assignments(pool: &PgPool, list: Vec<Scale>) -> Result<Vec<ScaleDetail>, DatabaseError> {
    let ids: Vec<Uuid> = list.iter().map(|s| s.id).collect();
    let mut assignments = load_assignments(pool, &ids).await?;
    Ok(list
        .into_iter()
        .map(|scale| ScaleDetail {
            assignments: assignments.remove(&scale.id).unwrap_or_default(),
            scale,
        })
        .collect())
}

async fn detail(pool: &PgPool, scale: Scale) -> Result<ScaleDetail, DatabaseError> {
    let mut list = with_assignments(pool, vec![scale]).await?;
    list.pop()
        .ok_or_else(|| DatabaseError::NotFound("Scale not found".to_string()))
}

/// Insert assignments, returning the users that were not already assigned.
async fn assign(conn: &mut PgConnection, scale_id: Uuid, user_ids: &[Uuid]) -> Result<Vec<Uuid>, DatabaseError> {
    if user_ids.is_empty() {
        return Ok(vec![]);
    }
    let added: Vec<Uuid> = sqlx::query_scalar(
        "INSERT INTO scale_assignments (scale_id, user_id) \
         SELECT $1, UNNEST($2::uuid[]) \
         ON CONFLICT (scale_id, user_id) DO NOTHING \
         RETURNING user_id",
    )
    .bind(scale_id)
    .bind(user_ids)
    .fetch_all(conn)
    .await?;
    Ok(added)
}

/// Drop assignments not in `keep`; retained rows keep their `viewed_at`.
async fn unassign_others(conn: &mut PgConnection, scale_id: Uuid, keep: &[Uuid]) -> Result<u64, DatabaseError> {
    let result = sqlx::query("DELETE FROM scale_assignments WHERE scale_id = $1 AND NOT (user_id = ANY($2))")
        .bind(scale_id)
        .bind(keep)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// GET /scales?groupId&status
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<ScaleQuery>,
) -> ApiResult<Vec<ScaleDetail>> {
    let mut v = Validator::new();
    let status = query
        .status
        .as_deref()
        .and_then(|s| v.parse_enum::<ScaleStatus>("status", s));
    v.finish()?;

    let window = super::utils::ListQuery {
        limit: query.limit,
        offset: query.offset,
    };
    let (limit, offset) = window.window(&state.config.api)?;

    let mut filter = FilterData::new()
        .eq_some("group_id", query.group_id)
        .eq_some("status", status);
    if !auth.is_admin() {
        filter = filter.eq("status", ScaleStatus::Published);
    }

    let rows = scales(&state.pool)
        .select_any(filter.order("week_start desc").page(limit, offset))
        .await?;
    Ok(ApiResponse::success(with_assignments(&state.pool, rows).await?))
}

/// GET /scales/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<ScaleDetail> {
    let id = parse_id(&id)?;
    let scale = scales(&state.pool)
        .select_id(id)
        .await?
        .filter(|s| visible_to(s, &auth))
        .ok_or_else(scale_not_found)?;

    Ok(ApiResponse::success(detail(&state.pool, scale).await?))
}

/// POST /createScale (admin)
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    body: Bytes,
) -> ApiResult<ScaleDetail> {
    auth.require_admin()?;
    let payload: ScaleCreate = parse_body(&body)?;
    let new_scale = payload.validate(auth.user_id)?;

    let repo = scales(&state.pool);
    let mut tx = state.pool.begin().await.map_err(DatabaseError::from)?;
    let scale = repo.insert_in(&mut tx, new_scale.changes).await?;
    assign(&mut tx, scale.id, &new_scale.member_ids).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    tracing::info!("Scale {} ({}) created by {}", scale.id, scale.status, auth.user_id);
    if new_scale.status == ScaleStatus::Published {
        let batch = NotificationBatch::scale_published(&scale).to(new_scale.member_ids, auth.user_id);
        fan_out(state.notifier.as_ref(), batch).await;
    }

    Ok(ApiResponse::created(detail(&state.pool, scale).await?))
}

/// PUT /updateScale?id= (admin)
///
/// DRAFT to PUBLISHED notifies every assignee. Adding members to an already
/// published scale notifies only the newcomers.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<IdQuery>,
    body: Bytes,
) -> ApiResult<ScaleDetail> {
    auth.require_admin()?;
    let id = query.require()?;
    let payload: ScaleUpdate = parse_body(&body)?;
    let patch = payload.validate()?;

    let repo = scales(&state.pool);
    let mut tx = state.pool.begin().await.map_err(DatabaseError::from)?;

    let current = QueryBuilder::<Scale>::new(SCALES_TABLE)?
        .filter(FilterData::new().eq("id", id))?
        .select_optional(&mut *tx)
        .await?
        .ok_or_else(scale_not_found)?;

    let scale = repo
        .update_id_in(&mut tx, id, patch.changes)
        .await?
        .ok_or_else(scale_not_found)?;

    let added = match &patch.member_ids {
        Some(member_ids) => {
            unassign_others(&mut tx, id, member_ids).await?;
            assign(&mut tx, id, member_ids).await?
        }
        None => vec![],
    };
    tx.commit().await.map_err(DatabaseError::from)?;

    let updated = detail(&state.pool, scale).await?;

    let batch = if !current.is_published() && updated.scale.is_published() {
        let everyone = updated.assignments.iter().map(|a| a.user_id);
        Some(NotificationBatch::scale_published(&updated.scale).to(everyone, auth.user_id))
    } else if current.is_published() && updated.scale.is_published() && !added.is_empty() {
        Some(NotificationBatch::scale_assigned(&updated.scale).to(added, auth.user_id))
    } else {
        None
    };
    if let Some(batch) = batch {
        fan_out(state.notifier.as_ref(), batch).await;
    }

    Ok(ApiResponse::success(updated))
}

/// DELETE /scales/:id (admin)
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    auth.require_admin()?;
    let id = parse_id(&id)?;

    if scales(&state.pool).delete_id(id).await? {
        tracing::info!("Scale {} deleted by {}", id, auth.user_id);
    }
    Ok(ApiResponse::no_content())
}

/// POST /scales/:id/viewed - the caller marks their own assignment as seen
pub async fn mark_viewed(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<ScaleAssignment> {
    let id = parse_id(&id)?;
    scales(&state.pool)
        .select_id(id)
        .await?
        .filter(|s| visible_to(s, &auth))
        .ok_or_else(scale_not_found)?;

    let assignment: ScaleAssignment = sqlx::query_as(
        "UPDATE scale_assignments SET viewed_at = COALESCE(viewed_at, NOW()) \
         WHERE scale_id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(auth.user_id)
    .fetch_optional(&state.pool)
    .await
    .map_err(DatabaseError::from)?
    .ok_or_else(|| ApiError::not_found("You are not assigned to this scale"))?;

    Ok(ApiResponse::success(assignment))
}
