use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension,
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::models::attendance::{AttendanceRecord, SetAttendance};
use crate::database::models::rehearsal::Rehearsal;
use crate::database::{DatabaseError, Repository};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{parse_body, parse_id, ApiResponse, ApiResult, AuthUser};
use crate::resource::Resource;
use crate::state::AppState;

const ATTENDANCE_TABLE: &str = "attendance_records";
const ATTENDANCE_KEY: &[&str] = &["rehearsal_id", "user_id"];

fn records(pool: &PgPool) -> Repository<AttendanceRecord> {
    Repository::new(ATTENDANCE_TABLE, pool.clone())
}

async fn ensure_rehearsal(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
    Repository::<Rehearsal>::new(Rehearsal::TABLE, pool.clone())
        .select_id(id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found("Rehearsal not found"))
}

async fn list_for(pool: &PgPool, rehearsal_id: Uuid) -> Result<Vec<AttendanceRecord>, DatabaseError> {
    records(pool)
        .select_any(
            FilterData::new()
                .eq("rehearsal_id", rehearsal_id)
                .order("created_at asc"),
        )
        .await
}

/// POST /setAttendance (admin)
///
/// The whole batch is validated first; then every record is upserted on
/// (rehearsal, user) inside one transaction, so resubmitting overwrites.
pub async fn set_attendance(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    body: Bytes,
) -> ApiResult<Vec<AttendanceRecord>> {
    auth.require_admin()?;
    let payload: SetAttendance = parse_body(&body)?;
    let batch = payload.validate()?;

    ensure_rehearsal(&state.pool, batch.rehearsal_id).await?;

    let repo = records(&state.pool);
    let mut tx = state.pool.begin().await.map_err(DatabaseError::from)?;
    for entry in batch.entries {
        repo.upsert_in(&mut tx, entry.into_changes(batch.rehearsal_id, auth.user_id), ATTENDANCE_KEY)
            .await?;
    }
    tx.commit().await.map_err(DatabaseError::from)?;

    tracing::info!("Attendance recorded for rehearsal {} by {}", batch.rehearsal_id, auth.user_id);
    let rows = list_for(&state.pool, batch.rehearsal_id).await?;
    Ok(ApiResponse::success(rows))
}

/// GET /rehearsals/:id/attendance
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(_auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Vec<AttendanceRecord>> {
    let id = parse_id(&id)?;
    ensure_rehearsal(&state.pool, id).await?;

    let rows = list_for(&state.pool, id).await?;
    Ok(ApiResponse::success(rows))
}
