use axum::{extract::State, Extension};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::database::models::notification::{Notification, NotificationList};
use crate::database::{DatabaseError, Repository};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

use super::utils::IdQuery;

const NOTIFICATIONS_TABLE: &str = "notifications";
const NOTIFICATION_LIMIT: i64 = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
pub struct MarkAllResult {
    pub updated: u64,
}

fn own(auth: &AuthUser) -> FilterData {
    FilterData::new().eq("user_id", auth.user_id)
}

/// GET /getNotifications?unreadOnly
pub async fn get_notifications(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<NotificationQuery>,
) -> ApiResult<NotificationList> {
    let repo = Repository::<Notification>::new(NOTIFICATIONS_TABLE, state.pool.clone());

    let mut filter = own(&auth);
    if query.unread_only {
        filter = filter.is_null("read_at");
    }
    let notifications = repo
        .select_any(filter.order("created_at desc").page(NOTIFICATION_LIMIT, 0))
        .await?;
    let unread_count = repo
        .count(own(&auth).is_null("read_at"))
        .await?;

    Ok(ApiResponse::success(NotificationList {
        notifications,
        unread_count,
    }))
}

/// POST /markNotificationRead?id=
///
/// Another user's notification is reported as missing.
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<Notification> {
    let id = query.require()?;

    let notification: Notification = sqlx::query_as(
        "UPDATE notifications SET read_at = COALESCE(read_at, NOW()) \
         WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(auth.user_id)
    .fetch_optional(&state.pool)
    .await
    .map_err(DatabaseError::from)?
    .ok_or_else(|| ApiError::not_found("Notification not found"))?;

    Ok(ApiResponse::success(notification))
}

/// POST /markAllNotificationsRead
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<MarkAllResult> {
    let updated = sqlx::query("UPDATE notifications SET read_at = NOW() WHERE user_id = $1 AND read_at IS NULL")
        .bind(auth.user_id)
        .execute(&state.pool)
        .await
        .map_err(DatabaseError::from)?
        .rows_affected();

    tracing::debug!("{} notification(s) marked read for {}", updated, auth.user_id);
    Ok(ApiResponse::success(MarkAllResult { updated }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unread_only_defaults_to_false() {
        let query: NotificationQuery = serde_json::from_str("{}").unwrap();
        assert!(!query.unread_only);
        let query: NotificationQuery = serde_json::from_str(r#"{"unreadOnly":true}"#).unwrap();
        assert!(query.unread_only);
    }
}
