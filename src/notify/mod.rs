//! Notification fan-out.
//!
//! Some mutations (group items, scale publication) notify the affected
//! members. Delivery happens after the triggering write has committed and is
//! fire-and-forget: a failed delivery is logged and never reaches the caller.

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::database::models::group::{Group, GroupItem};
use crate::database::models::scale::Scale;
use crate::database::DatabaseError;

pub const KIND_GROUP_ITEM: &str = "GROUP_ITEM";
pub const KIND_SCALE_PUBLISHED: &str = "SCALE_PUBLISHED";
pub const KIND_SCALE_ASSIGNED: &str = "SCALE_ASSIGNED";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Notification sink error: {0}")]
    Sink(String),
}

impl From<sqlx::Error> for NotifyError {
    fn from(err: sqlx::Error) -> Self {
        NotifyError::Database(err.into())
    }
}

/// One message addressed to a set of users; each recipient gets one row.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationBatch {
    pub recipients: Vec<Uuid>,
    pub kind: &'static str,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}

impl NotificationBatch {
    pub fn new(kind: &'static str, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            recipients: vec![],
            kind,
            title: title.into(),
            message: message.into(),
            link: None,
        }
    }

    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn to(mut self, candidates: impl IntoIterator<Item = Uuid>, actor: Uuid) -> Self {
        self.recipients = recipients(candidates, actor);
        self
    }

    /// A new item was shared with a group.
    pub fn group_item(group: &Group, item: &GroupItem) -> Self {
        Self::new(
            KIND_GROUP_ITEM,
            format!("New item in {}", group.name),
            format!("{} was added to {}", item.title, group.name),
        )
        .link(format!("/groups/{}", group.id))
    }

    /// A scale became visible to its assignees.
    pub fn scale_published(scale: &Scale) -> Self {
        Self::new(
            KIND_SCALE_PUBLISHED,
            "New scale published",
            format!("You are on the scale for the week of {}", scale.week_start),
        )
        .link(format!("/scales/{}", scale.id))
    }

    /// Members were added to a scale that was already published.
    pub fn scale_assigned(scale: &Scale) -> Self {
        Self::new(
            KIND_SCALE_ASSIGNED,
            "You were added to a scale",
            format!("You are on the scale for the week of {}", scale.week_start),
        )
        .link(format!("/scales/{}", scale.id))
    }
}

/// De-duplicated recipients in first-seen order, never including the actor.
pub fn recipients(candidates: impl IntoIterator<Item = Uuid>, actor: Uuid) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|id| *id != actor && seen.insert(*id))
        .collect()
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &'static str;

    /// Persist one notification per recipient, returning how many were written.
    async fn deliver(&self, batch: &NotificationBatch) -> Result<usize, NotifyError>;
}

/// Writes notification rows into the `notifications` table.
pub struct PgNotificationSink {
    pool: PgPool,
}

impl PgNotificationSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for PgNotificationSink {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn deliver(&self, batch: &NotificationBatch) -> Result<usize, NotifyError> {
        if batch.recipients.is_empty() {
            return Ok(0);
        }
        let ids: Vec<Uuid> = batch.recipients.iter().map(|_| Uuid::new_v4()).collect();

        let result = sqlx::query(
            "INSERT INTO notifications (id, user_id, kind, title, message, link) \
             SELECT ids.id, ids.user_id, $3, $4, $5, $6 \
             FROM UNNEST($1::uuid[], $2::uuid[]) AS ids(id, user_id)",
        )
        .bind(&ids)
        .bind(&batch.recipients)
        .bind(batch.kind)
        .bind(&batch.title)
        .bind(&batch.message)
        .bind(&batch.link)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() as usize)
    }
}

/// Deliver a batch, logging and swallowing any failure.
pub async fn fan_out(sink: &dyn NotificationSink, batch: NotificationBatch) {
    if batch.recipients.is_empty() {
        debug!("No recipients for {} notification", batch.kind);
        return;
    }

    match sink.deliver(&batch).await {
        Ok(written) => debug!(
            "Delivered {} {} notification(s) via {}",
            written,
            batch.kind,
            sink.name()
        ),
        Err(e) => warn!(
            "Failed to deliver {} notification to {} recipient(s) via {}: {}",
            batch.kind,
            batch.recipients.len(),
            sink.name(),
            e
        ),
    }
}
