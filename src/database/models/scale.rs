use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{nullable, text_enum};
use crate::database::changes::ChangeSet;
use crate::validation::{normalize_optional, ValidationErrors, Validator};

text_enum!(ScaleStatus {
    Draft => "DRAFT",
    Published => "PUBLISHED",
});

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Scale {
    pub id: Uuid,
    pub week_start: NaiveDate,
    pub group_id: Option<Uuid>,
    #[sqlx(try_from = "String")]
    pub status: ScaleStatus,
    pub notes: Option<String>,
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Scale {
    pub fn is_published(&self) -> bool {
        self.status == ScaleStatus::Published
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ScaleAssignment {
    pub scale_id: Uuid,
    pub user_id: Uuid,
    pub viewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// An assignment joined with the member's name.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub user_id: Uuid,
    pub name: String,
    pub viewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleDetail {
    #[serde(flatten)]
    pub scale: Scale,
    pub assignments: Vec<Assignment>,
}

/// `POST /createScale`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleCreate {
    pub week_start: Option<NaiveDate>,
    #[serde(default)]
    pub assigned_member_ids: Vec<Uuid>,
    pub group_id: Option<Uuid>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// A validated create request: scale columns plus the assignee set.
#[derive(Debug)]
pub struct NewScale {
    pub changes: ChangeSet,
    pub status: ScaleStatus,
    pub member_ids: Vec<Uuid>,
}

impl ScaleCreate {
    pub fn validate(self, actor: Uuid) -> Result<NewScale, ValidationErrors> {
        let mut v = Validator::new();
        v.check(self.week_start.is_some(), "weekStart", "is required");
        let status = match self.status.as_deref() {
            Some(s) => v.parse_enum::<ScaleStatus>("status", s),
            None => Some(ScaleStatus::Draft),
        };
        v.finish()?;
        let status = status.unwrap_or(ScaleStatus::Draft);

        let changes = ChangeSet::new()
            .set("id", Uuid::new_v4())
            .set("week_start", self.week_start)
            .set("group_id", self.group_id)
            .set("status", status)
            .set("notes", normalize_optional(self.notes))
            .set("author_id", actor);

        Ok(NewScale {
            changes,
            status,
            member_ids: dedup(self.assigned_member_ids),
        })
    }
}

/// `PUT /updateScale?id=`. Any subset of the create fields.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleUpdate {
    pub week_start: Option<NaiveDate>,
    pub assigned_member_ids: Option<Vec<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub group_id: Option<Option<Uuid>>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug)]
pub struct ScalePatch {
    pub changes: ChangeSet,
    /// `Some` replaces the whole assignment set.
    pub member_ids: Option<Vec<Uuid>>,
}

impl ScaleUpdate {
    pub fn validate(self) -> Result<ScalePatch, ValidationErrors> {
        let mut v = Validator::new();
        let status = self
            .status
            .as_deref()
            .and_then(|s| v.parse_enum::<ScaleStatus>("status", s));
        v.finish()?;

        let changes = ChangeSet::new()
            .set_some("week_start", self.week_start)
            .set_some("group_id", self.group_id)
            .set_some("status", status)
            .set_some("notes", self.notes.map(|n| normalize_optional(Some(n))))
            .touch();

        Ok(ScalePatch {
            changes,
            member_ids: self.assigned_member_ids.map(dedup),
        })
    }
}

/// Remove repeated ids, keeping first-seen order.
pub fn dedup(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::value::SqlValue;

    #[test]
    fn create_defaults_to_draft_and_dedups_members() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let payload: ScaleCreate = serde_json::from_value(serde_json::json!({
            "weekStart": "2024-06-02",
            "assignedMemberIds": [a, b, a]
        }))
        .unwrap();
        let new_scale = payload.validate(Uuid::new_v4()).unwrap();
        assert_eq!(new_scale.status, ScaleStatus::Draft);
        assert_eq!(new_scale.member_ids, vec![a, b]);
        assert_eq!(new_scale.changes.get("status"), Some(&SqlValue::from("DRAFT")));
    }

    #[test]
    fn create_requires_week_start_and_known_status() {
        let payload: ScaleCreate = serde_json::from_value(serde_json::json!({
            "status": "ARCHIVED"
        }))
        .unwrap();
        let errors = payload.validate(Uuid::new_v4()).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["weekStart", "status"]);
    }

    #[test]
    fn update_distinguishes_absent_and_empty_member_list() {
        let patch = ScaleUpdate::default().validate().unwrap();
        assert!(patch.member_ids.is_none());

        let payload: ScaleUpdate = serde_json::from_value(serde_json::json!({
            "assignedMemberIds": [],
            "groupId": null
        }))
        .unwrap();
        let patch = payload.validate().unwrap();
        assert_eq!(patch.member_ids, Some(vec![]));
        assert_eq!(patch.changes.get("group_id"), Some(&SqlValue::Uuid(None)));
    }

    #[test]
    fn update_status_is_written_through_changes() {
        let payload: ScaleUpdate = serde_json::from_value(serde_json::json!({
            "status": "PUBLISHED"
        }))
        .unwrap();
        let patch = payload.validate().unwrap();
        assert_eq!(patch.changes.get("status"), Some(&SqlValue::from("PUBLISHED")));
        assert!(patch.member_ids.is_none());

        let payload: ScaleUpdate = serde_json::from_value(serde_json::json!({
            "status": "ARCHIVED"
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["status"]);
    }

    #[test]
    fn detail_flattens_scale_fields() {
        let now = Utc::now();
        let detail = ScaleDetail {
            scale: Scale {
                id: Uuid::new_v4(),
                week_start: NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
                group_id: None,
                status: ScaleStatus::Published,
                notes: None,
                author_id: None,
                created_at: now,
                updated_at: now,
            },
            assignments: vec![],
        };
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["weekStart"], "2024-06-02");
        assert_eq!(value["status"], "PUBLISHED");
        assert!(value["assignments"].as_array().unwrap().is_empty());
    }
}
