use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::changes::ChangeSet;
use crate::resource::Resource;
use crate::validation::{normalize_optional, ValidationErrors, Validator};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Rehearsal {
    pub id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RehearsalCreate {
    #[serde(default)]
    pub title: String,
    pub date: Option<NaiveDate>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RehearsalUpdate {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl Resource for Rehearsal {
    type Create = RehearsalCreate;
    type Update = RehearsalUpdate;

    const TABLE: &'static str = "rehearsals";
    const NAME: &'static str = "Rehearsal";
    const ORDER: &'static str = "date asc";

    fn create_changes(payload: RehearsalCreate, actor: Uuid) -> Result<ChangeSet, ValidationErrors> {
        Validator::new()
            .required("title", &payload.title)
            .max_len("title", &payload.title, 200)
            .check(payload.date.is_some(), "date", "is required")
            .finish()?;

        Ok(ChangeSet::new()
            .set("title", payload.title.trim().to_string())
            .set("date", payload.date)
            .set("location", normalize_optional(payload.location))
            .set("notes", normalize_optional(payload.notes))
            .set("author_id", actor))
    }

    fn update_changes(payload: RehearsalUpdate, _current: &Rehearsal) -> Result<ChangeSet, ValidationErrors> {
        Validator::new()
            .required_if_present("title", payload.title.as_deref())
            .finish()?;

        Ok(ChangeSet::new()
            .set_some("title", payload.title.map(|t| t.trim().to_string()))
            .set_some("date", payload.date)
            .set_some("location", payload.location.map(|l| normalize_optional(Some(l))))
            .set_some("notes", payload.notes.map(|n| normalize_optional(Some(n)))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::value::SqlValue;

    #[test]
    fn date_is_a_calendar_day() {
        let payload: RehearsalCreate = serde_json::from_value(serde_json::json!({
            "title": "Sunday run-through",
            "date": "2024-06-01"
        }))
        .unwrap();
        let changes = Rehearsal::create_changes(payload, Uuid::new_v4()).unwrap();
        assert_eq!(
            changes.get("date"),
            Some(&SqlValue::from(NaiveDate::from_ymd_opt(2024, 6, 1)))
        );
    }

    #[test]
    fn timestamps_are_not_dates() {
        let result = serde_json::from_value::<RehearsalCreate>(serde_json::json!({
            "title": "Sunday run-through",
            "date": "2024-06-01T19:00:00Z"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn create_requires_title_and_date() {
        let payload: RehearsalCreate = serde_json::from_value(serde_json::json!({})).unwrap();
        let errors = Rehearsal::create_changes(payload, Uuid::new_v4()).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["title", "date"]);
    }
}
