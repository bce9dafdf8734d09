use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::changes::ChangeSet;
use crate::resource::Resource;
use crate::validation::{normalize_optional, ValidationErrors, Validator};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCreate {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

fn check_window(v: &mut Validator, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) {
    if let (Some(start), Some(end)) = (start, end) {
        v.check(end > start, "endTime", "must be after startTime");
    }
}

impl Resource for Event {
    type Create = EventCreate;
    type Update = EventUpdate;

    const TABLE: &'static str = "events";
    const NAME: &'static str = "Event";
    const ORDER: &'static str = "start_time asc";

    fn create_changes(payload: EventCreate, actor: Uuid) -> Result<ChangeSet, ValidationErrors> {
        let mut v = Validator::new();
        v.required("title", &payload.title)
            .max_len("title", &payload.title, 200)
            .check(payload.start_time.is_some(), "startTime", "is required")
            .check(payload.end_time.is_some(), "endTime", "is required");
        check_window(&mut v, payload.start_time, payload.end_time);
        v.finish()?;

        Ok(ChangeSet::new()
            .set("title", payload.title.trim().to_string())
            .set("description", normalize_optional(payload.description))
            .set("start_time", payload.start_time)
            .set("end_time", payload.end_time)
            .set("location", normalize_optional(payload.location))
            .set("author_id", actor))
    }

    fn update_changes(payload: EventUpdate, current: &Event) -> Result<ChangeSet, ValidationErrors> {
        let mut v = Validator::new();
        v.required_if_present("title", payload.title.as_deref());
        check_window(
            &mut v,
            Some(payload.start_time.unwrap_or(current.start_time)),
            Some(payload.end_time.unwrap_or(current.end_time)),
        );
        v.finish()?;

        Ok(ChangeSet::new()
            .set_some("title", payload.title.map(|t| t.trim().to_string()))
            .set_some("description", payload.description.map(|d| normalize_optional(Some(d))))
            .set_some("start_time", payload.start_time)
            .set_some("end_time", payload.end_time)
            .set_some("location", payload.location.map(|l| normalize_optional(Some(l)))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn existing() -> Event {
        let start = Utc::now();
        Event {
            id: Uuid::new_v4(),
            title: "Youth night".to_string(),
            description: None,
            start_time: start,
            end_time: start + Duration::hours(2),
            location: None,
            author_id: None,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn end_must_follow_start() {
        let now = Utc::now();
        let payload = EventCreate {
            title: "Vigil".to_string(),
            description: None,
            start_time: Some(now),
            end_time: Some(now),
            location: None,
        };
        let errors = Event::create_changes(payload, Uuid::new_v4()).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["endTime"]);
    }

    #[test]
    fn missing_times_are_reported() {
        let payload = EventCreate {
            title: "".to_string(),
            description: None,
            start_time: None,
            end_time: None,
            location: None,
        };
        let errors = Event::create_changes(payload, Uuid::new_v4()).unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["title", "startTime", "endTime"]
        );
    }

    #[test]
    fn update_checks_merged_window() {
        let current = existing();
        let payload = EventUpdate {
            end_time: Some(current.start_time - Duration::minutes(1)),
            ..Default::default()
        };
        assert!(Event::update_changes(payload, &current).is_err());

        let payload = EventUpdate {
            start_time: Some(current.start_time + Duration::minutes(30)),
            ..Default::default()
        };
        let changes = Event::update_changes(payload, &current).unwrap();
        assert_eq!(changes.columns().collect::<Vec<_>>(), vec!["start_time"]);
    }
}
