use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::text_enum;
use crate::database::changes::ChangeSet;
use crate::resource::Resource;
use crate::validation::{normalize_optional, ValidationErrors, Validator};

text_enum!(Frequency {
    Daily => "DAILY",
    Weekly => "WEEKLY",
    Monthly => "MONTHLY",
    Once => "ONCE",
});

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub frequency: Option<String>,
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ObservationCreate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub category: Option<String>,
    pub frequency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ObservationUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub frequency: Option<String>,
}

/// Blank clears the frequency; anything else must be a known value.
fn parse_frequency(v: &mut Validator, raw: Option<String>) -> Option<Frequency> {
    normalize_optional(raw).and_then(|f| v.parse_enum::<Frequency>("frequency", &f))
}

impl Resource for Observation {
    type Create = ObservationCreate;
    type Update = ObservationUpdate;

    const TABLE: &'static str = "observations";
    const NAME: &'static str = "Observation";

    fn create_changes(payload: ObservationCreate, actor: Uuid) -> Result<ChangeSet, ValidationErrors> {
        let mut v = Validator::new();
        v.required("title", &payload.title)
            .max_len("title", &payload.title, 200)
            .required("content", &payload.content);
        let frequency = parse_frequency(&mut v, payload.frequency);
        v.finish()?;

        Ok(ChangeSet::new()
            .set("title", payload.title.trim().to_string())
            .set("content", payload.content)
            .set("category", normalize_optional(payload.category))
            .set("frequency", frequency)
            .set("author_id", actor))
    }

    fn update_changes(payload: ObservationUpdate, _current: &Observation) -> Result<ChangeSet, ValidationErrors> {
        let mut v = Validator::new();
        v.required_if_present("title", payload.title.as_deref())
            .required_if_present("content", payload.content.as_deref());
        let frequency = payload
            .frequency
            .map(|f| parse_frequency(&mut v, Some(f)));
        v.finish()?;

        Ok(ChangeSet::new()
            .set_some("title", payload.title.map(|t| t.trim().to_string()))
            .set_some("content", payload.content)
            .set_some("category", payload.category.map(|c| normalize_optional(Some(c))))
            .set_some("frequency", frequency))
    }
}
