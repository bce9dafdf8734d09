use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::changes::ChangeSet;
use crate::resource::Resource;
use crate::validation::{normalize_optional, ValidationErrors, Validator};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DevotionalPost {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct DevotionalCreate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DevotionalUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
}

impl Resource for DevotionalPost {
    type Create = DevotionalCreate;
    type Update = DevotionalUpdate;

    const TABLE: &'static str = "devotional_posts";
    const NAME: &'static str = "Devotional";

    fn create_changes(payload: DevotionalCreate, actor: Uuid) -> Result<ChangeSet, ValidationErrors> {
        Validator::new()
            .required("title", &payload.title)
            .max_len("title", &payload.title, 200)
            .required("content", &payload.content)
            .finish()?;

        Ok(ChangeSet::new()
            .set("title", payload.title.trim().to_string())
            .set("content", payload.content)
            .set("category", normalize_optional(payload.category))
            .set("author_id", actor))
    }

    fn update_changes(payload: DevotionalUpdate, _current: &DevotionalPost) -> Result<ChangeSet, ValidationErrors> {
        Validator::new()
            .required_if_present("title", payload.title.as_deref())
            .required_if_present("content", payload.content.as_deref())
            .finish()?;

        Ok(ChangeSet::new()
            .set_some("title", payload.title.map(|t| t.trim().to_string()))
            .set_some("content", payload.content)
            .set_some("category", payload.category.map(|c| normalize_optional(Some(c)))))
    }
}
