use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::text_enum;
use crate::database::changes::ChangeSet;
use crate::resource::Resource;
use crate::validation::{normalize_optional, ValidationErrors, Validator};

text_enum!(ItemKind {
    Link => "LINK",
    File => "FILE",
});

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct GroupCreate {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GroupUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Resource for Group {
    type Create = GroupCreate;
    type Update = GroupUpdate;

    const TABLE: &'static str = "groups";
    const NAME: &'static str = "Group";
    const ORDER: &'static str = "name asc";

    fn create_changes(payload: GroupCreate, actor: Uuid) -> Result<ChangeSet, ValidationErrors> {
        Validator::new()
            .required("name", &payload.name)
            .max_len("name", &payload.name, 120)
            .finish()?;

        Ok(ChangeSet::new()
            .set("name", payload.name.trim().to_string())
            .set("description", normalize_optional(payload.description))
            .set("created_by", actor))
    }

    fn update_changes(payload: GroupUpdate, _current: &Group) -> Result<ChangeSet, ValidationErrors> {
        Validator::new()
            .required_if_present("name", payload.name.as_deref())
            .finish()?;

        Ok(ChangeSet::new()
            .set_some("name", payload.name.map(|n| n.trim().to_string()))
            .set_some("description", payload.description.map(|d| normalize_optional(Some(d)))))
    }
}

/// A membership joined with the member's profile.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMembers {
    #[serde(default)]
    pub user_ids: Vec<Uuid>,
}

impl AddMembers {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .check(!self.user_ids.is_empty(), "userIds", "must contain at least one user")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GroupItem {
    pub id: Uuid,
    pub group_id: Uuid,
    pub title: String,
    #[sqlx(try_from = "String")]
    pub kind: ItemKind,
    pub url: String,
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct GroupItemCreate {
    #[serde(default)]
    pub title: String,
    pub kind: Option<String>,
    #[serde(default)]
    pub url: String,
}

impl GroupItemCreate {
    pub fn into_changes(self, group_id: Uuid, actor: Uuid) -> Result<ChangeSet, ValidationErrors> {
        let mut v = Validator::new();
        v.required("title", &self.title)
            .max_len("title", &self.title, 200)
            .required("url", &self.url);
        let kind = match self.kind.as_deref() {
            Some(k) => v.parse_enum::<ItemKind>("kind", k),
            None => Some(ItemKind::Link),
        };
        v.finish()?;

        Ok(ChangeSet::new()
            .set("id", Uuid::new_v4())
            .set("group_id", group_id)
            .set("title", self.title.trim().to_string())
            .set("kind", kind)
            .set("url", self.url.trim().to_string())
            .set("author_id", actor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::value::SqlValue;

    #[test]
    fn item_kind_defaults_to_link() {
        let payload = GroupItemCreate {
            title: "Setlist".to_string(),
            kind: None,
            url: "https://example.org/setlist".to_string(),
        };
        let changes = payload.into_changes(Uuid::new_v4(), Uuid::new_v4()).unwrap();
        assert_eq!(changes.get("kind"), Some(&SqlValue::from("LINK")));
    }

    #[test]
    fn item_requires_title_and_url() {
        let payload = GroupItemCreate {
            title: " ".to_string(),
            kind: Some("VIDEO".to_string()),
            url: "".to_string(),
        };
        let errors = payload.into_changes(Uuid::new_v4(), Uuid::new_v4()).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["title", "url", "kind"]);
    }

    #[test]
    fn add_members_needs_ids() {
        let payload: AddMembers = serde_json::from_str("{}").unwrap();
        assert!(payload.validate().is_err());
    }
}
