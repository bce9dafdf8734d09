use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{nullable, text_enum};
use crate::database::changes::ChangeSet;
use crate::validation::{normalize_optional, ValidationErrors, Validator};

text_enum!(Role {
    Admin => "ADMIN",
    Member => "MEMBER",
});

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub ministry_entry_date: Option<NaiveDate>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub const TABLE: &'static str = "users";

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Emails are compared case-insensitively by storing them lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `POST /register`
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required("name", &self.name)
            .max_len("name", &self.name, 120)
            .email("email", &normalize_email(&self.email))
            .password("password", &self.password)
            .finish()
    }
}

impl From<RegisterRequest> for UserCreate {
    fn from(req: RegisterRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            password: req.password,
            role: None,
            phone: None,
            birth_date: None,
            ministry_entry_date: None,
            avatar_url: None,
        }
    }
}

/// `POST /login`
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required("email", &self.email)
            .required("password", &self.password)
            .finish()
    }
}

/// `POST /users`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub ministry_entry_date: Option<NaiveDate>,
    pub avatar_url: Option<String>,
}

impl UserCreate {
    /// Validate and resolve the role (MEMBER when omitted).
    pub fn validate(&self) -> Result<Role, ValidationErrors> {
        let mut v = Validator::new();
        v.required("name", &self.name)
            .max_len("name", &self.name, 120)
            .email("email", &normalize_email(&self.email))
            .password("password", &self.password);
        let role = match self.role.as_deref() {
            Some(r) => v.parse_enum::<Role>("role", r),
            None => Some(Role::Member),
        };
        v.finish()?;
        Ok(role.unwrap_or(Role::Member))
    }

    pub fn into_changes(self, role: Role, password_hash: String) -> ChangeSet {
        ChangeSet::new()
            .set("id", Uuid::new_v4())
            .set("name", self.name.trim().to_string())
            .set("email", normalize_email(&self.email))
            .set("password_hash", password_hash)
            .set("role", role)
            .set("phone", normalize_optional(self.phone))
            .set("birth_date", self.birth_date)
            .set("ministry_entry_date", self.ministry_entry_date)
            .set("avatar_url", normalize_optional(self.avatar_url))
    }
}

/// `PUT /users/:id`. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub birth_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    pub ministry_entry_date: Option<Option<NaiveDate>>,
    pub avatar_url: Option<String>,
}

impl UserUpdate {
    /// Validate and resolve the requested role change, if any.
    pub fn validate(&self) -> Result<Option<Role>, ValidationErrors> {
        let mut v = Validator::new();
        v.required_if_present("name", self.name.as_deref());
        if let Some(name) = &self.name {
            v.max_len("name", name, 120);
        }
        if let Some(email) = &self.email {
            v.email("email", &normalize_email(email));
        }
        if let Some(password) = &self.password {
            v.password("password", password);
        }
        let role = self
            .role
            .as_deref()
            .and_then(|r| v.parse_enum::<Role>("role", r));
        v.finish()?;
        Ok(role)
    }

    pub fn into_changes(self, role: Option<Role>, password_hash: Option<String>) -> ChangeSet {
        ChangeSet::new()
            .set_some("name", self.name.map(|n| n.trim().to_string()))
            .set_some("email", self.email.as_deref().map(normalize_email))
            .set_some("password_hash", password_hash)
            .set_some("role", role)
            .set_some("phone", self.phone.map(|p| normalize_optional(Some(p))))
            .set_some("birth_date", self.birth_date)
            .set_some("ministry_entry_date", self.ministry_entry_date)
            .set_some("avatar_url", self.avatar_url.map(|a| normalize_optional(Some(a))))
            .touch()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::value::SqlValue;
    use crate::testing::sample_user;

    #[test]
    fn password_hash_is_never_serialized() {
        let value = serde_json::to_value(sample_user(Role::Admin)).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["role"], "ADMIN");
        assert!(value.get("ministryEntryDate").is_some());
    }

    #[test]
    fn create_defaults_to_member_and_rejects_unknown_roles() {
        let mut payload: UserCreate = serde_json::from_value(serde_json::json!({
            "name": "Ana",
            "email": "Ana@Example.org",
            "password": "longenough"
        }))
        .unwrap();
        assert_eq!(payload.validate().unwrap(), Role::Member);

        payload.role = Some("OWNER".to_string());
        let errors = payload.validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["role"]);
    }

    #[test]
    fn create_lowercases_email() {
        let payload: UserCreate = serde_json::from_value(serde_json::json!({
            "name": " Ana ",
            "email": " Ana@Example.org ",
            "password": "longenough"
        }))
        .unwrap();
        let changes = payload.into_changes(Role::Member, "hash".to_string());
        assert_eq!(changes.get("email"), Some(&SqlValue::from("ana@example.org")));
        assert_eq!(changes.get("name"), Some(&SqlValue::from("Ana")));
    }

    #[test]
    fn update_clears_blank_optional_text() {
        let payload: UserUpdate = serde_json::from_value(serde_json::json!({
            "phone": "",
            "birthDate": null
        }))
        .unwrap();
        let changes = payload.into_changes(None, None);
        assert_eq!(changes.get("phone"), Some(&SqlValue::Text(None)));
        assert_eq!(changes.get("birth_date"), Some(&SqlValue::Date(None)));
        assert!(changes.get("name").is_none());
        assert!(changes.get("updated_at").is_some());
    }

    #[test]
    fn register_reports_every_field() {
        let payload = RegisterRequest {
            name: "".to_string(),
            email: "bad".to_string(),
            password: "123".to_string(),
        };
        let errors = payload.validate().unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["name", "email", "password"]
        );
    }
}
