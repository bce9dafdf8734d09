//! Generic description of a CRUD resource.
//!
//! Entities whose behaviour is plain create/read/update/delete implement
//! [`Resource`] and are served by the handlers in
//! `handlers::protected::resource`. Each implementation owns its payload
//! validation and the mapping from camelCase payload fields to table columns.

use serde::{de::DeserializeOwned, Serialize};
use sqlx::{postgres::PgRow, FromRow};
use uuid::Uuid;

use crate::database::changes::ChangeSet;
use crate::validation::ValidationErrors;

/// Minimum role required for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Member,
    Admin,
}

pub trait Resource: for<'r> FromRow<'r, PgRow> + Serialize + Send + Sync + Unpin + Sized + 'static {
    type Create: DeserializeOwned + Send;
    type Update: DeserializeOwned + Send;

    const TABLE: &'static str;
    /// Used in not-found messages, e.g. "Event not found".
    const NAME: &'static str;
    const ORDER: &'static str = "created_at desc";
    const READ: Permission = Permission::Member;
    const WRITE: Permission = Permission::Admin;

    /// Columns for a new row. The caller adds `id`.
    fn create_changes(payload: Self::Create, actor: Uuid) -> Result<ChangeSet, ValidationErrors>;

    /// Columns to overwrite on an existing row. Cross-field rules are checked
    /// against `current` merged with the payload. The caller stamps `updated_at`.
    fn update_changes(payload: Self::Update, current: &Self) -> Result<ChangeSet, ValidationErrors>;
}
