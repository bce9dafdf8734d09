use chrono::Utc;

use crate::filter::types::SqlResult;

use super::value::SqlValue;

/// Ordered column assignments for a single INSERT or UPDATE.
///
/// Resources translate their camelCase payloads into snake_case columns here,
/// so this is the only place where API field names meet table columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    columns: Vec<(&'static str, SqlValue)>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column, replacing any earlier assignment to it.
    pub fn set(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        let value = value.into();
        match self.columns.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((column, value)),
        }
        self
    }

    /// Set a column only when the payload carried a value for it.
    pub fn set_some<T: Into<SqlValue>>(self, column: &'static str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Stamp `updated_at` with the current time.
    pub fn touch(self) -> Self {
        self.set("updated_at", Utc::now())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|(c, _)| *c)
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns.iter().find(|(c, _)| *c == column).map(|(_, v)| v)
    }

    /// `INSERT INTO "table" ("a", "b") VALUES ($1, $2) RETURNING *`
    pub fn insert_sql(&self, table: &str) -> SqlResult {
        let (names, placeholders) = self.names_and_placeholders(0);
        SqlResult {
            query: format!(
                "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING *",
                table,
                names.join(", "),
                placeholders.join(", ")
            ),
            params: self.values(),
        }
    }

    /// `INSERT ... ON CONFLICT (keys) DO UPDATE SET col = EXCLUDED.col RETURNING *`
    ///
    /// Every assigned column that is not part of the conflict key is
    /// overwritten, except `id` and `created_at` which keep the first write.
    pub fn upsert_sql(&self, table: &str, conflict: &[&str]) -> SqlResult {
        let (names, placeholders) = self.names_and_placeholders(0);
        let updates: Vec<String> = self
            .columns()
            .filter(|c| !conflict.contains(c) && *c != "id" && *c != "created_at")
            .map(|c| format!("\"{c}\" = EXCLUDED.\"{c}\""))
            .collect();
        let conflict_cols: Vec<String> = conflict.iter().map(|c| format!("\"{}\"", c)).collect();

        let action = if updates.is_empty() {
            "DO NOTHING".to_string()
        } else {
            format!("DO UPDATE SET {}", updates.join(", "))
        };

        SqlResult {
            query: format!(
                "INSERT INTO \"{}\" ({}) VALUES ({}) ON CONFLICT ({}) {} RETURNING *",
                table,
                names.join(", "),
                placeholders.join(", "),
                conflict_cols.join(", "),
                action
            ),
            params: self.values(),
        }
    }

    /// `UPDATE "table" SET "a" = $1 WHERE "id" = $n RETURNING *`
    pub fn update_sql(&self, table: &str, id: uuid::Uuid) -> SqlResult {
        let assignments: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, (c, _))| format!("\"{}\" = ${}", c, i + 1))
            .collect();

        let mut params = self.values();
        params.push(SqlValue::from(id));

        SqlResult {
            query: format!(
                "UPDATE \"{}\" SET {} WHERE \"id\" = ${} RETURNING *",
                table,
                assignments.join(", "),
                params.len()
            ),
            params,
        }
    }

    fn names_and_placeholders(&self, offset: usize) -> (Vec<String>, Vec<String>) {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, (c, _))| (format!("\"{}\"", c), format!("${}", i + 1 + offset)))
            .unzip()
    }

    fn values(&self) -> Vec<SqlValue> {
        self.columns.iter().map(|(_, v)| v.clone()).collect()
    }
}
