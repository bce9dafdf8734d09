use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use uuid::Uuid;

use super::text_enum;
use crate::database::changes::ChangeSet;
use crate::validation::{normalize_optional, ValidationErrors, Validator};

text_enum!(AttendanceStatus {
    Present => "PRESENT",
    Absent => "ABSENT",
    Justified => "JUSTIFIED",
});

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub rehearsal_id: Uuid,
    pub user_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
    pub note: Option<String>,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `POST /setAttendance`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAttendance {
    pub rehearsal_id: Option<Uuid>,
    #[serde(default)]
    pub records: Vec<AttendanceInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceInput {
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub status: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceEntry {
    pub user_id: Uuid,
    pub status: AttendanceStatus,
    pub note: Option<String>,
}

impl AttendanceEntry {
    pub fn into_changes(self, rehearsal_id: Uuid, recorded_by: Uuid) -> ChangeSet {
        ChangeSet::new()
            .set("id", Uuid::new_v4())
            .set("rehearsal_id", rehearsal_id)
            .set("user_id", self.user_id)
            .set("status", self.status)
            .set("note", self.note)
            .set("recorded_by", recorded_by)
            .touch()
    }
}

/// A batch that passed validation as a whole.
#[derive(Debug)]
pub struct AttendanceBatch {
    pub rehearsal_id: Uuid,
    pub entries: Vec<AttendanceEntry>,
}

impl SetAttendance {
    /// Validate every record before anything is written. A single bad record
    /// rejects the batch; `details` names each offending index.
    pub fn validate(self) -> Result<AttendanceBatch, ValidationErrors> {
        let mut v = Validator::new();
        v.check(self.rehearsal_id.is_some(), "rehearsalId", "is required")
            .check(!self.records.is_empty(), "records", "must contain at least one record");

        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(self.records.len());
        for (i, record) in self.records.into_iter().enumerate() {
            let user_id = match record.user_id {
                Some(id) => {
                    if !seen.insert(id) {
                        v.add(format!("records[{}].userId", i), "appears more than once");
                    }
                    Some(id)
                }
                None => {
                    v.add(format!("records[{}].userId", i), "is required");
                    None
                }
            };
            let status = v.parse_enum::<AttendanceStatus>(&format!("records[{}].status", i), &record.status);
            let note = normalize_optional(record.note);
            if status == Some(AttendanceStatus::Justified) && note.is_none() {
                v.add(format!("records[{}].note", i), "is required when status is JUSTIFIED");
            }
            if let (Some(user_id), Some(status)) = (user_id, status) {
                entries.push(AttendanceEntry { user_id, status, note });
            }
        }
        v.finish()?;

        Ok(AttendanceBatch {
            rehearsal_id: self.rehearsal_id.unwrap_or_default(),
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn batch(records: serde_json::Value) -> SetAttendance {
        serde_json::from_value(json!({
            "rehearsalId": Uuid::new_v4(),
            "records": records
        }))
        .unwrap()
    }

    #[test]
    fn justified_without_note_rejects_whole_batch() {
        let payload = batch(json!([
            { "userId": Uuid::new_v4(), "status": "PRESENT" },
            { "userId": Uuid::new_v4(), "status": "JUSTIFIED", "note": "   " },
            { "userId": Uuid::new_v4(), "status": "ABSENT" }
        ]));
        let errors = payload.validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["records[1].note"]);
    }

    #[test]
    fn every_offending_index_is_reported() {
        let dup = Uuid::new_v4();
        let payload = batch(json!([
            { "userId": dup, "status": "LATE" },
            { "userId": dup, "status": "PRESENT" },
            { "status": "ABSENT" }
        ]));
        let errors = payload.validate().unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["records[0].status", "records[1].userId", "records[2].userId"]
        );
    }

    #[test]
    fn empty_batch_is_rejected() {
        let errors = batch(json!([])).validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["records"]);
    }

    #[test]
    fn valid_batch_trims_notes() {
        let user = Uuid::new_v4();
        let accepted = batch(json!([
            { "userId": user, "status": "JUSTIFIED", "note": " sick " }
        ]))
        .validate()
        .unwrap();
        assert_eq!(
            accepted.entries,
            vec![AttendanceEntry {
                user_id: user,
                status: AttendanceStatus::Justified,
                note: Some("sick".to_string()),
            }]
        );
    }

    #[test]
    fn missing_rehearsal_is_reported() {
        let payload: SetAttendance = serde_json::from_value(json!({
            "records": [{ "userId": Uuid::new_v4(), "status": "PRESENT" }]
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["rehearsalId"]);
    }
}
