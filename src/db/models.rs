use crate::db::row::Row;
use crate::error::TrackerError;
use crate::password;
use chrono::NaiveDateTime;
use serde::Serialize;

/// Status assigned when a caller does not provide one.
pub const DEFAULT_STATUS: &str = "New";

/// A tracked bug. Rows are insert-only: created once, deleted by id, never
/// updated in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BugRecord {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub created_at: NaiveDateTime,
}

impl TryFrom<&Row> for BugRecord {
    type Error = TrackerError;

    fn try_from(row: &Row) -> Result<Self, TrackerError> {
        Ok(Self {
            id: row.try_integer("id")?,
            title: row.try_text("title")?,
            status: row.try_text("status")?,
            created_at: row.try_timestamp("created_at")?,
        })
    }
}

/// A login credential; only ever created by seeding. The password exists
/// solely as a salted one-way hash.
#[derive(Debug, Clone, PartialEq)]
pub struct UserCredential {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

impl UserCredential {
    /// Constant-time check against the stored hash.
    pub fn verify(&self, candidate: &str) -> bool {
        password::verify_password(candidate, &self.password_hash)
    }
}

impl TryFrom<&Row> for UserCredential {
    type Error = TrackerError;

    fn try_from(row: &Row) -> Result<Self, TrackerError> {
        Ok(Self {
            id: row.try_integer("id")?,
            username: row.try_text("username")?,
            password_hash: row.try_text("password_hash")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::row::SqlValue;

    #[test]
    fn bug_record_decodes_from_a_named_row() {
        let row = Row::new(vec![
            ("id".to_string(), SqlValue::Integer(3)),
            ("title".to_string(), SqlValue::Text("Bad redirect".to_string())),
            ("status".to_string(), SqlValue::Text("New".to_string())),
            (
                "created_at".to_string(),
                SqlValue::Text("2026-08-23 09:00:00".to_string()),
            ),
        ]);
        let bug = BugRecord::try_from(&row).unwrap();
        assert_eq!(bug.id, 3);
        assert_eq!(bug.status, "New");
    }

    #[test]
    fn bug_record_rejects_rows_missing_columns() {
        let row = Row::new(vec![("id".to_string(), SqlValue::Integer(3))]);
        assert!(matches!(
            BugRecord::try_from(&row),
            Err(TrackerError::Decode(_))
        ));
    }
}
