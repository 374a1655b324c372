use crate::error::TrackerError;
use chrono::NaiveDateTime;

/// Backend-neutral scalar value, covering every column type in the schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::Timestamp(v)
    }
}

/// One result row with every column addressable by name, identical in shape
/// for both backends.
#[derive(Debug, Clone, Default)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new(columns: Vec<(String, SqlValue)>) -> Self {
        Self { columns }
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> &[(String, SqlValue)] {
        &self.columns
    }

    pub fn try_integer(&self, name: &str) -> Result<i64, TrackerError> {
        match self.get(name) {
            Some(SqlValue::Integer(v)) => Ok(*v),
            Some(other) => Err(TrackerError::Decode(format!(
                "column '{name}' is not an integer: {other:?}"
            ))),
            None => Err(TrackerError::Decode(format!("missing column '{name}'"))),
        }
    }

    pub fn try_text(&self, name: &str) -> Result<String, TrackerError> {
        match self.get(name) {
            Some(SqlValue::Text(v)) => Ok(v.clone()),
            Some(other) => Err(TrackerError::Decode(format!(
                "column '{name}' is not text: {other:?}"
            ))),
            None => Err(TrackerError::Decode(format!("missing column '{name}'"))),
        }
    }

    /// Timestamps arrive natively typed from Postgres and as
    /// `CURRENT_TIMESTAMP` text from SQLite; both decode here.
    pub fn try_timestamp(&self, name: &str) -> Result<NaiveDateTime, TrackerError> {
        match self.get(name) {
            Some(SqlValue::Timestamp(v)) => Ok(*v),
            Some(SqlValue::Text(s)) => parse_timestamp_text(s).ok_or_else(|| {
                TrackerError::Decode(format!("column '{name}' is not a timestamp: {s:?}"))
            }),
            Some(other) => Err(TrackerError::Decode(format!(
                "column '{name}' is not a timestamp: {other:?}"
            ))),
            None => Err(TrackerError::Decode(format!("missing column '{name}'"))),
        }
    }
}

fn parse_timestamp_text(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

/// Result of one executed statement.
#[derive(Debug)]
pub enum QueryOutcome {
    Rows(Vec<Row>),
    Mutation { last_insert_id: i64 },
}

impl QueryOutcome {
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            QueryOutcome::Rows(rows) => rows,
            QueryOutcome::Mutation { .. } => Vec::new(),
        }
    }

    pub fn last_insert_id(&self) -> i64 {
        match self {
            QueryOutcome::Mutation { last_insert_id } => *last_insert_id,
            QueryOutcome::Rows(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> Row {
        Row::new(vec![
            ("id".to_string(), SqlValue::Integer(7)),
            ("title".to_string(), SqlValue::Text("Broken link".to_string())),
            (
                "created_at".to_string(),
                SqlValue::Text("2026-08-23 10:15:00".to_string()),
            ),
        ])
    }

    #[test]
    fn columns_are_addressable_by_name() {
        let row = sample_row();
        assert_eq!(row.try_integer("id").unwrap(), 7);
        assert_eq!(row.try_text("title").unwrap(), "Broken link");
        assert!(row.get("missing").is_none());
        assert!(row.try_integer("title").is_err());
    }

    #[test]
    fn sqlite_timestamp_text_decodes() {
        let row = sample_row();
        let ts = row.try_timestamp("created_at").unwrap();
        assert_eq!(ts.format("%Y-%m-%d").to_string(), "2026-08-23");
    }

    #[test]
    fn mutation_outcome_has_no_rows() {
        let outcome = QueryOutcome::Mutation { last_insert_id: 42 };
        assert_eq!(outcome.last_insert_id(), 42);
        assert!(outcome.into_rows().is_empty());
    }
}
