use crate::config::BackendKind;
use crate::db::sql::StatementKind;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

/// Error taxonomy for the storage and dispatch layer.
///
/// `Connection` and `Schema` are fatal at startup; `Query` is surfaced to the
/// caller once the retry budget is spent; `Dispatch` and `TaskExecution` are
/// logged and isolated so a notifier outage never touches the write path.
#[derive(Debug, ThisError)]
pub enum TrackerError {
    #[error("{backend} connection failed: {source}")]
    Connection {
        backend: BackendKind,
        #[source]
        source: SqlxError,
    },

    #[error("schema initialization failed: {0}")]
    Schema(#[source] Box<TrackerError>),

    #[error("{kind} statement failed after retries: {source}")]
    Query {
        kind: StatementKind,
        #[source]
        source: Box<TrackerError>,
    },

    #[error("dispatch failed: {0}")]
    Dispatch(String),

    #[error("task '{task}' execution failed: {reason}")]
    TaskExecution { task: String, reason: String },

    #[error("bug title must not be empty")]
    EmptyTitle,

    #[error("row decode failed: {0}")]
    Decode(String),

    #[error("database error: {0}")]
    Database(#[from] SqlxError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),
}
