use crate::config::BackendKind;
use crate::db::models::{BugRecord, UserCredential, DEFAULT_STATUS};
use crate::db::retry::{with_retry, RetryPolicy};
use crate::db::row::{QueryOutcome, Row, SqlValue};
use crate::db::sql::StatementKind;
use crate::error::TrackerError;
use async_trait::async_trait;
use std::sync::Arc;

/// The backend seam: one polymorphic interface over the embedded and the
/// server-backed store. Implementations acquire a fresh connection per
/// attempt inside [`execute_once`](Storage::execute_once) and release it
/// before returning, so no handle is ever shared across operations.
#[async_trait]
pub trait Storage: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Idempotent table creation plus one-time seeding. Safe to call on
    /// every process start.
    async fn ensure_schema(&self) -> Result<(), TrackerError>;

    /// A single acquire-and-execute attempt with the universal `?`
    /// placeholder syntax; the retry budget lives in [`Database`].
    async fn execute_once(
        &self,
        sql: &str,
        params: &[SqlValue],
        wants_rows: bool,
    ) -> Result<QueryOutcome, TrackerError>;
}

/// Query executor over a [`Storage`] backend with a bounded retry budget
/// around every statement.
#[derive(Clone)]
pub struct Database {
    backend: Arc<dyn Storage>,
    query_policy: RetryPolicy,
}

impl Database {
    pub fn new(backend: Arc<dyn Storage>) -> Self {
        Self::with_query_policy(backend, RetryPolicy::query_default())
    }

    pub fn with_query_policy(backend: Arc<dyn Storage>, query_policy: RetryPolicy) -> Self {
        Self {
            backend,
            query_policy,
        }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Invoked once at startup; a failure here is fatal for the process.
    pub async fn ensure_schema(&self) -> Result<(), TrackerError> {
        self.backend
            .ensure_schema()
            .await
            .map_err(|e| TrackerError::Schema(Box::new(e)))
    }

    /// Execute a parameterized statement, retrying transient failures.
    /// `wants_rows` selects between a result set and the mutation outcome.
    pub async fn execute(
        &self,
        sql: &str,
        params: &[SqlValue],
        wants_rows: bool,
    ) -> Result<QueryOutcome, TrackerError> {
        let kind = StatementKind::of(sql);
        let label = kind.to_string();
        with_retry(
            &self.query_policy,
            || self.backend.execute_once(sql, params, wants_rows),
            |_| true,
            &label,
        )
        .await
        .map_err(|source| TrackerError::Query {
            kind,
            source: Box::new(source),
        })
    }

    /// First matching row, or `None` when nothing matched. Zero rows is not
    /// an error.
    pub async fn fetch_one(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Option<Row>, TrackerError> {
        let rows = self.execute(sql, params, true).await?.into_rows();
        Ok(rows.into_iter().next())
    }

    /// Insert a bug and return its backend-assigned id. The title must be
    /// non-empty; a missing status defaults to [`DEFAULT_STATUS`].
    pub async fn insert_bug(
        &self,
        title: &str,
        status: Option<&str>,
    ) -> Result<i64, TrackerError> {
        if title.trim().is_empty() {
            return Err(TrackerError::EmptyTitle);
        }
        let status = status.unwrap_or(DEFAULT_STATUS);
        let outcome = self
            .execute(
                "INSERT INTO bugs (title, status) VALUES (?, ?)",
                &[SqlValue::from(title), SqlValue::from(status)],
                false,
            )
            .await?;
        Ok(outcome.last_insert_id())
    }

    pub async fn get_bug(&self, id: i64) -> Result<Option<BugRecord>, TrackerError> {
        let row = self
            .fetch_one(
                "SELECT id, title, status, created_at FROM bugs WHERE id = ?",
                &[SqlValue::from(id)],
            )
            .await?;
        row.as_ref().map(BugRecord::try_from).transpose()
    }

    /// All bugs, newest first.
    pub async fn list_bugs(&self) -> Result<Vec<BugRecord>, TrackerError> {
        let rows = self
            .execute(
                "SELECT id, title, status, created_at FROM bugs ORDER BY id DESC",
                &[],
                true,
            )
            .await?
            .into_rows();
        rows.iter().map(BugRecord::try_from).collect()
    }

    pub async fn delete_bug(&self, id: i64) -> Result<(), TrackerError> {
        self.execute("DELETE FROM bugs WHERE id = ?", &[SqlValue::from(id)], false)
            .await?;
        Ok(())
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<UserCredential>, TrackerError> {
        let row = self
            .fetch_one(
                "SELECT id, username, password_hash FROM users WHERE username = ?",
                &[SqlValue::from(username)],
            )
            .await?;
        row.as_ref().map(UserCredential::try_from).transpose()
    }
}
