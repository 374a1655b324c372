//! Embedded single-file backend.

use crate::config::{BackendKind, Config};
use crate::db::row::{QueryOutcome, Row, SqlValue};
use crate::db::schema::{self, AdminSeed};
use crate::db::storage::Storage;
use crate::error::TrackerError;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteRow};
use sqlx::{Column, Connection, Row as _, Sqlite, SqliteConnection};
use std::path::PathBuf;

pub struct SqliteBackend {
    options: SqliteConnectOptions,
    path: PathBuf,
    admin: AdminSeed,
}

impl SqliteBackend {
    pub fn new(cfg: &Config) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(&cfg.sqlite_path)
            .create_if_missing(true);
        Self {
            options,
            path: cfg.sqlite_path.clone(),
            admin: AdminSeed::from_config(cfg),
        }
    }

    /// Opening a local file either works immediately or not at all; no
    /// retry budget here.
    async fn acquire(&self) -> Result<SqliteConnection, TrackerError> {
        SqliteConnection::connect_with(&self.options)
            .await
            .map_err(|source| TrackerError::Connection {
                backend: BackendKind::Sqlite,
                source,
            })
    }

    async fn run_statement(
        conn: &mut SqliteConnection,
        sql: &str,
        params: &[SqlValue],
        wants_rows: bool,
    ) -> Result<QueryOutcome, sqlx::Error> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind(query, param);
        }
        if wants_rows {
            let rows = query.fetch_all(&mut *conn).await?;
            let rows = rows
                .iter()
                .map(decode_row)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(QueryOutcome::Rows(rows))
        } else {
            let done = query.execute(&mut *conn).await?;
            Ok(QueryOutcome::Mutation {
                last_insert_id: done.last_insert_rowid(),
            })
        }
    }
}

#[async_trait]
impl Storage for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    async fn ensure_schema(&self) -> Result<(), TrackerError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        for ddl in [schema::SQLITE_BUGS_DDL, schema::SQLITE_USERS_DDL] {
            self.execute_once(ddl, &[], false).await?;
        }
        schema::seed_if_empty(self, &self.admin).await
    }

    async fn execute_once(
        &self,
        sql: &str,
        params: &[SqlValue],
        wants_rows: bool,
    ) -> Result<QueryOutcome, TrackerError> {
        let mut conn = self.acquire().await?;
        let result = Self::run_statement(&mut conn, sql, params, wants_rows).await;
        // Release before surfacing the outcome; an errored handle would
        // otherwise only close lazily on drop.
        let _ = conn.close().await;
        result.map_err(TrackerError::from)
    }
}

fn bind<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Integer(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.as_str()),
        SqlValue::Timestamp(v) => query.bind(*v),
    }
}

fn decode_row(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    let mut columns = Vec::with_capacity(row.columns().len());
    for (idx, column) in row.columns().iter().enumerate() {
        // SQLite types values at runtime, so probe by affinity. Timestamps
        // surface as TEXT and stay that way; Row::try_timestamp parses them.
        let value = if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            v.map(SqlValue::Integer).unwrap_or(SqlValue::Null)
        } else if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            v.map(SqlValue::Text).unwrap_or(SqlValue::Null)
        } else {
            row.try_get::<Option<NaiveDateTime>, _>(idx)?
                .map(SqlValue::Timestamp)
                .unwrap_or(SqlValue::Null)
        };
        columns.push((column.name().to_string(), value));
    }
    Ok(Row::new(columns))
}
