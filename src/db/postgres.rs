//! Server-backed PostgreSQL backend.
//!
//! Connections are retried under a fixed-delay budget so the store may still
//! be starting (container ordering). A structured `3D000` while targeting the
//! named database falls back to the server root instead of burning budget,
//! which lets `ensure_schema` create the database on first run.

use crate::config::{BackendKind, Config};
use crate::db::retry::{with_retry, RetryPolicy};
use crate::db::row::{QueryOutcome, Row, SqlValue};
use crate::db::schema::{self, AdminSeed};
use crate::db::sql::{rewrite_placeholders, StatementKind};
use crate::db::storage::Storage;
use crate::error::TrackerError;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::postgres::{PgConnectOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Connection, PgConnection, Postgres, Row as _};
use tracing::{debug, info};

/// Maintenance database used for root-scoped connections.
const ROOT_DATABASE: &str = "postgres";

pub struct PostgresBackend {
    host: String,
    port: u16,
    user: String,
    password: String,
    database: String,
    connect_policy: RetryPolicy,
    admin: AdminSeed,
}

impl PostgresBackend {
    pub fn new(cfg: &Config) -> Self {
        Self {
            host: cfg.db_host.clone(),
            port: cfg.db_port,
            user: cfg.db_user.clone(),
            password: cfg.db_password.clone(),
            database: cfg.db_name.clone(),
            connect_policy: RetryPolicy::connect_default(),
            admin: AdminSeed::from_config(cfg),
        }
    }

    pub fn with_connect_policy(mut self, policy: RetryPolicy) -> Self {
        self.connect_policy = policy;
        self
    }

    fn connect_options(&self, target_db: bool) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(if target_db {
                &self.database
            } else {
                ROOT_DATABASE
            })
    }

    /// Open one exclusively-owned connection, retrying while the server is
    /// unreachable. When the named database is missing, hand back a root
    /// connection instead so the schema initializer can create it.
    async fn acquire(&self, target_db: bool) -> Result<PgConnection, TrackerError> {
        match self.connect_with_retry(target_db).await {
            Ok(conn) => Ok(conn),
            Err(e) if target_db && is_missing_database(&e) => {
                debug!(database = %self.database, "database absent, connecting to server root");
                self.connect_with_retry(false)
                    .await
                    .map_err(|source| self.connection_error(source))
            }
            Err(source) => Err(self.connection_error(source)),
        }
    }

    async fn connect_with_retry(&self, target_db: bool) -> Result<PgConnection, sqlx::Error> {
        let options = self.connect_options(target_db);
        with_retry(
            &self.connect_policy,
            || async { PgConnection::connect_with(&options).await },
            |e: &sqlx::Error| !is_missing_database(e),
            "postgres connect",
        )
        .await
    }

    fn connection_error(&self, source: sqlx::Error) -> TrackerError {
        TrackerError::Connection {
            backend: BackendKind::Postgres,
            source,
        }
    }

    async fn run_statement(
        conn: &mut PgConnection,
        sql: &str,
        params: &[SqlValue],
        wants_rows: bool,
    ) -> Result<QueryOutcome, sqlx::Error> {
        let rewritten = rewrite_placeholders(sql);
        let mut query = sqlx::query(&rewritten);
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
            query.execute(&mut *conn).await?;
            // Postgres has no implicit last-insert id; lastval() reflects the
            // BIGSERIAL assignment made on this same connection.
            let last_insert_id = if StatementKind::of(sql) == StatementKind::Insert {
                sqlx::query_scalar("SELECT lastval()")
                    .fetch_one(&mut *conn)
                    .await?
            } else {
                0
            };
            Ok(QueryOutcome::Mutation { last_insert_id })
        }
    }
}

#[async_trait]
impl Storage for PostgresBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Postgres
    }

    async fn ensure_schema(&self) -> Result<(), TrackerError> {
        let mut root = self
            .connect_with_retry(false)
            .await
            .map_err(|source| self.connection_error(source))?;
        let created = create_database_if_absent(&mut root, &self.database).await;
        let _ = root.close().await;
        created?;

        for ddl in [schema::POSTGRES_BUGS_DDL, schema::POSTGRES_USERS_DDL] {
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
        let mut conn = self.acquire(true).await?;
        let result = Self::run_statement(&mut conn, sql, params, wants_rows).await;
        let _ = conn.close().await;
        result.map_err(TrackerError::from)
    }
}

/// SQLSTATE 3D000: invalid_catalog_name. Matched structurally rather than on
/// error text, which varies across server versions and locales.
fn is_missing_database(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(e) if e.code().as_deref() == Some("3D000"))
}

async fn create_database_if_absent(
    conn: &mut PgConnection,
    name: &str,
) -> Result<(), TrackerError> {
    let exists = sqlx::query("SELECT 1 FROM pg_database WHERE datname = $1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?
        .is_some();
    if !exists {
        // CREATE DATABASE takes an identifier, not a bind parameter.
        let stmt = format!("CREATE DATABASE \"{}\"", name.replace('"', "\"\""));
        sqlx::query(&stmt).execute(&mut *conn).await?;
        info!(database = %name, "created database");
    }
    Ok(())
}

fn bind<'q>(
    query: Query<'q, Postgres, sqlx::postgres::PgArguments>,
    value: &'q SqlValue,
) -> Query<'q, Postgres, sqlx::postgres::PgArguments> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Integer(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.as_str()),
        SqlValue::Timestamp(v) => query.bind(*v),
    }
}

fn decode_row(row: &PgRow) -> Result<Row, sqlx::Error> {
    let mut columns = Vec::with_capacity(row.columns().len());
    for (idx, column) in row.columns().iter().enumerate() {
        let value = if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            v.map(SqlValue::Integer).unwrap_or(SqlValue::Null)
        } else if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
            v.map(|n| SqlValue::Integer(i64::from(n)))
                .unwrap_or(SqlValue::Null)
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
