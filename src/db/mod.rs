//! Storage layer: one interface over the embedded SQLite store and the
//! server-backed Postgres store.
//!
//! Layout:
//! - `row.rs`: backend-neutral values and name-addressable rows
//! - `sql.rs`: placeholder rewriting and statement classification
//! - `retry.rs`: bounded fixed-delay retry used by both backends
//! - `storage.rs`: the `Storage` seam and the retrying `Database` executor
//! - `schema.rs`: DDL and the first-run seed set
//! - `sqlite.rs` / `postgres.rs`: the concrete backends
//! - `models.rs`: typed records for callers

pub mod models;
pub mod postgres;
pub mod retry;
pub mod row;
pub mod schema;
pub mod sql;
pub mod sqlite;
pub mod storage;

pub use models::{BugRecord, UserCredential, DEFAULT_STATUS};
pub use row::{QueryOutcome, Row, SqlValue};
pub use storage::{Database, Storage};

use crate::config::{BackendKind, Config};
use std::sync::Arc;

/// Pick the backend named by the configuration.
pub fn open_storage(cfg: &Config) -> Arc<dyn Storage> {
    match cfg.backend {
        BackendKind::Sqlite => Arc::new(sqlite::SqliteBackend::new(cfg)),
        BackendKind::Postgres => Arc::new(postgres::PostgresBackend::new(cfg)),
    }
}

/// Storage plus the retrying query executor, in one constructor.
pub fn connect_database(cfg: &Config) -> Database {
    Database::new(open_storage(cfg))
}
