//! DDL and first-run seed set for both backends.

use crate::config::Config;
use crate::db::row::SqlValue;
use crate::db::storage::Storage;
use crate::error::TrackerError;
use crate::password;
use tracing::info;

pub const SQLITE_BUGS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS bugs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title VARCHAR(255) NOT NULL,
    status VARCHAR(50) DEFAULT 'New',
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
"#;

pub const SQLITE_USERS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username VARCHAR(100) UNIQUE NOT NULL,
    password_hash VARCHAR(255) NOT NULL
)
"#;

pub const POSTGRES_BUGS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS bugs (
    id BIGSERIAL PRIMARY KEY,
    title VARCHAR(255) NOT NULL,
    status VARCHAR(50) DEFAULT 'New',
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
"#;

pub const POSTGRES_USERS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    username VARCHAR(100) UNIQUE NOT NULL,
    password_hash VARCHAR(255) NOT NULL
)
"#;

/// Inserted when the bugs table is first observed empty.
pub const SAMPLE_BUGS: [(&str, &str); 3] = [
    ("Login page renders blank on Safari", "New"),
    ("Notification email is sent twice", "In Progress"),
    ("Crash when deleting an already-closed bug", "Resolved"),
];

const COUNT_BUGS: &str = "SELECT COUNT(*) AS count FROM bugs";
const COUNT_USERS: &str = "SELECT COUNT(*) AS count FROM users";
const INSERT_BUG: &str = "INSERT INTO bugs (title, status) VALUES (?, ?)";
const INSERT_USER: &str = "INSERT INTO users (username, password_hash) VALUES (?, ?)";

/// Administrator credential to seed, with the password already hashed so the
/// raw secret is not retained by the backend.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password_hash: String,
}

impl AdminSeed {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            username: cfg.admin_username.clone(),
            password_hash: password::hash_password(&cfg.admin_password),
        }
    }
}

/// Seed baseline records, independently per table, only when the table is
/// empty. Re-running against populated tables is a no-op.
pub(crate) async fn seed_if_empty(
    backend: &dyn Storage,
    admin: &AdminSeed,
) -> Result<(), TrackerError> {
    if table_count(backend, COUNT_BUGS).await? == 0 {
        for (title, status) in SAMPLE_BUGS {
            backend
                .execute_once(
                    INSERT_BUG,
                    &[SqlValue::from(title), SqlValue::from(status)],
                    false,
                )
                .await?;
        }
        info!(count = SAMPLE_BUGS.len(), "seeded sample bugs");
    }
    if table_count(backend, COUNT_USERS).await? == 0 {
        backend
            .execute_once(
                INSERT_USER,
                &[
                    SqlValue::from(admin.username.as_str()),
                    SqlValue::from(admin.password_hash.as_str()),
                ],
                false,
            )
            .await?;
        info!(username = %admin.username, "seeded administrator credential");
    }
    Ok(())
}

async fn table_count(backend: &dyn Storage, count_sql: &str) -> Result<i64, TrackerError> {
    let rows = backend.execute_once(count_sql, &[], true).await?.into_rows();
    match rows.first() {
        Some(row) => row.try_integer("count"),
        None => Err(TrackerError::Decode(
            "count query returned no row".to_string(),
        )),
    }
}
