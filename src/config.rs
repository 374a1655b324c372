use crate::error::TrackerError;
use figment::providers::Env;
use figment::Figment;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// The concrete storage engine in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sqlite,
    Postgres,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::Postgres => "postgres",
        })
    }
}

/// Runtime configuration, extracted once at startup from `BUGKILLER_*`
/// environment variables and passed by reference into constructors.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default = "default_db_host")]
    pub db_host: String,
    #[serde(default = "default_db_port")]
    pub db_port: u16,
    #[serde(default = "default_db_user")]
    pub db_user: String,
    #[serde(default = "default_db_password")]
    pub db_password: String,
    #[serde(default = "default_db_name")]
    pub db_name: String,
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,
    /// Outbound notification endpoint; notifications are skipped when unset.
    #[serde(default)]
    pub webhook_url: Option<Url>,
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
    #[serde(default = "default_loglevel")]
    pub loglevel: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            db_host: default_db_host(),
            db_port: default_db_port(),
            db_user: default_db_user(),
            db_password: default_db_password(),
            db_name: default_db_name(),
            sqlite_path: default_sqlite_path(),
            webhook_url: None,
            admin_username: default_admin_username(),
            admin_password: default_admin_password(),
            loglevel: default_loglevel(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, TrackerError> {
        let cfg: Config = Figment::new()
            .merge(Env::prefixed("BUGKILLER_"))
            .extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Default secrets are fine for local development but refused when
    /// `APP_ENV=production`.
    fn validate(&self) -> Result<(), TrackerError> {
        if std::env::var("APP_ENV").as_deref() != Ok("production") {
            return Ok(());
        }
        if self.backend == BackendKind::Postgres && self.db_password == default_db_password() {
            return Err(figment::Error::from(
                "BUGKILLER_DB_PASSWORD must be set explicitly in production".to_string(),
            )
            .into());
        }
        if self.admin_password == default_admin_password() {
            return Err(figment::Error::from(
                "BUGKILLER_ADMIN_PASSWORD must be set explicitly in production".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_password() -> String {
    "postgres".to_string()
}

fn default_db_name() -> String {
    "bugkiller".to_string()
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("db/bugkiller.db")
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "admin123".to_string()
}

fn default_loglevel() -> String {
    "info".to_string()
}
