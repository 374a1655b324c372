pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod password;

pub use config::{BackendKind, Config};
pub use db::{Database, Storage};
pub use error::TrackerError;
