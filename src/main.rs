use mimalloc::MiMalloc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Schema bootstrap: create the database and tables if absent, seed the
/// baseline records once, and exit. Run on every deploy; a non-zero exit
/// means the store is unusable and the app must not start.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = bugkiller::Config::from_env()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(backend = %cfg.backend, database = %cfg.db_name, "initializing schema");

    let db = bugkiller::db::connect_database(&cfg);
    db.ensure_schema().await?;

    info!("schema ready, seed applied where tables were empty");
    Ok(())
}
