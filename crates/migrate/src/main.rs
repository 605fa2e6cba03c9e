//! Bring a deployment up to date: apply pending migrations and create the
//! media directories.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vnt_core::config::MediaConfig;
use vnt_core::media::LocalBlobStore;
use vnt_db::DbConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vnt_migrate=debug,vnt_db=debug,vnt_core=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    // LOG_FORMAT=json for machine-readable output.
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let db_config = DbConfig::from_env().context("database configuration")?;
    let pool = vnt_db::create_pool(&db_config)
        .await
        .context("connecting to the database")?;
    vnt_db::health_check(&pool)
        .await
        .context("database health check")?;
    tracing::info!(max_connections = db_config.max_connections, "Database connected");

    vnt_db::run_migrations(&pool)
        .await
        .context("applying migrations")?;
    tracing::info!("Migrations applied");

    let media = MediaConfig::from_env().context("media configuration")?;
    let blobs = LocalBlobStore::new(&media.media_root);
    blobs
        .ensure_dirs(&media.directories())
        .await
        .context("creating media directories")?;
    tracing::info!(
        media_root = %media.media_root.display(),
        thumbnail_width = media.thumbnail_width,
        "Media directories ready"
    );

    Ok(())
}
