use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use joblink_client::store::FileStore;
use joblink_client::{Config, SessionBoot, Synchronizer};

/// Headless boot: runs the full cache-first boot sequence against the
/// configured origins and logs the resulting state. Useful for smoke
/// testing a deployment without the mobile shell.
#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("joblink_client={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("JobLink client core v{}", env!("CARGO_PKG_VERSION"));
    info!("candidate origins: {:?}", config.api_urls);

    let store = Arc::new(FileStore::open(&config.data_dir).await?);
    let sync = Synchronizer::new(&config, store);

    match sync.probe().await {
        Ok(origin) => info!("liveness probe: {origin} healthy"),
        Err(e) => warn!("liveness probe: no healthy origin ({e}); booting from cache"),
    }

    let boot = sync.boot().await;
    match &boot {
        SessionBoot::NoToken => info!("no persisted session"),
        SessionBoot::Authenticated(identity) => {
            info!("session restored: {} ({})", identity.name, identity.email)
        }
        SessionBoot::Rejected(kind) => info!("persisted token rejected: {}", kind.as_str()),
    }

    let snapshot = sync.snapshot();
    info!(
        "boot complete: {} jobs ({:?}), {} applications, {} notifications, {} saved",
        snapshot.jobs.len(),
        snapshot.jobs.source,
        snapshot.applications.len(),
        snapshot.notifications.len(),
        snapshot.saved_job_ids.len(),
    );

    Ok(())
}
