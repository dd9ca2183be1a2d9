use anyhow::{Context, Result};
use jobboard::{SharedClock, SystemClock};
use jobboard_server::config::Config;
use jobboard_server::repository::MemoryRepository;
use jobboard_server::state::AppState;
use jobboard_server::store;
use jobboard_server::transport::{Transport, http::HttpTransport};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration from environment variables and CLI arguments
    let config = Config::from_env_and_args()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("jobboard={}", config.log_level).parse()?)
                .add_directive(format!("jobboard_server={}", config.log_level).parse()?),
        )
        .init();

    let clock: SharedClock = Arc::new(SystemClock);
    let store = store::create_store(&config.store, clock.clone()).await?;
    let repo = Arc::new(MemoryRepository::new());

    let state = AppState::new(&config, repo, store, clock).into_shared();

    if let Some(admin) = &config.admin {
        state
            .seed_admin(admin)
            .await
            .context("failed to seed admin account")?;
    }

    tracing::info!(
        "Jobboard server starting with store type: {:?}, failure policy: {:?}",
        config.store.store_type,
        config.failure_policy
    );

    let transport = HttpTransport::new(&config.http.host, config.http.port)?;
    transport.start(state).await
}
