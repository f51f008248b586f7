//! Timetable HTTP Server Binary
//!
//! Loads configuration, builds the repository and serves the REST API.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin splan-server
//!
//! # Explicit config file and port override
//! SPLAN_CONFIG=./splan.toml PORT=9000 cargo run --bin splan-server
//! ```
//!
//! # Environment Variables
//!
//! - `SPLAN_CONFIG`: Path to a TOML config file (default: `splan.toml` lookup)
//! - `HOST`, `PORT`, `REPOSITORY_TYPE`, `SPLAN_REMINDER_HORIZON_MINUTES`: config overrides
//! - `RUST_LOG`: Log filter (default: info)

use std::env;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use splan::config::AppConfig;
use splan::db::RepositoryFactory;
use splan::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting timetable server");

    let config_path = env::var_os("SPLAN_CONFIG").map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    let repository = RepositoryFactory::from_settings(&config.repository)?;
    info!(repository = %config.repository.repo_type, "Repository initialized");

    let state = AppState::new(repository).with_config(&config);
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
