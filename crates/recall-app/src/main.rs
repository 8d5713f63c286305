//! Recall binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing
//! 3. Build the single store client (local index or remote Chroma)
//! 4. Start the axum API server

mod cli;

use clap::Parser;

use recall_api::{start_server, AppState};
use recall_core::config::RecallConfig;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config is loaded before tracing so the log level can come from it.
    // A load failure is held until the subscriber exists, then reported.
    let config_file = args.resolve_config_path();
    let (mut config, load_error) = match RecallConfig::load_or_default(&config_file) {
        Ok(config) => (config, None),
        Err(e) => (RecallConfig::default(), Some(e)),
    };
    args.apply(&mut config);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.general.log_level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Recall v{}", env!("CARGO_PKG_VERSION"));

    if let Some(e) = load_error {
        tracing::error!(path = %config_file.display(), error = %e, "Failed to load configuration");
        return Err(e.into());
    }
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    // Store client (single shared instance).
    let store = recall_vector::build_store(&config)?;
    let state = AppState::new(store);

    // === API server ===
    if let Err(e) = start_server(&config, state).await {
        tracing::error!(error = %e, "API server stopped with an error");
        return Err(e.into());
    }

    tracing::info!("Recall stopped");
    Ok(())
}
