//! CLI argument definitions for the Recall gateway.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use recall_core::config::RecallConfig;

/// Recall — HTTP gateway for indexing and searching text in a vector store.
#[derive(Parser, Debug, Default)]
#[command(name = "recall", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Interface to bind.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Store backend: local or chroma.
    #[arg(short = 'b', long = "backend")]
    pub backend: Option<String>,

    /// Log level or tracing filter directive (e.g. "debug", "recall_api=trace").
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > RECALL_CONFIG env var > ./recall.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("RECALL_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from("recall.toml")
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > RECALL_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("RECALL_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        config_port
    }

    /// Resolve the tracing filter.
    ///
    /// Priority: --log-level flag > RUST_LOG env var > config file value.
    pub fn resolve_log_filter(&self, config_level: &str) -> String {
        if let Some(ref level) = self.log_level {
            return level.clone();
        }
        if let Ok(filter) = std::env::var("RUST_LOG") {
            if !filter.trim().is_empty() {
                return filter;
            }
        }
        config_level.to_string()
    }

    /// Apply every CLI and environment override to a loaded configuration.
    pub fn apply(&self, config: &mut RecallConfig) {
        config.server.port = self.resolve_port(config.server.port);
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(ref backend) = self.backend {
            config.store.backend = backend.clone();
        }
        config.general.log_level = self.resolve_log_filter(&config.general.log_level);
    }
}
