use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{RecallError, Result};

/// Top-level configuration for the Recall gateway.
///
/// Loaded from `recall.toml` by default. Every section falls back to its
/// defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecallConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub chroma: ChromaConfig,
}

impl RecallConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RecallConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults only
    /// when the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(RecallError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("No config file at {}. Using defaults.", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(RecallError::Config("server.port must not be 0".into()));
        }
        if self.store.n_results == 0 {
            return Err(RecallError::Config(
                "store.n_results must be at least 1".into(),
            ));
        }
        if self.store.collection.trim().is_empty() {
            return Err(RecallError::Config(
                "store.collection must not be empty".into(),
            ));
        }
        if self.embedding.dimensions == 0 {
            return Err(RecallError::Config(
                "embedding.dimensions must be at least 1".into(),
            ));
        }
        if !matches!(self.store.backend.as_str(), "local" | "chroma") {
            return Err(RecallError::Config(format!(
                "Unknown store.backend '{}'. Must be one of: local, chroma",
                self.store.backend
            )));
        }
        match self.embedding.provider.as_str() {
            "hashing" => {}
            "onnx" => {
                if self.embedding.model_dir.trim().is_empty() {
                    return Err(RecallError::Config(
                        "embedding.model_dir is required for the onnx provider".into(),
                    ));
                }
            }
            other => {
                return Err(RecallError::Config(format!(
                    "Unknown embedding.provider '{}'. Must be one of: hashing, onnx",
                    other
                )));
            }
        }
        if self.store.backend == "chroma" {
            if self.chroma.url.trim().is_empty() {
                return Err(RecallError::Config(
                    "chroma.url is required for the chroma backend".into(),
                ));
            }
            if self.chroma.tenant.trim().is_empty() || self.chroma.database.trim().is_empty() {
                return Err(RecallError::Config(
                    "chroma.tenant and chroma.database must not be empty".into(),
                ));
            }
        }
        Ok(())
    }
}

/// General process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// TCP port to bind.
    pub port: u16,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
    /// Origins allowed by CORS. Empty disables the CORS layer.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5115,
            max_body_bytes: 1024 * 1024,
            cors_origins: Vec::new(),
        }
    }
}

/// Store client selection and search behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store engine: "local" (in-process) or "chroma" (remote HTTP).
    pub backend: String,
    /// Collection name used by the store.
    pub collection: String,
    /// Number of results returned per search (top-k).
    pub n_results: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "local".to_string(),
            collection: "my_collection".to_string(),
            n_results: 2,
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider: "hashing" (model-free) or "onnx" (sentence transformer).
    pub provider: String,
    /// Output dimension for the hashing provider. The onnx provider reports
    /// its own dimension from the model.
    pub dimensions: usize,
    /// Directory holding `model.onnx` and `tokenizer.json`.
    pub model_dir: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "hashing".to_string(),
            dimensions: 384,
            model_dir: String::new(),
        }
    }
}

/// Remote ChromaDB server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromaConfig {
    /// Base URL of the Chroma server.
    pub url: String,
    /// Tenant holding the database.
    pub tenant: String,
    /// Database holding the collection.
    pub database: String,
    /// Per-request timeout for calls to the Chroma server.
    pub timeout_secs: u64,
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000".to_string(),
            tenant: "default_tenant".to_string(),
            database: "default_database".to_string(),
            timeout_secs: 30,
        }
    }
}
