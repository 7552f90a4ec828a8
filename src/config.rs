use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ArchiveConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub curator: CuratorConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

/// Which backend holds the three collections.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// One JSON array document per collection, replaced atomically on append.
    Json,
    /// One SQLite file per collection.
    Sqlite,
    /// Process-local, lost on exit.
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            _ => Err(format!("unknown storage backend: {s}")),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub dimensions: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Interactive search keeps only results strictly above this.
    pub resonance_threshold: f64,
    pub max_results: usize,
    pub lineage_threshold: f64,
    pub lineage_max_results: usize,
    /// Re-embed an entry's content on trace instead of reusing the stored vector.
    pub reembed_on_trace: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CuratorConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub related_threshold: f64,
    pub related_limit: usize,
    pub tick_timeout_secs: u64,
    pub reembed: bool,
    /// Fixed RNG seed for reproducible sampling. Entropy-seeded when unset.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3001,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = default_resonance_dir()
            .join("data")
            .to_string_lossy()
            .into_owned();
        Self {
            backend: StorageBackend::Json,
            data_dir,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            model: "text-embedding-ada-002".into(),
            base_url: "https://api.openai.com/v1".into(),
            api_key: None,
            dimensions: 1536,
            timeout_secs: 30,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            resonance_threshold: 0.7,
            max_results: 5,
            lineage_threshold: 0.65,
            lineage_max_results: 20,
            reembed_on_trace: true,
        }
    }
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 15 * 60,
            related_threshold: 0.7,
            related_limit: 5,
            tick_timeout_secs: 120,
            reembed: true,
            seed: None,
        }
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl CuratorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn tick_timeout(&self) -> Duration {
        Duration::from_secs(self.tick_timeout_secs.max(1))
    }
}

/// Returns `~/.resonance/`
pub fn default_resonance_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".resonance")
}

/// Returns the default config file path: `~/.resonance/config.toml`
pub fn default_config_path() -> PathBuf {
    default_resonance_dir().join("config.toml")
}

impl ArchiveConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            ArchiveConfig::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// `RESONANCE_DATA_DIR` (or the legacy `DATA_DIR`), `RESONANCE_BACKEND`,
    /// `RESONANCE_LOG_LEVEL`, `RESONANCE_PORT`, `OPENAI_API_KEY`.
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("RESONANCE_DATA_DIR").or_else(|_| std::env::var("DATA_DIR")) {
            self.storage.data_dir = val;
        }
        if let Ok(val) = std::env::var("RESONANCE_BACKEND") {
            self.storage.backend = val.parse().map_err(anyhow::Error::msg)?;
        }
        if let Ok(val) = std::env::var("RESONANCE_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("RESONANCE_PORT") {
            self.server.port = val
                .parse()
                .with_context(|| format!("invalid RESONANCE_PORT: {val}"))?;
        }
        if let Ok(val) = std::env::var("OPENAI_API_KEY") {
            if self.embedding.api_key.is_none() {
                self.embedding.api_key = Some(val);
            }
        }
        Ok(())
    }

    /// Resolve the data directory, expanding `~` if needed.
    pub fn resolved_data_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.data_dir)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
