use anyhow::Context;
use motion::{SupervisorConfig, TrackingConfig};
use network::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub tracking: TrackingConfig,
    pub supervisor: SupervisorConfig,
    pub storage: StorageConfig,
    pub simulation: SimulationConfig,
    pub location: LocationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub url: String,
    pub request_timeout_s: u64,
    pub max_attempts: u32,
    pub retry_pause_s: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            url: "http://192.168.1.10".to_string(),
            request_timeout_s: policy.timeout.as_secs(),
            max_attempts: policy.max_attempts,
            retry_pause_s: policy.pause.as_secs(),
        }
    }
}

impl GatewayConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            pause: Duration::from_secs(self.retry_pause_s),
            timeout: Duration::from_secs(self.request_timeout_s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where the annotated debug view is written
    pub debug_dir: PathBuf,
    /// Episode snapshots are only kept when set
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            debug_dir: PathBuf::from("debug"),
            snapshot_dir: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationMode {
    #[default]
    None,
    Record,
    Replay,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub mode: SimulationMode,
    pub replay_folder: PathBuf,
    pub record_folder: PathBuf,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            mode: SimulationMode::None,
            replay_folder: PathBuf::from("capture_replay"),
            record_folder: PathBuf::from("capture"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub timezone_offset_hours: i32,
}

impl Config {
    /// Loads `path`, or `config.toml` when no path is given.
    ///
    /// Without a `config.toml` the embedded example is used; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path, true),
            None => (Path::new("config.toml"), false),
        };

        if explicit || path.exists() {
            let config_content = fs::read_to_string(path)
                .with_context(|| format!("reading configuration {}", path.display()))?;
            let config = Self::parse(&config_content)
                .with_context(|| format!("parsing configuration {}", path.display()))?;
            log::info!("Loaded configuration from {}", path.display());
            Ok(config)
        } else {
            // Fallback to embedded defaults
            let config = Self::parse(include_str!("../config.toml.example"))?;
            log::warn!("Using embedded default configuration");
            Ok(config)
        }
    }

    pub fn parse(config_content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(config_content)?)
    }
}

// Helper functions for easy access
impl Config {
    pub fn get_gateway_url(&self) -> &str {
        &self.gateway.url
    }

    pub fn get_timezone_offset(&self) -> i32 {
        self.location.timezone_offset_hours
    }
}
