use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::debug;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Base URL of the remote processing service. Empty until the user
    /// sets it; an empty value is rejected at process time, not load time.
    #[serde(default)]
    pub base_url: String,
    /// Upload timeout in milliseconds. 0 disables the timeout.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    120_000
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_true")]
    pub autoplay: bool,
    /// Player binary: "auto" probes for mpv then ffplay.
    #[serde(default = "default_player")]
    pub player: String,
    /// Where downloaded replies are written before playback.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: String,
}

fn default_true() -> bool {
    true
}

fn default_player() -> String {
    "auto".to_string()
}

fn default_temp_dir() -> String {
    std::env::temp_dir()
        .join("voxloop")
        .to_string_lossy()
        .to_string()
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            player: default_player(),
            temp_dir: default_temp_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UiConfig {
    /// Print the step indicator while an upload is in flight.
    #[serde(default = "default_true")]
    pub show_steps: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { show_steps: true }
    }
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        Self::validate_config_path(path)?;

        if !path.exists() {
            debug!("Config file not found at {:?}, creating default", path);
            let config = Self::default();
            config.save(path).await?;
            return Ok(config);
        }

        let content = fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        use crate::error::VoxloopError;

        // A set base_url must at least look like an HTTP origin
        let url = self.backend.base_url.trim();
        if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(VoxloopError::Config(
                "base_url must start with http:// or https://".to_string(),
            )
            .into());
        }

        if self.backend.request_timeout_ms > 600_000 {
            return Err(VoxloopError::Config(
                "request_timeout_ms cannot exceed 600000ms".to_string(),
            )
            .into());
        }

        // Validate temp_dir doesn't contain path traversal
        if self.playback.temp_dir.contains("..") {
            return Err(VoxloopError::Config(
                "temp_dir cannot contain path traversal sequences".to_string(),
            )
            .into());
        }

        if self.playback.player.is_empty() {
            return Err(VoxloopError::Config(
                "player cannot be empty (use \"auto\" for detection)".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Validate that a config path is safe
    fn validate_config_path(path: &Path) -> Result<()> {
        use crate::error::VoxloopError;

        let path_str = path.to_string_lossy();
        if path_str.contains("..") {
            return Err(VoxloopError::Config(
                "Config path cannot contain path traversal sequences".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
