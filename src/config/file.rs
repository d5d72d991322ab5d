//! TOML configuration file loading
//!
//! Supports `~/.config/puppeteer/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct PuppeteerConfigFile {
    /// Action queue endpoints and polling cadence
    #[serde(default)]
    pub network: NetworkFileConfig,

    /// Blink and lip-sync tuning
    #[serde(default)]
    pub avatar: AvatarFileConfig,

    /// Camera names, in index order
    #[serde(default)]
    pub cameras: Option<Vec<String>>,

    /// Text display toggle
    #[serde(default)]
    pub display: DisplayFileConfig,

    /// Frame loop rate in Hz
    #[serde(default)]
    pub frame_rate: Option<u32>,
}

/// Network configuration
#[derive(Debug, Default, Deserialize)]
pub struct NetworkFileConfig {
    pub get_url: Option<String>,
    pub delete_url: Option<String>,
    pub change_camera_url: Option<String>,

    /// Seconds before the first poll
    pub first_delay: Option<f64>,

    /// Seconds between poll cycles
    pub interval: Option<f64>,

    /// Request timeout in seconds
    pub timeout: Option<u64>,

    /// Delete each action after dispatch
    pub auto_delete: Option<bool>,

    /// Seconds during which a dispatched id is not dispatched again
    pub dedup_window: Option<f64>,
}

/// Avatar configuration
#[derive(Debug, Default, Deserialize)]
pub struct AvatarFileConfig {
    pub idle_blink_delay: Option<f32>,
    pub blink_speed: Option<f32>,
    pub eyes_blend_shape: Option<String>,
    pub mouth_blend_shape: Option<String>,
    pub speak_rate: Option<f32>,
    pub startup_speak: Option<f32>,

    /// Length of every headless animation clip in seconds
    pub clip_length: Option<f32>,
}

/// Display configuration
#[derive(Debug, Default, Deserialize)]
pub struct DisplayFileConfig {
    pub enabled: Option<bool>,
}

/// Load the TOML config file from the standard path
///
/// Returns `PuppeteerConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> PuppeteerConfigFile {
    let Some(path) = config_file_path() else {
        return PuppeteerConfigFile::default();
    };

    if !path.exists() {
        return PuppeteerConfigFile::default();
    }

    match load_config_file_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            PuppeteerConfigFile::default()
        }
    }
}

/// Load a TOML config file from an explicit path
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_config_file_from(path: &Path) -> Result<PuppeteerConfigFile> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Return the config file path: `~/.config/puppeteer/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("puppeteer").join("config.toml"))
}
