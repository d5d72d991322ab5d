//! Configuration management for the puppeteer client

pub mod file;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};
use file::PuppeteerConfigFile;

/// Default action queue host
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8082";

/// Accepted range for the blink half-duration, in seconds
const BLINK_SPEED_RANGE: (f32, f32) = (0.05, 1.0);

/// Puppeteer client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Action queue endpoints and polling cadence
    pub network: NetworkConfig,

    /// Blink, lip-sync and rig tuning
    pub avatar: AvatarConfig,

    /// Camera names; a camera's index is its position in this list
    pub cameras: Vec<String>,

    /// Text display configuration
    pub display: DisplayConfig,

    /// Frame loop rate in Hz
    pub frame_rate: u32,
}

/// Action queue configuration
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// `GET` endpoint returning pending actions
    pub get_url: String,

    /// `POST` endpoint marking an action as consumed
    pub delete_url: String,

    /// `GET` endpoint returning pending camera changes
    pub change_camera_url: String,

    /// Delay before the first poll cycle
    pub first_delay: Duration,

    /// Sleep between poll cycles
    pub interval: Duration,

    /// Timeout applied to every request
    pub timeout: Duration,

    /// Delete each action once dispatched
    pub auto_delete: bool,

    /// Skip ids already dispatched within this window (off when `None`)
    pub dedup_window: Option<Duration>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            get_url: format!("{DEFAULT_BASE_URL}/get_action_mapping"),
            delete_url: format!("{DEFAULT_BASE_URL}/delete_action_mapping"),
            change_camera_url: format!("{DEFAULT_BASE_URL}/add_camera_change"),
            first_delay: Duration::from_secs(2),
            interval: Duration::from_secs(3),
            timeout: Duration::from_secs(8),
            auto_delete: true,
            dedup_window: None,
        }
    }
}

/// Avatar rig configuration
#[derive(Debug, Clone)]
pub struct AvatarConfig {
    /// Seconds of inactivity before an idle blink
    pub idle_blink_delay: f32,

    /// Seconds for each half of a blink (close, then open)
    pub blink_speed: f32,

    /// Blend shape closing the eyes
    pub eyes_blend_shape: String,

    /// Blend shape opening the mouth
    pub mouth_blend_shape: String,

    /// Mouth oscillation rate in radians per second
    pub speak_rate: f32,

    /// Seconds of lip-sync played on start (0 disables)
    pub startup_speak: f32,

    /// Length of every headless animation clip in seconds
    pub clip_length: f32,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            idle_blink_delay: 5.0,
            blink_speed: 0.15,
            eyes_blend_shape: "闭眼".to_string(),
            mouth_blend_shape: "开口".to_string(),
            speak_rate: 8.0,
            startup_speak: 0.0,
            clip_length: 1.0,
        }
    }
}

/// Text display configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayConfig {
    /// Write action name, priority and group into the text slots
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            avatar: AvatarConfig::default(),
            cameras: vec!["main".to_string()],
            display: DisplayConfig::default(),
            frame_rate: 60,
        }
    }
}

impl Config {
    /// Load configuration (env > toml > default)
    ///
    /// Reads `path` when given, otherwise the standard config file location.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit config file cannot be read, or if the
    /// resulting configuration is invalid
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let fc = match path {
            Some(p) => file::load_config_file_from(p)?,
            None => file::load_config_file(),
        };

        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Merge a parsed config file with environment overrides
    ///
    /// `env` looks up a variable by name.
    ///
    /// # Errors
    ///
    /// Returns error if a URL is malformed or a duration is negative
    pub fn from_sources<F>(fc: PuppeteerConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let net = fc.network;

        let network = NetworkConfig {
            get_url: env("PUPPETEER_GET_URL")
                .or(net.get_url)
                .unwrap_or(defaults.network.get_url),
            delete_url: env("PUPPETEER_DELETE_URL")
                .or(net.delete_url)
                .unwrap_or(defaults.network.delete_url),
            change_camera_url: env("PUPPETEER_CAMERA_URL")
                .or(net.change_camera_url)
                .unwrap_or(defaults.network.change_camera_url),
            first_delay: net
                .first_delay
                .map(|s| seconds("network.first_delay", s))
                .transpose()?
                .unwrap_or(defaults.network.first_delay),
            interval: env_parse::<f64, _>(&env, "PUPPETEER_INTERVAL")
                .or(net.interval)
                .map(|s| seconds("network.interval", s))
                .transpose()?
                .unwrap_or(defaults.network.interval),
            timeout: env_parse::<u64, _>(&env, "PUPPETEER_TIMEOUT")
                .or(net.timeout)
                .map_or(defaults.network.timeout, Duration::from_secs),
            auto_delete: env_parse(&env, "PUPPETEER_AUTO_DELETE")
                .or(net.auto_delete)
                .unwrap_or(defaults.network.auto_delete),
            dedup_window: net
                .dedup_window
                .filter(|s| *s > 0.0)
                .map(|s| seconds("network.dedup_window", s))
                .transpose()?,
        };

        for url in [&network.get_url, &network.delete_url, &network.change_camera_url] {
            url::Url::parse(url)?;
        }

        if network.interval.is_zero() {
            return Err(Error::Config("network.interval must be positive".to_string()));
        }

        let av = fc.avatar;
        let avatar = AvatarConfig {
            idle_blink_delay: av
                .idle_blink_delay
                .unwrap_or(defaults.avatar.idle_blink_delay),
            blink_speed: clamp_blink_speed(av.blink_speed.unwrap_or(defaults.avatar.blink_speed)),
            eyes_blend_shape: av
                .eyes_blend_shape
                .unwrap_or(defaults.avatar.eyes_blend_shape),
            mouth_blend_shape: av
                .mouth_blend_shape
                .unwrap_or(defaults.avatar.mouth_blend_shape),
            speak_rate: av.speak_rate.unwrap_or(defaults.avatar.speak_rate),
            startup_speak: av.startup_speak.unwrap_or(defaults.avatar.startup_speak).max(0.0),
            clip_length: av.clip_length.unwrap_or(defaults.avatar.clip_length),
        };

        if avatar.clip_length <= 0.0 {
            return Err(Error::Config("avatar.clip_length must be positive".to_string()));
        }

        let frame_rate = fc.frame_rate.unwrap_or(defaults.frame_rate);
        if frame_rate == 0 {
            return Err(Error::Config("frame_rate must be positive".to_string()));
        }

        Ok(Self {
            network,
            avatar,
            cameras: fc.cameras.unwrap_or(defaults.cameras),
            display: DisplayConfig {
                enabled: fc.display.enabled.unwrap_or(defaults.display.enabled),
            },
            frame_rate,
        })
    }

    /// Duration of one frame at the configured frame rate
    #[must_use]
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate))
    }
}

/// Parse an environment override, ignoring malformed values
fn env_parse<T, F>(env: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = env(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring malformed environment override");
            None
        }
    }
}

fn seconds(field: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|e| Error::Config(format!("{field}: {e}")))
}

fn clamp_blink_speed(speed: f32) -> f32 {
    let (min, max) = BLINK_SPEED_RANGE;
    let clamped = speed.clamp(min, max);
    if (clamped - speed).abs() > f32::EPSILON {
        tracing::warn!(speed, clamped, "avatar.blink_speed out of range, clamped");
    }
    clamped
}
