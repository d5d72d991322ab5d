//! Error types for the puppeteer client

use thiserror::Error;

/// Result type alias for puppeteer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while polling and driving the avatar
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio decode or playback error
    #[error("audio error: {0}")]
    Audio(String),

    /// Response body could not be understood
    #[error("decode error: {0}")]
    Decode(String),

    /// Camera index could not be resolved
    #[error("camera error: {0}")]
    Camera(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid endpoint URL
    #[error("url error: {0}")]
    Url(#[from] url::ParseError),
}
