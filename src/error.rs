use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JenvizError {
    #[error("config file not found: {}", .0.display())]
    ConfigFileNotFound(PathBuf),

    #[error("profile '{profile}' not found in {}", .path.display())]
    ProfileNotFound { profile: String, path: PathBuf },

    #[error("key '{key}' missing from profile '{profile}'")]
    MissingProfileKey { key: String, profile: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Jenkins API error (status {status}) for {url}: {message}")]
    ApiError {
        status: u16,
        url: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rendering failed: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, JenvizError>;
