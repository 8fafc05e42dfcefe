use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption};
use log::debug;

use crate::error::{JenvizError, Result};

/// Connection settings for a Jenkins server.
///
/// Either assembled from command line flags or loaded by name from a
/// profile file (see [`resolve_profile`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Default location of the profile file: `~/.config/jenviz.ini`.
///
/// Falls back to a relative `.config/jenviz.ini` when no home directory is known.
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".config")
        .join("jenviz.ini")
}

/// Load a named profile from an INI file.
///
/// Each section of the file is a profile and must carry `url`, `user` and
/// `password`. Values are returned verbatim; quotes and backslashes are not
/// interpreted.
///
/// # Errors
///
/// Returns a configuration error if:
/// - the file does not exist or cannot be parsed
/// - the profile section is absent
/// - any of the required keys is missing from the section
pub fn resolve_profile(config_path: &Path, profile_name: &str) -> Result<ConnectionProfile> {
    if !config_path.exists() {
        return Err(JenvizError::ConfigFileNotFound(config_path.to_path_buf()));
    }

    let options = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    };
    let ini = Ini::load_from_file_opt(config_path, options).map_err(|e| {
        JenvizError::Config(format!("failed to parse {}: {e}", config_path.display()))
    })?;

    let section = ini
        .section(Some(profile_name))
        .ok_or_else(|| JenvizError::ProfileNotFound {
            profile: profile_name.to_string(),
            path: config_path.to_path_buf(),
        })?;

    let require = |key: &str| {
        section
            .get(key)
            .map(str::to_string)
            .ok_or_else(|| JenvizError::MissingProfileKey {
                key: key.to_string(),
                profile: profile_name.to_string(),
            })
    };

    let url = require("url")?;
    let user = require("user")?;
    let password = require("password")?;

    debug!("Loaded profile '{profile_name}' from {}", config_path.display());

    Ok(ConnectionProfile {
        url,
        user: Some(user),
        password: Some(password),
    })
}
