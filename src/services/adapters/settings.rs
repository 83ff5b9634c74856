use std::fmt;
use std::path::{Path, PathBuf};

use crate::services::ports::FrameworkConfig;

const CONFIG_DIR: &str = "eduframe";
const CONFIG_FILE: &str = "config.json";
const LOG_DIR: &str = "logs";

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config io error: {}", e),
            ConfigError::Parse(e) => write!(f, "config parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

pub fn load_config(path: &Path) -> Result<FrameworkConfig, ConfigError> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Loads `path`, or the defaults when the file is missing or unreadable.
pub fn load_config_or_default(path: &Path) -> FrameworkConfig {
    match load_config(path) {
        Ok(config) => config,
        Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            FrameworkConfig::default()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "falling back to default config");
            FrameworkConfig::default()
        }
    }
}

pub fn ensure_config_file(path: &Path) -> Result<PathBuf, ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    if !path.exists() {
        let content = serde_json::to_string_pretty(&FrameworkConfig::default())?;
        std::fs::write(path, content)?;
    }
    Ok(path.to_path_buf())
}

/// Creates and returns the log directory: `configured` when given, else the
/// per-user config dir, else the system temp dir.
pub fn ensure_log_dir(configured: Option<&Path>) -> std::io::Result<PathBuf> {
    let dir = match configured {
        Some(dir) => dir.to_path_buf(),
        None => get_config_dir()
            .map(|dir| dir.join(CONFIG_DIR).join(LOG_DIR))
            .unwrap_or_else(|| std::env::temp_dir().join(CONFIG_DIR).join(LOG_DIR)),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        return std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join("Library/Application Support"));
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg));
        }
        return std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".config"));
    }

    #[cfg(target_os = "windows")]
    {
        return std::env::var("APPDATA").ok().map(PathBuf::from);
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/services/adapters/settings.rs"]
mod tests;
