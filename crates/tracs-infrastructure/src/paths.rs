//! Unified path management for TRACS files.
//!
//! Configuration and the trader registry live under the platform config
//! directory; the append-heavy operation log lives under the platform
//! data directory.

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for TRACS.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/tracs/             # Config directory
/// ├── config.toml              # Application configuration
/// └── traders.toml             # Trader registry
///
/// ~/.local/share/tracs/        # Data directory
/// └── oplog/                   # Operation log, one JSONL file per actor
///     └── <actor_id>.jsonl
/// ```
pub struct TracsPaths;

impl TracsPaths {
    /// Returns the TRACS configuration directory.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("tracs"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the TRACS data directory.
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join("tracs"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the trader registry file.
    pub fn traders_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("traders.toml"))
    }

    /// Returns the directory holding per-actor operation log files.
    pub fn oplog_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("oplog"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_is_under_config_dir() {
        let config_file = TracsPaths::config_file().unwrap();
        assert!(config_file.ends_with("config.toml"));
        assert!(config_file.starts_with(TracsPaths::config_dir().unwrap()));
    }

    #[test]
    fn test_traders_file_is_under_config_dir() {
        let traders_file = TracsPaths::traders_file().unwrap();
        assert!(traders_file.ends_with("traders.toml"));
        assert!(traders_file.starts_with(TracsPaths::config_dir().unwrap()));
    }

    #[test]
    fn test_oplog_dir_is_under_data_dir() {
        let oplog_dir = TracsPaths::oplog_dir().unwrap();
        assert!(oplog_dir.ends_with("oplog"));
        assert!(oplog_dir.starts_with(TracsPaths::data_dir().unwrap()));
    }
}
