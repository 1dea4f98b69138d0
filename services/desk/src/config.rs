//! services/desk/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use study_desk_core::StoreConfig;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where collections are persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    /// One JSON file per key under `data_dir`.
    File,
    /// Nothing survives the process; handy for demos.
    Memory,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(StorageKind::File),
            "memory" => Ok(StorageKind::Memory),
            other => Err(format!("'{}' is not one of: file, memory", other)),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub data_dir: PathBuf,
    pub storage: StorageKind,
    pub log_level: Level,
    pub auth_delay: Duration,
    pub channel_capacity: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so it can be exercised
    /// without touching the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = lookup("STUDY_DESK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./study-desk-data"));

        let storage = parse_or(&lookup, "STUDY_DESK_STORAGE", StorageKind::File)?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let auth_delay_ms: u64 = parse_or(&lookup, "STUDY_DESK_AUTH_DELAY_MS", 500)?;
        let channel_capacity: usize = parse_or(&lookup, "STUDY_DESK_CHANNEL_CAPACITY", 64)?;
        if channel_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "STUDY_DESK_CHANNEL_CAPACITY".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            data_dir,
            storage,
            log_level,
            auth_delay: Duration::from_millis(auth_delay_ms),
            channel_capacity,
        })
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            auth_delay: self.auth_delay,
            channel_capacity: self.channel_capacity,
        }
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("./study-desk-data"));
        assert_eq!(config.storage, StorageKind::File);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.auth_delay, Duration::from_millis(500));
        assert_eq!(config.channel_capacity, 64);
    }

    #[test]
    fn values_are_read_from_the_environment() {
        let config = Config::from_lookup(lookup_from(&[
            ("STUDY_DESK_DATA_DIR", "/tmp/desk"),
            ("STUDY_DESK_STORAGE", "Memory"),
            ("RUST_LOG", "debug"),
            ("STUDY_DESK_AUTH_DELAY_MS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/desk"));
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.store_config().auth_delay, Duration::ZERO);
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = Config::from_lookup(lookup_from(&[("STUDY_DESK_AUTH_DELAY_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key, _) if key == "STUDY_DESK_AUTH_DELAY_MS"));

        let err = Config::from_lookup(lookup_from(&[("STUDY_DESK_STORAGE", "cloud")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key, _) if key == "STUDY_DESK_STORAGE"));

        let err = Config::from_lookup(lookup_from(&[("STUDY_DESK_CHANNEL_CAPACITY", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(..)));
    }
}
