//! Runtime configuration read from `EVENTDESK_*` environment variables.
//!
//! # Invariants
//! - Unset variables fall back to defaults; set-but-invalid values are errors.
//! - Blank values count as unset.

use crate::logging::{default_log_level, normalize_level};
use crate::repo::AggregateStrategy;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "EVENTDESK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "EVENTDESK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "EVENTDESK_LOG_DIR";
pub const ENV_AGGREGATE: &str = "EVENTDESK_AGGREGATE";

/// Settings needed to open the store and build the services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite file; `None` selects an in-memory store.
    pub db_path: Option<PathBuf>,
    pub log_level: &'static str,
    /// Absolute log directory; `None` leaves file logging off.
    pub log_dir: Option<PathBuf>,
    pub aggregate_strategy: AggregateStrategy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level(),
            log_dir: None,
            aggregate_strategy: AggregateStrategy::default(),
        }
    }
}

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: &'static str,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}=`{}`: {}", self.key, self.value, self.reason)
    }
}

impl Error for ConfigError {}

impl CoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        config.db_path = read(ENV_DB_PATH).map(PathBuf::from);

        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = normalize_level(&level).map_err(|_| ConfigError {
                key: ENV_LOG_LEVEL,
                value: level.clone(),
                reason: "expected trace|debug|info|warn|error",
            })?;
        }

        if let Some(dir) = read(ENV_LOG_DIR) {
            let path = PathBuf::from(&dir);
            if !path.is_absolute() {
                return Err(ConfigError {
                    key: ENV_LOG_DIR,
                    value: dir,
                    reason: "must be an absolute path",
                });
            }
            config.log_dir = Some(path);
        }

        if let Some(strategy) = read(ENV_AGGREGATE) {
            config.aggregate_strategy =
                AggregateStrategy::parse(&strategy).ok_or(ConfigError {
                    key: ENV_AGGREGATE,
                    value: strategy.clone(),
                    reason: "expected per_item|joined",
                })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, ENV_AGGREGATE, ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL};
    use crate::repo::AggregateStrategy;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = CoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.aggregate_strategy, AggregateStrategy::PerItem);
        assert!(config.db_path.is_none());
    }

    #[test]
    fn all_values_are_read() {
        let config = CoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/var/lib/eventdesk/events.db"),
            (ENV_LOG_LEVEL, "WARN"),
            (ENV_LOG_DIR, "/var/log/eventdesk"),
            (ENV_AGGREGATE, "joined"),
        ]))
        .unwrap();
        assert_eq!(
            config.db_path,
            Some(PathBuf::from("/var/lib/eventdesk/events.db"))
        );
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/eventdesk")));
        assert_eq!(config.aggregate_strategy, AggregateStrategy::Joined);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config =
            CoreConfig::from_lookup(lookup(&[(ENV_DB_PATH, "  "), (ENV_AGGREGATE, "")])).unwrap();
        assert!(config.db_path.is_none());
        assert_eq!(config.aggregate_strategy, AggregateStrategy::PerItem);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = CoreConfig::from_lookup(lookup(&[(ENV_AGGREGATE, "batched")])).unwrap_err();
        assert_eq!(err.key, ENV_AGGREGATE);
        assert!(err.to_string().contains("batched"));

        let err = CoreConfig::from_lookup(lookup(&[(ENV_LOG_DIR, "logs")])).unwrap_err();
        assert_eq!(err.key, ENV_LOG_DIR);

        let err = CoreConfig::from_lookup(lookup(&[(ENV_LOG_LEVEL, "loud")])).unwrap_err();
        assert_eq!(err.key, ENV_LOG_LEVEL);
    }
}
