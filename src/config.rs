use std::path::PathBuf;
use std::time::Duration;

use log::warn;

/// Overrides the data directory.
pub const DATA_DIR_VAR: &str = "TASKFLOW_DB";
/// Simulated latency, in milliseconds, before each service call.
pub const LATENCY_VAR: &str = "TASKFLOW_LATENCY_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding `tasks.json` and `categories.json`.
    pub data_dir: PathBuf,
    pub latency: Duration,
}

impl Config {
    /// Resolves configuration from the environment.
    ///
    /// The data directory is determined in the following order:
    /// 1. `TASKFLOW_DB` environment variable.
    /// 2. `~/.local/share/taskflow` (on Linux).
    /// 3. `.` (fallback).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup(DATA_DIR_VAR).map(PathBuf::from).unwrap_or_else(default_data_dir);
        let latency = lookup(LATENCY_VAR)
            .and_then(|raw| match raw.trim().parse::<u64>() {
                Ok(ms) => Some(Duration::from_millis(ms)),
                Err(_) => {
                    warn!("ignoring {LATENCY_VAR}={raw:?}: not a whole number of milliseconds");
                    None
                }
            })
            .unwrap_or(Duration::ZERO);
        Self { data_dir, latency }
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join("taskflow"))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_data_dir_and_latency() {
        let config = Config::from_lookup(lookup(&[(DATA_DIR_VAR, "/tmp/tf"), (LATENCY_VAR, "250")]));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/tf"));
        assert_eq!(config.latency, Duration::from_millis(250));
    }

    #[test]
    fn defaults_without_env() {
        let config = Config::from_lookup(lookup(&[]));
        assert!(config.data_dir.ends_with("taskflow") || config.data_dir == PathBuf::from("."));
        assert_eq!(config.latency, Duration::ZERO);
    }

    #[test]
    fn bad_latency_is_ignored() {
        let config = Config::from_lookup(lookup(&[(LATENCY_VAR, "fast")]));
        assert_eq!(config.latency, Duration::ZERO);
    }
}
