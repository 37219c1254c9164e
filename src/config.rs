//! Client configuration: backend URL, timeouts and the data directory

use crate::presenter::GRACE_PERIOD;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://godwa-backend-my11.onrender.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_API_URL: &str = "GODWA_API_URL";
pub const ENV_DATA_DIR: &str = "GODWA_DATA_DIR";
pub const ENV_REQUEST_TIMEOUT: &str = "GODWA_REQUEST_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    /// How long a tooltip shows "loading" before falling back to not found.
    pub grace_period: Duration,
    pub data_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            grace_period: GRACE_PERIOD,
            data_dir: get_data_dir(),
        }
    }
}

impl ClientConfig {
    /// Defaults with `GODWA_*` environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable source. Invalid values are logged and skipped.
    pub fn with_overrides<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self = self.with_api_url(&url);
        }
        if let Some(dir) = var(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = var(ENV_REQUEST_TIMEOUT) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %raw, "ignoring invalid {}", ENV_REQUEST_TIMEOUT),
            }
        }
        self
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_base_url = url.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn settings_db_path(&self) -> PathBuf {
        self.data_dir.join("settings.db")
    }
}

/// Get the data directory
///
/// Platform data dir (`~/.local/share/Godwa`, `~/Library/Application Support/Godwa`,
/// `%APPDATA%\Godwa`), falling back to `./data`.
pub fn get_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("Godwa");
    }
    PathBuf::from("data")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.grace_period, Duration::from_millis(3000));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.settings_db_path().ends_with("settings.db"));
    }

    #[test]
    fn test_overrides() {
        let env = vars(&[
            (ENV_API_URL, "http://localhost:8000/"),
            (ENV_DATA_DIR, "/tmp/godwa"),
            (ENV_REQUEST_TIMEOUT, "5"),
        ]);
        let config = ClientConfig::default().with_overrides(|k| env.get(k).cloned());
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/godwa"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_timeout_is_ignored() {
        let env = vars(&[(ENV_REQUEST_TIMEOUT, "soon")]);
        let config = ClientConfig::default().with_overrides(|k| env.get(k).cloned());
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }
}
