use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 6789;
pub const DEFAULT_BATCH_SIZE: usize = 32;
pub const DEFAULT_TRAINING_INTERVAL: u64 = 50; // telemetry frames between replays
pub const DEFAULT_RESTART_DELAY_MS: u64 = 5000;

/// Runtime knobs of the server. Learning hyperparameters live with the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub batch_size: usize,
    pub training_interval: u64,
    pub restart_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            batch_size: DEFAULT_BATCH_SIZE,
            training_interval: DEFAULT_TRAINING_INTERVAL,
            restart_delay_ms: DEFAULT_RESTART_DELAY_MS,
        }
    }
}

impl Config {
    /// Reads a JSON config file; missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.listen_addr(), "localhost:6789");
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.training_interval, 50);
        assert_eq!(config.restart_delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: Config = serde_json::from_str(r#"{"port": 9000, "restart_delay_ms": 250}"#).unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.restart_delay(), Duration::from_millis(250));
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("dodgers-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"host": "0.0.0.0", "training_interval": 10}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.listen_addr(), "0.0.0.0:6789");
        assert_eq!(config.training_interval, 10);
    }

    #[test]
    fn test_from_missing_file() {
        assert!(Config::from_file("/nonexistent/dodgers.json").is_err());
    }
}
