//! Explorer configuration.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tokio::time::Duration;

/// Explorer configuration. Every field has a default, so partial JSON files are valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Base URL of the pull API (`/blocks`, `/nodes`, `/block/{hash}`).
    pub api_url: String,
    /// WebSocket URL of the push stream.
    pub ws_url: String,
    /// Entries requested per pull.
    pub page_size: usize,
    /// Entries materialized before the first reveal.
    pub initial_display: usize,
    /// Entries added per reveal.
    pub display_increment: usize,
    /// Head re-pull and node poll period.
    pub poll_interval_ms: u64,
    /// How long a finalization event stays highlighted.
    pub highlight_ms: u64,
    /// Period of the expired-event sweep.
    pub sweep_interval_ms: u64,
    /// Per-request HTTP timeout.
    pub request_timeout_ms: u64,
    pub reconnection: ReconnectionConfig,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3001".into(),
            ws_url: "ws://localhost:3001/ws".into(),
            page_size: 20,
            initial_display: 50,
            display_increment: 20,
            poll_interval_ms: 1_000,
            highlight_ms: 2_000,
            sweep_interval_ms: 500,
            request_timeout_ms: 5_000,
            reconnection: ReconnectionConfig::default(),
        }
    }
}

impl ExplorerConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn highlight(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Push-stream reconnection: fixed delay, optional random jitter on top.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconnectionConfig {
    pub delay_ms: u64,
    pub jitter_ms: u64,
}

impl Default for ReconnectionConfig {
    fn default() -> Self {
        Self {
            delay_ms: 3_000,
            jitter_ms: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse config: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconnection_config_default() {
        let c = ReconnectionConfig::default();
        assert_eq!(c.delay_ms, 3_000);
        assert_eq!(c.jitter_ms, 0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = ExplorerConfig::from_json_str(
            r#"{"api_url": "http://explorer:9000", "page_size": 25, "reconnection": {"jitter_ms": 250}}"#,
        )
        .unwrap();
        assert_eq!(c.api_url, "http://explorer:9000");
        assert_eq!(c.page_size, 25);
        assert_eq!(c.initial_display, 50);
        assert_eq!(c.reconnection.delay_ms, 3_000);
        assert_eq!(c.reconnection.jitter_ms, 250);
        assert_eq!(c.highlight(), Duration::from_secs(2));
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(matches!(
            ExplorerConfig::from_json_str("{"),
            Err(ConfigError::Json(_))
        ));
    }
}
