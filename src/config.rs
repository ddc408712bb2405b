//! Runtime settings, read from a JSON file next to the executable.
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use crate::console::DEFAULT_CONSOLE_LINES;
use crate::types::ConnectionMode;
pub const DEFAULT_CONFIG_PATH: &str = "serial_scope.json";
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub mode: ConnectionMode,
    /// Serial read timeout. Timeouts are retried; they only bound how long a disconnect takes.
    pub poll_interval_ms: u64,
    pub console_lines: usize,
    /// `None` keeps every captured sequence.
    pub max_retained_samples: Option<usize>,
    pub simulation_frame_ms: u64,
}
impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            port_name: "COM4".to_owned(),
            baud_rate: 9600,
            mode: ConnectionMode::Hardware,
            poll_interval_ms: 200,
            console_lines: DEFAULT_CONSOLE_LINES,
            max_retained_samples: None,
            simulation_frame_ms: 40,
        }
    }
}
impl MonitorConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid configuration JSON")
    }
    /// Missing file means defaults; an unreadable or malformed one is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::from_json(&text).with_context(|| format!("in {}", path.display()))?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn partial_json_keeps_defaults() {
        let config = MonitorConfig::from_json(r#"{"port_name":"/dev/ttyUSB0","mode":"Simulation"}"#).unwrap();
        assert_eq!(config.port_name, "/dev/ttyUSB0");
        assert_eq!(config.mode, ConnectionMode::Simulation);
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.console_lines, 100);
        assert_eq!(config.max_retained_samples, None);
    }
    #[test]
    fn retention_cap_parses() {
        let config = MonitorConfig::from_json(r#"{"max_retained_samples":4096}"#).unwrap();
        assert_eq!(config.max_retained_samples, Some(4096));
    }
    #[test]
    fn malformed_json_is_an_error() {
        assert!(MonitorConfig::from_json("{port_name:").is_err());
    }
    #[test]
    fn missing_file_gives_defaults() {
        let config = MonitorConfig::load_or_default("definitely/not/here.json").unwrap();
        assert_eq!(config, MonitorConfig::default());
    }
}
