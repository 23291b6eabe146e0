//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `monitor.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - BackendConfig: where the sensor and parking backends live, request timeout.
//!     - SensorsConfig: how many `/sensor/{i}/distance` endpoints to poll.
//!     - PollingConfig: page-level refresh cadence.
//!     - AlertsConfig: alert monitor cadence, drop threshold, list capacity.
//!     - ServerConfig: where the JSON view model is served.
//!     - LoggingConfig: default log level.
//!
//! ==============================================================================

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::baseline_sensors;

/// environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "PARKING_MONITOR_CONFIG";

/// where the effective configuration came from
#[derive(Debug)]
pub enum ConfigSource {
    File { path: PathBuf, rejected: Vec<(PathBuf, String)> },
    Defaults { rejected: Vec<(PathBuf, String)> },
}

impl ConfigSource {
    pub fn log(&self) {
        let rejected = match self {
            ConfigSource::File { rejected, .. } | ConfigSource::Defaults { rejected } => rejected,
        };
        for (path, reason) in rejected {
            warn!("[CONFIG] Failed to load {}: {}", path.display(), reason);
        }
        match self {
            ConfigSource::File { path, .. } => info!("[CONFIG] Loaded from {}", path.display()),
            ConfigSource::Defaults { .. } => warn!("[CONFIG] No config file found - using defaults"),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct MonitorConfig {
    pub backend: BackendConfig,
    pub sensors: SensorsConfig,
    pub polling: PollingConfig,
    pub alerts: AlertsConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BackendConfig {
    /// io backend serving `/sensor`, `/led`, `/gate`, `/bell`, `/status`
    pub sensor_api_url: String,
    /// parking backend serving `/status` and `/api/parking_spots`
    pub parking_api_url: String,
    pub request_timeout_ms: u64,
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            sensor_api_url: "http://localhost:8000".to_string(),
            parking_api_url: "http://localhost:5000".to_string(),
            request_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SensorsConfig {
    pub count: usize,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self { count: 4 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollingConfig {
    pub refresh_interval_seconds: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { refresh_interval_seconds: 5 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AlertsConfig {
    pub poll_interval_seconds: u64,
    /// minimum drop between consecutive readings that raises an alert
    pub threshold_cm: f64,
    /// most recent alerts kept
    pub capacity: usize,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 3,
            threshold_cm: 30.0,
            capacity: 20,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0:3000".to_string() }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub show_sensor_data: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_sensor_data: true,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        Self::parse(&content)
    }

    /// Parse configuration from toml text
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: MonitorConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;

        let known = baseline_sensors().len();
        if config.sensors.count == 0 || config.sensors.count > known {
            anyhow::bail!("sensors.count must be between 1 and {}", known);
        }
        let threshold = config.alerts.threshold_cm;
        if !threshold.is_finite() || threshold <= 0.0 {
            anyhow::bail!("alerts.threshold_cm must be a positive number, got {}", threshold);
        }
        if config.alerts.capacity == 0 {
            anyhow::bail!("alerts.capacity must be at least 1");
        }

        Ok(config)
    }

    /// Find the config file, falling back to defaults
    ///
    /// nothing is logged here so the result can seed the log level;
    /// call [`ConfigSource::log`] once tracing is up.
    pub fn discover() -> (Self, ConfigSource) {
        let mut paths: Vec<PathBuf> = Vec::new();
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(explicit));
        }
        paths.push(PathBuf::from("config").join("monitor.toml"));
        paths.push(PathBuf::from("..").join("config").join("monitor.toml"));

        let mut rejected = Vec::new();
        for path in paths {
            if path.exists() {
                match Self::load(&path) {
                    Ok(config) => return (config, ConfigSource::File { path, rejected }),
                    Err(e) => rejected.push((path, e.to_string())),
                }
            }
        }

        (Self::default(), ConfigSource::Defaults { rejected })
    }

    /// Log configuration summary
    pub fn print_summary(&self) {
        info!("sensor backend:  {}", self.backend.sensor_api_url);
        info!("parking backend: {}", self.backend.parking_api_url);
        info!("request timeout: {}ms", self.backend.request_timeout_ms);
        info!("sensors:         {}", self.sensors.count);
        info!("refresh every:   {}s", self.polling.refresh_interval_seconds);
        info!(
            "alerts every:    {}s (drop >= {}cm, keep {})",
            self.alerts.poll_interval_seconds, self.alerts.threshold_cm, self.alerts.capacity
        );
        info!("api bind:        {}", self.server.bind);
    }
}
