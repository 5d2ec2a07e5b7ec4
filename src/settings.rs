//! Tool settings.
//!
//! Settings are loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML settings file (`--config`, `PCF7931_CONFIG`, or `~/.pcf7931.yaml`)
//! 3. Environment variables
//!
//! The `tag` section is written back whenever the tag configuration changes.

use pcf7931_client::serial::DEFAULT_BAUD_RATE;
use pcf7931_client::{ConnectionConfig, DeviceAddr, SerialConfig};
use pcf7931_core::TagConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Settings file used when none is named.
pub const DEFAULT_SETTINGS_FILE: &str = ".pcf7931.yaml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

/// Tool settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// How to reach the peripheral.
    pub device: DeviceSettings,
    /// Persisted tag configuration.
    pub tag: TagConfig,
}

impl Settings {
    /// Resolves the settings path: explicit path, then `PCF7931_CONFIG`, then
    /// the file in the home directory.
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var("PCF7931_CONFIG") {
            return Some(PathBuf::from(path));
        }
        home::home_dir().map(|home| home.join(DEFAULT_SETTINGS_FILE))
    }

    /// Loads settings from `path` (defaults if the file does not exist yet),
    /// then applies environment variable overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                tracing::debug!(path = %path.display(), "Settings file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Loads settings from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Saves settings to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Settings saved");
        Ok(())
    }

    /// Applies overrides looked up by variable name.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.device.apply_overrides(lookup);
    }
}

/// Peripheral settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// Serial port path.
    pub port: String,
    /// Serial baud rate.
    pub baud_rate: u32,
    /// TCP bridge address. Takes precedence over the serial port when set.
    pub tcp: Option<SocketAddr>,
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// READ acknowledgment timeout in milliseconds.
    pub ack_timeout_ms: u64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            port: default_port().to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            tcp: None,
            connect_timeout_secs: 5,
            ack_timeout_ms: 2500,
        }
    }
}

impl DeviceSettings {
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("PCF7931_PORT") {
            self.port = port;
        }

        if let Some(baud) = lookup("PCF7931_BAUD") {
            match baud.parse() {
                Ok(baud) => self.baud_rate = baud,
                Err(_) => tracing::warn!(value = %baud, "Ignoring invalid PCF7931_BAUD"),
            }
        }

        if let Some(addr) = lookup("PCF7931_TCP") {
            match addr.parse() {
                Ok(addr) => self.tcp = Some(addr),
                Err(_) => tracing::warn!(value = %addr, "Ignoring invalid PCF7931_TCP"),
            }
        }

        if let Some(timeout) = lookup("PCF7931_ACK_TIMEOUT_MS") {
            match timeout.parse() {
                Ok(ms) => self.ack_timeout_ms = ms,
                Err(_) => {
                    tracing::warn!(value = %timeout, "Ignoring invalid PCF7931_ACK_TIMEOUT_MS")
                }
            }
        }
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Builds the client connection configuration.
    pub fn connection_config(&self) -> ConnectionConfig {
        let device = match self.tcp {
            Some(addr) => DeviceAddr::Tcp(addr),
            None => DeviceAddr::Serial(
                SerialConfig::new(self.port.clone()).with_baud_rate(self.baud_rate),
            ),
        };
        ConnectionConfig::new(device)
            .with_connect_timeout(self.connect_timeout())
            .with_ack_timeout(self.ack_timeout())
    }
}

#[cfg(windows)]
fn default_port() -> &'static str {
    "COM3"
}

#[cfg(not(windows))]
fn default_port() -> &'static str {
    "/dev/ttyACM0"
}
