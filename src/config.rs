use crate::error::{Result, SyncError};
use crate::types::RECEIVER_MAX_VOLUME;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Full runtime configuration, read once at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub receiver: ReceiverConfig,
    pub sync: SyncConfig,
}

/// Sony Bravia TV connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Service root, e.g. `http://192.168.20.20/sony/`
    pub base_url: String,
    /// Pre-shared key configured on the TV
    pub psk: String,
    pub request_timeout_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://192.168.20.20/sony/".to_string(),
            psk: String::new(),
            request_timeout_ms: 5_000,
        }
    }
}

/// Denon receiver connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReceiverConfig {
    /// `host:port` of the control port
    pub address: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            address: "192.168.20.18:23".to_string(),
            connect_timeout_ms: 1_000,
            read_timeout_ms: 1_000,
        }
    }
}

/// What to do when the receiver's power query fails at the transport level
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnreachablePolicy {
    /// Stop the loop and exit the process
    #[default]
    Exit,
    /// Back off and try again like any other failure
    Retry,
}

/// Loop timing and reconciliation policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Delay before every iteration
    pub poll_interval_ms: u64,
    /// Extra delay after a TV failure or when the TV is off
    pub display_retry_ms: u64,
    /// Extra delay after a receiver failure or when the receiver is off
    pub receiver_retry_ms: u64,
    /// Ceiling applied to the TV volume before it is sent to the receiver
    pub max_volume: u8,
    pub on_receiver_unreachable: UnreachablePolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            display_retry_ms: 10_000,
            receiver_retry_ms: 1_000,
            max_volume: 40,
            on_receiver_unreachable: UnreachablePolicy::Exit,
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn display_retry(&self) -> Duration {
        Duration::from_millis(self.display_retry_ms)
    }

    pub fn receiver_retry(&self) -> Duration {
        Duration::from_millis(self.receiver_retry_ms)
    }
}

impl Config {
    /// Load a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Apply `BRAVIA_URL`, `BRAVIA_PSK`, `DENON_ADDR` and `SYNC_MAX_VOLUME`
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("BRAVIA_URL") {
            self.display.base_url = url;
        }
        if let Some(psk) = lookup("BRAVIA_PSK") {
            self.display.psk = psk;
        }
        if let Some(address) = lookup("DENON_ADDR") {
            self.receiver.address = address;
        }
        if let Some(max) = lookup("SYNC_MAX_VOLUME") {
            self.sync.max_volume = max
                .parse()
                .map_err(|_| SyncError::Config(format!("SYNC_MAX_VOLUME is not a volume: {}", max)))?;
        }
        Ok(())
    }

    /// Check values that would otherwise fail later at runtime
    pub fn validate(&self) -> Result<()> {
        if self.display.base_url.is_empty() {
            return Err(SyncError::Config("display.base_url is empty".to_string()));
        }
        if self.display.psk.is_empty() {
            return Err(SyncError::Config("display.psk is empty".to_string()));
        }
        if self.receiver.address.is_empty() {
            return Err(SyncError::Config("receiver.address is empty".to_string()));
        }
        if self.sync.max_volume > RECEIVER_MAX_VOLUME {
            return Err(SyncError::Config(format!(
                "sync.max_volume {} exceeds receiver limit {}",
                self.sync.max_volume, RECEIVER_MAX_VOLUME
            )));
        }
        for (name, value) in [
            ("display.request_timeout_ms", self.display.request_timeout_ms),
            ("receiver.connect_timeout_ms", self.receiver.connect_timeout_ms),
            ("receiver.read_timeout_ms", self.receiver.read_timeout_ms),
            ("sync.poll_interval_ms", self.sync.poll_interval_ms),
        ] {
            if value == 0 {
                return Err(SyncError::Config(format!("{} must be non-zero", name)));
            }
        }
        Ok(())
    }
}
