//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the uploader.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::ledger::types::{LedgerError, LedgerResult};

/// Root configuration for the uploader.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UploaderConfig {
    /// Gateway node to talk to.
    pub gateway: GatewayConfig,

    /// Wallet used to sign uploads.
    pub wallet: WalletConfig,

    /// Upload and confirmation behaviour.
    pub upload: UploadConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Gateway connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Gateway host name (e.g., "arweave.net").
    pub host: String,

    /// Gateway port.
    pub port: u16,

    /// URL scheme, "https" or "http".
    pub protocol: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "arweave.net".to_string(),
            port: 443,
            protocol: "https".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    /// Switch to plain HTTP on port 80.
    pub fn insecure(mut self) -> Self {
        self.protocol = "http".to_string();
        self.port = 80;
        self
    }

    /// Base URL of the gateway.
    pub fn base_url(&self) -> LedgerResult<Url> {
        let raw = format!("{}://{}:{}/", self.protocol, self.host, self.port);
        raw.parse().map_err(|e| LedgerError::Network {
            op: "build gateway url",
            reason: format!("invalid gateway url '{}': {}", raw, e),
        })
    }

    /// Public URL of an uploaded item.
    pub fn transaction_url(&self, id: &str) -> LedgerResult<Url> {
        self.base_url()?.join(id).map_err(|e| LedgerError::Network {
            op: "build transaction url",
            reason: e.to_string(),
        })
    }
}

/// Wallet settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WalletConfig {
    /// Path to the JWK wallet file. Without it only read-only commands work.
    pub path: Option<PathBuf>,
}

/// Upload behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Interval between confirmation polls in milliseconds.
    pub poll_interval_ms: u64,

    /// Give up waiting for confirmation after this many seconds.
    /// Unset means wait until cancelled.
    pub confirm_timeout_secs: Option<u64>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            confirm_timeout_secs: None,
        }
    }
}

impl UploadConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn confirm_timeout(&self) -> Option<Duration> {
        self.confirm_timeout_secs.map(Duration::from_secs)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Record upload counters through the metrics facade.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
        }
    }
}
