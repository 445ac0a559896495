//! Configuration for the tracking core

use serde::{Deserialize, Serialize};

/// Main tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Session defaults
    #[serde(default)]
    pub session: SessionConfig,

    /// Permission protocol configuration
    #[serde(default)]
    pub permission: PermissionConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            permission: PermissionConfig::default(),
        }
    }
}

/// Defaults used when a caller starts tracking without picking a strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Polling interval for interval-based strategies, milliseconds
    #[serde(default = "default_interval_ms")]
    pub default_interval_ms: u64,

    /// Accuracy tier (1-5) for iOS strategies
    #[serde(default = "default_accuracy_tier")]
    pub default_accuracy_tier: u8,
}

fn default_interval_ms() -> u64 {
    5000
}
fn default_accuracy_tier() -> u8 {
    3
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_interval_ms: 5000,
            default_accuracy_tier: 3,
        }
    }
}

/// Permission request protocol configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionConfig {
    /// Upper bound on each wait for a permission state, milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    60_000
}

impl Default for PermissionConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 60_000,
        }
    }
}
