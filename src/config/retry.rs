//! Retry and wake configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy shared by every readiness check and command.
///
/// Units retry at a fixed interval until they succeed. The optional timeout
/// bounds each phase; without it a unit that never succeeds waits forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Pause between attempts in milliseconds.
    pub interval_ms: u64,

    /// Give up on a phase after this many seconds.
    pub timeout_seconds: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            timeout_seconds: None,
        }
    }
}

impl RetryConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

/// Magic packet destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WakeConfig {
    /// Broadcast address.
    pub broadcast: String,

    /// UDP port (7 and 9 are the usual choices).
    pub port: u16,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            broadcast: "255.255.255.255".to_string(),
            port: 9,
        }
    }
}
