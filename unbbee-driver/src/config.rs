//! Session configuration
//!
//! Timeouts are in milliseconds. The defaults match the TD120x datasheet
//! figures with some margin: local commands answer within a few seconds,
//! over-the-air transmission is confirmed within twenty.

use unbbee_hal::SerialConfig;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default time to wait for `OK` after a plain command
pub const DEFAULT_OK_TIMEOUT_MS: u32 = unbbee_protocol::DEFAULT_OK_TIMEOUT_MS;

/// Default deadline for the identity query
pub const DEFAULT_IDENTITY_TIMEOUT_MS: u32 = 2000;

/// Default time to wait for transmission to be confirmed
pub const DEFAULT_PAYLOAD_TIMEOUT_MS: u32 = 20_000;

/// Session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SessionConfig {
    /// Wait for `OK` after a command, also after a captured value
    pub ok_timeout_ms: u32,
    /// Total deadline of the identity query
    pub identity_timeout_ms: u32,
    /// Wait for `OK` after a payload transmission
    pub payload_timeout_ms: u32,
    /// Line settings the channel should be opened with
    pub serial: SerialConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ok_timeout_ms: DEFAULT_OK_TIMEOUT_MS,
            identity_timeout_ms: DEFAULT_IDENTITY_TIMEOUT_MS,
            payload_timeout_ms: DEFAULT_PAYLOAD_TIMEOUT_MS,
            serial: SerialConfig::default(),
        }
    }
}
