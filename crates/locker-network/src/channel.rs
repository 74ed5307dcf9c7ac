//! Line-oriented link contract and its configuration.

use locker_core::constants::{DEFAULT_LISTEN_ADDR, DEVICE_NAME, LINK_CONNECT_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delay between client-role connection attempts.
pub const DEFAULT_RECONNECT_INTERVAL_MS: u64 = 2_000;

/// Best-effort, non-blocking, line-oriented transport to the peer.
///
/// None of the methods may block. Transport failures are reported only
/// through [`is_connected`](LinkChannel::is_connected) and the boolean
/// result of [`send_line`](LinkChannel::send_line).
pub trait LinkChannel {
    /// Whether the transport is currently up.
    ///
    /// Re-checked on every call; a peer that went away must be reported
    /// as disconnected the next time this is asked.
    fn is_connected(&mut self) -> bool;

    /// Queue `text` followed by the line terminator.
    ///
    /// Returns `false` without sending anything if the link is down or the
    /// text cannot be framed. Does not wait for acknowledgement.
    fn send_line(&mut self, text: &str) -> bool;

    /// Take at most one complete line.
    ///
    /// Drains whatever bytes the transport has buffered; a partial line is
    /// kept for later calls and further complete lines stay queued.
    fn receive_line(&mut self) -> Option<String>;
}

impl<T: LinkChannel + ?Sized> LinkChannel for &mut T {
    fn is_connected(&mut self) -> bool {
        (**self).is_connected()
    }

    fn send_line(&mut self, text: &str) -> bool {
        (**self).send_line(text)
    }

    fn receive_line(&mut self) -> Option<String> {
        (**self).receive_line()
    }
}

/// Which side opens the connection. Fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LinkRole {
    /// Listen and accept the peer, as the serial-profile server does.
    Server { bind: String },

    /// Connect out to the peer.
    Client { peer: String },
}

impl LinkRole {
    pub fn address(&self) -> &str {
        match self {
            LinkRole::Server { bind } => bind,
            LinkRole::Client { peer } => peer,
        }
    }

    pub fn is_server(&self) -> bool {
        matches!(self, LinkRole::Server { .. })
    }
}

impl Default for LinkRole {
    fn default() -> Self {
        LinkRole::Server {
            bind: DEFAULT_LISTEN_ADDR.to_string(),
        }
    }
}

/// Link settings.
///
/// # Example
///
/// ```
/// use locker_network::{LinkConfig, LinkRole};
///
/// let config = LinkConfig {
///     role: LinkRole::Client { peer: "127.0.0.1:7071".to_string() },
///     ..LinkConfig::default()
/// };
/// assert!(!config.role.is_server());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Name announced for the device.
    pub device_name: String,

    pub role: LinkRole,

    pub connect_timeout_ms: u64,
    pub reconnect_interval_ms: u64,
}

impl LinkConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            device_name: DEVICE_NAME.to_string(),
            role: LinkRole::default(),
            connect_timeout_ms: LINK_CONNECT_TIMEOUT_MS,
            reconnect_interval_ms: DEFAULT_RECONNECT_INTERVAL_MS,
        }
    }
}
