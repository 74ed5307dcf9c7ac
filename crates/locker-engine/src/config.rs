use std::time::Duration;

use locker_core::constants::{
    AUTH_TIMEOUT_MS, DISPLAY_MESSAGE_MS, DOOR_OPEN_TIMEOUT_MS, INPUT_TIMEOUT_MS,
};
use locker_core::{Error, IdLengthBounds, Result};
use locker_protocol::ReplyPolicy;
use serde::{Deserialize, Serialize};

/// Runtime tunables of the transaction engine.
///
/// Defaults come from [`locker_core::constants`].
///
/// # Example
///
/// ```
/// use locker_engine::EngineConfig;
///
/// let config: EngineConfig = serde_json::from_str(r#"{ "auth_timeout_ms": 5000 }"#).unwrap();
/// assert_eq!(config.auth_timeout().as_secs(), 5);
/// assert_eq!(config.id_bounds.max, 9);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Time allowed to finish typing the ID, from the first digit.
    pub input_timeout_ms: u64,

    /// Time allowed for the peer to answer.
    pub auth_timeout_ms: u64,

    /// Time allowed for the physical borrow or return.
    pub door_open_timeout_ms: u64,

    /// How long a notice stays before the idle prompt returns.
    pub display_message_ms: u64,

    pub id_bounds: IdLengthBounds,

    pub replies: ReplyPolicy,
}

impl EngineConfig {
    pub fn input_timeout(&self) -> Duration {
        Duration::from_millis(self.input_timeout_ms)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_millis(self.auth_timeout_ms)
    }

    pub fn door_open_timeout(&self) -> Duration {
        Duration::from_millis(self.door_open_timeout_ms)
    }

    pub fn display_message(&self) -> Duration {
        Duration::from_millis(self.display_message_ms)
    }

    /// Check that every timeout is non-zero and the ID bounds and reply
    /// vocabulary are consistent.
    ///
    /// # Errors
    /// Returns `Error::Config` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("input_timeout_ms", self.input_timeout_ms),
            ("auth_timeout_ms", self.auth_timeout_ms),
            ("door_open_timeout_ms", self.door_open_timeout_ms),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{name} must be greater than 0")));
            }
        }
        IdLengthBounds::new(self.id_bounds.min, self.id_bounds.max)?;
        self.replies.validate()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            input_timeout_ms: INPUT_TIMEOUT_MS,
            auth_timeout_ms: AUTH_TIMEOUT_MS,
            door_open_timeout_ms: DOOR_OPEN_TIMEOUT_MS,
            display_message_ms: DISPLAY_MESSAGE_MS,
            id_bounds: IdLengthBounds::default(),
            replies: ReplyPolicy::default(),
        }
    }
}
