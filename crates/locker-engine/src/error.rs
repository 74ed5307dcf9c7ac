//! Transaction failure taxonomy.
//!
//! None of these errors ever leaves the engine as a `Result`: each one ends
//! the live transaction, returns the engine to `Idle`, and is shown to the
//! user through the annunciator. The last one is kept as the transaction
//! outcome for inspection.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::TransactionStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum TransactionError {
    // Input errors
    #[error("Student ID length {len} outside {min}-{max}")]
    InputInvalid { len: usize, min: usize, max: usize },

    #[error("No terminal key within {timeout_ms}ms")]
    InputTimeout { timeout_ms: u64 },

    #[error("Transaction cancelled from the keypad")]
    Cancelled,

    // Link errors
    #[error("Link unavailable")]
    LinkUnavailable,

    #[error("Link lost mid-transaction")]
    LinkLost,

    // Authorization errors
    #[error("Authorization denied: {reply}")]
    AuthDenied { reply: String },

    #[error("No authorization reply within {timeout_ms}ms")]
    AuthTimeout { timeout_ms: u64 },

    // Physical errors
    #[error("Expected physical event not observed within {timeout_ms}ms")]
    PhysicalTimeout { timeout_ms: u64 },
}

impl TransactionError {
    /// Terminal status a transaction ends in when it fails with this error.
    pub fn status(&self) -> TransactionStatus {
        match self {
            Self::AuthDenied { .. } => TransactionStatus::AuthDenied,
            Self::InputTimeout { .. } | Self::AuthTimeout { .. } | Self::PhysicalTimeout { .. } => {
                TransactionStatus::TimedOut
            }
            Self::InputInvalid { .. }
            | Self::Cancelled
            | Self::LinkUnavailable
            | Self::LinkLost => TransactionStatus::Aborted,
        }
    }
}
