//! User-facing messages at the end of a transaction.

use locker_core::TransactionKind;
use locker_hardware::Annunciator;

use crate::TransactionError;

/// Two display lines plus a success or failure signal.
///
/// Every line fits the 16-column display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub line1: String,
    pub line2: String,
    pub success: bool,
}

impl Notice {
    fn new(line1: impl Into<String>, line2: impl Into<String>, success: bool) -> Self {
        Self {
            line1: line1.into(),
            line2: line2.into(),
            success,
        }
    }

    /// Notice for a completed transaction.
    pub fn completed(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Borrow => Self::new("Box borrowed", "Thank you!", true),
            TransactionKind::Return => Self::new("Box returned", "Thank you!", true),
        }
    }

    /// Notice for a failed transaction.
    pub fn failed(error: &TransactionError) -> Self {
        match error {
            TransactionError::InputInvalid { min, max, .. } => {
                Self::new("Invalid ID", format!("Need {min}-{max} digits"), false)
            }
            TransactionError::InputTimeout { .. } => {
                Self::new("Timed out", "Please try again", false)
            }
            TransactionError::Cancelled => Self::new("Cancelled", "", false),
            TransactionError::LinkUnavailable => {
                Self::new("Link unavailable", "Try again later", false)
            }
            TransactionError::LinkLost => Self::new("Link lost", "Door locked", false),
            TransactionError::AuthDenied { .. } => Self::new("Access denied", "", false),
            TransactionError::AuthTimeout { .. } => {
                Self::new("No response", "Please try again", false)
            }
            TransactionError::PhysicalTimeout { .. } => {
                Self::new("Timeout", "Door relocked", false)
            }
        }
    }

    /// Show the notice and give the matching signal.
    pub fn announce<A: Annunciator>(&self, annunciator: &mut A) {
        annunciator.show(&self.line1, &self.line2);
        if self.success {
            annunciator.signal_success();
        } else {
            annunciator.signal_failure();
        }
    }
}
