//! The live transaction and its outcome.

use std::time::{Duration, Instant};

use locker_core::{IdLengthBounds, StudentId, TransactionKind};
use serde::{Deserialize, Serialize};

use crate::TransactionError;

/// Progress of a single borrow or return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Collecting,
    AwaitingAuth,
    AuthGranted,
    AuthDenied,
    WaitingForPhysicalAction,
    Completed,
    TimedOut,
    Aborted,
}

impl TransactionStatus {
    /// Whether the transaction has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::AuthDenied | Self::Completed | Self::TimedOut | Self::Aborted
        )
    }
}

/// One borrow or return, from the first digit to completion.
///
/// Owned exclusively by the engine. The deadline always refers to the
/// current status and is replaced on every status change.
#[derive(Debug, Clone)]
pub struct Transaction {
    kind: TransactionKind,
    digits: String,
    status: TransactionStatus,
    deadline: Option<Instant>,
    started_at: Instant,
}

impl Transaction {
    /// Start collecting an ID with a fresh input deadline.
    pub fn new(kind: TransactionKind, now: Instant, input_timeout: Duration) -> Self {
        Self {
            kind,
            digits: String::new(),
            status: TransactionStatus::Collecting,
            deadline: Some(now + input_timeout),
            started_at: now,
        }
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    /// Digits typed so far.
    pub fn digits(&self) -> &str {
        &self.digits
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Append a digit unless the ID already has `max_len` digits.
    ///
    /// Returns whether the digit was appended.
    pub fn push_digit(&mut self, digit: u8, max_len: usize) -> bool {
        if digit > 9 || self.digits.len() >= max_len {
            return false;
        }
        self.digits.push(char::from(b'0' + digit));
        true
    }

    /// Forget the digits typed so far. The input deadline is kept.
    pub fn clear_digits(&mut self) {
        self.digits.clear();
    }

    /// Validate the collected digits into a student ID.
    ///
    /// # Errors
    /// Returns `TransactionError::InputInvalid` when the digit count is
    /// outside `bounds`.
    pub fn student_id(&self, bounds: &IdLengthBounds) -> Result<StudentId, TransactionError> {
        let invalid = || TransactionError::InputInvalid {
            len: self.digits.len(),
            min: bounds.min,
            max: bounds.max,
        };
        if !bounds.contains(self.digits.len()) {
            return Err(invalid());
        }
        StudentId::new(&self.digits).map_err(|_| invalid())
    }

    /// Move to `status`, replacing the deadline.
    pub fn set_status(&mut self, status: TransactionStatus, deadline: Option<Instant>) {
        self.status = status;
        self.deadline = deadline;
    }

    /// Drop the current deadline, keeping the status.
    pub fn clear_deadline(&mut self) {
        self.deadline = None;
    }

    /// Whether the current deadline has passed.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Close the transaction into its outcome.
    pub fn finish(mut self, error: Option<TransactionError>, now: Instant) -> TransactionOutcome {
        let status = match &error {
            Some(error) => error.status(),
            None => TransactionStatus::Completed,
        };
        self.set_status(status, None);

        TransactionOutcome {
            kind: self.kind,
            digits: self.digits,
            status,
            error,
            duration: now.saturating_duration_since(self.started_at),
        }
    }
}

/// How the last transaction ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutcome {
    pub kind: TransactionKind,
    pub digits: String,
    pub status: TransactionStatus,
    pub error: Option<TransactionError>,
    pub duration: Duration,
}

impl TransactionOutcome {
    pub fn is_success(&self) -> bool {
        self.status == TransactionStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const INPUT_TIMEOUT: Duration = Duration::from_secs(15);

    fn collecting(digits: &str) -> Transaction {
        let mut tx = Transaction::new(TransactionKind::Borrow, Instant::now(), INPUT_TIMEOUT);
        for c in digits.bytes() {
            tx.push_digit(c - b'0', 9);
        }
        tx
    }

    #[test]
    fn test_new_transaction_is_collecting() {
        let now = Instant::now();
        let tx = Transaction::new(TransactionKind::Return, now, INPUT_TIMEOUT);
        assert_eq!(tx.status(), TransactionStatus::Collecting);
        assert_eq!(tx.deadline(), Some(now + INPUT_TIMEOUT));
        assert!(tx.digits().is_empty());
    }

    #[test]
    fn test_push_digit_stops_at_max() {
        let mut tx = collecting("12345678");
        assert!(tx.push_digit(9, 9));
        assert!(!tx.push_digit(0, 9));
        assert_eq!(tx.digits(), "123456789");
    }

    #[test]
    fn test_clear_keeps_deadline() {
        let mut tx = collecting("1234");
        let deadline = tx.deadline();
        tx.clear_digits();
        assert!(tx.digits().is_empty());
        assert_eq!(tx.deadline(), deadline);
    }

    #[rstest]
    #[case("", false)]
    #[case("1234567", false)]
    #[case("12345678", true)]
    #[case("123456789", true)]
    fn test_student_id_bounds(#[case] digits: &str, #[case] valid: bool) {
        let tx = collecting(digits);
        assert_eq!(tx.student_id(&IdLengthBounds::default()).is_ok(), valid);
    }

    #[test]
    fn test_invalid_id_reports_length() {
        let err = collecting("123")
            .student_id(&IdLengthBounds::default())
            .unwrap_err();
        assert_eq!(
            err,
            TransactionError::InputInvalid {
                len: 3,
                min: 8,
                max: 9
            }
        );
    }

    #[test]
    fn test_expiry() {
        let now = Instant::now();
        let tx = Transaction::new(TransactionKind::Borrow, now, INPUT_TIMEOUT);
        assert!(!tx.is_expired(now + INPUT_TIMEOUT - Duration::from_millis(1)));
        assert!(tx.is_expired(now + INPUT_TIMEOUT));
    }

    #[test]
    fn test_finish() {
        let now = Instant::now();
        let tx = Transaction::new(TransactionKind::Borrow, now, INPUT_TIMEOUT);
        let outcome = tx.finish(None, now + Duration::from_secs(2));
        assert!(outcome.is_success());
        assert_eq!(outcome.duration, Duration::from_secs(2));

        let tx = Transaction::new(TransactionKind::Borrow, now, INPUT_TIMEOUT);
        let outcome = tx.finish(Some(TransactionError::LinkUnavailable), now);
        assert_eq!(outcome.status, TransactionStatus::Aborted);
        assert!(!outcome.is_success());
    }
}
