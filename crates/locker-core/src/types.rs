use crate::{
    Result,
    constants::{MAX_STUDENT_ID_LENGTH, MIN_STUDENT_ID_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Student identifier: a non-empty string of ASCII digits.
///
/// Length bounds are deployment configuration and are checked separately
/// with [`IdLengthBounds::check`], so that the same type can carry IDs read
/// off the wire before the receiving side applies its own policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StudentId(String);

impl StudentId {
    /// Create a new student ID.
    ///
    /// Surrounding whitespace is trimmed before validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidStudentId` if the ID is empty or contains
    /// anything other than ASCII digits.
    pub fn new(id: &str) -> Result<Self> {
        let id = id.trim();

        if id.is_empty() {
            return Err(Error::InvalidStudentId("empty".to_string()));
        }

        if !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidStudentId(format!("non-digit in {id:?}")));
        }

        Ok(StudentId(id.to_string()))
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of digits in the ID.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; an empty ID cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for StudentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        StudentId::new(s)
    }
}

impl TryFrom<String> for StudentId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        StudentId::new(&value)
    }
}

impl From<StudentId> for String {
    fn from(id: StudentId) -> Self {
        id.0
    }
}

/// Inclusive length bounds for student IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdLengthBounds {
    pub min: usize,
    pub max: usize,
}

impl IdLengthBounds {
    /// Create bounds, rejecting an empty or inverted range.
    ///
    /// # Errors
    /// Returns `Error::Config` if `min` is zero or greater than `max`.
    pub fn new(min: usize, max: usize) -> Result<Self> {
        if min == 0 || min > max {
            return Err(Error::Config(format!(
                "student ID bounds must satisfy 0 < min <= max, got {min}-{max}"
            )));
        }
        Ok(Self { min, max })
    }

    /// Whether a digit count falls within the bounds.
    #[must_use]
    pub fn contains(&self, len: usize) -> bool {
        (self.min..=self.max).contains(&len)
    }

    /// Check an ID against the bounds.
    ///
    /// # Errors
    /// Returns `Error::StudentIdLength` when the ID is too short or too long.
    pub fn check(&self, id: &StudentId) -> Result<()> {
        if self.contains(id.len()) {
            Ok(())
        } else {
            Err(Error::StudentIdLength {
                len: id.len(),
                min: self.min,
                max: self.max,
            })
        }
    }
}

impl Default for IdLengthBounds {
    fn default() -> Self {
        Self {
            min: MIN_STUDENT_ID_LENGTH,
            max: MAX_STUDENT_ID_LENGTH,
        }
    }
}

/// Kind of locker transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Take a box out of the locker.
    #[default]
    Borrow,
    /// Put a box back.
    Return,
}

impl TransactionKind {
    /// Command keyword used on the wire.
    #[must_use]
    pub fn keyword(&self) -> &'static str {
        match self {
            TransactionKind::Borrow => "BORROW",
            TransactionKind::Return => "RETURN",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            TransactionKind::Borrow => "Borrow",
            TransactionKind::Return => "Return",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = Error;

    /// Parse a wire keyword, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BORROW" => Ok(TransactionKind::Borrow),
            "RETURN" => Ok(TransactionKind::Return),
            other => Err(Error::InvalidTransactionKind(other.to_string())),
        }
    }
}
