use thiserror::Error;

/// Errors raised while validating IDs, framing lines and checking
/// configuration.
#[derive(Error, Debug)]
pub enum Error {
    // Student input
    #[error("Invalid student ID: {0}")]
    InvalidStudentId(String),

    #[error("Student ID length {len} outside {min}-{max}")]
    StudentIdLength { len: usize, min: usize, max: usize },

    #[error("Invalid transaction kind: {0}")]
    InvalidTransactionKind(String),

    // Wire protocol
    #[error("Invalid message format: {0}")]
    InvalidMessageFormat(String),

    #[error("Line exceeds {max} bytes")]
    LineTooLong { max: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
