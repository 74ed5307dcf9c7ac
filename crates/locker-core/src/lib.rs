//! Shared vocabulary of the campus locker kiosk.
//!
//! [`constants`] holds every compile-time default (pins, thresholds, timing,
//! ID bounds, link identity). [`types`] holds the validated [`StudentId`],
//! the [`IdLengthBounds`] it is checked against and the [`TransactionKind`].

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Crate version, reported by the kiosk at startup.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
