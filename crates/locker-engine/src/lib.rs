//! Transaction engine for the campus locker kiosk.
//!
//! [`TransactionEngine`] turns keypad input, presence sensor readings and
//! the peer's replies into latch and annunciator commands for one borrow or
//! return at a time. It is synchronous and non-blocking: the kiosk loop
//! calls [`TransactionEngine::tick`] at a fixed rate and the engine never
//! waits on anything.
//!
//! # Modules
//!
//! - [`engine`]: the state machine and its per-tick input
//! - [`state`]: [`EngineState`] and the bounded transition history
//! - [`transaction`]: the live [`Transaction`] and its outcome
//! - [`notice`]: end-of-transaction messages
//! - [`error`]: the [`TransactionError`] taxonomy
//! - [`config`]: [`EngineConfig`]

pub mod config;
pub mod engine;
pub mod error;
pub mod notice;
pub mod state;
pub mod transaction;

pub use config::EngineConfig;
pub use engine::{SensorSnapshot, TickInput, TransactionEngine};
pub use error::TransactionError;
pub use notice::Notice;
pub use state::{EngineState, MAX_HISTORY_SIZE, StateTransition, TransitionHistory};
pub use transaction::{Transaction, TransactionOutcome, TransactionStatus};
