//! Campus locker kiosk runtime.
//!
//! Wires the transaction engine to a board (emulated peripherals driven
//! from the terminal) and a TCP link, and runs the fixed-rate polling loop.
//!
//! - [`cli`]: command-line arguments
//! - [`config`]: the JSON configuration file
//! - [`logging`]: tracing subscriber setup
//! - [`board`]: the emulated peripheral set and its control handles
//! - [`kiosk`]: the polling loop and the startup fault halt
//! - [`console`]: stdin commands and the mirrored LCD

pub mod board;
pub mod cli;
pub mod config;
pub mod console;
pub mod kiosk;
pub mod logging;

pub use board::{BoardControls, Devices};
pub use config::KioskConfig;
pub use kiosk::{Kiosk, halt};
