//! Link layer between the kiosk and its authorization peer.
//!
//! This crate provides the [`LinkChannel`] contract the transaction engine
//! depends on, a TCP implementation standing in for the wireless
//! serial-profile link, an in-memory implementation for tests, and the
//! reference peer that answers authorization requests.
//!
//! # Components
//!
//! - **LinkChannel**: non-blocking send-line / receive-line / liveness
//! - **TcpLink**: server or client role over tokio sockets
//! - **MockLink**: in-memory link with a controllable peer
//! - **AuthPeer**: host-side `BORROW`/`RETURN` authorization
//!
//! # Example
//!
//! ```
//! use locker_network::mock::MockLink;
//! use locker_network::{AuthPeer, LinkChannel};
//!
//! let (mut link, mut peer_side) = MockLink::pair();
//! let mut host = AuthPeer::new();
//!
//! link.send_line("BORROW,123456789");
//! for line in peer_side.take_lines() {
//!     if let Some(reply) = host.handle_line(&line) {
//!         peer_side.reply(reply);
//!     }
//! }
//! assert_eq!(link.receive_line().as_deref(), Some("OK"));
//! ```

mod channel;
mod error;
pub mod mock;
mod peer;
mod tcp;

pub use channel::{DEFAULT_RECONNECT_INTERVAL_MS, LinkChannel, LinkConfig, LinkRole};
pub use error::LinkError;
pub use peer::{AuthPeer, Hold};
pub use tcp::TcpLink;
