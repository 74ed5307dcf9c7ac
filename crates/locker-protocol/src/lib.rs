//! Line-oriented wire protocol between the locker kiosk and its
//! authorization peer.
//!
//! ```text
//! kiosk -> peer:  BORROW,<student_id>\n | RETURN,<student_id>\n
//! peer  -> kiosk: OK\n | DENIED\n | (synonyms, see ReplyPolicy)
//! ```
//!
//! Anything the peer sends that is not a recognised grant is a denial.

pub mod codec;
pub mod line;
pub mod message;

pub use codec::LineCodec;
pub use line::{LineBuffer, LineState};
pub use message::{Command, REPLY_DENIED, REPLY_OK, Reply, ReplyPolicy};
