//! Protocol messages.
//!
//! The kiosk sends a [`Command`]; the peer answers with a single line that
//! the kiosk classifies into a [`Reply`] through a [`ReplyPolicy`].

use std::fmt;

use locker_core::constants::{DEFAULT_DENIED_REPLIES, DEFAULT_GRANTED_REPLIES};
use locker_core::{Error, Result, StudentId, TransactionKind};
use serde::{Deserialize, Serialize};

/// Canonical grant reply sent by the peer.
pub const REPLY_OK: &str = "OK";

/// Canonical denial reply sent by the peer.
pub const REPLY_DENIED: &str = "DENIED";

/// Separator between command keyword and student ID.
const COMMAND_SEPARATOR: char = ',';

/// Device-to-peer command: `BORROW,<id>` or `RETURN,<id>`.
///
/// # Examples
///
/// ```
/// use locker_core::{StudentId, TransactionKind};
/// use locker_protocol::Command;
///
/// let id = StudentId::new("123456789").unwrap();
/// let command = Command::new(TransactionKind::Borrow, id);
/// assert_eq!(command.to_string(), "BORROW,123456789");
///
/// let parsed: Command = "return,12345678".parse().unwrap();
/// assert_eq!(parsed.kind, TransactionKind::Return);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub kind: TransactionKind,
    pub student_id: StudentId,
}

impl Command {
    pub fn new(kind: TransactionKind, student_id: StudentId) -> Self {
        Self { kind, student_id }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.kind.keyword(),
            COMMAND_SEPARATOR,
            self.student_id
        )
    }
}

impl std::str::FromStr for Command {
    type Err = Error;

    /// Parse a command line as the peer receives it.
    ///
    /// Keyword matching is case-insensitive and surrounding whitespace is
    /// ignored. A bare student ID without keyword is read as a borrow, which
    /// is what early kiosk firmware sent.
    fn from_str(s: &str) -> Result<Self> {
        let line = s.trim();
        if line.is_empty() {
            return Err(Error::InvalidMessageFormat("empty command".to_string()));
        }

        match line.split_once(COMMAND_SEPARATOR) {
            Some((keyword, id)) => Ok(Command::new(keyword.parse()?, StudentId::new(id)?)),
            None => Ok(Command::new(TransactionKind::Borrow, StudentId::new(line)?)),
        }
    }
}

/// Classified peer reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The peer authorised the transaction.
    Granted,

    /// The peer explicitly refused.
    Denied,

    /// The peer sent something outside both vocabularies.
    ///
    /// Treated as a denial; the normalized text is kept for logging.
    Unexpected(String),
}

impl Reply {
    /// Whether the transaction may proceed.
    pub fn is_granted(&self) -> bool {
        matches!(self, Reply::Granted)
    }
}

/// Accepted reply vocabulary.
///
/// Replies are normalized (trimmed, ASCII-uppercased) before matching, so
/// entries must be stored uppercase. The defaults are
/// `{OK, GRANTED, SUCCESS}` for grants and `{DENIED, DENY, REJECTED}` for
/// denials.
///
/// # Examples
///
/// ```
/// use locker_protocol::{Reply, ReplyPolicy};
///
/// let policy = ReplyPolicy::default();
/// assert_eq!(policy.classify(" ok\r"), Some(Reply::Granted));
/// assert_eq!(policy.classify("Denied"), Some(Reply::Denied));
/// assert!(matches!(policy.classify("ERROR"), Some(Reply::Unexpected(_))));
/// assert_eq!(policy.classify("   "), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawReplyPolicy")]
pub struct ReplyPolicy {
    pub granted: Vec<String>,
    pub denied: Vec<String>,
}

/// Reply sets as written in a configuration file, in any case.
#[derive(Deserialize)]
#[serde(default)]
struct RawReplyPolicy {
    granted: Vec<String>,
    denied: Vec<String>,
}

impl Default for RawReplyPolicy {
    fn default() -> Self {
        let ReplyPolicy { granted, denied } = ReplyPolicy::default();
        Self { granted, denied }
    }
}

impl TryFrom<RawReplyPolicy> for ReplyPolicy {
    type Error = Error;

    fn try_from(raw: RawReplyPolicy) -> Result<Self> {
        ReplyPolicy::new(raw.granted, raw.denied)
    }
}

impl ReplyPolicy {
    /// Build a policy from arbitrary-case synonym lists.
    ///
    /// # Errors
    /// Returns `Error::Config` if the grant set is empty or a word appears in
    /// both sets.
    pub fn new<I, J, S, T>(granted: I, denied: J) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let policy = Self {
            granted: granted.into_iter().map(|s| normalize(s.as_ref())).collect(),
            denied: denied.into_iter().map(|s| normalize(s.as_ref())).collect(),
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Check the policy invariants.
    ///
    /// # Errors
    /// Returns `Error::Config` if the grant set is empty, a word is empty or
    /// not normalized, or the two sets overlap.
    pub fn validate(&self) -> Result<()> {
        if self.granted.is_empty() {
            return Err(Error::Config("grant reply set is empty".to_string()));
        }
        if self.granted.iter().chain(&self.denied).any(|w| w.is_empty()) {
            return Err(Error::Config("reply words must be non-empty".to_string()));
        }
        if let Some(word) = self
            .granted
            .iter()
            .chain(&self.denied)
            .find(|w| normalize(w) != **w)
        {
            return Err(Error::Config(format!(
                "reply {word:?} must be trimmed and uppercase"
            )));
        }
        if let Some(word) = self.granted.iter().find(|w| self.denied.contains(w)) {
            return Err(Error::Config(format!(
                "reply {word:?} is both a grant and a denial"
            )));
        }
        Ok(())
    }

    /// Classify one received line.
    ///
    /// Returns `None` for blank lines, which carry no reply.
    pub fn classify(&self, line: &str) -> Option<Reply> {
        let normalized = normalize(line);
        if normalized.is_empty() {
            return None;
        }

        if self.granted.contains(&normalized) {
            Some(Reply::Granted)
        } else if self.denied.contains(&normalized) {
            Some(Reply::Denied)
        } else {
            Some(Reply::Unexpected(normalized))
        }
    }
}

impl Default for ReplyPolicy {
    fn default() -> Self {
        Self {
            granted: DEFAULT_GRANTED_REPLIES.iter().map(|s| s.to_string()).collect(),
            denied: DEFAULT_DENIED_REPLIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_ascii_uppercase()
}
