//! Reference authorization peer.
//!
//! The kiosk does not decide who may borrow a box; the host on the other
//! end of the link does. [`AuthPeer`] is that host for development and
//! integration testing: it keeps an in-memory ledger of who holds a box and
//! answers each command with [`REPLY_OK`] or [`REPLY_DENIED`].
//!
//! # Policy
//!
//! | Command | Condition | Reply |
//! |---------|-----------|-------|
//! | any | ID shorter than the minimum length | `DENIED` |
//! | `BORROW,<id>` | student already holds a box | `DENIED` |
//! | `BORROW,<id>` | otherwise | `OK`, hold recorded |
//! | `RETURN,<id>` | always | `OK`, hold cleared |
//! | unknown keyword | | no reply |
//!
//! A bare ID without keyword is treated as a borrow.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use locker_core::constants::MIN_STUDENT_ID_LENGTH;
use locker_core::{StudentId, TransactionKind};
use locker_protocol::{LineCodec, REPLY_DENIED, REPLY_OK};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::LinkError;

/// Pause between connection attempts when the kiosk is not reachable.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// A box currently out on loan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hold {
    pub student_id: StudentId,
    pub since: DateTime<Utc>,
}

/// Host-side authorization peer.
///
/// # Example
///
/// ```
/// use locker_network::AuthPeer;
///
/// let mut peer = AuthPeer::new();
/// assert_eq!(peer.handle_line("BORROW,123456789"), Some("OK"));
/// assert_eq!(peer.handle_line("BORROW,123456789"), Some("DENIED"));
/// assert_eq!(peer.handle_line("RETURN,123456789"), Some("OK"));
/// assert_eq!(peer.handle_line("HELLO,123456789"), None);
/// ```
#[derive(Debug)]
pub struct AuthPeer {
    min_id_length: usize,
    holds: HashMap<StudentId, DateTime<Utc>>,
}

impl AuthPeer {
    pub fn new() -> Self {
        Self::with_min_id_length(MIN_STUDENT_ID_LENGTH)
    }

    pub fn with_min_id_length(min_id_length: usize) -> Self {
        Self {
            min_id_length,
            holds: HashMap::new(),
        }
    }

    /// Decide the reply to one received line.
    ///
    /// Returns `None` for blank lines and unknown commands, which get no
    /// answer.
    pub fn handle_line(&mut self, line: &str) -> Option<&'static str> {
        let message = line.trim().to_ascii_uppercase();
        if message.is_empty() {
            return None;
        }
        info!("Received from kiosk: {}", message);

        let (keyword, id) = message
            .split_once(',')
            .unwrap_or((TransactionKind::Borrow.keyword(), message.as_str()));

        let student_id = match StudentId::new(id) {
            Ok(id) if id.len() >= self.min_id_length => id,
            _ => {
                warn!("Invalid student ID: {:?}", id);
                return Some(REPLY_DENIED);
            }
        };

        match keyword.parse::<TransactionKind>() {
            Ok(TransactionKind::Borrow) => Some(self.borrow(student_id)),
            Ok(TransactionKind::Return) => Some(self.give_back(student_id)),
            Err(_) => {
                warn!("Unknown command: {}", keyword);
                None
            }
        }
    }

    fn borrow(&mut self, student_id: StudentId) -> &'static str {
        if let Some(since) = self.holds.get(&student_id) {
            info!(
                "BORROW DENIED for {}: holding a box since {}",
                student_id,
                since.to_rfc3339()
            );
            return REPLY_DENIED;
        }

        info!("BORROW APPROVED for {}", student_id);
        self.holds.insert(student_id, Utc::now());
        REPLY_OK
    }

    fn give_back(&mut self, student_id: StudentId) -> &'static str {
        match self.holds.remove(&student_id) {
            Some(since) => info!(
                "RETURN RECORDED for {} (borrowed {})",
                student_id,
                since.to_rfc3339()
            ),
            None => info!("RETURN RECORDED for {} (no open loan)", student_id),
        }
        REPLY_OK
    }

    /// Whether the student currently holds a box.
    pub fn holds(&self, student_id: &StudentId) -> bool {
        self.holds.contains_key(student_id)
    }

    /// All open loans, oldest first.
    pub fn open_holds(&self) -> Vec<Hold> {
        let mut holds: Vec<Hold> = self
            .holds
            .iter()
            .map(|(id, since)| Hold {
                student_id: id.clone(),
                since: *since,
            })
            .collect();
        holds.sort_by_key(|h| h.since);
        holds
    }

    /// Answer commands on one connection until the kiosk hangs up.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or a reply cannot be sent.
    pub async fn serve<T>(&mut self, io: T) -> Result<(), LinkError>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let mut framed = Framed::new(io, LineCodec::new());

        while let Some(line) = framed.next().await {
            let line = line?;
            if let Some(reply) = self.handle_line(&line) {
                framed.send(reply).await?;
                info!("Sent to kiosk: {}", reply);
            }
        }

        info!("Kiosk disconnected");
        Ok(())
    }

    /// Connect to a kiosk in the server role and serve it, reconnecting
    /// whenever the connection drops. Runs until the task is cancelled.
    pub async fn connect_and_serve(&mut self, addr: &str) -> Result<(), LinkError> {
        loop {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    info!("Connected to kiosk at {}", addr);
                    if let Err(e) = self.serve(stream).await {
                        warn!("Connection to kiosk failed: {}", e);
                    }
                }
                Err(e) => debug!("Kiosk at {} not reachable: {}", addr, e),
            }
            tokio::time::sleep(RETRY_DELAY).await;
        }
    }

    /// Accept kiosks in the client role, one at a time.
    /// Runs until the task is cancelled.
    pub async fn listen_and_serve(&mut self, addr: &str) -> Result<(), LinkError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| LinkError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        info!("Waiting for kiosk on {}", addr);

        loop {
            let (stream, remote) = listener.accept().await?;
            info!("Kiosk connected from {}", remote);
            if let Err(e) = self.serve(stream).await {
                warn!("Connection to kiosk {} failed: {}", remote, e);
            }
        }
    }
}

impl Default for AuthPeer {
    fn default() -> Self {
        Self::new()
    }
}
