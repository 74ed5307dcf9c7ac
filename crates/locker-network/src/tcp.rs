//! TCP transport for the kiosk link.
//!
//! The production kiosk talks to its peer over a Bluetooth serial-profile
//! link; on a development host the same line protocol runs over TCP. The
//! link exposes the synchronous [`LinkChannel`] contract on top of tokio
//! sockets by driving accept, connect, read and write without ever
//! awaiting: readiness is polled once per call with a no-op waker and the
//! kiosk's fixed-rate loop supplies the repetition.
//!
//! # Architecture
//!
//! ```text
//! TransactionEngine
//!     │  is_connected / send_line / receive_line
//!     v
//! TcpLink ──(TCP)── AuthPeer
//!     │
//!     ├─> LineCodec   (outgoing framing)
//!     └─> LineBuffer  (incoming lines, overflow resync)
//! ```
//!
//! # Roles
//!
//! - [`LinkRole::Server`]: binds a listener and accepts one peer at a time.
//!   Further peers wait in the backlog until the current one goes away.
//! - [`LinkRole::Client`]: connects out, retrying every
//!   `reconnect_interval_ms` while disconnected.
//!
//! The role is fixed when the link is opened.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::{Buf, BytesMut};
use futures::FutureExt;
use futures::future::BoxFuture;
use futures::task::noop_waker_ref;
use locker_protocol::{LineBuffer, LineCodec};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Encoder;
use tracing::{debug, info, trace, warn};

use crate::{LinkChannel, LinkConfig, LinkError, LinkRole};

/// Bytes read from the socket per `try_read` call.
const READ_CHUNK: usize = 256;

type ConnectFuture = BoxFuture<'static, Result<TcpStream, LinkError>>;

/// Non-blocking line link over TCP.
///
/// Must be created and used inside a tokio runtime.
///
/// # Example
///
/// ```no_run
/// use locker_network::{LinkChannel, LinkConfig, TcpLink};
///
/// # async fn example() -> Result<(), locker_network::LinkError> {
/// let mut link = TcpLink::open(LinkConfig::default()).await?;
///
/// let mut tick = tokio::time::interval(std::time::Duration::from_millis(20));
/// loop {
///     tick.tick().await;
///     if link.is_connected() {
///         if let Some(line) = link.receive_line() {
///             println!("peer said {line}");
///         }
///     }
/// }
/// # }
/// ```
pub struct TcpLink {
    config: LinkConfig,

    /// Listening socket (server role only)
    listener: Option<TcpListener>,

    /// Current connection (None if not connected)
    stream: Option<TcpStream>,
    peer_addr: Option<SocketAddr>,

    /// Pending outbound connection attempt (client role only)
    connecting: Option<ConnectFuture>,
    next_attempt: Instant,

    codec: LineCodec,
    lines: LineBuffer,

    /// Framed bytes not yet accepted by the socket.
    outgoing: BytesMut,

    /// Discarded-line count already logged.
    reported_discards: u64,
}

impl TcpLink {
    /// Open the link in the configured role.
    ///
    /// The server role binds its listener here; the client role starts its
    /// first connection attempt, which completes during later polls.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Bind`] if the listening address is unavailable.
    pub async fn open(config: LinkConfig) -> Result<Self, LinkError> {
        let listener = match &config.role {
            LinkRole::Server { bind } => {
                info!("Binding link listener on {}", bind);
                let listener =
                    TcpListener::bind(bind.as_str())
                        .await
                        .map_err(|source| LinkError::Bind {
                            addr: bind.clone(),
                            source,
                        })?;
                Some(listener)
            }
            LinkRole::Client { .. } => None,
        };

        let mut link = Self {
            config,
            listener,
            stream: None,
            peer_addr: None,
            connecting: None,
            next_attempt: Instant::now(),
            codec: LineCodec::new(),
            lines: LineBuffer::new(),
            outgoing: BytesMut::new(),
            reported_discards: 0,
        };
        link.connect();

        Ok(link)
    }

    /// Start a connection attempt if this is a disconnected client.
    ///
    /// Returns immediately; the attempt is driven by subsequent calls to
    /// the [`LinkChannel`] methods. No-op in the server role.
    pub fn connect(&mut self) {
        let LinkRole::Client { peer } = &self.config.role else {
            return;
        };
        if self.stream.is_some() || self.connecting.is_some() {
            return;
        }

        let peer = peer.clone();
        let timeout = self.config.connect_timeout();
        debug!("Connecting link to {}", peer);

        self.connecting = Some(
            async move {
                match tokio::time::timeout(timeout, TcpStream::connect(peer.as_str())).await {
                    Ok(result) => result.map_err(LinkError::from),
                    Err(_) => Err(LinkError::ConnectionTimeout(timeout.as_millis() as u64)),
                }
            }
            .boxed(),
        );
    }

    /// Drop the current connection, if any.
    pub fn disconnect(&mut self) {
        if self.stream.is_some() {
            self.drop_connection("closed locally");
        }
    }

    /// Address the listener is bound to (server role only).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Address of the connected peer.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    pub fn role(&self) -> &LinkRole {
        &self.config.role
    }

    /// Lines dropped by the overflow or encoding policy so far.
    pub fn discarded_lines(&self) -> u64 {
        self.lines.discarded_lines()
    }

    /// Advance connection setup and move bytes in both directions.
    fn service(&mut self) {
        if self.stream.is_none() {
            self.establish();
        }
        if self.stream.is_some() {
            self.pump();
        }
    }

    fn establish(&mut self) {
        let mut cx = Context::from_waker(noop_waker_ref());

        if self.listener.is_some() {
            let accepted = match &self.listener {
                Some(listener) => listener.poll_accept(&mut cx),
                None => Poll::Pending,
            };
            match accepted {
                Poll::Ready(Ok((stream, addr))) => self.attach(stream, Some(addr)),
                Poll::Ready(Err(e)) => warn!("Failed to accept link peer: {}", e),
                Poll::Pending => {}
            }
            return;
        }

        if self.connecting.is_none() && Instant::now() >= self.next_attempt {
            self.connect();
        }

        let polled = self.connecting.as_mut().map(|f| f.poll_unpin(&mut cx));
        match polled {
            Some(Poll::Ready(Ok(stream))) => {
                self.connecting = None;
                let addr = stream.peer_addr().ok();
                self.attach(stream, addr);
            }
            Some(Poll::Ready(Err(e))) => {
                self.connecting = None;
                self.next_attempt = Instant::now() + self.config.reconnect_interval();
                debug!(
                    "Link connection to {} failed: {} - retrying in {}ms",
                    self.config.role.address(),
                    e,
                    self.config.reconnect_interval_ms
                );
            }
            Some(Poll::Pending) | None => {}
        }
    }

    fn attach(&mut self, stream: TcpStream, addr: Option<SocketAddr>) {
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        // A partial line from a previous peer must not prefix the new one.
        self.lines.clear();
        self.outgoing.clear();

        info!(peer = ?addr, device = %self.config.device_name, "Link connected");
        self.stream = Some(stream);
        self.peer_addr = addr;
    }

    fn pump(&mut self) {
        let Some(stream) = self.stream.as_ref() else {
            return;
        };

        let mut lost = None;
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            // Leave the rest in the socket until queued lines are read
            let room = self.lines.spare_capacity().min(READ_CHUNK);
            if room == 0 {
                break;
            }
            match stream.try_read(&mut chunk[..room]) {
                Ok(0) => {
                    lost = Some("peer closed the connection".to_string());
                    break;
                }
                Ok(n) => {
                    trace!(bytes = n, "Link read");
                    self.lines.feed(&chunk[..n]);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    lost = Some(e.to_string());
                    break;
                }
            }
        }

        while lost.is_none() && !self.outgoing.is_empty() {
            match stream.try_write(&self.outgoing) {
                Ok(0) => break,
                Ok(n) => self.outgoing.advance(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => lost = Some(e.to_string()),
            }
        }

        let discarded = self.lines.discarded_lines();
        if discarded > self.reported_discards {
            warn!(
                count = discarded - self.reported_discards,
                "Discarded malformed or overlong link lines"
            );
            self.reported_discards = discarded;
        }

        if let Some(reason) = lost {
            self.drop_connection(&reason);
        }
    }

    /// Forget the connection. Complete lines already received stay
    /// readable; unsent bytes are dropped.
    fn drop_connection(&mut self, reason: &str) {
        warn!(peer = ?self.peer_addr, "Link lost: {}", reason);
        self.stream = None;
        self.peer_addr = None;
        self.outgoing.clear();
        self.next_attempt = Instant::now() + self.config.reconnect_interval();
    }
}

impl LinkChannel for TcpLink {
    fn is_connected(&mut self) -> bool {
        self.service();
        self.stream.is_some()
    }

    fn send_line(&mut self, text: &str) -> bool {
        self.service();
        if self.stream.is_none() {
            debug!("Link down, not sending {:?}", text);
            return false;
        }

        if let Err(e) = self.codec.encode(text, &mut self.outgoing) {
            warn!("Refusing to send line: {}", e);
            return false;
        }
        debug!("Link send {:?}", text);

        self.pump();
        self.stream.is_some()
    }

    fn receive_line(&mut self) -> Option<String> {
        self.service();
        let line = self.lines.next_line();
        if let Some(line) = &line {
            debug!("Link received {:?}", line);
        }
        line
    }
}

impl fmt::Debug for TcpLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpLink")
            .field("role", &self.config.role)
            .field("connected", &self.stream.is_some())
            .field("peer_addr", &self.peer_addr)
            .field("connecting", &self.connecting.is_some())
            .field("pending_bytes", &self.lines.pending_bytes())
            .field("outgoing_bytes", &self.outgoing.len())
            .finish()
    }
}

impl Drop for TcpLink {
    fn drop(&mut self) {
        if self.stream.is_some() {
            debug!("TcpLink dropped while connected - connection will be closed");
        }
    }
}
