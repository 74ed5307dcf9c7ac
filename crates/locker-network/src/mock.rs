//! In-memory link for tests and development.
//!
//! [`MockLink`] implements [`LinkChannel`] with the same framing rules as
//! [`TcpLink`](crate::TcpLink); the paired [`MockLinkPeer`] plays the
//! authorization peer and sees exactly the bytes the link produced.

use bytes::BytesMut;
use locker_protocol::{LineBuffer, LineCodec};
use tokio::sync::{mpsc, watch};
use tokio_util::codec::Encoder;
use tracing::debug;

use crate::LinkChannel;

/// Kiosk side of an in-memory link.
///
/// # Example
///
/// ```
/// use locker_network::LinkChannel;
/// use locker_network::mock::MockLink;
///
/// let (mut link, mut peer) = MockLink::pair();
/// assert!(link.is_connected());
///
/// assert!(link.send_line("OK"));
/// assert_eq!(peer.read_raw(), b"OK\n");
///
/// peer.send_raw(b"DEN");
/// assert_eq!(link.receive_line(), None);
/// peer.send_raw(b"IED\n");
/// assert_eq!(link.receive_line().as_deref(), Some("DENIED"));
/// ```
#[derive(Debug)]
pub struct MockLink {
    to_peer: mpsc::UnboundedSender<Vec<u8>>,
    from_peer: mpsc::UnboundedReceiver<Vec<u8>>,
    connected: watch::Receiver<bool>,

    /// Last observed liveness, used to reset framing on reconnect.
    was_connected: bool,

    codec: LineCodec,
    lines: LineBuffer,
}

impl MockLink {
    /// Create a connected link and its peer.
    pub fn pair() -> (Self, MockLinkPeer) {
        let (to_peer, peer_rx) = mpsc::unbounded_channel();
        let (peer_tx, from_peer) = mpsc::unbounded_channel();
        let (connected_tx, connected) = watch::channel(true);

        let link = Self {
            to_peer,
            from_peer,
            connected,
            was_connected: true,
            codec: LineCodec::new(),
            lines: LineBuffer::new(),
        };
        let peer = MockLinkPeer {
            rx: peer_rx,
            tx: peer_tx,
            connected: connected_tx,
            inbound: LineBuffer::new(),
        };
        (link, peer)
    }

    /// Current liveness; a dropped peer counts as disconnected.
    fn alive(&self) -> bool {
        self.connected.has_changed().is_ok() && *self.connected.borrow()
    }

    fn service(&mut self) {
        let alive = self.alive();
        if alive && !self.was_connected {
            self.lines.clear();
        }
        self.was_connected = alive;

        while let Ok(bytes) = self.from_peer.try_recv() {
            if alive {
                self.lines.feed(&bytes);
            }
        }
    }
}

impl LinkChannel for MockLink {
    fn is_connected(&mut self) -> bool {
        self.service();
        self.was_connected
    }

    fn send_line(&mut self, text: &str) -> bool {
        self.service();
        if !self.was_connected {
            return false;
        }

        let mut frame = BytesMut::new();
        if self.codec.encode(text, &mut frame).is_err() {
            return false;
        }
        debug!("Mock link send {:?}", text);
        self.to_peer.send(frame.to_vec()).is_ok()
    }

    fn receive_line(&mut self) -> Option<String> {
        self.service();
        self.lines.next_line()
    }
}

/// Peer side of an in-memory link.
#[derive(Debug)]
pub struct MockLinkPeer {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    tx: mpsc::UnboundedSender<Vec<u8>>,
    connected: watch::Sender<bool>,
    inbound: LineBuffer,
}

impl MockLinkPeer {
    /// Bring the link up or down.
    ///
    /// While down, bytes sent by the peer are lost.
    pub fn set_connected(&self, connected: bool) {
        self.connected.send_replace(connected);
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Deliver raw bytes to the link.
    pub fn send_raw(&self, bytes: &[u8]) {
        // The link outlives the peer in every test; a closed channel just
        // means nobody is listening any more.
        let _ = self.tx.send(bytes.to_vec());
    }

    /// Deliver `text` plus the line terminator.
    pub fn reply(&self, text: &str) {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(b'\n');
        self.send_raw(&bytes);
    }

    /// Everything the link has sent since the last call, byte for byte.
    pub fn read_raw(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        while let Ok(bytes) = self.rx.try_recv() {
            out.extend_from_slice(&bytes);
        }
        out
    }

    /// Complete lines the link has sent since the last call.
    pub fn take_lines(&mut self) -> Vec<String> {
        let bytes = self.read_raw();
        self.inbound.feed(&bytes);
        std::iter::from_fn(|| self.inbound.next_line()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_is_exact() {
        let (mut link, mut peer) = MockLink::pair();
        assert!(link.send_line("OK"));
        assert_eq!(peer.read_raw(), b"OK\n".to_vec());
        assert!(peer.read_raw().is_empty());
    }

    #[test]
    fn test_no_fabricated_lines() {
        let (mut link, peer) = MockLink::pair();
        peer.send_raw(b"OK");
        for _ in 0..20 {
            assert_eq!(link.receive_line(), None);
        }
    }

    #[test]
    fn test_one_line_per_call() {
        let (mut link, peer) = MockLink::pair();
        peer.send_raw(b"OK\nDENIED\n");

        assert_eq!(link.receive_line().as_deref(), Some("OK"));
        assert_eq!(link.receive_line().as_deref(), Some("DENIED"));
        assert_eq!(link.receive_line(), None);
    }

    #[test]
    fn test_disconnected_send_fails() {
        let (mut link, mut peer) = MockLink::pair();
        peer.set_connected(false);

        assert!(!link.is_connected());
        assert!(!link.send_line("BORROW,12345678"));
        assert!(peer.read_raw().is_empty());
    }

    #[test]
    fn test_reconnect_drops_partial_line() {
        let (mut link, peer) = MockLink::pair();
        peer.send_raw(b"PART");
        assert_eq!(link.receive_line(), None);

        peer.set_connected(false);
        assert!(!link.is_connected());
        peer.set_connected(true);
        peer.reply("OK");

        assert!(link.is_connected());
        assert_eq!(link.receive_line().as_deref(), Some("OK"));
    }

    #[test]
    fn test_dropped_peer_is_disconnect() {
        let (mut link, peer) = MockLink::pair();
        drop(peer);
        assert!(!link.is_connected());
        assert!(!link.send_line("OK"));
    }

    #[test]
    fn test_embedded_terminator_refused() {
        let (mut link, mut peer) = MockLink::pair();
        assert!(!link.send_line("OK\nOK"));
        assert!(peer.read_raw().is_empty());
    }

    #[test]
    fn test_take_lines() {
        let (mut link, mut peer) = MockLink::pair();
        link.send_line("BORROW,123456789");
        link.send_line("RETURN,123456789");
        assert_eq!(
            peer.take_lines(),
            vec!["BORROW,123456789", "RETURN,123456789"]
        );
    }
}
