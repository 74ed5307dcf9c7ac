//! Integration tests for LineCodec with Tokio streams.
//!
//! A duplex pipe stands in for the serial-profile link: one end is framed
//! as the kiosk, the other as the authorization peer.

use futures::{SinkExt, StreamExt};
use locker_core::{StudentId, TransactionKind};
use locker_protocol::{Command, LineCodec, Reply, ReplyPolicy};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio_util::codec::Framed;

/// Helper function to create a framed duplex stream for testing.
fn create_framed_duplex(
    buffer_size: usize,
) -> (Framed<DuplexStream, LineCodec>, Framed<DuplexStream, LineCodec>) {
    let (kiosk, peer) = tokio::io::duplex(buffer_size);
    (
        Framed::new(kiosk, LineCodec::new()),
        Framed::new(peer, LineCodec::new()),
    )
}

#[tokio::test]
async fn test_command_and_reply_roundtrip() {
    let (mut kiosk, mut peer) = create_framed_duplex(256);

    let command = Command::new(
        TransactionKind::Borrow,
        StudentId::new("123456789").unwrap(),
    );
    kiosk.send(command.to_string()).await.unwrap();

    let received = peer.next().await.unwrap().unwrap();
    let parsed: Command = received.parse().unwrap();
    assert_eq!(parsed, command);

    peer.send("OK").await.unwrap();
    let reply = kiosk.next().await.unwrap().unwrap();
    assert_eq!(ReplyPolicy::default().classify(&reply), Some(Reply::Granted));
}

#[tokio::test]
async fn test_send_writes_exact_bytes() {
    let (kiosk, mut raw_peer) = tokio::io::duplex(64);
    let mut kiosk = Framed::new(kiosk, LineCodec::new());

    kiosk.send("OK").await.unwrap();

    let mut buf = [0u8; 16];
    let n = raw_peer.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"OK\n");
}

#[tokio::test]
async fn test_multiple_lines_in_one_write() {
    let (kiosk, mut raw_peer) = tokio::io::duplex(256);
    let mut kiosk = Framed::new(kiosk, LineCodec::new());

    raw_peer.write_all(b"OK\r\nDENIED\nmaybe\n").await.unwrap();

    assert_eq!(kiosk.next().await.unwrap().unwrap(), "OK");
    assert_eq!(kiosk.next().await.unwrap().unwrap(), "DENIED");
    assert_eq!(kiosk.next().await.unwrap().unwrap(), "maybe");
}

#[tokio::test]
async fn test_line_split_across_writes() {
    let (kiosk, mut raw_peer) = tokio::io::duplex(256);
    let mut kiosk = Framed::new(kiosk, LineCodec::new());

    tokio::spawn(async move {
        for chunk in [&b"RET"[..], b"URN,1234", b"5678", b"\n"] {
            raw_peer.write_all(chunk).await.unwrap();
            tokio::task::yield_now().await;
        }
    });

    assert_eq!(kiosk.next().await.unwrap().unwrap(), "RETURN,12345678");
}

#[tokio::test]
async fn test_runaway_line_is_skipped() {
    let (kiosk, mut raw_peer) = tokio::io::duplex(4096);
    let mut kiosk = Framed::new(kiosk, LineCodec::with_max_line_length(16));

    raw_peer.write_all(&[b'X'; 100]).await.unwrap();
    raw_peer.write_all(b"\nOK\n").await.unwrap();

    assert_eq!(kiosk.next().await.unwrap().unwrap(), "OK");
    assert_eq!(kiosk.codec().discarded_lines(), 1);
}

#[tokio::test]
async fn test_stream_ends_on_close() {
    let (kiosk, raw_peer) = tokio::io::duplex(64);
    let mut kiosk = Framed::new(kiosk, LineCodec::new());

    drop(raw_peer);
    assert!(kiosk.next().await.is_none());
}
