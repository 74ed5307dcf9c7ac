//! Property-based tests for line framing and command parsing.

use locker_core::{StudentId, TransactionKind};
use locker_protocol::{Command, LineBuffer, Reply, ReplyPolicy};
use proptest::prelude::*;

/// Strategy for generating student IDs (1-12 digits).
fn student_id() -> impl Strategy<Value = String> {
    prop::string::string_regex("[0-9]{1,12}").expect("Failed to create student ID strategy")
}

/// Strategy for generating transaction kinds.
fn kind() -> impl Strategy<Value = TransactionKind> {
    prop_oneof![Just(TransactionKind::Borrow), Just(TransactionKind::Return)]
}

/// Strategy for generating terminator-free printable lines.
fn line_text() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ -~]{0,40}").expect("Failed to create line strategy")
}

proptest! {
    /// Property: a command survives display + parse unchanged.
    #[test]
    fn prop_command_parse_inverts_display(id in student_id(), kind in kind()) {
        let command = Command::new(kind, StudentId::new(&id).unwrap());
        let parsed: Command = command.to_string().parse().unwrap();
        prop_assert_eq!(parsed, command);
    }

    /// Property: however the byte stream is chunked, the same lines come out
    /// in the same order.
    #[test]
    fn prop_chunking_does_not_change_lines(
        lines in prop::collection::vec(line_text(), 1..6),
        chunk in 1usize..16,
    ) {
        let wire: Vec<u8> = lines
            .iter()
            .flat_map(|l| l.bytes().chain(std::iter::once(b'\n')))
            .collect();

        let mut buffer = LineBuffer::new();
        let mut received = Vec::new();
        for piece in wire.chunks(chunk) {
            buffer.feed(piece);
            while let Some(line) = buffer.next_line() {
                received.push(line);
            }
        }

        prop_assert_eq!(received, lines);
        prop_assert_eq!(buffer.pending_bytes(), 0);
    }

    /// Property: polling without feeding never produces a line.
    #[test]
    fn prop_no_line_without_terminator(partial in line_text(), polls in 1usize..20) {
        let mut buffer = LineBuffer::new();
        buffer.feed(partial.as_bytes());
        for _ in 0..polls {
            prop_assert_eq!(buffer.next_line(), None);
        }
    }

    /// Property: memory stays bounded for terminator-free input.
    #[test]
    fn prop_buffer_bounded(noise in prop::collection::vec(any::<u8>().prop_filter("no terminator", |b| *b != b'\n'), 0..2000)) {
        let mut buffer = LineBuffer::with_max_line_length(32);
        for piece in noise.chunks(7) {
            buffer.feed(piece);
            // One extra byte when the tail ends in a carriage return
            prop_assert!(buffer.pending_bytes() <= 33);
        }
    }

    /// Property: anything outside the grant set never grants.
    #[test]
    fn prop_only_grant_words_grant(text in line_text()) {
        let policy = ReplyPolicy::default();
        if let Some(Reply::Granted) = policy.classify(&text) {
            let normalized = text.trim().to_ascii_uppercase();
            prop_assert!(policy.granted.contains(&normalized));
        }
    }
}
