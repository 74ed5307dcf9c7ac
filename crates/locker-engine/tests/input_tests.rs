//! Keypad handling: ID collection, cancel, bounds and input timeout.

mod common;

use std::time::Duration;

use common::{Harness, VALID_ID};
use locker_core::constants::INPUT_TIMEOUT_MS;
use locker_engine::{EngineConfig, EngineState, TransactionError, TransactionStatus};
use locker_hardware::BeepLength;
use rstest::rstest;

#[test]
fn test_starts_idle_with_prompt() {
    let h = Harness::new();
    assert_eq!(h.state(), EngineState::Idle);
    assert_eq!(
        h.annunciator().screen,
        ("Borrow: enter ID".to_string(), "A/B=mode #=enter".to_string())
    );
}

#[test]
fn test_first_digit_creates_transaction() {
    let mut h = Harness::new();
    let transition = h.press('7').unwrap();

    assert_eq!(transition.from, EngineState::Idle);
    assert_eq!(transition.to, EngineState::CollectingId);
    let transaction = h.engine.transaction().unwrap();
    assert_eq!(transaction.digits(), "7");
    assert_eq!(transaction.status(), TransactionStatus::Collecting);
}

#[test]
fn test_digits_are_echoed() {
    let mut h = Harness::new();
    h.type_keys("2024");
    assert_eq!(
        h.annunciator().screen,
        ("Borrow ID:".to_string(), "2024".to_string())
    );
    assert_eq!(h.annunciator().beeps, vec![BeepLength::Short; 4]);
}

#[rstest]
#[case('#')]
#[case('*')]
#[case('C')]
#[case('D')]
fn test_non_digits_do_not_start_transaction(#[case] key: char) {
    let mut h = Harness::new();
    assert!(h.press(key).is_none());
    assert_eq!(h.state(), EngineState::Idle);
    assert!(h.engine.transaction().is_none());
}

#[test]
fn test_letters_ignored_while_collecting() {
    let mut h = Harness::new();
    h.type_keys("12A3B4C");
    assert_eq!(h.engine.transaction().unwrap().digits(), "1234");
    assert_eq!(
        h.engine.transaction().unwrap().kind(),
        locker_core::TransactionKind::Borrow
    );
}

#[test]
fn test_enter_moves_to_requesting_only() {
    let mut h = Harness::new();
    h.type_keys(VALID_ID);

    let transition = h.press('#').unwrap();
    assert_eq!(transition.to, EngineState::RequestingAuth);
    assert!(h.peer.take_lines().is_empty());

    let transition = h.tick().unwrap();
    assert_eq!(transition.to, EngineState::AwaitingAuth);
    assert_eq!(h.peer.take_lines().len(), 1);
}

#[test]
fn test_max_length_accepted() {
    let mut h = Harness::new();
    h.submit("123456789");
    assert_eq!(h.peer.take_lines(), vec!["BORROW,123456789"]);
}

#[test]
fn test_digit_beyond_max_is_ignored() {
    let mut h = Harness::new();
    h.type_keys("1234567890");
    assert_eq!(h.engine.transaction().unwrap().digits(), "123456789");

    h.press('#');
    h.tick();
    assert_eq!(h.peer.take_lines(), vec!["BORROW,123456789"]);
}

#[rstest]
#[case("")]
#[case("1")]
#[case("1234567")]
fn test_short_id_rejected_without_sending(#[case] digits: &str) {
    let mut h = Harness::new();
    // An empty ID needs a digit to start the transaction, then a clear
    if digits.is_empty() {
        h.type_keys("5*");
    } else {
        h.type_keys(digits);
    }
    h.press('#');
    h.tick();

    assert_eq!(h.state(), EngineState::Idle);
    assert!(h.peer.take_lines().is_empty());
    assert!(h.annunciator().has_shown("Invalid ID"));
    assert_eq!(
        h.engine.last_outcome().unwrap().error,
        Some(TransactionError::InputInvalid {
            len: digits.len(),
            min: 8,
            max: 9
        })
    );
}

#[test]
fn test_custom_bounds() {
    let mut config = EngineConfig::default();
    config.id_bounds.min = 4;
    config.id_bounds.max = 6;
    let mut h = Harness::with_config(config);

    h.type_keys("12345678");
    assert_eq!(h.engine.transaction().unwrap().digits(), "123456");
    h.press('#');
    h.tick();
    assert_eq!(h.peer.take_lines(), vec!["BORROW,123456"]);
}

#[test]
fn test_star_clears_then_cancels() {
    let mut h = Harness::new();
    h.type_keys("1234");

    assert!(h.press('*').is_none());
    assert_eq!(h.state(), EngineState::CollectingId);
    assert_eq!(h.engine.transaction().unwrap().digits(), "");
    assert_eq!(h.annunciator().screen.1, "");

    let transition = h.press('*').unwrap();
    assert_eq!(transition.to, EngineState::Idle);
    assert!(h.annunciator().has_shown("Cancelled"));
    assert_eq!(
        h.engine.last_outcome().unwrap().error,
        Some(TransactionError::Cancelled)
    );
}

#[test]
fn test_cleared_id_can_be_retyped() {
    let mut h = Harness::new();
    h.type_keys("999*");
    h.submit(VALID_ID);
    assert_eq!(h.peer.take_lines(), vec!["BORROW,123456789"]);
}

#[test]
fn test_star_ignored_while_awaiting() {
    let mut h = Harness::new();
    h.submit(VALID_ID);

    assert!(h.press('*').is_none());
    assert_eq!(h.state(), EngineState::AwaitingAuth);

    h.peer.reply("OK");
    h.tick();
    assert!(h.press('*').is_none());
    assert_eq!(h.state(), EngineState::PhysicalAction);
}

#[test]
fn test_keys_ignored_during_physical_action() {
    let mut h = Harness::new();
    h.submit_and_reply(VALID_ID, "OK");
    h.type_keys("12#B");
    assert_eq!(h.state(), EngineState::PhysicalAction);
    assert_eq!(h.engine.transaction().unwrap().digits(), VALID_ID);
}

#[test]
fn test_input_timeout() {
    let mut h = Harness::new();
    h.type_keys("1234");

    h.run_for(Duration::from_millis(INPUT_TIMEOUT_MS - 200));
    assert_eq!(h.state(), EngineState::CollectingId);

    h.run_for(Duration::from_millis(300));
    assert_eq!(h.state(), EngineState::Idle);
    assert!(h.annunciator().has_shown("Timed out"));
    assert_eq!(
        h.engine.last_outcome().unwrap().status,
        TransactionStatus::TimedOut
    );
}

#[test]
fn test_input_deadline_runs_from_first_digit() {
    let mut h = Harness::new();
    h.press('1');
    for _ in 0..(INPUT_TIMEOUT_MS / 1_000) {
        h.run_for(Duration::from_millis(980));
        h.press('2');
    }
    assert_eq!(h.state(), EngineState::Idle);
}

#[test]
fn test_last_mode_key_wins() {
    let mut h = Harness::new();
    h.press('B');
    h.press('A');
    assert_eq!(h.engine.selected_kind(), locker_core::TransactionKind::Borrow);
    assert_eq!(h.annunciator().screen.0, "Borrow: enter ID");
}
