//! The polling loop on the emulated board, with time paused.

use std::time::Duration;

use locker_core::constants::{DOOR_LOCKED_ANGLE, DOOR_UNLOCKED_ANGLE, LONG_BEEP_MS};
use locker_engine::{EngineState, TransactionEngine, TransactionError};
use locker_hardware::Latch;
use locker_hardware::mock::{MockAnalog, MockKeypad};
use locker_kiosk::board::{BoardLatch, BoardPanel};
use locker_kiosk::{BoardControls, Devices, Kiosk, KioskConfig, halt};
use locker_network::mock::{MockLink, MockLinkPeer};
use tokio::sync::oneshot;
use tokio::time::sleep;

type BoardKiosk = Kiosk<MockKeypad, MockAnalog, MockLink, BoardLatch, BoardPanel>;

fn build() -> (BoardKiosk, BoardControls, MockLinkPeer) {
    let config = KioskConfig::default();
    let (mut devices, controls) = Devices::emulated(&config, true);
    devices.init().unwrap();

    let (link, peer) = MockLink::pair();
    let engine =
        TransactionEngine::new(config.engine.clone(), link, devices.latch, devices.panel).unwrap();
    let kiosk = Kiosk::new(
        devices.keypad,
        devices.box_sensor,
        devices.door_sensor,
        engine,
        config.sensor_interval(),
    );
    (kiosk, controls, peer)
}

fn screen(controls: &BoardControls) -> (String, String) {
    let [line1, line2] = controls.screen.lines();
    (line1.trim_end().to_string(), line2.trim_end().to_string())
}

#[tokio::test(start_paused = true)]
async fn test_borrow_through_polling_loop() {
    let (mut kiosk, controls, mut peer) = build();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let script = async {
        controls.keys.enter_id("123456789").unwrap();
        sleep(Duration::from_millis(500)).await;
        assert_eq!(peer.take_lines(), vec!["BORROW,123456789"]);
        assert_eq!(screen(&controls).0, "Authorizing...");

        peer.reply("OK");
        sleep(Duration::from_millis(300)).await;
        assert_eq!(controls.servo.angle(), Some(DOOR_UNLOCKED_ANGLE));
        assert_eq!(screen(&controls).1, "Take the box");

        controls.set_box(false);
        sleep(Duration::from_millis(500)).await;
        assert_eq!(controls.servo.angle(), Some(DOOR_LOCKED_ANGLE));
        assert_eq!(screen(&controls).0, "Box borrowed");

        stop_tx.send(()).unwrap();
    };
    let run = kiosk.run(Duration::from_millis(20), async {
        let _ = stop_rx.await;
    });
    tokio::join!(run, script);

    let outcome = kiosk.engine().last_outcome().unwrap();
    assert!(outcome.is_success());
    assert_eq!(kiosk.engine().state(), EngineState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_denied_through_polling_loop() {
    let (mut kiosk, controls, mut peer) = build();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let script = async {
        controls.keys.press_char('B').unwrap();
        controls.keys.enter_id("12345678").unwrap();
        sleep(Duration::from_millis(500)).await;
        assert_eq!(peer.take_lines(), vec!["RETURN,12345678"]);

        peer.reply("DENIED");
        sleep(Duration::from_millis(100)).await;
        assert_eq!(screen(&controls).0, "Access denied");
        assert!(controls.buzzer.is_on());

        sleep(Duration::from_millis(LONG_BEEP_MS + 100)).await;
        assert!(!controls.buzzer.is_on());

        stop_tx.send(()).unwrap();
    };
    let run = kiosk.run(Duration::from_millis(20), async {
        let _ = stop_rx.await;
    });
    tokio::join!(run, script);

    assert_eq!(controls.servo.write_count(), 1);
    assert_eq!(
        kiosk.engine().last_outcome().unwrap().error,
        Some(TransactionError::AuthDenied {
            reply: "DENIED".to_string()
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_sensors_sampled_at_debounce_interval() {
    let (mut kiosk, controls, mut peer) = build();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let script = async {
        controls.keys.enter_id("123456789").unwrap();
        sleep(Duration::from_millis(500)).await;
        peer.take_lines();
        peer.reply("OK");
        sleep(Duration::from_millis(300)).await;

        // A removal shorter than the sampling interval can go unseen, but a
        // removal that outlasts it always completes the borrow.
        controls.set_box(false);
        sleep(Duration::from_millis(250)).await;
        assert_eq!(controls.servo.angle(), Some(DOOR_LOCKED_ANGLE));

        stop_tx.send(()).unwrap();
    };
    let run = kiosk.run(Duration::from_millis(20), async {
        let _ = stop_rx.await;
    });
    tokio::join!(run, script);
}

#[tokio::test(start_paused = true)]
async fn test_stop_with_door_open_leaves_engine_state() {
    let (mut kiosk, controls, mut peer) = build();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let script = async {
        controls.keys.enter_id("123456789").unwrap();
        sleep(Duration::from_millis(500)).await;
        peer.take_lines();
        peer.reply("OK");
        sleep(Duration::from_millis(300)).await;
        stop_tx.send(()).unwrap();
    };
    let run = kiosk.run(Duration::from_millis(20), async {
        let _ = stop_rx.await;
    });
    tokio::join!(run, script);

    assert_eq!(kiosk.engine().state(), EngineState::PhysicalAction);
}

#[tokio::test(start_paused = true)]
async fn test_startup_fault_halts_locked() {
    let (mut devices, controls) = Devices::emulated(&KioskConfig::default(), false);
    assert!(devices.init().is_err());
    devices.latch.unlock();

    halt(
        devices.latch,
        devices.panel,
        "LCD not found",
        sleep(Duration::from_millis(LONG_BEEP_MS * 5)),
    )
    .await;

    assert_eq!(controls.servo.angle(), Some(DOOR_LOCKED_ANGLE));
    assert_eq!(screen(&controls).0, "Hardware fault");
    assert!(controls.buzzer.switch_count() >= 3);
    assert!(!controls.led.is_on());
}
