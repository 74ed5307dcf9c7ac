//! Common test utilities for engine integration tests.
//!
//! [`Harness`] wires a [`TransactionEngine`] to an in-memory link and
//! recording latch/annunciator fakes, and drives it with a simulated clock:
//! every call advances time by one loop tick, so timeouts are exercised
//! without sleeping.

#![allow(dead_code)]

use std::time::{Duration, Instant};

use locker_core::constants::LOOP_TICK_MS;
use locker_engine::{
    EngineConfig, EngineState, SensorSnapshot, StateTransition, TickInput, TransactionEngine,
};
use locker_hardware::{Annunciator, BeepLength, Key, Latch, LatchPosition};
use locker_network::mock::{MockLink, MockLinkPeer};

pub const TICK: Duration = Duration::from_millis(LOOP_TICK_MS);

/// Student ID used by the happy-path scenarios.
pub const VALID_ID: &str = "123456789";

#[derive(Debug, Default)]
pub struct RecordingLatch {
    pub locks: usize,
    pub unlocks: usize,
    pub position: Option<LatchPosition>,
}

impl Latch for RecordingLatch {
    fn lock(&mut self) {
        self.locks += 1;
        self.position = Some(LatchPosition::Locked);
    }

    fn unlock(&mut self) {
        self.unlocks += 1;
        self.position = Some(LatchPosition::Unlocked);
    }
}

#[derive(Debug, Default)]
pub struct RecordingAnnunciator {
    pub screen: (String, String),
    pub shown: Vec<(String, String)>,
    pub successes: usize,
    pub failures: usize,
    pub beeps: Vec<BeepLength>,
}

impl RecordingAnnunciator {
    /// Whether `text` appeared on either display line at any point.
    pub fn has_shown(&self, text: &str) -> bool {
        self.shown.iter().any(|(l1, l2)| l1 == text || l2 == text)
    }
}

impl Annunciator for RecordingAnnunciator {
    fn show(&mut self, line1: &str, line2: &str) {
        self.screen = (line1.to_string(), line2.to_string());
        self.shown.push(self.screen.clone());
    }

    fn signal_success(&mut self) {
        self.successes += 1;
    }

    fn signal_failure(&mut self) {
        self.failures += 1;
    }

    fn beep(&mut self, length: BeepLength) {
        self.beeps.push(length);
    }
}

pub type TestEngine = TransactionEngine<MockLink, RecordingLatch, RecordingAnnunciator>;

pub struct Harness {
    pub engine: TestEngine,
    pub peer: MockLinkPeer,
    pub now: Instant,
    pub sensors: SensorSnapshot,
}

impl Harness {
    /// Engine with default configuration, box in place, door sensor clear.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let (link, peer) = MockLink::pair();
        let engine = TransactionEngine::new(
            config,
            link,
            RecordingLatch::default(),
            RecordingAnnunciator::default(),
        )
        .unwrap();

        Self {
            engine,
            peer,
            now: Instant::now(),
            sensors: SensorSnapshot::new(true, false),
        }
    }

    /// One loop tick with no key.
    pub fn tick(&mut self) -> Option<StateTransition> {
        self.step(None)
    }

    /// One loop tick with a key press.
    pub fn press(&mut self, c: char) -> Option<StateTransition> {
        let key = Key::from_char(c).unwrap();
        self.step(Some(key))
    }

    /// One tick per character.
    pub fn type_keys(&mut self, keys: &str) {
        for c in keys.chars() {
            self.press(c);
        }
    }

    /// Tick until `duration` of simulated time has passed.
    pub fn run_for(&mut self, duration: Duration) {
        let end = self.now + duration;
        while self.now < end {
            self.tick();
        }
    }

    /// Tick until the engine reaches `state`, giving up after `max_ticks`.
    pub fn run_until(&mut self, state: EngineState, max_ticks: usize) -> bool {
        for _ in 0..max_ticks {
            if self.engine.state() == state {
                return true;
            }
            self.tick();
        }
        self.engine.state() == state
    }

    /// Type `id` and `#`, then tick once so the command goes out.
    pub fn submit(&mut self, id: &str) {
        self.type_keys(id);
        self.press('#');
        self.tick();
    }

    /// Submit `id`, answer with `reply`, and tick once so it is read.
    pub fn submit_and_reply(&mut self, id: &str, reply: &str) {
        self.submit(id);
        self.peer.reply(reply);
        self.tick();
    }

    pub fn set_box(&mut self, present: bool) {
        self.sensors.box_present = present;
    }

    pub fn set_door(&mut self, present: bool) {
        self.sensors.door_present = present;
    }

    pub fn state(&self) -> EngineState {
        self.engine.state()
    }

    pub fn latch(&self) -> &RecordingLatch {
        self.engine.latch()
    }

    pub fn annunciator(&self) -> &RecordingAnnunciator {
        self.engine.annunciator()
    }

    fn step(&mut self, key: Option<Key>) -> Option<StateTransition> {
        self.now += TICK;
        let input = TickInput {
            key,
            sensors: Some(self.sensors),
        };
        self.engine.tick(self.now, input)
    }
}
