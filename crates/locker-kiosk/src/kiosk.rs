//! The fixed-rate polling loop.
//!
//! Each tick polls the keypad, samples the presence sensors when their
//! interval is due, advances the engine once and lets the annunciator end
//! any timed effects. Nothing in a tick waits on a device.

use std::future::Future;
use std::time::{Duration, Instant};

use locker_core::constants::LONG_BEEP_MS;
use locker_engine::{SensorSnapshot, StateTransition, TickInput, TransactionEngine};
use locker_hardware::{AnalogInput, Annunciator, KeyInput, Latch, PresenceSensor};
use locker_network::LinkChannel;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Halt loop ticks between two failure signals.
const HALT_SIGNAL_TICKS: u32 = 4;

/// Keypad, sensors and engine driven together by one loop.
pub struct Kiosk<K, S, L, T, A> {
    keypad: K,
    box_sensor: PresenceSensor<S>,
    door_sensor: PresenceSensor<S>,
    engine: TransactionEngine<L, T, A>,

    sensor_interval: Duration,
    next_sample: Option<Instant>,
}

impl<K, S, L, T, A> Kiosk<K, S, L, T, A>
where
    K: KeyInput,
    S: AnalogInput,
    L: LinkChannel,
    T: Latch,
    A: Annunciator,
{
    pub fn new(
        keypad: K,
        box_sensor: PresenceSensor<S>,
        door_sensor: PresenceSensor<S>,
        engine: TransactionEngine<L, T, A>,
        sensor_interval: Duration,
    ) -> Self {
        Self {
            keypad,
            box_sensor,
            door_sensor,
            engine,
            sensor_interval,
            next_sample: None,
        }
    }

    /// Run one tick at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<StateTransition> {
        let key = match self.keypad.poll() {
            Ok(key) => key,
            Err(e) => {
                error!(error = %e, "Keypad poll failed");
                None
            }
        };

        let sensors = if self.next_sample.is_none_or(|due| now >= due) {
            self.next_sample = Some(now + self.sensor_interval);
            self.sample()
        } else {
            None
        };

        let transition = self.engine.tick(now, TickInput { key, sensors });
        self.engine.annunciator_mut().update(now);
        transition
    }

    /// Poll every `tick` until `shutdown` resolves.
    ///
    /// Late ticks are skipped rather than replayed in a burst.
    pub async fn run<F>(&mut self, tick: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!("Kiosk loop running every {:?}", tick);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Kiosk loop stopping in state {}", self.engine.state());
                    break;
                }
                instant = interval.tick() => {
                    self.poll(instant.into_std());
                }
            }
        }
    }

    pub fn engine(&self) -> &TransactionEngine<L, T, A> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut TransactionEngine<L, T, A> {
        &mut self.engine
    }

    fn sample(&mut self) -> Option<SensorSnapshot> {
        match (self.box_sensor.read(), self.door_sensor.read()) {
            (Ok(box_present), Ok(door_present)) => {
                Some(SensorSnapshot::new(box_present, door_present))
            }
            (Err(e), _) | (_, Err(e)) => {
                error!(error = %e, "Presence sensor read failed");
                None
            }
        }
    }
}

/// Startup fault loop: keep the latch locked and signal failure until
/// `shutdown` resolves.
pub async fn halt<T, A, F>(mut latch: T, mut annunciator: A, reason: &str, shutdown: F)
where
    T: Latch,
    A: Annunciator,
    F: Future<Output = ()>,
{
    error!("Halting: {}", reason);
    latch.lock();
    annunciator.show("Hardware fault", reason);

    let mut interval = tokio::time::interval(Duration::from_millis(LONG_BEEP_MS / 2));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut ticks: u32 = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            instant = interval.tick() => {
                annunciator.update(instant.into_std());
                if ticks % HALT_SIGNAL_TICKS == 0 {
                    annunciator.signal_failure();
                }
                ticks = ticks.wrapping_add(1);
            }
        }
    }
}
