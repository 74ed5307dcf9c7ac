//! Borrow/return transaction state machine.
//!
//! The engine is driven by the kiosk's fixed-rate loop: once per tick the
//! loop polls the keypad, samples the presence sensors when the debounce
//! interval has elapsed, and hands both to [`TransactionEngine::tick`]. The
//! engine then polls the link and advances at most one state transition.
//! Nothing here blocks or sleeps; time only moves through the `now` argument.
//!
//! # Flow
//!
//! ```text
//! Idle ──digit──> CollectingId ──#──> RequestingAuth ──send──> AwaitingAuth
//!  ^                  │ * / timeout        │ invalid / no link      │ OK
//!  │                  v                    v                        v
//!  ├──────────────── abort <────────── denied / timeout / link ── PhysicalAction
//!  │                                                                │ sensor edge
//!  └──────────────────────────── Completing <───────────────────────┘
//! ```
//!
//! Leaving `PhysicalAction` always commands the latch locked, whether the
//! transaction completed, timed out or lost the link.

use std::time::{Duration, Instant};

use locker_core::{Result, TransactionKind};
use locker_hardware::{Annunciator, BeepLength, Key, Latch};
use locker_network::LinkChannel;
use locker_protocol::{Command, Reply};
use tracing::{debug, info, warn};

use crate::{
    EngineConfig, EngineState, Notice, StateTransition, Transaction, TransactionError,
    TransactionOutcome, TransactionStatus, TransitionHistory,
};

const PROMPT_HINT: &str = "A/B=mode #=enter";

/// Presence sensor readings taken on one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorSnapshot {
    pub box_present: bool,
    pub door_present: bool,
}

impl SensorSnapshot {
    pub fn new(box_present: bool, door_present: bool) -> Self {
        Self {
            box_present,
            door_present,
        }
    }

    /// Reading of the sensor that confirms a transaction of `kind`.
    pub fn watched(&self, kind: TransactionKind) -> bool {
        match kind {
            TransactionKind::Borrow => self.box_present,
            TransactionKind::Return => self.door_present,
        }
    }
}

/// Peripheral input for one tick.
///
/// `sensors` is `None` on ticks where the loop did not sample them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub key: Option<Key>,
    pub sensors: Option<SensorSnapshot>,
}

impl TickInput {
    pub fn key(key: Key) -> Self {
        Self {
            key: Some(key),
            sensors: None,
        }
    }

    pub fn sensors(sensors: SensorSnapshot) -> Self {
        Self {
            key: None,
            sensors: Some(sensors),
        }
    }
}

/// The kiosk transaction engine.
///
/// Owns the link, the latch, the annunciator and the single live
/// [`Transaction`]. No other component touches them while the engine runs.
///
/// # Example
///
/// ```
/// use std::time::Instant;
/// use locker_engine::{EngineConfig, EngineState, TickInput, TransactionEngine};
/// use locker_hardware::{Annunciator, BeepLength, Key, Latch};
/// use locker_network::mock::MockLink;
///
/// #[derive(Default)]
/// struct Door(bool);
/// impl Latch for Door {
///     fn lock(&mut self) { self.0 = false }
///     fn unlock(&mut self) { self.0 = true }
/// }
///
/// struct Quiet;
/// impl Annunciator for Quiet {
///     fn show(&mut self, _: &str, _: &str) {}
///     fn signal_success(&mut self) {}
///     fn signal_failure(&mut self) {}
///     fn beep(&mut self, _: BeepLength) {}
/// }
///
/// let (link, mut peer) = MockLink::pair();
/// let mut engine =
///     TransactionEngine::new(EngineConfig::default(), link, Door::default(), Quiet).unwrap();
///
/// let now = Instant::now();
/// for c in "123456789#".chars() {
///     engine.tick(now, TickInput::key(Key::from_char(c).unwrap()));
/// }
/// engine.tick(now, TickInput::default());
/// assert_eq!(engine.state(), EngineState::AwaitingAuth);
/// assert_eq!(peer.take_lines(), vec!["BORROW,123456789"]);
/// ```
pub struct TransactionEngine<L, T, A> {
    config: EngineConfig,
    link: L,
    latch: T,
    annunciator: A,

    state: EngineState,
    state_entered_at: Instant,
    transaction: Option<Transaction>,

    /// Kind the next transaction will have.
    selected_kind: TransactionKind,

    /// When the current notice gives way to the idle prompt.
    notice_until: Option<Instant>,

    /// Most recent sensor sample.
    last_sensors: Option<SensorSnapshot>,

    /// Previous reading of the sensor watched in `PhysicalAction`.
    watched: Option<bool>,

    history: TransitionHistory,
    last_outcome: Option<TransactionOutcome>,
}

impl<L, T, A> TransactionEngine<L, T, A>
where
    L: LinkChannel,
    T: Latch,
    A: Annunciator,
{
    /// Create an idle engine and show the idle prompt.
    ///
    /// # Errors
    /// Returns `Error::Config` if `config` fails validation.
    pub fn new(config: EngineConfig, link: L, latch: T, annunciator: A) -> Result<Self> {
        config.validate()?;

        let mut engine = Self {
            config,
            link,
            latch,
            annunciator,
            state: EngineState::Idle,
            state_entered_at: Instant::now(),
            transaction: None,
            selected_kind: TransactionKind::default(),
            notice_until: None,
            last_sensors: None,
            watched: None,
            history: TransitionHistory::new(),
            last_outcome: None,
        };
        engine.show_prompt();
        Ok(engine)
    }

    /// Advance the engine by one tick.
    ///
    /// Returns the state transition taken, if any. At most one transition
    /// happens per call.
    pub fn tick(&mut self, now: Instant, input: TickInput) -> Option<StateTransition> {
        if let Some(sensors) = input.sensors {
            self.last_sensors = Some(sensors);
        }

        match self.state {
            EngineState::Idle => self.on_idle(now, input.key),
            EngineState::CollectingId => self.on_collecting(now, input.key),
            EngineState::RequestingAuth => {
                self.ignore_key(input.key);
                self.on_requesting(now)
            }
            EngineState::AwaitingAuth => {
                self.ignore_key(input.key);
                self.on_awaiting(now)
            }
            EngineState::PhysicalAction => {
                self.ignore_key(input.key);
                self.on_physical(now, input.sensors)
            }
            EngineState::Completing => {
                self.ignore_key(input.key);
                self.on_completing(now)
            }
        }
    }

    fn on_idle(&mut self, now: Instant, key: Option<Key>) -> Option<StateTransition> {
        self.discard_unsolicited();
        if self.notice_until.is_some_and(|until| now >= until) {
            self.notice_until = None;
            self.show_prompt();
        }

        match key? {
            Key::Digit(digit) => {
                let mut transaction =
                    Transaction::new(self.selected_kind, now, self.config.input_timeout());
                transaction.push_digit(digit, self.config.id_bounds.max);
                debug!(kind = %transaction.kind(), "Transaction started");

                self.transaction = Some(transaction);
                self.notice_until = None;
                self.annunciator.beep(BeepLength::Short);
                Some(self.transition(EngineState::CollectingId, now))
            }
            Key::Letter('A') => {
                self.select_kind(TransactionKind::Borrow);
                None
            }
            Key::Letter('B') => {
                self.select_kind(TransactionKind::Return);
                None
            }
            other => {
                debug!("Ignoring key {} while idle", other.as_char());
                None
            }
        }
    }

    fn on_collecting(&mut self, now: Instant, key: Option<Key>) -> Option<StateTransition> {
        self.discard_unsolicited();
        let max_len = self.config.id_bounds.max;
        let transaction = self.transaction.as_mut()?;

        if transaction.is_expired(now) {
            let timeout_ms = self.config.input_timeout_ms;
            return Some(self.abort(TransactionError::InputTimeout { timeout_ms }, now));
        }

        match key? {
            Key::Digit(digit) => {
                if transaction.push_digit(digit, max_len) {
                    self.annunciator.beep(BeepLength::Short);
                    self.show_collecting();
                } else {
                    warn!("Student ID already has {} digits, ignoring {}", max_len, digit);
                }
                None
            }
            Key::Hash => Some(self.transition(EngineState::RequestingAuth, now)),
            Key::Star if transaction.digits().is_empty() => {
                Some(self.abort(TransactionError::Cancelled, now))
            }
            Key::Star => {
                transaction.clear_digits();
                debug!("Student ID cleared");
                self.show_collecting();
                None
            }
            Key::Letter(c) => {
                debug!("Ignoring key {} while collecting", c);
                None
            }
        }
    }

    fn on_requesting(&mut self, now: Instant) -> Option<StateTransition> {
        self.discard_unsolicited();
        let transaction = self.transaction.as_ref()?;

        let student_id = match transaction.student_id(&self.config.id_bounds) {
            Ok(id) => id,
            Err(e) => {
                warn!("Rejecting student ID {:?}: {}", transaction.digits(), e);
                return Some(self.abort(e, now));
            }
        };

        if !self.link.is_connected() {
            return Some(self.abort(TransactionError::LinkUnavailable, now));
        }

        let command = Command::new(transaction.kind(), student_id).to_string();
        if !self.link.send_line(&command) {
            return Some(self.abort(TransactionError::LinkUnavailable, now));
        }
        info!("Sent {}", command);

        Some(self.transition(EngineState::AwaitingAuth, now))
    }

    fn on_awaiting(&mut self, now: Instant) -> Option<StateTransition> {
        if let Some(line) = self.link.receive_line() {
            match self.config.replies.classify(&line) {
                Some(Reply::Granted) => {
                    info!("Authorization granted");
                    if let Some(transaction) = self.transaction.as_mut() {
                        transaction.set_status(TransactionStatus::AuthGranted, None);
                    }
                    return Some(self.transition(EngineState::PhysicalAction, now));
                }
                Some(Reply::Denied) => {
                    let reply = line.trim().to_ascii_uppercase();
                    return Some(self.abort(TransactionError::AuthDenied { reply }, now));
                }
                Some(Reply::Unexpected(reply)) => {
                    warn!("Unexpected reply {:?}, treating as denied", reply);
                    return Some(self.abort(TransactionError::AuthDenied { reply }, now));
                }
                None => debug!("Ignoring blank reply line"),
            }
        }

        if !self.link.is_connected() {
            return Some(self.abort(TransactionError::LinkLost, now));
        }

        if self.deadline_passed(now) {
            let timeout_ms = self.config.auth_timeout_ms;
            return Some(self.abort(TransactionError::AuthTimeout { timeout_ms }, now));
        }

        None
    }

    fn on_physical(
        &mut self,
        now: Instant,
        sensors: Option<SensorSnapshot>,
    ) -> Option<StateTransition> {
        let kind = self.transaction.as_ref()?.kind();

        if !self.link.is_connected() {
            return Some(self.abort(TransactionError::LinkLost, now));
        }

        if let Some(sensors) = sensors {
            let reading = sensors.watched(kind);
            let previous = self.watched.replace(reading);
            let observed = match kind {
                TransactionKind::Borrow => previous == Some(true) && !reading,
                TransactionKind::Return => previous == Some(false) && reading,
            };
            if observed {
                info!("{} confirmed by presence sensor", kind);
                return Some(self.transition(EngineState::Completing, now));
            }
        }

        if self.deadline_passed(now) {
            let timeout_ms = self.config.door_open_timeout_ms;
            return Some(self.abort(TransactionError::PhysicalTimeout { timeout_ms }, now));
        }

        None
    }

    fn on_completing(&mut self, now: Instant) -> Option<StateTransition> {
        let transaction = self.transaction.take()?;
        let outcome = transaction.finish(None, now);
        info!(
            kind = %outcome.kind,
            student_id = %outcome.digits,
            elapsed_ms = outcome.duration.as_millis() as u64,
            "Transaction completed"
        );

        Notice::completed(outcome.kind).announce(&mut self.annunciator);
        self.last_outcome = Some(outcome);
        self.notice_until = Some(now + self.config.display_message());
        Some(self.transition(EngineState::Idle, now))
    }

    /// End the live transaction with `error` and return to `Idle`.
    fn abort(&mut self, error: TransactionError, now: Instant) -> StateTransition {
        if self.state == EngineState::PhysicalAction {
            self.latch.lock();
        }

        warn!(state = %self.state, "Transaction aborted: {}", error);
        Notice::failed(&error).announce(&mut self.annunciator);

        self.last_outcome = self
            .transaction
            .take()
            .map(|transaction| transaction.finish(Some(error), now));
        self.notice_until = Some(now + self.config.display_message());
        self.transition(EngineState::Idle, now)
    }

    fn transition(&mut self, to: EngineState, now: Instant) -> StateTransition {
        debug_assert!(
            self.state.can_transition_to(&to),
            "invalid transition {} -> {}",
            self.state,
            to
        );

        let transition = StateTransition {
            from: self.state,
            to,
            at: now,
        };
        info!("State transition: {} -> {}", self.state, to);

        self.state = to;
        self.state_entered_at = now;
        self.history.record(transition);
        self.enter(now);

        transition
    }

    /// Entry actions: replace the deadline and update the annunciator.
    fn enter(&mut self, now: Instant) {
        let auth_deadline = now + self.config.auth_timeout();
        let door_deadline = now + self.config.door_open_timeout();

        match self.state {
            EngineState::Idle => {
                self.transaction = None;
                self.watched = None;
                self.selected_kind = TransactionKind::default();
            }
            EngineState::CollectingId => self.show_collecting(),
            EngineState::RequestingAuth => {
                if let Some(transaction) = self.transaction.as_mut() {
                    transaction.set_status(TransactionStatus::Collecting, None);
                }
                let digits = self.digits().to_string();
                self.annunciator.show("Checking ID...", &digits);
            }
            EngineState::AwaitingAuth => {
                if let Some(transaction) = self.transaction.as_mut() {
                    transaction.set_status(TransactionStatus::AwaitingAuth, Some(auth_deadline));
                }
                let digits = self.digits().to_string();
                self.annunciator.show("Authorizing...", &digits);
            }
            EngineState::PhysicalAction => {
                let Some(transaction) = self.transaction.as_mut() else {
                    return;
                };
                transaction.set_status(
                    TransactionStatus::WaitingForPhysicalAction,
                    Some(door_deadline),
                );
                let kind = transaction.kind();
                self.watched = self.last_sensors.map(|s| s.watched(kind));

                self.latch.unlock();
                let instruction = match kind {
                    TransactionKind::Borrow => "Take the box",
                    TransactionKind::Return => "Insert the box",
                };
                self.annunciator.show("Door unlocked", instruction);
                self.annunciator.beep(BeepLength::Short);
            }
            EngineState::Completing => {
                if let Some(transaction) = self.transaction.as_mut() {
                    transaction.clear_deadline();
                }
                self.latch.lock();
            }
        }
    }

    fn select_kind(&mut self, kind: TransactionKind) {
        debug!("Selected {}", kind);
        self.selected_kind = kind;
        self.notice_until = None;
        self.show_prompt();
    }

    fn ignore_key(&self, key: Option<Key>) {
        if let Some(key) = key {
            debug!("Ignoring key {} in state {}", key.as_char(), self.state);
        }
    }

    /// Drop lines that arrive while no command is outstanding, so a late
    /// reply can never answer the next transaction.
    fn discard_unsolicited(&mut self) {
        while let Some(line) = self.link.receive_line() {
            warn!("Discarding unsolicited line {:?}", line);
        }
    }

    fn deadline_passed(&self, now: Instant) -> bool {
        self.transaction.as_ref().is_some_and(|t| t.is_expired(now))
    }

    fn digits(&self) -> &str {
        self.transaction.as_ref().map_or("", |t| t.digits())
    }

    fn show_prompt(&mut self) {
        let line1 = format!("{}: enter ID", self.selected_kind);
        self.annunciator.show(&line1, PROMPT_HINT);
    }

    fn show_collecting(&mut self) {
        let Some(transaction) = self.transaction.as_ref() else {
            return;
        };
        let line1 = format!("{} ID:", transaction.kind());
        let line2 = transaction.digits().to_string();
        self.annunciator.show(&line1, &line2);
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Time spent in the current state as of `now`.
    pub fn time_in_state(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.state_entered_at)
    }

    /// The live transaction, if any.
    pub fn transaction(&self) -> Option<&Transaction> {
        self.transaction.as_ref()
    }

    /// Kind the next transaction will have.
    pub fn selected_kind(&self) -> TransactionKind {
        self.selected_kind
    }

    /// Whether a notice is still on the display.
    pub fn is_showing_notice(&self) -> bool {
        self.notice_until.is_some()
    }

    pub fn last_outcome(&self) -> Option<&TransactionOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn history(&self) -> &TransitionHistory {
        &self.history
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn latch(&self) -> &T {
        &self.latch
    }

    pub fn annunciator(&self) -> &A {
        &self.annunciator
    }

    pub fn annunciator_mut(&mut self) -> &mut A {
        &mut self.annunciator
    }
}
