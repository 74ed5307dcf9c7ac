//! Engine states and transition history.
//!
//! # Valid Transitions
//!
//! - Idle → CollectingId → RequestingAuth → AwaitingAuth → PhysicalAction → Completing → Idle
//! - CollectingId, RequestingAuth, AwaitingAuth, PhysicalAction → Idle (abort)
//!
//! The flow is strictly linear; each non-idle state has exactly one abort
//! edge back to `Idle`.

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Maximum number of state transitions kept in history.
///
/// A complete borrow is six transitions, so this covers the last dozen or so
/// transactions.
pub const MAX_HISTORY_SIZE: usize = 100;

/// Phase of the kiosk transaction flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// No live transaction; showing the prompt or a notice.
    #[default]
    Idle,

    /// Accumulating keypad digits into the student ID.
    CollectingId,

    /// ID finalized; validate it and send the command on the next tick.
    RequestingAuth,

    /// Command sent; waiting for the peer's reply.
    AwaitingAuth,

    /// Latch open; waiting for the box to be taken or put back.
    PhysicalAction,

    /// Physical event seen; lock and report success.
    Completing,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            EngineState::Idle => "Idle",
            EngineState::CollectingId => "CollectingId",
            EngineState::RequestingAuth => "RequestingAuth",
            EngineState::AwaitingAuth => "AwaitingAuth",
            EngineState::PhysicalAction => "PhysicalAction",
            EngineState::Completing => "Completing",
        };
        write!(f, "{}", state_str)
    }
}

impl EngineState {
    /// Check if transition to target state is valid from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use locker_engine::EngineState;
    ///
    /// assert!(EngineState::Idle.can_transition_to(&EngineState::CollectingId));
    /// assert!(EngineState::AwaitingAuth.can_transition_to(&EngineState::Idle));
    /// assert!(!EngineState::Idle.can_transition_to(&EngineState::PhysicalAction));
    /// ```
    pub fn can_transition_to(&self, target: &EngineState) -> bool {
        matches!(
            (self, target),
            // Forward
            (EngineState::Idle, EngineState::CollectingId)
            | (EngineState::CollectingId, EngineState::RequestingAuth)
            | (EngineState::RequestingAuth, EngineState::AwaitingAuth)
            | (EngineState::AwaitingAuth, EngineState::PhysicalAction)
            | (EngineState::PhysicalAction, EngineState::Completing)
            | (EngineState::Completing, EngineState::Idle)
            // Abort
            | (
                EngineState::CollectingId
                    | EngineState::RequestingAuth
                    | EngineState::AwaitingAuth
                    | EngineState::PhysicalAction,
                EngineState::Idle
            )
        )
    }

    /// Whether a transaction is live in this state.
    pub fn is_busy(&self) -> bool {
        !matches!(self, EngineState::Idle)
    }
}

/// A single recorded state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: EngineState,
    pub to: EngineState,
    pub at: Instant,
}

/// Bounded transition log, oldest first.
#[derive(Debug, Clone, Default)]
pub struct TransitionHistory {
    entries: VecDeque<StateTransition>,
}

impl TransitionHistory {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// Append a transition, evicting the oldest entry when full.
    pub fn record(&mut self, transition: StateTransition) {
        if self.entries.len() >= MAX_HISTORY_SIZE {
            self.entries.pop_front();
        }
        self.entries.push_back(transition);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &StateTransition> {
        self.entries.iter()
    }

    /// The most recent `count` transitions, oldest first.
    pub fn last(&self, count: usize) -> Vec<StateTransition> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip).copied().collect()
    }

    /// Target states of all recorded transitions, oldest first.
    pub fn path(&self) -> Vec<EngineState> {
        self.entries.iter().map(|t| t.to).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const ALL: [EngineState; 6] = [
        EngineState::Idle,
        EngineState::CollectingId,
        EngineState::RequestingAuth,
        EngineState::AwaitingAuth,
        EngineState::PhysicalAction,
        EngineState::Completing,
    ];

    #[rstest]
    #[case(EngineState::Idle, EngineState::CollectingId)]
    #[case(EngineState::CollectingId, EngineState::RequestingAuth)]
    #[case(EngineState::RequestingAuth, EngineState::AwaitingAuth)]
    #[case(EngineState::AwaitingAuth, EngineState::PhysicalAction)]
    #[case(EngineState::PhysicalAction, EngineState::Completing)]
    #[case(EngineState::Completing, EngineState::Idle)]
    fn test_forward_edges(#[case] from: EngineState, #[case] to: EngineState) {
        assert!(from.can_transition_to(&to));
        assert!(!to.can_transition_to(&from) || from == EngineState::Idle);
    }

    #[test]
    fn test_each_busy_state_has_one_way_back() {
        for state in ALL.iter().filter(|s| s.is_busy()) {
            assert!(state.can_transition_to(&EngineState::Idle), "{state}");
        }
    }

    #[test]
    fn test_no_skipping_ahead() {
        assert!(!EngineState::Idle.can_transition_to(&EngineState::AwaitingAuth));
        assert!(!EngineState::CollectingId.can_transition_to(&EngineState::PhysicalAction));
        assert!(!EngineState::AwaitingAuth.can_transition_to(&EngineState::Completing));
        assert!(!EngineState::Completing.can_transition_to(&EngineState::CollectingId));
    }

    #[test]
    fn test_no_self_loops() {
        for state in ALL {
            assert!(!state.can_transition_to(&state), "{state}");
        }
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = TransitionHistory::new();
        let now = Instant::now();
        for i in 0..(MAX_HISTORY_SIZE + 20) {
            let (from, to) = if i % 2 == 0 {
                (EngineState::Idle, EngineState::CollectingId)
            } else {
                (EngineState::CollectingId, EngineState::Idle)
            };
            history.record(StateTransition { from, to, at: now });
        }
        assert_eq!(history.len(), MAX_HISTORY_SIZE);
        assert_eq!(history.last(2).len(), 2);
        assert_eq!(history.last(1)[0].to, EngineState::Idle);
    }

    #[test]
    fn test_display_and_serde() {
        assert_eq!(EngineState::AwaitingAuth.to_string(), "AwaitingAuth");
        assert_eq!(
            serde_json::to_string(&EngineState::PhysicalAction).unwrap(),
            "\"physical_action\""
        );
    }
}
