//! The player state machine.
//!
//! Holds the single current state (plus the previous one for diagnostics)
//! and performs transitions. The machine is the only writer of the current
//! state slot.

use bevy::prelude::*;

use crate::controller::Character;
use crate::state::PlayerStateId;
use crate::states::PlayerStates;

/// Current/previous state bookkeeping and transitions.
#[derive(Debug, Clone, Default)]
pub struct PlayerStateMachine {
    current: Option<PlayerStateId>,
    previous: Option<PlayerStateId>,
    last_transition_time: f32,
    transition_count: u64,
}

impl PlayerStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active state, `None` before initialization.
    pub fn current(&self) -> Option<PlayerStateId> {
        self.current
    }

    /// The state active before the last transition.
    pub fn previous(&self) -> Option<PlayerStateId> {
        self.previous
    }

    /// Timestamp of the last transition (or of initialization).
    pub fn last_transition_time(&self) -> f32 {
        self.last_transition_time
    }

    /// Number of transitions performed since initialization.
    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    /// Enter `initial` without exiting anything.
    pub(crate) fn initialize(
        &mut self,
        states: &mut PlayerStates,
        initial: PlayerStateId,
        character: &mut Character,
    ) {
        debug_assert!(
            self.current.is_none(),
            "player state machine initialized twice"
        );
        self.current = Some(initial);
        self.previous = None;
        self.last_transition_time = character.now();
        debug!("player state machine initialized in {initial:?}");
        states.enter(initial, character);
    }

    /// Exit the current state, then enter `next`.
    ///
    /// Entering the state that is already current re-runs its full exit and
    /// enter, which resets all of its transient data.
    pub(crate) fn change_state(
        &mut self,
        states: &mut PlayerStates,
        next: PlayerStateId,
        character: &mut Character,
    ) {
        let Some(current) = self.current else {
            debug_assert!(false, "change_state to {next:?} before initialize");
            return;
        };

        states.exit(current, character);
        self.previous = Some(current);
        self.current = Some(next);
        self.last_transition_time = character.now();
        self.transition_count += 1;
        debug!(
            "player state {current:?} -> {next:?} at {:.3}s",
            self.last_transition_time
        );
        states.enter(next, character);
    }
}
