//! State identity and the lifecycle contract shared by every player state.
//!
//! Each concrete state embeds a [`StateCore`] holding the bookkeeping every
//! state needs (animation binding, entry timestamp, animation-finished and
//! exiting latches) and implements [`PlayerState`] for the lifecycle hooks.
//! Logic updates are dispatched by [`PlayerStates`](crate::states::PlayerStates),
//! which hands each state exactly the collaborators it needs.

use bevy::prelude::*;

use crate::controller::Character;

/// Identity of a player state.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerStateId {
    Idle,
    Move,
    Jump,
    InAir,
    Land,
    WallGrab,
    WallClimb,
    WallSlide,
    WallJump,
    LedgeClimb,
    PrimaryAttack,
    SecondaryAttack,
}

impl PlayerStateId {
    /// Every state, in declaration order.
    pub const ALL: [PlayerStateId; 12] = [
        PlayerStateId::Idle,
        PlayerStateId::Move,
        PlayerStateId::Jump,
        PlayerStateId::InAir,
        PlayerStateId::Land,
        PlayerStateId::WallGrab,
        PlayerStateId::WallClimb,
        PlayerStateId::WallSlide,
        PlayerStateId::WallJump,
        PlayerStateId::LedgeClimb,
        PlayerStateId::PrimaryAttack,
        PlayerStateId::SecondaryAttack,
    ];

    /// Whether this is a ground state. Entering one restores the jump budget.
    pub fn is_grounded(self) -> bool {
        matches!(
            self,
            PlayerStateId::Idle | PlayerStateId::Move | PlayerStateId::Land
        )
    }
}

/// Transition request returned by a logic update.
pub type Transition = Option<PlayerStateId>;

/// Bookkeeping shared by every state.
#[derive(Debug, Clone)]
pub struct StateCore {
    animation_name: &'static str,
    start_time: f32,
    is_animation_finished: bool,
    is_exiting: bool,
    enter_count: u32,
    exit_count: u32,
}

impl StateCore {
    /// Create the core for a state bound to `animation_name`.
    pub fn new(animation_name: &'static str) -> Self {
        Self {
            animation_name,
            start_time: 0.0,
            is_animation_finished: false,
            is_exiting: false,
            enter_count: 0,
            exit_count: 0,
        }
    }

    /// Animation bool bound to this state.
    pub fn animation_name(&self) -> &'static str {
        self.animation_name
    }

    /// Timestamp of the last entry.
    pub fn start_time(&self) -> f32 {
        self.start_time
    }

    /// Seconds since the last entry.
    pub fn elapsed(&self, now: f32) -> f32 {
        now - self.start_time
    }

    pub fn is_animation_finished(&self) -> bool {
        self.is_animation_finished
    }

    pub fn is_exiting(&self) -> bool {
        self.is_exiting
    }

    /// Number of times this state has been entered.
    pub fn enter_count(&self) -> u32 {
        self.enter_count
    }

    /// Number of times this state has been exited.
    pub fn exit_count(&self) -> u32 {
        self.exit_count
    }

    pub(crate) fn enter(&mut self, character: &mut Character) {
        character.set_animation_bool(self.animation_name, true);
        self.start_time = character.now();
        self.is_animation_finished = false;
        self.is_exiting = false;
        self.enter_count += 1;
    }

    pub(crate) fn exit(&mut self, character: &mut Character) {
        character.set_animation_bool(self.animation_name, false);
        self.is_exiting = true;
        self.exit_count += 1;
    }

    pub(crate) fn finish_animation(&mut self) {
        self.is_animation_finished = true;
    }
}

/// Lifecycle hooks shared by every state.
///
/// Default implementations cover the common case; states override only the
/// hooks they specialize. `enter` must write every transient field the state
/// owns, because states are pooled and reused across activations.
pub trait PlayerState {
    fn core(&self) -> &StateCore;

    fn core_mut(&mut self) -> &mut StateCore;

    /// Sample the environment. Must not write velocity or request transitions.
    fn do_checks(&mut self, _character: &Character) {}

    /// Called once when the machine transitions into this state.
    fn enter(&mut self, character: &mut Character) {
        self.do_checks(character);
        self.core_mut().enter(character);
    }

    /// Called once when the machine transitions away from this state.
    fn exit(&mut self, character: &mut Character) {
        self.core_mut().exit(character);
    }

    /// Called once per fixed physics tick.
    fn physics_update(&mut self, _character: &mut Character) {}

    /// Mid-clip animation event.
    fn animation_trigger(&mut self, _character: &mut Character) {}

    /// Clip end.
    fn animation_finish_trigger(&mut self, _character: &mut Character) {
        self.core_mut().finish_animation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_idle_move_and_land_are_ground_states() {
        let grounded: Vec<_> = PlayerStateId::ALL
            .into_iter()
            .filter(|id| id.is_grounded())
            .collect();
        assert_eq!(
            grounded,
            [PlayerStateId::Idle, PlayerStateId::Move, PlayerStateId::Land]
        );
    }

    #[test]
    fn new_core_is_clean() {
        let core = StateCore::new("idle");
        assert_eq!(core.animation_name(), "idle");
        assert_eq!(core.enter_count(), 0);
        assert_eq!(core.exit_count(), 0);
        assert!(!core.is_animation_finished());
        assert!(!core.is_exiting());
    }

    #[test]
    fn elapsed_is_relative_to_entry() {
        let mut core = StateCore::new("land");
        core.start_time = 2.0;
        assert_eq!(core.elapsed(2.5), 0.5);
    }
}
