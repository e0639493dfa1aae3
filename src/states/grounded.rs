//! Ground states: Idle, Move and Land.

use crate::controller::Character;
use crate::input::AttackSlot;
use crate::state::{PlayerState, PlayerStateId, StateCore, Transition};

use super::{InAirState, JumpState};

/// Environment flags sampled by every ground state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroundedChecks {
    pub is_grounded: bool,
    pub is_touching_wall: bool,
    pub is_touching_ledge: bool,
}

impl GroundedChecks {
    pub fn sample(character: &Character) -> Self {
        Self {
            is_grounded: character.check_if_grounded(),
            is_touching_wall: character.check_if_touching_wall(),
            is_touching_ledge: character.check_if_touching_ledge(),
        }
    }
}

/// Entering any ground state restores the full jump budget.
pub(super) fn on_enter(jump: &mut JumpState, character: &Character) {
    jump.reset_amount_of_jumps_left(character.params());
}

/// Transitions shared by every ground state, evaluated before the state's own.
fn grounded_transitions(
    checks: &GroundedChecks,
    character: &Character,
    jump: &JumpState,
    in_air: &mut InAirState,
) -> Transition {
    let input = character.input();

    if !checks.is_grounded {
        in_air.start_coyote_time();
        return Some(PlayerStateId::InAir);
    }
    if input.jump_input() && jump.can_jump() {
        return Some(PlayerStateId::Jump);
    }
    if checks.is_touching_wall && input.grab_input() && checks.is_touching_ledge {
        return Some(PlayerStateId::WallGrab);
    }
    if input.attack_input(AttackSlot::Primary) {
        return Some(PlayerStateId::PrimaryAttack);
    }
    if input.attack_input(AttackSlot::Secondary) {
        return Some(PlayerStateId::SecondaryAttack);
    }
    None
}

// ============================================================================
// Idle
// ============================================================================

/// Standing still on the ground.
#[derive(Debug, Clone)]
pub struct IdleState {
    core: StateCore,
    checks: GroundedChecks,
}

impl IdleState {
    pub fn new(animation_name: &'static str) -> Self {
        Self {
            core: StateCore::new(animation_name),
            checks: GroundedChecks::default(),
        }
    }

    pub fn checks(&self) -> GroundedChecks {
        self.checks
    }

    pub(crate) fn logic_update(
        &mut self,
        character: &mut Character,
        jump: &JumpState,
        in_air: &mut InAirState,
    ) -> Transition {
        if let Some(next) = grounded_transitions(&self.checks, character, jump, in_air) {
            return Some(next);
        }
        if character.input().normalized_x() != 0 {
            return Some(PlayerStateId::Move);
        }
        None
    }
}

impl PlayerState for IdleState {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn do_checks(&mut self, character: &Character) {
        self.checks = GroundedChecks::sample(character);
    }

    fn enter(&mut self, character: &mut Character) {
        self.do_checks(character);
        self.core.enter(character);
        character.set_velocity_x(0.0);
    }
}

// ============================================================================
// Move
// ============================================================================

/// Running along the ground.
#[derive(Debug, Clone)]
pub struct MoveState {
    core: StateCore,
    checks: GroundedChecks,
}

impl MoveState {
    pub fn new(animation_name: &'static str) -> Self {
        Self {
            core: StateCore::new(animation_name),
            checks: GroundedChecks::default(),
        }
    }

    pub fn checks(&self) -> GroundedChecks {
        self.checks
    }

    pub(crate) fn logic_update(
        &mut self,
        character: &mut Character,
        jump: &JumpState,
        in_air: &mut InAirState,
    ) -> Transition {
        if let Some(next) = grounded_transitions(&self.checks, character, jump, in_air) {
            return Some(next);
        }

        let x = character.input().normalized_x();
        if x == 0 {
            return Some(PlayerStateId::Idle);
        }

        character.check_if_should_flip(x);
        let speed = character.params().movement_velocity;
        character.set_velocity_x(speed * x as f32);
        None
    }
}

impl PlayerState for MoveState {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn do_checks(&mut self, character: &Character) {
        self.checks = GroundedChecks::sample(character);
    }
}

// ============================================================================
// Land
// ============================================================================

/// Touchdown recovery; lasts until its clip finishes or the player moves.
#[derive(Debug, Clone)]
pub struct LandState {
    core: StateCore,
    checks: GroundedChecks,
}

impl LandState {
    pub fn new(animation_name: &'static str) -> Self {
        Self {
            core: StateCore::new(animation_name),
            checks: GroundedChecks::default(),
        }
    }

    pub fn checks(&self) -> GroundedChecks {
        self.checks
    }

    pub(crate) fn logic_update(
        &mut self,
        character: &mut Character,
        jump: &JumpState,
        in_air: &mut InAirState,
    ) -> Transition {
        if let Some(next) = grounded_transitions(&self.checks, character, jump, in_air) {
            return Some(next);
        }
        if character.input().normalized_x() != 0 {
            return Some(PlayerStateId::Move);
        }
        if self.core.is_animation_finished() {
            return Some(PlayerStateId::Idle);
        }
        None
    }
}

impl PlayerState for LandState {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn do_checks(&mut self, character: &Character) {
        self.checks = GroundedChecks::sample(character);
    }
}
