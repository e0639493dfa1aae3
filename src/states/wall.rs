//! Wall states: WallGrab, WallClimb, WallSlide and WallJump.

use bevy::prelude::*;

use crate::controller::Character;
use crate::state::{PlayerState, PlayerStateId, StateCore, Transition};

use super::{JumpState, LedgeClimbState};

/// Environment flags sampled by every wall-contact state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallChecks {
    pub is_grounded: bool,
    pub is_touching_wall: bool,
    pub is_touching_ledge: bool,
}

impl WallChecks {
    pub fn sample(character: &Character) -> Self {
        Self {
            is_grounded: character.check_if_grounded(),
            is_touching_wall: character.check_if_touching_wall(),
            is_touching_ledge: character.check_if_touching_ledge(),
        }
    }
}

/// Transitions shared by every wall-contact state, evaluated before the state's own.
fn touching_wall_transitions(
    checks: &WallChecks,
    character: &Character,
    ledge_climb: &mut LedgeClimbState,
    wall_jump: &mut WallJumpState,
) -> Transition {
    let input = character.input();
    let facing = character.facing_direction();

    if checks.is_touching_wall && !checks.is_touching_ledge {
        ledge_climb.set_detected_position(character.position());
        return Some(PlayerStateId::LedgeClimb);
    }
    if checks.is_grounded && !input.grab_input() {
        return Some(PlayerStateId::Idle);
    }
    if !checks.is_touching_wall || (input.normalized_x() != facing && !input.grab_input()) {
        return Some(PlayerStateId::InAir);
    }
    if input.jump_input() {
        wall_jump.determine_wall_jump_direction(checks.is_touching_wall, facing);
        return Some(PlayerStateId::WallJump);
    }
    None
}

// ============================================================================
// WallGrab
// ============================================================================

/// Clinging motionless to a wall.
#[derive(Debug, Clone)]
pub struct WallGrabState {
    core: StateCore,
    checks: WallChecks,
    hold_position: Vec2,
}

impl WallGrabState {
    pub fn new(animation_name: &'static str) -> Self {
        Self {
            core: StateCore::new(animation_name),
            checks: WallChecks::default(),
            hold_position: Vec2::ZERO,
        }
    }

    pub fn checks(&self) -> WallChecks {
        self.checks
    }

    /// Position pinned on entry.
    pub fn hold_position(&self) -> Vec2 {
        self.hold_position
    }

    fn hold(&self, character: &mut Character) {
        character.set_position(self.hold_position);
        character.set_velocity_zero();
    }

    pub(crate) fn logic_update(
        &mut self,
        character: &mut Character,
        ledge_climb: &mut LedgeClimbState,
        wall_jump: &mut WallJumpState,
    ) -> Transition {
        if let Some(next) = touching_wall_transitions(&self.checks, character, ledge_climb, wall_jump)
        {
            return Some(next);
        }

        let input = character.input();
        let y = input.normalized_y();
        let grab = input.grab_input();
        if y > 0 {
            return Some(PlayerStateId::WallClimb);
        }
        if y < 0 || !grab {
            return Some(PlayerStateId::WallSlide);
        }

        self.hold(character);
        None
    }
}

impl PlayerState for WallGrabState {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn do_checks(&mut self, character: &Character) {
        self.checks = WallChecks::sample(character);
    }

    fn enter(&mut self, character: &mut Character) {
        self.do_checks(character);
        self.core.enter(character);
        self.hold_position = character.position();
        self.hold(character);
    }

    fn physics_update(&mut self, character: &mut Character) {
        self.hold(character);
    }
}

// ============================================================================
// WallClimb
// ============================================================================

/// Climbing up a wall while up is held.
#[derive(Debug, Clone)]
pub struct WallClimbState {
    core: StateCore,
    checks: WallChecks,
}

impl WallClimbState {
    pub fn new(animation_name: &'static str) -> Self {
        Self {
            core: StateCore::new(animation_name),
            checks: WallChecks::default(),
        }
    }

    pub fn checks(&self) -> WallChecks {
        self.checks
    }

    pub(crate) fn logic_update(
        &mut self,
        character: &mut Character,
        ledge_climb: &mut LedgeClimbState,
        wall_jump: &mut WallJumpState,
    ) -> Transition {
        if let Some(next) = touching_wall_transitions(&self.checks, character, ledge_climb, wall_jump)
        {
            return Some(next);
        }
        if character.input().normalized_y() != 1 {
            return Some(PlayerStateId::WallGrab);
        }

        let speed = character.params().wall_climb_velocity;
        character.set_velocity_y(speed);
        None
    }
}

impl PlayerState for WallClimbState {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn do_checks(&mut self, character: &Character) {
        self.checks = WallChecks::sample(character);
    }
}

// ============================================================================
// WallSlide
// ============================================================================

/// Sliding down a wall at a fixed speed.
#[derive(Debug, Clone)]
pub struct WallSlideState {
    core: StateCore,
    checks: WallChecks,
}

impl WallSlideState {
    pub fn new(animation_name: &'static str) -> Self {
        Self {
            core: StateCore::new(animation_name),
            checks: WallChecks::default(),
        }
    }

    pub fn checks(&self) -> WallChecks {
        self.checks
    }

    pub(crate) fn logic_update(
        &mut self,
        character: &mut Character,
        ledge_climb: &mut LedgeClimbState,
        wall_jump: &mut WallJumpState,
    ) -> Transition {
        if let Some(next) = touching_wall_transitions(&self.checks, character, ledge_climb, wall_jump)
        {
            return Some(next);
        }

        let input = character.input();
        if input.grab_input() && input.normalized_y() == 0 {
            return Some(PlayerStateId::WallGrab);
        }

        let speed = character.params().wall_slide_velocity;
        character.set_velocity_y(-speed);
        None
    }
}

impl PlayerState for WallSlideState {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn do_checks(&mut self, character: &Character) {
        self.checks = WallChecks::sample(character);
    }
}

// ============================================================================
// WallJump
// ============================================================================

/// Timed ability: launches the character away from (or along) a wall.
#[derive(Debug, Clone)]
pub struct WallJumpState {
    core: StateCore,
    is_grounded: bool,
    wall_jump_direction: i32,
}

impl WallJumpState {
    pub fn new(animation_name: &'static str) -> Self {
        Self {
            core: StateCore::new(animation_name),
            is_grounded: false,
            wall_jump_direction: 1,
        }
    }

    pub fn wall_jump_direction(&self) -> i32 {
        self.wall_jump_direction
    }

    /// Jump away from a wall in front, or along the facing when the wall is behind.
    pub fn determine_wall_jump_direction(&mut self, is_touching_wall: bool, facing: i32) {
        self.wall_jump_direction = if is_touching_wall { -facing } else { facing };
    }

    pub(crate) fn enter_with(&mut self, character: &mut Character, jump: &mut JumpState) {
        PlayerState::enter(self, character);

        character.input_mut().use_jump_input();
        jump.reset_amount_of_jumps_left(character.params());

        let params = *character.params();
        character.set_velocity(
            params.wall_jump_velocity,
            params.wall_jump_angle,
            self.wall_jump_direction,
        );
        character.check_if_should_flip(self.wall_jump_direction);
        jump.decrease_amount_of_jumps_left();
    }

    pub(crate) fn logic_update(&mut self, character: &mut Character) -> Transition {
        let velocity = character.current_velocity();
        character.set_animation_float("yVelocity", velocity.y);
        character.set_animation_float("xVelocity", velocity.x.abs());

        let params = character.params();
        if self.core.elapsed(character.now()) < params.wall_jump_time {
            return None;
        }
        if self.is_grounded && velocity.y < params.landing_velocity_threshold {
            Some(PlayerStateId::Idle)
        } else {
            Some(PlayerStateId::InAir)
        }
    }
}

impl PlayerState for WallJumpState {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn do_checks(&mut self, character: &Character) {
        self.is_grounded = character.check_if_grounded();
    }
}
