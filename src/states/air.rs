//! Airborne states: Jump and InAir.

use bevy::prelude::*;

use crate::config::PlayerParams;
use crate::controller::Character;
use crate::state::{PlayerState, PlayerStateId, StateCore, Transition};

use super::{LedgeClimbState, WallJumpState};

// ============================================================================
// Jump
// ============================================================================

/// One-shot ability: launches the character upward and hands off to InAir.
///
/// Also owns the jump budget shared by every state that can spend or restore
/// a jump charge.
#[derive(Debug, Clone)]
pub struct JumpState {
    core: StateCore,
    amount_of_jumps_left: u32,
    is_grounded: bool,
}

impl JumpState {
    pub fn new(animation_name: &'static str, params: &PlayerParams) -> Self {
        Self {
            core: StateCore::new(animation_name),
            amount_of_jumps_left: params.amount_of_jumps,
            is_grounded: false,
        }
    }

    pub fn amount_of_jumps_left(&self) -> u32 {
        self.amount_of_jumps_left
    }

    pub fn can_jump(&self) -> bool {
        self.amount_of_jumps_left > 0
    }

    pub fn reset_amount_of_jumps_left(&mut self, params: &PlayerParams) {
        self.amount_of_jumps_left = params.amount_of_jumps;
    }

    pub fn decrease_amount_of_jumps_left(&mut self) {
        self.amount_of_jumps_left = self.amount_of_jumps_left.saturating_sub(1);
    }

    pub(crate) fn enter_with(&mut self, character: &mut Character, in_air: &mut InAirState) {
        PlayerState::enter(self, character);

        character.input_mut().use_jump_input();
        let velocity = character.params().jump_velocity;
        character.set_velocity_y(velocity);
        self.decrease_amount_of_jumps_left();
        in_air.set_is_jumping();
    }

    /// The ability completes on entry; leave on the first logic tick.
    pub(crate) fn logic_update(&mut self, character: &mut Character) -> Transition {
        let threshold = character.params().landing_velocity_threshold;
        if self.is_grounded && character.current_velocity().y < threshold {
            Some(PlayerStateId::Idle)
        } else {
            Some(PlayerStateId::InAir)
        }
    }
}

impl PlayerState for JumpState {
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

// ============================================================================
// InAir
// ============================================================================

/// Flags armed by the state that transitions into InAir, consumed on entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct InAirEntry {
    coyote_time: bool,
    is_jumping: bool,
    block_ledge_regrab: bool,
}

/// Airborne with air control.
#[derive(Debug, Clone)]
pub struct InAirState {
    core: StateCore,
    is_grounded: bool,
    is_touching_wall: bool,
    is_touching_wall_back: bool,
    is_touching_ledge: bool,
    coyote_time: bool,
    is_jumping: bool,
    ledge_regrab_blocked: bool,
    pending: InAirEntry,
}

impl InAirState {
    pub fn new(animation_name: &'static str) -> Self {
        Self {
            core: StateCore::new(animation_name),
            is_grounded: false,
            is_touching_wall: false,
            is_touching_wall_back: false,
            is_touching_ledge: false,
            coyote_time: false,
            is_jumping: false,
            ledge_regrab_blocked: false,
            pending: InAirEntry::default(),
        }
    }

    /// Arm the coyote window for the next entry.
    pub fn start_coyote_time(&mut self) {
        self.pending.coyote_time = true;
    }

    /// Mark the next entry as the rising part of a jump.
    pub fn set_is_jumping(&mut self) {
        self.pending.is_jumping = true;
    }

    /// Ignore the ledge in front until the ledge ray hits again or the wall is lost.
    pub fn block_ledge_regrab(&mut self) {
        self.pending.block_ledge_regrab = true;
    }

    /// Drop armed flags. Arming only carries across a direct transition into InAir.
    pub(crate) fn discard_pending(&mut self) {
        self.pending = InAirEntry::default();
    }

    pub fn is_coyote_time(&self) -> bool {
        self.coyote_time
    }

    pub fn is_jumping(&self) -> bool {
        self.is_jumping
    }

    pub fn is_ledge_regrab_blocked(&self) -> bool {
        self.ledge_regrab_blocked
    }

    fn check_coyote_time(&mut self, character: &Character, jump: &mut JumpState) {
        if self.coyote_time
            && character.now() > self.core.start_time() + character.params().coyote_time
        {
            self.coyote_time = false;
            jump.decrease_amount_of_jumps_left();
            trace!(
                "coyote time expired, {} jumps left",
                jump.amount_of_jumps_left()
            );
        }
    }

    fn check_jump_multiplier(&mut self, character: &mut Character) {
        if !self.is_jumping {
            return;
        }

        let velocity_y = character.current_velocity().y;
        if character.input().jump_input_stop() {
            let multiplier = character.params().jump_height_multiplier;
            character.set_velocity_y(velocity_y * multiplier);
            self.is_jumping = false;
            trace!("jump cut short at vy={velocity_y:.2}");
        } else if velocity_y < 0.0 {
            self.is_jumping = false;
        }
    }

    pub(crate) fn logic_update(
        &mut self,
        character: &mut Character,
        jump: &mut JumpState,
        ledge_climb: &mut LedgeClimbState,
        wall_jump: &mut WallJumpState,
    ) -> Transition {
        self.check_coyote_time(character, jump);
        self.check_jump_multiplier(character);

        if self.ledge_regrab_blocked && (self.is_touching_ledge || !self.is_touching_wall) {
            self.ledge_regrab_blocked = false;
        }

        let input = character.input();
        let x = input.normalized_x();
        let jump_input = input.jump_input();
        let grab_input = input.grab_input();
        let facing = character.facing_direction();
        let velocity_y = character.current_velocity().y;

        if self.is_grounded && velocity_y < character.params().landing_velocity_threshold {
            return Some(PlayerStateId::Land);
        }
        if self.is_touching_wall
            && !self.is_touching_ledge
            && !self.is_grounded
            && !self.ledge_regrab_blocked
        {
            ledge_climb.set_detected_position(character.position());
            return Some(PlayerStateId::LedgeClimb);
        }
        if jump_input && (self.is_touching_wall || self.is_touching_wall_back) {
            wall_jump.determine_wall_jump_direction(self.is_touching_wall, facing);
            return Some(PlayerStateId::WallJump);
        }
        if jump_input && jump.can_jump() {
            return Some(PlayerStateId::Jump);
        }
        if self.is_touching_wall && grab_input && self.is_touching_ledge {
            return Some(PlayerStateId::WallGrab);
        }
        if self.is_touching_wall && x == facing && velocity_y <= 0.0 && !self.ledge_regrab_blocked
        {
            return Some(PlayerStateId::WallSlide);
        }

        character.check_if_should_flip(x);
        let speed = character.params().movement_velocity;
        character.set_velocity_x(speed * x as f32);

        let velocity = character.current_velocity();
        character.set_animation_float("yVelocity", velocity.y);
        character.set_animation_float("xVelocity", velocity.x.abs());
        None
    }
}

impl PlayerState for InAirState {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn do_checks(&mut self, character: &Character) {
        self.is_grounded = character.check_if_grounded();
        self.is_touching_wall = character.check_if_touching_wall();
        self.is_touching_wall_back = character.check_if_touching_wall_back();
        self.is_touching_ledge = character.check_if_touching_ledge();
    }

    fn enter(&mut self, character: &mut Character) {
        self.do_checks(character);
        self.core.enter(character);

        let pending = std::mem::take(&mut self.pending);
        self.coyote_time = pending.coyote_time;
        self.is_jumping = pending.is_jumping;
        self.ledge_regrab_blocked = pending.block_ledge_regrab;
    }
}
