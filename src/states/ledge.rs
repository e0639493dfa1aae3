//! Ledge climbing.

use bevy::prelude::*;

use crate::controller::Character;
use crate::state::{PlayerState, PlayerStateId, StateCore, Transition};

use super::InAirState;

const CLIMB_LEDGE: &str = "climbLedge";

/// Hangs from a detected ledge corner, then climbs over it or drops off.
///
/// The character is pinned at the hang position for the whole activation.
/// The hang becomes interactive once the animation trigger fires; the climb
/// completes when the climb clip finishes, teleporting the character on top.
#[derive(Debug, Clone)]
pub struct LedgeClimbState {
    core: StateCore,
    detected_position: Vec2,
    corner_position: Vec2,
    start_position: Vec2,
    stop_position: Vec2,
    is_hanging: bool,
    is_climbing: bool,
}

impl LedgeClimbState {
    pub fn new(animation_name: &'static str) -> Self {
        Self {
            core: StateCore::new(animation_name),
            detected_position: Vec2::ZERO,
            corner_position: Vec2::ZERO,
            start_position: Vec2::ZERO,
            stop_position: Vec2::ZERO,
            is_hanging: false,
            is_climbing: false,
        }
    }

    /// Record where the ledge was detected. Must be set before entering.
    pub fn set_detected_position(&mut self, position: Vec2) {
        self.detected_position = position;
    }

    pub fn detected_position(&self) -> Vec2 {
        self.detected_position
    }

    pub fn corner_position(&self) -> Vec2 {
        self.corner_position
    }

    /// Hang position.
    pub fn start_position(&self) -> Vec2 {
        self.start_position
    }

    /// Position on top of the ledge once the climb completes.
    pub fn stop_position(&self) -> Vec2 {
        self.stop_position
    }

    pub fn is_hanging(&self) -> bool {
        self.is_hanging
    }

    pub fn is_climbing(&self) -> bool {
        self.is_climbing
    }

    fn pin(&self, character: &mut Character) {
        character.set_velocity_zero();
        character.set_position(self.start_position);
    }

    pub(crate) fn logic_update(
        &mut self,
        character: &mut Character,
        in_air: &mut InAirState,
    ) -> Transition {
        if self.core.is_animation_finished() {
            return Some(PlayerStateId::Idle);
        }

        let input = character.input();
        let x = input.normalized_x();
        let y = input.normalized_y();
        let facing = character.facing_direction();

        self.pin(character);

        if self.is_hanging && !self.is_climbing {
            if x == facing {
                self.is_climbing = true;
                character.set_animation_bool(CLIMB_LEDGE, true);
                debug!("ledge climb started at {:?}", self.corner_position);
            } else if y == -1 {
                in_air.block_ledge_regrab();
                return Some(PlayerStateId::InAir);
            }
        }
        None
    }
}

impl PlayerState for LedgeClimbState {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn enter(&mut self, character: &mut Character) {
        self.core.enter(character);
        self.is_hanging = false;
        self.is_climbing = false;

        character.set_velocity_zero();
        character.set_position(self.detected_position);
        self.corner_position = character.determine_corner_position();

        let facing = character.facing_direction() as f32;
        let params = character.params();
        self.start_position = Vec2::new(
            self.corner_position.x - facing * params.start_offset.x,
            self.corner_position.y - params.start_offset.y,
        );
        self.stop_position = Vec2::new(
            self.corner_position.x + facing * params.stop_offset.x,
            self.corner_position.y + params.stop_offset.y,
        );

        character.set_position(self.start_position);
    }

    fn exit(&mut self, character: &mut Character) {
        self.core.exit(character);
        self.is_hanging = false;
        if self.is_climbing {
            character.set_position(self.stop_position);
            self.is_climbing = false;
        }
    }

    fn physics_update(&mut self, character: &mut Character) {
        if !self.core.is_animation_finished() {
            self.pin(character);
        }
    }

    fn animation_trigger(&mut self, _character: &mut Character) {
        self.is_hanging = true;
    }

    fn animation_finish_trigger(&mut self, character: &mut Character) {
        self.core.finish_animation();
        character.set_animation_bool(CLIMB_LEDGE, false);
    }
}
