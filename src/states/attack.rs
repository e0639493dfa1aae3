//! Grounded attacks.

use crate::controller::Character;
use crate::input::AttackSlot;
use crate::state::{PlayerState, PlayerStateId, StateCore, Transition};

/// Stand-still attack bound to one attack slot; ends when its clip finishes.
#[derive(Debug, Clone)]
pub struct AttackState {
    core: StateCore,
    slot: AttackSlot,
    is_grounded: bool,
}

impl AttackState {
    pub fn new(animation_name: &'static str, slot: AttackSlot) -> Self {
        Self {
            core: StateCore::new(animation_name),
            slot,
            is_grounded: false,
        }
    }

    pub fn slot(&self) -> AttackSlot {
        self.slot
    }

    pub(crate) fn logic_update(&mut self, character: &mut Character) -> Transition {
        if self.core.is_animation_finished() {
            return if !self.is_grounded {
                Some(PlayerStateId::InAir)
            } else if character.input().normalized_x() != 0 {
                Some(PlayerStateId::Move)
            } else {
                Some(PlayerStateId::Idle)
            };
        }

        character.set_velocity_x(0.0);
        None
    }
}

impl PlayerState for AttackState {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn do_checks(&mut self, character: &Character) {
        self.is_grounded = character.check_if_grounded();
    }

    fn enter(&mut self, character: &mut Character) {
        self.do_checks(character);
        self.core.enter(character);
        character.input_mut().use_attack_input(self.slot);
        character.set_velocity_x(0.0);
    }
}
