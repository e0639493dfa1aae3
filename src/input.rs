//! Player input component.
//!
//! The host's input layer writes raw axes and button edges into
//! [`PlayerInput`]; the states read normalized values from it once per logic
//! tick. Jump presses are buffered for a short hold time so a press slightly
//! before a jump becomes possible is still honored.

use bevy::prelude::*;

/// Attack slot for the two attack states.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttackSlot {
    Primary,
    Secondary,
}

impl AttackSlot {
    #[inline]
    fn index(self) -> usize {
        match self {
            AttackSlot::Primary => 0,
            AttackSlot::Secondary => 1,
        }
    }
}

/// Per-player input snapshot.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use fsm_platformer_controller::prelude::*;
///
/// let mut input = PlayerInput::default();
/// input.set_movement(Vec2::new(0.8, 0.0));
/// assert_eq!(input.normalized_x(), 1);
///
/// input.press_jump(1.0);
/// assert!(input.jump_input());
/// input.release_jump();
/// assert!(input.jump_input_stop());
/// ```
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct PlayerInput {
    /// Raw movement axes in [-1, 1].
    raw_movement: Vec2,
    /// Buffered jump press, cleared when consumed or when it expires.
    jump_input: bool,
    /// True after the jump button is released, until it is pressed again.
    jump_input_stop: bool,
    /// Timestamp of the last jump press.
    jump_input_start_time: f32,
    /// Whether the grab button is held.
    grab_input: bool,
    /// Pending attack presses (primary, secondary).
    attack_inputs: [bool; 2],
}

/// Snap an axis value to -1, 0 or 1.
#[inline]
fn normalize_axis(value: f32) -> i32 {
    if value > 0.5 {
        1
    } else if value < -0.5 {
        -1
    } else {
        0
    }
}

impl PlayerInput {
    /// Create an empty input snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw movement axes (clamped to [-1, 1]).
    pub fn set_movement(&mut self, movement: Vec2) {
        self.raw_movement = movement.clamp(Vec2::NEG_ONE, Vec2::ONE);
    }

    /// Raw movement axes.
    pub fn raw_movement(&self) -> Vec2 {
        self.raw_movement
    }

    /// Horizontal input snapped to -1, 0 or 1.
    pub fn normalized_x(&self) -> i32 {
        normalize_axis(self.raw_movement.x)
    }

    /// Vertical input snapped to -1, 0 or 1.
    pub fn normalized_y(&self) -> i32 {
        normalize_axis(self.raw_movement.y)
    }

    /// Record a jump press at `now`.
    pub fn press_jump(&mut self, now: f32) {
        self.jump_input = true;
        self.jump_input_stop = false;
        self.jump_input_start_time = now;
    }

    /// Record a jump release.
    pub fn release_jump(&mut self) {
        self.jump_input_stop = true;
    }

    /// Whether a buffered jump press is pending.
    pub fn jump_input(&self) -> bool {
        self.jump_input
    }

    /// Whether the jump button has been released since the last press.
    pub fn jump_input_stop(&self) -> bool {
        self.jump_input_stop
    }

    /// Consume the buffered jump press.
    pub fn use_jump_input(&mut self) {
        self.jump_input = false;
    }

    /// Expire the buffered jump press once it has been held for `hold_time`.
    pub fn check_jump_input_hold_time(&mut self, now: f32, hold_time: f32) {
        if self.jump_input && now >= self.jump_input_start_time + hold_time {
            self.jump_input = false;
        }
    }

    /// Set whether grab is held.
    pub fn set_grab(&mut self, held: bool) {
        self.grab_input = held;
    }

    /// Whether grab is held.
    pub fn grab_input(&self) -> bool {
        self.grab_input
    }

    /// Record an attack press.
    pub fn press_attack(&mut self, slot: AttackSlot) {
        self.attack_inputs[slot.index()] = true;
    }

    /// Record an attack release.
    pub fn release_attack(&mut self, slot: AttackSlot) {
        self.attack_inputs[slot.index()] = false;
    }

    /// Whether an attack press is pending.
    pub fn attack_input(&self, slot: AttackSlot) -> bool {
        self.attack_inputs[slot.index()]
    }

    /// Consume an attack press.
    pub fn use_attack_input(&mut self, slot: AttackSlot) {
        self.attack_inputs[slot.index()] = false;
    }
}
