//! Animation parameter sink and animation events.
//!
//! States write bool/float parameters into an [`AnimationSink`]. The
//! animation engine reports mid-clip triggers and clip ends back as
//! [`PlayerAnimationEvent`]s, which are parked in a pending slot and
//! delivered to the current state at the top of the next logic tick.

use std::collections::HashMap;

use bevy::prelude::*;

/// Receiver of animation parameter writes.
pub trait AnimationSink {
    /// Set a boolean animation parameter.
    fn set_bool(&mut self, name: &'static str, value: bool);

    /// Set a float animation parameter.
    fn set_float(&mut self, name: &'static str, value: f32);
}

/// Animation parameters written by the player states.
///
/// The host's animation layer reads these each frame to drive clip
/// selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimatorParams {
    bools: HashMap<&'static str, bool>,
    floats: HashMap<&'static str, f32>,
}

impl AnimatorParams {
    /// Current value of a bool parameter (false if never written).
    pub fn bool(&self, name: &str) -> bool {
        self.bools.get(name).copied().unwrap_or(false)
    }

    /// Current value of a float parameter (zero if never written).
    pub fn float(&self, name: &str) -> f32 {
        self.floats.get(name).copied().unwrap_or(0.0)
    }

    /// Names of all bool parameters currently set to true.
    pub fn active_bools(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.bools
            .iter()
            .filter_map(|(name, value)| value.then_some(*name))
    }
}

impl AnimationSink for AnimatorParams {
    fn set_bool(&mut self, name: &'static str, value: bool) {
        self.bools.insert(name, value);
    }

    fn set_float(&mut self, name: &'static str, value: f32) {
        self.floats.insert(name, value);
    }
}

/// Kind of callback raised by the animation engine.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationEventKind {
    /// A mid-clip event marker was reached.
    Trigger,
    /// The clip finished playing.
    Finished,
}

/// Animation callback addressed to one player entity.
#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerAnimationEvent {
    pub entity: Entity,
    pub kind: AnimationEventKind,
}

impl PlayerAnimationEvent {
    pub fn trigger(entity: Entity) -> Self {
        Self {
            entity,
            kind: AnimationEventKind::Trigger,
        }
    }

    pub fn finished(entity: Entity) -> Self {
        Self {
            entity,
            kind: AnimationEventKind::Finished,
        }
    }
}

/// Pending animation callbacks awaiting the next logic tick.
///
/// One slot per event kind: repeated events of the same kind coalesce.
/// When both are pending, the trigger is delivered before the finish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingAnimationEvents {
    trigger: bool,
    finished: bool,
}

impl PendingAnimationEvents {
    /// Park an event until the next logic tick.
    pub fn push(&mut self, kind: AnimationEventKind) {
        match kind {
            AnimationEventKind::Trigger => self.trigger = true,
            AnimationEventKind::Finished => self.finished = true,
        }
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        !self.trigger && !self.finished
    }

    /// Take the pending events in delivery order, clearing the slots.
    pub fn drain(&mut self) -> impl Iterator<Item = AnimationEventKind> {
        let taken = std::mem::take(self);
        taken
            .trigger
            .then_some(AnimationEventKind::Trigger)
            .into_iter()
            .chain(taken.finished.then_some(AnimationEventKind::Finished))
    }
}
