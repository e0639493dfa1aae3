//! Core controller systems.
//!
//! Backends own the systems that run the controller ticks, because each one
//! needs its own environment probe. The body load/write-back shared by all
//! of them lives here, generic over the physics backend.

use bevy::prelude::*;

use crate::animation::PlayerAnimationEvent;
use crate::backend::{CharacterPhysicsBackend, EnvironmentProbe};
use crate::controller::{BodyProxy, PlayerController};
use crate::input::PlayerInput;

/// Which controller tick to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerTick {
    /// Per-frame logic update (transitions, input handling).
    Logic,
    /// Fixed-step physics update.
    Physics,
}

/// Park animation callbacks on their controllers until the next logic tick.
pub fn route_animation_events(
    mut events: EventReader<PlayerAnimationEvent>,
    mut q_controllers: Query<&mut PlayerController>,
) {
    for event in events.read() {
        match q_controllers.get_mut(event.entity) {
            Ok(mut controller) => controller.push_animation_event(event.kind),
            Err(_) => warn!(
                "animation event {:?} for {:?} which has no PlayerController",
                event.kind, event.entity
            ),
        }
    }
}

/// Marks a child entity (sprite, mesh, rig) that turns with the player's facing.
///
/// The physics body itself never rotates on a flip: 2D physics backends own
/// the body rotation and overwrite it on writeback. Visual children are
/// rotated about Y to [`PlayerController::visual_yaw`] instead.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[reflect(Component)]
pub struct FacingVisual;

/// Run one controller tick for a single body.
///
/// Loads a [`BodyProxy`] from the transform and the backend's velocity
/// component, initializes the controller into Idle on its first logic tick,
/// runs the tick, and writes back only what the states changed. Yaw deltas
/// from facing flips turn the controller's visual yaw, never the body.
pub fn drive_controller<B: CharacterPhysicsBackend>(
    tick: ControllerTick,
    controller: &mut PlayerController,
    input: &mut PlayerInput,
    transform: &mut Mut<Transform>,
    velocity: &mut Mut<B::VelocityComponent>,
    probe: &dyn EnvironmentProbe,
    now: f32,
) {
    let mut body = BodyProxy::new(
        transform.translation.truncate(),
        B::linear_velocity(velocity),
    );
    let before = body;

    match tick {
        ControllerTick::Logic => {
            if !controller.is_initialized() {
                controller.initialize(&mut body, input, probe, now);
            }
            controller.logic_update(&mut body, input, probe, now);
        }
        ControllerTick::Physics => {
            if !controller.is_initialized() {
                return;
            }
            controller.physics_update(&mut body, input, probe, now);
        }
    }

    if body.velocity != before.velocity {
        B::set_linear_velocity(velocity, body.velocity);
    }
    if body.position != before.position {
        transform.translation = body.position.extend(transform.translation.z);
    }
    let yaw = body.take_yaw_delta();
    if yaw != 0.0 {
        controller.apply_yaw_delta(yaw);
    }
}

/// Rotate every [`FacingVisual`] child to its player's visual yaw.
pub fn sync_facing_visuals(
    q_players: Query<(&PlayerController, &Children)>,
    mut q_visuals: Query<&mut Transform, With<FacingVisual>>,
) {
    for (controller, children) in &q_players {
        let rotation = Quat::from_rotation_y(controller.visual_yaw());
        let mut visuals = q_visuals.iter_many_mut(children);
        while let Some(mut transform) = visuals.fetch_next() {
            if transform.rotation != rotation {
                transform.rotation = rotation;
            }
        }
    }
}
