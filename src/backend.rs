//! Physics backend abstraction.
//!
//! The controller never talks to a physics engine directly. States ask the
//! environment questions through [`EnvironmentProbe`], and each backend
//! provides the Bevy systems that load the body, run the controller ticks
//! with a probe, and write the body back. This allows swapping physics
//! engines (Rapier2D, the headless kinematic world, custom).

use bevy::ecs::component::Mutable;
use bevy::prelude::*;

use crate::collision::CollisionData;

/// Environment queries consumed by the player states.
///
/// Both queries filter by a layer bitmask. Queries that find nothing report
/// `false` / `None`; they never fail.
pub trait EnvironmentProbe {
    /// True if a circle at `center` with `radius` overlaps any collider
    /// whose layers intersect `layers`.
    fn overlap_circle(&self, center: Vec2, radius: f32, layers: u32) -> bool;

    /// Cast a ray and return the closest hit within `max_distance`.
    ///
    /// # Arguments
    /// * `origin` - Ray origin in world space
    /// * `direction` - Cast direction (should be normalized)
    /// * `max_distance` - Maximum cast distance
    /// * `layers` - Layer filter bits
    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        layers: u32,
    ) -> Option<CollisionData>;
}

/// Trait for physics backend implementations.
///
/// Implement this trait to integrate a physics engine with the player
/// controller. The plugin returned by [`plugin`](Self::plugin) must schedule
/// systems in [`PlayerControllerSet::Logic`](crate::PlayerControllerSet::Logic)
/// and [`PlayerControllerSet::Physics`](crate::PlayerControllerSet::Physics)
/// that drive each [`PlayerController`](crate::controller::PlayerController)
/// with a probe over the backend's world (see
/// [`drive_controller`](crate::systems::drive_controller)).
///
/// # Example
///
/// For example implementations, see the `rapier` module's `Rapier2dBackend`
/// and the `kinematic` module's `KinematicBackend`.
pub trait CharacterPhysicsBackend: 'static + Send + Sync {
    /// Component holding the body's linear velocity.
    type VelocityComponent: Component<Mutability = Mutable>;

    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Read the linear velocity.
    fn linear_velocity(velocity: &Self::VelocityComponent) -> Vec2;

    /// Overwrite the linear velocity.
    fn set_linear_velocity(velocity: &mut Self::VelocityComponent, value: Vec2);
}

/// A probe over an empty world: nothing is ever hit.
///
/// Useful for controllers that have not been placed in a level yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyProbe;

impl EnvironmentProbe for EmptyProbe {
    fn overlap_circle(&self, _center: Vec2, _radius: f32, _layers: u32) -> bool {
        false
    }

    fn raycast(
        &self,
        _origin: Vec2,
        _direction: Vec2,
        _max_distance: f32,
        _layers: u32,
    ) -> Option<CollisionData> {
        None
    }
}
