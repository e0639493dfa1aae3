//! Rapier2D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier2D.
//! Enable with the `rapier2d` feature.

use bevy::prelude::*;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;

use crate::backend::{CharacterPhysicsBackend, EnvironmentProbe};
use crate::collision::CollisionData;
use crate::controller::PlayerController;
use crate::input::PlayerInput;
use crate::systems::{drive_controller, ControllerTick};
use crate::PlayerControllerSet;

/// Rapier2D physics backend for the player controller.
///
/// Environment checks are answered by Rapier's query pipeline through
/// [`RapierProbe`]; the tick systems receive `RapierContext` as a system
/// parameter.
pub struct Rapier2dBackend;

impl CharacterPhysicsBackend for Rapier2dBackend {
    type VelocityComponent = Velocity;

    fn plugin() -> impl Plugin {
        Rapier2dBackendPlugin
    }

    fn linear_velocity(velocity: &Velocity) -> Vec2 {
        velocity.linvel
    }

    fn set_linear_velocity(velocity: &mut Velocity, value: Vec2) {
        velocity.linvel = value;
    }
}

/// Plugin that sets up Rapier2D-specific systems for the player controller.
pub struct Rapier2dBackendPlugin;

impl Plugin for Rapier2dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            rapier_logic_tick.in_set(PlayerControllerSet::Logic),
        );
        app.add_systems(
            FixedUpdate,
            rapier_physics_tick.in_set(PlayerControllerSet::Physics),
        );
    }
}

/// Environment probe over a Rapier context, ignoring the probing body itself.
pub struct RapierProbe<'a, 'w> {
    context: &'a RapierContext<'w>,
    exclude: Entity,
}

impl<'a, 'w> RapierProbe<'a, 'w> {
    pub fn new(context: &'a RapierContext<'w>, exclude: Entity) -> Self {
        Self { context, exclude }
    }

    fn filter(&self, layers: u32) -> QueryFilter<'static> {
        QueryFilter::default()
            .exclude_rigid_body(self.exclude)
            .exclude_sensors()
            .groups(CollisionGroups::new(
                Group::ALL,
                Group::from_bits_truncate(layers),
            ))
    }
}

impl EnvironmentProbe for RapierProbe<'_, '_> {
    fn overlap_circle(&self, center: Vec2, radius: f32, layers: u32) -> bool {
        let shape = Collider::ball(radius);
        self.context
            .intersection_with_shape(center, 0.0, &shape, self.filter(layers))
            .is_some()
    }

    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        layers: u32,
    ) -> Option<CollisionData> {
        self.context
            .cast_ray_and_get_normal(origin, direction, max_distance, true, self.filter(layers))
            .map(|(hit_entity, hit)| {
                CollisionData::new(
                    hit.time_of_impact,
                    hit.normal,
                    hit.point,
                    Some(hit_entity),
                )
            })
    }
}

type RapierPlayerQuery<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static mut PlayerController,
        &'static mut PlayerInput,
        &'static mut Transform,
        &'static mut Velocity,
    ),
>;

fn rapier_tick(
    tick: ControllerTick,
    rapier_context: &ReadRapierContext,
    now: f32,
    q_players: &mut RapierPlayerQuery,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, mut controller, mut input, mut transform, mut velocity) in q_players.iter_mut() {
        let probe = RapierProbe::new(&context, entity);
        drive_controller::<Rapier2dBackend>(
            tick,
            &mut controller,
            &mut input,
            &mut transform,
            &mut velocity,
            &probe,
            now,
        );
    }
}

/// Per-frame logic tick for every Rapier-backed player.
pub fn rapier_logic_tick(
    rapier_context: ReadRapierContext,
    time: Res<Time>,
    mut q_players: RapierPlayerQuery,
) {
    rapier_tick(
        ControllerTick::Logic,
        &rapier_context,
        time.elapsed_secs(),
        &mut q_players,
    );
}

/// Fixed-step physics tick for every Rapier-backed player.
pub fn rapier_physics_tick(
    rapier_context: ReadRapierContext,
    time: Res<Time>,
    mut q_players: RapierPlayerQuery,
) {
    rapier_tick(
        ControllerTick::Physics,
        &rapier_context,
        time.elapsed_secs(),
        &mut q_players,
    );
}

/// Bundle containing the Rapier physics components a player body needs.
///
/// Rotation is locked so the player never tips over. Rapier rewrites the
/// body rotation on every step, so facing is shown by rotating
/// [`FacingVisual`](crate::systems::FacingVisual) children instead of the
/// body. Friction is zero so the body does not stick to walls it presses
/// against.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use fsm_platformer_controller::prelude::*;
/// use fsm_platformer_controller::rapier::Rapier2dPlayerBundle;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 2.0, 0.0),
///         PlayerController::new(PlayerParams::default()).unwrap(),
///         PlayerInput::default(),
///         Rapier2dPlayerBundle::new(),
///         Collider::capsule_y(0.5, 0.3),
///     ));
/// }
/// ```
#[derive(Bundle)]
pub struct Rapier2dPlayerBundle {
    /// The rigid body type. Should typically be [`RigidBody::Dynamic`].
    pub rigid_body: RigidBody,
    /// Linear velocity written by the player states.
    pub velocity: Velocity,
    /// Rotation is locked by default.
    pub locked_axes: LockedAxes,
    /// Contact friction.
    pub friction: Friction,
}

impl Default for Rapier2dPlayerBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier2dPlayerBundle {
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            friction: Friction {
                coefficient: 0.0,
                combine_rule: CoefficientCombineRule::Min,
            },
        }
    }

    /// Set the rigid body type.
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Set the contact friction coefficient.
    pub fn with_friction(mut self, coefficient: f32) -> Self {
        self.friction.coefficient = coefficient;
        self
    }
}

#[cfg(test)]
mod tests {
    use bevy::ecs::system::RunSystemOnce;

    use super::*;

    fn create_test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default());
        app.insert_resource(Time::<Fixed>::from_hz(60.0));
        app
    }

    #[test]
    fn rapier_backend_velocity_accessors() {
        let mut velocity = Velocity::linear(Vec2::new(50.0, 30.0));
        assert_eq!(Rapier2dBackend::linear_velocity(&velocity), Vec2::new(50.0, 30.0));

        Rapier2dBackend::set_linear_velocity(&mut velocity, Vec2::new(100.0, 0.0));
        assert_eq!(velocity.linvel, Vec2::new(100.0, 0.0));
        assert_eq!(velocity.angvel, 0.0);
    }

    #[test]
    fn rapier_player_bundle_creates_valid_entity() {
        let mut app = create_test_app();

        let entity = app
            .world_mut()
            .spawn((
                Transform::default(),
                Rapier2dPlayerBundle::new(),
                Collider::capsule_y(0.5, 0.3),
            ))
            .id();

        app.update();

        assert!(app.world().get::<RigidBody>(entity).is_some());
        assert!(app.world().get::<Velocity>(entity).is_some());
        assert_eq!(
            app.world().get::<LockedAxes>(entity).copied(),
            Some(LockedAxes::ROTATION_LOCKED)
        );
    }

    #[test]
    fn rapier_probe_sees_static_ground() {
        let mut app = create_test_app();

        app.world_mut().spawn((
            Transform::from_xyz(0.0, -1.0, 0.0),
            RigidBody::Fixed,
            Collider::cuboid(10.0, 0.5),
        ));
        let player = app
            .world_mut()
            .spawn((Transform::default(), Rapier2dPlayerBundle::new()))
            .id();

        app.update();
        app.update();

        let (grounded, floating, hit) = app
            .world_mut()
            .run_system_once(move |rapier_context: ReadRapierContext| {
                let context = rapier_context.single().expect("rapier context");
                let probe = RapierProbe::new(&context, player);
                (
                    probe.overlap_circle(Vec2::new(0.0, -0.5), 0.1, u32::MAX),
                    probe.overlap_circle(Vec2::new(0.0, 2.0), 0.1, u32::MAX),
                    probe.raycast(Vec2::ZERO, Vec2::NEG_Y, 2.0, u32::MAX),
                )
            })
            .expect("system runs");

        assert!(grounded);
        assert!(!floating);
        let hit = hit.expect("ray hits the ground top");
        assert!((hit.distance - 0.5).abs() < 0.01);
    }
}
