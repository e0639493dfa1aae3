//! Headless kinematic backend.
//!
//! A minimal physics world for tests and headless simulation: level geometry
//! is a [`StaticGeometry`] resource of axis-aligned boxes, player bodies are
//! [`KinematicBody`] boxes moved by a fixed-step integrator that applies
//! gravity and resolves penetration one axis at a time.

use bevy::prelude::*;

use crate::backend::{CharacterPhysicsBackend, EnvironmentProbe};
use crate::collision::CollisionData;
use crate::controller::PlayerController;
use crate::input::PlayerInput;
use crate::systems::{drive_controller, ControllerTick};
use crate::PlayerControllerSet;

/// Kinematic physics backend for the player controller.
pub struct KinematicBackend;

impl CharacterPhysicsBackend for KinematicBackend {
    type VelocityComponent = KinematicBody;

    fn plugin() -> impl Plugin {
        KinematicBackendPlugin
    }

    fn linear_velocity(velocity: &KinematicBody) -> Vec2 {
        velocity.velocity
    }

    fn set_linear_velocity(velocity: &mut KinematicBody, value: Vec2) {
        velocity.velocity = value;
    }
}

/// Plugin that sets up the kinematic world and its systems.
pub struct KinematicBackendPlugin;

impl Plugin for KinematicBackendPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<StaticGeometry>();
        app.register_type::<KinematicBody>();
        app.register_type::<KinematicGravity>();
        app.init_resource::<StaticGeometry>();
        app.init_resource::<KinematicGravity>();

        app.add_systems(
            Update,
            kinematic_logic_tick.in_set(PlayerControllerSet::Logic),
        );
        app.add_systems(
            FixedUpdate,
            (
                kinematic_physics_tick.in_set(PlayerControllerSet::Physics),
                integrate_kinematic_bodies.after(PlayerControllerSet::Physics),
            ),
        );
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Axis-aligned static box.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct StaticCollider {
    pub center: Vec2,
    pub half_extents: Vec2,
    /// Layer bits this collider belongs to.
    pub layers: u32,
}

impl StaticCollider {
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents,
            layers: u32::MAX,
        }
    }

    /// Box spanning `min` to `max`.
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self::new((min + max) * 0.5, (max - min).abs() * 0.5)
    }

    /// Builder: set the layer bits.
    pub fn with_layers(mut self, layers: u32) -> Self {
        self.layers = layers;
        self
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    fn closest_point(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min(), self.max())
    }

    /// Open-interval overlap with another box; touching faces do not overlap.
    fn overlaps_box(&self, center: Vec2, half_extents: Vec2) -> bool {
        let delta = (center - self.center).abs();
        let reach = half_extents + self.half_extents;
        delta.x < reach.x && delta.y < reach.y
    }

    /// Slab test. Returns the entry distance and surface normal; a ray that
    /// starts inside the box hits at distance zero.
    fn ray_intersection(&self, origin: Vec2, direction: Vec2) -> Option<(f32, Vec2)> {
        let (min, max) = (self.min(), self.max());
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut normal = Vec2::ZERO;

        for axis in 0..2 {
            let o = origin[axis];
            let d = direction[axis];
            if d.abs() < f32::EPSILON {
                if o < min[axis] || o > max[axis] {
                    return None;
                }
                continue;
            }

            let mut t1 = (min[axis] - o) / d;
            let mut t2 = (max[axis] - o) / d;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            if t1 > t_enter {
                t_enter = t1;
                normal = Vec2::ZERO;
                normal[axis] = -d.signum();
            }
            t_exit = t_exit.min(t2);
            if t_enter > t_exit {
                return None;
            }
        }

        if t_exit < 0.0 {
            return None;
        }
        if t_enter < 0.0 {
            return Some((0.0, -direction));
        }
        Some((t_enter, normal))
    }
}

/// Level geometry of the kinematic world.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use fsm_platformer_controller::backend::EnvironmentProbe;
/// use fsm_platformer_controller::kinematic::{StaticCollider, StaticGeometry};
///
/// let geometry = StaticGeometry::default().with_collider(StaticCollider::from_min_max(
///     Vec2::new(-10.0, -1.0),
///     Vec2::new(10.0, 0.0),
/// ));
///
/// let hit = geometry.raycast(Vec2::new(0.0, 2.0), Vec2::NEG_Y, 5.0, u32::MAX);
/// assert_eq!(hit.map(|h| h.distance), Some(2.0));
/// ```
#[derive(Resource, Reflect, Debug, Clone, Default, PartialEq)]
#[reflect(Resource)]
pub struct StaticGeometry {
    colliders: Vec<StaticCollider>,
}

impl StaticGeometry {
    /// Builder: add a collider.
    pub fn with_collider(mut self, collider: StaticCollider) -> Self {
        self.colliders.push(collider);
        self
    }

    pub fn push(&mut self, collider: StaticCollider) {
        self.colliders.push(collider);
    }

    pub fn colliders(&self) -> &[StaticCollider] {
        &self.colliders
    }

    fn on_layers(&self, layers: u32) -> impl Iterator<Item = &StaticCollider> {
        self.colliders
            .iter()
            .filter(move |collider| collider.layers & layers != 0)
    }
}

impl EnvironmentProbe for StaticGeometry {
    fn overlap_circle(&self, center: Vec2, radius: f32, layers: u32) -> bool {
        self.on_layers(layers).any(|collider| {
            collider.closest_point(center).distance_squared(center) <= radius * radius
        })
    }

    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        layers: u32,
    ) -> Option<CollisionData> {
        let direction = direction.normalize_or_zero();
        if direction == Vec2::ZERO {
            return None;
        }

        self.on_layers(layers)
            .filter_map(|collider| collider.ray_intersection(origin, direction))
            .filter(|(distance, _)| *distance <= max_distance)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(distance, normal)| {
                CollisionData::new(distance, normal, origin + direction * distance, None)
            })
    }
}

// ============================================================================
// Bodies
// ============================================================================

/// World gravity applied by the kinematic integrator.
#[derive(Resource, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Resource)]
pub struct KinematicGravity(pub Vec2);

impl Default for KinematicGravity {
    fn default() -> Self {
        Self(Vec2::new(0.0, -9.81))
    }
}

/// Box-shaped body moved by the kinematic integrator.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct KinematicBody {
    pub velocity: Vec2,
    pub half_extents: Vec2,
    pub gravity_scale: f32,
}

impl Default for KinematicBody {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            half_extents: Vec2::new(0.3, 1.0),
            gravity_scale: 1.0,
        }
    }
}

impl KinematicBody {
    /// Builder: set the box half extents.
    pub fn with_half_extents(mut self, half_extents: Vec2) -> Self {
        self.half_extents = half_extents;
        self
    }

    /// Builder: set the gravity multiplier.
    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }
}

/// Move `position` along one axis and push it out of any box it entered.
fn move_axis(
    geometry: &StaticGeometry,
    position: &mut Vec2,
    body: &mut KinematicBody,
    axis: usize,
    dt: f32,
) {
    let step = body.velocity[axis] * dt;
    if step == 0.0 {
        return;
    }
    position[axis] += step;

    for collider in geometry.colliders() {
        if !collider.overlaps_box(*position, body.half_extents) {
            continue;
        }
        position[axis] = if step > 0.0 {
            collider.min()[axis] - body.half_extents[axis]
        } else {
            collider.max()[axis] + body.half_extents[axis]
        };
        body.velocity[axis] = 0.0;
    }
}

/// Apply gravity and velocity to every kinematic body, resolving collisions
/// against the static geometry.
pub fn integrate_kinematic_bodies(
    time: Res<Time>,
    gravity: Res<KinematicGravity>,
    geometry: Res<StaticGeometry>,
    mut q_bodies: Query<(&mut Transform, &mut KinematicBody)>,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }

    for (mut transform, mut body) in &mut q_bodies {
        let body = &mut *body;
        body.velocity += gravity.0 * body.gravity_scale * dt;

        let mut position = transform.translation.truncate();
        move_axis(&geometry, &mut position, body, 0, dt);
        move_axis(&geometry, &mut position, body, 1, dt);
        transform.translation = position.extend(transform.translation.z);
    }
}

// ============================================================================
// Controller ticks
// ============================================================================

type KinematicPlayerQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static mut PlayerController,
        &'static mut PlayerInput,
        &'static mut Transform,
        &'static mut KinematicBody,
    ),
>;

fn kinematic_tick(
    tick: ControllerTick,
    geometry: &StaticGeometry,
    now: f32,
    q_players: &mut KinematicPlayerQuery,
) {
    for (mut controller, mut input, mut transform, mut body) in q_players.iter_mut() {
        drive_controller::<KinematicBackend>(
            tick,
            &mut controller,
            &mut input,
            &mut transform,
            &mut body,
            geometry,
            now,
        );
    }
}

/// Per-frame logic tick for every kinematic player.
pub fn kinematic_logic_tick(
    geometry: Res<StaticGeometry>,
    time: Res<Time>,
    mut q_players: KinematicPlayerQuery,
) {
    kinematic_tick(
        ControllerTick::Logic,
        &geometry,
        time.elapsed_secs(),
        &mut q_players,
    );
}

/// Fixed-step physics tick for every kinematic player.
pub fn kinematic_physics_tick(
    geometry: Res<StaticGeometry>,
    time: Res<Time>,
    mut q_players: KinematicPlayerQuery,
) {
    kinematic_tick(
        ControllerTick::Physics,
        &geometry,
        time.elapsed_secs(),
        &mut q_players,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor() -> StaticCollider {
        StaticCollider::from_min_max(Vec2::new(-10.0, -1.0), Vec2::new(10.0, 0.0))
    }

    // ==================== Overlap Tests ====================

    #[test]
    fn circle_touching_top_face_overlaps() {
        let geometry = StaticGeometry::default().with_collider(floor());
        assert!(geometry.overlap_circle(Vec2::new(0.0, 0.3), 0.3, u32::MAX));
        assert!(!geometry.overlap_circle(Vec2::new(0.0, 0.31), 0.3, u32::MAX));
    }

    #[test]
    fn layers_filter_overlaps_and_rays() {
        let geometry = StaticGeometry::default().with_collider(floor().with_layers(0b10));

        assert!(!geometry.overlap_circle(Vec2::ZERO, 0.5, 0b01));
        assert!(geometry.overlap_circle(Vec2::ZERO, 0.5, 0b10));
        assert!(geometry
            .raycast(Vec2::new(0.0, 1.0), Vec2::NEG_Y, 5.0, 0b01)
            .is_none());
    }

    // ==================== Raycast Tests ====================

    #[test]
    fn ray_reports_entry_distance_normal_and_point() {
        let geometry = StaticGeometry::default().with_collider(floor());

        let hit = geometry
            .raycast(Vec2::new(2.0, 3.0), Vec2::NEG_Y, 5.0, u32::MAX)
            .expect("hit");
        assert_eq!(hit.distance, 3.0);
        assert_eq!(hit.normal, Vec2::Y);
        assert_eq!(hit.point, Vec2::new(2.0, 0.0));
        assert!(hit.entity.is_none());
    }

    #[test]
    fn ray_out_of_range_misses() {
        let geometry = StaticGeometry::default().with_collider(floor());
        assert!(geometry
            .raycast(Vec2::new(0.0, 3.0), Vec2::NEG_Y, 2.5, u32::MAX)
            .is_none());
        assert!(geometry
            .raycast(Vec2::new(0.0, 3.0), Vec2::Y, 100.0, u32::MAX)
            .is_none());
    }

    #[test]
    fn ray_starting_inside_hits_at_zero() {
        let geometry = StaticGeometry::default().with_collider(floor());
        let hit = geometry
            .raycast(Vec2::new(0.0, -0.5), Vec2::X, 1.0, u32::MAX)
            .expect("hit");
        assert_eq!(hit.distance, 0.0);
    }

    #[test]
    fn closest_of_several_boxes_wins() {
        let geometry = StaticGeometry::default()
            .with_collider(StaticCollider::from_min_max(
                Vec2::new(3.0, -1.0),
                Vec2::new(4.0, 1.0),
            ))
            .with_collider(StaticCollider::from_min_max(
                Vec2::new(1.0, -1.0),
                Vec2::new(2.0, 1.0),
            ));

        let hit = geometry
            .raycast(Vec2::ZERO, Vec2::X, 10.0, u32::MAX)
            .expect("hit");
        assert_eq!(hit.distance, 1.0);
        assert_eq!(hit.normal, Vec2::NEG_X);
    }

    // ==================== Integrator Tests ====================

    #[test]
    fn move_axis_stops_on_floor() {
        let geometry = StaticGeometry::default().with_collider(floor());
        let mut body = KinematicBody {
            velocity: Vec2::new(0.0, -10.0),
            ..default()
        };
        let mut position = Vec2::new(0.0, 1.05);

        move_axis(&geometry, &mut position, &mut body, 1, 0.1);

        assert_eq!(position.y, 1.0);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn move_axis_stops_at_wall() {
        let geometry = StaticGeometry::default().with_collider(StaticCollider::from_min_max(
            Vec2::new(1.0, -5.0),
            Vec2::new(3.0, 5.0),
        ));
        let mut body = KinematicBody {
            velocity: Vec2::new(10.0, 0.0),
            ..default()
        };
        let mut position = Vec2::new(0.5, 0.0);

        move_axis(&geometry, &mut position, &mut body, 0, 0.1);

        assert!((position.x - 0.7).abs() < 1e-6);
        assert_eq!(body.velocity.x, 0.0);
    }

    #[test]
    fn kinematic_backend_velocity_accessors() {
        let mut body = KinematicBody::default();
        KinematicBackend::set_linear_velocity(&mut body, Vec2::new(3.0, -1.0));
        assert_eq!(KinematicBackend::linear_velocity(&body), Vec2::new(3.0, -1.0));
    }
}
