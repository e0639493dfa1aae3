//! The player controller component and the per-tick character context.
//!
//! [`PlayerController`] owns the tuning parameters, the pooled states, and
//! the state machine. Each tick it builds a [`Character`] view over the
//! body, input, animation sink and environment probe, and hands it to the
//! current state. [`Character`] is the single funnel through which states
//! write velocity, so the cached velocity and the body never drift apart.

use std::f32::consts::{PI, TAU};

use bevy::prelude::*;

use crate::animation::{AnimationEventKind, AnimationSink, AnimatorParams, PendingAnimationEvents};
use crate::backend::EnvironmentProbe;
use crate::collision::hit_distance;
use crate::config::{ConfigError, PlayerParams, PlayerProfile, ProbeAnchors};
use crate::input::PlayerInput;
use crate::machine::PlayerStateMachine;
use crate::state::PlayerStateId;
use crate::states::PlayerStates;

/// Snapshot of the physics body the controller drives.
///
/// Backends load this from their body before a tick and write it back after.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BodyProxy {
    /// Linear velocity.
    pub velocity: Vec2,
    /// World position.
    pub position: Vec2,
    /// Accumulated yaw rotation (radians) from facing flips this tick.
    pub yaw_delta: f32,
}

impl BodyProxy {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self {
            velocity,
            position,
            yaw_delta: 0.0,
        }
    }

    /// Take the accumulated yaw rotation, leaving zero behind.
    pub fn take_yaw_delta(&mut self) -> f32 {
        std::mem::take(&mut self.yaw_delta)
    }
}

/// Runtime data owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterRuntime {
    /// Velocity cached at the start of the tick and updated by every write.
    pub current_velocity: Vec2,
    /// +1 facing right, -1 facing left.
    pub facing_direction: i32,
    /// Timestamp of the tick being processed.
    pub time: f32,
}

impl Default for CharacterRuntime {
    fn default() -> Self {
        Self {
            current_velocity: Vec2::ZERO,
            facing_direction: 1,
            time: 0.0,
        }
    }
}

/// View of the character handed to states during a tick.
pub struct Character<'a> {
    pub(crate) body: &'a mut BodyProxy,
    pub(crate) runtime: &'a mut CharacterRuntime,
    pub(crate) input: &'a mut PlayerInput,
    pub(crate) animator: &'a mut dyn AnimationSink,
    pub(crate) params: &'a PlayerParams,
    pub(crate) anchors: &'a ProbeAnchors,
    pub(crate) probe: &'a dyn EnvironmentProbe,
}

impl Character<'_> {
    // === Accessors ===

    #[inline]
    pub fn params(&self) -> &PlayerParams {
        self.params
    }

    #[inline]
    pub fn input(&self) -> &PlayerInput {
        self.input
    }

    #[inline]
    pub fn input_mut(&mut self) -> &mut PlayerInput {
        self.input
    }

    /// Timestamp of the current tick.
    #[inline]
    pub fn now(&self) -> f32 {
        self.runtime.time
    }

    #[inline]
    pub fn current_velocity(&self) -> Vec2 {
        self.runtime.current_velocity
    }

    #[inline]
    pub fn facing_direction(&self) -> i32 {
        self.runtime.facing_direction
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    /// Teleport the body.
    pub fn set_position(&mut self, position: Vec2) {
        self.body.position = position;
    }

    pub fn set_animation_bool(&mut self, name: &'static str, value: bool) {
        self.animator.set_bool(name, value);
    }

    pub fn set_animation_float(&mut self, name: &'static str, value: f32) {
        self.animator.set_float(name, value);
    }

    // === Velocity funnel ===

    fn write_velocity(&mut self, velocity: Vec2) {
        self.body.velocity = velocity;
        self.runtime.current_velocity = velocity;
    }

    pub fn set_velocity_zero(&mut self) {
        self.write_velocity(Vec2::ZERO);
    }

    pub fn set_velocity_x(&mut self, velocity: f32) {
        let y = self.runtime.current_velocity.y;
        self.write_velocity(Vec2::new(velocity, y));
    }

    pub fn set_velocity_y(&mut self, velocity: f32) {
        let x = self.runtime.current_velocity.x;
        self.write_velocity(Vec2::new(x, velocity));
    }

    /// Set velocity along `angle` (normalized) with the x component signed by `direction`.
    pub fn set_velocity(&mut self, speed: f32, angle: Vec2, direction: i32) {
        let angle = angle.normalize_or_zero();
        self.write_velocity(Vec2::new(
            angle.x * speed * direction as f32,
            angle.y * speed,
        ));
    }

    // === Checks ===

    fn anchor(&self, offset: Vec2) -> Vec2 {
        ProbeAnchors::resolve(offset, self.body.position, self.runtime.facing_direction)
    }

    fn forward(&self) -> Vec2 {
        Vec2::X * self.runtime.facing_direction as f32
    }

    pub fn check_if_grounded(&self) -> bool {
        self.probe.overlap_circle(
            self.anchor(self.anchors.ground_check),
            self.params.ground_check_radius,
            self.params.ground_layers,
        )
    }

    pub fn check_if_touching_wall(&self) -> bool {
        self.probe
            .raycast(
                self.anchor(self.anchors.wall_check),
                self.forward(),
                self.params.wall_check_distance,
                self.params.ground_layers,
            )
            .is_some()
    }

    pub fn check_if_touching_wall_back(&self) -> bool {
        self.probe
            .raycast(
                self.anchor(self.anchors.wall_check),
                -self.forward(),
                self.params.wall_check_distance,
                self.params.ground_layers,
            )
            .is_some()
    }

    pub fn check_if_touching_ledge(&self) -> bool {
        self.probe
            .raycast(
                self.anchor(self.anchors.ledge_check),
                self.forward(),
                self.params.wall_check_distance,
                self.params.ground_layers,
            )
            .is_some()
    }

    /// Locate the corner of the ledge in front of the character.
    ///
    /// The x coordinate comes from the forward wall ray; the y coordinate from
    /// a downward ray cast from the ledge anchor height just past the wall face.
    pub fn determine_corner_position(&self) -> Vec2 {
        let facing = self.runtime.facing_direction as f32;
        let wall_check = self.anchor(self.anchors.wall_check);
        let ledge_check = self.anchor(self.anchors.ledge_check);

        let x_distance = hit_distance(self.probe.raycast(
            wall_check,
            self.forward(),
            self.params.wall_check_distance,
            self.params.ground_layers,
        ));

        let down_origin = ledge_check
            + Vec2::new((x_distance + self.params.corner_probe_skin) * facing, 0.0);
        let y_distance = hit_distance(self.probe.raycast(
            down_origin,
            Vec2::NEG_Y,
            ledge_check.y - wall_check.y,
            self.params.ground_layers,
        ));

        Vec2::new(
            wall_check.x + x_distance * facing,
            ledge_check.y - y_distance,
        )
    }

    /// Flip to face the input direction if it opposes the current facing.
    pub fn check_if_should_flip(&mut self, x_input: i32) {
        if x_input != 0 && x_input != self.runtime.facing_direction {
            self.flip();
        }
    }

    fn flip(&mut self) {
        self.runtime.facing_direction *= -1;
        self.body.yaw_delta += PI;
    }
}

/// Player controller component.
///
/// Owns the pooled states and the state machine. Backends call
/// [`logic_update`](Self::logic_update) once per frame and
/// [`physics_update`](Self::physics_update) once per fixed step.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use fsm_platformer_controller::prelude::*;
///
/// let mut controller = PlayerController::new(PlayerParams::default()).unwrap();
/// let mut body = BodyProxy::new(Vec2::ZERO, Vec2::ZERO);
/// let mut input = PlayerInput::default();
///
/// controller.initialize(&mut body, &mut input, &EmptyProbe, 0.0);
/// assert_eq!(controller.current_state(), Some(PlayerStateId::Idle));
/// ```
#[derive(Component, Debug)]
pub struct PlayerController {
    params: PlayerParams,
    anchors: ProbeAnchors,
    runtime: CharacterRuntime,
    animator: AnimatorParams,
    machine: PlayerStateMachine,
    states: PlayerStates,
    pending_animation_events: PendingAnimationEvents,
    visual_yaw: f32,
}

impl PlayerController {
    /// Build a controller, validating the parameters first.
    pub fn new(params: PlayerParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            params,
            anchors: ProbeAnchors::default(),
            runtime: CharacterRuntime::default(),
            animator: AnimatorParams::default(),
            machine: PlayerStateMachine::new(),
            states: PlayerStates::new(&params),
            pending_animation_events: PendingAnimationEvents::default(),
            visual_yaw: 0.0,
        })
    }

    /// Build a controller from a loaded profile, keeping its probe anchors.
    pub fn from_profile(profile: &PlayerProfile) -> Result<Self, ConfigError> {
        profile.anchors.validate()?;
        Ok(Self::new(profile.params)?.with_anchors(profile.anchors))
    }

    /// Builder: set the probe anchors.
    ///
    /// Anchors from untrusted sources should go through
    /// [`ProbeAnchors::validate`] or [`from_profile`](Self::from_profile).
    pub fn with_anchors(mut self, anchors: ProbeAnchors) -> Self {
        debug_assert!(anchors.validate().is_ok(), "invalid probe anchors {anchors:?}");
        self.anchors = anchors;
        self
    }

    /// Builder: set the initial facing direction (+1 or -1).
    pub fn with_facing_direction(mut self, direction: i32) -> Self {
        self.runtime.facing_direction = if direction < 0 { -1 } else { 1 };
        self.visual_yaw = if direction < 0 { PI } else { 0.0 };
        self
    }

    pub fn params(&self) -> &PlayerParams {
        &self.params
    }

    pub fn anchors(&self) -> &ProbeAnchors {
        &self.anchors
    }

    pub fn animator(&self) -> &AnimatorParams {
        &self.animator
    }

    pub fn machine(&self) -> &PlayerStateMachine {
        &self.machine
    }

    pub fn states(&self) -> &PlayerStates {
        &self.states
    }

    pub fn current_state(&self) -> Option<PlayerStateId> {
        self.machine.current()
    }

    pub fn previous_state(&self) -> Option<PlayerStateId> {
        self.machine.previous()
    }

    pub fn is_initialized(&self) -> bool {
        self.machine.current().is_some()
    }

    pub fn facing_direction(&self) -> i32 {
        self.runtime.facing_direction
    }

    pub fn current_velocity(&self) -> Vec2 {
        self.runtime.current_velocity
    }

    /// Yaw of the character's visuals, 0 facing right and PI facing left.
    ///
    /// Physics bodies keep their own rotation; facing flips only turn this
    /// yaw, which [`FacingVisual`](crate::systems::FacingVisual) children
    /// mirror.
    pub fn visual_yaw(&self) -> f32 {
        self.visual_yaw
    }

    /// Turn the visual yaw by a body yaw delta taken from a [`BodyProxy`].
    pub fn apply_yaw_delta(&mut self, delta: f32) {
        self.visual_yaw = (self.visual_yaw + delta).rem_euclid(TAU);
    }

    /// Queue an animation callback for the current state.
    ///
    /// Delivered at the top of the next [`logic_update`](Self::logic_update).
    pub fn push_animation_event(&mut self, kind: AnimationEventKind) {
        self.pending_animation_events.push(kind);
    }

    /// Enter the initial (Idle) state.
    pub fn initialize(
        &mut self,
        body: &mut BodyProxy,
        input: &mut PlayerInput,
        probe: &dyn EnvironmentProbe,
        now: f32,
    ) {
        self.runtime.time = now;
        self.runtime.current_velocity = body.velocity;

        let Self {
            params,
            anchors,
            runtime,
            animator,
            machine,
            states,
            ..
        } = self;
        let mut character = Character {
            body,
            runtime,
            input,
            animator,
            params,
            anchors,
            probe,
        };
        machine.initialize(states, PlayerStateId::Idle, &mut character);
    }

    /// Run one logic tick.
    pub fn logic_update(
        &mut self,
        body: &mut BodyProxy,
        input: &mut PlayerInput,
        probe: &dyn EnvironmentProbe,
        now: f32,
    ) {
        debug_assert!(
            self.is_initialized(),
            "logic_update called before PlayerController::initialize"
        );
        let Some(current) = self.machine.current() else {
            warn!("player logic tick skipped: state machine not initialized");
            return;
        };

        self.runtime.time = now;
        self.runtime.current_velocity = body.velocity;
        input.check_jump_input_hold_time(now, self.params.jump_input_hold_time);

        let Self {
            params,
            anchors,
            runtime,
            animator,
            machine,
            states,
            pending_animation_events,
            ..
        } = self;
        let mut character = Character {
            body,
            runtime,
            input,
            animator,
            params,
            anchors,
            probe,
        };

        for kind in pending_animation_events.drain() {
            states.animation_event(current, kind, &mut character);
        }

        states.do_checks(current, &character);
        if let Some(next) = states.logic_update(current, &mut character) {
            machine.change_state(states, next, &mut character);
        }
    }

    /// Run one fixed physics tick.
    pub fn physics_update(
        &mut self,
        body: &mut BodyProxy,
        input: &mut PlayerInput,
        probe: &dyn EnvironmentProbe,
        now: f32,
    ) {
        let Some(current) = self.machine.current() else {
            return;
        };

        self.runtime.time = now;
        self.runtime.current_velocity = body.velocity;

        let Self {
            params,
            anchors,
            runtime,
            animator,
            states,
            ..
        } = self;
        let mut character = Character {
            body,
            runtime,
            input,
            animator,
            params,
            anchors,
            probe,
        };
        states.physics_update(current, &mut character);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::EmptyProbe;

    fn with_character<R>(
        body: &mut BodyProxy,
        runtime: &mut CharacterRuntime,
        f: impl FnOnce(&mut Character) -> R,
    ) -> R {
        let params = PlayerParams::default();
        let anchors = ProbeAnchors::default();
        let mut input = PlayerInput::default();
        let mut animator = AnimatorParams::default();
        let mut character = Character {
            body,
            runtime,
            input: &mut input,
            animator: &mut animator,
            params: &params,
            anchors: &anchors,
            probe: &EmptyProbe,
        };
        f(&mut character)
    }

    // ==================== Velocity Funnel Tests ====================

    #[test]
    fn velocity_writes_keep_cache_and_body_in_sync() {
        let mut body = BodyProxy::new(Vec2::ZERO, Vec2::new(1.0, 2.0));
        let mut runtime = CharacterRuntime {
            current_velocity: body.velocity,
            ..default()
        };

        with_character(&mut body, &mut runtime, |c| {
            c.set_velocity_x(5.0);
            assert_eq!(c.current_velocity(), Vec2::new(5.0, 2.0));
            c.set_velocity_y(-3.0);
            assert_eq!(c.current_velocity(), Vec2::new(5.0, -3.0));
        });
        assert_eq!(body.velocity, Vec2::new(5.0, -3.0));
        assert_eq!(runtime.current_velocity, body.velocity);

        with_character(&mut body, &mut runtime, |c| c.set_velocity_zero());
        assert_eq!(body.velocity, Vec2::ZERO);
        assert_eq!(runtime.current_velocity, Vec2::ZERO);
    }

    #[test]
    fn angled_velocity_is_normalized_and_signed() {
        let mut body = BodyProxy::default();
        let mut runtime = CharacterRuntime::default();

        with_character(&mut body, &mut runtime, |c| {
            c.set_velocity(10.0, Vec2::new(3.0, 4.0), -1)
        });

        assert!((body.velocity - Vec2::new(-6.0, 8.0)).length() < 1e-5);
        assert_eq!(runtime.current_velocity, body.velocity);
    }

    // ==================== Facing Tests ====================

    #[test]
    fn flip_only_on_opposing_nonzero_input() {
        let mut body = BodyProxy::default();
        let mut runtime = CharacterRuntime::default();

        with_character(&mut body, &mut runtime, |c| {
            c.check_if_should_flip(0);
            assert_eq!(c.facing_direction(), 1);
            c.check_if_should_flip(1);
            assert_eq!(c.facing_direction(), 1);
            c.check_if_should_flip(-1);
            assert_eq!(c.facing_direction(), -1);
            c.check_if_should_flip(-1);
            assert_eq!(c.facing_direction(), -1);
        });

        assert_eq!(body.take_yaw_delta(), PI);
        assert_eq!(body.yaw_delta, 0.0);
    }

    #[test]
    fn checks_report_nothing_in_empty_world() {
        let mut body = BodyProxy::default();
        let mut runtime = CharacterRuntime::default();

        with_character(&mut body, &mut runtime, |c| {
            assert!(!c.check_if_grounded());
            assert!(!c.check_if_touching_wall());
            assert!(!c.check_if_touching_wall_back());
            assert!(!c.check_if_touching_ledge());
        });
    }

    // ==================== Controller Tests ====================

    #[test]
    fn new_rejects_invalid_params() {
        let params = PlayerParams::default().with_movement_velocity(-2.0);
        assert!(PlayerController::new(params).is_err());
    }

    #[test]
    fn initialize_enters_idle() {
        let mut controller = PlayerController::new(PlayerParams::default()).unwrap();
        assert!(!controller.is_initialized());

        let mut body = BodyProxy::default();
        let mut input = PlayerInput::default();
        controller.initialize(&mut body, &mut input, &EmptyProbe, 0.0);

        assert_eq!(controller.current_state(), Some(PlayerStateId::Idle));
        assert_eq!(controller.previous_state(), None);
        assert!(controller.animator().bool("idle"));
    }

    #[test]
    fn facing_builder_normalizes_sign() {
        let controller = PlayerController::new(PlayerParams::default())
            .unwrap()
            .with_facing_direction(-7);
        assert_eq!(controller.facing_direction(), -1);
        assert_eq!(controller.visual_yaw(), PI);
    }

    #[test]
    fn yaw_deltas_wrap_to_a_single_turn() {
        let mut controller = PlayerController::new(PlayerParams::default()).unwrap();
        controller.apply_yaw_delta(PI);
        assert_eq!(controller.visual_yaw(), PI);
        controller.apply_yaw_delta(PI);
        assert!(controller.visual_yaw().abs() < 1e-5);
    }

    #[test]
    fn from_profile_keeps_anchors() {
        let mut profile = PlayerProfile::new("climber");
        profile.anchors.ledge_check = Vec2::new(0.4, 0.9);

        let controller = PlayerController::from_profile(&profile).unwrap();
        assert_eq!(controller.anchors().ledge_check, Vec2::new(0.4, 0.9));

        profile.anchors.ledge_check = Vec2::new(0.4, -0.5);
        assert!(matches!(
            PlayerController::from_profile(&profile),
            Err(ConfigError::LedgeCheckNotAboveWallCheck { .. })
        ));
    }
}
