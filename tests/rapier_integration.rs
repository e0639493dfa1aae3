//! Integration tests for the player controller on the Rapier2D backend.
//!
//! These tests run the controller against real Rapier bodies, so every
//! position and rotation the controller writes has to survive Rapier's
//! writeback of the simulated body.

#![cfg(feature = "rapier2d")]

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy_rapier2d::prelude::*;
use fsm_platformer_controller::prelude::*;

const FRAME: Duration = Duration::from_micros(16_667);

/// Create a minimal test app with Rapier physics and the player controller.
fn create_test_app() -> App {
    let mut app = App::new();

    app.add_plugins(MinimalPlugins);
    app.add_plugins(TransformPlugin);
    app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default());
    app.add_plugins(PlayerControllerPlugin::<Rapier2dBackend>::default());
    app.insert_resource(Time::<Fixed>::from_hz(60.0));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(FRAME));

    app.finish();
    app.cleanup();
    app
}

/// Spawn a static box collider from its min and max corners.
fn spawn_box(app: &mut App, min: Vec2, max: Vec2) -> Entity {
    let center = (min + max) / 2.0;
    let half = (max - min) / 2.0;
    app.world_mut()
        .spawn((
            Transform::from_translation(center.extend(0.0)),
            RigidBody::Fixed,
            Collider::cuboid(half.x, half.y),
        ))
        .id()
}

/// Spawn a player whose capsule spans one unit below and above its origin.
///
/// Static geometry must already be stepped into the query pipeline, or the
/// first logic tick sees an empty world.
fn spawn_player(app: &mut App, position: Vec2, params: PlayerParams) -> Entity {
    let player = app
        .world_mut()
        .spawn((
            Transform::from_translation(position.extend(0.0)),
            PlayerController::new(params).unwrap(),
            PlayerInput::default(),
            Rapier2dPlayerBundle::new(),
            Collider::capsule_y(0.7, 0.3),
        ))
        .id();
    let visual = app
        .world_mut()
        .spawn((Transform::default(), FacingVisual))
        .id();
    app.world_mut().entity_mut(player).add_child(visual);
    player
}

fn flat_world() -> App {
    let mut app = create_test_app();
    spawn_box(&mut app, Vec2::new(-50.0, -1.0), Vec2::new(50.0, 0.0));
    run(&mut app, 2);
    app
}

fn run(app: &mut App, updates: usize) {
    for _ in 0..updates {
        app.update();
    }
}

fn controller(app: &App, entity: Entity) -> &PlayerController {
    app.world().get::<PlayerController>(entity).unwrap()
}

fn state(app: &App, entity: Entity) -> Option<PlayerStateId> {
    controller(app, entity).current_state()
}

fn position(app: &App, entity: Entity) -> Vec2 {
    app.world()
        .get::<Transform>(entity)
        .unwrap()
        .translation
        .truncate()
}

fn input_mut(app: &mut App, entity: Entity) -> Mut<'_, PlayerInput> {
    app.world_mut().get_mut::<PlayerInput>(entity).unwrap()
}

fn visual_forward(app: &App, player: Entity) -> Vec3 {
    let children = app.world().get::<Children>(player).unwrap();
    let visual = children[0];
    app.world().get::<Transform>(visual).unwrap().rotation * Vec3::X
}

// ==================== Startup Tests ====================

#[test]
fn rapier_player_initializes_into_idle_on_the_floor() {
    let mut app = flat_world();
    let player = spawn_player(&mut app, Vec2::new(0.0, 1.0), PlayerParams::default());

    run(&mut app, 20);

    assert_eq!(state(&app, player), Some(PlayerStateId::Idle));
    let pos = position(&app, player);
    assert!((pos.y - 1.0).abs() < 0.1, "player sank or floated: {pos}");
}

// ==================== Movement Tests ====================

#[test]
fn rapier_move_and_flip_survive_writeback() {
    let mut app = flat_world();
    let player = spawn_player(&mut app, Vec2::new(0.0, 1.0), PlayerParams::default());
    run(&mut app, 5);

    input_mut(&mut app, player).set_movement(Vec2::NEG_X);
    run(&mut app, 15);

    assert_eq!(state(&app, player), Some(PlayerStateId::Move));
    assert_eq!(controller(&app, player).facing_direction(), -1);
    assert!(position(&app, player).x < -1.0);
    assert!(
        visual_forward(&app, player).x < -0.99,
        "visual lost the flip after physics steps"
    );

    // Flip back: each flip must start from the previous facing, not identity
    input_mut(&mut app, player).set_movement(Vec2::X);
    run(&mut app, 15);

    assert_eq!(controller(&app, player).facing_direction(), 1);
    assert!(visual_forward(&app, player).x > 0.99);

    // The body itself stays upright
    let body_rotation = app.world().get::<Transform>(player).unwrap().rotation;
    assert!(body_rotation.angle_between(Quat::IDENTITY) < 1e-3);
}

// ==================== Jump Tests ====================

#[test]
fn rapier_jump_leaves_and_lands() {
    let mut app = flat_world();
    let params = PlayerParams::default().with_jumps(6.0, 1);
    let player = spawn_player(&mut app, Vec2::new(0.0, 1.0), params);
    run(&mut app, 5);

    let now = app.world().resource::<Time>().elapsed_secs();
    input_mut(&mut app, player).press_jump(now);

    let mut seen_in_air = false;
    let mut peak = 1.0_f32;
    let mut landed = false;
    for _ in 0..240 {
        app.update();
        peak = peak.max(position(&app, player).y);
        match state(&app, player) {
            Some(PlayerStateId::InAir) => seen_in_air = true,
            Some(PlayerStateId::Land) | Some(PlayerStateId::Idle) if seen_in_air => {
                landed = true;
                break;
            }
            _ => {}
        }
    }

    assert!(seen_in_air, "jump never left the ground");
    assert!(peak > 2.0, "jump peak too low: {peak}");
    assert!(landed, "player never landed");

    run(&mut app, 30);
    assert!((position(&app, player).y - 1.0).abs() < 0.1);
}

// ==================== Ledge Tests ====================

#[test]
fn rapier_ledge_climb_places_player_on_top() {
    let mut app = create_test_app();
    spawn_box(&mut app, Vec2::new(1.0, -20.0), Vec2::new(3.0, 0.0));
    run(&mut app, 2);

    let params = PlayerParams::default()
        .with_ledge_offsets(Vec2::new(0.35, 0.2), Vec2::new(0.5, 1.0));
    let player = spawn_player(&mut app, Vec2::new(0.5, -0.3), params);

    // Idle loses the ground, InAir finds the wall without a ledge
    run(&mut app, 3);
    assert_eq!(state(&app, player), Some(PlayerStateId::LedgeClimb));
    let ledge = controller(&app, player).states().ledge_climb();
    assert!((ledge.corner_position() - Vec2::new(1.0, 0.0)).length() < 0.01);
    let start = ledge.start_position();

    // Pinned at the hang position despite gravity
    run(&mut app, 10);
    assert!((position(&app, player) - start).length() < 0.01);

    app.world_mut()
        .send_event(PlayerAnimationEvent::trigger(player));
    run(&mut app, 1);
    assert!(controller(&app, player).states().ledge_climb().is_hanging());

    input_mut(&mut app, player).set_movement(Vec2::X);
    run(&mut app, 1);
    assert!(controller(&app, player).states().ledge_climb().is_climbing());
    input_mut(&mut app, player).set_movement(Vec2::ZERO);

    app.world_mut()
        .send_event(PlayerAnimationEvent::finished(player));
    run(&mut app, 1);
    assert_eq!(state(&app, player), Some(PlayerStateId::Idle));

    run(&mut app, 20);
    let pos = position(&app, player);
    assert!((pos.x - 1.5).abs() < 0.05, "teleport lost: {pos}");
    assert!((pos.y - 1.0).abs() < 0.1, "not standing on the ledge: {pos}");
    assert_eq!(state(&app, player), Some(PlayerStateId::Idle));
}
