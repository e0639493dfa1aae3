//! # `fsm_platformer_controller`
//!
//! A finite-state-machine player controller for 2D platformers with physics
//! backend abstraction.
//!
//! This crate provides a platformer player controller that:
//! - Runs, jumps (with coyote time, variable jump height and multi-jump)
//! - Grabs, climbs, slides down and jumps off walls
//! - Hangs from and climbs over ledge corners
//! - Performs grounded attacks driven by animation callbacks
//! - Abstracts physics backend for easy swapping (Rapier2D and a headless
//!   kinematic world included)
//!
//! ## Architecture
//!
//! Every behavior is a state ([`states`]) with enter/exit, per-frame logic,
//! per-fixed-step physics and animation callback hooks. Exactly one state is
//! active at a time, owned by the [`machine::PlayerStateMachine`] inside the
//! [`controller::PlayerController`] component:
//! 1. The backend loads the body into a [`controller::BodyProxy`]
//! 2. Pending animation callbacks are delivered to the current state
//! 3. The state samples the environment through an [`backend::EnvironmentProbe`]
//! 4. The state writes velocity and requests at most one transition
//! 5. The backend writes the body back; facing flips turn
//!    [`systems::FacingVisual`] children, not the physics body
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use fsm_platformer_controller::prelude::*;
//!
//! // Create the components for a player entity
//! let controller = PlayerController::new(PlayerParams::default()).unwrap();
//! let input = PlayerInput::default();
//!
//! // These are spawned together with the backend's body components
//! ```

use bevy::prelude::*;

pub mod animation;
pub mod backend;
pub mod collision;
pub mod config;
pub mod controller;
pub mod input;
pub mod kinematic;
pub mod machine;
pub mod state;
pub mod states;
pub mod systems;

#[cfg(feature = "rapier2d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::animation::{AnimationEventKind, AnimatorParams, PlayerAnimationEvent};
    pub use crate::backend::{CharacterPhysicsBackend, EmptyProbe, EnvironmentProbe};
    pub use crate::config::{ConfigError, PlayerParams, PlayerProfile, ProbeAnchors};
    pub use crate::controller::{BodyProxy, PlayerController};
    pub use crate::input::{AttackSlot, PlayerInput};
    pub use crate::kinematic::{KinematicBackend, KinematicBody, StaticCollider, StaticGeometry};
    pub use crate::state::PlayerStateId;
    pub use crate::systems::FacingVisual;
    pub use crate::{PlayerControllerPlugin, PlayerControllerSet};

    #[cfg(feature = "rapier2d")]
    pub use crate::rapier::{Rapier2dBackend, Rapier2dPlayerBundle};
}

/// System sets for the player controller.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlayerControllerSet {
    /// Animation callbacks are parked on their controllers.
    Animation,
    /// Per-frame logic tick.
    Logic,
    /// Fixed-step physics tick.
    Physics,
    /// Facing is mirrored onto visual children.
    Visuals,
}

/// Main plugin for the player controller.
///
/// This plugin is generic over a physics backend `B` which provides the
/// environment probe and the body the controller drives.
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier2dBackend`)
///
/// # Examples
///
/// With Rapier2D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use fsm_platformer_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(PlayerControllerPlugin::<Rapier2dBackend>::default())
///     .run();
/// ```
pub struct PlayerControllerPlugin<B: backend::CharacterPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::CharacterPhysicsBackend> Default for PlayerControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::CharacterPhysicsBackend> Plugin for PlayerControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::PlayerParams>();
        app.register_type::<config::ProbeAnchors>();
        app.register_type::<input::PlayerInput>();
        app.register_type::<input::AttackSlot>();
        app.register_type::<state::PlayerStateId>();
        app.register_type::<animation::AnimationEventKind>();
        app.register_type::<systems::FacingVisual>();

        app.add_event::<animation::PlayerAnimationEvent>();

        app.configure_sets(
            Update,
            (
                PlayerControllerSet::Animation,
                PlayerControllerSet::Logic,
                PlayerControllerSet::Visuals,
            )
                .chain(),
        );
        app.configure_sets(FixedUpdate, PlayerControllerSet::Physics);

        app.add_systems(
            Update,
            (
                systems::route_animation_events.in_set(PlayerControllerSet::Animation),
                systems::sync_facing_visuals.in_set(PlayerControllerSet::Visuals),
            ),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());
    }
}
