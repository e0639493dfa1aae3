//! Player tuning configuration.
//!
//! This module defines the tunable parameter set shared by every player
//! state, the probe anchor layout, and the named profile bundle that is
//! loaded (and validated) once before a controller starts.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Profile format version understood by this crate.
pub const PROFILE_VERSION: u32 = 1;

/// Errors raised while loading or validating player configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse player profile: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("`{field}` must be zero or positive, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("`{field}` must be finite")]
    NonFinite { field: &'static str },

    #[error("`wall_jump_angle` must be a non-zero vector")]
    ZeroWallJumpAngle,

    #[error("`jump_height_multiplier` must be within [0, 1], got {0}")]
    MultiplierOutOfRange(f32),

    #[error("`ledge_check` (y = {ledge}) must sit above `wall_check` (y = {wall})")]
    LedgeCheckNotAboveWallCheck { ledge: f32, wall: f32 },

    #[error("player profile version {found} is not supported (expected {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// Tunable parameters for the player state machine.
///
/// Read-only once a controller is built. Every state reads from the same
/// instance owned by the [`PlayerController`](crate::controller::PlayerController).
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerParams {
    // === Move ===
    /// Horizontal speed on the ground and in the air (units/second).
    pub movement_velocity: f32,

    // === Jump ===
    /// Vertical speed set when a jump starts (units/second).
    pub jump_velocity: f32,
    /// Number of jumps available before touching ground again.
    pub amount_of_jumps: u32,

    // === In Air ===
    /// Grace window after walking off ground during which the ground jump
    /// is still available (seconds).
    pub coyote_time: f32,
    /// Factor applied to upward velocity when jump is released early.
    pub jump_height_multiplier: f32,

    // === Wall Jump ===
    /// Launch speed of a wall jump (units/second).
    pub wall_jump_velocity: f32,
    /// How long the wall jump owns the character before air control resumes (seconds).
    pub wall_jump_time: f32,
    /// Launch direction for a wall jump facing +X. Normalized on use.
    pub wall_jump_angle: Vec2,

    // === Wall Slide / Climb ===
    /// Downward speed while sliding on a wall (units/second).
    pub wall_slide_velocity: f32,
    /// Upward speed while climbing a wall (units/second).
    pub wall_climb_velocity: f32,

    // === Ledge Climb ===
    /// Offset from the ledge corner to the hanging position (x mirrored by facing).
    pub start_offset: Vec2,
    /// Offset from the ledge corner to the final standing position (x mirrored by facing).
    pub stop_offset: Vec2,

    // === Checks ===
    /// Radius of the ground overlap check.
    pub ground_check_radius: f32,
    /// Length of the wall and ledge rays.
    pub wall_check_distance: f32,
    /// Layer bits treated as ground for every check.
    pub ground_layers: u32,

    // === Input / tolerances ===
    /// How long a jump press stays buffered before it expires (seconds).
    pub jump_input_hold_time: f32,
    /// Inset past the wall face used by the downward corner probe.
    pub corner_probe_skin: f32,
    /// Vertical velocity below which a grounded character counts as landed.
    pub landing_velocity_threshold: f32,
}

impl Default for PlayerParams {
    fn default() -> Self {
        Self {
            movement_velocity: 10.0,

            jump_velocity: 15.0,
            amount_of_jumps: 1,

            coyote_time: 0.2,
            jump_height_multiplier: 0.5,

            wall_jump_velocity: 20.0,
            wall_jump_time: 0.4,
            wall_jump_angle: Vec2::new(1.0, 2.0),

            wall_slide_velocity: 3.0,
            wall_climb_velocity: 3.0,

            start_offset: Vec2::ZERO,
            stop_offset: Vec2::ZERO,

            ground_check_radius: 0.3,
            wall_check_distance: 0.5,
            ground_layers: u32::MAX,

            jump_input_hold_time: 0.2,
            corner_probe_skin: 0.015,
            landing_velocity_threshold: 0.01,
        }
    }
}

impl PlayerParams {
    /// Reject negative, non-finite, or degenerate values.
    ///
    /// Called by [`PlayerController::new`](crate::controller::PlayerController::new)
    /// and by profile loading, so an invalid set never reaches a running state.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("movement_velocity", self.movement_velocity),
            ("jump_velocity", self.jump_velocity),
            ("coyote_time", self.coyote_time),
            ("jump_height_multiplier", self.jump_height_multiplier),
            ("wall_jump_velocity", self.wall_jump_velocity),
            ("wall_jump_time", self.wall_jump_time),
            ("wall_slide_velocity", self.wall_slide_velocity),
            ("wall_climb_velocity", self.wall_climb_velocity),
            ("ground_check_radius", self.ground_check_radius),
            ("wall_check_distance", self.wall_check_distance),
            ("jump_input_hold_time", self.jump_input_hold_time),
            ("corner_probe_skin", self.corner_probe_skin),
            ("landing_velocity_threshold", self.landing_velocity_threshold),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        let vectors = [
            ("wall_jump_angle", self.wall_jump_angle),
            ("start_offset", self.start_offset),
            ("stop_offset", self.stop_offset),
        ];
        for (field, value) in vectors {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
        }

        if self.wall_jump_angle == Vec2::ZERO {
            return Err(ConfigError::ZeroWallJumpAngle);
        }
        if self.jump_height_multiplier > 1.0 {
            return Err(ConfigError::MultiplierOutOfRange(
                self.jump_height_multiplier,
            ));
        }
        Ok(())
    }

    /// Builder: set movement velocity.
    pub fn with_movement_velocity(mut self, velocity: f32) -> Self {
        self.movement_velocity = velocity;
        self
    }

    /// Builder: set jump velocity and number of jumps.
    pub fn with_jumps(mut self, velocity: f32, amount: u32) -> Self {
        self.jump_velocity = velocity;
        self.amount_of_jumps = amount;
        self
    }

    /// Builder: set coyote time.
    pub fn with_coyote_time(mut self, time: f32) -> Self {
        self.coyote_time = time;
        self
    }

    /// Builder: set the early-release jump multiplier.
    pub fn with_jump_height_multiplier(mut self, multiplier: f32) -> Self {
        self.jump_height_multiplier = multiplier;
        self
    }

    /// Builder: set wall jump parameters.
    pub fn with_wall_jump(mut self, velocity: f32, time: f32, angle: Vec2) -> Self {
        self.wall_jump_velocity = velocity;
        self.wall_jump_time = time;
        self.wall_jump_angle = angle;
        self
    }

    /// Builder: set wall slide and climb speeds.
    pub fn with_wall_speeds(mut self, slide: f32, climb: f32) -> Self {
        self.wall_slide_velocity = slide;
        self.wall_climb_velocity = climb;
        self
    }

    /// Builder: set ledge climb offsets.
    pub fn with_ledge_offsets(mut self, start: Vec2, stop: Vec2) -> Self {
        self.start_offset = start;
        self.stop_offset = stop;
        self
    }

    /// Builder: set check sizes.
    pub fn with_checks(mut self, ground_radius: f32, wall_distance: f32) -> Self {
        self.ground_check_radius = ground_radius;
        self.wall_check_distance = wall_distance;
        self
    }

    /// Builder: set the ground layer filter.
    pub fn with_ground_layers(mut self, layers: u32) -> Self {
        self.ground_layers = layers;
        self
    }

    /// Builder: set the jump input buffer duration.
    pub fn with_jump_input_hold_time(mut self, time: f32) -> Self {
        self.jump_input_hold_time = time;
        self
    }
}

/// Local offsets of the three probe origins relative to the body position.
///
/// Offsets are authored for a character facing +X; the x component is
/// mirrored when facing -X.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeAnchors {
    /// Origin of the ground overlap check (usually at the feet).
    pub ground_check: Vec2,
    /// Origin of the forward/backward wall rays.
    pub wall_check: Vec2,
    /// Origin of the forward ledge ray. Must sit above `wall_check`.
    pub ledge_check: Vec2,
}

impl Default for ProbeAnchors {
    fn default() -> Self {
        Self {
            ground_check: Vec2::new(0.0, -1.0),
            wall_check: Vec2::new(0.3, 0.0),
            ledge_check: Vec2::new(0.3, 0.5),
        }
    }
}

impl ProbeAnchors {
    /// World position of an anchor offset for the given body position and facing.
    #[inline]
    pub fn resolve(offset: Vec2, position: Vec2, facing_direction: i32) -> Vec2 {
        position + Vec2::new(offset.x * facing_direction as f32, offset.y)
    }

    /// Reject non-finite offsets and a ledge origin that is not above the
    /// wall origin. The corner probe casts down from the ledge height to the
    /// wall height, so that span must be positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let offsets = [
            ("ground_check", self.ground_check),
            ("wall_check", self.wall_check),
            ("ledge_check", self.ledge_check),
        ];
        for (field, value) in offsets {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
        }

        if self.ledge_check.y <= self.wall_check.y {
            return Err(ConfigError::LedgeCheckNotAboveWallCheck {
                ledge: self.ledge_check.y,
                wall: self.wall_check.y,
            });
        }
        Ok(())
    }
}

/// A named, versioned player configuration bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub name: String,
    #[serde(default = "default_profile_version")]
    pub version: u32,
    #[serde(default)]
    pub params: PlayerParams,
    #[serde(default)]
    pub anchors: ProbeAnchors,
}

fn default_profile_version() -> u32 {
    PROFILE_VERSION
}

impl PlayerProfile {
    /// Create a profile with default parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: PROFILE_VERSION,
            params: PlayerParams::default(),
            anchors: ProbeAnchors::default(),
        }
    }

    /// Parse and validate a profile from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let profile: Self = serde_json::from_str(json)?;
        if profile.version > PROFILE_VERSION {
            warn!(
                "player profile `{}` has version {}, newer than {}",
                profile.name, profile.version, PROFILE_VERSION
            );
            return Err(ConfigError::UnsupportedVersion {
                found: profile.version,
                supported: PROFILE_VERSION,
            });
        }
        profile.params.validate()?;
        profile.anchors.validate()?;
        Ok(profile)
    }

    /// Serialize the profile to pretty JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
