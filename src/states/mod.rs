//! Concrete player states and their dispatch.
//!
//! States are constructed once per controller and reused. Shared behavior
//! that would classically live in a superstate (ground handling, wall
//! handling) is provided as explicit helper functions called by the states
//! that need it. Cross-state collaboration is explicit too: the dispatch
//! below hands every state exactly the other states it reads or writes.

mod air;
mod attack;
mod grounded;
mod ledge;
mod wall;

pub use air::{InAirState, JumpState};
pub use attack::AttackState;
pub use grounded::{GroundedChecks, IdleState, LandState, MoveState};
pub use ledge::LedgeClimbState;
pub use wall::{WallChecks, WallClimbState, WallGrabState, WallJumpState, WallSlideState};

use crate::animation::AnimationEventKind;
use crate::config::PlayerParams;
use crate::controller::Character;
use crate::input::AttackSlot;
use crate::state::{PlayerState, PlayerStateId, StateCore, Transition};

/// Pool of every state instance owned by one controller.
#[derive(Debug, Clone)]
pub struct PlayerStates {
    idle: IdleState,
    move_state: MoveState,
    jump: JumpState,
    in_air: InAirState,
    land: LandState,
    wall_grab: WallGrabState,
    wall_climb: WallClimbState,
    wall_slide: WallSlideState,
    wall_jump: WallJumpState,
    ledge_climb: LedgeClimbState,
    primary_attack: AttackState,
    secondary_attack: AttackState,
}

impl PlayerStates {
    pub(crate) fn new(params: &PlayerParams) -> Self {
        Self {
            idle: IdleState::new("idle"),
            move_state: MoveState::new("move"),
            jump: JumpState::new("inAir", params),
            in_air: InAirState::new("inAir"),
            land: LandState::new("land"),
            wall_grab: WallGrabState::new("wallGrab"),
            wall_climb: WallClimbState::new("wallClimb"),
            wall_slide: WallSlideState::new("wallSlide"),
            wall_jump: WallJumpState::new("inAir"),
            ledge_climb: LedgeClimbState::new("ledgeClimbState"),
            primary_attack: AttackState::new("attack1", AttackSlot::Primary),
            secondary_attack: AttackState::new("attack2", AttackSlot::Secondary),
        }
    }

    pub fn idle(&self) -> &IdleState {
        &self.idle
    }

    pub fn move_state(&self) -> &MoveState {
        &self.move_state
    }

    pub fn jump(&self) -> &JumpState {
        &self.jump
    }

    pub fn in_air(&self) -> &InAirState {
        &self.in_air
    }

    pub fn land(&self) -> &LandState {
        &self.land
    }

    pub fn wall_grab(&self) -> &WallGrabState {
        &self.wall_grab
    }

    pub fn wall_jump(&self) -> &WallJumpState {
        &self.wall_jump
    }

    pub fn ledge_climb(&self) -> &LedgeClimbState {
        &self.ledge_climb
    }

    pub fn attack(&self, slot: AttackSlot) -> &AttackState {
        match slot {
            AttackSlot::Primary => &self.primary_attack,
            AttackSlot::Secondary => &self.secondary_attack,
        }
    }

    /// Shared bookkeeping of a state.
    pub fn core(&self, id: PlayerStateId) -> &StateCore {
        self.state(id).core()
    }

    fn state(&self, id: PlayerStateId) -> &dyn PlayerState {
        match id {
            PlayerStateId::Idle => &self.idle,
            PlayerStateId::Move => &self.move_state,
            PlayerStateId::Jump => &self.jump,
            PlayerStateId::InAir => &self.in_air,
            PlayerStateId::Land => &self.land,
            PlayerStateId::WallGrab => &self.wall_grab,
            PlayerStateId::WallClimb => &self.wall_climb,
            PlayerStateId::WallSlide => &self.wall_slide,
            PlayerStateId::WallJump => &self.wall_jump,
            PlayerStateId::LedgeClimb => &self.ledge_climb,
            PlayerStateId::PrimaryAttack => &self.primary_attack,
            PlayerStateId::SecondaryAttack => &self.secondary_attack,
        }
    }

    fn state_mut(&mut self, id: PlayerStateId) -> &mut dyn PlayerState {
        match id {
            PlayerStateId::Idle => &mut self.idle,
            PlayerStateId::Move => &mut self.move_state,
            PlayerStateId::Jump => &mut self.jump,
            PlayerStateId::InAir => &mut self.in_air,
            PlayerStateId::Land => &mut self.land,
            PlayerStateId::WallGrab => &mut self.wall_grab,
            PlayerStateId::WallClimb => &mut self.wall_climb,
            PlayerStateId::WallSlide => &mut self.wall_slide,
            PlayerStateId::WallJump => &mut self.wall_jump,
            PlayerStateId::LedgeClimb => &mut self.ledge_climb,
            PlayerStateId::PrimaryAttack => &mut self.primary_attack,
            PlayerStateId::SecondaryAttack => &mut self.secondary_attack,
        }
    }

    pub(crate) fn do_checks(&mut self, id: PlayerStateId, character: &Character) {
        self.state_mut(id).do_checks(character);
    }

    pub(crate) fn enter(&mut self, id: PlayerStateId, character: &mut Character) {
        if id != PlayerStateId::InAir {
            self.in_air.discard_pending();
        }

        match id {
            id if id.is_grounded() => {
                self.state_mut(id).enter(character);
                grounded::on_enter(&mut self.jump, character);
            }
            PlayerStateId::Jump => self.jump.enter_with(character, &mut self.in_air),
            PlayerStateId::WallJump => self.wall_jump.enter_with(character, &mut self.jump),
            _ => self.state_mut(id).enter(character),
        }
    }

    pub(crate) fn exit(&mut self, id: PlayerStateId, character: &mut Character) {
        self.state_mut(id).exit(character);
    }

    pub(crate) fn logic_update(
        &mut self,
        id: PlayerStateId,
        character: &mut Character,
    ) -> Transition {
        let Self {
            idle,
            move_state,
            jump,
            in_air,
            land,
            wall_grab,
            wall_climb,
            wall_slide,
            wall_jump,
            ledge_climb,
            primary_attack,
            secondary_attack,
        } = self;

        match id {
            PlayerStateId::Idle => idle.logic_update(character, jump, in_air),
            PlayerStateId::Move => move_state.logic_update(character, jump, in_air),
            PlayerStateId::Land => land.logic_update(character, jump, in_air),
            PlayerStateId::Jump => jump.logic_update(character),
            PlayerStateId::InAir => in_air.logic_update(character, jump, ledge_climb, wall_jump),
            PlayerStateId::WallGrab => wall_grab.logic_update(character, ledge_climb, wall_jump),
            PlayerStateId::WallClimb => wall_climb.logic_update(character, ledge_climb, wall_jump),
            PlayerStateId::WallSlide => wall_slide.logic_update(character, ledge_climb, wall_jump),
            PlayerStateId::WallJump => wall_jump.logic_update(character),
            PlayerStateId::LedgeClimb => ledge_climb.logic_update(character, in_air),
            PlayerStateId::PrimaryAttack => primary_attack.logic_update(character),
            PlayerStateId::SecondaryAttack => secondary_attack.logic_update(character),
        }
    }

    pub(crate) fn physics_update(&mut self, id: PlayerStateId, character: &mut Character) {
        self.state_mut(id).physics_update(character);
    }

    pub(crate) fn animation_event(
        &mut self,
        id: PlayerStateId,
        kind: AnimationEventKind,
        character: &mut Character,
    ) {
        let state = self.state_mut(id);
        match kind {
            AnimationEventKind::Trigger => state.animation_trigger(character),
            AnimationEventKind::Finished => state.animation_finish_trigger(character),
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use super::*;
    use crate::animation::AnimatorParams;
    use crate::config::ProbeAnchors;
    use crate::controller::{BodyProxy, CharacterRuntime};
    use crate::input::PlayerInput;
    use crate::kinematic::{StaticCollider, StaticGeometry};

    fn wall_geometry() -> StaticGeometry {
        StaticGeometry::default().with_collider(StaticCollider::from_min_max(
            Vec2::new(1.0, -20.0),
            Vec2::new(3.0, 0.0),
        ))
    }

    // ==================== Check Tests ====================

    #[test]
    fn do_checks_is_idempotent_within_a_tick() {
        let geometry = wall_geometry();
        let params = PlayerParams::default();
        let anchors = ProbeAnchors::default();
        let mut body = BodyProxy::new(Vec2::new(0.5, -3.0), Vec2::ZERO);
        let mut runtime = CharacterRuntime::default();
        let mut input = PlayerInput::default();
        let mut animator = AnimatorParams::default();
        let character = Character {
            body: &mut body,
            runtime: &mut runtime,
            input: &mut input,
            animator: &mut animator,
            params: &params,
            anchors: &anchors,
            probe: &geometry,
        };

        let mut states = PlayerStates::new(&params);
        for id in PlayerStateId::ALL {
            states.do_checks(id, &character);
        }
        let first = (states.idle.checks(), states.wall_grab.checks());

        for id in PlayerStateId::ALL {
            states.do_checks(id, &character);
            states.do_checks(id, &character);
        }
        let second = (states.idle.checks(), states.wall_grab.checks());

        assert_eq!(first, second);
        assert!(first.1.is_touching_wall);
        assert!(first.1.is_touching_ledge);
        assert!(!first.1.is_grounded);
    }

    // ==================== Re-entry Tests ====================

    #[test]
    fn arming_in_air_only_survives_a_direct_transition() {
        let geometry = StaticGeometry::default();
        let params = PlayerParams::default();
        let anchors = ProbeAnchors::default();
        let mut body = BodyProxy::new(Vec2::ZERO, Vec2::ZERO);
        let mut runtime = CharacterRuntime::default();
        let mut input = PlayerInput::default();
        let mut animator = AnimatorParams::default();
        let mut character = Character {
            body: &mut body,
            runtime: &mut runtime,
            input: &mut input,
            animator: &mut animator,
            params: &params,
            anchors: &anchors,
            probe: &geometry,
        };

        let mut states = PlayerStates::new(&params);
        states.in_air.set_is_jumping();
        states.in_air.start_coyote_time();
        states.enter(PlayerStateId::InAir, &mut character);
        assert!(states.in_air().is_jumping());
        assert!(states.in_air().is_coyote_time());
        states.exit(PlayerStateId::InAir, &mut character);

        states.in_air.set_is_jumping();
        states.enter(PlayerStateId::Idle, &mut character);
        states.exit(PlayerStateId::Idle, &mut character);
        states.enter(PlayerStateId::InAir, &mut character);
        assert!(!states.in_air().is_jumping(), "stale arming leaked");
        assert!(!states.in_air().is_coyote_time(), "previous activation leaked");
    }

    #[test]
    fn grounded_entry_restores_jump_budget() {
        let geometry = StaticGeometry::default();
        let params = PlayerParams::default().with_jumps(12.0, 3);
        let anchors = ProbeAnchors::default();
        let mut body = BodyProxy::default();
        let mut runtime = CharacterRuntime::default();
        let mut input = PlayerInput::default();
        let mut animator = AnimatorParams::default();
        let mut character = Character {
            body: &mut body,
            runtime: &mut runtime,
            input: &mut input,
            animator: &mut animator,
            params: &params,
            anchors: &anchors,
            probe: &geometry,
        };

        let mut states = PlayerStates::new(&params);
        states.enter(PlayerStateId::Jump, &mut character);
        assert_eq!(states.jump().amount_of_jumps_left(), 2);
        assert_eq!(character.current_velocity().y, 12.0);
        states.exit(PlayerStateId::Jump, &mut character);

        states.enter(PlayerStateId::Land, &mut character);
        assert_eq!(states.jump().amount_of_jumps_left(), 3);
        states.exit(PlayerStateId::Land, &mut character);

        states.enter(PlayerStateId::Jump, &mut character);
        states.exit(PlayerStateId::Jump, &mut character);
        states.enter(PlayerStateId::WallGrab, &mut character);
        assert_eq!(
            states.jump().amount_of_jumps_left(),
            2,
            "only ground states restore jumps"
        );
    }
}
