//! Actors, projectiles and pickups
//!
//! The player and every enemy share [`Actor`]; what drives it (player input
//! or an archetype state machine) is decided by [`ActorKind`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::behavior::{Archetype, ArchetypeParams};
use super::geometry::Rect;
use super::physics::PhysicsTuning;
use crate::consts::HIT_FLASH_SECS;

/// Behavior state shared by every archetype
///
/// The player only ever uses `Idle` and `Dying`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorState {
    Idle,
    Patrol,
    Chase,
    Flank,
    Charge,
    Shoot,
    Stunned,
    /// Terminal; plays out a fixed timer, then the actor is pruned
    Dying,
}

impl BehaviorState {
    pub const ALL: [BehaviorState; 8] = [
        BehaviorState::Idle,
        BehaviorState::Patrol,
        BehaviorState::Chase,
        BehaviorState::Flank,
        BehaviorState::Charge,
        BehaviorState::Shoot,
        BehaviorState::Stunned,
        BehaviorState::Dying,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorState::Idle => "idle",
            BehaviorState::Patrol => "patrol",
            BehaviorState::Chase => "chase",
            BehaviorState::Flank => "flank",
            BehaviorState::Charge => "charge",
            BehaviorState::Shoot => "shoot",
            BehaviorState::Stunned => "stunned",
            BehaviorState::Dying => "dying",
        }
    }
}

/// Which side fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Player,
    Enemy,
}

/// What drives an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorKind {
    Player,
    Enemy(Archetype),
}

/// Tile contacts recorded by the last movement resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contacts {
    pub grounded: bool,
    pub ceiling: bool,
    pub wall_left: bool,
    pub wall_right: bool,
    pub hazard: bool,
}

impl Contacts {
    /// Wall on the side the actor is facing/moving toward
    pub fn wall_toward(&self, dir: f32) -> bool {
        (dir > 0.0 && self.wall_right) || (dir < 0.0 && self.wall_left)
    }
}

/// Count-down timers, all in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorTimers {
    pub invincible: f32,
    /// Time until the next shot is allowed
    pub shot_cooldown: f32,
    /// Remaining dash window
    pub dash: f32,
    pub dash_cooldown: f32,
    /// Horizontal input suppressed (after a wall jump or knockback)
    pub control_lock: f32,
    pub hit_flash: f32,
}

impl ActorTimers {
    fn tick(&mut self, dt: f32) {
        for t in [
            &mut self.invincible,
            &mut self.shot_cooldown,
            &mut self.dash,
            &mut self.dash_cooldown,
            &mut self.control_lock,
            &mut self.hit_flash,
        ] {
            *t = (*t - dt).max(0.0);
        }
    }
}

/// Outcome of [`Actor::take_damage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageResult {
    /// Already dying or invincible
    Ignored,
    Hurt,
    Killed,
}

/// A physics body driven by input or by a behavior state machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: u32,
    pub kind: ActorKind,
    /// Top-left corner in world pixels
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    /// +1 facing right, -1 facing left
    pub facing: f32,
    pub hp: i32,
    pub max_hp: i32,
    pub state: BehaviorState,
    /// Seconds spent in the current state
    pub state_time: f32,
    pub timers: ActorTimers,
    pub contacts: Contacts,
    /// Multiplier on gravity (0 for hovering archetypes)
    pub gravity_scale: f32,
    /// Center of the patrol range
    pub home_x: f32,
    /// Current patrol direction
    pub patrol_dir: f32,
    /// Flank destination or charge direction target
    pub target_point: Option<Vec2>,
    /// Animation frame for the renderer
    pub anim_frame: u32,
    #[serde(skip)]
    anim_clock: f32,
}

impl Actor {
    fn base(id: u32, kind: ActorKind, size: Vec2, hp: i32) -> Self {
        Self {
            id,
            kind,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            size,
            facing: 1.0,
            hp,
            max_hp: hp,
            state: BehaviorState::Idle,
            state_time: 0.0,
            timers: ActorTimers::default(),
            contacts: Contacts::default(),
            gravity_scale: 1.0,
            home_x: 0.0,
            patrol_dir: 1.0,
            target_point: None,
            anim_frame: 0,
            anim_clock: 0.0,
        }
    }

    /// Create the player standing on `feet`
    pub fn player(id: u32, feet: Vec2, tuning: &PhysicsTuning) -> Self {
        let mut actor = Self::base(
            id,
            ActorKind::Player,
            Vec2::new(tuning.player_width, tuning.player_height),
            tuning.player_max_hp,
        );
        actor.place_feet(feet);
        actor
    }

    /// Create an enemy of `archetype` standing (or hovering) at `feet`
    pub fn enemy(id: u32, archetype: Archetype, feet: Vec2, params: &ArchetypeParams) -> Self {
        let mut actor = Self::base(
            id,
            ActorKind::Enemy(archetype),
            Vec2::new(params.width, params.height),
            params.hp.max(1),
        );
        actor.place_feet(feet);
        actor.gravity_scale = params.gravity_scale;
        actor.home_x = actor.pos.x;
        actor.timers.shot_cooldown = params.shoot_cooldown;
        actor.state = archetype.initial_state();
        actor
    }

    pub fn archetype(&self) -> Option<Archetype> {
        match self.kind {
            ActorKind::Enemy(a) => Some(a),
            ActorKind::Player => None,
        }
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// Bottom-center point
    #[inline]
    pub fn feet(&self) -> Vec2 {
        Vec2::new(self.pos.x + self.size.x / 2.0, self.pos.y + self.size.y)
    }

    /// Move so the bottom-center sits on `feet`
    pub fn place_feet(&mut self, feet: Vec2) {
        self.pos = Vec2::new(feet.x - self.size.x / 2.0, feet.y - self.size.y);
    }

    #[inline]
    pub fn is_dying(&self) -> bool {
        self.state == BehaviorState::Dying
    }

    #[inline]
    pub fn is_invincible(&self) -> bool {
        self.timers.invincible > 0.0
    }

    /// Dying timer has run out; safe to prune
    pub fn finished_dying(&self, dying_secs: f32) -> bool {
        self.is_dying() && self.state_time >= dying_secs - crate::TIMER_EPSILON
    }

    /// Switch state and restart the state clock
    pub fn enter_state(&mut self, state: BehaviorState) {
        self.state = state;
        self.state_time = 0.0;
    }

    /// Apply damage. Reaching zero hp forces `Dying`, which nothing interrupts.
    pub fn take_damage(&mut self, amount: i32, invincible_secs: f32) -> DamageResult {
        if self.is_dying() || self.is_invincible() || amount <= 0 {
            return DamageResult::Ignored;
        }
        self.hp -= amount;
        self.timers.hit_flash = HIT_FLASH_SECS;
        if self.hp <= 0 {
            self.hp = 0;
            self.vel.x = 0.0;
            self.target_point = None;
            self.enter_state(BehaviorState::Dying);
            DamageResult::Killed
        } else {
            self.timers.invincible = invincible_secs;
            DamageResult::Hurt
        }
    }

    pub fn heal(&mut self, amount: i32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    /// Advance the state clock and all count-down timers
    pub fn tick_timers(&mut self, dt: f32) {
        self.state_time += dt;
        self.timers.tick(dt);
    }

    /// Advance the walk cycle (4 frames, faster while moving)
    pub fn animate(&mut self, dt: f32) {
        let moving = self.vel.x.abs() > 1.0;
        let frame_secs = if moving { 0.1 } else { 0.15 };
        self.anim_clock += dt;
        if self.anim_clock >= frame_secs {
            self.anim_clock -= frame_secs;
            self.anim_frame = if moving || self.state != BehaviorState::Idle {
                (self.anim_frame + 1) % 4
            } else {
                0
            };
        }
    }
}

/// A moving shot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    /// Center in world pixels
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    /// Seconds left before it expires
    pub lifetime: f32,
    pub owner: Side,
    pub damage: i32,
    pub alive: bool,
}

impl Projectile {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, owner: Side, damage: i32, lifetime: f32) -> Self {
        Self {
            id,
            pos,
            vel,
            size: Vec2::new(6.0, 4.0),
            lifetime,
            owner,
            damage,
            alive: true,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::centered(self.pos, self.size)
    }

    /// Move and burn lifetime; expired shots are flagged, not removed
    pub fn update(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.lifetime -= dt;
        if self.lifetime <= 0.0 {
            self.alive = false;
        }
    }
}

/// Collectible types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    /// Score
    Gem,
    /// Restores one hit point, or raises the shot level at full health
    Heart,
}

/// A collectible in the level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub kind: PickupKind,
    /// Top-left in world pixels
    pub pos: Vec2,
    pub size: Vec2,
    pub collected: bool,
}

impl Pickup {
    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size)
    }
}
