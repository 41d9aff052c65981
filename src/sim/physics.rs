//! Actor movement against the tile grid
//!
//! Resolution is axis-separated: move along x and push back out of any
//! blocking tile at the leading edge, then do the same along y. Contacts
//! come from the cells sampled during those two passes; a wall contact
//! means the x move was clamped this step.
//!
//! Tunneling is only prevented while the per-step displacement stays under
//! one tile; `max_fall_speed` and the dash/charge speeds are tuned so that
//! holds at the fixed timestep.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::actor::{Actor, Contacts};
use super::collision::{CollisionWorld, EDGE_EPSILON, TileType};
use crate::consts::*;
use crate::sign;

/// Movement and player-kit tuning for a title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    pub gravity: f32,
    pub max_fall_speed: f32,

    pub player_width: f32,
    pub player_height: f32,
    pub player_speed: f32,
    pub jump_speed: f32,
    pub player_max_hp: i32,
    /// Invincibility after the player takes a hit
    pub invincible_secs: f32,

    pub can_shoot: bool,
    pub shot_speed: f32,
    pub shot_lifetime: f32,
    pub shot_cooldown: f32,
    pub shot_damage: i32,

    pub dash_enabled: bool,
    pub dash_speed: f32,
    pub dash_secs: f32,
    pub dash_cooldown: f32,

    pub wall_jump_enabled: bool,
    pub wall_slide_speed: f32,
    pub wall_jump_push: f32,
    pub wall_jump_lock_secs: f32,

    pub hazard_damage: i32,
    /// Length of the Dying state for every actor
    pub dying_secs: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            max_fall_speed: MAX_FALL_SPEED,
            player_width: PLAYER_W,
            player_height: PLAYER_H,
            player_speed: PLAYER_SPEED,
            jump_speed: JUMP_SPEED,
            player_max_hp: PLAYER_MAX_HP,
            invincible_secs: INVINCIBLE_SECS,
            can_shoot: true,
            shot_speed: SHOT_SPEED,
            shot_lifetime: SHOT_LIFETIME,
            shot_cooldown: SHOT_COOLDOWN,
            shot_damage: 1,
            dash_enabled: false,
            dash_speed: DASH_SPEED,
            dash_secs: DASH_SECS,
            dash_cooldown: DASH_COOLDOWN,
            wall_jump_enabled: false,
            wall_slide_speed: WALL_SLIDE_SPEED,
            wall_jump_push: WALL_JUMP_PUSH,
            wall_jump_lock_secs: WALL_JUMP_LOCK_SECS,
            hazard_damage: HAZARD_DAMAGE,
            dying_secs: DYING_SECS,
        }
    }
}

/// Player controls for one step, already reduced from raw input
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerIntent {
    /// -1 left, 0 none, 1 right
    pub move_x: f32,
    /// Jump was just pressed
    pub jump: bool,
    /// Dash was just pressed
    pub dash: bool,
    /// Shoot was just pressed
    pub shoot: bool,
}

/// Impulses that fired in [`apply_player_intent`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Impulses {
    pub jumped: bool,
    pub wall_jumped: bool,
    pub dashed: bool,
}

/// Apply jump / dash / wall-cling and horizontal control before integration
///
/// Uses the contacts recorded by the previous step's resolution.
pub fn apply_player_intent(
    actor: &mut Actor,
    intent: &PlayerIntent,
    tuning: &PhysicsTuning,
) -> Impulses {
    let mut fired = Impulses::default();
    if actor.is_dying() {
        actor.vel.x = 0.0;
        return fired;
    }
    let contacts = actor.contacts;

    if intent.dash
        && tuning.dash_enabled
        && actor.timers.dash <= 0.0
        && actor.timers.dash_cooldown <= 0.0
    {
        let dir = if intent.move_x != 0.0 {
            sign(intent.move_x)
        } else {
            actor.facing
        };
        actor.facing = dir;
        actor.vel = Vec2::new(dir * tuning.dash_speed, 0.0);
        actor.timers.dash = tuning.dash_secs;
        actor.timers.dash_cooldown = tuning.dash_cooldown;
        fired.dashed = true;
    }

    // Dash owns the velocity for its whole window
    if actor.timers.dash > 0.0 {
        return fired;
    }

    if actor.timers.control_lock <= 0.0 {
        actor.vel.x = intent.move_x * tuning.player_speed;
        if intent.move_x != 0.0 {
            actor.facing = sign(intent.move_x);
        }
    }

    let on_wall = !contacts.grounded && (contacts.wall_left || contacts.wall_right);
    let clinging = tuning.wall_jump_enabled && on_wall && contacts.wall_toward(intent.move_x);
    if clinging {
        actor.vel.y = actor.vel.y.min(tuning.wall_slide_speed);
    }

    if intent.jump {
        if contacts.grounded {
            actor.vel.y = -tuning.jump_speed;
            fired.jumped = true;
        } else if tuning.wall_jump_enabled && on_wall {
            let away = if contacts.wall_left { 1.0 } else { -1.0 };
            actor.vel = Vec2::new(away * tuning.wall_jump_push, -tuning.jump_speed);
            actor.facing = away;
            actor.timers.control_lock = tuning.wall_jump_lock_secs;
            fired.jumped = true;
            fired.wall_jumped = true;
        }
    }

    fired
}

/// Apply gravity, then resolve movement against the world
///
/// `dt == 0` is a no-op: position, velocity and contacts stay as they were.
pub fn integrate(
    actor: &mut Actor,
    world: &CollisionWorld,
    tuning: &PhysicsTuning,
    dt: f32,
) -> Contacts {
    if dt <= 0.0 {
        return actor.contacts;
    }
    if actor.gravity_scale > 0.0 && actor.timers.dash <= 0.0 {
        actor.vel.y += tuning.gravity * actor.gravity_scale * dt;
        actor.vel.y = actor.vel.y.min(tuning.max_fall_speed);
    }
    resolve_move(actor, world, dt)
}

/// Move by `vel * dt`, one axis at a time, snapping out of blocking tiles
///
/// After the call the actor's box does not overlap a blocking tile, given it
/// started clear and moved less than one tile per axis.
pub fn resolve_move(actor: &mut Actor, world: &CollisionWorld, dt: f32) -> Contacts {
    let grid = world.grid;
    let ts = world.tile_size();
    let mut contacts = Contacts::default();

    // X axis: sample the leading column over every row the box spans
    let dx = actor.vel.x * dt;
    if dx != 0.0 {
        actor.pos.x += dx;
        let r = actor.rect();
        let col = if dx > 0.0 {
            grid.col_of(r.right() - EDGE_EPSILON)
        } else {
            grid.col_of(r.x)
        };
        let mut blocked = false;
        for row in grid.row_of(r.y)..=grid.row_of(r.bottom() - EDGE_EPSILON) {
            let tile = world.classify(col, row);
            blocked |= world.blocks(tile);
            contacts.hazard |= tile == TileType::Hazard;
        }
        if blocked {
            if dx > 0.0 {
                actor.pos.x = col as f32 * ts - actor.size.x;
                contacts.wall_right = true;
            } else {
                actor.pos.x = (col + 1) as f32 * ts;
                contacts.wall_left = true;
            }
            actor.vel.x = 0.0;
        }
    }

    // Y axis: sample the leading row over every column the box spans, plus
    // the row the feet end up in for hazards
    let prev_bottom = actor.pos.y + actor.size.y;
    actor.pos.y += actor.vel.y * dt;
    let r = actor.rect();
    let (col0, col1) = (grid.col_of(r.x), grid.col_of(r.right() - EDGE_EPSILON));
    if actor.vel.y >= 0.0 {
        // No inset here: a box resting exactly on a boundary samples the row below it
        let row = grid.row_of(r.bottom());
        let top = row as f32 * ts;
        let mut lands = false;
        for col in col0..=col1 {
            let tile = world.classify(col, row);
            lands |= world.blocks(tile)
                || (tile == TileType::Platform && prev_bottom <= top + EDGE_EPSILON);
            contacts.hazard |= tile == TileType::Hazard;
        }
        if lands {
            actor.pos.y = top - actor.size.y;
            actor.vel.y = 0.0;
            contacts.grounded = true;
        }
    } else {
        let row = grid.row_of(r.y);
        let mut blocked = false;
        for col in col0..=col1 {
            let tile = world.classify(col, row);
            blocked |= world.blocks(tile);
            contacts.hazard |= tile == TileType::Hazard;
        }
        if blocked {
            actor.pos.y = (row + 1) as f32 * ts;
            actor.vel.y = 0.0;
            contacts.ceiling = true;
        }
    }
    let feet_row = grid.row_of(actor.pos.y + actor.size.y - EDGE_EPSILON);
    for col in col0..=col1 {
        contacts.hazard |= world.classify(col, feet_row) == TileType::Hazard;
    }

    actor.contacts = contacts;
    contacts
}

/// Ground ahead of the actor's leading foot is missing
pub fn ledge_ahead(actor: &Actor, world: &CollisionWorld, dir: f32) -> bool {
    if dir == 0.0 {
        return false;
    }
    let r = actor.rect();
    let foot_x = if dir > 0.0 { r.right() + 2.0 } else { r.x - 2.0 };
    !world.is_ground(foot_x, r.bottom() + 2.0)
}
