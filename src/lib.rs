//! Tilecade - simulation core for tile-based arcade platformers
//!
//! Core modules:
//! - `sim`: Deterministic simulation (tiles, level generation, physics, enemy AI, camera)
//! - `clock`: Fixed-timestep accumulator
//! - `modes`: Game mode machine (menu/playing/paused/gameover/victory)
//! - `game`: Ties clock, modes and collaborators together, one call per rendered frame
//! - `renderer`, `audio`, `input`, `persistence`: collaborator interfaces
//! - `settings`: Data-driven per-title tuning

pub mod audio;
pub mod clock;
pub mod game;
pub mod input;
pub mod modes;
pub mod persistence;
pub mod renderer;
pub mod settings;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use game::Game;
pub use settings::{Difficulty, Settings};

use glam::Vec2;

/// Game configuration constants
///
/// These are the defaults; titles override them through [`Settings`].
pub mod consts {
    /// Tile edge length in world pixels
    pub const TILE: f32 = 16.0;

    /// Fixed simulation timestep (60 Hz)
    pub const FIXED_DT: f32 = 1.0 / 60.0;
    /// Largest real frame delta fed to the accumulator (spiral-of-death guard)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Maximum substeps per frame
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Viewport in world pixels
    pub const VIEW_W: f32 = 320.0;
    pub const VIEW_H: f32 = 240.0;

    /// Downward acceleration (pixels/s²)
    pub const GRAVITY: f32 = 600.0;
    /// Terminal fall speed; keeps per-step displacement under one tile
    pub const MAX_FALL_SPEED: f32 = 400.0;

    /// Player defaults
    pub const PLAYER_W: f32 = 12.0;
    pub const PLAYER_H: f32 = 14.0;
    pub const PLAYER_SPEED: f32 = 100.0;
    pub const JUMP_SPEED: f32 = 240.0;
    pub const PLAYER_MAX_HP: i32 = 5;
    pub const INVINCIBLE_SECS: f32 = 1.0;

    /// Player shots
    pub const SHOT_SPEED: f32 = 200.0;
    pub const SHOT_LIFETIME: f32 = 2.0;
    pub const SHOT_COOLDOWN: f32 = 0.2;

    /// Dash
    pub const DASH_SPEED: f32 = 350.0;
    pub const DASH_SECS: f32 = 0.2;
    pub const DASH_COOLDOWN: f32 = 1.0;

    /// Wall cling / wall jump
    pub const WALL_SLIDE_SPEED: f32 = 60.0;
    pub const WALL_JUMP_PUSH: f32 = 140.0;
    pub const WALL_JUMP_LOCK_SECS: f32 = 0.15;

    /// Damage dealt by standing in a hazard tile
    pub const HAZARD_DAMAGE: i32 = 2;
    /// Length of the Dying state before an actor is removed
    pub const DYING_SECS: f32 = 0.5;
    /// Hit flash on enemies
    pub const HIT_FLASH_SECS: f32 = 0.15;
    /// Horizontal input suppressed after contact knockback
    pub const HURT_LOCK_SECS: f32 = 0.2;

    /// Shot power raised by Hearts collected at full health
    pub const MAX_SHOT_LEVEL: u32 = 3;

    /// Scoring
    pub const GEM_SCORE: u64 = 50;
    pub const LEVEL_CLEAR_BONUS: u64 = 500;
}

/// Slack used when a timer is compared against zero
pub const TIMER_EPSILON: f32 = 1e-4;

/// Sign of `v` as -1, 0 or 1
#[inline]
pub fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Rotate a vector by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}
