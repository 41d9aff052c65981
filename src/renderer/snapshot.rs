//! Read-only views of the simulation for renderers and the HUD
//!
//! Snapshots are plain data (serde) so the wasm bridge can hand them to a
//! JavaScript renderer as JSON.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::TILE;
use crate::modes::ModeId;
use crate::sim::{
    Actor, ActorKind, BehaviorState, Level, PickupKind, Side, SimulationContext, TileType,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub id: u32,
    pub kind: ActorKind,
    /// Top-left in world pixels
    pub pos: Vec2,
    pub size: Vec2,
    pub facing: f32,
    pub state: BehaviorState,
    pub hp: i32,
    pub max_hp: i32,
    pub invincible: bool,
    pub hit_flash: bool,
    pub anim_frame: u32,
}

impl From<&Actor> for ActorSnapshot {
    fn from(a: &Actor) -> Self {
        Self {
            id: a.id,
            kind: a.kind,
            pos: a.pos,
            size: a.size,
            facing: a.facing,
            state: a.state,
            hp: a.hp,
            max_hp: a.max_hp,
            invincible: a.is_invincible(),
            hit_flash: a.timers.hit_flash > 0.0,
            anim_frame: a.anim_frame,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    /// Center in world pixels
    pub pos: Vec2,
    pub size: Vec2,
    pub owner: Side,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupSnapshot {
    pub kind: PickupKind,
    pub pos: Vec2,
    pub size: Vec2,
}

/// Tile grid and exit, sent once per level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub index: u32,
    pub cols: usize,
    pub rows: usize,
    pub tile_size: f32,
    /// Row-major
    pub tiles: Vec<TileType>,
    pub exit_cell: (i32, i32),
    pub exit_locked: bool,
}

impl From<&Level> for LevelSnapshot {
    fn from(level: &Level) -> Self {
        Self {
            index: level.index,
            cols: level.grid.cols(),
            rows: level.grid.rows(),
            tile_size: level.grid.tile_size(),
            tiles: level.grid.tiles().to_vec(),
            exit_cell: level.exit_cell,
            exit_locked: level.exit_locked,
        }
    }
}

/// Everything drawn in one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub mode: ModeId,
    /// Camera top-left; the viewport transform is `world - camera`
    pub camera: Vec2,
    pub viewport: Vec2,
    pub player: ActorSnapshot,
    /// On-screen enemies only
    pub enemies: Vec<ActorSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub pickups: Vec<PickupSnapshot>,
    pub score: u64,
    pub best_score: u64,
    pub shot_level: u32,
    pub level_index: u32,
    pub level_count: u32,
    pub exit_locked: bool,
    pub tick: u64,
}

impl FrameSnapshot {
    pub fn capture(sim: &SimulationContext, mode: ModeId, best_score: u64) -> Self {
        let cam = &sim.camera;
        // One tile of slack so sprites don't pop at the screen edge
        let on_screen = |r: crate::sim::Rect| cam.is_visible(&r.inflate(TILE));

        Self {
            mode,
            camera: cam.pos,
            viewport: cam.viewport,
            player: ActorSnapshot::from(&sim.player),
            enemies: sim
                .enemies
                .iter()
                .filter(|e| on_screen(e.rect()))
                .map(ActorSnapshot::from)
                .collect(),
            projectiles: sim
                .projectiles
                .iter()
                .filter(|p| p.alive && on_screen(p.rect()))
                .map(|p| ProjectileSnapshot {
                    pos: p.pos,
                    size: p.size,
                    owner: p.owner,
                })
                .collect(),
            pickups: sim
                .pickups
                .iter()
                .filter(|p| !p.collected && on_screen(p.rect()))
                .map(|p| PickupSnapshot {
                    kind: p.kind,
                    pos: p.pos,
                    size: p.size,
                })
                .collect(),
            score: sim.score,
            best_score: best_score.max(sim.score),
            shot_level: sim.shot_level,
            level_index: sim.level.index,
            level_count: sim.config.level_count,
            exit_locked: sim.level.exit_locked,
            tick: sim.time_ticks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::RunConfig;

    #[test]
    fn test_capture_culls_offscreen_enemies() {
        let sim = SimulationContext::new(RunConfig::default(), 11);
        let frame = FrameSnapshot::capture(&sim, ModeId::Playing, 0);
        assert_eq!(frame.player.id, sim.player.id);
        assert_eq!(frame.camera, sim.camera.pos);
        let view = sim.camera.view_rect().inflate(TILE);
        for e in &frame.enemies {
            let rect = crate::sim::Rect::from_pos_size(e.pos, e.size);
            assert!(view.overlaps(&rect));
        }
        assert!(frame.enemies.len() <= sim.enemies.len());
    }

    #[test]
    fn test_level_snapshot_serializes() {
        let sim = SimulationContext::new(RunConfig::default(), 11);
        let snap = LevelSnapshot::from(&sim.level);
        assert_eq!(snap.tiles.len(), snap.cols * snap.rows);
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"exit_cell\""));
    }
}
