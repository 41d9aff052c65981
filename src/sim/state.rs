//! Per-run simulation state
//!
//! A [`SimulationContext`] is built fresh for every run and passed by
//! reference through the step functions. Nothing in the simulation lives in
//! globals.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::actor::{Actor, Pickup, PickupKind, Projectile, Side};
use super::behavior::{Archetype, ArchetypeTable, TargetInfo};
use super::camera::{Camera, CameraTuning};
use super::collision::CollisionRules;
use super::level::{Level, LevelDescriptor, LevelGenerator, PICKUP_SIZE};
use super::physics::PhysicsTuning;
use crate::consts::*;

/// Everything a run needs to know about the title, after difficulty scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub physics: PhysicsTuning,
    pub collision: CollisionRules,
    pub generation: LevelDescriptor,
    pub archetypes: ArchetypeTable,
    pub camera: CameraTuning,
    pub viewport: Vec2,
    /// Levels in a run; clearing the last one wins
    pub level_count: u32,
    pub base_cols: usize,
    /// Extra columns per level index
    pub cols_per_level: usize,
    pub rows: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsTuning::default(),
            collision: CollisionRules::default(),
            generation: LevelDescriptor::default(),
            archetypes: ArchetypeTable::default(),
            camera: CameraTuning::default(),
            viewport: Vec2::new(VIEW_W, VIEW_H),
            level_count: 5,
            base_cols: 40,
            cols_per_level: 10,
            rows: 15,
        }
    }
}

impl RunConfig {
    /// Level width for an index
    pub fn cols_for(&self, level_index: u32) -> usize {
        self.base_cols + level_index as usize * self.cols_per_level
    }
}

/// Discrete things that happened during a step, for audio, HUD and storage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Jumped,
    Dashed,
    Shot { side: Side },
    PlayerHurt { hp: i32 },
    PlayerDied,
    EnemyHurt { id: u32 },
    EnemyKilled { id: u32, archetype: Archetype, score: u64 },
    PickupCollected { kind: PickupKind },
    ShotLevelUp { level: u32 },
    ExitOpened,
    LevelComplete { index: u32 },
    LevelStarted { index: u32 },
    Victory { score: u64 },
    NewBestScore { score: u64 },
}

/// State of one run
#[derive(Debug, Clone)]
pub struct SimulationContext {
    /// Run seed for reproducibility
    pub seed: u64,
    pub config: RunConfig,
    pub(crate) rng: Pcg32,
    pub level: Level,
    /// Persists across levels within the run
    pub player: Actor,
    /// Sorted by id
    pub enemies: Vec<Actor>,
    pub projectiles: Vec<Projectile>,
    pub pickups: Vec<Pickup>,
    pub camera: Camera,
    pub score: u64,
    /// Multiplier on player shot damage, 1 to `MAX_SHOT_LEVEL`
    pub shot_level: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Events since the owner last drained them
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl SimulationContext {
    /// Start a run at level 0
    pub fn new(config: RunConfig, seed: u64) -> Self {
        let level = LevelGenerator::new(config.generation.clone(), seed).generate(
            0,
            config.cols_for(0),
            config.rows,
        );
        Self::with_level(config, seed, level)
    }

    /// Start a run on a prebuilt level
    pub fn with_level(config: RunConfig, seed: u64, level: Level) -> Self {
        let player = Actor::player(1, level.player_spawn, &config.physics);
        let camera = Camera::new(config.viewport, level.grid.world_size(), &config.camera);
        let mut sim = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            config,
            level,
            player,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            pickups: Vec::new(),
            camera,
            score: 0,
            shot_level: 1,
            time_ticks: 0,
            events: Vec::new(),
            next_id: 2,
        };
        sim.populate();
        sim
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn level_index(&self) -> u32 {
        self.level.index
    }

    pub fn is_last_level(&self) -> bool {
        self.level.index + 1 >= self.config.level_count
    }

    /// Generate and enter the next level. Returns false after the last one.
    pub fn advance_level(&mut self) -> bool {
        if self.is_last_level() {
            return false;
        }
        let index = self.level.index + 1;
        self.level = LevelGenerator::new(self.config.generation.clone(), self.seed).generate(
            index,
            self.config.cols_for(index),
            self.config.rows,
        );
        self.populate();
        true
    }

    /// Spawn the level's enemies and pickups and put the player at the start
    fn populate(&mut self) {
        self.enemies.clear();
        self.projectiles.clear();
        self.pickups.clear();

        for spawn in self.level.spawns.clone() {
            let id = self.next_entity_id();
            let params = self.config.archetypes.get(spawn.archetype);
            self.enemies.push(Actor::enemy(id, spawn.archetype, spawn.feet, params));
        }
        for spawn in self.level.pickups.clone() {
            let id = self.next_entity_id();
            self.pickups.push(Pickup {
                id,
                kind: spawn.kind,
                pos: spawn.pos,
                size: Vec2::splat(PICKUP_SIZE),
                collected: false,
            });
        }

        let p = &mut self.player;
        p.place_feet(self.level.player_spawn);
        p.vel = Vec2::ZERO;
        p.contacts = Default::default();
        p.timers = Default::default();
        p.facing = 1.0;

        self.camera = Camera::new(
            self.config.viewport,
            self.level.grid.world_size(),
            &self.config.camera,
        );
        self.camera.center_on(self.player.center());
        self.events.push(GameEvent::LevelStarted {
            index: self.level.index,
        });
    }

    /// What enemies see of the player
    pub fn target_info(&self) -> TargetInfo {
        TargetInfo {
            center: self.player.center(),
            facing: self.player.facing,
            alive: !self.player.is_dying(),
        }
    }

    /// Take the events recorded since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_places_player_on_spawn() {
        let sim = SimulationContext::new(RunConfig::default(), 12345);
        assert_eq!(sim.level_index(), 0);
        assert_eq!(sim.player.feet(), sim.level.player_spawn);
        assert_eq!(sim.enemies.len(), sim.level.spawns.len());
        assert_eq!(sim.pickups.len(), sim.level.pickups.len());
        assert_eq!(sim.level.grid.cols(), 40);
        assert_eq!(sim.shot_level, 1);
    }

    #[test]
    fn test_ids_unique_and_increasing() {
        let mut sim = SimulationContext::new(RunConfig::default(), 7);
        let mut ids: Vec<u32> = sim.enemies.iter().map(|e| e.id).collect();
        ids.extend(sim.pickups.iter().map(|p| p.id));
        ids.push(sim.player.id);
        let before = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), before);

        let a = sim.next_entity_id();
        let b = sim.next_entity_id();
        assert!(b > a);
        assert!(ids.iter().all(|&id| id < a));
    }

    #[test]
    fn test_player_persists_across_levels() {
        let config = RunConfig {
            level_count: 2,
            ..Default::default()
        };
        let mut sim = SimulationContext::new(config, 99);
        sim.player.hp = 2;
        sim.score = 1234;
        sim.shot_level = 2;

        assert!(sim.advance_level());
        assert_eq!(sim.level_index(), 1);
        assert_eq!(sim.level.grid.cols(), 50);
        assert_eq!(sim.player.hp, 2);
        assert_eq!(sim.score, 1234);
        assert_eq!(sim.shot_level, 2);
        assert_eq!(sim.player.feet(), sim.level.player_spawn);

        assert!(sim.is_last_level());
        assert!(!sim.advance_level());
    }
}
