//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod actor;
pub mod behavior;
pub mod camera;
pub mod collision;
pub mod geometry;
pub mod level;
pub mod physics;
pub mod state;
pub mod tick;

pub use actor::{
    Actor, ActorKind, BehaviorState, Contacts, DamageResult, Pickup, PickupKind, Projectile, Side,
};
pub use behavior::{
    Archetype, ArchetypeParams, ArchetypeTable, BehaviorEngine, Sensors, TargetInfo, transition,
};
pub use camera::{Camera, CameraTuning};
pub use collision::{CollisionRules, CollisionWorld, TileGrid, TileType};
pub use geometry::Rect;
pub use level::{Level, LevelDescriptor, LevelGenerator, SpawnDescriptor};
pub use physics::{PhysicsTuning, PlayerIntent};
pub use state::{GameEvent, RunConfig, SimulationContext};
pub use tick::{StepOutcome, TickInput, tick};
