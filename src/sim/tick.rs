//! Fixed timestep simulation tick
//!
//! One call advances the playing state by one step in a fixed order:
//! player input and movement, enemy behavior and movement, projectiles,
//! pairwise collisions, pruning, camera. Entities that die or get used up
//! during the step are collected in a removal set and filtered out at the
//! end, so no pass sees a half-pruned collection.

use std::collections::HashSet;

use glam::Vec2;

use super::actor::{DamageResult, PickupKind, Projectile, Side};
use super::behavior::BehaviorEngine;
use super::collision::CollisionWorld;
use super::physics::{self, PlayerIntent};
use super::state::{GameEvent, SimulationContext};
use crate::consts::*;
use crate::{TIMER_EPSILON, sign};

/// Knockback applied to the player when an enemy touches it
const KNOCKBACK: Vec2 = Vec2::new(120.0, -150.0);

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    pub intent: PlayerIntent,
}

/// What the playing mode should do after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    /// Player reached an open exit
    LevelComplete,
    /// Player's dying timer ran out
    PlayerDead,
}

/// Advance the run by one fixed timestep
pub fn tick(sim: &mut SimulationContext, input: &TickInput, dt: f32) -> StepOutcome {
    sim.time_ticks += 1;

    update_player(sim, &input.intent, dt);
    update_enemies(sim, dt);
    for shot in sim.projectiles.iter_mut() {
        shot.update(dt);
    }

    let mut doomed = HashSet::new();
    player_vs_enemies(sim);
    player_vs_hazards(sim);
    projectiles_vs_actors(sim, &mut doomed);
    projectiles_vs_tiles(sim, &mut doomed);
    collect_pickups(sim, &mut doomed);
    prune(sim, &mut doomed);

    if sim.level.exit_locked && sim.enemies.is_empty() && sim.level.open_exit() {
        log::debug!("Level {} cleared, exit open", sim.level.index);
        sim.events.push(GameEvent::ExitOpened);
    }

    sim.camera.follow(sim.player.center(), dt);

    if sim.player.finished_dying(sim.config.physics.dying_secs) {
        return StepOutcome::PlayerDead;
    }
    let at_exit = !sim.level.exit_locked
        && !sim.player.is_dying()
        && sim.player.rect().overlaps(&sim.level.exit_rect());
    if at_exit {
        sim.score += LEVEL_CLEAR_BONUS;
        sim.events.push(GameEvent::LevelComplete {
            index: sim.level.index,
        });
        log::info!(
            "Level {} complete at tick {}, score {}",
            sim.level.index,
            sim.time_ticks,
            sim.score
        );
        return StepOutcome::LevelComplete;
    }
    StepOutcome::Continue
}

fn update_player(sim: &mut SimulationContext, intent: &PlayerIntent, dt: f32) {
    let tuning = &sim.config.physics;
    let world = CollisionWorld::new(&sim.level.grid, sim.config.collision);
    let player = &mut sim.player;

    player.tick_timers(dt);
    let fired = physics::apply_player_intent(player, intent, tuning);
    if fired.jumped {
        sim.events.push(GameEvent::Jumped);
    }
    if fired.dashed {
        sim.events.push(GameEvent::Dashed);
    }

    let wants_shot = intent.shoot
        && tuning.can_shoot
        && !player.is_dying()
        && player.timers.shot_cooldown <= TIMER_EPSILON;
    let shot = wants_shot.then(|| {
        player.timers.shot_cooldown = tuning.shot_cooldown;
        let muzzle = player.center() + Vec2::new(player.facing * player.size.x / 2.0, 0.0);
        (muzzle, Vec2::new(player.facing * tuning.shot_speed, 0.0))
    });

    physics::integrate(player, &world, tuning, dt);
    player.animate(dt);

    if let Some((pos, vel)) = shot {
        let damage = tuning.shot_damage * sim.shot_level as i32;
        let lifetime = tuning.shot_lifetime;
        let id = sim.next_entity_id();
        sim.projectiles
            .push(Projectile::new(id, pos, vel, Side::Player, damage, lifetime));
        sim.events.push(GameEvent::Shot { side: Side::Player });
    }
}

fn update_enemies(sim: &mut SimulationContext, dt: f32) {
    let target = sim.target_info();
    let mut shots = Vec::new();
    {
        let world = CollisionWorld::new(&sim.level.grid, sim.config.collision);
        let engine = BehaviorEngine::new(world, &sim.config.physics, &sim.config.archetypes);
        for enemy in sim.enemies.iter_mut() {
            engine.update(enemy, &target, &mut sim.rng, dt, &mut shots);
        }
    }

    // Spawned after the loop so this step's enemy pass never sees them
    for shot in shots {
        let id = sim.next_entity_id();
        sim.projectiles.push(Projectile::new(
            id,
            shot.pos,
            shot.vel,
            Side::Enemy,
            shot.damage,
            shot.lifetime,
        ));
        sim.events.push(GameEvent::Shot { side: Side::Enemy });
    }
}

/// Hurt the player, recording the outcome
fn hurt_player(sim: &mut SimulationContext, amount: i32, from_x: Option<f32>) {
    let invincible_secs = sim.config.physics.invincible_secs;
    match sim.player.take_damage(amount, invincible_secs) {
        DamageResult::Hurt => {
            if let Some(x) = from_x {
                let away = sign(sim.player.center().x - x);
                let away = if away == 0.0 { -sim.player.facing } else { away };
                sim.player.vel = Vec2::new(away * KNOCKBACK.x, KNOCKBACK.y);
                sim.player.timers.control_lock = HURT_LOCK_SECS;
            }
            sim.events.push(GameEvent::PlayerHurt { hp: sim.player.hp });
        }
        DamageResult::Killed => {
            log::info!("Player died on level {} (score {})", sim.level.index, sim.score);
            sim.events.push(GameEvent::PlayerDied);
        }
        DamageResult::Ignored => {}
    }
}

fn player_vs_enemies(sim: &mut SimulationContext) {
    if sim.player.is_dying() {
        return;
    }
    let player_rect = sim.player.rect();
    let hit = sim
        .enemies
        .iter()
        .filter(|e| !e.is_dying() && e.rect().overlaps(&player_rect))
        .find_map(|e| {
            let archetype = e.archetype()?;
            Some((sim.config.archetypes.get(archetype).contact_damage, e.center().x))
        });
    if let Some((damage, x)) = hit {
        hurt_player(sim, damage, Some(x));
    }
}

fn player_vs_hazards(sim: &mut SimulationContext) {
    if sim.player.contacts.hazard && !sim.player.is_dying() {
        let damage = sim.config.physics.hazard_damage;
        hurt_player(sim, damage, None);
    }
}

fn projectiles_vs_actors(sim: &mut SimulationContext, doomed: &mut HashSet<u32>) {
    let mut player_hits = Vec::new();
    for shot in sim.projectiles.iter_mut().filter(|p| p.alive) {
        let rect = shot.rect();
        match shot.owner {
            Side::Player => {
                let Some(enemy) = sim
                    .enemies
                    .iter_mut()
                    .find(|e| !e.is_dying() && e.rect().overlaps(&rect))
                else {
                    continue;
                };
                shot.alive = false;
                doomed.insert(shot.id);
                match enemy.take_damage(shot.damage, 0.0) {
                    DamageResult::Killed => {
                        let Some(archetype) = enemy.archetype() else {
                            continue;
                        };
                        let score = sim.config.archetypes.get(archetype).score;
                        sim.score += score;
                        log::debug!("Enemy {} ({}) killed", enemy.id, archetype.as_str());
                        sim.events.push(GameEvent::EnemyKilled {
                            id: enemy.id,
                            archetype,
                            score,
                        });
                    }
                    DamageResult::Hurt => sim.events.push(GameEvent::EnemyHurt { id: enemy.id }),
                    DamageResult::Ignored => {}
                }
            }
            Side::Enemy => {
                if !sim.player.is_dying() && sim.player.rect().overlaps(&rect) {
                    shot.alive = false;
                    doomed.insert(shot.id);
                    player_hits.push((shot.damage, shot.pos.x));
                }
            }
        }
    }
    for (damage, x) in player_hits {
        hurt_player(sim, damage, Some(x));
    }
}

fn projectiles_vs_tiles(sim: &mut SimulationContext, doomed: &mut HashSet<u32>) {
    let world = CollisionWorld::new(&sim.level.grid, sim.config.collision);
    for shot in sim.projectiles.iter_mut() {
        if !shot.alive || world.overlaps_solid(&shot.rect()) {
            shot.alive = false;
            doomed.insert(shot.id);
        }
    }
}

fn collect_pickups(sim: &mut SimulationContext, doomed: &mut HashSet<u32>) {
    if sim.player.is_dying() {
        return;
    }
    let player_rect = sim.player.rect();
    for pickup in sim.pickups.iter_mut() {
        if pickup.collected || !pickup.rect().overlaps(&player_rect) {
            continue;
        }
        pickup.collected = true;
        doomed.insert(pickup.id);
        let event = match pickup.kind {
            PickupKind::Gem => {
                sim.score += GEM_SCORE;
                GameEvent::PickupCollected { kind: pickup.kind }
            }
            PickupKind::Heart if sim.player.hp < sim.player.max_hp => {
                sim.player.heal(1);
                GameEvent::PickupCollected { kind: pickup.kind }
            }
            PickupKind::Heart if sim.shot_level < MAX_SHOT_LEVEL => {
                sim.shot_level += 1;
                log::debug!("Shot level {}", sim.shot_level);
                GameEvent::ShotLevelUp {
                    level: sim.shot_level,
                }
            }
            PickupKind::Heart => GameEvent::PickupCollected { kind: pickup.kind },
        };
        sim.events.push(event);
    }
}

/// Drop everything marked this step plus enemies whose dying timer ran out
fn prune(sim: &mut SimulationContext, doomed: &mut HashSet<u32>) {
    let dying_secs = sim.config.physics.dying_secs;
    doomed.extend(
        sim.enemies
            .iter()
            .filter(|e| e.finished_dying(dying_secs))
            .map(|e| e.id),
    );
    if doomed.is_empty() {
        return;
    }
    sim.enemies.retain(|e| !doomed.contains(&e.id));
    sim.projectiles.retain(|p| !doomed.contains(&p.id));
    sim.pickups.retain(|p| !doomed.contains(&p.id));
}
