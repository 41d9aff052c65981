//! Enemy behavior state machines
//!
//! Every archetype runs over the shared [`BehaviorState`] set with its own
//! transition table. Transitions are a pure function of the current state,
//! time spent in it, distance to the target and the tile sensors
//! ([`transition`]); everything with side effects (picking a flank point,
//! firing, moving) happens in [`BehaviorEngine`] after the transition is
//! decided.
//!
//! A combination with no explicit rule leaves the enemy in its current
//! state. `Dying` never transitions.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::actor::{Actor, BehaviorState};
use super::collision::CollisionWorld;
use super::physics::{self, PhysicsTuning};
use crate::{TIMER_EPSILON, rotate, sign};

/// Enemy behavior/stat template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// Walks back and forth, chases when the target comes close
    Patroller,
    /// Keeps moving to a point behind the target
    Flanker,
    /// Winds up, then rushes the target's last known position
    Charger,
    /// Holds position and fires at the target on a cooldown
    Shooter,
}

impl Archetype {
    pub const ALL: [Archetype; 4] = [
        Archetype::Patroller,
        Archetype::Flanker,
        Archetype::Charger,
        Archetype::Shooter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Archetype::Patroller => "patroller",
            Archetype::Flanker => "flanker",
            Archetype::Charger => "charger",
            Archetype::Shooter => "shooter",
        }
    }

    /// State a freshly spawned enemy starts in
    pub fn initial_state(&self) -> BehaviorState {
        match self {
            Archetype::Patroller | Archetype::Charger => BehaviorState::Patrol,
            Archetype::Flanker | Archetype::Shooter => BehaviorState::Idle,
        }
    }

    /// States this archetype can be in
    pub fn states(&self) -> &'static [BehaviorState] {
        use BehaviorState::*;
        match self {
            Archetype::Patroller => &[Idle, Patrol, Chase, Dying],
            Archetype::Flanker => &[Idle, Flank, Dying],
            Archetype::Charger => &[Idle, Patrol, Charge, Stunned, Dying],
            Archetype::Shooter => &[Idle, Patrol, Shoot, Dying],
        }
    }
}

/// Stats and timings for one archetype
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeParams {
    pub width: f32,
    pub height: f32,
    pub hp: i32,
    /// 0 hovers and moves in 2D
    pub gravity_scale: f32,
    /// Patrol speed
    pub speed: f32,
    pub chase_speed: f32,
    /// Distance at which the enemy turns active
    pub aggro_radius: f32,
    /// Active states give up beyond `aggro_radius * leash_factor`
    pub leash_factor: f32,
    /// Half-width of the patrol range around the spawn x
    pub patrol_range: f32,
    pub idle_secs: f32,
    pub patrol_secs: f32,

    /// Wind-up time inside aggro range before a charge
    pub charge_dwell_secs: f32,
    pub charge_speed: f32,
    pub charge_secs: f32,
    pub stun_secs: f32,

    /// Shooter never patrols
    pub stationary: bool,
    pub shoot_range: f32,
    pub shoot_cooldown: f32,
    pub projectile_speed: f32,
    pub projectile_damage: i32,
    pub projectile_lifetime: f32,
    /// Shots per volley
    pub spread_count: u32,
    /// Angle between neighboring shots in a volley (radians)
    pub spread_angle: f32,

    /// How far behind the target a flanker aims
    pub flank_distance: f32,
    /// Random offset added to the flank point
    pub flank_jitter: f32,
    pub flank_retarget_secs: f32,
    /// Flank point counts as reached within this distance
    pub flank_reach: f32,

    pub contact_damage: i32,
    pub score: u64,
}

impl Default for ArchetypeParams {
    fn default() -> Self {
        Self {
            width: 12.0,
            height: 12.0,
            hp: 1,
            gravity_scale: 1.0,
            speed: 30.0,
            chase_speed: 45.0,
            aggro_radius: 96.0,
            leash_factor: 1.5,
            patrol_range: 80.0,
            idle_secs: 1.0,
            patrol_secs: 3.0,
            charge_dwell_secs: 0.8,
            charge_speed: 150.0,
            charge_secs: 1.2,
            stun_secs: 1.0,
            stationary: false,
            shoot_range: 160.0,
            shoot_cooldown: 2.0,
            projectile_speed: 120.0,
            projectile_damage: 1,
            projectile_lifetime: 3.0,
            spread_count: 1,
            spread_angle: 0.2,
            flank_distance: 48.0,
            flank_jitter: 20.0,
            flank_retarget_secs: 2.0,
            flank_reach: 4.0,
            contact_damage: 1,
            score: 100,
        }
    }
}

impl ArchetypeParams {
    /// Stock tuning for an archetype
    pub fn for_archetype(archetype: Archetype) -> Self {
        let base = Self::default();
        match archetype {
            Archetype::Patroller => base,
            Archetype::Flanker => Self {
                hp: 2,
                gravity_scale: 0.0,
                speed: 35.0,
                chase_speed: 35.0,
                aggro_radius: 140.0,
                score: 150,
                ..base
            },
            Archetype::Charger => Self {
                width: 14.0,
                height: 16.0,
                hp: 3,
                speed: 20.0,
                aggro_radius: 130.0,
                contact_damage: 2,
                score: 200,
                ..base
            },
            Archetype::Shooter => Self {
                height: 14.0,
                hp: 2,
                speed: 20.0,
                score: 150,
                ..base
            },
        }
    }
}

/// Params for every archetype of a title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeTable {
    pub patroller: ArchetypeParams,
    pub flanker: ArchetypeParams,
    pub charger: ArchetypeParams,
    pub shooter: ArchetypeParams,
}

impl Default for ArchetypeTable {
    fn default() -> Self {
        Self {
            patroller: ArchetypeParams::for_archetype(Archetype::Patroller),
            flanker: ArchetypeParams::for_archetype(Archetype::Flanker),
            charger: ArchetypeParams::for_archetype(Archetype::Charger),
            shooter: ArchetypeParams::for_archetype(Archetype::Shooter),
        }
    }
}

impl ArchetypeTable {
    pub fn get(&self, archetype: Archetype) -> &ArchetypeParams {
        match archetype {
            Archetype::Patroller => &self.patroller,
            Archetype::Flanker => &self.flanker,
            Archetype::Charger => &self.charger,
            Archetype::Shooter => &self.shooter,
        }
    }

    pub fn get_mut(&mut self, archetype: Archetype) -> &mut ArchetypeParams {
        match archetype {
            Archetype::Patroller => &mut self.patroller,
            Archetype::Flanker => &mut self.flanker,
            Archetype::Charger => &mut self.charger,
            Archetype::Shooter => &mut self.shooter,
        }
    }
}

/// What an enemy knows about the actor it hunts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetInfo {
    pub center: Vec2,
    pub facing: f32,
    /// False once the target is dying; enemies then treat it as out of range
    pub alive: bool,
}

/// Inputs to [`transition`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sensors {
    /// Center-to-center distance to the target (infinite when there is none)
    pub distance: f32,
    pub grounded: bool,
    /// Blocked by a wall in the heading direction during the last step
    pub wall_ahead: bool,
    /// No ground under the leading foot
    pub ledge_ahead: bool,
    /// Past the patrol range in the heading direction
    pub at_patrol_bound: bool,
    /// Within reach of the current flank point
    pub reached_point: bool,
}

/// Pure transition table
///
/// `None` means stay; `Some(s)` means enter `s` (re-entering the current
/// state restarts its clock, used by flankers to re-pick their point).
pub fn transition(
    archetype: Archetype,
    params: &ArchetypeParams,
    state: BehaviorState,
    state_time: f32,
    sensors: &Sensors,
) -> Option<BehaviorState> {
    use BehaviorState::*;

    if state == Dying {
        return None;
    }
    if !archetype.states().contains(&state) {
        return Some(archetype.initial_state());
    }

    let d = sensors.distance;
    let in_aggro = d < params.aggro_radius;
    let leashed = d >= params.aggro_radius * params.leash_factor;
    let elapsed = |secs: f32| state_time >= secs - TIMER_EPSILON;

    match (archetype, state) {
        (Archetype::Patroller, Idle) if in_aggro => Some(Chase),
        (Archetype::Patroller, Idle) if elapsed(params.idle_secs) => Some(Patrol),
        (Archetype::Patroller, Patrol) if in_aggro => Some(Chase),
        (Archetype::Patroller, Patrol) if elapsed(params.patrol_secs) => Some(Idle),
        (Archetype::Patroller, Chase) if leashed => Some(Patrol),

        (Archetype::Flanker, Idle) if in_aggro => Some(Flank),
        (Archetype::Flanker, Flank) if leashed => Some(Idle),
        (Archetype::Flanker, Flank)
            if sensors.reached_point || elapsed(params.flank_retarget_secs) =>
        {
            Some(Flank)
        }

        (Archetype::Charger, Patrol) if in_aggro => Some(Idle),
        (Archetype::Charger, Idle) if !in_aggro => Some(Patrol),
        (Archetype::Charger, Idle) if elapsed(params.charge_dwell_secs) => Some(Charge),
        (Archetype::Charger, Charge) if sensors.wall_ahead || elapsed(params.charge_secs) => {
            Some(Stunned)
        }
        (Archetype::Charger, Stunned) if elapsed(params.stun_secs) => Some(Patrol),

        (Archetype::Shooter, Idle | Patrol) if d < params.shoot_range => Some(Shoot),
        (Archetype::Shooter, Idle) if !params.stationary && elapsed(params.idle_secs) => {
            Some(Patrol)
        }
        (Archetype::Shooter, Patrol) if params.stationary || elapsed(params.patrol_secs) => {
            Some(Idle)
        }
        (Archetype::Shooter, Shoot) if d >= params.shoot_range * params.leash_factor => Some(Idle),

        _ => None,
    }
}

/// A projectile an enemy wants spawned this step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotRequest {
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: i32,
    pub lifetime: f32,
}

/// Runs sensing, transitions, actions and physics for enemies
pub struct BehaviorEngine<'a> {
    pub world: CollisionWorld<'a>,
    pub tuning: &'a PhysicsTuning,
    pub table: &'a ArchetypeTable,
}

impl<'a> BehaviorEngine<'a> {
    pub fn new(
        world: CollisionWorld<'a>,
        tuning: &'a PhysicsTuning,
        table: &'a ArchetypeTable,
    ) -> Self {
        Self {
            world,
            tuning,
            table,
        }
    }

    /// Advance one enemy by one step. Returns the state entered, if any.
    pub fn update<R: Rng>(
        &self,
        enemy: &mut Actor,
        target: &TargetInfo,
        rng: &mut R,
        dt: f32,
        shots: &mut Vec<ShotRequest>,
    ) -> Option<BehaviorState> {
        let Some(archetype) = enemy.archetype() else {
            return None;
        };
        let params = self.table.get(archetype);

        enemy.tick_timers(dt);

        let entered = if enemy.is_dying() {
            None
        } else {
            let sensors = self.sense(enemy, params, target);
            let next = transition(archetype, params, enemy.state, enemy.state_time, &sensors);
            if let Some(state) = next {
                if state != enemy.state {
                    log::trace!(
                        "enemy {} ({}) {} -> {}",
                        enemy.id,
                        archetype.as_str(),
                        enemy.state.as_str(),
                        state.as_str()
                    );
                }
                self.enter(enemy, state, params, target, rng);
            }
            self.act(enemy, params, target, &sensors, shots);
            next
        };

        if enemy.is_dying() {
            halt(enemy);
        }
        physics::integrate(enemy, &self.world, self.tuning, dt);
        enemy.animate(dt);
        entered
    }

    /// Read the tile sensors and target distance
    pub fn sense(&self, enemy: &Actor, params: &ArchetypeParams, target: &TargetInfo) -> Sensors {
        let distance = if target.alive {
            enemy.center().distance(target.center)
        } else {
            f32::INFINITY
        };
        let dir = enemy.patrol_dir;
        let walker = enemy.gravity_scale > 0.0;
        let reached_point = enemy
            .target_point
            .map(|p| reach_distance(enemy, p) <= params.flank_reach)
            .unwrap_or(true);

        Sensors {
            distance,
            grounded: enemy.contacts.grounded,
            wall_ahead: enemy.contacts.wall_toward(dir),
            ledge_ahead: walker
                && enemy.contacts.grounded
                && physics::ledge_ahead(enemy, &self.world, dir),
            at_patrol_bound: (dir > 0.0 && enemy.pos.x >= enemy.home_x + params.patrol_range)
                || (dir < 0.0 && enemy.pos.x <= enemy.home_x - params.patrol_range),
            reached_point,
        }
    }

    /// On-enter effects for a state
    fn enter<R: Rng>(
        &self,
        enemy: &mut Actor,
        state: BehaviorState,
        params: &ArchetypeParams,
        target: &TargetInfo,
        rng: &mut R,
    ) {
        enemy.enter_state(state);
        enemy.target_point = None;
        match state {
            BehaviorState::Flank => {
                let jitter = params.flank_jitter;
                let behind = Vec2::new(target.facing * params.flank_distance, 0.0);
                let mut point = target.center - behind;
                if jitter > 0.0 {
                    point.x += rng.random_range(-jitter..=jitter);
                    if enemy.gravity_scale == 0.0 {
                        point.y += rng.random_range(-jitter..=jitter);
                    }
                }
                // Keep the point inside the border ring
                let ts = self.world.tile_size();
                let max = self.world.grid.world_size() - Vec2::splat(ts);
                enemy.target_point = Some(point.clamp(Vec2::splat(ts), max.max(Vec2::splat(ts))));
            }
            BehaviorState::Charge => {
                let dir = sign(target.center.x - enemy.center().x);
                enemy.patrol_dir = if dir == 0.0 { enemy.facing } else { dir };
                enemy.facing = enemy.patrol_dir;
                enemy.target_point = Some(target.center);
            }
            _ => {}
        }
    }

    /// Set velocity (and fire) for the current state
    fn act(
        &self,
        enemy: &mut Actor,
        params: &ArchetypeParams,
        target: &TargetInfo,
        sensors: &Sensors,
        shots: &mut Vec<ShotRequest>,
    ) {
        let walker = enemy.gravity_scale > 0.0;
        match enemy.state {
            BehaviorState::Patrol => {
                if sensors.at_patrol_bound || sensors.wall_ahead || sensors.ledge_ahead {
                    enemy.patrol_dir = -enemy.patrol_dir;
                }
                enemy.vel.x = enemy.patrol_dir * params.speed;
                if !walker {
                    enemy.vel.y = 0.0;
                }
                enemy.facing = enemy.patrol_dir;
            }
            BehaviorState::Chase => self.move_toward(enemy, target.center, params.chase_speed),
            BehaviorState::Flank => match enemy.target_point {
                Some(point) if reach_distance(enemy, point) > params.flank_reach => {
                    self.move_toward(enemy, point, params.speed)
                }
                _ => halt(enemy),
            },
            BehaviorState::Charge => {
                if walker {
                    enemy.vel.x = enemy.patrol_dir * params.charge_speed;
                } else if let Some(point) = enemy.target_point {
                    let dir = (point - enemy.center())
                        .try_normalize()
                        .unwrap_or(Vec2::X * enemy.patrol_dir);
                    enemy.vel = dir * params.charge_speed;
                }
            }
            BehaviorState::Shoot => {
                halt(enemy);
                let dx = target.center.x - enemy.center().x;
                if dx != 0.0 {
                    enemy.facing = sign(dx);
                }
                if enemy.timers.shot_cooldown <= TIMER_EPSILON {
                    enemy.timers.shot_cooldown = params.shoot_cooldown;
                    fire_volley(enemy, params, target.center, shots);
                }
            }
            BehaviorState::Idle | BehaviorState::Stunned | BehaviorState::Dying => halt(enemy),
        }
    }

    /// Head toward `point`; walkers stay on their platform
    fn move_toward(&self, enemy: &mut Actor, point: Vec2, speed: f32) {
        let delta = point - enemy.center();
        if enemy.gravity_scale == 0.0 {
            enemy.vel = delta.try_normalize().map(|d| d * speed).unwrap_or(Vec2::ZERO);
            if delta.x != 0.0 {
                enemy.facing = sign(delta.x);
            }
            return;
        }

        let dir = sign(delta.x);
        if dir == 0.0 || delta.x.abs() < 1.0 {
            enemy.vel.x = 0.0;
            return;
        }
        enemy.facing = dir;
        let blocked = enemy.contacts.wall_toward(dir)
            || (enemy.contacts.grounded && physics::ledge_ahead(enemy, &self.world, dir));
        enemy.vel.x = if blocked { 0.0 } else { dir * speed };
    }
}

/// Distance used for "reached the flank point": horizontal only for walkers
fn reach_distance(enemy: &Actor, point: Vec2) -> f32 {
    if enemy.gravity_scale > 0.0 {
        (point.x - enemy.center().x).abs()
    } else {
        enemy.center().distance(point)
    }
}

fn halt(enemy: &mut Actor) {
    enemy.vel.x = 0.0;
    if enemy.gravity_scale == 0.0 {
        enemy.vel.y = 0.0;
    }
}

/// Spawn a volley aimed at `aim_at`, fanned out by `spread_angle`
fn fire_volley(
    enemy: &Actor,
    params: &ArchetypeParams,
    aim_at: Vec2,
    shots: &mut Vec<ShotRequest>,
) {
    let origin = enemy.center();
    let aim = (aim_at - origin)
        .try_normalize()
        .unwrap_or(Vec2::new(enemy.facing, 0.0));
    let count = params.spread_count.max(1);
    let mid = (count - 1) as f32 / 2.0;
    for i in 0..count {
        let dir = rotate(aim, (i as f32 - mid) * params.spread_angle);
        shots.push(ShotRequest {
            pos: origin,
            vel: dir * params.projectile_speed,
            damage: params.projectile_damage,
            lifetime: params.projectile_lifetime,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{FIXED_DT, TILE};
    use crate::sim::collision::{CollisionRules, TileGrid};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    /// 40 x 12 room with a solid floor at row 10
    fn arena() -> TileGrid {
        let mut rows = vec!["#".repeat(40)];
        for _ in 1..10 {
            rows.push(format!("#{}#", ".".repeat(38)));
        }
        rows.push("#".repeat(40));
        rows.push("#".repeat(40));
        let refs: Vec<&str> = rows.iter().map(|s| s.as_str()).collect();
        TileGrid::from_ascii(&refs, TILE)
    }

    fn far_target() -> TargetInfo {
        TargetInfo {
            center: Vec2::new(10_000.0, 10_000.0),
            facing: 1.0,
            alive: true,
        }
    }

    fn spawn(archetype: Archetype, table: &ArchetypeTable, x: f32) -> Actor {
        let mut e = Actor::enemy(7, archetype, Vec2::new(x, 10.0 * TILE), table.get(archetype));
        e.contacts.grounded = true;
        e
    }

    #[test]
    fn test_transition_totality() {
        let table = ArchetypeTable::default();
        for archetype in Archetype::ALL {
            let params = table.get(archetype);
            let distances = [
                0.0,
                params.aggro_radius * 0.5,
                params.aggro_radius * 1.2,
                params.shoot_range * 1.2,
                params.aggro_radius * 10.0,
                f32::INFINITY,
            ];
            for &state in BehaviorState::ALL.iter() {
                for distance in distances {
                    for state_time in [0.0, 100.0] {
                        for flags in 0..32u8 {
                            let sensors = Sensors {
                                distance,
                                grounded: flags & 1 != 0,
                                wall_ahead: flags & 2 != 0,
                                ledge_ahead: flags & 4 != 0,
                                at_patrol_bound: flags & 8 != 0,
                                reached_point: flags & 16 != 0,
                            };
                            let next = transition(archetype, params, state, state_time, &sensors);
                            if let Some(next) = next {
                                assert!(
                                    archetype.states().contains(&next),
                                    "{:?} {:?} -> {:?}",
                                    archetype,
                                    state,
                                    next
                                );
                            }
                            if state == BehaviorState::Dying {
                                assert_eq!(next, None);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_patroller_chases_and_gives_up() {
        let p = ArchetypeParams::for_archetype(Archetype::Patroller);
        let near = Sensors {
            distance: p.aggro_radius - 1.0,
            ..Default::default()
        };
        let far = Sensors {
            distance: p.aggro_radius * p.leash_factor + 1.0,
            ..Default::default()
        };
        let mid = Sensors {
            distance: p.aggro_radius + 1.0,
            ..Default::default()
        };
        use BehaviorState::*;
        assert_eq!(transition(Archetype::Patroller, &p, Patrol, 0.0, &near), Some(Chase));
        assert_eq!(transition(Archetype::Patroller, &p, Chase, 0.0, &mid), None);
        assert_eq!(transition(Archetype::Patroller, &p, Chase, 0.0, &far), Some(Patrol));
        assert_eq!(transition(Archetype::Patroller, &p, Idle, p.idle_secs, &far), Some(Patrol));
        assert_eq!(transition(Archetype::Patroller, &p, Patrol, p.patrol_secs, &far), Some(Idle));
    }

    #[test]
    fn test_charger_cycle() {
        let p = ArchetypeParams::for_archetype(Archetype::Charger);
        let near = Sensors {
            distance: p.aggro_radius * 0.5,
            ..Default::default()
        };
        let wall = Sensors {
            wall_ahead: true,
            ..near
        };
        use BehaviorState::*;
        assert_eq!(transition(Archetype::Charger, &p, Patrol, 0.0, &near), Some(Idle));
        assert_eq!(transition(Archetype::Charger, &p, Idle, 0.1, &near), None);
        assert_eq!(
            transition(Archetype::Charger, &p, Idle, p.charge_dwell_secs, &near),
            Some(Charge)
        );
        assert_eq!(transition(Archetype::Charger, &p, Charge, 0.1, &near), None);
        assert_eq!(transition(Archetype::Charger, &p, Charge, 0.1, &wall), Some(Stunned));
        assert_eq!(
            transition(Archetype::Charger, &p, Charge, p.charge_secs, &near),
            Some(Stunned)
        );
        assert_eq!(transition(Archetype::Charger, &p, Stunned, 0.5, &near), None);
        assert_eq!(transition(Archetype::Charger, &p, Stunned, p.stun_secs, &near), Some(Patrol));
    }

    #[test]
    fn test_scenario_patroller_reverses_at_bound() {
        let grid = arena();
        let world = CollisionWorld::new(&grid, CollisionRules::default());
        let tuning = PhysicsTuning::default();
        let table = ArchetypeTable::default();
        let engine = BehaviorEngine::new(world, &tuning, &table);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut shots = Vec::new();

        let mut e = spawn(Archetype::Patroller, &table, 20.0 * TILE);
        let home = e.home_x;
        e.pos.x = home + 78.0;
        e.patrol_dir = 1.0;

        // Walk right until the bound is reached
        let mut steps = 0;
        while e.pos.x < home + 80.0 {
            engine.update(&mut e, &far_target(), &mut rng, FIXED_DT, &mut shots);
            assert_eq!(e.patrol_dir, 1.0);
            steps += 1;
            assert!(steps < 10);
        }

        engine.update(&mut e, &far_target(), &mut rng, FIXED_DT, &mut shots);
        assert_eq!(e.state, BehaviorState::Patrol);
        assert_eq!(e.patrol_dir, -1.0);
        assert!(e.vel.x < 0.0);
    }

    #[test]
    fn test_patroller_turns_at_wall() {
        let grid = arena();
        let world = CollisionWorld::new(&grid, CollisionRules::default());
        let tuning = PhysicsTuning::default();
        let mut table = ArchetypeTable::default();
        table.patroller.patrol_range = 10_000.0;
        table.patroller.patrol_secs = 100.0;
        let engine = BehaviorEngine::new(world, &tuning, &table);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut shots = Vec::new();

        let mut e = spawn(Archetype::Patroller, &table, 37.0 * TILE);
        e.patrol_dir = 1.0;
        let mut turned = false;
        for _ in 0..240 {
            engine.update(&mut e, &far_target(), &mut rng, FIXED_DT, &mut shots);
            if e.patrol_dir < 0.0 {
                turned = true;
                break;
            }
        }
        assert!(turned);
        assert!(e.pos.x + e.size.x <= 39.0 * TILE);
    }

    #[test]
    fn test_scenario_shooter_fires_after_cooldown() {
        let grid = arena();
        let world = CollisionWorld::new(&grid, CollisionRules::default());
        let tuning = PhysicsTuning::default();
        let table = ArchetypeTable::default();
        assert_eq!(table.shooter.shoot_cooldown, 2.0);
        let engine = BehaviorEngine::new(world, &tuning, &table);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut shots = Vec::new();

        let mut e = spawn(Archetype::Shooter, &table, 10.0 * TILE);
        let target = TargetInfo {
            center: e.center() + Vec2::new(100.0, -20.0),
            facing: -1.0,
            alive: true,
        };

        // 2.0s at 60 Hz is 120 steps; nothing before the last one
        for _ in 0..119 {
            engine.update(&mut e, &target, &mut rng, FIXED_DT, &mut shots);
        }
        assert_eq!(e.state, BehaviorState::Shoot);
        assert!(shots.is_empty());

        engine.update(&mut e, &target, &mut rng, FIXED_DT, &mut shots);
        assert_eq!(shots.len(), 1);
        let shot = shots[0];
        let expected = (target.center - shot.pos).normalize();
        assert!(shot.vel.normalize().dot(expected) > 0.9999);

        // And not again on the next step
        engine.update(&mut e, &target, &mut rng, FIXED_DT, &mut shots);
        assert_eq!(shots.len(), 1);
    }

    #[test]
    fn test_shooter_spread_volley() {
        let mut params = ArchetypeParams::for_archetype(Archetype::Shooter);
        params.spread_count = 3;
        let e = Actor::enemy(1, Archetype::Shooter, Vec2::new(100.0, 100.0), &params);
        let mut shots = Vec::new();
        let aim_at = e.center() + Vec2::new(50.0, 0.0);
        fire_volley(&e, &params, aim_at, &mut shots);

        assert_eq!(shots.len(), 3);
        // Middle shot goes straight at the target, outer ones fan out evenly
        assert!(shots[1].vel.y.abs() < 1e-3);
        assert!((shots[0].vel.y + shots[2].vel.y).abs() < 1e-3);
        let angle = shots[0].vel.angle_to(shots[1].vel).abs();
        assert!((angle - params.spread_angle).abs() < 1e-4);
    }

    #[test]
    fn test_flanker_targets_behind() {
        let grid = arena();
        let world = CollisionWorld::new(&grid, CollisionRules::default());
        let tuning = PhysicsTuning::default();
        let mut table = ArchetypeTable::default();
        table.flanker.flank_jitter = 0.0;
        let engine = BehaviorEngine::new(world, &tuning, &table);
        let mut rng = Pcg32::seed_from_u64(3);
        let mut shots = Vec::new();

        let mut e = spawn(Archetype::Flanker, &table, 10.0 * TILE);
        e.place_feet(Vec2::new(10.0 * TILE, 6.0 * TILE));
        let target = TargetInfo {
            center: e.center() + Vec2::new(80.0, 0.0),
            facing: -1.0,
            alive: true,
        };

        engine.update(&mut e, &target, &mut rng, FIXED_DT, &mut shots);
        assert_eq!(e.state, BehaviorState::Flank);
        // Target faces left, so "behind" is to its right
        let point = e.target_point.unwrap();
        assert!((point.x - (target.center.x + table.flanker.flank_distance)).abs() < 1e-3);
        assert!(e.vel.x > 0.0);
    }

    #[test]
    fn test_dying_plays_out() {
        let grid = arena();
        let world = CollisionWorld::new(&grid, CollisionRules::default());
        let tuning = PhysicsTuning::default();
        let table = ArchetypeTable::default();
        let engine = BehaviorEngine::new(world, &tuning, &table);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut shots = Vec::new();

        let mut e = spawn(Archetype::Patroller, &table, 10.0 * TILE);
        e.take_damage(5, 0.0);
        let near = TargetInfo {
            center: e.center(),
            facing: 1.0,
            alive: true,
        };
        for _ in 0..10 {
            assert_eq!(engine.update(&mut e, &near, &mut rng, FIXED_DT, &mut shots), None);
            assert_eq!(e.state, BehaviorState::Dying);
            assert_eq!(e.vel.x, 0.0);
        }
    }
}
