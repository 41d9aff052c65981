//! Procedural level generation
//!
//! A level is generated column by column from a seeded RNG: rolling ground,
//! floating platforms, pits, enemy spawns, pickups and finally the exit.
//! Every placement that conflicts with something already placed is retried a
//! bounded number of times and then skipped, so generation always finishes
//! and the grid stays enclosed by Solid border cells.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::actor::PickupKind;
use super::behavior::Archetype;
use super::collision::{TileGrid, TileType};
use super::geometry::Rect;

/// Smallest grid the generator will build; requests below this are grown
pub const MIN_COLS: usize = 16;
pub const MIN_ROWS: usize = 10;

/// Seed for one level of a run
///
/// Mixes the level index into the run seed so neighboring levels diverge.
pub fn level_seed(run_seed: u64, level_index: u32) -> u64 {
    (level_index as u64)
        .wrapping_mul(2654435761)
        .wrapping_add(run_seed)
}

/// Spawn weight of one archetype, growing (or shrinking) with the level index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeWeight {
    pub archetype: Archetype,
    pub base: f32,
    pub per_level: f32,
}

impl ArchetypeWeight {
    pub fn at_level(&self, level_index: u32) -> f32 {
        (self.base + self.per_level * level_index as f32).max(0.0)
    }
}

/// Density and placement rules for generated levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelDescriptor {
    /// Chance per column that the ground shifts by one tile
    pub ground_change_chance: f64,
    /// Ground surface stays between `rows - 1 - max_depth` and `rows - 1 - min_depth`
    pub ground_min_depth: i32,
    pub ground_max_depth: i32,
    /// Flat columns at the left edge where the player starts
    pub start_cols: i32,

    pub platform_chance: f64,
    pub platform_min_width: i32,
    pub platform_max_width: i32,
    /// Highest row a platform may sit on
    pub platform_min_row: i32,
    /// Rows kept free between a platform and the ground below it
    pub platform_clearance: i32,
    /// Minimum tile spacing between two platforms in either direction
    pub platform_margin: i32,

    pub gap_chance: f64,
    pub gap_min_width: i32,
    pub gap_max_width: i32,
    /// Chance a pit gets a hazard floor
    pub gap_hazard_chance: f64,
    /// No pits this close to either end of the level
    pub gap_edge_cols: i32,

    pub enemy_chance: f64,
    /// Minimum distance in pixels between a spawn and the player start
    pub min_spawn_distance: f32,
    /// How far above the ground hovering archetypes spawn, in tiles
    pub flyer_height: i32,
    pub weights: Vec<ArchetypeWeight>,

    /// Chance per column of a gem on the ground
    pub ground_gem_chance: f64,
    /// Chance a new platform carries a pickup
    pub platform_pickup_chance: f64,
    /// Share of platform pickups that are hearts
    pub heart_ratio: f64,

    /// Attempts per conflicting placement before it is skipped
    pub placement_retries: u32,
    /// Columns at the right edge reserved for the exit
    pub exit_zone_cols: i32,
    pub exit_search_attempts: u32,
    /// Exit stays a closed door until every enemy is gone
    pub lock_exit_until_clear: bool,
}

impl Default for LevelDescriptor {
    fn default() -> Self {
        Self {
            ground_change_chance: 0.15,
            ground_min_depth: 2,
            ground_max_depth: 4,
            start_cols: 4,
            platform_chance: 0.06,
            platform_min_width: 3,
            platform_max_width: 6,
            platform_min_row: 3,
            platform_clearance: 3,
            platform_margin: 1,
            gap_chance: 0.04,
            gap_min_width: 2,
            gap_max_width: 4,
            gap_hazard_chance: 1.0,
            gap_edge_cols: 8,
            enemy_chance: 0.04,
            min_spawn_distance: 96.0,
            flyer_height: 4,
            weights: vec![
                ArchetypeWeight {
                    archetype: Archetype::Patroller,
                    base: 0.5,
                    per_level: -0.05,
                },
                ArchetypeWeight {
                    archetype: Archetype::Flanker,
                    base: 0.15,
                    per_level: 0.03,
                },
                ArchetypeWeight {
                    archetype: Archetype::Charger,
                    base: 0.15,
                    per_level: 0.03,
                },
                ArchetypeWeight {
                    archetype: Archetype::Shooter,
                    base: 0.2,
                    per_level: 0.02,
                },
            ],
            ground_gem_chance: 0.05,
            platform_pickup_chance: 0.5,
            heart_ratio: 0.3,
            placement_retries: 4,
            exit_zone_cols: 6,
            exit_search_attempts: 8,
            lock_exit_until_clear: false,
        }
    }
}

impl LevelDescriptor {
    /// Weighted archetype pick for a level; `None` when every weight is zero
    pub fn pick_archetype<R: Rng>(&self, level_index: u32, rng: &mut R) -> Option<Archetype> {
        let total: f32 = self.weights.iter().map(|w| w.at_level(level_index)).sum();
        if total <= 0.0 {
            return None;
        }
        let roll = rng.random::<f32>() * total;
        let mut cumulative = 0.0;
        for w in &self.weights {
            cumulative += w.at_level(level_index);
            if roll < cumulative {
                return Some(w.archetype);
            }
        }
        self.weights
            .iter()
            .rev()
            .find(|w| w.at_level(level_index) > 0.0)
            .map(|w| w.archetype)
    }
}

/// A horizontal run of Platform tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformRun {
    pub col: i32,
    pub row: i32,
    pub width: i32,
}

impl PlatformRun {
    /// Within `margin` tiles of another run (horizontally and vertically)
    pub fn near(&self, other: &PlatformRun, margin: i32) -> bool {
        self.col - margin < other.col + other.width
            && other.col < self.col + self.width + margin
            && (self.row - other.row).abs() <= margin
    }
}

/// Where an enemy appears when the level starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnDescriptor {
    pub archetype: Archetype,
    /// Bottom-center point
    pub feet: Vec2,
}

/// Where a pickup appears when the level starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickupSpawn {
    pub kind: PickupKind,
    /// Top-left of the pickup box
    pub pos: Vec2,
}

/// Pickup box edge in pixels
pub const PICKUP_SIZE: f32 = 8.0;

/// A generated level
///
/// Immutable after generation except for opening the exit door.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub index: u32,
    pub seed: u64,
    pub grid: TileGrid,
    pub spawns: Vec<SpawnDescriptor>,
    pub pickups: Vec<PickupSpawn>,
    pub platforms: Vec<PlatformRun>,
    /// Bottom-center of the player start
    pub player_spawn: Vec2,
    /// Cell the player has to reach
    pub exit_cell: (i32, i32),
    pub exit_locked: bool,
}

impl Level {
    /// Wrap a hand-built grid (fixtures, tests); no spawns or pickups
    pub fn from_grid(grid: TileGrid, player_spawn: Vec2, exit_cell: (i32, i32)) -> Self {
        Self {
            index: 0,
            seed: 0,
            grid,
            spawns: Vec::new(),
            pickups: Vec::new(),
            platforms: Vec::new(),
            player_spawn,
            exit_cell,
            exit_locked: false,
        }
    }

    pub fn exit_rect(&self) -> Rect {
        self.grid.cell_rect(self.exit_cell.0, self.exit_cell.1)
    }

    /// Bottom-center of the exit cell
    pub fn exit_feet(&self) -> Vec2 {
        let r = self.exit_rect();
        Vec2::new(r.center().x, r.bottom())
    }

    /// Unlock the exit (Door -> Empty). Returns true if it was locked.
    pub fn open_exit(&mut self) -> bool {
        if !self.exit_locked {
            return false;
        }
        self.exit_locked = false;
        let (col, row) = self.exit_cell;
        if self.grid.classify(col, row) == TileType::Door {
            self.grid.set(col, row, TileType::Empty);
        }
        true
    }
}

/// Seeded level generator
pub struct LevelGenerator {
    descriptor: LevelDescriptor,
    run_seed: u64,
}

impl LevelGenerator {
    pub fn new(descriptor: LevelDescriptor, run_seed: u64) -> Self {
        Self {
            descriptor,
            run_seed,
        }
    }

    /// Generate level `level_index`. Never fails; grids smaller than
    /// [`MIN_COLS`] x [`MIN_ROWS`] are grown to that size.
    pub fn generate(&self, level_index: u32, cols: usize, rows: usize) -> Level {
        let seed = level_seed(self.run_seed, level_index);
        let mut build = Build::new(&self.descriptor, seed, cols.max(MIN_COLS), rows.max(MIN_ROWS));

        build.borders();
        build.ground();
        build.gaps();
        build.platforms();
        let exit_cell = build.exit();
        build.enemies(level_index);
        build.ground_pickups(exit_cell.0);

        let exit_locked = self.descriptor.lock_exit_until_clear;
        if exit_locked {
            build.grid.set(exit_cell.0, exit_cell.1, TileType::Door);
        }

        log::info!(
            "Generated level {} ({}x{}): {} platforms, {} enemies, {} pickups, exit at {:?}",
            level_index,
            build.cols,
            build.rows,
            build.platforms.len(),
            build.spawns.len(),
            build.pickups.len(),
            exit_cell
        );

        Level {
            index: level_index,
            seed,
            player_spawn: build.player_spawn(),
            grid: build.grid,
            spawns: build.spawns,
            pickups: build.pickups,
            platforms: build.platforms,
            exit_cell,
            exit_locked,
        }
    }
}

/// Working state for one generation pass
struct Build<'a> {
    desc: &'a LevelDescriptor,
    rng: Pcg32,
    cols: i32,
    rows: i32,
    ts: f32,
    grid: TileGrid,
    /// Ground surface row per column; `None` for pits and border columns
    ground: Vec<Option<i32>>,
    platforms: Vec<PlatformRun>,
    spawns: Vec<SpawnDescriptor>,
    pickups: Vec<PickupSpawn>,
}

impl<'a> Build<'a> {
    fn new(desc: &'a LevelDescriptor, seed: u64, cols: usize, rows: usize) -> Self {
        let ts = crate::consts::TILE;
        Self {
            desc,
            rng: Pcg32::seed_from_u64(seed),
            cols: cols as i32,
            rows: rows as i32,
            ts,
            grid: TileGrid::new(cols, rows, ts),
            ground: vec![None; cols],
            platforms: Vec::new(),
            spawns: Vec::new(),
            pickups: Vec::new(),
        }
    }

    /// Inclusive surface row band for the ground
    fn ground_band(&self) -> (i32, i32) {
        let lowest = (self.rows - 1 - self.desc.ground_min_depth.max(1)).max(2);
        let highest = (self.rows - 1 - self.desc.ground_max_depth).clamp(2, lowest);
        (highest, lowest)
    }

    /// Last column (exclusive) before the exit zone
    fn exit_zone_start(&self) -> i32 {
        (self.cols - self.desc.exit_zone_cols.max(2)).max(self.desc.start_cols + 2)
    }

    fn borders(&mut self) {
        for col in 0..self.cols {
            self.grid.set(col, 0, TileType::Solid);
            self.grid.set(col, self.rows - 1, TileType::Solid);
        }
        for row in 0..self.rows {
            self.grid.set(0, row, TileType::Solid);
            self.grid.set(self.cols - 1, row, TileType::Solid);
        }
    }

    fn ground(&mut self) {
        let (highest, lowest) = self.ground_band();
        let flat_until = self.desc.start_cols;
        let flat_from = self.exit_zone_start();
        let change = self.desc.ground_change_chance.clamp(0.0, 1.0);
        let mut surface = lowest;
        for col in 1..self.cols - 1 {
            if col > flat_until && col < flat_from && self.rng.random_bool(change) {
                let step = if self.rng.random_bool(0.5) { -1 } else { 1 };
                surface = (surface + step).clamp(highest, lowest);
            }
            for row in surface..self.rows - 1 {
                self.grid.set(col, row, TileType::Solid);
            }
            self.ground[col as usize] = Some(surface);
        }
    }

    fn gaps(&mut self) {
        let d = self.desc;
        let first = d.gap_edge_cols.max(d.start_cols + 2);
        let last = (self.cols - d.gap_edge_cols).min(self.exit_zone_start());
        let (min_w, max_w) = (d.gap_min_width.max(1), d.gap_max_width.max(d.gap_min_width.max(1)));
        let mut col = first;
        while col < last {
            if !self.rng.random_bool(d.gap_chance.clamp(0.0, 1.0)) {
                col += 1;
                continue;
            }
            let width = self.rng.random_range(min_w..=max_w).min(last - col);
            let hazard = self.rng.random_bool(d.gap_hazard_chance.clamp(0.0, 1.0));
            for c in col..col + width {
                // Bottom border row stays solid; the pit floor sits on it
                for row in 1..self.rows - 1 {
                    self.grid.set(c, row, TileType::Empty);
                }
                if hazard {
                    self.grid.set(c, self.rows - 2, TileType::Hazard);
                }
                self.ground[c as usize] = None;
            }
            // At least one solid column between pits
            col += width + 1;
        }
    }

    /// Surface row under a column; pits count as the bottom border
    fn floor_row(&self, col: i32) -> i32 {
        self.ground
            .get(col as usize)
            .copied()
            .flatten()
            .unwrap_or(self.rows - 1)
    }

    fn platforms(&mut self) {
        let d = self.desc;
        let (min_w, max_w) = (
            d.platform_min_width.max(1),
            d.platform_max_width.max(d.platform_min_width.max(1)),
        );
        for col in (d.start_cols + 2)..(self.cols - 2) {
            if !self.rng.random_bool(d.platform_chance.clamp(0.0, 1.0)) {
                continue;
            }
            let mut placed = None;
            for attempt in 0..d.placement_retries.max(1) {
                let width = self.rng.random_range(min_w..=max_w).min(self.cols - 1 - col);
                if width <= 0 {
                    break;
                }
                let top_floor = (col..col + width)
                    .map(|c| self.floor_row(c))
                    .min()
                    .unwrap_or(self.rows - 1);
                let max_row = top_floor - d.platform_clearance.max(1);
                let min_row = d.platform_min_row.max(1);
                if max_row < min_row {
                    log::debug!("platform at col {} skipped: no headroom", col);
                    break;
                }
                let run = PlatformRun {
                    col,
                    row: self.rng.random_range(min_row..=max_row),
                    width,
                };
                if self.platforms.iter().any(|p| p.near(&run, d.platform_margin)) {
                    log::debug!("platform {:?} rejected (attempt {})", run, attempt + 1);
                    continue;
                }
                placed = Some(run);
                break;
            }
            let Some(run) = placed else {
                continue;
            };
            for c in run.col..run.col + run.width {
                self.grid.set(c, run.row, TileType::Platform);
            }
            self.platforms.push(run);

            if self.rng.random_bool(d.platform_pickup_chance.clamp(0.0, 1.0)) {
                let kind = if self.rng.random_bool(d.heart_ratio.clamp(0.0, 1.0)) {
                    PickupKind::Heart
                } else {
                    PickupKind::Gem
                };
                let c = run.col + run.width / 2;
                self.pickups.push(PickupSpawn {
                    kind,
                    pos: self.pickup_pos(c, run.row),
                });
            }
        }
    }

    /// Pickup resting on top of the cell (col, row)
    fn pickup_pos(&self, col: i32, row: i32) -> Vec2 {
        Vec2::new(
            col as f32 * self.ts + (self.ts - PICKUP_SIZE) / 2.0,
            row as f32 * self.ts - PICKUP_SIZE,
        )
    }

    fn cell_clear(&self, col: i32, row: i32) -> bool {
        self.grid.classify(col, row) == TileType::Empty
    }

    /// Exit cell in the last columns, standing on solid ground with headroom
    fn exit(&mut self) -> (i32, i32) {
        let zone_start = self.exit_zone_start();
        let zone_end = self.cols - 2;
        let usable = |b: &Self, col: i32| -> Option<(i32, i32)> {
            let floor = b.ground.get(col as usize).copied().flatten()?;
            let row = floor - 1;
            (row >= 2 && b.cell_clear(col, row) && b.cell_clear(col, row - 1)).then_some((col, row))
        };

        if zone_start <= zone_end {
            for _ in 0..self.desc.exit_search_attempts {
                let col = self.rng.random_range(zone_start..=zone_end);
                if let Some(cell) = usable(self, col) {
                    return cell;
                }
            }
        }

        // Fixed offset from the right wall, cleared and floored by force
        let col = (self.cols - 3).max(1);
        let (_, lowest) = self.ground_band();
        for row in 1..lowest {
            self.grid.set(col, row, TileType::Empty);
        }
        for row in lowest..self.rows - 1 {
            self.grid.set(col, row, TileType::Solid);
        }
        self.ground[col as usize] = Some(lowest);
        self.platforms.retain(|p| !(p.col <= col && col < p.col + p.width));
        log::debug!("exit search failed, using fallback column {}", col);
        (col, lowest - 1)
    }

    fn enemies(&mut self, level_index: u32) {
        let d = self.desc;
        let start = self.player_spawn();
        let end = self.exit_zone_start();
        let mut col = d.start_cols.max(1);
        while col < end {
            if !self.rng.random_bool(d.enemy_chance.clamp(0.0, 1.0)) {
                col += 1;
                continue;
            }
            let Some(archetype) = d.pick_archetype(level_index, &mut self.rng) else {
                return;
            };
            let flyer = matches!(archetype, Archetype::Flanker);
            for attempt in 0..d.placement_retries.max(1) as i32 {
                let c = col + attempt;
                if c >= end {
                    break;
                }
                let Some(feet) = self.spawn_point(c, flyer) else {
                    continue;
                };
                if feet.distance(start) < d.min_spawn_distance {
                    log::debug!("spawn at col {} too close to player start", c);
                    continue;
                }
                if self.spawns.iter().any(|s| (s.feet.x - feet.x).abs() < self.ts) {
                    continue;
                }
                self.spawns.push(SpawnDescriptor { archetype, feet });
                break;
            }
            col += 1;
        }
    }

    /// Feet position for an enemy in a column, if the column can take one
    fn spawn_point(&self, col: i32, flyer: bool) -> Option<Vec2> {
        let floor = self.ground.get(col as usize).copied().flatten()?;
        let feet_row = if flyer {
            (floor - self.desc.flyer_height.max(1)).max(2)
        } else {
            floor
        };
        if !self.cell_clear(col, feet_row - 1) {
            return None;
        }
        Some(Vec2::new(col as f32 * self.ts + self.ts / 2.0, feet_row as f32 * self.ts))
    }

    fn ground_pickups(&mut self, exit_col: i32) {
        let chance = self.desc.ground_gem_chance.clamp(0.0, 1.0);
        for col in self.desc.start_cols.max(1)..self.cols - 1 {
            if col == exit_col || !self.rng.random_bool(chance) {
                continue;
            }
            let Some(floor) = self.ground[col as usize] else {
                continue;
            };
            if self.cell_clear(col, floor - 1) {
                self.pickups.push(PickupSpawn {
                    kind: PickupKind::Gem,
                    pos: self.pickup_pos(col, floor),
                });
            }
        }
    }

    fn player_spawn(&self) -> Vec2 {
        let col = 2.min(self.cols - 2);
        let floor = self.floor_row(col);
        Vec2::new(col as f32 * self.ts + self.ts / 2.0, floor as f32 * self.ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::{CollisionRules, CollisionWorld};
    use proptest::prelude::*;

    fn generate(seed: u64, index: u32, cols: usize, rows: usize) -> Level {
        LevelGenerator::new(LevelDescriptor::default(), seed).generate(index, cols, rows)
    }

    #[test]
    fn test_same_seed_same_level() {
        let a = generate(42, 1, 60, 15);
        let b = generate(42, 1, 60, 15);
        assert_eq!(a.grid, b.grid);
        assert_eq!(a.spawns, b.spawns);
        assert_eq!(a.exit_cell, b.exit_cell);

        let c = generate(43, 1, 60, 15);
        let d = generate(42, 2, 60, 15);
        assert!(a.grid != c.grid || a.spawns != c.spawns);
        assert!(a.grid != d.grid || a.spawns != d.spawns);
    }

    #[test]
    fn test_player_spawn_stands_on_ground() {
        for seed in 0..20 {
            let level = generate(seed, 0, 40, 15);
            let grid = &level.grid;
            let col = grid.col_of(level.player_spawn.x);
            let row = grid.row_of(level.player_spawn.y);
            assert_eq!(grid.classify(col, row), TileType::Solid);
            assert_eq!(grid.classify(col, row - 1), TileType::Empty);
        }
    }

    #[test]
    fn test_exit_is_reachable_cell() {
        for seed in 0..20 {
            let level = generate(seed, 3, 70, 15);
            let (col, row) = level.exit_cell;
            let grid = &level.grid;
            assert!(col >= grid.cols() as i32 - 6 && col < grid.cols() as i32 - 1);
            assert_eq!(grid.classify(col, row), TileType::Empty);
            assert_eq!(grid.classify(col, row + 1), TileType::Solid);
            assert!(!level.exit_locked);
        }
    }

    #[test]
    fn test_locked_exit_opens() {
        let desc = LevelDescriptor {
            lock_exit_until_clear: true,
            ..Default::default()
        };
        let mut level = LevelGenerator::new(desc, 9).generate(0, 40, 15);
        let (col, row) = level.exit_cell;
        assert!(level.exit_locked);
        assert_eq!(level.grid.classify(col, row), TileType::Door);

        assert!(level.open_exit());
        assert_eq!(level.grid.classify(col, row), TileType::Empty);
        assert!(!level.open_exit());
    }

    #[test]
    fn test_spawns_keep_distance_from_player() {
        let desc = LevelDescriptor {
            enemy_chance: 0.5,
            ..Default::default()
        };
        let min = desc.min_spawn_distance;
        for seed in 0..10 {
            let level = LevelGenerator::new(desc.clone(), seed).generate(2, 60, 15);
            assert!(!level.spawns.is_empty());
            for s in &level.spawns {
                assert!(s.feet.distance(level.player_spawn) >= min);
                let col = level.grid.col_of(s.feet.x);
                let row = level.grid.row_of(s.feet.y);
                assert_eq!(level.grid.classify(col, row - 1), TileType::Empty);
            }
        }
    }

    #[test]
    fn test_flankers_hover_above_ground() {
        let desc = LevelDescriptor {
            enemy_chance: 0.5,
            weights: vec![ArchetypeWeight {
                archetype: Archetype::Flanker,
                base: 1.0,
                per_level: 0.0,
            }],
            ..Default::default()
        };
        let height = desc.flyer_height;
        for seed in 0..10 {
            let level = LevelGenerator::new(desc.clone(), seed).generate(1, 60, 15);
            let grid = &level.grid;
            assert!(!level.spawns.is_empty());
            for s in &level.spawns {
                assert_eq!(s.archetype, Archetype::Flanker);
                let col = grid.col_of(s.feet.x);
                let row = grid.row_of(s.feet.y);
                let floor = (row..grid.rows() as i32)
                    .find(|&r| grid.classify(col, r) == TileType::Solid)
                    .unwrap();
                assert_eq!(floor - row, height, "seed {} col {}", seed, col);
                assert_eq!(grid.classify(col, row - 1), TileType::Empty);
            }
        }
    }

    #[test]
    fn test_pits_have_hazard_floor() {
        let desc = LevelDescriptor {
            gap_chance: 0.5,
            ..Default::default()
        };
        let level = LevelGenerator::new(desc, 5).generate(0, 60, 15);
        let grid = &level.grid;
        let rows = grid.rows() as i32;
        let hazards: Vec<i32> = (0..grid.cols() as i32)
            .filter(|&c| grid.classify(c, rows - 2) == TileType::Hazard)
            .collect();
        assert!(!hazards.is_empty());
        for c in hazards {
            assert_eq!(grid.classify(c, rows - 1), TileType::Solid);
            assert_eq!(grid.classify(c, rows - 3), TileType::Empty);
        }
    }

    #[test]
    fn test_tiny_request_still_enclosed() {
        let level = generate(1, 0, 3, 2);
        assert_eq!(level.grid.cols(), MIN_COLS);
        assert_eq!(level.grid.rows(), MIN_ROWS);
        assert!(level.grid.border_openings().is_empty());
        let world = CollisionWorld::new(&level.grid, CollisionRules::default());
        assert!(!world.is_solid(level.exit_rect().center().x, level.exit_rect().center().y));
    }

    #[test]
    fn test_pick_archetype_respects_zero_weights() {
        let desc = LevelDescriptor {
            weights: vec![
                ArchetypeWeight {
                    archetype: Archetype::Patroller,
                    base: 0.0,
                    per_level: 0.0,
                },
                ArchetypeWeight {
                    archetype: Archetype::Shooter,
                    base: 1.0,
                    per_level: 0.0,
                },
            ],
            ..Default::default()
        };
        let mut rng = Pcg32::seed_from_u64(0);
        for _ in 0..50 {
            assert_eq!(desc.pick_archetype(0, &mut rng), Some(Archetype::Shooter));
        }
        let none = LevelDescriptor {
            weights: Vec::new(),
            ..Default::default()
        };
        assert_eq!(none.pick_archetype(0, &mut rng), None);
    }

    proptest! {
        #[test]
        fn prop_borders_are_solid(
            seed in any::<u64>(),
            index in 0u32..6,
            cols in 10usize..90,
            rows in 8usize..24,
        ) {
            let level = generate(seed, index, cols, rows);
            prop_assert!(level.grid.border_openings().is_empty());
        }

        #[test]
        fn prop_platforms_keep_margin(seed in any::<u64>(), index in 0u32..6) {
            let desc = LevelDescriptor {
                platform_chance: 0.3,
                ..Default::default()
            };
            let margin = desc.platform_margin;
            let level = LevelGenerator::new(desc, seed).generate(index, 80, 18);
            for (i, a) in level.platforms.iter().enumerate() {
                for b in &level.platforms[i + 1..] {
                    prop_assert!(!a.near(b, margin), "{:?} vs {:?}", a, b);
                }
            }
        }
    }
}
