//! Tile grid and collision queries
//!
//! The level is a fixed `cols × rows` grid of [`TileType`] with its origin at
//! the top-left. [`CollisionWorld`] layers the per-title rules (one-way
//! platforms, blocking doors) on top of raw classification.
//!
//! Anything outside the grid classifies as `Solid`, so actors can never
//! leave the world even if a level is malformed.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;

/// Inset applied to a box's far edges when converting them to tile indices,
/// so a box whose edge lies exactly on a tile boundary does not claim the
/// next tile.
pub const EDGE_EPSILON: f32 = 0.001;

/// Tile classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileType {
    #[default]
    Empty,
    Solid,
    /// Floating platform; solid or one-way depending on [`CollisionRules`]
    Platform,
    /// Passable, damages the player on contact
    Hazard,
    /// Exit door; blocks while closed if the title says so
    Door,
}

/// Per-title interpretation of the passable-or-not tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionRules {
    /// Platforms only stop downward motion from above
    pub one_way_platforms: bool,
    /// Closed doors block movement
    pub doors_block: bool,
}

impl Default for CollisionRules {
    fn default() -> Self {
        Self {
            one_way_platforms: false,
            doors_block: true,
        }
    }
}

/// Fixed-size tile grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    cols: usize,
    rows: usize,
    tile_size: f32,
    tiles: Vec<TileType>,
}

impl TileGrid {
    /// Create a grid with every cell set to `fill`
    pub fn filled(cols: usize, rows: usize, tile_size: f32, fill: TileType) -> Self {
        Self {
            cols,
            rows,
            tile_size,
            tiles: vec![fill; cols * rows],
        }
    }

    /// Create an empty grid
    pub fn new(cols: usize, rows: usize, tile_size: f32) -> Self {
        Self::filled(cols, rows, tile_size, TileType::Empty)
    }

    /// Build a grid from ASCII rows (`#` solid, `=` platform, `^` hazard,
    /// `D` door, anything else empty). Handy for fixtures and tests.
    pub fn from_ascii(rows: &[&str], tile_size: f32) -> Self {
        let cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut grid = Self::new(cols, rows.len(), tile_size);
        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                let tile = match ch {
                    '#' => TileType::Solid,
                    '=' => TileType::Platform,
                    '^' => TileType::Hazard,
                    'D' => TileType::Door,
                    _ => TileType::Empty,
                };
                grid.set(col as i32, row as i32, tile);
            }
        }
        grid
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Raw tile storage, row-major
    pub fn tiles(&self) -> &[TileType] {
        &self.tiles
    }

    /// World size in pixels
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(
            self.cols as f32 * self.tile_size,
            self.rows as f32 * self.tile_size,
        )
    }

    #[inline]
    pub fn in_bounds(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && (col as usize) < self.cols && (row as usize) < self.rows
    }

    /// Tile at a grid cell; out-of-range cells are `Solid`
    pub fn classify(&self, col: i32, row: i32) -> TileType {
        if self.in_bounds(col, row) {
            self.tiles[row as usize * self.cols + col as usize]
        } else {
            TileType::Solid
        }
    }

    /// Overwrite a cell. Returns false (and does nothing) when out of range.
    pub fn set(&mut self, col: i32, row: i32, tile: TileType) -> bool {
        if !self.in_bounds(col, row) {
            return false;
        }
        let idx = row as usize * self.cols + col as usize;
        self.tiles[idx] = tile;
        true
    }

    /// Column index containing world x
    #[inline]
    pub fn col_of(&self, x: f32) -> i32 {
        (x / self.tile_size).floor() as i32
    }

    /// Row index containing world y
    #[inline]
    pub fn row_of(&self, y: f32) -> i32 {
        (y / self.tile_size).floor() as i32
    }

    /// World-space box of a cell
    pub fn cell_rect(&self, col: i32, row: i32) -> Rect {
        Rect::new(
            col as f32 * self.tile_size,
            row as f32 * self.tile_size,
            self.tile_size,
            self.tile_size,
        )
    }

    /// Inclusive cell span `(col0, col1, row0, row1)` covered by a box
    pub fn span(&self, rect: &Rect) -> (i32, i32, i32, i32) {
        (
            self.col_of(rect.x),
            self.col_of(rect.right() - EDGE_EPSILON),
            self.row_of(rect.y),
            self.row_of(rect.bottom() - EDGE_EPSILON),
        )
    }

    /// Cell lies on the outer ring of the grid
    pub fn is_border(&self, col: i32, row: i32) -> bool {
        col == 0 || row == 0 || col == self.cols as i32 - 1 || row == self.rows as i32 - 1
    }

    /// Border cells that are not Solid, in row-major order
    pub fn border_openings(&self) -> Vec<(i32, i32)> {
        let mut open = Vec::new();
        for row in 0..self.rows as i32 {
            for col in 0..self.cols as i32 {
                if self.is_border(col, row) && self.classify(col, row) != TileType::Solid {
                    open.push((col, row));
                }
            }
        }
        open
    }
}

/// Read-only collision view over a grid with title rules applied
#[derive(Debug, Clone, Copy)]
pub struct CollisionWorld<'a> {
    pub grid: &'a TileGrid,
    pub rules: CollisionRules,
}

impl<'a> CollisionWorld<'a> {
    pub fn new(grid: &'a TileGrid, rules: CollisionRules) -> Self {
        Self { grid, rules }
    }

    #[inline]
    pub fn tile_size(&self) -> f32 {
        self.grid.tile_size()
    }

    #[inline]
    pub fn classify(&self, col: i32, row: i32) -> TileType {
        self.grid.classify(col, row)
    }

    /// Whether a tile stops movement from every direction
    pub fn blocks(&self, tile: TileType) -> bool {
        match tile {
            TileType::Solid => true,
            TileType::Platform => !self.rules.one_way_platforms,
            TileType::Door => self.rules.doors_block,
            TileType::Empty | TileType::Hazard => false,
        }
    }

    /// Whether a tile can be stood on when landing from above
    pub fn supports(&self, tile: TileType) -> bool {
        self.blocks(tile) || tile == TileType::Platform
    }

    /// Blocking test for the cell at (col, row)
    #[inline]
    pub fn cell_blocks(&self, col: i32, row: i32) -> bool {
        self.blocks(self.classify(col, row))
    }

    /// Tile under a world point
    pub fn tile_at(&self, x: f32, y: f32) -> TileType {
        self.grid.classify(self.grid.col_of(x), self.grid.row_of(y))
    }

    /// World point lies in a blocking tile
    pub fn is_solid(&self, x: f32, y: f32) -> bool {
        self.blocks(self.tile_at(x, y))
    }

    /// World point lies in a hazard tile
    pub fn is_hazard(&self, x: f32, y: f32) -> bool {
        self.tile_at(x, y) == TileType::Hazard
    }

    /// World point is something an actor could stand on
    pub fn is_ground(&self, x: f32, y: f32) -> bool {
        self.supports(self.tile_at(x, y))
    }

    /// Any blocking tile overlapped by the box
    pub fn overlaps_solid(&self, rect: &Rect) -> bool {
        self.any_cell(rect, |tile| self.blocks(tile))
    }

    fn any_cell(&self, rect: &Rect, pred: impl Fn(TileType) -> bool) -> bool {
        let (c0, c1, r0, r1) = self.grid.span(rect);
        (r0..=r1).any(|row| (c0..=c1).any(|col| pred(self.classify(col, row))))
    }
}
