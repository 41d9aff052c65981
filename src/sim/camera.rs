//! Deadzone-follow camera
//!
//! The camera only moves when the target leaves a rectangle centered in the
//! viewport, and its position always stays inside the world.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;

/// Camera behavior for a title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    /// Deadzone size as a fraction of the viewport
    pub deadzone_frac: Vec2,
    /// Fraction of the deadzone excess removed per 60 Hz step (1 = snap)
    pub lerp: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            deadzone_frac: Vec2::splat(0.3),
            lerp: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Top-left of the view in world pixels
    pub pos: Vec2,
    pub viewport: Vec2,
    pub world: Vec2,
    /// Deadzone in screen space
    pub deadzone: Rect,
    pub lerp: f32,
}

impl Camera {
    pub fn new(viewport: Vec2, world: Vec2, tuning: &CameraTuning) -> Self {
        let size = viewport * tuning.deadzone_frac.clamp(Vec2::ZERO, Vec2::ONE);
        Self {
            pos: Vec2::ZERO,
            viewport,
            world,
            deadzone: Rect::from_pos_size((viewport - size) / 2.0, size),
            lerp: tuning.lerp.clamp(0.0, 1.0),
        }
    }

    /// Largest valid camera position
    pub fn max_pos(&self) -> Vec2 {
        (self.world - self.viewport).max(Vec2::ZERO)
    }

    /// Move toward keeping `target` inside the deadzone, then clamp to the world
    pub fn follow(&mut self, target: Vec2, dt: f32) {
        let screen = target - self.pos;
        let dz = self.deadzone;
        let excess = Vec2::new(
            excess(screen.x, dz.x, dz.right()),
            excess(screen.y, dz.y, dz.bottom()),
        );

        let factor = if self.lerp >= 1.0 {
            1.0
        } else {
            // Same pull per second at any step size
            1.0 - (1.0 - self.lerp).powf(dt.max(0.0) * 60.0)
        };
        self.pos += excess * factor;
        self.clamp();
    }

    /// Center the view on a point (clamped)
    pub fn center_on(&mut self, point: Vec2) {
        self.pos = point - self.viewport / 2.0;
        self.clamp();
    }

    pub fn view_rect(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.viewport)
    }

    /// Box is at least partly on screen
    pub fn is_visible(&self, rect: &Rect) -> bool {
        self.view_rect().overlaps(rect)
    }

    fn clamp(&mut self) {
        self.pos = self.pos.clamp(Vec2::ZERO, self.max_pos());
    }
}

/// Signed distance a coordinate lies outside `[lo, hi]`
fn excess(v: f32, lo: f32, hi: f32) -> f32 {
    if v < lo {
        v - lo
    } else if v > hi {
        v - hi
    } else {
        0.0
    }
}
