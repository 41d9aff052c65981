//! Rendering interface
//!
//! Drawing is a collaborator: modes hand a [`FrameSnapshot`] and an
//! [`Overlay`] to whatever [`Renderer`] the host installed. The headless
//! runner uses [`NullRenderer`].

pub mod snapshot;

pub use snapshot::{ActorSnapshot, FrameSnapshot, LevelSnapshot, PickupSnapshot, ProjectileSnapshot};

use serde::{Deserialize, Serialize};

/// Full-screen UI layered over (or instead of) the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Overlay {
    Loading,
    LoadFailed,
    Menu { best_score: u64 },
    Paused,
    GameOver { score: u64, best_score: u64 },
    Victory { score: u64, best_score: u64 },
}

pub trait Renderer {
    /// Draw tiles, actors, projectiles and pickups as seen by the camera
    fn draw_world(&mut self, frame: &FrameSnapshot);
    fn draw_overlay(&mut self, overlay: &Overlay);
    /// Called once after all draws of a rendered frame
    fn present(&mut self) {}
}

/// Draws nothing; remembers what it was asked to draw last
#[derive(Debug, Default, Clone)]
pub struct NullRenderer {
    pub frames: u64,
    pub last_world: Option<FrameSnapshot>,
    pub last_overlay: Option<Overlay>,
}

impl Renderer for NullRenderer {
    fn draw_world(&mut self, frame: &FrameSnapshot) {
        self.last_world = Some(frame.clone());
    }

    fn draw_overlay(&mut self, overlay: &Overlay) {
        self.last_overlay = Some(*overlay);
    }

    fn present(&mut self) {
        self.frames += 1;
    }
}
