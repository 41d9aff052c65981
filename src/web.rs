//! Browser bindings
//!
//! The page owns the canvas, the key listeners and Web Audio. It creates a
//! [`WebGame`], forwards key codes, calls `frame` from
//! `requestAnimationFrame` and reads back JSON snapshots and queued sound
//! cues to draw and play.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::Game;
use crate::audio::{AudioSink, SoundEffect};
use crate::input::{Action, Autopilot};
use crate::modes::LoadState;
use crate::persistence::LocalStorageStore;
use crate::renderer::{LevelSnapshot, NullRenderer};
use crate::settings::Settings;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Tilecade starting...");
}

/// Cues waiting for the page to play them
#[derive(Default, Clone)]
struct QueuedAudio {
    queue: Rc<RefCell<Vec<SoundEffect>>>,
    muted: bool,
}

impl AudioSink for QueuedAudio {
    fn play(&mut self, effect: SoundEffect) {
        if !self.muted {
            self.queue.borrow_mut().push(effect);
        }
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::warn!("Snapshot serialization failed: {}", e);
        "null".to_string()
    })
}

#[wasm_bindgen]
pub struct WebGame {
    game: Game,
    renderer: NullRenderer,
    sounds: Rc<RefCell<Vec<SoundEffect>>>,
    /// Demo play while idle on the title screen
    pilot: Option<Autopilot>,
}

#[wasm_bindgen]
impl WebGame {
    /// `title` selects the stored settings and best score; `seed` is the
    /// base for derived run seeds
    #[wasm_bindgen(constructor)]
    pub fn new(title: &str, seed: u64) -> Self {
        let settings = Settings::load(title);
        let store = LocalStorageStore::new(settings.best_score_key());
        let audio = QueuedAudio::default();
        let sounds = audio.queue.clone();
        let game = Game::new(settings, seed, Box::new(store), Box::new(audio));
        Self {
            game,
            renderer: NullRenderer::default(),
            sounds,
            pilot: None,
        }
    }

    /// Assets finished loading (or failed)
    pub fn assets_loaded(&mut self, ok: bool) {
        let state = if ok { LoadState::Ready } else { LoadState::Failed };
        self.game.set_load_state(state);
    }

    /// Advance by `dt` seconds of wall time; returns the steps run
    pub fn frame(&mut self, dt: f32) -> u32 {
        if let Some(pilot) = self.pilot.as_mut() {
            self.game.drive(pilot);
        }
        self.renderer.last_world = None;
        self.renderer.last_overlay = None;
        self.game.frame(dt, &mut self.renderer)
    }

    /// `KeyboardEvent.code`; returns whether the key is bound
    pub fn key_down(&mut self, code: &str) -> bool {
        match Action::from_key_code(code) {
            Some(action) => {
                self.game.key_down(action);
                true
            }
            None => false,
        }
    }

    pub fn key_up(&mut self, code: &str) -> bool {
        match Action::from_key_code(code) {
            Some(action) => {
                self.game.key_up(action);
                true
            }
            None => false,
        }
    }

    /// Tab hidden or window blurred
    pub fn focus_lost(&mut self) {
        self.game.focus_lost();
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.game.set_muted(muted);
    }

    pub fn set_demo(&mut self, on: bool) {
        self.pilot = on.then(Autopilot::new);
    }

    pub fn mode_name(&self) -> String {
        self.game.mode().as_str().to_string()
    }

    /// Last drawn world (`FrameSnapshot`) or `null` outside a run
    pub fn snapshot_json(&self) -> String {
        to_json(&self.renderer.last_world)
    }

    /// Current level's tiles (`LevelSnapshot`) or `null` outside a run
    pub fn level_json(&self) -> String {
        let level = self.game.session.sim.as_ref().map(|sim| LevelSnapshot::from(&sim.level));
        to_json(&level)
    }

    /// Last overlay drawn, or `null`
    pub fn overlay_json(&self) -> String {
        to_json(&self.renderer.last_overlay)
    }

    /// Sound cues since the last call, as a JSON array of names
    pub fn take_sounds(&mut self) -> String {
        let cues = std::mem::take(&mut *self.sounds.borrow_mut());
        to_json(&cues)
    }

    pub fn best_score(&self) -> u64 {
        self.game.session.best_score
    }
}
