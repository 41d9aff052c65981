//! Logical input
//!
//! Hosts translate keys/buttons into [`Action`]s and feed them to an
//! [`InputFrame`]. Modes only see the [`InputSource`] trait: "is it held"
//! and "was it pressed since the last step".

use serde::{Deserialize, Serialize};

use crate::modes::ModeId;
use crate::sim::collision::CollisionWorld;
use crate::sim::{PlayerIntent, SimulationContext, physics};

/// A logical control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Left,
    Right,
    Jump,
    Shoot,
    Dash,
    Pause,
    Confirm,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Left,
        Action::Right,
        Action::Jump,
        Action::Shoot,
        Action::Dash,
        Action::Pause,
        Action::Confirm,
    ];

    #[inline]
    fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Default keyboard binding (DOM `KeyboardEvent.code` names)
    pub fn from_key_code(code: &str) -> Option<Self> {
        match code {
            "ArrowLeft" | "KeyA" => Some(Action::Left),
            "ArrowRight" | "KeyD" => Some(Action::Right),
            "ArrowUp" | "KeyW" | "Space" => Some(Action::Jump),
            "KeyX" | "KeyJ" => Some(Action::Shoot),
            "ShiftLeft" | "ShiftRight" | "KeyK" => Some(Action::Dash),
            "Escape" | "KeyP" => Some(Action::Pause),
            "Enter" => Some(Action::Confirm),
            _ => None,
        }
    }
}

/// Read side of input, as seen by game modes
pub trait InputSource {
    fn held(&self, action: Action) -> bool;
    /// Went down since the last step
    fn just_pressed(&self, action: Action) -> bool;

    /// Horizontal axis from Left/Right
    fn axis_x(&self) -> f32 {
        (self.held(Action::Right) as i32 - self.held(Action::Left) as i32) as f32
    }

    /// Player controls for the playing mode
    fn intent(&self) -> PlayerIntent {
        PlayerIntent {
            move_x: self.axis_x(),
            jump: self.just_pressed(Action::Jump),
            dash: self.just_pressed(Action::Dash),
            // Holding fire auto-repeats at the shot cooldown
            shoot: self.held(Action::Shoot),
        }
    }
}

/// Held and just-pressed state, bit per [`Action`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputFrame {
    held: u16,
    pressed: u16,
}

impl InputFrame {
    pub fn press(&mut self, action: Action) {
        if self.held & action.bit() == 0 {
            self.pressed |= action.bit();
        }
        self.held |= action.bit();
    }

    pub fn release(&mut self, action: Action) {
        self.held &= !action.bit();
    }

    /// Set an action to exactly `down`
    pub fn set(&mut self, action: Action, down: bool) {
        if down {
            self.press(action);
        } else {
            self.release(action);
        }
    }

    /// Clear one-shot presses; call after each simulation step
    pub fn end_step(&mut self) {
        self.pressed = 0;
    }

    /// Release everything (focus loss)
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl InputSource for InputFrame {
    fn held(&self, action: Action) -> bool {
        self.held & action.bit() != 0
    }

    fn just_pressed(&self, action: Action) -> bool {
        self.pressed & action.bit() != 0
    }
}

/// Plays the game on its own: runs right, jumps walls/pits/enemies, shoots
/// whatever is ahead and confirms through menus. Drives the headless runner
/// and idle/demo play.
#[derive(Debug, Clone, Default)]
pub struct Autopilot {
    frames: u64,
}

/// How far ahead the autopilot looks for enemies (pixels)
const LOOKAHEAD: f32 = 120.0;

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite `frame` for the next rendered frame
    pub fn drive(&mut self, mode: ModeId, sim: Option<&SimulationContext>, frame: &mut InputFrame) {
        self.frames += 1;
        frame.clear();

        match mode {
            ModeId::Menu | ModeId::GameOver | ModeId::Victory => {
                // Tap confirm twice a second
                frame.set(Action::Confirm, self.frames % 30 == 0);
            }
            ModeId::Paused => frame.set(Action::Pause, self.frames % 30 == 0),
            ModeId::Playing => {
                if let Some(sim) = sim {
                    self.play(sim, frame);
                }
            }
            ModeId::Loading => {}
        }
    }

    fn play(&self, sim: &SimulationContext, frame: &mut InputFrame) {
        let player = &sim.player;
        if player.is_dying() {
            return;
        }
        let world = CollisionWorld::new(&sim.level.grid, sim.config.collision);
        let dir = if sim.level.exit_feet().x >= player.feet().x {
            1.0
        } else {
            -1.0
        };
        frame.set(if dir > 0.0 { Action::Right } else { Action::Left }, true);

        let center = player.center();
        let enemy_ahead = sim.enemies.iter().any(|e| {
            let dx = (e.center().x - center.x) * dir;
            !e.is_dying() && dx > 0.0 && dx < LOOKAHEAD && (e.center().y - center.y).abs() < 24.0
        });
        frame.set(Action::Shoot, enemy_ahead);

        let blocked = player.contacts.wall_toward(dir);
        let gap = player.contacts.grounded && physics::ledge_ahead(player, &world, dir);
        let close_enemy = sim.enemies.iter().any(|e| {
            let dx = (e.center().x - center.x) * dir;
            !e.is_dying() && dx > 0.0 && dx < 28.0
        });
        frame.set(Action::Jump, blocked || gap || close_enemy);
        frame.set(Action::Dash, gap && sim.config.physics.dash_enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_edges_once() {
        let mut input = InputFrame::default();
        input.press(Action::Jump);
        assert!(input.held(Action::Jump));
        assert!(input.just_pressed(Action::Jump));

        input.end_step();
        assert!(input.held(Action::Jump));
        assert!(!input.just_pressed(Action::Jump));

        // Key repeat while held doesn't edge again
        input.press(Action::Jump);
        assert!(!input.just_pressed(Action::Jump));

        input.release(Action::Jump);
        input.press(Action::Jump);
        assert!(input.just_pressed(Action::Jump));
    }

    #[test]
    fn test_intent_from_input() {
        let mut input = InputFrame::default();
        input.press(Action::Left);
        input.press(Action::Shoot);
        let intent = input.intent();
        assert_eq!(intent.move_x, -1.0);
        assert!(intent.shoot);
        assert!(!intent.jump);

        input.press(Action::Right);
        assert_eq!(input.intent().move_x, 0.0);
    }

    #[test]
    fn test_key_codes() {
        assert_eq!(Action::from_key_code("ArrowLeft"), Some(Action::Left));
        assert_eq!(Action::from_key_code("Space"), Some(Action::Jump));
        assert_eq!(Action::from_key_code("F12"), None);
    }

    #[test]
    fn test_autopilot_runs_toward_exit() {
        let sim = SimulationContext::new(crate::sim::RunConfig::default(), 5);
        let mut pilot = Autopilot::new();
        let mut frame = InputFrame::default();
        pilot.drive(ModeId::Playing, Some(&sim), &mut frame);
        assert!(frame.held(Action::Right));
        assert!(!frame.held(Action::Left));

        pilot.drive(ModeId::Loading, None, &mut frame);
        assert_eq!(frame, InputFrame::default());
    }
}
