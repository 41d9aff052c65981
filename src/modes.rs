//! Game mode machine
//!
//! Exactly one [`GameMode`] is active at a time. Modes are registered in a
//! table indexed by [`ModeId`]; `switch` runs the outgoing mode's `exit`
//! then the incoming mode's `enter`. Everything modes share across switches
//! (settings, best score, the current run) lives in [`Session`].

use serde::{Deserialize, Serialize};

use crate::input::{Action, InputSource};
use crate::renderer::{FrameSnapshot, Overlay, Renderer};
use crate::settings::Settings;
use crate::sim::{GameEvent, SimulationContext, StepOutcome, TickInput, tick};

/// Seconds before GameOver accepts confirm
pub const GAME_OVER_INPUT_DELAY: f32 = 1.0;
/// Seconds before Victory accepts confirm
pub const VICTORY_INPUT_DELAY: f32 = 2.0;

/// Step between derived run seeds (golden ratio, 64-bit)
const RUN_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeId {
    Loading,
    Menu,
    Playing,
    Paused,
    GameOver,
    Victory,
}

impl ModeId {
    pub const COUNT: usize = 6;
    pub const ALL: [ModeId; Self::COUNT] = [
        ModeId::Loading,
        ModeId::Menu,
        ModeId::Playing,
        ModeId::Paused,
        ModeId::GameOver,
        ModeId::Victory,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModeId::Loading => "loading",
            ModeId::Menu => "menu",
            ModeId::Playing => "playing",
            ModeId::Paused => "paused",
            ModeId::GameOver => "gameover",
            ModeId::Victory => "victory",
        }
    }
}

/// Asset loading progress, set by the host and polled by the Loading mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoadState {
    #[default]
    Pending,
    Ready,
    Failed,
}

/// State shared by all modes
pub struct Session {
    pub settings: Settings,
    pub load_state: LoadState,
    pub best_score: u64,
    /// Current run, `None` outside of a run
    pub sim: Option<SimulationContext>,
    /// Events since the last frame, drained by the owner
    pub events: Vec<GameEvent>,
    /// Runs started so far
    pub runs: u64,
    /// Seconds since the active mode was entered
    pub mode_time: f32,
    /// Final score of the last finished run
    pub last_score: u64,
    base_seed: u64,
}

impl Session {
    pub fn new(settings: Settings, base_seed: u64) -> Self {
        Self {
            settings,
            load_state: LoadState::Pending,
            best_score: 0,
            sim: None,
            events: Vec::new(),
            runs: 0,
            mode_time: 0.0,
            last_score: 0,
            base_seed,
        }
    }

    /// Seed for the next run: the title's fixed seed, or one derived from
    /// the base seed and the run count
    pub fn next_run_seed(&self) -> u64 {
        self.settings.seed.unwrap_or_else(|| {
            self.base_seed
                .wrapping_add(self.runs.wrapping_mul(RUN_SEED_STRIDE))
        })
    }

    /// Build a fresh run at level 0
    pub fn start_run(&mut self) {
        let seed = self.next_run_seed();
        let mut sim = SimulationContext::new(self.settings.run_config(), seed);
        self.events.extend(sim.drain_events());
        self.sim = Some(sim);
        self.runs += 1;
        log::info!(
            "Run {} started (seed {}, difficulty {})",
            self.runs,
            seed,
            self.settings.difficulty.as_str()
        );
    }

    /// Record the current run's score; reports a new best
    pub fn finish_run(&mut self) {
        let Some(sim) = &self.sim else {
            return;
        };
        self.last_score = sim.score;
        log::info!(
            "Run {} ended on level {} with score {}",
            self.runs,
            sim.level_index(),
            sim.score
        );
        if sim.score > self.best_score {
            self.best_score = sim.score;
            self.events.push(GameEvent::NewBestScore { score: sim.score });
        }
    }

    /// Score to show: the live run's, else the last finished one
    pub fn score(&self) -> u64 {
        self.sim.as_ref().map_or(self.last_score, |s| s.score)
    }
}

/// A screen of the game. Every hook but `id` is optional.
pub trait GameMode {
    fn id(&self) -> ModeId;

    fn enter(&mut self, _session: &mut Session) {}

    fn exit(&mut self, _session: &mut Session) {}

    /// One fixed step. Returning a mode switches to it.
    fn update(
        &mut self,
        _session: &mut Session,
        _input: &dyn InputSource,
        _dt: f32,
    ) -> Option<ModeId> {
        None
    }

    fn render(&self, _session: &Session, _renderer: &mut dyn Renderer) {}
}

pub struct GameModeMachine {
    modes: [Option<Box<dyn GameMode>>; ModeId::COUNT],
    current: ModeId,
}

impl GameModeMachine {
    /// Empty machine; nothing is entered until [`start`](Self::start)
    pub fn new(initial: ModeId) -> Self {
        Self {
            modes: std::array::from_fn(|_| None),
            current: initial,
        }
    }

    /// Machine with every built-in mode registered, starting in Loading
    pub fn with_builtin_modes() -> Self {
        let mut machine = Self::new(ModeId::Loading);
        machine.register(Box::new(LoadingMode));
        machine.register(Box::new(MenuMode));
        machine.register(Box::new(PlayingMode));
        machine.register(Box::new(PausedMode));
        machine.register(Box::new(GameOverMode));
        machine.register(Box::new(VictoryMode));
        machine
    }

    /// Install a mode under its id, returning the one it replaces
    pub fn register(&mut self, mode: Box<dyn GameMode>) -> Option<Box<dyn GameMode>> {
        let slot = mode.id().index();
        self.modes[slot].replace(mode)
    }

    #[inline]
    pub fn current(&self) -> ModeId {
        self.current
    }

    pub fn is_registered(&self, id: ModeId) -> bool {
        self.modes[id.index()].is_some()
    }

    /// Enter the initial mode
    pub fn start(&mut self, session: &mut Session) {
        session.mode_time = 0.0;
        if let Some(mode) = self.modes[self.current.index()].as_mut() {
            mode.enter(session);
        }
    }

    /// Leave the current mode and enter `to`. Unregistered targets are
    /// ignored and reported.
    pub fn switch(&mut self, to: ModeId, session: &mut Session) -> bool {
        if !self.is_registered(to) {
            log::warn!("Ignoring switch to unregistered mode {}", to.as_str());
            return false;
        }
        log::info!("Mode {} -> {}", self.current.as_str(), to.as_str());

        if let Some(mode) = self.modes[self.current.index()].as_mut() {
            mode.exit(session);
        }
        self.current = to;
        session.mode_time = 0.0;
        if let Some(mode) = self.modes[to.index()].as_mut() {
            mode.enter(session);
        }
        true
    }

    /// Run one fixed step of the active mode
    pub fn update(&mut self, session: &mut Session, input: &dyn InputSource, dt: f32) {
        session.mode_time += dt;
        let next = self.modes[self.current.index()]
            .as_mut()
            .and_then(|mode| mode.update(session, input, dt));
        if let Some(next) = next {
            self.switch(next, session);
        }
    }

    pub fn render(&self, session: &Session, renderer: &mut dyn Renderer) {
        if let Some(mode) = &self.modes[self.current.index()] {
            mode.render(session, renderer);
        }
    }
}

fn draw_run(session: &Session, mode: ModeId, renderer: &mut dyn Renderer) {
    if let Some(sim) = &session.sim {
        renderer.draw_world(&FrameSnapshot::capture(sim, mode, session.best_score));
    }
}

/// Waits for the host to finish loading
pub struct LoadingMode;

impl GameMode for LoadingMode {
    fn id(&self) -> ModeId {
        ModeId::Loading
    }

    fn update(
        &mut self,
        session: &mut Session,
        _input: &dyn InputSource,
        _dt: f32,
    ) -> Option<ModeId> {
        (session.load_state == LoadState::Ready).then_some(ModeId::Menu)
    }

    fn render(&self, session: &Session, renderer: &mut dyn Renderer) {
        let overlay = match session.load_state {
            LoadState::Failed => Overlay::LoadFailed,
            _ => Overlay::Loading,
        };
        renderer.draw_overlay(&overlay);
    }
}

/// Title screen
pub struct MenuMode;

impl GameMode for MenuMode {
    fn id(&self) -> ModeId {
        ModeId::Menu
    }

    fn enter(&mut self, session: &mut Session) {
        session.sim = None;
    }

    fn update(
        &mut self,
        _session: &mut Session,
        input: &dyn InputSource,
        _dt: f32,
    ) -> Option<ModeId> {
        input.just_pressed(Action::Confirm).then_some(ModeId::Playing)
    }

    fn render(&self, session: &Session, renderer: &mut dyn Renderer) {
        renderer.draw_overlay(&Overlay::Menu {
            best_score: session.best_score,
        });
    }
}

/// Runs the simulation
pub struct PlayingMode;

impl GameMode for PlayingMode {
    fn id(&self) -> ModeId {
        ModeId::Playing
    }

    fn enter(&mut self, session: &mut Session) {
        // Resuming from Paused keeps the run
        if session.sim.is_none() {
            session.start_run();
        }
    }

    fn update(
        &mut self,
        session: &mut Session,
        input: &dyn InputSource,
        dt: f32,
    ) -> Option<ModeId> {
        if input.just_pressed(Action::Pause) {
            return Some(ModeId::Paused);
        }
        let Some(sim) = session.sim.as_mut() else {
            return Some(ModeId::Menu);
        };

        let tick_input = TickInput {
            intent: input.intent(),
        };
        let outcome = tick(sim, &tick_input, dt);
        session.events.extend(sim.drain_events());

        match outcome {
            StepOutcome::Continue => None,
            StepOutcome::LevelComplete => {
                if sim.advance_level() {
                    session.events.extend(sim.drain_events());
                    None
                } else {
                    Some(ModeId::Victory)
                }
            }
            StepOutcome::PlayerDead => Some(ModeId::GameOver),
        }
    }

    fn render(&self, session: &Session, renderer: &mut dyn Renderer) {
        draw_run(session, ModeId::Playing, renderer);
    }
}

/// Frozen run under an overlay
pub struct PausedMode;

impl GameMode for PausedMode {
    fn id(&self) -> ModeId {
        ModeId::Paused
    }

    fn update(
        &mut self,
        _session: &mut Session,
        input: &dyn InputSource,
        _dt: f32,
    ) -> Option<ModeId> {
        let resume = input.just_pressed(Action::Pause) || input.just_pressed(Action::Confirm);
        resume.then_some(ModeId::Playing)
    }

    fn render(&self, session: &Session, renderer: &mut dyn Renderer) {
        draw_run(session, ModeId::Paused, renderer);
        renderer.draw_overlay(&Overlay::Paused);
    }
}

pub struct GameOverMode;

impl GameMode for GameOverMode {
    fn id(&self) -> ModeId {
        ModeId::GameOver
    }

    fn enter(&mut self, session: &mut Session) {
        session.finish_run();
    }

    fn update(
        &mut self,
        session: &mut Session,
        input: &dyn InputSource,
        _dt: f32,
    ) -> Option<ModeId> {
        let ready = session.mode_time >= GAME_OVER_INPUT_DELAY;
        (ready && input.just_pressed(Action::Confirm)).then_some(ModeId::Menu)
    }

    fn render(&self, session: &Session, renderer: &mut dyn Renderer) {
        draw_run(session, ModeId::GameOver, renderer);
        renderer.draw_overlay(&Overlay::GameOver {
            score: session.last_score,
            best_score: session.best_score,
        });
    }
}

pub struct VictoryMode;

impl GameMode for VictoryMode {
    fn id(&self) -> ModeId {
        ModeId::Victory
    }

    fn enter(&mut self, session: &mut Session) {
        let score = session.score();
        session.events.push(GameEvent::Victory { score });
        session.finish_run();
    }

    fn update(
        &mut self,
        session: &mut Session,
        input: &dyn InputSource,
        _dt: f32,
    ) -> Option<ModeId> {
        let ready = session.mode_time >= VICTORY_INPUT_DELAY;
        (ready && input.just_pressed(Action::Confirm)).then_some(ModeId::Menu)
    }

    fn render(&self, session: &Session, renderer: &mut dyn Renderer) {
        renderer.draw_overlay(&Overlay::Victory {
            score: session.last_score,
            best_score: session.best_score,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FIXED_DT;
    use crate::input::InputFrame;
    use crate::renderer::NullRenderer;

    /// Records hook calls
    struct HookLog {
        id: ModeId,
        log: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
    }

    impl GameMode for HookLog {
        fn id(&self) -> ModeId {
            self.id
        }

        fn enter(&mut self, _session: &mut Session) {
            self.log.borrow_mut().push(format!("enter {}", self.id.as_str()));
        }

        fn exit(&mut self, _session: &mut Session) {
            self.log.borrow_mut().push(format!("exit {}", self.id.as_str()));
        }
    }

    fn session() -> Session {
        let mut settings = Settings::default();
        settings.seed = Some(99);
        Session::new(settings, 0)
    }

    fn confirm() -> InputFrame {
        let mut input = InputFrame::default();
        input.press(Action::Confirm);
        input
    }

    #[test]
    fn test_switch_calls_exit_then_enter() {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut machine = GameModeMachine::new(ModeId::Menu);
        for id in [ModeId::Menu, ModeId::Playing] {
            machine.register(Box::new(HookLog { id, log: log.clone() }));
        }
        let mut s = session();
        machine.start(&mut s);
        assert!(machine.switch(ModeId::Playing, &mut s));
        assert_eq!(machine.current(), ModeId::Playing);
        assert_eq!(*log.borrow(), vec!["enter menu", "exit menu", "enter playing"]);

        // Unregistered: no-op
        assert!(!machine.switch(ModeId::Victory, &mut s));
        assert_eq!(machine.current(), ModeId::Playing);
    }

    #[test]
    fn test_default_hooks_are_noops() {
        let mut machine = GameModeMachine::new(ModeId::Paused);
        machine.register(Box::new(HookLog {
            id: ModeId::Paused,
            log: Default::default(),
        }));
        let mut s = session();
        let mut renderer = NullRenderer::default();
        machine.update(&mut s, &confirm(), FIXED_DT);
        machine.render(&s, &mut renderer);
        assert_eq!(machine.current(), ModeId::Paused);
        assert!(renderer.last_overlay.is_none());
        assert!((s.mode_time - FIXED_DT).abs() < 1e-6);
    }

    #[test]
    fn test_loading_waits_for_ready() {
        let mut machine = GameModeMachine::with_builtin_modes();
        let mut s = session();
        let idle = InputFrame::default();
        machine.start(&mut s);
        machine.update(&mut s, &idle, FIXED_DT);
        assert_eq!(machine.current(), ModeId::Loading);

        s.load_state = LoadState::Failed;
        let mut renderer = NullRenderer::default();
        machine.render(&s, &mut renderer);
        assert_eq!(renderer.last_overlay, Some(Overlay::LoadFailed));

        s.load_state = LoadState::Ready;
        machine.update(&mut s, &idle, FIXED_DT);
        assert_eq!(machine.current(), ModeId::Menu);
    }

    #[test]
    fn test_menu_to_playing_starts_run() {
        let mut machine = GameModeMachine::with_builtin_modes();
        let mut s = session();
        s.load_state = LoadState::Ready;
        machine.start(&mut s);
        machine.update(&mut s, &InputFrame::default(), FIXED_DT);
        assert_eq!(machine.current(), ModeId::Menu);

        machine.update(&mut s, &confirm(), FIXED_DT);
        assert_eq!(machine.current(), ModeId::Playing);
        let sim = s.sim.as_ref().unwrap();
        assert_eq!(sim.seed, 99);
        assert_eq!(s.runs, 1);
        assert!(s.events.contains(&GameEvent::LevelStarted { index: 0 }));
    }

    #[test]
    fn test_pause_keeps_run() {
        let mut machine = GameModeMachine::with_builtin_modes();
        let mut s = session();
        machine.switch(ModeId::Playing, &mut s);
        let idle = InputFrame::default();
        for _ in 0..10 {
            machine.update(&mut s, &idle, FIXED_DT);
        }
        let ticks = s.sim.as_ref().unwrap().time_ticks;

        let mut pause = InputFrame::default();
        pause.press(Action::Pause);
        machine.update(&mut s, &pause, FIXED_DT);
        assert_eq!(machine.current(), ModeId::Paused);
        machine.update(&mut s, &idle, FIXED_DT);
        assert_eq!(s.sim.as_ref().unwrap().time_ticks, ticks);

        let mut renderer = NullRenderer::default();
        machine.render(&s, &mut renderer);
        assert_eq!(renderer.last_overlay, Some(Overlay::Paused));
        assert_eq!(renderer.last_world.as_ref().map(|f| f.mode), Some(ModeId::Paused));

        machine.update(&mut s, &pause, FIXED_DT);
        assert_eq!(machine.current(), ModeId::Playing);
        assert_eq!(s.runs, 1);
        assert_eq!(s.sim.as_ref().unwrap().time_ticks, ticks);
    }

    #[test]
    fn test_player_death_reaches_game_over() {
        let mut machine = GameModeMachine::with_builtin_modes();
        let mut s = session();
        machine.switch(ModeId::Playing, &mut s);
        {
            let sim = s.sim.as_mut().unwrap();
            sim.score = 300;
            sim.player.hp = 1;
            sim.player.take_damage(1, 0.0);
        }
        let idle = InputFrame::default();
        for _ in 0..120 {
            machine.update(&mut s, &idle, FIXED_DT);
            if machine.current() != ModeId::Playing {
                break;
            }
        }
        assert_eq!(machine.current(), ModeId::GameOver);
        assert_eq!(s.last_score, 300);
        assert_eq!(s.best_score, 300);
        assert!(s.events.contains(&GameEvent::NewBestScore { score: 300 }));
    }

    #[test]
    fn test_game_over_confirm_delay() {
        let mut machine = GameModeMachine::with_builtin_modes();
        let mut s = session();
        machine.switch(ModeId::Playing, &mut s);
        machine.switch(ModeId::GameOver, &mut s);

        machine.update(&mut s, &confirm(), FIXED_DT);
        assert_eq!(machine.current(), ModeId::GameOver);

        let idle = InputFrame::default();
        while s.mode_time < GAME_OVER_INPUT_DELAY {
            machine.update(&mut s, &idle, FIXED_DT);
        }
        machine.update(&mut s, &confirm(), FIXED_DT);
        assert_eq!(machine.current(), ModeId::Menu);
        assert!(s.sim.is_none());
    }

    #[test]
    fn test_last_level_goes_to_victory() {
        let mut machine = GameModeMachine::with_builtin_modes();
        let mut s = session();
        s.settings.run.level_count = 1;
        machine.switch(ModeId::Playing, &mut s);
        {
            let sim = s.sim.as_mut().unwrap();
            let exit = sim.level.exit_feet();
            sim.level.open_exit();
            sim.player.place_feet(exit);
        }
        machine.update(&mut s, &InputFrame::default(), FIXED_DT);
        assert_eq!(machine.current(), ModeId::Victory);
        assert!(s.last_score > 0);
        assert!(
            s.events
                .iter()
                .any(|e| matches!(e, GameEvent::Victory { .. }))
        );
    }

    #[test]
    fn test_victory_confirm_delay() {
        let mut machine = GameModeMachine::with_builtin_modes();
        let mut s = session();
        machine.switch(ModeId::Playing, &mut s);
        machine.switch(ModeId::Victory, &mut s);

        let idle = InputFrame::default();
        while s.mode_time < GAME_OVER_INPUT_DELAY {
            machine.update(&mut s, &idle, FIXED_DT);
        }
        // Past the game over delay but not the victory one
        machine.update(&mut s, &confirm(), FIXED_DT);
        assert_eq!(machine.current(), ModeId::Victory);

        while s.mode_time < VICTORY_INPUT_DELAY {
            machine.update(&mut s, &idle, FIXED_DT);
        }
        machine.update(&mut s, &confirm(), FIXED_DT);
        assert_eq!(machine.current(), ModeId::Menu);
    }

    #[test]
    fn test_run_seeds_differ_without_fixed_seed() {
        let mut s = Session::new(Settings::default(), 7);
        let first = s.next_run_seed();
        s.start_run();
        assert_eq!(s.sim.as_ref().unwrap().seed, first);
        assert_ne!(s.next_run_seed(), first);
    }
}
