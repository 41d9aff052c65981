//! Frame driver
//!
//! [`Game`] owns the mode machine, the session and the collaborators. The
//! host calls [`Game::frame`] once per rendered frame with the real elapsed
//! time; the clock turns that into fixed steps, events go out to audio and
//! storage, and the active mode draws.

use crate::audio::{AudioSink, SoundEffect};
use crate::clock::SimulationClock;
use crate::input::{Action, Autopilot, InputFrame};
use crate::modes::{GameModeMachine, LoadState, ModeId, Session};
use crate::persistence::BestScoreStore;
use crate::renderer::{FrameSnapshot, Renderer};
use crate::settings::Settings;
use crate::sim::GameEvent;

pub struct Game {
    pub session: Session,
    pub machine: GameModeMachine,
    pub clock: SimulationClock,
    /// Written by the host between frames
    pub input: InputFrame,
    store: Box<dyn BestScoreStore>,
    audio: Box<dyn AudioSink>,
}

impl Game {
    pub fn new(
        settings: Settings,
        base_seed: u64,
        mut store: Box<dyn BestScoreStore>,
        audio: Box<dyn AudioSink>,
    ) -> Self {
        let mut session = Session::new(settings, base_seed);
        session.best_score = store.read_best_score();
        log::info!(
            "{} ready, best score {}",
            session.settings.title,
            session.best_score
        );

        let mut machine = GameModeMachine::with_builtin_modes();
        machine.start(&mut session);

        Self {
            session,
            machine,
            clock: SimulationClock::default(),
            input: InputFrame::default(),
            store,
            audio,
        }
    }

    #[inline]
    pub fn mode(&self) -> ModeId {
        self.machine.current()
    }

    pub fn set_load_state(&mut self, state: LoadState) {
        if state == LoadState::Failed {
            log::warn!("Asset loading failed");
        }
        self.session.load_state = state;
    }

    pub fn key_down(&mut self, action: Action) {
        self.input.press(action);
    }

    pub fn key_up(&mut self, action: Action) {
        self.input.release(action);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.audio.set_muted(muted);
    }

    /// Window lost focus: drop held keys and pause a live run
    pub fn focus_lost(&mut self) {
        self.input.clear();
        self.clock.reset();
        if self.mode() == ModeId::Playing {
            log::info!("Auto-paused (focus lost)");
            self.machine.switch(ModeId::Paused, &mut self.session);
        }
    }

    /// Let the autopilot write this frame's input
    pub fn drive(&mut self, pilot: &mut Autopilot) {
        pilot.drive(self.mode(), self.session.sim.as_ref(), &mut self.input);
    }

    /// Advance by `real_dt` seconds of wall time and draw. Returns the
    /// number of fixed steps run.
    pub fn frame(&mut self, real_dt: f32, renderer: &mut dyn Renderer) -> u32 {
        let Self {
            session,
            machine,
            clock,
            input,
            ..
        } = self;
        let steps = clock.advance(real_dt, |dt| {
            machine.update(session, &*input, dt);
            input.end_step();
        });

        self.dispatch_events();

        self.machine.render(&self.session, renderer);
        renderer.present();
        steps
    }

    /// What a renderer would be handed this frame, if a run is live
    pub fn snapshot(&self) -> Option<FrameSnapshot> {
        let sim = self.session.sim.as_ref()?;
        Some(FrameSnapshot::capture(sim, self.mode(), self.session.best_score))
    }

    fn dispatch_events(&mut self) {
        for event in self.session.events.drain(..) {
            if let GameEvent::NewBestScore { score } = event {
                self.store.write_best_score(score);
            }
            if let GameEvent::EnemyKilled { id, archetype, score } = event {
                log::debug!("Enemy {} ({}) killed for {}", id, archetype.as_str(), score);
            }
            if let Some(effect) = SoundEffect::for_event(&event) {
                self.audio.play(effect);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentAudio;
    use crate::consts::FIXED_DT;
    use crate::persistence::MemoryStore;
    use crate::renderer::{NullRenderer, Overlay};

    fn game(seed: u64) -> Game {
        let mut settings = Settings::default();
        settings.seed = Some(seed);
        let store = MemoryStore {
            best: 250,
            writes: 0,
        };
        Game::new(settings, 0, Box::new(store), Box::new(SilentAudio))
    }

    #[test]
    fn test_boot_to_menu() {
        let mut g = game(1);
        let mut renderer = NullRenderer::default();
        assert_eq!(g.session.best_score, 250);

        g.frame(FIXED_DT, &mut renderer);
        assert_eq!(g.mode(), ModeId::Loading);
        assert_eq!(renderer.last_overlay, Some(Overlay::Loading));

        g.set_load_state(LoadState::Ready);
        g.frame(FIXED_DT, &mut renderer);
        assert_eq!(g.mode(), ModeId::Menu);
        assert_eq!(renderer.last_overlay, Some(Overlay::Menu { best_score: 250 }));
        assert_eq!(renderer.frames, 2);
    }

    #[test]
    fn test_press_survives_until_a_step_runs() {
        let mut g = game(1);
        let mut renderer = NullRenderer::default();
        g.set_load_state(LoadState::Ready);
        g.frame(FIXED_DT, &mut renderer);

        g.key_down(Action::Confirm);
        // Too short for a step: the press waits
        assert_eq!(g.frame(FIXED_DT * 0.25, &mut renderer), 0);
        assert_eq!(g.mode(), ModeId::Menu);
        g.frame(FIXED_DT, &mut renderer);
        assert_eq!(g.mode(), ModeId::Playing);
        assert!(g.snapshot().is_some());
        assert!(g.session.events.is_empty());
    }

    #[test]
    fn test_focus_lost_pauses() {
        let mut g = game(1);
        g.machine.switch(ModeId::Playing, &mut g.session);
        g.key_down(Action::Right);
        g.focus_lost();
        assert_eq!(g.mode(), ModeId::Paused);
        assert_eq!(g.input, InputFrame::default());
    }

    #[test]
    fn test_new_best_score_is_stored() {
        let mut g = game(1);
        let mut renderer = NullRenderer::default();
        g.machine.switch(ModeId::Playing, &mut g.session);
        if let Some(sim) = g.session.sim.as_mut() {
            sim.score = 900;
        }
        g.machine.switch(ModeId::GameOver, &mut g.session);
        g.frame(FIXED_DT, &mut renderer);
        assert_eq!(g.store.read_best_score(), 900);
        assert_eq!(
            renderer.last_overlay,
            Some(Overlay::GameOver {
                score: 900,
                best_score: 900
            })
        );
    }

    #[test]
    fn test_lower_score_keeps_best() {
        let mut g = game(1);
        let mut renderer = NullRenderer::default();
        g.machine.switch(ModeId::Playing, &mut g.session);
        if let Some(sim) = g.session.sim.as_mut() {
            sim.score = 100;
        }
        g.machine.switch(ModeId::GameOver, &mut g.session);
        g.frame(FIXED_DT, &mut renderer);
        assert_eq!(g.store.read_best_score(), 250);
        assert_eq!(g.session.best_score, 250);
    }

    fn autoplay(seed: u64, frames: u32) -> Game {
        let mut g = game(seed);
        let mut renderer = NullRenderer::default();
        let mut pilot = Autopilot::new();
        g.set_load_state(LoadState::Ready);
        for _ in 0..frames {
            g.drive(&mut pilot);
            g.frame(FIXED_DT, &mut renderer);
        }
        g
    }

    #[test]
    fn test_autopilot_is_deterministic() {
        let a = autoplay(42, 900);
        let b = autoplay(42, 900);
        assert_eq!(a.mode(), b.mode());
        assert_eq!(a.session.runs, b.session.runs);
        assert!(a.session.runs >= 1);
        match (&a.session.sim, &b.session.sim) {
            (Some(sa), Some(sb)) => {
                assert_eq!(sa.time_ticks, sb.time_ticks);
                assert_eq!(sa.score, sb.score);
                assert_eq!(sa.player.pos, sb.player.pos);
                assert_eq!(sa.enemies.len(), sb.enemies.len());
            }
            (None, None) => {}
            _ => panic!("runs diverged"),
        }
    }
}
