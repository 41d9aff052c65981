//! Audio cues
//!
//! The simulation never plays sound itself. It emits [`GameEvent`]s; the
//! game maps them to [`SoundEffect`]s and hands those to whatever
//! [`AudioSink`] the host installed (Web Audio on the page, nothing in the
//! headless runner).

use serde::{Deserialize, Serialize};

use crate::sim::{GameEvent, PickupKind, Side};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    Jump,
    Dash,
    /// Player fires
    Shoot,
    /// Enemy fires
    EnemyShoot,
    /// Player takes a hit
    Hurt,
    /// Enemy takes a hit without dying
    EnemyHit,
    /// Enemy destroyed
    Explosion,
    PickupCollect,
    Heal,
    /// Shot level raised
    PowerUp,
    /// Exit door unlocked
    DoorOpen,
    LevelClear,
    GameOver,
    Victory,
    /// New best score
    HighScore,
}

impl SoundEffect {
    /// Cue for a simulation event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        Some(match event {
            GameEvent::Jumped => SoundEffect::Jump,
            GameEvent::Dashed => SoundEffect::Dash,
            GameEvent::Shot { side: Side::Player } => SoundEffect::Shoot,
            GameEvent::Shot { side: Side::Enemy } => SoundEffect::EnemyShoot,
            GameEvent::PlayerHurt { .. } => SoundEffect::Hurt,
            GameEvent::PlayerDied => SoundEffect::GameOver,
            GameEvent::EnemyHurt { .. } => SoundEffect::EnemyHit,
            GameEvent::EnemyKilled { .. } => SoundEffect::Explosion,
            GameEvent::PickupCollected {
                kind: PickupKind::Gem,
            } => SoundEffect::PickupCollect,
            GameEvent::PickupCollected {
                kind: PickupKind::Heart,
            } => SoundEffect::Heal,
            GameEvent::ShotLevelUp { .. } => SoundEffect::PowerUp,
            GameEvent::ExitOpened => SoundEffect::DoorOpen,
            GameEvent::LevelComplete { .. } => SoundEffect::LevelClear,
            GameEvent::Victory { .. } => SoundEffect::Victory,
            GameEvent::NewBestScore { .. } => SoundEffect::HighScore,
            GameEvent::LevelStarted { .. } => return None,
        })
    }
}

/// Something that can play cues
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);

    /// Mute/unmute all audio
    fn set_muted(&mut self, _muted: bool) {}
}

/// Plays nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&mut self, _effect: SoundEffect) {}
}

/// Keeps every cue it is asked to play
#[derive(Debug, Default, Clone)]
pub struct RecordingAudio {
    pub played: Vec<SoundEffect>,
    pub muted: bool,
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, effect: SoundEffect) {
        if !self.muted {
            self.played.push(effect);
        }
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Archetype;

    #[test]
    fn test_event_cues() {
        assert_eq!(
            SoundEffect::for_event(&GameEvent::Shot { side: Side::Enemy }),
            Some(SoundEffect::EnemyShoot)
        );
        assert_eq!(
            SoundEffect::for_event(&GameEvent::EnemyKilled {
                id: 3,
                archetype: Archetype::Charger,
                score: 200
            }),
            Some(SoundEffect::Explosion)
        );
        assert_eq!(
            SoundEffect::for_event(&GameEvent::PickupCollected {
                kind: PickupKind::Heart
            }),
            Some(SoundEffect::Heal)
        );
        assert_eq!(
            SoundEffect::for_event(&GameEvent::ShotLevelUp { level: 2 }),
            Some(SoundEffect::PowerUp)
        );
        assert_eq!(SoundEffect::for_event(&GameEvent::LevelStarted { index: 0 }), None);
    }

    #[test]
    fn test_muted_recording_drops_cues() {
        let mut audio = RecordingAudio::default();
        audio.play(SoundEffect::Jump);
        audio.set_muted(true);
        audio.play(SoundEffect::Dash);
        assert_eq!(audio.played, vec![SoundEffect::Jump]);
    }
}
