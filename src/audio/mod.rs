//! Audio: layered procedural music plus one-shot sound effects
//!
//! The tables and the event-to-cue mapping are platform independent. Web
//! Audio synthesis lives in `web` and is only compiled for wasm32.

pub mod music;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use music::{
    LAYERS, Layer, NoteValue, ScheduledNote, Sequencer, Voice, db_to_gain, layer_target_db,
    note_to_freq,
};
#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

use rand::Rng;

use crate::lerp;
use crate::sim::{BrickKind, GameEvent, PowerUpKind};

/// Spacing between notes of the collect / level-up arpeggios
pub const ARPEGGIO_GAP: f64 = 0.1;
/// Spacing between game-over notes
pub const GAME_OVER_GAP: f64 = 0.2;
/// Length of each game-over note
pub const GAME_OVER_NOTE: f64 = 0.3;

pub const GAME_OVER_NOTES: [&str; 4] = ["C4", "G3", "E3", "C3"];
pub const LEVEL_UP_NOTES: [&str; 7] = ["C4", "E4", "G4", "C5", "E5", "G5", "C6"];

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SoundEffect {
    /// Ball hits paddle - sine blip
    PaddleHit { pitch: f32 },
    /// Ball hits wall - metallic tick
    WallHit { pitch: f32 },
    /// Ball hits a brick - triangle note
    BrickHit { freq: f32 },
    /// Four-note ascending arpeggio
    PowerUpCollected(PowerUpKind),
    LevelUp,
    /// Descending phrase
    GameOver,
}

/// Everything the audio backend can be asked to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cue {
    Play(SoundEffect),
    StartMusic,
    StopMusic,
    StartTheme(PowerUpKind),
    StopTheme(PowerUpKind),
}

/// Paddle blip pitch for a hit intensity (speed relative to base)
pub fn paddle_pitch(intensity: f32) -> f32 {
    lerp(300.0, 600.0, intensity)
}

/// Wall tick pitch for a hit intensity
pub fn wall_pitch(intensity: f32) -> f32 {
    lerp(200.0, 400.0, intensity)
}

/// Candidate note letters and octave for a brick kind
pub fn brick_scale(kind: BrickKind) -> (&'static [&'static str], i32) {
    match kind {
        BrickKind::Standard => (&["C", "E", "G", "B"], 4),
        BrickKind::Reinforced => (&["D", "F", "A"], 3),
        BrickKind::Explosive => (&["C", "E", "G"], 5),
        BrickKind::PowerUp => (&["F", "A", "C"], 4),
        BrickKind::Indestructible | BrickKind::Phase => (&["C"], 4),
    }
}

/// Pick a random note from the brick's scale
pub fn brick_note(kind: BrickKind, rng: &mut impl Rng) -> f32 {
    let (letters, octave) = brick_scale(kind);
    let letter = letters[rng.random_range(0..letters.len())];
    note_to_freq(&format!("{letter}{octave}")).unwrap_or(261.63)
}

/// Ascending arpeggio played when a power-up is picked up
pub fn collect_notes(kind: PowerUpKind) -> [&'static str; 4] {
    match kind {
        PowerUpKind::MultiBall => ["C5", "E5", "G5", "C6"],
        PowerUpKind::PaddleExpansion => ["G4", "B4", "D5", "G5"],
        PowerUpKind::SlowMotion => ["F4", "A4", "C5", "F5"],
        PowerUpKind::LaserCannon => ["D5", "F#5", "A5", "D6"],
        PowerUpKind::Fireball => ["C5", "D5", "E5", "G5"],
        PowerUpKind::MagneticPaddle => ["E5", "G5", "B5", "E6"],
        PowerUpKind::Shield => ["A4", "C5", "E5", "A5"],
        PowerUpKind::BrickBuster => ["B4", "D5", "F#5", "B5"],
    }
}

/// Translate a simulation event into audio cues
pub fn cues_for(event: &GameEvent, rng: &mut impl Rng) -> Vec<Cue> {
    match *event {
        GameEvent::PaddleHit { intensity } => vec![Cue::Play(SoundEffect::PaddleHit {
            pitch: paddle_pitch(intensity),
        })],
        GameEvent::WallHit { intensity } => vec![Cue::Play(SoundEffect::WallHit {
            pitch: wall_pitch(intensity),
        })],
        GameEvent::BrickHit { kind, .. } => vec![Cue::Play(SoundEffect::BrickHit {
            freq: brick_note(kind, rng),
        })],
        GameEvent::PowerUpCollected(kind) => vec![Cue::Play(SoundEffect::PowerUpCollected(kind))],
        GameEvent::PowerUpStarted(kind) => vec![Cue::StartTheme(kind)],
        GameEvent::PowerUpEnded(kind) => vec![Cue::StopTheme(kind)],
        GameEvent::LevelUp { .. } => vec![Cue::Play(SoundEffect::LevelUp)],
        GameEvent::GameOver { .. } => vec![Cue::Play(SoundEffect::GameOver), Cue::StopMusic],
        GameEvent::MusicStart => vec![Cue::StartMusic],
        GameEvent::BallLost | GameEvent::ShieldUsed => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_hit_pitches() {
        assert_eq!(paddle_pitch(0.0), 300.0);
        assert_eq!(paddle_pitch(1.0), 600.0);
        assert_eq!(wall_pitch(0.5), 300.0);
        // Faster than base speed goes above the range
        assert!(paddle_pitch(1.5) > 600.0);
    }

    #[test]
    fn test_brick_notes_stay_in_scale() {
        let mut rng = Pcg32::seed_from_u64(7);
        let allowed: Vec<f32> = ["D3", "F3", "A3"]
            .iter()
            .map(|n| note_to_freq(n).unwrap())
            .collect();
        for _ in 0..50 {
            let f = brick_note(BrickKind::Reinforced, &mut rng);
            assert!(allowed.iter().any(|a| (a - f).abs() < 1e-3));
        }
        let c4 = note_to_freq("C4").unwrap();
        assert!((brick_note(BrickKind::Indestructible, &mut rng) - c4).abs() < 1e-3);
    }

    #[test]
    fn test_collect_notes_open_with_theme() {
        for kind in PowerUpKind::ALL {
            let notes = collect_notes(kind);
            let theme = music::theme_pattern(kind);
            assert!(notes.iter().all(|n| note_to_freq(n).is_some()));
            for (note, step) in notes.iter().zip(theme.steps) {
                assert_eq!(*note, step[0]);
            }
        }
    }

    #[test]
    fn test_event_cues() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(
            cues_for(&GameEvent::GameOver { score: 10, new_high_score: false }, &mut rng),
            vec![Cue::Play(SoundEffect::GameOver), Cue::StopMusic]
        );
        assert_eq!(
            cues_for(&GameEvent::PowerUpStarted(PowerUpKind::Fireball), &mut rng),
            vec![Cue::StartTheme(PowerUpKind::Fireball)]
        );
        assert_eq!(
            cues_for(&GameEvent::PaddleHit { intensity: 1.0 }, &mut rng),
            vec![Cue::Play(SoundEffect::PaddleHit { pitch: 600.0 })]
        );
        assert!(cues_for(&GameEvent::BallLost, &mut rng).is_empty());
        assert_eq!(cues_for(&GameEvent::MusicStart, &mut rng), vec![Cue::StartMusic]);
    }
}
