//! Note math, intensity layers and the lookahead sequencer
//!
//! Everything here is plain data so it runs (and is tested) off the browser.
//! The Web Audio backend asks [`Sequencer::pump`] for the notes that fall
//! inside its lookahead window and turns them into oscillators.

use crate::sim::PowerUpKind;

/// Tempo of every pattern
pub const BPM: f64 = 120.0;

/// Volume a silenced layer ramps to
pub const SILENT_DB: f32 = -60.0;
/// Quietest audible layer volume
pub const LAYER_FLOOR_DB: f32 = -30.0;
/// Range added on top of the floor as intensity rises
pub const LAYER_RANGE_DB: f32 = 15.0;
/// Ramp time when a layer fades in or changes level
pub const RAMP_IN_SECS: f64 = 1.0;
/// Ramp time when a layer drops out
pub const RAMP_OUT_SECS: f64 = 0.5;

/// Volume of a power-up theme motif
pub const THEME_DB: f32 = -20.0;

/// Musical note lengths used by the patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteValue {
    Measure,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
}

impl NoteValue {
    /// Length in seconds at [`BPM`]
    pub fn seconds(self) -> f64 {
        let beat = 60.0 / BPM;
        match self {
            NoteValue::Measure => beat * 4.0,
            NoteValue::Half => beat * 2.0,
            NoteValue::Quarter => beat,
            NoteValue::Eighth => beat / 2.0,
            NoteValue::Sixteenth => beat / 4.0,
        }
    }

    /// Parse the `1m` / `2n` / `4n` / `8n` / `16n` shorthand
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1m" => Some(NoteValue::Measure),
            "2n" => Some(NoteValue::Half),
            "4n" => Some(NoteValue::Quarter),
            "8n" => Some(NoteValue::Eighth),
            "16n" => Some(NoteValue::Sixteenth),
            _ => None,
        }
    }
}

/// Frequency in Hz of a note name such as `C4` or `F#5` (A4 = 440 Hz)
pub fn note_to_freq(name: &str) -> Option<f32> {
    let mut chars = name.chars();
    let letter = chars.next()?;
    let base: i32 = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let rest = chars.as_str();
    let (accidental, octave) = match rest.as_bytes().first() {
        Some(b'#') => (1, &rest[1..]),
        Some(b'b') => (-1, &rest[1..]),
        _ => (0, rest),
    };
    let octave: i32 = octave.parse().ok()?;
    let midi = (octave + 1) * 12 + base + accidental;
    Some(440.0 * 2f32.powf((midi - 69) as f32 / 12.0))
}

/// Decibels to linear gain
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Instrument a scheduled note is played on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Voice {
    /// Sustained sine chords
    Pad,
    /// Pitch-dropping kick
    Membrane,
    /// Square-wave arpeggio
    Arpeggio,
    /// Frequency-modulated lead
    Fm,
    /// Looping motif of an active power-up
    Theme(PowerUpKind),
}

/// A looping step sequence
#[derive(Debug, Clone, Copy)]
pub struct Pattern {
    pub voice: Voice,
    /// One entry per step; an empty step is a rest, several notes a chord
    pub steps: &'static [&'static [&'static str]],
    /// Time between steps
    pub step: NoteValue,
    /// How long each note sounds
    pub hold: NoteValue,
}

/// A background music layer and the intensity at which it joins in
#[derive(Debug, Clone, Copy)]
pub struct Layer {
    pub pattern: Pattern,
    pub min_intensity: f32,
}

impl Layer {
    /// Target volume in dB for a music intensity in [0, 1]
    pub fn target_db(&self, intensity: f32) -> f32 {
        layer_target_db(intensity, self.min_intensity)
    }
}

/// Layer volume: silent below its threshold, rising 15 dB over the next 0.5
pub fn layer_target_db(intensity: f32, min_intensity: f32) -> f32 {
    if intensity >= min_intensity {
        let level = ((intensity - min_intensity) * 2.0).min(1.0);
        LAYER_FLOOR_DB + level * LAYER_RANGE_DB
    } else {
        SILENT_DB
    }
}

/// Seconds the layer takes to reach its new target
pub fn layer_ramp_secs(intensity: f32, min_intensity: f32) -> f64 {
    if intensity >= min_intensity {
        RAMP_IN_SECS
    } else {
        RAMP_OUT_SECS
    }
}

pub const LAYERS: [Layer; 4] = [
    Layer {
        pattern: Pattern {
            voice: Voice::Pad,
            steps: &[
                &["C2", "G2", "C3"],
                &["A1", "E2", "A2"],
                &["F1", "C2", "F2"],
                &["G1", "D2", "G2"],
            ],
            step: NoteValue::Measure,
            hold: NoteValue::Half,
        },
        min_intensity: 0.0,
    },
    Layer {
        pattern: Pattern {
            voice: Voice::Membrane,
            steps: &[&["C1"], &[], &["G1"], &[], &["C1"], &[], &["G1"], &["C1"]],
            step: NoteValue::Eighth,
            hold: NoteValue::Sixteenth,
        },
        min_intensity: 0.2,
    },
    Layer {
        pattern: Pattern {
            voice: Voice::Arpeggio,
            steps: &[
                &["C4"],
                &["E4"],
                &["G4"],
                &["B4"],
                &["A4"],
                &["F4"],
                &["D4"],
                &["E4"],
            ],
            step: NoteValue::Sixteenth,
            hold: NoteValue::Sixteenth,
        },
        min_intensity: 0.4,
    },
    Layer {
        pattern: Pattern {
            voice: Voice::Fm,
            steps: &[
                &["C5"],
                &["G4"],
                &["A4"],
                &["E4"],
                &["G4"],
                &["C5"],
                &["B4"],
                &["G4"],
            ],
            step: NoteValue::Quarter,
            hold: NoteValue::Eighth,
        },
        min_intensity: 0.7,
    },
];

/// Three-note motif that loops while a power-up is active
pub fn theme_pattern(kind: PowerUpKind) -> Pattern {
    let steps: &'static [&'static [&'static str]] = match kind {
        PowerUpKind::MultiBall => &[&["C5"], &["E5"], &["G5"]],
        PowerUpKind::PaddleExpansion => &[&["G4"], &["B4"], &["D5"]],
        PowerUpKind::SlowMotion => &[&["F4"], &["A4"], &["C5"]],
        PowerUpKind::LaserCannon => &[&["D5"], &["F#5"], &["A5"]],
        PowerUpKind::Fireball => &[&["C5"], &["D5"], &["E5"]],
        PowerUpKind::MagneticPaddle => &[&["E5"], &["G5"], &["B5"]],
        PowerUpKind::Shield => &[&["A4"], &["C5"], &["E5"]],
        PowerUpKind::BrickBuster => &[&["B4"], &["D5"], &["F#5"]],
    };
    Pattern {
        voice: Voice::Theme(kind),
        steps,
        step: NoteValue::Eighth,
        hold: NoteValue::Sixteenth,
    }
}

/// A note ready to hand to the synthesizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledNote {
    pub voice: Voice,
    pub freq: f32,
    /// Start time on the audio clock (seconds)
    pub time: f64,
    pub duration: f64,
}

#[derive(Debug, Clone)]
struct Track {
    pattern: Pattern,
    index: usize,
    next_time: f64,
}

impl Track {
    fn new(pattern: Pattern, now: f64) -> Self {
        Self {
            pattern,
            index: 0,
            next_time: now,
        }
    }

    fn collect_until(&mut self, horizon: f64, out: &mut Vec<ScheduledNote>) {
        let step = self.pattern.step.seconds();
        let hold = self.pattern.hold.seconds();
        while self.next_time < horizon {
            let notes = self.pattern.steps[self.index % self.pattern.steps.len()];
            for note in notes {
                if let Some(freq) = note_to_freq(note) {
                    out.push(ScheduledNote {
                        voice: self.pattern.voice,
                        freq,
                        time: self.next_time,
                        duration: hold,
                    });
                }
            }
            self.index = (self.index + 1) % self.pattern.steps.len();
            self.next_time += step;
        }
    }
}

/// Lookahead scheduler for the music layers and power-up themes
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    music: Vec<Track>,
    themes: Vec<(PowerUpKind, Track)>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start all music layers from their first step
    pub fn start_music(&mut self, now: f64) {
        self.music = LAYERS
            .iter()
            .map(|layer| Track::new(layer.pattern, now))
            .collect();
    }

    pub fn stop_music(&mut self) {
        self.music.clear();
    }

    pub fn music_playing(&self) -> bool {
        !self.music.is_empty()
    }

    /// Start a power-up motif; an already running motif keeps its place
    pub fn start_theme(&mut self, kind: PowerUpKind, now: f64) -> bool {
        if self.theme_playing(kind) {
            return false;
        }
        self.themes.push((kind, Track::new(theme_pattern(kind), now)));
        true
    }

    pub fn stop_theme(&mut self, kind: PowerUpKind) -> bool {
        let before = self.themes.len();
        self.themes.retain(|(k, _)| *k != kind);
        self.themes.len() != before
    }

    pub fn stop_all_themes(&mut self) {
        self.themes.clear();
    }

    pub fn theme_playing(&self, kind: PowerUpKind) -> bool {
        self.themes.iter().any(|(k, _)| *k == kind)
    }

    /// Notes starting before `now + lookahead`, in no particular order.
    /// A track that fell far behind (tab hidden) skips ahead to `now`.
    pub fn pump(&mut self, now: f64, lookahead: f64) -> Vec<ScheduledNote> {
        let horizon = now + lookahead;
        let mut out = Vec::new();
        let tracks = self
            .music
            .iter_mut()
            .chain(self.themes.iter_mut().map(|(_, track)| track));
        for track in tracks {
            if track.next_time < now - lookahead {
                track.next_time = now;
            }
            track.collect_until(horizon, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_note_to_freq() {
        assert!((note_to_freq("A4").unwrap() - 440.0).abs() < 0.01);
        assert!((note_to_freq("A5").unwrap() - 880.0).abs() < 0.01);
        assert!((note_to_freq("C4").unwrap() - 261.63).abs() < 0.01);
        assert!((note_to_freq("F#5").unwrap() - 739.99).abs() < 0.01);
        assert!((note_to_freq("C1").unwrap() - 32.70).abs() < 0.01);
        assert_eq!(note_to_freq("H4"), None);
        assert_eq!(note_to_freq("C"), None);
        assert_eq!(note_to_freq(""), None);
    }

    #[test]
    fn test_note_values() {
        assert_eq!(NoteValue::parse("1m").unwrap().seconds(), 2.0);
        assert_eq!(NoteValue::parse("2n").unwrap().seconds(), 1.0);
        assert_eq!(NoteValue::parse("4n").unwrap().seconds(), 0.5);
        assert_eq!(NoteValue::parse("8n").unwrap().seconds(), 0.25);
        assert_eq!(NoteValue::parse("16n").unwrap().seconds(), 0.125);
        assert_eq!(NoteValue::parse("3n"), None);
    }

    #[test]
    fn test_layer_volumes() {
        // Base layer at rest is at the floor
        assert_eq!(layer_target_db(0.0, 0.0), -30.0);
        // Rhythm joins at 0.2, full at 0.7
        assert_eq!(layer_target_db(0.1, 0.2), SILENT_DB);
        assert!((layer_target_db(0.45, 0.2) - (-22.5)).abs() < 1e-4);
        assert_eq!(layer_target_db(1.0, 0.2), -15.0);
        // Melody only near the top
        assert_eq!(layer_target_db(0.69, 0.7), SILENT_DB);
        assert_eq!(layer_ramp_secs(0.69, 0.7), RAMP_OUT_SECS);
        assert_eq!(layer_ramp_secs(0.7, 0.7), RAMP_IN_SECS);
    }

    #[test]
    fn test_db_to_gain() {
        assert!((db_to_gain(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_gain(-20.0) - 0.1).abs() < 1e-6);
        assert!(db_to_gain(SILENT_DB) < 0.002);
    }

    #[test]
    fn test_all_pattern_notes_parse() {
        for layer in &LAYERS {
            for step in layer.pattern.steps {
                for note in *step {
                    assert!(note_to_freq(note).is_some(), "bad note {note}");
                }
            }
        }
        for kind in PowerUpKind::ALL {
            let pattern = theme_pattern(kind);
            assert_eq!(pattern.steps.len(), 3);
            for step in pattern.steps {
                assert!(note_to_freq(step[0]).is_some());
            }
        }
    }

    #[test]
    fn test_sequencer_schedules_one_measure() {
        let mut seq = Sequencer::new();
        seq.start_music(10.0);
        let notes = seq.pump(10.0, 2.0 - 1e-6);

        // One pad chord of three notes
        let pads: Vec<_> = notes.iter().filter(|n| n.voice == Voice::Pad).collect();
        assert_eq!(pads.len(), 3);
        assert!(pads.iter().all(|n| n.time == 10.0 && n.duration == 1.0));

        // 8 rhythm steps with 3 rests
        let kicks = notes.iter().filter(|n| n.voice == Voice::Membrane).count();
        assert_eq!(kicks, 5);

        // 16 arpeggio steps, 4 melody steps
        assert_eq!(notes.iter().filter(|n| n.voice == Voice::Arpeggio).count(), 16);
        assert_eq!(notes.iter().filter(|n| n.voice == Voice::Fm).count(), 4);

        // Nothing is scheduled twice
        assert!(seq.pump(10.5, 0.1).is_empty());
    }

    #[test]
    fn test_sequencer_loops_pattern() {
        let mut seq = Sequencer::new();
        seq.start_music(0.0);
        // Two measures: pad plays chord 1 then chord 2
        let notes = seq.pump(0.0, 4.0 - 1e-6);
        let mut pads: Vec<_> = notes
            .iter()
            .filter(|n| n.voice == Voice::Pad)
            .map(|n| (n.time, n.freq))
            .collect();
        pads.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(pads.len(), 6);
        assert_eq!(pads[3].0, 2.0);
        let a1 = note_to_freq("A1").unwrap();
        assert!((pads[3].1 - a1).abs() < 1e-3);
    }

    #[test]
    fn test_themes_start_once() {
        let mut seq = Sequencer::new();
        assert!(seq.start_theme(PowerUpKind::Shield, 0.0));
        assert!(!seq.start_theme(PowerUpKind::Shield, 0.3));
        assert!(seq.theme_playing(PowerUpKind::Shield));

        let notes = seq.pump(0.0, 0.75 - 1e-6);
        let freqs: Vec<f32> = notes.iter().map(|n| n.freq).collect();
        assert_eq!(freqs.len(), 3);
        assert!((freqs[0] - note_to_freq("A4").unwrap()).abs() < 1e-3);
        assert!(notes.iter().all(|n| n.duration == 0.125));

        assert!(seq.stop_theme(PowerUpKind::Shield));
        assert!(!seq.stop_theme(PowerUpKind::Shield));
        assert!(seq.pump(1.0, 1.0).is_empty());
    }

    #[test]
    fn test_sequencer_catches_up_after_stall() {
        let mut seq = Sequencer::new();
        seq.start_music(0.0);
        seq.pump(0.0, 0.1);
        // A minute later only the lookahead window is filled
        let notes = seq.pump(60.0, 0.1);
        assert!(notes.iter().all(|n| n.time >= 60.0));
        assert!(notes.len() < 10);

        seq.stop_music();
        assert!(!seq.music_playing());
        assert!(seq.pump(61.0, 0.1).is_empty());
    }

    proptest! {
        #[test]
        fn prop_layer_volume_in_range(intensity in 0.0f32..=1.0, layer in 0usize..4) {
            let db = LAYERS[layer].target_db(intensity);
            let audible = LAYER_FLOOR_DB..=LAYER_FLOOR_DB + LAYER_RANGE_DB;
            prop_assert!(db == SILENT_DB || audible.contains(&db));
            // Audible exactly when the layer's threshold is met
            prop_assert_eq!(db > SILENT_DB, intensity >= LAYERS[layer].min_intensity);
        }
    }
}
