//! Web Audio backend
//!
//! Procedurally generated sound - no external files needed. Every note is a
//! short-lived oscillator with a gain envelope, routed through per-layer
//! gain nodes so the music can swell with game intensity.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use web_sys::{AudioContext, AudioNode, GainNode, OscillatorNode, OscillatorType};

use super::music::{self, LAYERS, ScheduledNote, Sequencer, Voice};
use super::{
    ARPEGGIO_GAP, Cue, GAME_OVER_GAP, GAME_OVER_NOTE, GAME_OVER_NOTES, LEVEL_UP_NOTES,
    SoundEffect, collect_notes, cues_for, note_to_freq,
};
use crate::error::{GameError, Result};
use crate::settings::Settings;
use crate::sim::GameEvent;

/// How far ahead of the audio clock notes are scheduled
const LOOKAHEAD_SECS: f64 = 0.2;
/// Envelope floor for exponential ramps (must be > 0)
const ENVELOPE_FLOOR: f32 = 0.001;

fn audio_err(what: &str, err: wasm_bindgen::JsValue) -> GameError {
    GameError::Audio(format!("{what}: {err:?}"))
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: AudioContext,
    master: GainNode,
    sfx_bus: GainNode,
    music_bus: GainNode,
    layer_gains: Vec<GainNode>,
    theme_bus: GainNode,
    sequencer: Sequencer,
    rng: Pcg32,
    /// Volume levels and mute state; the buses never see mute
    levels: Settings,
    intensity: f32,
}

impl AudioManager {
    /// Build the routing graph. Fails when the browser refuses an AudioContext.
    pub fn new(settings: &Settings, seed: u64) -> Result<Self> {
        let ctx = AudioContext::new().map_err(|e| audio_err("AudioContext", e))?;
        let destination = ctx.destination();

        let master = ctx.create_gain().map_err(|e| audio_err("master gain", e))?;
        master
            .connect_with_audio_node(&destination)
            .map_err(|e| audio_err("connect master", e))?;

        // Feedback echo on everything but the pad
        let delay = ctx
            .create_delay()
            .map_err(|e| audio_err("delay", e))?;
        delay
            .delay_time()
            .set_value(music::NoteValue::Eighth.seconds() as f32);
        let feedback = ctx.create_gain().map_err(|e| audio_err("feedback", e))?;
        feedback.gain().set_value(0.2);
        let wet = ctx.create_gain().map_err(|e| audio_err("wet", e))?;
        wet.gain().set_value(0.1);
        delay
            .connect_with_audio_node(&feedback)
            .and_then(|_| feedback.connect_with_audio_node(&delay))
            .and_then(|_| delay.connect_with_audio_node(&wet))
            .and_then(|_| wet.connect_with_audio_node(&master))
            .map_err(|e| audio_err("connect delay", e))?;

        let sfx_bus = bus(&ctx, &master, Some(&delay))?;
        let music_bus = bus(&ctx, &master, None)?;
        let theme_bus = bus(&ctx, &music_bus, Some(&delay))?;
        theme_bus.gain().set_value(music::db_to_gain(music::THEME_DB));

        let mut layer_gains = Vec::with_capacity(LAYERS.len());
        for layer in &LAYERS {
            let send = if layer.pattern.voice == Voice::Pad {
                None
            } else {
                Some(&delay)
            };
            let gain = bus(&ctx, &music_bus, send)?;
            gain.gain().set_value(music::db_to_gain(music::SILENT_DB));
            layer_gains.push(gain);
        }

        let mut manager = Self {
            ctx,
            master,
            sfx_bus,
            music_bus,
            layer_gains,
            theme_bus,
            sequencer: Sequencer::new(),
            rng: Pcg32::seed_from_u64(seed),
            levels: settings.clone(),
            intensity: 0.0,
        };
        manager.apply_settings(settings);
        log::info!("Audio initialized ({} music layers)", LAYERS.len());
        Ok(manager)
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if self.ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = self.ctx.resume();
        }
    }

    /// Push volume settings into the bus gains
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.levels = settings.clone();
        self.sfx_bus.gain().set_value(settings.sfx_gain());
        self.music_bus.gain().set_value(settings.music_gain());
        self.update_master();
    }

    pub fn is_muted(&self) -> bool {
        self.levels.muted
    }

    /// Flip mute; returns the new muted state
    pub fn toggle_mute(&mut self) -> bool {
        let muted = self.levels.toggle_mute();
        self.update_master();
        muted
    }

    fn update_master(&self) {
        self.master.gain().set_value(self.levels.master_gain());
    }

    /// Retarget the music layers for an intensity in [0, 1]
    pub fn set_music_intensity(&mut self, value: f32) {
        self.intensity = value.clamp(0.0, 1.0);
        let t = self.ctx.current_time();
        for (layer, gain) in LAYERS.iter().zip(&self.layer_gains) {
            let target = music::db_to_gain(layer.target_db(self.intensity));
            let ramp = music::layer_ramp_secs(self.intensity, layer.min_intensity);
            let param = gain.gain();
            let _ = param.cancel_scheduled_values(t);
            let _ = param.set_value_at_time(param.value(), t);
            let _ = param.linear_ramp_to_value_at_time(target, t + ramp);
        }
    }

    pub fn music_intensity(&self) -> f32 {
        self.intensity
    }

    /// React to one simulation event
    pub fn handle(&mut self, event: &GameEvent) {
        for cue in cues_for(event, &mut self.rng) {
            self.cue(cue);
        }
    }

    fn cue(&mut self, cue: Cue) {
        let now = self.ctx.current_time();
        match cue {
            Cue::Play(effect) => self.play(effect),
            Cue::StartMusic => {
                self.resume();
                self.sequencer.start_music(now);
                self.set_music_intensity(self.intensity);
            }
            Cue::StopMusic => {
                self.sequencer.stop_music();
                self.sequencer.stop_all_themes();
            }
            Cue::StartTheme(kind) => {
                if self.sequencer.start_theme(kind, now) {
                    log::debug!("Theme started: {}", kind.name());
                }
            }
            Cue::StopTheme(kind) => {
                self.sequencer.stop_theme(kind);
            }
        }
    }

    /// Schedule upcoming music notes; call once per animation frame
    pub fn pump(&mut self) {
        let now = self.ctx.current_time();
        let notes = self.sequencer.pump(now, LOOKAHEAD_SECS);
        if self.levels.muted {
            return;
        }
        for note in notes {
            self.play_note(&note);
        }
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        if self.levels.muted {
            return;
        }
        self.resume();
        let t = self.ctx.current_time();
        match effect {
            SoundEffect::PaddleHit { pitch } => self.play_paddle_hit(pitch, t),
            SoundEffect::WallHit { pitch } => self.play_wall_hit(pitch, t),
            SoundEffect::BrickHit { freq } => {
                self.pluck(freq, OscillatorType::Triangle, 0.3, t, 0.1);
            }
            SoundEffect::PowerUpCollected(kind) => {
                for (i, note) in collect_notes(kind).iter().enumerate() {
                    if let Some(freq) = note_to_freq(note) {
                        let start = t + i as f64 * ARPEGGIO_GAP;
                        self.pluck(freq, OscillatorType::Sine, 0.3, start, 0.1);
                    }
                }
            }
            SoundEffect::LevelUp => {
                for (i, note) in LEVEL_UP_NOTES.iter().enumerate() {
                    if let Some(freq) = note_to_freq(note) {
                        let start = t + i as f64 * ARPEGGIO_GAP;
                        self.pluck(freq, OscillatorType::Sine, 0.3, start, 0.1);
                    }
                }
            }
            SoundEffect::GameOver => {
                for (i, note) in GAME_OVER_NOTES.iter().enumerate() {
                    if let Some(freq) = note_to_freq(note) {
                        let start = t + i as f64 * GAME_OVER_GAP;
                        self.pluck(freq, OscillatorType::Triangle, 0.35, start, GAME_OVER_NOTE);
                    }
                }
            }
        }
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope routed into `out`
    fn create_osc(
        &self,
        freq: f32,
        osc_type: OscillatorType,
        out: &AudioNode,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = self.ctx.create_oscillator().ok()?;
        let gain = self.ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(out).ok()?;

        Some((osc, gain))
    }

    /// Percussive note: instant attack, exponential decay
    fn pluck(&self, freq: f32, osc_type: OscillatorType, level: f32, t: f64, dur: f64) {
        let Some((osc, gain)) = self.create_osc(freq, osc_type, &self.sfx_bus) else {
            return;
        };
        gain.gain().set_value_at_time(level, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(ENVELOPE_FLOOR, t + dur)
            .ok();
        osc.start_with_when(t).ok();
        osc.stop_with_when(t + dur + 0.05).ok();
    }

    /// Paddle hit - short sine blip
    fn play_paddle_hit(&self, pitch: f32, t: f64) {
        let Some((osc, gain)) = self.create_osc(pitch, OscillatorType::Sine, &self.sfx_bus) else {
            return;
        };
        gain.gain().set_value_at_time(0.0, t).ok();
        gain.gain().linear_ramp_to_value_at_time(0.5, t + 0.01).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(ENVELOPE_FLOOR, t + 0.15)
            .ok();
        osc.start_with_when(t).ok();
        osc.stop_with_when(t + 0.2).ok();
    }

    /// Wall hit - inharmonic metallic tick
    fn play_wall_hit(&self, pitch: f32, t: f64) {
        // Partials at non-integer ratios read as metal
        for (ratio, level) in [(1.0, 0.2), (2.76, 0.12), (5.4, 0.08)] {
            let Some((osc, gain)) =
                self.create_osc(pitch * ratio, OscillatorType::Square, &self.sfx_bus)
            else {
                continue;
            };
            gain.gain().set_value_at_time(level, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(ENVELOPE_FLOOR, t + 0.1)
                .ok();
            osc.start_with_when(t).ok();
            osc.stop_with_when(t + 0.15).ok();
        }
    }

    fn layer_bus(&self, voice: Voice) -> &GainNode {
        let index = match voice {
            Voice::Pad => 0,
            Voice::Membrane => 1,
            Voice::Arpeggio => 2,
            Voice::Fm => 3,
            Voice::Theme(_) => return &self.theme_bus,
        };
        &self.layer_gains[index]
    }

    /// Render one sequencer note on its instrument
    fn play_note(&self, note: &ScheduledNote) {
        let out = self.layer_bus(note.voice);
        let (t, dur) = (note.time, note.duration);
        match note.voice {
            Voice::Pad => {
                // Slow swell and release
                let Some((osc, gain)) = self.create_osc(note.freq, OscillatorType::Sine, out)
                else {
                    return;
                };
                gain.gain().set_value_at_time(0.0, t).ok();
                gain.gain().linear_ramp_to_value_at_time(0.3, t + 0.5).ok();
                gain.gain().set_value_at_time(0.3, t + dur).ok();
                gain.gain().linear_ramp_to_value_at_time(0.0, t + dur + 1.0).ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + dur + 1.05).ok();
            }
            Voice::Membrane => {
                // Pitch drops four octaves onto the note
                let Some((osc, gain)) = self.create_osc(note.freq, OscillatorType::Sine, out)
                else {
                    return;
                };
                osc.frequency().set_value_at_time(note.freq * 16.0, t).ok();
                osc.frequency()
                    .exponential_ramp_to_value_at_time(note.freq, t + 0.05)
                    .ok();
                gain.gain().set_value_at_time(0.9, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(ENVELOPE_FLOOR, t + 0.4)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.45).ok();
            }
            Voice::Arpeggio => {
                let Some((osc, gain)) = self.create_osc(note.freq, OscillatorType::Square, out)
                else {
                    return;
                };
                gain.gain().set_value_at_time(0.2, t).ok();
                gain.gain().set_value_at_time(0.2, t + dur * 0.5).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(ENVELOPE_FLOOR, t + dur + 0.1)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + dur + 0.15).ok();
            }
            Voice::Fm => self.play_fm(note, out),
            Voice::Theme(_) => {
                let Some((osc, gain)) = self.create_osc(note.freq, OscillatorType::Triangle, out)
                else {
                    return;
                };
                gain.gain().set_value_at_time(0.4, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(ENVELOPE_FLOOR, t + dur + 0.1)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + dur + 0.15).ok();
            }
        }
    }

    /// FM lead: harmonicity 3, modulation index 10
    fn play_fm(&self, note: &ScheduledNote, out: &GainNode) {
        let (t, dur) = (note.time, note.duration);
        let Some((carrier, gain)) = self.create_osc(note.freq, OscillatorType::Sine, out) else {
            return;
        };
        let Ok(modulator) = self.ctx.create_oscillator() else {
            return;
        };
        let Ok(depth) = self.ctx.create_gain() else {
            return;
        };
        modulator.frequency().set_value(note.freq * 3.0);
        depth.gain().set_value(note.freq * 10.0);
        if modulator.connect_with_audio_node(&depth).is_err()
            || depth
                .connect_with_audio_param(&carrier.frequency())
                .is_err()
        {
            return;
        }

        gain.gain().set_value_at_time(0.3, t).ok();
        gain.gain().set_value_at_time(0.3, t + dur).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(ENVELOPE_FLOOR, t + dur + 0.2)
            .ok();
        for osc in [&carrier, &modulator] {
            osc.start_with_when(t).ok();
            osc.stop_with_when(t + dur + 0.25).ok();
        }
    }
}

/// Gain node feeding `out`, optionally also sending into `send`
fn bus(ctx: &AudioContext, out: &AudioNode, send: Option<&web_sys::DelayNode>) -> Result<GainNode> {
    let gain = ctx.create_gain().map_err(|e| audio_err("bus gain", e))?;
    gain.connect_with_audio_node(out)
        .map_err(|e| audio_err("connect bus", e))?;
    if let Some(send) = send {
        gain.connect_with_audio_node(send)
            .map_err(|e| audio_err("connect send", e))?;
    }
    Ok(gain)
}
