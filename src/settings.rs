//! Player-facing preferences
//!
//! Session only; nothing here is written to storage.

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Particle pool capacity multiplier (1.0 = full pools)
    pub fn particle_scale(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.25,
            QualityPreset::Medium => 0.6,
            QualityPreset::High => 1.0,
        }
    }

    /// Whether to render the background starfield
    pub fn starfield_enabled(&self) -> bool {
        match self {
            QualityPreset::Low => false,
            QualityPreset::Medium => true,
            QualityPreset::High => true,
        }
    }

    /// Number of stars when the starfield is on
    pub fn star_count(&self) -> usize {
        match self {
            QualityPreset::Low => 0,
            QualityPreset::Medium => 150,
            QualityPreset::High => 400,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Particle effects (debris, trails, pickups)
    pub particles: bool,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,

            show_fps: false,

            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective particle pool scale (0 when particles are off)
    pub fn particle_scale(&self) -> f32 {
        if !self.particles {
            0.0
        } else {
            self.quality.particle_scale()
        }
    }

    /// Gain for the master node; mute lives only here
    pub fn master_gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume.clamp(0.0, 1.0)
        }
    }

    /// Linear gain for the sound effects bus
    pub fn sfx_gain(&self) -> f32 {
        self.sfx_volume.clamp(0.0, 1.0)
    }

    /// Linear gain for the music bus
    pub fn music_gain(&self) -> f32 {
        self.music_volume.clamp(0.0, 1.0)
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parse() {
        assert_eq!(QualityPreset::from_str("HIGH"), Some(QualityPreset::High));
        assert_eq!(QualityPreset::from_str("med"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_str("ultra"), None);
    }

    #[test]
    fn test_particles_off_zeroes_scale() {
        let mut settings = Settings::from_preset(QualityPreset::High);
        assert_eq!(settings.particle_scale(), 1.0);
        settings.particles = false;
        assert_eq!(settings.particle_scale(), 0.0);
    }

    #[test]
    fn test_mute_only_touches_master() {
        let mut settings = Settings::default();
        assert_eq!(settings.master_gain(), 0.8);
        assert!(settings.toggle_mute());
        assert_eq!(settings.master_gain(), 0.0);
        // Buses keep their levels so unmuting restores sound
        assert_eq!(settings.sfx_gain(), 1.0);
        assert_eq!(settings.music_gain(), 0.7);
        assert!(!settings.toggle_mute());
        assert_eq!(settings.master_gain(), 0.8);
    }

    #[test]
    fn test_master_volume_not_folded_into_buses() {
        let settings = Settings {
            master_volume: 0.5,
            sfx_volume: 0.8,
            music_volume: 1.5,
            ..Settings::default()
        };
        assert_eq!(settings.sfx_gain(), 0.8);
        assert_eq!(settings.music_gain(), 1.0);
        assert_eq!(settings.master_gain(), 0.5);
    }
}
