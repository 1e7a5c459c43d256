//! Cosmic Breaker - a 3D brick breaker
//!
//! Core modules:
//! - `sim`: Per-frame simulation (ball, paddle, bricks, power-ups, particles, game flow)
//! - `audio`: Layered procedural music and one-shot sound effects
//! - `renderer`: WebGPU rendering pipeline
//! - `platform`: Browser/native platform abstraction
//! - `highscore`: Best score tracking
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod error;
pub mod highscore;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::GameError;
pub use highscore::HighScore;
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta accepted from the animation callback (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Play field height (world units); width follows the viewport aspect
    pub const FIELD_HEIGHT: f32 = 30.0;
    /// Widest the play field may get
    pub const FIELD_MAX_WIDTH: f32 = 30.0;
    /// Field width before the first viewport measurement
    pub const DEFAULT_FIELD_WIDTH: f32 = 20.0;

    /// Brick box dimensions
    pub const BRICK_WIDTH: f32 = 1.8;
    pub const BRICK_HEIGHT: f32 = 0.8;
    pub const BRICK_DEPTH: f32 = 0.8;

    /// Brick grid layout
    pub const GRID_COLUMNS: u32 = 10;
    pub const GRID_SPACING: f32 = 2.0;
    pub const GRID_TOP_Y: f32 = 10.0;

    /// Power-up pickup half extent
    pub const POWER_UP_HALF_SIZE: f32 = 0.5;
    /// Power-up fall speed (units/s)
    pub const POWER_UP_FALL_SPEED: f32 = 5.0;
    /// Power-ups below this line are discarded
    pub const POWER_UP_KILL_Y: f32 = -15.0;

    /// Shield barrier height
    pub const SHIELD_Y: f32 = -14.0;
    /// Laser beam reach above the cannon
    pub const LASER_RANGE: f32 = 20.0;
}

/// Play field width for a viewport aspect ratio (width / height)
#[inline]
pub fn field_width_for_aspect(aspect: f32) -> f32 {
    use consts::{FIELD_HEIGHT, FIELD_MAX_WIDTH};
    (FIELD_HEIGHT * aspect * 0.7).min(FIELD_MAX_WIDTH)
}

/// Linear interpolation between a and b by t
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Format a number with thousands separators (1234567 -> "1,234,567")
pub fn format_number(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_field_width_clamped() {
        // Portrait phone
        assert!((field_width_for_aspect(0.5) - 10.5).abs() < 0.001);
        // Ultra-wide caps at the max width
        assert_eq!(field_width_for_aspect(3.0), consts::FIELD_MAX_WIDTH);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(300.0, 600.0, 0.0), 300.0);
        assert_eq!(lerp(300.0, 600.0, 1.0), 600.0);
        assert_eq!(lerp(200.0, 400.0, 0.5), 300.0);
    }
}
