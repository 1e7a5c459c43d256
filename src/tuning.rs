//! Data-driven game balance
//!
//! Every gameplay constant that a designer might want to tweak lives here.
//! Missing JSON fields fall back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tuning {
    // === Ball ===
    pub ball_radius: f32,
    /// Launch speed in units/s
    pub ball_base_speed: f32,
    /// Speed multiplier while Slow Motion is active
    pub slow_motion_factor: f32,

    // === Paddle ===
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_depth: f32,
    pub paddle_y: f32,
    /// Fraction of the distance to the target covered per 60 Hz frame
    pub paddle_easing: f32,
    /// Share of paddle velocity transferred to the ball on contact
    pub paddle_english: f32,
    /// Bounce angle at the paddle edge (degrees from vertical)
    pub max_bounce_angle_deg: f32,
    /// Width multiplier for Paddle Expansion
    pub paddle_expand_factor: f32,

    // === Lasers ===
    pub laser_cooldown: f32,
    pub laser_lifetime: f32,

    // === Scoring / flow ===
    pub starting_balls: u32,
    /// Seconds a combo survives without a scoring hit
    pub combo_window: f32,
    /// Extra multiplier per combo step
    pub combo_step: f32,
    pub starting_difficulty: f32,
    /// Seconds between difficulty increases
    pub difficulty_interval: f32,
    pub difficulty_step: f32,
    /// Bricks added on each difficulty increase
    pub periodic_refill_count: u32,
    /// Refill when fewer than this many bricks remain
    pub low_brick_threshold: usize,
    pub low_brick_refill_count: u32,
    /// Destructible brick count that maps to zero music intensity
    pub intensity_brick_scale: f32,

    // === Bricks ===
    pub explosion_radius: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            ball_radius: 0.4,
            ball_base_speed: 15.0,
            slow_motion_factor: 0.7,

            paddle_width: 4.0,
            paddle_height: 0.5,
            paddle_depth: 1.0,
            paddle_y: -12.0,
            paddle_easing: 0.2,
            paddle_english: 0.2,
            max_bounce_angle_deg: 60.0,
            paddle_expand_factor: 1.5,

            laser_cooldown: 0.5,
            laser_lifetime: 0.2,

            starting_balls: 3,
            combo_window: 5.0,
            combo_step: 0.1,
            starting_difficulty: 1.0,
            difficulty_interval: 30.0,
            difficulty_step: 0.5,
            periodic_refill_count: 5,
            low_brick_threshold: 10,
            low_brick_refill_count: 10,
            intensity_brick_scale: 50.0,

            explosion_radius: 3.0,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON and validate ranges
    pub fn from_json(json: &str) -> Result<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the simulation cannot work with
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("ball_radius", self.ball_radius),
            ("ball_base_speed", self.ball_base_speed),
            ("slow_motion_factor", self.slow_motion_factor),
            ("paddle_width", self.paddle_width),
            ("paddle_height", self.paddle_height),
            ("paddle_expand_factor", self.paddle_expand_factor),
            ("laser_cooldown", self.laser_cooldown),
            ("combo_window", self.combo_window),
            ("difficulty_interval", self.difficulty_interval),
            ("intensity_brick_scale", self.intensity_brick_scale),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(GameError::InvalidTuning { field, value });
            }
        }
        if !(self.paddle_easing > 0.0 && self.paddle_easing <= 1.0) {
            return Err(GameError::InvalidTuning {
                field: "paddle_easing",
                value: self.paddle_easing,
            });
        }
        if !(0.0..90.0).contains(&self.max_bounce_angle_deg) {
            return Err(GameError::InvalidTuning {
                field: "max_bounce_angle_deg",
                value: self.max_bounce_angle_deg,
            });
        }
        if self.starting_balls == 0 {
            return Err(GameError::InvalidTuning {
                field: "starting_balls",
                value: 0.0,
            });
        }
        Ok(())
    }

    /// Max bounce angle in radians
    pub fn max_bounce_angle(&self) -> f32 {
        self.max_bounce_angle_deg.to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = Tuning::from_json(r#"{ "ball_base_speed": 20.0, "starting_balls": 5 }"#)
            .expect("valid tuning");
        assert_eq!(tuning.ball_base_speed, 20.0);
        assert_eq!(tuning.starting_balls, 5);
        assert_eq!(tuning.paddle_width, 4.0);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Tuning::from_json(r#"{ "ball_speeed": 20.0 }"#).unwrap_err();
        assert!(matches!(err, GameError::Config(_)));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = Tuning::from_json(r#"{ "paddle_easing": 1.5 }"#).unwrap_err();
        assert!(matches!(
            err,
            GameError::InvalidTuning {
                field: "paddle_easing",
                ..
            }
        ));

        let err = Tuning::from_json(r#"{ "ball_base_speed": 0.0 }"#).unwrap_err();
        assert!(err.to_string().contains("ball_base_speed"));
    }
}
