//! Outbound simulation events and the per-update side-effect sinks

use rand_pcg::Pcg32;

use super::bricks::BrickKind;
use super::particles::ParticleSystem;
use super::powerups::PowerUpKind;

/// Things the front end reacts to (sound, HUD)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    /// Ball bounced off the paddle; intensity is speed relative to base speed
    PaddleHit { intensity: f32 },
    /// Ball bounced off a wall or an indestructible brick
    WallHit { intensity: f32 },
    /// A breakable brick took a hit
    BrickHit { kind: BrickKind, intensity: f32 },
    /// A falling power-up touched the paddle (fires on refresh too)
    PowerUpCollected(PowerUpKind),
    /// A power-up became active (theme starts)
    PowerUpStarted(PowerUpKind),
    /// A power-up expired or was consumed (theme stops)
    PowerUpEnded(PowerUpKind),
    /// Difficulty went up
    LevelUp { difficulty: f32 },
    BallLost,
    /// The shield caught a ball
    ShieldUsed,
    GameOver { score: u64, new_high_score: bool },
    /// A run started; music should begin
    MusicStart,
}

/// Mutable sinks handed to subsystems while the game updates
pub struct Fx<'a> {
    pub rng: &'a mut Pcg32,
    pub particles: &'a mut ParticleSystem,
    pub events: &'a mut Vec<GameEvent>,
}
