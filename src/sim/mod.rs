//! Per-frame simulation module
//!
//! All gameplay logic lives here. Rules:
//! - Fixed timestep only (driven by the front end accumulator)
//! - Seeded RNG only
//! - No rendering, audio or platform dependencies; side effects go out as `GameEvent`s

pub mod ball;
pub mod bricks;
pub mod collision;
pub mod events;
pub mod game;
pub mod paddle;
pub mod particles;
pub mod powerups;

pub use ball::{Ball, BallStep};
pub use bricks::{Brick, BrickKind, BrickManager};
pub use collision::{Aabb, HitAxis};
pub use events::{Fx, GameEvent};
pub use game::{Game, GamePhase, TickInput};
pub use paddle::{Laser, Paddle};
pub use particles::{EmitOptions, Emitter, Particle, ParticleSystem};
pub use powerups::{PowerUp, PowerUpChange, PowerUpKind, PowerUpManager};

use rand::Rng;

/// Uniform float in `[min, max)`; tolerates `min == max`
#[inline]
pub fn random_between(rng: &mut impl Rng, min: f32, max: f32) -> f32 {
    min + (max - min) * rng.random::<f32>()
}

/// Pick an index from a weight table by cumulative selection.
///
/// Negative weights count as zero. `roll` is uniform in `[0, 1)`.
/// Returns 0 when every weight is zero.
pub fn pick_weighted(weights: &[f32], roll: f32) -> usize {
    let total: f32 = weights.iter().map(|w| w.max(0.0)).sum();
    if total <= 0.0 {
        return 0;
    }
    let target = roll * total;
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w.max(0.0);
        if target < cumulative {
            return i;
        }
    }
    // Rounding left the roll past the last bucket
    weights.iter().rposition(|w| *w > 0.0).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pick_weighted_buckets() {
        let weights = [0.5, 0.25, 0.25];
        assert_eq!(pick_weighted(&weights, 0.0), 0);
        assert_eq!(pick_weighted(&weights, 0.49), 0);
        assert_eq!(pick_weighted(&weights, 0.5), 1);
        assert_eq!(pick_weighted(&weights, 0.99), 2);
    }

    #[test]
    fn test_pick_weighted_skips_negative() {
        let weights = [-0.2, 0.0, 1.0];
        assert_eq!(pick_weighted(&weights, 0.0), 2);
        assert_eq!(pick_weighted(&[0.0, -1.0], 0.5), 0);
    }

    proptest! {
        #[test]
        fn prop_pick_weighted_lands_on_positive_weight(
            weights in prop::collection::vec(-1.0f32..1.0, 1..8),
            roll in 0.0f32..1.0,
        ) {
            let i = pick_weighted(&weights, roll);
            prop_assert!(i < weights.len());
            if weights.iter().any(|w| *w > 0.0) {
                prop_assert!(weights[i] > 0.0);
            }
        }
    }
}
