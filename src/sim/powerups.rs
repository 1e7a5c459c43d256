//! Falling power-ups and timed activation

use glam::Vec2;
use rand::Rng;

use super::collision::Aabb;
use super::events::{Fx, GameEvent};
use super::paddle::Paddle;
use super::pick_weighted;
use crate::consts::{POWER_UP_FALL_SPEED, POWER_UP_HALF_SIZE, POWER_UP_KILL_Y};

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerUpKind {
    MultiBall,
    PaddleExpansion,
    SlowMotion,
    LaserCannon,
    Fireball,
    MagneticPaddle,
    Shield,
    BrickBuster,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 8] = [
        PowerUpKind::MultiBall,
        PowerUpKind::PaddleExpansion,
        PowerUpKind::SlowMotion,
        PowerUpKind::LaserCannon,
        PowerUpKind::Fireball,
        PowerUpKind::MagneticPaddle,
        PowerUpKind::Shield,
        PowerUpKind::BrickBuster,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PowerUpKind::MultiBall => "Multi-Ball",
            PowerUpKind::PaddleExpansion => "Paddle Expansion",
            PowerUpKind::SlowMotion => "Slow Motion",
            PowerUpKind::LaserCannon => "Laser Cannon",
            PowerUpKind::Fireball => "Fireball",
            PowerUpKind::MagneticPaddle => "Magnetic Paddle",
            PowerUpKind::Shield => "Shield",
            PowerUpKind::BrickBuster => "Brick Buster",
        }
    }

    /// HUD badge glyph
    pub fn icon(self) -> &'static str {
        match self {
            PowerUpKind::MultiBall => "3×",
            PowerUpKind::PaddleExpansion => "↔",
            PowerUpKind::SlowMotion => "⏱",
            PowerUpKind::LaserCannon => "⚡",
            PowerUpKind::Fireball => "🔥",
            PowerUpKind::MagneticPaddle => "🧲",
            PowerUpKind::Shield => "🛡",
            PowerUpKind::BrickBuster => "💥",
        }
    }

    pub fn color(self) -> u32 {
        match self {
            PowerUpKind::MultiBall => 0xFF5555,
            PowerUpKind::PaddleExpansion => 0x55FF55,
            PowerUpKind::SlowMotion => 0x5555FF,
            PowerUpKind::LaserCannon => 0xFF5555,
            PowerUpKind::Fireball => 0xFF8800,
            PowerUpKind::MagneticPaddle => 0xAA55FF,
            PowerUpKind::Shield => 0x00AAFF,
            PowerUpKind::BrickBuster => 0xFFAA00,
        }
    }

    /// Active time in seconds (0 = until consumed)
    pub fn duration(self) -> f32 {
        match self {
            PowerUpKind::PaddleExpansion => 20.0,
            PowerUpKind::LaserCannon => 10.0,
            PowerUpKind::Shield => 0.0,
            _ => 15.0,
        }
    }

    /// Relative spawn weight
    pub fn weight(self) -> f32 {
        match self {
            PowerUpKind::MultiBall | PowerUpKind::PaddleExpansion | PowerUpKind::SlowMotion => {
                0.15
            }
            _ => 0.1,
        }
    }

    pub fn roll(rng: &mut impl Rng) -> Self {
        let weights = Self::ALL.map(|k| k.weight());
        Self::ALL[pick_weighted(&weights, rng.random::<f32>())]
    }
}

/// A power-up falling toward the paddle
#[derive(Debug, Clone, PartialEq)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    pub pos: Vec2,
    /// Tumble angle (visual)
    pub spin: f32,
}

impl PowerUp {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, Vec2::splat(POWER_UP_HALF_SIZE))
    }
}

/// An active power-up and its remaining time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivePowerUp {
    pub kind: PowerUpKind,
    pub remaining: f32,
}

/// Activation changes the game must apply side effects for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpChange {
    Activated(PowerUpKind),
    Deactivated(PowerUpKind),
}

#[derive(Debug, Clone, Default)]
pub struct PowerUpManager {
    falling: Vec<PowerUp>,
    /// In activation order
    active: Vec<ActivePowerUp>,
}

impl PowerUpManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn falling(&self) -> &[PowerUp] {
        &self.falling
    }

    pub fn active(&self) -> &[ActivePowerUp] {
        &self.active
    }

    /// Drop a power-up; random kind unless `forced`
    pub fn spawn(&mut self, pos: Vec2, forced: Option<PowerUpKind>, rng: &mut impl Rng) {
        let kind = forced.unwrap_or_else(|| PowerUpKind::roll(rng));
        log::debug!("Power-up {} dropped at ({:.1}, {:.1})", kind.name(), pos.x, pos.y);
        self.falling.push(PowerUp {
            kind,
            pos,
            spin: 0.0,
        });
    }

    /// Fall, collect on paddle contact, count down timers
    pub fn update(&mut self, dt: f32, paddle: &Paddle, fx: &mut Fx) -> Vec<PowerUpChange> {
        let mut changes = Vec::new();
        let paddle_bounds = paddle.bounds();

        let mut collected = Vec::new();
        self.falling.retain_mut(|p| {
            p.pos.y -= POWER_UP_FALL_SPEED * dt;
            p.spin += 2.5 * dt;
            if p.pos.y < POWER_UP_KILL_Y {
                return false;
            }
            if p.bounds().overlaps(&paddle_bounds) {
                collected.push((p.kind, p.pos));
                return false;
            }
            true
        });

        for (kind, pos) in collected {
            fx.particles.power_up_collection(pos, kind.color(), fx.rng);
            if self.activate(kind, fx) {
                changes.push(PowerUpChange::Activated(kind));
            }
        }

        let mut expired = Vec::new();
        for entry in &mut self.active {
            if entry.kind.duration() > 0.0 {
                entry.remaining -= dt;
                if entry.remaining <= 0.0 {
                    expired.push(entry.kind);
                }
            }
        }
        for kind in expired {
            if self.deactivate(kind, fx) {
                changes.push(PowerUpChange::Deactivated(kind));
            }
        }

        changes
    }

    /// Start or refresh a power-up. Returns true when newly active.
    pub fn activate(&mut self, kind: PowerUpKind, fx: &mut Fx) -> bool {
        fx.events.push(GameEvent::PowerUpCollected(kind));

        if let Some(entry) = self.active.iter_mut().find(|a| a.kind == kind) {
            entry.remaining = kind.duration();
            return false;
        }

        log::debug!("Power-up active: {}", kind.name());
        self.active.push(ActivePowerUp {
            kind,
            remaining: kind.duration(),
        });
        fx.events.push(GameEvent::PowerUpStarted(kind));
        true
    }

    /// End a power-up. Returns true if it was active.
    pub fn deactivate(&mut self, kind: PowerUpKind, fx: &mut Fx) -> bool {
        let Some(index) = self.active.iter().position(|a| a.kind == kind) else {
            return false;
        };
        self.active.remove(index);
        log::debug!("Power-up ended: {}", kind.name());
        fx.events.push(GameEvent::PowerUpEnded(kind));
        true
    }

    pub fn is_active(&self, kind: PowerUpKind) -> bool {
        self.active.iter().any(|a| a.kind == kind)
    }

    /// Remaining share of the duration (timer bar). Untimed kinds read 1.
    pub fn remaining_fraction(&self, kind: PowerUpKind) -> Option<f32> {
        let entry = self.active.iter().find(|a| a.kind == kind)?;
        let duration = kind.duration();
        if duration <= 0.0 {
            Some(1.0)
        } else {
            Some((entry.remaining / duration).clamp(0.0, 1.0))
        }
    }

    /// Drop everything falling and end all active power-ups
    pub fn clear(&mut self, fx: &mut Fx) -> Vec<PowerUpChange> {
        self.falling.clear();
        let kinds: Vec<PowerUpKind> = self.active.iter().map(|a| a.kind).collect();
        kinds
            .into_iter()
            .filter(|kind| self.deactivate(*kind, fx))
            .map(PowerUpChange::Deactivated)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::particles::ParticleSystem;
    use crate::tuning::Tuning;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::collections::HashMap;

    struct Rig {
        rng: Pcg32,
        particles: ParticleSystem,
        events: Vec<GameEvent>,
        paddle: Paddle,
        powerups: PowerUpManager,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                rng: Pcg32::seed_from_u64(5),
                particles: ParticleSystem::new(1.0),
                events: Vec::new(),
                paddle: Paddle::new(&Tuning::default()),
                powerups: PowerUpManager::new(),
            }
        }

        fn update(&mut self, dt: f32) -> Vec<PowerUpChange> {
            let mut fx = Fx {
                rng: &mut self.rng,
                particles: &mut self.particles,
                events: &mut self.events,
            };
            self.powerups.update(dt, &self.paddle, &mut fx)
        }

        fn activate(&mut self, kind: PowerUpKind) -> bool {
            let mut fx = Fx {
                rng: &mut self.rng,
                particles: &mut self.particles,
                events: &mut self.events,
            };
            self.powerups.activate(kind, &mut fx)
        }
    }

    #[test]
    fn test_roll_follows_weights() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut counts: HashMap<PowerUpKind, u32> = HashMap::new();
        for _ in 0..20_000 {
            *counts.entry(PowerUpKind::roll(&mut rng)).or_default() += 1;
        }
        assert_eq!(counts.len(), 8);
        // 0.15 / 0.95 vs 0.10 / 0.95
        let multi = counts[&PowerUpKind::MultiBall] as f32 / 20_000.0;
        let shield = counts[&PowerUpKind::Shield] as f32 / 20_000.0;
        assert!((multi - 0.158).abs() < 0.02);
        assert!((shield - 0.105).abs() < 0.02);
    }

    #[test]
    fn test_falls_and_expires_below_field() {
        let mut rig = Rig::new();
        rig.powerups
            .spawn(Vec2::new(8.0, 0.0), Some(PowerUpKind::Fireball), &mut rig.rng);
        rig.update(1.0);
        assert_eq!(rig.powerups.falling()[0].pos.y, -5.0);
        rig.update(2.1);
        assert!(rig.powerups.falling().is_empty());
        assert!(!rig.powerups.is_active(PowerUpKind::Fireball));
    }

    #[test]
    fn test_collect_on_paddle() {
        let mut rig = Rig::new();
        rig.powerups
            .spawn(Vec2::new(1.0, -11.5), Some(PowerUpKind::SlowMotion), &mut rig.rng);
        let changes = rig.update(0.01);
        assert_eq!(changes, vec![PowerUpChange::Activated(PowerUpKind::SlowMotion)]);
        assert!(rig.powerups.is_active(PowerUpKind::SlowMotion));
        assert!(rig.powerups.falling().is_empty());
        assert_eq!(
            rig.events,
            vec![
                GameEvent::PowerUpCollected(PowerUpKind::SlowMotion),
                GameEvent::PowerUpStarted(PowerUpKind::SlowMotion),
            ]
        );
        assert!(!rig.particles.is_empty());
    }

    #[test]
    fn test_expanded_paddle_catches_wider() {
        let mut rig = Rig::new();
        rig.powerups
            .spawn(Vec2::new(2.8, -11.5), Some(PowerUpKind::Shield), &mut rig.rng);
        rig.paddle.expand(1.5);
        rig.update(0.01);
        assert!(rig.powerups.is_active(PowerUpKind::Shield));
    }

    #[test]
    fn test_refresh_resets_timer() {
        let mut rig = Rig::new();
        assert!(rig.activate(PowerUpKind::LaserCannon));
        rig.update(6.0);
        let remaining = rig.powerups.remaining_fraction(PowerUpKind::LaserCannon);
        assert!((remaining.unwrap() - 0.4).abs() < 1e-5);
        assert!(!rig.activate(PowerUpKind::LaserCannon));
        assert_eq!(rig.powerups.remaining_fraction(PowerUpKind::LaserCannon), Some(1.0));
        // Only one theme start
        let starts = rig
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::PowerUpStarted(_)))
            .count();
        assert_eq!(starts, 1);
    }

    #[test]
    fn test_timed_expiry() {
        let mut rig = Rig::new();
        rig.activate(PowerUpKind::LaserCannon);
        assert!(rig.update(9.9).is_empty());
        let changes = rig.update(0.2);
        assert_eq!(changes, vec![PowerUpChange::Deactivated(PowerUpKind::LaserCannon)]);
        assert!(rig.events.contains(&GameEvent::PowerUpEnded(PowerUpKind::LaserCannon)));
    }

    #[test]
    fn test_shield_waits_until_consumed() {
        let mut rig = Rig::new();
        rig.activate(PowerUpKind::Shield);
        for _ in 0..100 {
            rig.update(1.0);
        }
        assert!(rig.powerups.is_active(PowerUpKind::Shield));
        assert_eq!(rig.powerups.remaining_fraction(PowerUpKind::Shield), Some(1.0));
    }

    #[test]
    fn test_clear_ends_everything() {
        let mut rig = Rig::new();
        rig.activate(PowerUpKind::Fireball);
        rig.activate(PowerUpKind::Shield);
        rig.powerups.spawn(Vec2::ZERO, None, &mut rig.rng);

        let mut fx = Fx {
            rng: &mut rig.rng,
            particles: &mut rig.particles,
            events: &mut rig.events,
        };
        let changes = rig.powerups.clear(&mut fx);
        assert_eq!(changes.len(), 2);
        assert!(rig.powerups.active().is_empty());
        assert!(rig.powerups.falling().is_empty());
    }
}
