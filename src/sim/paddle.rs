//! The player's paddle, its laser cannons and the shield barrier

use glam::Vec2;
use rand::Rng;

use super::collision::Aabb;
use super::particles::ParticleSystem;
use crate::consts::LASER_RANGE;
use crate::tuning::Tuning;

/// Cannon inset from each paddle end
const CANNON_INSET: f32 = 0.3;
/// Cannon height above the paddle centre
const CANNON_RISE: f32 = 0.3;
/// Paddle speed above which it sheds trail particles
const TRAIL_SPEED: f32 = 5.0;

/// A laser beam, fired straight up from a cannon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Laser {
    /// Cannon muzzle at the time of firing
    pub origin: Vec2,
    pub age: f32,
    /// Not yet resolved against bricks
    pub fresh: bool,
}

impl Laser {
    pub fn top(&self) -> f32 {
        self.origin.y + LASER_RANGE
    }
}

#[derive(Debug, Clone)]
pub struct Paddle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    /// Width before any expansion
    pub base_width: f32,
    /// Requested x from input (clamped during update)
    pub target_x: f32,
    rest: Vec2,
    easing: f32,
    laser_cooldown_time: f32,
    laser_lifetime: f32,
    cannons_mounted: bool,
    laser_cooldown: f32,
    lasers: Vec<Laser>,
    shield: bool,
}

impl Paddle {
    pub fn new(tuning: &Tuning) -> Self {
        let rest = Vec2::new(0.0, tuning.paddle_y);
        Self {
            pos: rest,
            vel: Vec2::ZERO,
            width: tuning.paddle_width,
            height: tuning.paddle_height,
            depth: tuning.paddle_depth,
            base_width: tuning.paddle_width,
            target_x: 0.0,
            rest,
            easing: tuning.paddle_easing,
            laser_cooldown_time: tuning.laser_cooldown,
            laser_lifetime: tuning.laser_lifetime,
            cannons_mounted: false,
            laser_cooldown: 0.0,
            lasers: Vec::new(),
            shield: false,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, Vec2::new(self.width / 2.0, self.height / 2.0))
    }

    /// Top face y
    pub fn top(&self) -> f32 {
        self.pos.y + self.height / 2.0
    }

    /// Ease toward the target, fire lasers, shed trail particles
    pub fn update(
        &mut self,
        dt: f32,
        field_width: f32,
        particles: &mut ParticleSystem,
        rng: &mut impl Rng,
    ) {
        if dt <= 0.0 {
            return;
        }
        let previous = self.pos;

        let max_x = (field_width / 2.0 - self.width / 2.0).max(0.0);
        let target = self.target_x.clamp(-max_x, max_x);
        // Per-frame easing expressed for any dt (same curve as `easing` at 60 Hz)
        let blend = 1.0 - (1.0 - self.easing).powf(dt * 60.0);
        self.pos.x += (target - self.pos.x) * blend;

        self.vel = (self.pos - previous) / dt;

        if self.vel.x.abs() > TRAIL_SPEED {
            let mut at = self.pos;
            at.x -= self.vel.x.signum() * self.width * 0.4;
            particles.paddle_trail(at, self.vel, rng);
        }

        self.update_lasers(dt);
    }

    /// Widen by `factor`; returns the width to restore later
    pub fn expand(&mut self, factor: f32) -> f32 {
        let original = self.width;
        self.width *= factor;
        original
    }

    pub fn reset_width(&mut self, width: f32) {
        self.width = width;
    }

    // === Lasers ===

    pub fn activate_lasers(&mut self) {
        self.cannons_mounted = true;
    }

    pub fn deactivate_lasers(&mut self) {
        self.cannons_mounted = false;
        self.lasers.clear();
    }

    pub fn has_lasers(&self) -> bool {
        self.cannons_mounted
    }

    /// Muzzle positions (left, right) while mounted
    pub fn cannons(&self) -> Option<[Vec2; 2]> {
        if !self.cannons_mounted {
            return None;
        }
        let dx = self.width / 2.0 - CANNON_INSET;
        let y = self.pos.y + CANNON_RISE;
        Some([
            Vec2::new(self.pos.x - dx, y),
            Vec2::new(self.pos.x + dx, y),
        ])
    }

    pub fn lasers(&self) -> &[Laser] {
        &self.lasers
    }

    /// Beams fired since the last call; each is handed out once
    pub fn take_fresh_lasers(&mut self) -> Vec<Laser> {
        let mut fresh = Vec::new();
        for laser in self.lasers.iter_mut().filter(|l| l.fresh) {
            laser.fresh = false;
            fresh.push(*laser);
        }
        fresh
    }

    fn update_lasers(&mut self, dt: f32) {
        if self.laser_cooldown > 0.0 {
            self.laser_cooldown -= dt;
        }

        if let Some(muzzles) = self.cannons() {
            if self.laser_cooldown <= 0.0 {
                for origin in muzzles {
                    self.lasers.push(Laser {
                        origin,
                        age: 0.0,
                        fresh: true,
                    });
                }
                self.laser_cooldown = self.laser_cooldown_time;
            }
        }

        let lifetime = self.laser_lifetime;
        for laser in &mut self.lasers {
            laser.age += dt;
        }
        self.lasers.retain(|l| l.age <= lifetime);
    }

    // === Shield ===

    pub fn activate_shield(&mut self) {
        self.shield = true;
    }

    pub fn deactivate_shield(&mut self) {
        self.shield = false;
    }

    pub fn has_shield(&self) -> bool {
        self.shield
    }

    /// Back to rest: centred, still, base width, no lasers or shield
    pub fn reset(&mut self) {
        self.pos = self.rest;
        self.vel = Vec2::ZERO;
        self.target_x = 0.0;
        self.width = self.base_width;
        self.laser_cooldown = 0.0;
        self.deactivate_lasers();
        self.deactivate_shield();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn setup() -> (Paddle, ParticleSystem, Pcg32) {
        (
            Paddle::new(&Tuning::default()),
            ParticleSystem::new(1.0),
            Pcg32::seed_from_u64(7),
        )
    }

    #[test]
    fn test_eases_toward_target() {
        let (mut paddle, mut ps, mut rng) = setup();
        paddle.target_x = 5.0;
        paddle.update(1.0 / 60.0, 20.0, &mut ps, &mut rng);
        // One 60 Hz frame covers 20% of the gap
        assert!((paddle.pos.x - 1.0).abs() < 1e-4);
        assert!(paddle.vel.x > 0.0);
    }

    #[test]
    fn test_easing_is_frame_rate_independent() {
        let (mut a, mut ps, mut rng) = setup();
        let mut b = a.clone();
        a.target_x = 6.0;
        b.target_x = 6.0;
        a.update(1.0 / 60.0, 20.0, &mut ps, &mut rng);
        b.update(1.0 / 120.0, 20.0, &mut ps, &mut rng);
        b.update(1.0 / 120.0, 20.0, &mut ps, &mut rng);
        assert!((a.pos.x - b.pos.x).abs() < 1e-4);
    }

    #[test]
    fn test_target_clamped_to_field() {
        let (mut paddle, mut ps, mut rng) = setup();
        paddle.target_x = 100.0;
        for _ in 0..600 {
            paddle.update(SIM_DT, 20.0, &mut ps, &mut rng);
        }
        // 20 wide field, 4 wide paddle
        assert!(paddle.pos.x <= 8.0 + 1e-3);
        assert!(paddle.pos.x > 7.9);
    }

    #[test]
    fn test_expand_and_reset_width() {
        let (mut paddle, _, _) = setup();
        let original = paddle.expand(1.5);
        assert_eq!(original, 4.0);
        assert_eq!(paddle.width, 6.0);
        paddle.reset_width(original);
        assert_eq!(paddle.width, 4.0);
    }

    #[test]
    fn test_lasers_fire_on_cooldown() {
        let (mut paddle, mut ps, mut rng) = setup();
        paddle.update(SIM_DT, 20.0, &mut ps, &mut rng);
        assert!(paddle.lasers().is_empty());

        paddle.activate_lasers();
        let [left, right] = paddle.cannons().unwrap();
        assert!((left.x + 1.7).abs() < 1e-5);
        assert!((right.x - 1.7).abs() < 1e-5);

        paddle.update(SIM_DT, 20.0, &mut ps, &mut rng);
        assert_eq!(paddle.lasers().len(), 2);
        assert_eq!(paddle.take_fresh_lasers().len(), 2);
        assert!(paddle.take_fresh_lasers().is_empty());

        // Beams fade after 0.2 s, next volley at 0.5 s
        for _ in 0..30 {
            paddle.update(SIM_DT, 20.0, &mut ps, &mut rng);
        }
        assert!(paddle.lasers().is_empty());
        for _ in 0..35 {
            paddle.update(SIM_DT, 20.0, &mut ps, &mut rng);
        }
        assert_eq!(paddle.lasers().len(), 2);

        paddle.deactivate_lasers();
        assert!(paddle.lasers().is_empty());
        assert!(paddle.cannons().is_none());
    }

    #[test]
    fn test_reset_clears_extras() {
        let (mut paddle, mut ps, mut rng) = setup();
        paddle.target_x = 5.0;
        paddle.update(SIM_DT, 20.0, &mut ps, &mut rng);
        paddle.expand(1.5);
        paddle.activate_lasers();
        paddle.activate_shield();

        paddle.reset();
        assert_eq!(paddle.pos, Vec2::new(0.0, -12.0));
        assert_eq!(paddle.vel, Vec2::ZERO);
        assert_eq!(paddle.width, 4.0);
        assert!(!paddle.has_lasers());
        assert!(!paddle.has_shield());
    }
}
