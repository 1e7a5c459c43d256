//! Pooled visual particles
//!
//! Each emitter owns a fixed budget of slots. Emission past the budget is
//! dropped silently; expired particles hand their slot back.

use glam::{Vec2, Vec3};
use rand::Rng;

use super::random_between;

/// Particle emitter (one pool each)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emitter {
    BrickDestruction,
    PowerUpCollection,
    BallTrail,
    PaddleTrail,
}

impl Emitter {
    pub const ALL: [Emitter; 4] = [
        Emitter::BrickDestruction,
        Emitter::PowerUpCollection,
        Emitter::BallTrail,
        Emitter::PaddleTrail,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    /// Pool size at full quality
    pub fn base_capacity(self) -> usize {
        match self {
            Emitter::BrickDestruction => 500,
            Emitter::PowerUpCollection => 200,
            Emitter::BallTrail => 300,
            Emitter::PaddleTrail => 200,
        }
    }

    pub fn default_color(self) -> u32 {
        match self {
            Emitter::BrickDestruction => 0x88CCFF,
            Emitter::PowerUpCollection => 0xFFFFFF,
            Emitter::BallTrail => 0x44AAFF,
            Emitter::PaddleTrail => 0x44FFAA,
        }
    }

    /// (min, max) starting size
    pub fn size_range(self) -> (f32, f32) {
        match self {
            Emitter::BrickDestruction => (0.2, 0.5),
            Emitter::PowerUpCollection => (0.3, 0.8),
            Emitter::BallTrail => (0.1, 0.3),
            Emitter::PaddleTrail => (0.2, 0.4),
        }
    }
}

/// Burst parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitOptions {
    pub count: u32,
    pub speed: f32,
    /// Random jitter added to each direction component before normalising
    pub spread: f32,
    pub lifetime: f32,
    /// Vertical acceleration (negative falls)
    pub gravity: f32,
    /// Overrides the emitter colour
    pub color: Option<u32>,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            count: 10,
            speed: 5.0,
            spread: 1.0,
            lifetime: 1.0,
            gravity: 0.0,
            color: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub emitter: Emitter,
    pub pos: Vec3,
    pub vel: Vec3,
    pub color: u32,
    pub size: f32,
    pub gravity: f32,
    pub age: f32,
    pub lifetime: f32,
}

impl Particle {
    /// 1 when fresh, 0 when about to expire
    pub fn life_fraction(&self) -> f32 {
        (1.0 - self.age / self.lifetime).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    live: [usize; 4],
    capacity: [usize; 4],
}

impl ParticleSystem {
    /// Pools scaled by `quality_scale` (0 disables particles)
    pub fn new(quality_scale: f32) -> Self {
        let mut system = Self {
            particles: Vec::new(),
            live: [0; 4],
            capacity: [0; 4],
        };
        system.set_quality_scale(quality_scale);
        system
    }

    /// Resize pools. Live particles above the new budget finish their lives.
    pub fn set_quality_scale(&mut self, scale: f32) {
        let scale = scale.clamp(0.0, 1.0);
        for emitter in Emitter::ALL {
            self.capacity[emitter.slot()] =
                (emitter.base_capacity() as f32 * scale).round() as usize;
        }
        let total: usize = self.capacity.iter().sum();
        self.particles.reserve(total.saturating_sub(self.particles.len()));
    }

    pub fn capacity(&self, emitter: Emitter) -> usize {
        self.capacity[emitter.slot()]
    }

    pub fn live_count(&self, emitter: Emitter) -> usize {
        self.live[emitter.slot()]
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.live = [0; 4];
    }

    /// Emit a burst. Returns how many particles actually got a slot.
    pub fn emit(
        &mut self,
        emitter: Emitter,
        pos: Vec3,
        opts: &EmitOptions,
        rng: &mut impl Rng,
    ) -> u32 {
        let slot = emitter.slot();
        let free = self.capacity[slot].saturating_sub(self.live[slot]);
        let count = (opts.count as usize).min(free);
        let color = opts.color.unwrap_or(emitter.default_color());
        let (min_size, max_size) = emitter.size_range();

        for _ in 0..count {
            let angle = random_between(rng, 0.0, std::f32::consts::TAU);
            let elevation = random_between(
                rng,
                -std::f32::consts::FRAC_PI_2,
                std::f32::consts::FRAC_PI_2,
            );
            let mut dir = Vec3::new(
                angle.cos() * elevation.cos(),
                elevation.sin(),
                angle.sin() * elevation.cos(),
            );
            dir += Vec3::new(
                random_between(rng, -opts.spread, opts.spread),
                random_between(rng, -opts.spread, opts.spread),
                random_between(rng, -opts.spread, opts.spread),
            );
            let dir = dir.normalize_or(Vec3::Y);

            self.particles.push(Particle {
                emitter,
                pos,
                vel: dir * random_between(rng, opts.speed * 0.5, opts.speed * 1.5),
                color,
                size: random_between(rng, min_size, max_size),
                gravity: opts.gravity,
                age: 0.0,
                lifetime: random_between(rng, opts.lifetime * 0.7, opts.lifetime * 1.3),
            });
        }
        self.live[slot] += count;
        count as u32
    }

    pub fn brick_destruction(&mut self, pos: Vec2, color: u32, rng: &mut impl Rng) {
        let opts = EmitOptions {
            count: 30,
            speed: 10.0,
            spread: 0.5,
            lifetime: 1.5,
            gravity: -5.0,
            color: Some(color),
        };
        self.emit(Emitter::BrickDestruction, pos.extend(0.0), &opts, rng);
    }

    pub fn power_up_collection(&mut self, pos: Vec2, color: u32, rng: &mut impl Rng) {
        let opts = EmitOptions {
            count: 40,
            speed: 15.0,
            spread: 1.0,
            lifetime: 1.0,
            gravity: 0.0,
            color: Some(color),
        };
        self.emit(Emitter::PowerUpCollection, pos.extend(0.0), &opts, rng);
    }

    /// Sparse sparks behind a moving ball
    pub fn ball_trail(&mut self, pos: Vec2, vel: Vec2, rng: &mut impl Rng) {
        if !rng.random_bool(0.3) {
            return;
        }
        let opts = EmitOptions {
            count: 1,
            speed: vel.length() * 0.2,
            spread: 0.1,
            lifetime: 0.5,
            ..Default::default()
        };
        self.emit(Emitter::BallTrail, pos.extend(0.0), &opts, rng);
    }

    pub fn paddle_trail(&mut self, pos: Vec2, vel: Vec2, rng: &mut impl Rng) {
        if vel.length() < 0.5 {
            return;
        }
        let opts = EmitOptions {
            count: 1,
            speed: vel.length() * 0.1,
            spread: 0.1,
            lifetime: 0.3,
            ..Default::default()
        };
        self.emit(Emitter::PaddleTrail, pos.extend(0.0), &opts, rng);
    }

    /// Age, integrate and shrink; expired particles free their slot
    pub fn update(&mut self, dt: f32) {
        let mut i = 0;
        while i < self.particles.len() {
            let p = &mut self.particles[i];
            p.age += dt;
            if p.age >= p.lifetime {
                let slot = p.emitter.slot();
                self.live[slot] = self.live[slot].saturating_sub(1);
                self.particles.swap_remove(i);
                continue;
            }
            p.vel.y += p.gravity * dt;
            p.pos += p.vel * dt;
            let life_ratio = p.age / p.lifetime;
            p.size *= 1.0 - life_ratio * dt * 2.0;
            i += 1;
        }
    }
}
