//! Ball movement, wall/paddle bounces and brick contact

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;

use super::collision::{Aabb, HitAxis, ball_box_hit, paddle_bounce};
use super::events::{Fx, GameEvent};
use super::paddle::Paddle;
use super::random_between;
use crate::tuning::Tuning;

/// Trail history length
pub const TRAIL_LENGTH: usize = 30;

/// Result of one ball update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallStep {
    /// Riding on the paddle
    Held,
    /// In flight
    Moving,
    /// Fell out the bottom of the field
    Lost,
}

#[derive(Debug, Clone)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub base_speed: f32,
    /// Current target speed (base, or slowed)
    pub speed: f32,
    /// May break several bricks per frame
    pub fireball: bool,
    /// Passes through bricks without bouncing
    pub brick_buster: bool,
    /// Sticks to the paddle on contact
    pub magnetic: bool,
    /// Horizontal offset from the paddle centre while held
    pub attached: Option<f32>,
    /// Recent positions, newest first
    pub trail: VecDeque<Vec2>,
    trail_tick: u32,
    max_bounce_angle: f32,
    english: f32,
}

impl Ball {
    /// Fresh ball heading up with a random lean
    pub fn new(pos: Vec2, tuning: &Tuning, rng: &mut impl Rng) -> Self {
        let speed = tuning.ball_base_speed;
        let dir = Vec2::new(random_between(rng, -0.5, 0.5), 1.0).normalize();
        let mut trail = VecDeque::with_capacity(TRAIL_LENGTH);
        trail.push_front(pos);
        Self {
            pos,
            vel: dir * speed,
            radius: tuning.ball_radius,
            base_speed: speed,
            speed,
            fireball: false,
            brick_buster: false,
            magnetic: false,
            attached: None,
            trail,
            trail_tick: 0,
            max_bounce_angle: tuning.max_bounce_angle(),
            english: tuning.paddle_english,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    pub fn attach_to_paddle(&mut self, paddle: &Paddle) {
        self.attached = Some(self.pos.x - paddle.pos.x);
        self.follow(paddle);
    }

    /// Launch from the paddle at up to 45 degrees off vertical
    pub fn release(&mut self, rng: &mut impl Rng) {
        if self.attached.take().is_some() {
            let angle = random_between(
                rng,
                -std::f32::consts::FRAC_PI_4,
                std::f32::consts::FRAC_PI_4,
            );
            self.vel = Vec2::new(angle.sin(), angle.cos()) * self.speed;
        }
    }

    fn follow(&mut self, paddle: &Paddle) {
        if let Some(offset) = self.attached {
            self.pos.x = paddle.pos.x + offset;
            self.pos.y = paddle.top() + self.radius;
        }
    }

    pub fn set_slow_motion(&mut self, active: bool, factor: f32) {
        self.speed = if active {
            self.base_speed * factor
        } else {
            self.base_speed
        };
        self.vel = self.vel.normalize_or(Vec2::Y) * self.speed;
    }

    pub fn is_slowed(&self) -> bool {
        self.speed < self.base_speed
    }

    /// Advance one step: walls, loss check, paddle
    pub fn update(&mut self, dt: f32, paddle: &Paddle, field: Vec2, fx: &mut Fx) -> BallStep {
        if self.is_attached() {
            self.follow(paddle);
            self.record_trail();
            return BallStep::Held;
        }

        self.pos += self.vel * dt;
        fx.particles.ball_trail(self.pos, self.vel, fx.rng);
        self.record_trail();

        let half_w = field.x / 2.0;
        let half_h = field.y / 2.0;
        let intensity = self.vel.length() / self.base_speed;

        if self.pos.x < -half_w + self.radius {
            self.pos.x = -half_w + self.radius;
            self.vel.x = self.vel.x.abs();
            fx.events.push(GameEvent::WallHit { intensity });
        } else if self.pos.x > half_w - self.radius {
            self.pos.x = half_w - self.radius;
            self.vel.x = -self.vel.x.abs();
            fx.events.push(GameEvent::WallHit { intensity });
        }

        if self.pos.y > half_h - self.radius {
            self.pos.y = half_h - self.radius;
            self.vel.y = -self.vel.y.abs();
            fx.events.push(GameEvent::WallHit { intensity });
        }

        if self.pos.y < -half_h - self.radius {
            return BallStep::Lost;
        }

        self.check_paddle(paddle, fx);
        BallStep::Moving
    }

    fn check_paddle(&mut self, paddle: &Paddle, fx: &mut Fx) -> bool {
        let bounds = paddle.bounds();
        if ball_box_hit(self.pos, self.radius, &bounds).is_none() {
            return false;
        }

        let speed = self.vel.length();
        let hit_offset = (self.pos.x - paddle.pos.x) / (paddle.width / 2.0);
        self.vel = paddle_bounce(
            hit_offset,
            speed,
            paddle.vel.x,
            self.english,
            self.max_bounce_angle,
        );
        self.pos.y = bounds.max.y + self.radius;

        fx.events.push(GameEvent::PaddleHit {
            intensity: speed / self.base_speed,
        });

        if self.magnetic {
            self.attach_to_paddle(paddle);
        }
        true
    }

    /// Resolve contact with a brick box. Returns true on overlap.
    ///
    /// Bounces off the shallower face and is pushed clear, unless the ball
    /// is a brick buster, which ploughs straight through.
    pub fn collide_box(&mut self, target: &Aabb) -> bool {
        let Some(axis) = ball_box_hit(self.pos, self.radius, target) else {
            return false;
        };
        if self.brick_buster {
            return true;
        }

        let center = target.center();
        match axis {
            HitAxis::X => {
                self.vel.x = -self.vel.x;
                self.pos.x = if self.pos.x < center.x {
                    target.min.x - self.radius
                } else {
                    target.max.x + self.radius
                };
            }
            HitAxis::Y => {
                self.vel.y = -self.vel.y;
                self.pos.y = if self.pos.y < center.y {
                    target.min.y - self.radius
                } else {
                    target.max.y + self.radius
                };
            }
        }
        true
    }

    /// Two extra balls at +-30 degrees from this one, same speed and modifiers
    pub fn split(&self) -> [Ball; 2] {
        let speed = self.vel.length().max(self.speed);
        let dir = self.vel.normalize_or(Vec2::Y);
        [30f32, -30f32].map(|deg| {
            let mut ball = self.clone();
            ball.attached = None;
            ball.vel = Vec2::from_angle(deg.to_radians()).rotate(dir) * speed;
            ball.trail.clear();
            ball.trail.push_front(ball.pos);
            ball
        })
    }

    fn record_trail(&mut self) {
        self.trail_tick = self.trail_tick.wrapping_add(1);
        if self.trail_tick % 2 == 0 {
            self.trail.push_front(self.pos);
            self.trail.truncate(TRAIL_LENGTH);
        }
    }

    /// Display colour for the current modifiers
    pub fn color(&self) -> u32 {
        if self.fireball {
            0xFF8800
        } else if self.brick_buster {
            0xFFAA00
        } else {
            0x44AAFF
        }
    }
}
