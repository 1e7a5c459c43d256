//! Axis-aligned box collision and bounce response
//!
//! Everything in the play field collides as a box on the XY plane. Depth is
//! shared by all bodies, so the Z test from the 3D scene is always true and
//! omitted here.

use glam::Vec2;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

/// Which face pair of a box took the hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitAxis {
    /// Left or right face
    X,
    /// Top or bottom face
    Y,
}

impl Aabb {
    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Strict overlap (touching edges do not count)
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.max.x > other.min.x
            && self.min.x < other.max.x
            && self.max.y > other.min.y
            && self.min.y < other.max.y
    }

    /// Penetration depth on each axis, assuming the boxes overlap
    pub fn overlap_depth(&self, other: &Aabb) -> Vec2 {
        Vec2::new(
            (self.max.x - other.min.x).min(other.max.x - self.min.x),
            (self.max.y - other.min.y).min(other.max.y - self.min.y),
        )
    }
}

/// Test a ball (as its bounding square) against a box.
///
/// Returns the axis with the smaller penetration, which is the face the ball
/// most plausibly came through. Ties resolve to `Y`.
pub fn ball_box_hit(ball_pos: Vec2, radius: f32, target: &Aabb) -> Option<HitAxis> {
    let ball = Aabb::from_center(ball_pos, Vec2::splat(radius));
    if !ball.overlaps(target) {
        return None;
    }
    let depth = ball.overlap_depth(target);
    if depth.x < depth.y {
        Some(HitAxis::X)
    } else {
        Some(HitAxis::Y)
    }
}

/// Velocity after bouncing off the paddle.
///
/// `hit_offset` is where the ball struck, -1 at the left edge to 1 at the
/// right edge (clamped). The bounce leans up to `max_angle` from vertical,
/// picks up `english` of the paddle's horizontal velocity, and keeps `speed`.
pub fn paddle_bounce(
    hit_offset: f32,
    speed: f32,
    paddle_vx: f32,
    english: f32,
    max_angle: f32,
) -> Vec2 {
    let angle = hit_offset.clamp(-1.0, 1.0) * max_angle;
    let mut vel = Vec2::new(angle.sin() * speed, (angle.cos() * speed).abs());
    vel.x += paddle_vx * english;
    vel.normalize_or(Vec2::Y) * speed
}
