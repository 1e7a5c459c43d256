//! Scene assembly: game state to a projected, depth-sorted triangle list
//!
//! The camera sits on the +Z axis looking at the field. Everything is built
//! in world space with the `shapes` helpers, projected on the CPU and sorted
//! back to front so alpha blending works without a depth buffer.

use glam::{Mat4, Quat, Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::shapes::{self, WorldTri, rgba, shade};
use super::vertex::{Vertex, colors};
use crate::consts::{LASER_RANGE, SHIELD_Y};
use crate::settings::Settings;
use crate::sim::{Brick, Game, GamePhase};

/// Vertical field of view
pub const FOV_Y_DEG: f32 = 60.0;
/// Camera distance from the play plane
pub const CAMERA_Z: f32 = 25.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 1000.0;

/// Seed for the star layout; the sky is the same every frame
const STAR_SEED: u64 = 0x5eed_57a2;
const WALL_THICKNESS: f32 = 1.0;

/// Perspective camera with a fixed eye on the +Z axis
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    view_proj: Mat4,
}

impl Camera {
    pub fn new(aspect: f32) -> Self {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        let proj = Mat4::perspective_rh(FOV_Y_DEG.to_radians(), aspect, Z_NEAR, Z_FAR);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, CAMERA_Z), Vec3::ZERO, Vec3::Y);
        Self {
            view_proj: proj * view,
        }
    }

    /// World point to NDC (z in 0..1, larger is farther); None behind the eye
    pub fn project(&self, p: Vec3) -> Option<Vec3> {
        let clip = self.view_proj * p.extend(1.0);
        if clip.w <= Z_NEAR {
            return None;
        }
        Some(clip.truncate() / clip.w)
    }
}

/// Canvas x in pixels to world x on the play plane
pub fn screen_to_field_x(x: f32, width: f32, height: f32) -> f32 {
    if width <= 0.0 || height <= 0.0 {
        return 0.0;
    }
    let ndc = x / width * 2.0 - 1.0;
    let half_h = CAMERA_Z * (FOV_Y_DEG / 2.0).to_radians().tan();
    ndc * half_h * (width / height)
}

/// Build the full frame for the current game state
pub fn build(game: &Game, settings: &Settings, time: f32, aspect: f32) -> Vec<Vertex> {
    let mut tris = Vec::with_capacity(4096);

    if settings.quality.starfield_enabled() {
        starfield(settings.quality.star_count(), time, &mut tris);
    }
    walls(game.field, &mut tris);
    bricks(game.bricks.bricks(), &mut tris);
    paddle(game, &mut tris);
    power_ups(game, &mut tris);
    balls(game, &mut tris);
    if settings.particles {
        particles(game, &mut tris);
    }
    if game.phase == GamePhase::Paused {
        // Dim veil in front of the field
        shapes::quad(
            Vec3::new(0.0, 0.0, 5.0),
            Vec2::new(40.0, 30.0),
            [0.0, 0.0, 0.0, 0.45],
            &mut tris,
        );
    }

    project(&tris, &Camera::new(aspect))
}

/// Project and sort back to front, dropping triangles that cross the eye
pub fn project(tris: &[WorldTri], camera: &Camera) -> Vec<Vertex> {
    let mut projected: Vec<([Vec3; 3], [f32; 4], f32)> = tris
        .iter()
        .filter_map(|tri| {
            let a = camera.project(tri.points[0])?;
            let b = camera.project(tri.points[1])?;
            let c = camera.project(tri.points[2])?;
            let depth = (a.z + b.z + c.z) / 3.0;
            Some(([a, b, c], tri.color, depth))
        })
        .collect();
    projected.sort_by(|a, b| b.2.total_cmp(&a.2));

    projected
        .iter()
        .flat_map(|(points, color, _)| points.map(|p| Vertex::new(p.x, p.y, p.z, *color)))
        .collect()
}

fn starfield(count: usize, time: f32, out: &mut Vec<WorldTri>) {
    let mut rng = Pcg32::seed_from_u64(STAR_SEED);
    for _ in 0..count {
        let pos = Vec3::new(
            rng.random_range(-150.0..150.0),
            rng.random_range(-100.0..100.0),
            rng.random_range(-150.0..-50.0),
        );
        let phase: f32 = rng.random_range(0.0..std::f32::consts::TAU);
        let twinkle = 0.6 + 0.4 * (time * 1.5 + phase).sin();
        shapes::billboard(pos, 0.5, rgba(colors::STAR, twinkle), out);
    }
}

fn walls(field: Vec2, out: &mut Vec<WorldTri>) {
    let half_w = field.x / 2.0;
    let half_h = field.y / 2.0;
    let t = WALL_THICKNESS / 2.0;
    let color = rgba(colors::WALL, 1.0);
    for side in [-1.0, 1.0] {
        shapes::cuboid(
            Vec3::new(side * (half_w + t), 0.0, 0.0),
            Vec3::new(t, half_h + WALL_THICKNESS, t),
            Quat::IDENTITY,
            color,
            out,
        );
    }
    shapes::cuboid(
        Vec3::new(0.0, half_h + t, 0.0),
        Vec3::new(half_w, t, t),
        Quat::IDENTITY,
        color,
        out,
    );
}

fn bricks(bricks: &[Brick], out: &mut Vec<WorldTri>) {
    for brick in bricks {
        let mut color = rgba(brick.kind.color(), brick.opacity);
        if brick.damaged {
            color = shade(color, 0.6);
        }
        let half = Brick::half_extents();
        shapes::cuboid(
            brick.pos.extend(0.0),
            Vec3::new(half.x, half.y, crate::consts::BRICK_DEPTH / 2.0),
            Quat::IDENTITY,
            color,
            out,
        );
    }
}

fn paddle(game: &Game, out: &mut Vec<WorldTri>) {
    let paddle = &game.paddle;
    let half = Vec3::new(paddle.width, paddle.height, paddle.depth) / 2.0;
    shapes::cuboid(
        paddle.pos.extend(0.0),
        half,
        Quat::IDENTITY,
        rgba(colors::PADDLE, 1.0),
        out,
    );

    if let Some(cannons) = paddle.cannons() {
        for cannon in cannons {
            shapes::cuboid(
                cannon.extend(0.0),
                Vec3::new(0.15, 0.3, 0.15),
                Quat::IDENTITY,
                rgba(colors::CANNON, 1.0),
                out,
            );
        }
    }

    let lifetime = game.tuning.laser_lifetime.max(f32::EPSILON);
    for laser in paddle.lasers() {
        let fade = (1.0 - laser.age / lifetime).clamp(0.0, 1.0);
        shapes::beam(
            laser.origin,
            laser.origin + Vec2::new(0.0, LASER_RANGE),
            0.15,
            0.1,
            rgba(colors::LASER, fade),
            out,
        );
    }

    if paddle.has_shield() {
        let half_w = game.field.x / 2.0;
        let pulse = 0.3 + 0.1 * (game.time * 4.0).sin();
        shapes::quad(
            Vec3::new(0.0, SHIELD_Y, 0.2),
            Vec2::new(half_w, 0.15),
            rgba(colors::SHIELD, pulse),
            out,
        );
    }
}

fn power_ups(game: &Game, out: &mut Vec<WorldTri>) {
    for power_up in game.power_ups.falling() {
        let rotation =
            Quat::from_rotation_y(power_up.spin) * Quat::from_rotation_x(power_up.spin * 0.5);
        shapes::cuboid(
            power_up.pos.extend(0.0),
            Vec3::splat(crate::consts::POWER_UP_HALF_SIZE),
            rotation,
            rgba(power_up.kind.color(), 1.0),
            out,
        );
    }
}

fn balls(game: &Game, out: &mut Vec<WorldTri>) {
    for ball in &game.balls {
        let color = rgba(ball.color(), 1.0);
        let len = ball.trail.len().max(1) as f32;
        for (i, point) in ball.trail.iter().enumerate() {
            // Newest point first
            let age = i as f32 / len;
            let alpha = (1.0 - age) * 0.5;
            let size = ball.radius * 2.0 * (1.0 - age * 0.7);
            shapes::billboard(
                point.extend(-0.05),
                size,
                [color[0], color[1], color[2], alpha],
                out,
            );
        }
        let r = ball.radius;
        shapes::cuboid(
            ball.pos.extend(0.0),
            Vec3::splat(r),
            Quat::from_rotation_z(game.time * 3.0),
            color,
            out,
        );
    }
}

fn particles(game: &Game, out: &mut Vec<WorldTri>) {
    for particle in game.particles.particles() {
        let life = particle.life_fraction();
        let [r, g, b] = shapes::hex_to_rgb(particle.color);
        shapes::billboard(particle.pos, particle.size * (0.5 + 0.5 * life), [r, g, b, life], out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::QualityPreset;
    use crate::tuning::Tuning;

    fn settings(quality: QualityPreset, particles: bool) -> Settings {
        let mut settings = Settings::from_preset(quality);
        settings.particles = particles;
        settings
    }

    #[test]
    fn test_camera_centers_origin() {
        let camera = Camera::new(16.0 / 9.0);
        let p = camera.project(Vec3::ZERO).unwrap();
        assert!(p.x.abs() < 1e-6 && p.y.abs() < 1e-6);
        assert!(p.z > 0.0 && p.z < 1.0);
    }

    #[test]
    fn test_camera_field_of_view() {
        let camera = Camera::new(1.0);
        // At the play plane the top of the view is CAMERA_Z * tan(30 deg)
        let edge = CAMERA_Z * (FOV_Y_DEG / 2.0).to_radians().tan();
        let p = camera.project(Vec3::new(0.0, edge, 0.0)).unwrap();
        assert!((p.y - 1.0).abs() < 1e-4);
        // Farther objects project closer to the center
        let far = camera.project(Vec3::new(0.0, edge, -25.0)).unwrap();
        assert!(far.y < p.y);
        assert!(far.z > p.z);
    }

    #[test]
    fn test_screen_to_field_matches_projection() {
        let (w, h) = (1600.0, 900.0);
        assert_eq!(screen_to_field_x(800.0, w, h), 0.0);
        let camera = Camera::new(w / h);
        for px in [0.0, 400.0, 1200.0, 1600.0] {
            let x = screen_to_field_x(px, w, h);
            let ndc = camera.project(Vec3::new(x, 0.0, 0.0)).unwrap();
            assert!((ndc.x - (px / w * 2.0 - 1.0)).abs() < 1e-4);
        }
        assert_eq!(screen_to_field_x(10.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_behind_camera_dropped() {
        let camera = Camera::new(1.0);
        assert!(camera.project(Vec3::new(0.0, 0.0, CAMERA_Z + 1.0)).is_none());
        let tri = WorldTri {
            points: [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 30.0),
            ],
            color: [1.0; 4],
        };
        assert!(project(&[tri], &camera).is_empty());
    }

    #[test]
    fn test_sorted_back_to_front() {
        let camera = Camera::new(1.0);
        let mut tris = Vec::new();
        shapes::billboard(Vec3::new(0.0, 0.0, 5.0), 1.0, [1.0, 0.0, 0.0, 1.0], &mut tris);
        shapes::billboard(Vec3::new(0.0, 0.0, -20.0), 1.0, [0.0, 0.0, 1.0, 1.0], &mut tris);
        let verts = project(&tris, &camera);
        assert_eq!(verts.len(), 12);
        // The far (blue) quad is drawn first
        assert_eq!(verts[0].color, [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(verts[11].color, [1.0, 0.0, 0.0, 1.0]);
        let depths: Vec<f32> = verts.chunks(3).map(|t| t[0].position[2]).collect();
        assert!(depths.windows(2).all(|w| w[0] >= w[1] - 1e-6));
    }

    #[test]
    fn test_build_scene() {
        let mut game = Game::new(Tuning::default(), 3);
        game.start();
        let verts = build(&game, &settings(QualityPreset::Low, true), 0.0, 16.0 / 9.0);
        assert_eq!(verts.len() % 3, 0);
        // Bricks, paddle, ball and walls are all there
        let min_boxes = game.bricks.brick_count() + 1 + 1 + 3;
        assert!(verts.len() >= min_boxes * 36);
        assert!(verts.iter().all(|v| v.position.iter().all(|c| c.is_finite())));
    }

    #[test]
    fn test_quality_controls_extras() {
        let mut game = Game::new(Tuning::default(), 3);
        game.start();
        let low = build(&game, &settings(QualityPreset::Low, true), 0.0, 1.5);
        let high = build(&game, &settings(QualityPreset::High, true), 0.0, 1.5);
        assert!(high.len() > low.len());

        // Particles only when enabled
        game.particles
            .brick_destruction(Vec2::ZERO, 0xff0000, &mut Pcg32::seed_from_u64(1));
        let with = build(&game, &settings(QualityPreset::Low, true), 0.0, 1.5);
        let without = build(&game, &settings(QualityPreset::Low, false), 0.0, 1.5);
        assert!(with.len() > without.len());
        assert_eq!(without.len(), low.len());
    }
}
