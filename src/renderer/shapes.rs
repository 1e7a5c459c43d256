//! World-space primitives: shaded boxes, flat quads and beams

use glam::{Quat, Vec2, Vec3};

/// Direction towards the key light
const LIGHT_DIR: Vec3 = Vec3::new(0.4, 0.7, 0.9);
const AMBIENT: f32 = 0.35;

/// A colored triangle in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTri {
    pub points: [Vec3; 3],
    pub color: [f32; 4],
}

/// 0xRRGGBB to linear-ish [r, g, b]
pub fn hex_to_rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// Hex color with alpha
pub fn rgba(hex: u32, alpha: f32) -> [f32; 4] {
    let [r, g, b] = hex_to_rgb(hex);
    [r, g, b, alpha]
}

/// Scale the RGB channels, keeping alpha
pub fn shade(color: [f32; 4], factor: f32) -> [f32; 4] {
    [
        (color[0] * factor).min(1.0),
        (color[1] * factor).min(1.0),
        (color[2] * factor).min(1.0),
        color[3],
    ]
}

/// Lambert brightness for a face normal
fn brightness(normal: Vec3) -> f32 {
    AMBIENT + (1.0 - AMBIENT) * normal.dot(LIGHT_DIR.normalize()).max(0.0)
}

fn push_quad(out: &mut Vec<WorldTri>, corners: [Vec3; 4], color: [f32; 4]) {
    let [a, b, c, d] = corners;
    out.push(WorldTri {
        points: [a, b, c],
        color,
    });
    out.push(WorldTri {
        points: [a, c, d],
        color,
    });
}

/// Box centered at `center`, rotated about its own axes, each face lit
pub fn cuboid(center: Vec3, half: Vec3, rotation: Quat, color: [f32; 4], out: &mut Vec<WorldTri>) {
    // (normal, two in-face axes) per face
    let faces = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::Y, Vec3::X),
    ];
    for (normal, u, v) in faces {
        let face_center = normal * half;
        let du = u * half;
        let dv = v * half;
        let corners = [
            face_center - du - dv,
            face_center + du - dv,
            face_center + du + dv,
            face_center - du + dv,
        ]
        .map(|p| center + rotation * p);
        let lit = shade(color, brightness(rotation * normal));
        push_quad(out, corners, lit);
    }
}

/// Flat rectangle facing the camera (+Z)
pub fn quad(center: Vec3, half: Vec2, color: [f32; 4], out: &mut Vec<WorldTri>) {
    let corners = [
        center + Vec3::new(-half.x, -half.y, 0.0),
        center + Vec3::new(half.x, -half.y, 0.0),
        center + Vec3::new(half.x, half.y, 0.0),
        center + Vec3::new(-half.x, half.y, 0.0),
    ];
    push_quad(out, corners, color);
}

/// Square sprite of the given size
pub fn billboard(center: Vec3, size: f32, color: [f32; 4], out: &mut Vec<WorldTri>) {
    quad(center, Vec2::splat(size * 0.5), color, out);
}

/// Thick line segment in the XY plane
pub fn beam(from: Vec2, to: Vec2, width: f32, z: f32, color: [f32; 4], out: &mut Vec<WorldTri>) {
    let dir = (to - from).normalize_or_zero();
    let perp = Vec2::new(-dir.y, dir.x) * (width * 0.5);
    let corners = [from - perp, to - perp, to + perp, from + perp].map(|p| p.extend(z));
    push_quad(out, corners, color);
}
