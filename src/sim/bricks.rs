//! Brick grid: generation, hits, explosions and phasing

use glam::Vec2;
use rand::Rng;

use super::collision::Aabb;
use super::events::{Fx, GameEvent};
use super::pick_weighted;
use super::powerups::PowerUpManager;
use crate::consts::{BRICK_HEIGHT, BRICK_WIDTH, GRID_COLUMNS, GRID_SPACING, GRID_TOP_Y};

/// Most rows a generated level can have
const MAX_ROWS: u32 = 8;
/// Regeneration only happens when the field is this sparse
const REGEN_CEILING: usize = 20;
/// Random cells tried per regenerated brick
const REGEN_ATTEMPTS: u32 = 20;
/// Regenerated bricks only go in the top rows
const REGEN_ROWS: u32 = 3;
/// Phase bricks fade in and out over this many seconds
const PHASE_PERIOD: f32 = 5.0;
/// Phase bricks at or below this opacity are intangible
const PHASE_SOLID_OPACITY: f32 = 0.3;

/// Brick types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrickKind {
    Standard,
    Reinforced,
    Explosive,
    Indestructible,
    PowerUp,
    Phase,
}

impl BrickKind {
    /// Table order; spawn weights are listed in this order
    pub const ALL: [BrickKind; 6] = [
        BrickKind::Standard,
        BrickKind::Reinforced,
        BrickKind::Explosive,
        BrickKind::Indestructible,
        BrickKind::PowerUp,
        BrickKind::Phase,
    ];

    /// Hits to destroy (None = indestructible)
    pub fn hits(self) -> Option<u32> {
        match self {
            BrickKind::Reinforced => Some(2),
            BrickKind::Indestructible => None,
            _ => Some(1),
        }
    }

    pub fn points(self) -> u32 {
        match self {
            BrickKind::Standard => 100,
            BrickKind::Reinforced => 200,
            BrickKind::Explosive => 150,
            BrickKind::Indestructible => 0,
            BrickKind::PowerUp => 150,
            BrickKind::Phase => 200,
        }
    }

    /// Chance of dropping a power-up when destroyed
    pub fn drop_chance(self) -> f64 {
        match self {
            BrickKind::Standard => 0.15,
            BrickKind::Reinforced => 0.2,
            BrickKind::Explosive => 0.1,
            BrickKind::Indestructible => 0.0,
            BrickKind::PowerUp => 1.0,
            BrickKind::Phase => 0.15,
        }
    }

    pub fn color(self) -> u32 {
        match self {
            BrickKind::Standard => 0x88CCFF,
            BrickKind::Reinforced => 0xCCFF88,
            BrickKind::Explosive => 0xFF8888,
            BrickKind::Indestructible => 0x888888,
            BrickKind::PowerUp => 0xFFCC88,
            BrickKind::Phase => 0xAA88FF,
        }
    }

    pub fn is_explosive(self) -> bool {
        self == BrickKind::Explosive
    }

    pub fn is_phasing(self) -> bool {
        self == BrickKind::Phase
    }

    pub fn is_destructible(self) -> bool {
        self.hits().is_some()
    }

    /// Fresh-level spawn weights at a difficulty
    pub fn level_weights(difficulty: f32) -> [f32; 6] {
        let d = difficulty;
        [
            0.6 - d * 0.05,
            0.1 + d * 0.03,
            0.1,
            0.05 + d * 0.01,
            0.1,
            0.05 + d * 0.02,
        ]
    }

    /// Mid-game refill weights (tougher mix)
    pub fn refill_weights(difficulty: f32) -> [f32; 6] {
        let d = difficulty;
        [
            0.5 - d * 0.05,
            0.15 + d * 0.03,
            0.1,
            0.05 + d * 0.01,
            0.1,
            0.1 + d * 0.02,
        ]
    }

    pub fn roll(weights: &[f32; 6], rng: &mut impl Rng) -> Self {
        Self::ALL[pick_weighted(weights, rng.random::<f32>())]
    }
}

/// A brick entity
#[derive(Debug, Clone, PartialEq)]
pub struct Brick {
    pub id: u32,
    pub kind: BrickKind,
    pub pos: Vec2,
    /// Remaining hits (u32::MAX for indestructible)
    pub hits_left: u32,
    /// Reinforced brick has taken a hit
    pub damaged: bool,
    pub opacity: f32,
    /// Phase bricks drop out of collision while faded
    pub tangible: bool,
}

impl Brick {
    pub fn half_extents() -> Vec2 {
        Vec2::new(BRICK_WIDTH / 2.0, BRICK_HEIGHT / 2.0)
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, Self::half_extents())
    }
}

/// Phase brick opacity at a point in game time
pub fn phase_opacity(time: f32) -> f32 {
    let phase = time.rem_euclid(PHASE_PERIOD) / PHASE_PERIOD;
    0.1 + 0.8 * (phase * std::f32::consts::PI).sin().abs()
}

#[derive(Debug, Clone)]
pub struct BrickManager {
    bricks: Vec<Brick>,
    explosion_radius: f32,
    time: f32,
    next_id: u32,
}

impl BrickManager {
    pub fn new(explosion_radius: f32) -> Self {
        Self {
            bricks: Vec::new(),
            explosion_radius,
            time: 0.0,
            next_id: 1,
        }
    }

    pub fn bricks(&self) -> &[Brick] {
        &self.bricks
    }

    pub fn get(&self, id: u32) -> Option<&Brick> {
        self.bricks.iter().find(|b| b.id == id)
    }

    pub fn brick_count(&self) -> usize {
        self.bricks.len()
    }

    pub fn destructible_count(&self) -> usize {
        self.bricks
            .iter()
            .filter(|b| b.kind.is_destructible())
            .count()
    }

    pub fn clear(&mut self) {
        self.bricks.clear();
    }

    fn cell_position(col: u32, row: u32) -> Vec2 {
        let offset_x = -(GRID_COLUMNS as f32 * GRID_SPACING) / 2.0 + GRID_SPACING / 2.0;
        Vec2::new(
            offset_x + col as f32 * GRID_SPACING,
            GRID_TOP_Y - row as f32 * GRID_SPACING,
        )
    }

    /// Place a brick; returns its id
    pub fn spawn_brick(&mut self, pos: Vec2, kind: BrickKind) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        let opacity = if kind.is_phasing() {
            phase_opacity(self.time)
        } else {
            1.0
        };
        self.bricks.push(Brick {
            id,
            kind,
            pos,
            hits_left: kind.hits().unwrap_or(u32::MAX),
            damaged: false,
            opacity,
            tangible: opacity > PHASE_SOLID_OPACITY,
        });
        id
    }

    /// Fill a fresh grid. Returns the brick count.
    pub fn generate_level(&mut self, difficulty: f32, rng: &mut impl Rng) -> usize {
        self.clear();
        let rows = MAX_ROWS.min(3 + (difficulty / 2.0).floor().max(0.0) as u32);
        let weights = BrickKind::level_weights(difficulty);

        for row in 0..rows {
            for col in 0..GRID_COLUMNS {
                let kind = BrickKind::roll(&weights, rng);
                self.spawn_brick(Self::cell_position(col, row), kind);
            }
        }
        log::info!(
            "Generated level: {} bricks, {rows} rows at difficulty {difficulty}",
            self.bricks.len()
        );
        self.bricks.len()
    }

    fn cell_is_free(&self, pos: Vec2) -> bool {
        !self
            .bricks
            .iter()
            .any(|b| (b.pos.x - pos.x).abs() < 1.0 && (b.pos.y - pos.y).abs() < 1.0)
    }

    /// Top up the upper rows of a sparse field. Returns bricks added.
    pub fn regenerate(&mut self, difficulty: f32, count: u32, rng: &mut impl Rng) -> u32 {
        if self.bricks.len() > REGEN_CEILING {
            return 0;
        }
        let weights = BrickKind::refill_weights(difficulty);
        let mut added = 0;

        for _ in 0..count {
            let mut spot = None;
            for _ in 0..REGEN_ATTEMPTS {
                let col = rng.random_range(0..GRID_COLUMNS);
                let row = rng.random_range(0..REGEN_ROWS);
                let pos = Self::cell_position(col, row);
                if self.cell_is_free(pos) {
                    spot = Some(pos);
                    break;
                }
            }
            if let Some(pos) = spot {
                let kind = BrickKind::roll(&weights, rng);
                self.spawn_brick(pos, kind);
                added += 1;
            }
        }
        if added > 0 {
            log::debug!("Regenerated {added} bricks");
        }
        added
    }

    /// Apply one hit to a brick. Returns the points earned.
    ///
    /// `intensity` scales the hit sound.
    pub fn hit_brick(
        &mut self,
        id: u32,
        intensity: f32,
        powerups: &mut PowerUpManager,
        fx: &mut Fx,
    ) -> u32 {
        let Some(index) = self.bricks.iter().position(|b| b.id == id) else {
            return 0;
        };
        let brick = &mut self.bricks[index];

        if !brick.kind.is_destructible() {
            fx.events.push(GameEvent::WallHit { intensity });
            return 0;
        }
        if brick.kind.is_phasing() && !brick.tangible {
            return 0;
        }

        brick.hits_left = brick.hits_left.saturating_sub(1);
        fx.events.push(GameEvent::BrickHit {
            kind: brick.kind,
            intensity,
        });

        if brick.hits_left > 0 {
            brick.damaged = true;
            return 0;
        }

        let brick = self.bricks.remove(index);
        self.shatter(&brick, 1.0, powerups, fx);
        if brick.kind.is_explosive() {
            self.explode(brick.pos, powerups, fx);
        }
        brick.kind.points()
    }

    /// Debris and a possible power-up drop for a destroyed brick
    fn shatter(
        &mut self,
        brick: &Brick,
        drop_scale: f64,
        powerups: &mut PowerUpManager,
        fx: &mut Fx,
    ) {
        fx.particles
            .brick_destruction(brick.pos, brick.kind.color(), fx.rng);
        let chance = (brick.kind.drop_chance() * drop_scale).clamp(0.0, 1.0);
        if fx.rng.random_bool(chance) {
            powerups.spawn(brick.pos, None, fx.rng);
        }
    }

    /// Destroy every breakable brick in range; caught explosives chain
    fn explode(&mut self, origin: Vec2, powerups: &mut PowerUpManager, fx: &mut Fx) {
        let radius = self.explosion_radius;
        let mut blasts = vec![origin];

        while let Some(center) = blasts.pop() {
            let (caught, kept): (Vec<Brick>, Vec<Brick>) =
                std::mem::take(&mut self.bricks).into_iter().partition(|b| {
                    b.kind.is_destructible() && b.pos.distance(center) < radius
                });
            self.bricks = kept;

            for brick in &caught {
                self.shatter(brick, 0.5, powerups, fx);
                if brick.kind.is_explosive() {
                    blasts.push(brick.pos);
                }
            }
        }
    }

    /// Advance phase brick fading
    pub fn update(&mut self, dt: f32) {
        self.time += dt;
        let opacity = phase_opacity(self.time);
        for brick in self.bricks.iter_mut().filter(|b| b.kind.is_phasing()) {
            brick.opacity = opacity;
            brick.tangible = opacity > PHASE_SOLID_OPACITY;
        }
    }
}
