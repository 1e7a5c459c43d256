//! Game orchestrator: run state machine, scoring and cross-entity collisions

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::ball::{Ball, BallStep};
use super::bricks::{Brick, BrickManager};
use super::collision::Aabb;
use super::events::{Fx, GameEvent};
use super::paddle::Paddle;
use super::particles::ParticleSystem;
use super::powerups::{PowerUpChange, PowerUpKind, PowerUpManager};
use crate::consts::{DEFAULT_FIELD_WIDTH, FIELD_HEIGHT};
use crate::field_width_for_aspect;
use crate::highscore::HighScore;
use crate::tuning::Tuning;

/// Ball speed that maps to a full-strength brick hit sound
const HIT_SPEED_SCALE: f32 = 20.0;
/// Sound intensity of a laser hit
const LASER_HIT_INTENSITY: f32 = 0.5;
/// Combo count at which music intensity maxes out
const COMBO_FOR_FULL_INTENSITY: f32 = 10.0;

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Title screen, nothing simulated yet
    Start,
    Playing,
    Paused,
    /// Run ended; waiting for restart
    GameOver,
}

/// Input commands for a single step
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Desired paddle x (from mouse/touch)
    pub target_x: Option<f32>,
    /// Release held balls (click/tap/space)
    pub release: bool,
    /// Pause toggle
    pub pause: bool,
    /// Idle/demo mode - autopilot plays the game
    pub idle_mode: bool,
}

#[derive(Debug, Clone)]
pub struct Game {
    pub phase: GamePhase,
    pub score: u64,
    pub combo: u32,
    /// Seconds until the combo lapses
    pub combo_timer: f32,
    pub difficulty: f32,
    /// Seconds since the last difficulty increase
    pub difficulty_timer: f32,
    pub balls_remaining: u32,
    pub balls: Vec<Ball>,
    pub paddle: Paddle,
    pub bricks: BrickManager,
    pub power_ups: PowerUpManager,
    pub particles: ParticleSystem,
    /// 0-1, drives the music layers
    pub music_intensity: f32,
    pub high_score: HighScore,
    /// Play field size (width, height)
    pub field: Vec2,
    /// Seconds of play this run
    pub time: f32,
    pub tuning: Tuning,
    rng: Pcg32,
    events: Vec<GameEvent>,
    /// Paddle width to restore when Paddle Expansion ends
    expanded_from: Option<f32>,
}

impl Game {
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let mut game = Self {
            phase: GamePhase::Start,
            score: 0,
            combo: 0,
            combo_timer: 0.0,
            difficulty: tuning.starting_difficulty,
            difficulty_timer: 0.0,
            balls_remaining: tuning.starting_balls,
            balls: Vec::new(),
            paddle: Paddle::new(&tuning),
            bricks: BrickManager::new(tuning.explosion_radius),
            power_ups: PowerUpManager::new(),
            particles: ParticleSystem::new(1.0),
            music_intensity: 0.0,
            high_score: HighScore::new(),
            field: Vec2::new(DEFAULT_FIELD_WIDTH, FIELD_HEIGHT),
            time: 0.0,
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            expanded_from: None,
        };
        game.spawn_attached_ball();
        game
    }

    /// Resize the field for a viewport aspect ratio (width / height)
    pub fn set_aspect(&mut self, aspect: f32) {
        self.field.x = field_width_for_aspect(aspect);
    }

    /// Take all events queued since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // === Run lifecycle ===

    /// Leave the title screen and begin a run
    pub fn start(&mut self) {
        self.begin_run();
    }

    /// New run after game over
    pub fn restart(&mut self) {
        self.begin_run();
    }

    fn begin_run(&mut self) {
        self.reset();
        self.bricks.generate_level(self.difficulty, &mut self.rng);
        self.phase = GamePhase::Playing;
        self.events.push(GameEvent::MusicStart);
        log::info!("Run started ({} balls)", self.balls_remaining);
    }

    /// Clear score, power-ups and bricks; one ball waiting on the paddle
    pub fn reset(&mut self) {
        self.score = 0;
        self.combo = 0;
        self.combo_timer = 0.0;
        self.difficulty = self.tuning.starting_difficulty;
        self.difficulty_timer = 0.0;
        self.balls_remaining = self.tuning.starting_balls;
        self.music_intensity = 0.0;
        self.time = 0.0;

        let mut fx = Fx {
            rng: &mut self.rng,
            particles: &mut self.particles,
            events: &mut self.events,
        };
        // Paddle reset below undoes every side effect
        self.power_ups.clear(&mut fx);
        self.expanded_from = None;

        self.paddle.reset();
        self.balls.clear();
        self.spawn_attached_ball();
        self.bricks.clear();
    }

    fn game_over(&mut self) {
        self.phase = GamePhase::GameOver;
        let new_high_score = self.high_score.record(self.score);
        log::info!(
            "Game over: score {} (best {}{})",
            self.score,
            self.high_score.best,
            if new_high_score { ", new record" } else { "" }
        );
        self.events.push(GameEvent::GameOver {
            score: self.score,
            new_high_score,
        });
    }

    /// Launch every held ball. Returns true if any left the paddle.
    pub fn release_ball(&mut self) -> bool {
        if self.phase != GamePhase::Playing {
            return false;
        }
        let mut released = false;
        for ball in self.balls.iter_mut().filter(|b| b.is_attached()) {
            ball.release(&mut self.rng);
            released = true;
        }
        released
    }

    pub fn toggle_pause(&mut self) -> GamePhase {
        self.phase = match self.phase {
            GamePhase::Playing => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Playing,
            other => other,
        };
        self.phase
    }

    fn spawn_attached_ball(&mut self) {
        let pos = Vec2::new(
            self.paddle.pos.x,
            self.paddle.top() + self.tuning.ball_radius,
        );
        let mut ball = Ball::new(pos, &self.tuning, &mut self.rng);
        ball.attach_to_paddle(&self.paddle);
        self.balls.push(ball);
    }

    // === Per-step update ===

    /// Apply input, then advance one fixed step
    pub fn tick(&mut self, input: &TickInput, dt: f32) {
        if input.pause {
            self.toggle_pause();
        }
        if self.phase != GamePhase::Playing {
            return;
        }

        let input = if input.idle_mode {
            self.autopilot(input)
        } else {
            input.clone()
        };
        if let Some(x) = input.target_x {
            self.paddle.target_x = x;
        }
        if input.release {
            self.release_ball();
        }

        self.update(dt);
    }

    /// Advance the world by `dt` seconds (Playing only)
    pub fn update(&mut self, dt: f32) {
        if self.phase != GamePhase::Playing {
            return;
        }
        self.time += dt;

        self.paddle
            .update(dt, self.field.x, &mut self.particles, &mut self.rng);

        self.update_balls(dt);
        if self.phase != GamePhase::Playing {
            return;
        }

        self.bricks.update(dt);

        let changes = {
            let mut fx = Fx {
                rng: &mut self.rng,
                particles: &mut self.particles,
                events: &mut self.events,
            };
            self.power_ups.update(dt, &self.paddle, &mut fx)
        };
        for change in changes {
            self.apply_power_up_change(change);
        }

        self.particles.update(dt);

        if self.combo > 0 {
            self.combo_timer -= dt;
            if self.combo_timer <= 0.0 {
                self.combo = 0;
            }
        }

        self.difficulty_timer += dt;
        if self.difficulty_timer >= self.tuning.difficulty_interval {
            self.difficulty_timer = 0.0;
            self.difficulty += self.tuning.difficulty_step;
            self.bricks.regenerate(
                self.difficulty,
                self.tuning.periodic_refill_count,
                &mut self.rng,
            );
            log::info!("Difficulty up: {}", self.difficulty);
            self.events.push(GameEvent::LevelUp {
                difficulty: self.difficulty,
            });
        }

        self.music_intensity = self.compute_music_intensity();

        if self.bricks.brick_count() < self.tuning.low_brick_threshold {
            self.bricks.regenerate(
                self.difficulty,
                self.tuning.low_brick_refill_count,
                &mut self.rng,
            );
        }

        self.resolve_lasers();
    }

    fn compute_music_intensity(&self) -> f32 {
        let brick_factor =
            1.0 - self.bricks.destructible_count() as f32 / self.tuning.intensity_brick_scale;
        let combo_factor = (self.combo as f32 / COMBO_FOR_FULL_INTENSITY).min(1.0);
        brick_factor.max(combo_factor).clamp(0.0, 1.0)
    }

    fn update_balls(&mut self, dt: f32) {
        let slow = self.power_ups.is_active(PowerUpKind::SlowMotion);
        let fireball = self.power_ups.is_active(PowerUpKind::Fireball);
        let brick_buster = self.power_ups.is_active(PowerUpKind::BrickBuster);
        let magnetic = self.power_ups.is_active(PowerUpKind::MagneticPaddle);
        let slow_factor = self.tuning.slow_motion_factor;

        // Newest first
        let mut i = self.balls.len();
        while i > 0 {
            i -= 1;

            let step = {
                let ball = &mut self.balls[i];
                ball.set_slow_motion(slow, slow_factor);
                ball.fireball = fireball;
                ball.brick_buster = brick_buster;
                ball.magnetic = magnetic;

                let mut fx = Fx {
                    rng: &mut self.rng,
                    particles: &mut self.particles,
                    events: &mut self.events,
                };
                ball.update(dt, &self.paddle, self.field, &mut fx)
            };

            match step {
                BallStep::Held => {}
                BallStep::Moving => self.collide_ball_with_bricks(i),
                BallStep::Lost => {
                    self.balls.remove(i);

                    if self.paddle.has_shield() {
                        self.paddle.deactivate_shield();
                        self.spawn_attached_ball();
                        self.end_power_up(PowerUpKind::Shield);
                        self.events.push(GameEvent::ShieldUsed);
                        continue;
                    }

                    if self.balls.is_empty() {
                        self.balls_remaining = self.balls_remaining.saturating_sub(1);
                        self.events.push(GameEvent::BallLost);
                        if self.balls_remaining == 0 {
                            self.game_over();
                            return;
                        }
                        self.spawn_attached_ball();
                    }
                }
            }
        }

        if self.power_ups.is_active(PowerUpKind::MultiBall) && self.balls.len() == 1 {
            let extra = self.balls[0].split();
            self.balls.extend(extra);
            self.end_power_up(PowerUpKind::MultiBall);
        }
    }

    /// Test ball `i` against the bricks, newest brick first
    fn collide_ball_with_bricks(&mut self, i: usize) {
        let candidates: Vec<(u32, Aabb)> = self
            .bricks
            .bricks()
            .iter()
            .rev()
            .filter(|b| b.tangible)
            .map(|b| (b.id, b.bounds()))
            .collect();

        for (id, bounds) in candidates {
            // Gone to an explosion earlier in this loop
            if self.bricks.get(id).is_none() {
                continue;
            }
            let ball = &mut self.balls[i];
            if !ball.collide_box(&bounds) {
                continue;
            }
            let intensity = ball.vel.length() / HIT_SPEED_SCALE;
            let keeps_going = ball.fireball || ball.brick_buster;

            let points = {
                let mut fx = Fx {
                    rng: &mut self.rng,
                    particles: &mut self.particles,
                    events: &mut self.events,
                };
                self.bricks
                    .hit_brick(id, intensity, &mut self.power_ups, &mut fx)
            };
            if points > 0 {
                self.award_combo_points(points);
            }

            if !keeps_going {
                break;
            }
        }
    }

    fn award_combo_points(&mut self, points: u32) {
        let multiplier = 1.0 + self.combo as f64 * self.tuning.combo_step as f64;
        self.score += (points as f64 * multiplier).floor() as u64;
        self.combo += 1;
        self.combo_timer = self.tuning.combo_window;
    }

    /// Each new beam strikes the nearest brick above it
    fn resolve_lasers(&mut self) {
        let beams = self.paddle.take_fresh_lasers();
        if beams.is_empty() || !self.power_ups.is_active(PowerUpKind::LaserCannon) {
            return;
        }
        let half = Brick::half_extents();

        for beam in beams {
            let target = self
                .bricks
                .bricks()
                .iter()
                .filter(|b| {
                    b.tangible
                        && (b.pos.x - beam.origin.x).abs() < half.x
                        && b.pos.y > beam.origin.y
                        && b.pos.y - half.y <= beam.top()
                })
                .min_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
                .map(|b| b.id);

            if let Some(id) = target {
                let mut fx = Fx {
                    rng: &mut self.rng,
                    particles: &mut self.particles,
                    events: &mut self.events,
                };
                let points =
                    self.bricks
                        .hit_brick(id, LASER_HIT_INTENSITY, &mut self.power_ups, &mut fx);
                self.score += points as u64;
            }
        }
    }

    // === Power-up side effects ===

    /// Grant a power-up as if it had been caught
    pub fn activate_power_up(&mut self, kind: PowerUpKind) {
        let mut fx = Fx {
            rng: &mut self.rng,
            particles: &mut self.particles,
            events: &mut self.events,
        };
        if self.power_ups.activate(kind, &mut fx) {
            self.apply_power_up_change(PowerUpChange::Activated(kind));
        }
    }

    fn end_power_up(&mut self, kind: PowerUpKind) {
        let mut fx = Fx {
            rng: &mut self.rng,
            particles: &mut self.particles,
            events: &mut self.events,
        };
        if self.power_ups.deactivate(kind, &mut fx) {
            self.apply_power_up_change(PowerUpChange::Deactivated(kind));
        }
    }

    fn apply_power_up_change(&mut self, change: PowerUpChange) {
        match change {
            PowerUpChange::Activated(PowerUpKind::PaddleExpansion) => {
                if self.expanded_from.is_none() {
                    self.expanded_from = Some(self.paddle.expand(self.tuning.paddle_expand_factor));
                }
            }
            PowerUpChange::Deactivated(PowerUpKind::PaddleExpansion) => {
                if let Some(width) = self.expanded_from.take() {
                    self.paddle.reset_width(width);
                }
            }
            PowerUpChange::Activated(PowerUpKind::LaserCannon) => self.paddle.activate_lasers(),
            PowerUpChange::Deactivated(PowerUpKind::LaserCannon) => {
                self.paddle.deactivate_lasers()
            }
            PowerUpChange::Activated(PowerUpKind::Shield) => self.paddle.activate_shield(),
            PowerUpChange::Deactivated(PowerUpKind::Shield) => self.paddle.deactivate_shield(),
            // Ball modifiers are re-applied every step
            _ => {}
        }
    }

    // === Autopilot ===

    /// Steer toward where the most urgent ball will reach the paddle
    fn autopilot(&self, input: &TickInput) -> TickInput {
        let mut input = input.clone();
        if self.balls.iter().any(|b| b.is_attached()) {
            input.release = true;
        }

        let paddle_line = self.paddle.top();
        let half_w = self.field.x / 2.0;

        let threat = self
            .balls
            .iter()
            .filter(|b| !b.is_attached() && b.vel.y < 0.0)
            .map(|b| {
                let t = (b.pos.y - b.radius - paddle_line).max(0.0) / -b.vel.y;
                (t, b)
            })
            .min_by(|a, b| a.0.total_cmp(&b.0));

        if let Some((t, ball)) = threat {
            let landing = fold_into(ball.pos.x + ball.vel.x * t, half_w - ball.radius);
            // Vary the contact point so rallies don't settle into a loop
            let lean = (self.time * 0.7).sin() * self.paddle.width * 0.3;
            input.target_x = Some(landing - lean);
        } else if let Some(pickup) = self
            .power_ups
            .falling()
            .iter()
            .min_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
        {
            input.target_x = Some(pickup.pos.x);
        } else if let Some(ball) = self.balls.first() {
            input.target_x = Some(ball.pos.x);
        }
        input
    }
}

/// Reflect `x` back into `[-half, half]` as a ball bouncing between walls would
fn fold_into(x: f32, half: f32) -> f32 {
    if half <= 0.0 {
        return 0.0;
    }
    let span = half * 2.0;
    let m = (x + half).rem_euclid(span * 2.0);
    let folded = if m > span { span * 2.0 - m } else { m };
    folded - half
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::BrickKind;

    fn playing() -> Game {
        let mut game = Game::new(Tuning::default(), 12345);
        game.start();
        game.drain_events();
        game
    }

    fn free_ball(game: &mut Game, pos: Vec2, vel: Vec2) {
        let mut ball = Ball::new(pos, &game.tuning, &mut game.rng);
        ball.vel = vel;
        game.balls = vec![ball];
    }

    #[test]
    fn test_start_generates_level() {
        let mut game = Game::new(Tuning::default(), 1);
        assert_eq!(game.phase, GamePhase::Start);
        assert!(!game.release_ball());

        game.start();
        assert_eq!(game.phase, GamePhase::Playing);
        assert_eq!(game.bricks.brick_count(), 30);
        assert_eq!(game.balls.len(), 1);
        assert!(game.balls[0].is_attached());
        assert_eq!(game.balls_remaining, 3);
        assert!(game.drain_events().contains(&GameEvent::MusicStart));
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn test_release_launches_held_ball() {
        let mut game = playing();
        assert!(game.release_ball());
        assert!(!game.balls[0].is_attached());
        assert!(game.balls[0].vel.y > 0.0);
        assert!(!game.release_ball());
    }

    #[test]
    fn test_pause_freezes_world() {
        let mut game = playing();
        game.release_ball();
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        game.tick(&pause, SIM_DT);
        assert_eq!(game.phase, GamePhase::Paused);

        let before = game.balls[0].pos;
        for _ in 0..10 {
            game.tick(&TickInput::default(), SIM_DT);
        }
        assert_eq!(game.balls[0].pos, before);

        game.tick(&pause, SIM_DT);
        assert_eq!(game.phase, GamePhase::Playing);
        assert_ne!(game.balls[0].pos, before);
    }

    #[test]
    fn test_combo_multiplies_points() {
        let mut game = playing();
        game.bricks.clear();
        game.bricks.spawn_brick(Vec2::new(0.0, 0.0), BrickKind::Standard);
        game.bricks.spawn_brick(Vec2::new(4.0, 0.0), BrickKind::Standard);

        free_ball(&mut game, Vec2::new(0.0, -0.7), Vec2::new(0.0, 15.0));
        game.update(SIM_DT);
        assert_eq!(game.score, 100);
        assert_eq!(game.combo, 1);
        assert!(game.combo_timer > 4.9);
        assert!(game.balls[0].vel.y < 0.0);

        free_ball(&mut game, Vec2::new(4.0, -0.7), Vec2::new(0.0, 15.0));
        game.update(SIM_DT);
        // 100 * 1.1
        assert_eq!(game.score, 210);
        assert_eq!(game.combo, 2);
    }

    #[test]
    fn test_combo_lapses() {
        let mut game = playing();
        game.combo = 4;
        game.combo_timer = 0.01;
        game.update(SIM_DT);
        assert_eq!(game.combo, 4);
        game.update(SIM_DT);
        assert_eq!(game.combo, 0);
    }

    #[test]
    fn test_plain_ball_stops_at_first_brick() {
        let mut game = playing();
        game.bricks.clear();
        // Two overlapping targets under the same ball
        game.bricks.spawn_brick(Vec2::new(-0.5, 0.0), BrickKind::Standard);
        game.bricks.spawn_brick(Vec2::new(0.5, 0.0), BrickKind::Standard);
        free_ball(&mut game, Vec2::new(0.0, -0.7), Vec2::new(0.0, 15.0));
        game.update(SIM_DT);
        assert_eq!(game.score, 100);
    }

    #[test]
    fn test_brick_buster_breaks_several() {
        let mut game = playing();
        game.bricks.clear();
        game.bricks.spawn_brick(Vec2::new(-0.5, 0.0), BrickKind::Standard);
        game.bricks.spawn_brick(Vec2::new(0.5, 0.0), BrickKind::Standard);
        game.activate_power_up(PowerUpKind::BrickBuster);
        free_ball(&mut game, Vec2::new(0.0, -0.7), Vec2::new(0.0, 15.0));
        game.update(SIM_DT);
        // 100 + 110, and the ball keeps climbing
        assert_eq!(game.score, 210);
        assert!(game.balls[0].vel.y > 0.0);
    }

    #[test]
    fn test_fireball_keeps_testing_bricks_after_bounce() {
        // The bounce off the upper brick drops the ball into the lower one
        let layout = |game: &mut Game| {
            game.bricks.clear();
            let lower = game.bricks.spawn_brick(Vec2::new(0.0, -1.0), BrickKind::Standard);
            game.bricks.spawn_brick(Vec2::new(0.0, 0.0), BrickKind::Standard);
            free_ball(game, Vec2::new(0.0, -0.7), Vec2::new(0.0, 15.0));
            lower
        };

        let mut plain = playing();
        let lower = layout(&mut plain);
        plain.update(SIM_DT);
        assert_eq!(plain.score, 100);
        assert!(plain.bricks.get(lower).is_some());
        assert!(plain.balls[0].vel.y < 0.0);

        let mut fire = playing();
        let lower = layout(&mut fire);
        fire.activate_power_up(PowerUpKind::Fireball);
        fire.update(SIM_DT);
        // 100 + 110, reflected twice
        assert_eq!(fire.score, 210);
        assert!(fire.bricks.get(lower).is_none());
        assert!(fire.balls[0].vel.y > 0.0);
    }

    #[test]
    fn test_losing_last_ball_costs_a_life() {
        let mut game = playing();
        free_ball(&mut game, Vec2::new(0.0, -15.3), Vec2::new(0.0, -15.0));
        game.update(SIM_DT);
        assert_eq!(game.balls_remaining, 2);
        assert_eq!(game.balls.len(), 1);
        assert!(game.balls[0].is_attached());
        assert!(game.drain_events().contains(&GameEvent::BallLost));
    }

    #[test]
    fn test_game_over_records_high_score() {
        let mut game = playing();
        game.balls_remaining = 1;
        game.score = 500;
        free_ball(&mut game, Vec2::new(0.0, -15.3), Vec2::new(0.0, -15.0));
        game.update(SIM_DT);
        assert_eq!(game.phase, GamePhase::GameOver);
        assert_eq!(game.high_score.best, 500);
        assert!(game.drain_events().contains(&GameEvent::GameOver {
            score: 500,
            new_high_score: true,
        }));

        // Nothing moves after game over
        game.update(SIM_DT);
        assert_eq!(game.phase, GamePhase::GameOver);

        game.restart();
        assert_eq!(game.phase, GamePhase::Playing);
        assert_eq!(game.score, 0);
        assert_eq!(game.high_score.best, 500);
    }

    #[test]
    fn test_shield_saves_ball() {
        let mut game = playing();
        game.activate_power_up(PowerUpKind::Shield);
        assert!(game.paddle.has_shield());

        free_ball(&mut game, Vec2::new(0.0, -15.3), Vec2::new(0.0, -15.0));
        game.update(SIM_DT);
        assert_eq!(game.balls_remaining, 3);
        assert_eq!(game.balls.len(), 1);
        assert!(!game.paddle.has_shield());
        assert!(!game.power_ups.is_active(PowerUpKind::Shield));
        let events = game.drain_events();
        assert!(events.contains(&GameEvent::ShieldUsed));
        assert!(events.contains(&GameEvent::PowerUpEnded(PowerUpKind::Shield)));
    }

    #[test]
    fn test_multi_ball_splits_once() {
        let mut game = playing();
        game.release_ball();
        game.activate_power_up(PowerUpKind::MultiBall);
        game.update(SIM_DT);
        assert_eq!(game.balls.len(), 3);
        assert!(!game.power_ups.is_active(PowerUpKind::MultiBall));
        game.update(SIM_DT);
        assert_eq!(game.balls.len(), 3);
    }

    #[test]
    fn test_paddle_expansion_round_trip() {
        let mut game = playing();
        game.activate_power_up(PowerUpKind::PaddleExpansion);
        assert_eq!(game.paddle.width, 6.0);
        // Refresh does not stack
        game.activate_power_up(PowerUpKind::PaddleExpansion);
        assert_eq!(game.paddle.width, 6.0);
        game.end_power_up(PowerUpKind::PaddleExpansion);
        assert_eq!(game.paddle.width, 4.0);
    }

    #[test]
    fn test_laser_hits_nearest_brick_above() {
        let mut game = playing();
        game.bricks.clear();
        // Back row keeps the field from refilling
        for col in 0..10 {
            game.bricks
                .spawn_brick(Vec2::new(-9.0 + col as f32 * 2.0, 12.0), BrickKind::Indestructible);
        }
        // Under the left cannon (x = -1.7)
        let target = game.bricks.spawn_brick(Vec2::new(-1.7, 0.0), BrickKind::Standard);

        game.activate_power_up(PowerUpKind::LaserCannon);
        assert!(game.paddle.has_lasers());
        game.update(SIM_DT);

        assert!(game.bricks.get(target).is_none());
        assert_eq!(game.score, 100);
        assert_eq!(game.combo, 0);

        game.end_power_up(PowerUpKind::LaserCannon);
        assert!(!game.paddle.has_lasers());
    }

    #[test]
    fn test_difficulty_ramps_every_interval() {
        let mut game = playing();
        game.difficulty_timer = 29.999;
        game.update(SIM_DT);
        assert_eq!(game.difficulty, 1.5);
        assert_eq!(game.difficulty_timer, 0.0);
        assert!(game
            .drain_events()
            .contains(&GameEvent::LevelUp { difficulty: 1.5 }));
    }

    #[test]
    fn test_low_brick_count_refills() {
        let mut game = playing();
        game.bricks.clear();
        game.update(SIM_DT);
        assert!(game.bricks.brick_count() > 0);
    }

    #[test]
    fn test_music_intensity() {
        let mut game = playing();
        game.bricks.clear();
        for i in 0..25 {
            let col = (i % 10) as f32;
            let row = (i / 10) as f32;
            game.bricks
                .spawn_brick(Vec2::new(-9.0 + col * 2.0, 10.0 - row * 2.0), BrickKind::Standard);
        }
        game.update(SIM_DT);
        assert!((game.music_intensity - 0.5).abs() < 1e-5);

        game.combo = 8;
        game.combo_timer = 5.0;
        game.update(SIM_DT);
        assert!((game.music_intensity - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_fold_into() {
        assert_eq!(fold_into(3.0, 10.0), 3.0);
        assert!((fold_into(12.0, 10.0) - 8.0).abs() < 1e-5);
        assert!((fold_into(-12.0, 10.0) + 8.0).abs() < 1e-5);
        assert!((fold_into(33.0, 10.0) + 7.0).abs() < 1e-5);
    }

    #[test]
    fn test_autopilot_plays() {
        let mut game = playing();
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..(20.0 / SIM_DT) as u32 {
            game.tick(&input, SIM_DT);
        }
        assert!(game.score > 0);
    }

    #[test]
    fn test_determinism() {
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        let mut a = playing();
        let mut b = playing();
        for _ in 0..1200 {
            a.tick(&input, SIM_DT);
            b.tick(&input, SIM_DT);
        }
        assert_eq!(a.score, b.score);
        assert_eq!(a.bricks.brick_count(), b.bricks.brick_count());
        assert_eq!(a.balls.len(), b.balls.len());
        assert_eq!(a.paddle.pos, b.paddle.pos);
    }
}
