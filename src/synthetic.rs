//! Seeded synthetic snapshots for driving the pipeline without a game client
//!
//! A small arena of drifting food, fast prey and wandering enemy snakes
//! around a player that walks in a slow circle. Same seed, same frames.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::signals::{EnemyRecord, EntityRecord, PlayerFrame, Signals};

/// Shape of the generated arena
#[derive(Debug, Clone, PartialEq)]
pub struct ArenaConfig {
    /// Entities spawn within this distance of the player
    pub radius: f64,
    pub food: usize,
    pub prey: usize,
    pub enemies: usize,
    pub segments_per_enemy: usize,
    /// Chance per tick that an item jumps far enough to be an outlier
    pub teleport_chance: f64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            radius: 1500.0,
            food: 300,
            prey: 8,
            enemies: 4,
            segments_per_enemy: 12,
            teleport_chance: 0.01,
        }
    }
}

#[derive(Debug, Clone)]
struct Mover {
    x: f64,
    y: f64,
    dx: f64,
    dy: f64,
    size: f64,
}

#[derive(Debug, Clone)]
struct Snake {
    segments: Vec<(f64, f64)>,
    heading: f64,
    size: f64,
}

pub struct SyntheticArena {
    config: ArenaConfig,
    rng: StdRng,
    tick: u64,
    player: (f64, f64),
    food: Vec<Mover>,
    prey: Vec<Mover>,
    enemies: Vec<Snake>,
}

impl SyntheticArena {
    pub fn new(seed: u64, config: ArenaConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let player = (0.0, 0.0);

        let food = (0..config.food)
            .map(|_| spawn_mover(&mut rng, player, config.radius, 0.5, 1.0..12.0))
            .collect();
        let prey = (0..config.prey)
            .map(|_| spawn_mover(&mut rng, player, config.radius, 6.0, 1.0..4.0))
            .collect();
        let enemies = (0..config.enemies)
            .map(|_| {
                let (hx, hy) = random_point(&mut rng, player, config.radius);
                let heading = rng.gen_range(0.0..std::f64::consts::TAU);
                let segments = (0..config.segments_per_enemy)
                    .map(|i| {
                        let back = i as f64 * 15.0;
                        (hx - heading.cos() * back, hy - heading.sin() * back)
                    })
                    .collect();
                Snake {
                    segments,
                    heading,
                    size: rng.gen_range(1.0..5.0),
                }
            })
            .collect();

        Self {
            config,
            rng,
            tick: 0,
            player,
            food,
            prey,
            enemies,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance one tick and return the snapshot the bot would see
    pub fn step(&mut self) -> Signals {
        self.tick += 1;
        let t = self.tick as f64 * 0.01;
        self.player = (t.cos() * 400.0, t.sin() * 400.0);

        let teleport_chance = self.config.teleport_chance;
        for mover in self.food.iter_mut().chain(self.prey.iter_mut()) {
            if self.rng.gen_bool(teleport_chance) {
                mover.dx = self.rng.gen_range(-300.0..300.0);
                mover.dy = self.rng.gen_range(-300.0..300.0);
            } else {
                mover.dx += self.rng.gen_range(-0.2..0.2);
                mover.dy += self.rng.gen_range(-0.2..0.2);
                mover.dx = mover.dx.clamp(-8.0, 8.0);
                mover.dy = mover.dy.clamp(-8.0, 8.0);
            }
            mover.x += mover.dx;
            mover.y += mover.dy;
        }

        for snake in &mut self.enemies {
            snake.heading += self.rng.gen_range(-0.15..0.15);
            let Some(&(hx, hy)) = snake.segments.first() else {
                continue;
            };
            let head = (hx + snake.heading.cos() * 10.0, hy + snake.heading.sin() * 10.0);
            snake.segments.pop();
            snake.segments.insert(0, head);
        }

        self.snapshot()
    }

    /// `n` consecutive snapshots
    pub fn frames(&mut self, n: usize) -> Vec<Signals> {
        (0..n).map(|_| self.step()).collect()
    }

    fn snapshot(&self) -> Signals {
        let record = |m: &Mover| {
            EntityRecord::at(m.x, m.y)
                .with_size(m.size)
                .with_delta(m.dx, m.dy)
        };
        Signals {
            player: Some(PlayerFrame::at(self.player.0, self.player.1)),
            food: Some(self.food.iter().map(record).collect()),
            prey: Some(self.prey.iter().map(record).collect()),
            enemies: Some(
                self.enemies
                    .iter()
                    .map(|snake| EnemyRecord {
                        parts: snake
                            .segments
                            .iter()
                            .map(|&(x, y)| EntityRecord::at(x, y).with_size(snake.size))
                            .collect(),
                    })
                    .collect(),
            ),
        }
    }
}

fn random_point(rng: &mut StdRng, center: (f64, f64), radius: f64) -> (f64, f64) {
    let angle = rng.gen_range(0.0..std::f64::consts::TAU);
    let dist = radius * rng.gen_range(0.0_f64..1.0).sqrt();
    (center.0 + angle.cos() * dist, center.1 + angle.sin() * dist)
}

fn spawn_mover(
    rng: &mut StdRng,
    center: (f64, f64),
    radius: f64,
    speed: f64,
    size: std::ops::Range<f64>,
) -> Mover {
    let (x, y) = random_point(rng, center, radius);
    let heading = rng.gen_range(0.0..std::f64::consts::TAU);
    let pace = rng.gen_range(0.0..=speed);
    Mover {
        x,
        y,
        dx: heading.cos() * pace,
        dy: heading.sin() * pace,
        size: rng.gen_range(size),
    }
}
