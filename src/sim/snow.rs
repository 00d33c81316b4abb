//! Falling snow (visual only, never touches physics)

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Sideways sway of a flake (world units)
const DRIFT_AMPLITUDE: f32 = 0.35;
/// Sway cycles per second
const DRIFT_FREQUENCY: f32 = 0.8;
/// Seconds for an empty field to fill up to its cap
const FILL_SECONDS: f32 = 4.0;

/// One snowflake
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flake {
    pub pos: Vec3,
    /// Base fall velocity; drift is added on top
    pub vel: Vec3,
    /// Drift phase (radians)
    pub phase: f32,
    pub size: f32,
}

/// Seeded particle emitter over a box
#[derive(Debug, Clone)]
pub struct SnowField {
    rng: Pcg32,
    flakes: Vec<Flake>,
    cap: usize,
    spawn_budget: f32,
}

impl SnowField {
    pub fn new(seed: u64, cap: usize) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            flakes: Vec::with_capacity(cap),
            cap,
            spawn_budget: 0.0,
        }
    }

    pub fn flakes(&self) -> &[Flake] {
        &self.flakes
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Change the flake cap (quality change); extra flakes are dropped
    pub fn set_cap(&mut self, cap: usize) {
        self.cap = cap;
        self.flakes.truncate(cap);
    }

    fn spawn(&mut self, center: Vec3, half_extents: Vec3) -> Flake {
        let offset = Vec3::new(
            self.rng.random_range(-1.0..=1.0),
            self.rng.random_range(-1.0..=1.0),
            self.rng.random_range(-1.0..=1.0),
        ) * half_extents;
        Flake {
            pos: center + offset,
            vel: Vec3::new(0.0, -self.rng.random_range(0.6..1.4), 0.0),
            phase: self.rng.random_range(0.0..std::f32::consts::TAU),
            size: self.rng.random_range(0.02..0.06),
        }
    }

    /// Spawn inside the emitter box, fall with a sway, recycle below `floor_y`
    pub fn update(&mut self, dt: f32, center: Vec3, half_extents: Vec3, floor_y: f32) {
        if self.flakes.len() < self.cap {
            self.spawn_budget += self.cap as f32 / FILL_SECONDS * dt;
            while self.spawn_budget >= 1.0 && self.flakes.len() < self.cap {
                self.spawn_budget -= 1.0;
                let flake = self.spawn(center, half_extents);
                self.flakes.push(flake);
            }
        } else {
            self.spawn_budget = 0.0;
        }

        let step = DRIFT_FREQUENCY * std::f32::consts::TAU * dt;
        for i in 0..self.flakes.len() {
            let flake = &mut self.flakes[i];
            flake.phase = (flake.phase + step) % std::f32::consts::TAU;
            let drift =
                Vec3::new(flake.phase.cos(), 0.0, flake.phase.sin() * 0.5) * DRIFT_AMPLITUDE;
            flake.pos += (flake.vel + drift) * dt;

            if flake.pos.y < floor_y {
                let mut fresh = self.spawn(center, half_extents);
                // Re-enter at the top of the box
                fresh.pos.y = center.y + half_extents.y;
                self.flakes[i] = fresh;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTER: Vec3 = Vec3::new(0.0, 8.0, -7.0);
    const HALF: Vec3 = Vec3::new(12.0, 0.5, 12.0);

    fn run(field: &mut SnowField, seconds: f32) {
        let dt = 1.0 / 120.0;
        for _ in 0..(seconds / dt) as usize {
            field.update(dt, CENTER, HALF, -1.0);
        }
    }

    #[test]
    fn test_fills_to_cap_and_no_further() {
        let mut field = SnowField::new(7, 100);
        run(&mut field, 2.0);
        let half_way = field.flakes().len();
        assert!(half_way > 20 && half_way < 100, "{half_way} flakes");

        run(&mut field, 20.0);
        assert_eq!(field.flakes().len(), 100);
    }

    #[test]
    fn test_flakes_recycled_above_floor() {
        let mut field = SnowField::new(3, 50);
        run(&mut field, 30.0);
        assert!(field.flakes().iter().all(|f| f.pos.y >= -1.0));
        assert!(field.flakes().iter().any(|f| f.pos.y < CENTER.y - HALF.y));
    }

    #[test]
    fn test_same_seed_same_snow() {
        let mut a = SnowField::new(11, 40);
        let mut b = SnowField::new(11, 40);
        run(&mut a, 3.0);
        run(&mut b, 3.0);
        assert_eq!(a.flakes(), b.flakes());
    }

    #[test]
    fn test_zero_cap_and_shrink() {
        let mut field = SnowField::new(1, 0);
        run(&mut field, 1.0);
        assert!(field.flakes().is_empty());

        let mut field = SnowField::new(1, 80);
        run(&mut field, 10.0);
        field.set_cap(10);
        assert_eq!(field.flakes().len(), 10);
        run(&mut field, 1.0);
        assert_eq!(field.flakes().len(), 10);
    }
}
