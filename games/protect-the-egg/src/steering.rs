//! Bee steering: seek the egg, wander while far away, hold altitude.

use glam::Vec2;
use rand::Rng;
use shelter_engine::EntityId;

/// Beyond this distance bees wander on their way in.
pub const CLOSE_RANGE: f32 = 100.0;
const SEEK_FAR: f32 = 1.0;
const SEEK_CLOSE: f32 = 2.0;
const WANDER_WEIGHT: f32 = 0.5;
/// Per-tick wander heading change is drawn from ±this.
pub const WANDER_DRIFT: f32 = 0.3;
pub const CRUISE_ALTITUDE: f32 = 250.0;
const ALTITUDE_GAIN: f32 = 0.005;

/// Steering state for one bee, owned by the bee spawner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    pub target: EntityId,
    /// Force scale, drawn once per bee.
    pub speed: f32,
    /// Wander heading in radians.
    pub wander: f32,
}

impl Steering {
    pub fn new(target: EntityId, speed: f32, wander: f32) -> Self {
        Self { target, speed, wander }
    }

    /// Unscaled steering acceleration for a bee at `bee` chasing `target`.
    pub fn acceleration(&self, bee: Vec2, target: Vec2) -> Vec2 {
        let to = target - bee;
        let seek = to.normalize_or_zero();
        let mut accel = if to.length() > CLOSE_RANGE {
            seek * SEEK_FAR + Vec2::from_angle(self.wander) * WANDER_WEIGHT
        } else {
            seek * SEEK_CLOSE
        };
        accel.y += (CRUISE_ALTITUDE - bee.y) * ALTITUDE_GAIN;
        accel
    }

    /// Drift the wander heading and return this tick's force for a body of `mass`.
    pub fn force(&mut self, bee: Vec2, target: Vec2, mass: f32, rng: &mut impl Rng) -> Vec2 {
        self.wander += rng.random_range(-WANDER_DRIFT..=WANDER_DRIFT);
        self.acceleration(bee, target) * self.speed * mass
    }
}

/// Facing angle for a velocity, `None` at rest.
pub fn heading(velocity: Vec2) -> Option<f32> {
    if velocity.length_squared() <= f32::EPSILON {
        None
    } else {
        Some(velocity.y.atan2(velocity.x))
    }
}
