//! Hail cloud and bee swarm spawners.

use std::collections::BTreeMap;
use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use shelter_engine::{
    BodyDesc, BodyKind, ColliderMaterial, EngineContext, Entity, EntityId, Outline, Skin, Sprite,
    TimerId, Timers,
};

use crate::scene::{FIELD_WIDTH, WALL_THICKNESS};
use crate::session::SessionTimer;
use crate::steering::{heading, Steering};

// -- Hail --

pub const HAIL_TICK_MS: f64 = 150.0;
const HAIL_LIFETIME_MS: f64 = 10_000.0;
const CLOUD_START_X: f32 = -100.0;
const CLOUD_SPEED: f32 = 5.0;
/// Past this the cloud has left the field.
const CLOUD_EXIT_X: f32 = 850.0;
/// Hail falls from below the cloud's centre.
const CLOUD_CENTER_OFFSET: f32 = 35.0;
const HAIL_SPREAD: f32 = 20.0;
const HAIL_DROP_Y: f32 = 80.0;
pub const HAIL_RADIUS: f32 = 6.0;
const HAIL_DRAG: f32 = 0.005;
const HAIL_MATERIAL: ColliderMaterial = ColliderMaterial {
    restitution: 0.6,
    friction: 0.3,
    density: 0.0005,
};

/// Result of one cloud tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CloudStep {
    /// Drop a hailstone around `x`.
    Drop { x: f32 },
    /// Off the field: move without dropping.
    Drift,
    /// The cloud has crossed the field.
    Passed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HailCloud {
    x: f32,
}

impl HailCloud {
    pub fn new() -> Self {
        Self { x: CLOUD_START_X }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn advance(&mut self) -> CloudStep {
        self.x += CLOUD_SPEED;
        if self.x > CLOUD_EXIT_X {
            CloudStep::Passed
        } else if self.x > 0.0 && self.x < FIELD_WIDTH {
            CloudStep::Drop {
                x: self.x + CLOUD_CENTER_OFFSET,
            }
        } else {
            CloudStep::Drift
        }
    }
}

impl Default for HailCloud {
    fn default() -> Self {
        Self::new()
    }
}

/// Moves the cloud on a fixed interval and drops hail beneath it.
#[derive(Debug, Default)]
pub struct HailSpawner {
    cloud: HailCloud,
    timer: Option<TimerId>,
}

impl HailSpawner {
    pub fn start(&mut self, timers: &mut Timers<SessionTimer>) {
        self.cloud = HailCloud::new();
        self.timer = Some(timers.schedule_interval(HAIL_TICK_MS, SessionTimer::HailTick));
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Cloud position while the spawner runs.
    pub fn cloud_x(&self) -> Option<f32> {
        self.timer.map(|_| self.cloud.x())
    }

    /// Handle one interval tick. Returns `true` once the cloud has passed.
    pub fn tick(
        &mut self,
        ctx: &mut EngineContext,
        timers: &mut Timers<SessionTimer>,
        rng: &mut impl Rng,
    ) -> bool {
        if !self.is_running() {
            return false;
        }
        match self.cloud.advance() {
            CloudStep::Drop { x } => {
                let x = x + rng.random_range(-HAIL_SPREAD..HAIL_SPREAD);
                let id = spawn_hail(ctx, Vec2::new(x, HAIL_DROP_Y));
                timers.schedule_timeout(HAIL_LIFETIME_MS, SessionTimer::Expire(id));
                false
            }
            CloudStep::Drift => false,
            CloudStep::Passed => {
                self.stop(timers);
                log::debug!("hail cloud passed");
                true
            }
        }
    }

    pub fn stop(&mut self, timers: &mut Timers<SessionTimer>) {
        if let Some(id) = self.timer.take() {
            timers.cancel(id);
        }
    }
}

fn spawn_hail(ctx: &mut EngineContext, pos: Vec2) -> EntityId {
    let outline = Outline::Circle { radius: HAIL_RADIUS };
    let desc = BodyDesc::dynamic(outline.into())
        .with_position(pos)
        .with_air_drag(HAIL_DRAG)
        .with_ccd(true);
    let id = ctx.next_id();
    let entity = Entity::new(id)
        .with_kind(BodyKind::Hail)
        .with_sprite(Sprite::skinned(outline, Skin::Hailstone));
    ctx.spawn_with_body(entity, desc, HAIL_MATERIAL)
}

// -- Bees --

pub const BEE_TICK_MS: f64 = 2000.0;
const BEE_LIFETIME_MS: f64 = 30_000.0;
const BEE_SPAWN_MIN_Y: f32 = 120.0;
const BEE_SPAWN_SPREAD_Y: f32 = 200.0;
const BEE_MIN_SPEED: f32 = 90.0;
const BEE_MAX_SPEED: f32 = 120.0;
pub const BEE_RADIUS: f32 = 10.0;
/// Just clear of the right wall's inner face.
const BEE_SPAWN_X: f32 = FIELD_WIDTH - WALL_THICKNESS / 2.0 - BEE_RADIUS;
const BEE_DRAG: f32 = 0.02;
const BEE_MATERIAL: ColliderMaterial = ColliderMaterial {
    restitution: 0.3,
    friction: 0.1,
    density: 0.001,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeeStep {
    Spawn,
    Finished,
}

/// Elapsed time of the swarm against the level duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeeClock {
    elapsed_ms: u32,
    duration_ms: u32,
}

impl BeeClock {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            elapsed_ms: 0,
            duration_ms,
        }
    }

    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    pub fn advance(&mut self) -> BeeStep {
        self.elapsed_ms = self.elapsed_ms.saturating_add(BEE_TICK_MS as u32);
        if self.elapsed_ms >= self.duration_ms {
            BeeStep::Finished
        } else {
            BeeStep::Spawn
        }
    }
}

/// Releases bees on a fixed interval and steers the live ones.
#[derive(Debug)]
pub struct BeeSpawner {
    clock: BeeClock,
    timer: Option<TimerId>,
    swarm: BTreeMap<EntityId, Steering>,
}

impl BeeSpawner {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            clock: BeeClock::new(duration_ms),
            timer: None,
            swarm: BTreeMap::new(),
        }
    }

    pub fn start(&mut self, timers: &mut Timers<SessionTimer>) {
        self.timer = Some(timers.schedule_interval(BEE_TICK_MS, SessionTimer::BeeTick));
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn swarm_len(&self) -> usize {
        self.swarm.len()
    }

    pub fn steering(&self, id: EntityId) -> Option<&Steering> {
        self.swarm.get(&id)
    }

    /// Handle one interval tick. Returns `true` once the level duration is reached.
    pub fn tick(
        &mut self,
        ctx: &mut EngineContext,
        timers: &mut Timers<SessionTimer>,
        rng: &mut impl Rng,
        target: EntityId,
    ) -> bool {
        if !self.is_running() {
            return false;
        }
        match self.clock.advance() {
            BeeStep::Spawn => {
                let y = BEE_SPAWN_MIN_Y + rng.random_range(0.0..BEE_SPAWN_SPREAD_Y);
                let id = spawn_bee(ctx, Vec2::new(BEE_SPAWN_X, y));
                let speed = rng.random_range(BEE_MIN_SPEED..=BEE_MAX_SPEED);
                let wander = rng.random_range(0.0..TAU);
                self.swarm.insert(id, Steering::new(target, speed, wander));
                timers.schedule_timeout(BEE_LIFETIME_MS, SessionTimer::Expire(id));
                false
            }
            BeeStep::Finished => {
                self.stop(timers);
                log::debug!("bee swarm done after {} ms", self.clock.elapsed_ms());
                true
            }
        }
    }

    pub fn stop(&mut self, timers: &mut Timers<SessionTimer>) {
        if let Some(id) = self.timer.take() {
            timers.cancel(id);
        }
    }

    /// Push every live bee toward its target and turn it to face its velocity.
    pub fn steer(&mut self, ctx: &mut EngineContext, rng: &mut impl Rng) {
        self.swarm.retain(|id, _| ctx.scene.get(*id).is_some());
        for (&id, steering) in self.swarm.iter_mut() {
            let Some(target) = ctx.scene.get(steering.target).map(|e| e.pos) else {
                continue;
            };
            let Some(bee) = ctx.scene.get(id).map(|e| e.pos) else {
                continue;
            };
            let force = steering.force(bee, target, ctx.mass(id), rng);
            ctx.apply_force(id, force);
            if let Some(angle) = heading(ctx.velocity(id)) {
                ctx.set_rotation(id, angle);
            }
        }
    }

    /// Drop the steering record of a removed bee.
    pub fn forget(&mut self, id: EntityId) {
        self.swarm.remove(&id);
    }
}

fn spawn_bee(ctx: &mut EngineContext, pos: Vec2) -> EntityId {
    let outline = Outline::Circle { radius: BEE_RADIUS };
    let desc = BodyDesc::dynamic(outline.into())
        .with_position(pos)
        .with_gravity_scale(0.0)
        .with_fixed_rotation(true)
        .with_air_drag(BEE_DRAG);
    let id = ctx.next_id();
    let entity = Entity::new(id)
        .with_kind(BodyKind::Bee)
        .with_sprite(Sprite::skinned(outline, Skin::Bee));
    ctx.spawn_with_body(entity, desc, BEE_MATERIAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use shelter_engine::GameConfig;

    fn fresh_ctx() -> EngineContext {
        EngineContext::from_config(&GameConfig::default())
    }

    fn spawn_target(ctx: &mut EngineContext, pos: Vec2) -> EntityId {
        let outline = Outline::Circle { radius: 20.0 };
        let id = ctx.next_id();
        let desc = BodyDesc::fixed(outline.into()).with_position(pos);
        ctx.spawn_with_body(
            Entity::new(id).with_kind(BodyKind::Player),
            desc,
            ColliderMaterial::default(),
        )
    }

    #[test]
    fn cloud_drops_only_over_the_field() {
        let mut cloud = HailCloud::new();
        let steps: Vec<CloudStep> = (0..20).map(|_| cloud.advance()).collect();
        // x goes -95, -90, ... 0: nothing yet.
        assert!(steps.iter().all(|s| *s == CloudStep::Drift));
        assert_eq!(cloud.advance(), CloudStep::Drop { x: 40.0 });
    }

    #[test]
    fn cloud_crosses_in_190_ticks() {
        let mut cloud = HailCloud::new();
        let mut drops = 0;
        let mut ticks = 0;
        loop {
            ticks += 1;
            match cloud.advance() {
                CloudStep::Drop { .. } => drops += 1,
                CloudStep::Drift => {}
                CloudStep::Passed => break,
            }
        }
        // 855 is the first x past 850.
        assert_eq!(ticks, 191);
        // x = 5 ..= 795.
        assert_eq!(drops, 159);
    }

    #[test]
    fn hail_spawner_drops_hail_and_schedules_expiry() {
        let mut ctx = fresh_ctx();
        let mut timers = Timers::new();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut hail = HailSpawner::default();
        hail.start(&mut timers);
        assert_eq!(hail.cloud_x(), Some(-100.0));

        let mut finished = false;
        while !finished {
            for fired in timers.advance(HAIL_TICK_MS) {
                match fired.payload {
                    SessionTimer::HailTick => {
                        finished |= hail.tick(&mut ctx, &mut timers, &mut rng);
                    }
                    SessionTimer::Expire(_) => {}
                    other => panic!("unexpected timer {:?}", other),
                }
            }
        }
        assert!(!hail.is_running());
        assert_eq!(hail.cloud_x(), None);
        assert!(ctx.scene.count_kind(BodyKind::Hail) > 0);
        for stone in ctx.scene.iter_kind(BodyKind::Hail) {
            assert!(stone.pos.x >= 20.0 && stone.pos.x <= 850.0);
        }
        // Only the expiry timeouts remain.
        assert!(!timers.is_empty());
        assert!(!hail.tick(&mut ctx, &mut timers, &mut rng));
    }

    #[test]
    fn bee_clock_finishes_at_duration_without_spawning() {
        let mut clock = BeeClock::new(10_000);
        let steps: Vec<BeeStep> = (0..5).map(|_| clock.advance()).collect();
        assert_eq!(
            steps,
            vec![
                BeeStep::Spawn,
                BeeStep::Spawn,
                BeeStep::Spawn,
                BeeStep::Spawn,
                BeeStep::Finished
            ]
        );
    }

    #[test]
    fn bees_spawn_at_the_right_edge_with_steering() {
        let mut ctx = fresh_ctx();
        let mut timers = Timers::new();
        let mut rng = Pcg32::seed_from_u64(5);
        let egg = spawn_target(&mut ctx, Vec2::new(400.0, 400.0));
        let mut bees = BeeSpawner::new(10_000);
        bees.start(&mut timers);

        let mut finished = false;
        for fired in timers.advance(10_000.0) {
            if fired.payload == SessionTimer::BeeTick {
                finished |= bees.tick(&mut ctx, &mut timers, &mut rng, egg);
            }
        }
        assert!(finished);
        assert!(!bees.is_running());
        assert_eq!(ctx.scene.count_kind(BodyKind::Bee), 4);
        assert_eq!(bees.swarm_len(), 4);
        for bee in ctx.scene.iter_kind(BodyKind::Bee) {
            assert_eq!(bee.pos.x, 770.0);
            // Clear of the right wall, whose inner face is at x = 780.
            assert!(bee.pos.x + BEE_RADIUS <= FIELD_WIDTH - WALL_THICKNESS / 2.0);
            assert!(bee.pos.y >= 120.0 && bee.pos.y < 320.0);
            let steering = bees.steering(bee.id).unwrap();
            assert_eq!(steering.target, egg);
            assert!((90.0..=120.0).contains(&steering.speed));
        }
        // Four lifetimes pending.
        assert_eq!(timers.len(), 4);
    }

    #[test]
    fn steering_moves_bees_toward_the_egg_and_drops_dead_bees() {
        let mut ctx = fresh_ctx();
        let mut timers = Timers::new();
        let mut rng = Pcg32::seed_from_u64(11);
        let egg = spawn_target(&mut ctx, Vec2::new(400.0, 250.0));
        let mut bees = BeeSpawner::new(60_000);
        bees.start(&mut timers);
        for fired in timers.advance(BEE_TICK_MS) {
            if fired.payload == SessionTimer::BeeTick {
                bees.tick(&mut ctx, &mut timers, &mut rng, egg);
            }
        }
        let bee = ctx.scene.iter_kind(BodyKind::Bee).next().unwrap().id;
        let start_x = ctx.scene.get(bee).unwrap().pos.x;

        for _ in 0..60 {
            bees.steer(&mut ctx, &mut rng);
            ctx.step_physics();
        }
        let pos = ctx.scene.get(bee).unwrap().pos;
        assert!(pos.x < start_x, "bee should head left toward the egg: {:?}", pos);
        assert!(ctx.velocity(bee).x < 0.0);

        ctx.despawn(bee);
        bees.steer(&mut ctx, &mut rng);
        assert_eq!(bees.swarm_len(), 0);
    }
}
