use glam::Vec2;

use crate::api::types::{EntityId, GameEvent};
use crate::components::entity::Entity;
use crate::core::physics::{BodyDesc, ColliderMaterial, CollisionPair, PhysicsWorld};
use crate::core::scene::Scene;
use crate::input::queue::InputQueue;
use crate::systems::vector::VectorState;

/// Configuration for the engine, provided by the game.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Fixed timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// World width in game units.
    pub world_width: f32,
    /// World height in game units.
    pub world_height: f32,
    /// Maximum number of vector vertices per frame (default: 65536).
    pub max_vector_vertices: usize,
    /// Maximum number of game events per frame (default: 32).
    pub max_events: usize,
    /// Gravity vector for physics simulation.
    /// Y points down, so positive Y pulls toward the ground.
    pub gravity: Vec2,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            world_width: 800.0,
            world_height: 500.0,
            max_vector_vertices: 65536,
            max_events: 32,
            gravity: Vec2::new(0.0, 800.0),
        }
    }
}

/// The core contract every game must fulfill.
pub trait Game {
    /// Return engine configuration. Called once before init.
    fn config(&self) -> GameConfig {
        GameConfig::default()
    }

    /// Setup initial state, spawn entities, configure the scene.
    fn init(&mut self, ctx: &mut EngineContext);

    /// The game loop tick, run before the physics step.
    /// Consume input, advance timers, apply forces.
    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue);

    /// Runs right after each physics step, with that step's collisions
    /// available through [`EngineContext::collisions`].
    fn post_step(&mut self, _ctx: &mut EngineContext) {}

    /// Read-only render pass, once per frame after all fixed steps.
    fn render(&self, _ctx: &mut RenderContext) {}
}

/// Mutable access to engine state, passed to the `Game` hooks.
pub struct EngineContext {
    pub scene: Scene,
    pub events: Vec<GameEvent>,
    pub physics: PhysicsWorld,
    next_id: u32,
    collision_events: Vec<CollisionPair>,
    paused: bool,
}

impl EngineContext {
    pub fn new() -> Self {
        Self::with_gravity(Vec2::ZERO)
    }

    /// Create an EngineContext with a custom gravity vector.
    pub fn with_gravity(gravity: Vec2) -> Self {
        Self {
            scene: Scene::new(),
            events: Vec::new(),
            physics: PhysicsWorld::new(gravity),
            next_id: 1,
            collision_events: Vec::new(),
            paused: false,
        }
    }

    /// Build a context matching a game's configuration.
    pub fn from_config(config: &GameConfig) -> Self {
        let mut ctx = Self::with_gravity(config.gravity);
        ctx.physics.set_dt(config.fixed_dt);
        ctx
    }

    /// Generate the next unique entity ID.
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Emit a game event to be forwarded to the host.
    pub fn emit_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Clear per-frame transient data (events, collision events).
    pub fn clear_frame_data(&mut self) {
        self.events.clear();
        self.collision_events.clear();
    }

    // -- Physics convenience methods --

    /// Spawn an entity with a physics body. Returns the EntityId.
    /// The entity's position and rotation are taken from the BodyDesc.
    pub fn spawn_with_body(
        &mut self,
        entity: Entity,
        desc: BodyDesc,
        material: ColliderMaterial,
    ) -> EntityId {
        let id = entity.id;
        let body = self.physics.create_body(id, &desc, material);
        let entity = entity
            .with_pos(desc.position)
            .with_rotation(desc.rotation)
            .with_body(body);
        self.scene.spawn(entity);
        id
    }

    /// Despawn an entity, cleaning up its physics body if present.
    /// Returns whether the entity existed.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        match self.scene.despawn(id) {
            Some(entity) => {
                if let Some(body) = &entity.body {
                    self.physics.remove_body(body);
                }
                true
            }
            None => false,
        }
    }

    /// Remove every entity and start over with an empty physics world.
    /// Gravity and timestep carry over; entity IDs keep counting up.
    pub fn reset_world(&mut self) {
        let gravity = self.physics.gravity();
        let dt = self.physics.dt();
        self.scene.drain();
        self.physics = PhysicsWorld::new(gravity);
        self.physics.set_dt(dt);
        self.collision_events.clear();
    }

    /// Add a force to an entity's body for the next physics step.
    pub fn apply_force(&mut self, id: EntityId, force: Vec2) {
        if let Some(body) = self.scene.get(id).and_then(|e| e.body) {
            self.physics.apply_force(&body, force);
        }
    }

    /// Overwrite the orientation of an entity's body.
    pub fn set_rotation(&mut self, id: EntityId, rotation: f32) {
        if let Some(entity) = self.scene.get_mut(id) {
            entity.rotation = rotation;
            if let Some(body) = entity.body {
                self.physics.set_rotation(&body, rotation);
            }
        }
    }

    /// Get the linear velocity of an entity's physics body.
    pub fn velocity(&self, id: EntityId) -> Vec2 {
        self.scene
            .get(id)
            .and_then(|e| e.body.as_ref())
            .map(|body| self.physics.velocity(body))
            .unwrap_or(Vec2::ZERO)
    }

    /// Mass of an entity's physics body (zero without one).
    pub fn mass(&self, id: EntityId) -> f32 {
        self.scene
            .get(id)
            .and_then(|e| e.body.as_ref())
            .map(|body| self.physics.mass(body))
            .unwrap_or(0.0)
    }

    /// Get collision events from the most recent physics step.
    pub fn collisions(&self) -> &[CollisionPair] {
        &self.collision_events
    }

    /// Stop stepping the simulation. Bodies stay where they are.
    pub fn pause_physics(&mut self) {
        self.paused = true;
    }

    pub fn resume_physics(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Step the physics simulation and sync positions back to entities.
    /// Called by the game runner after `Game::update()`; no-op while paused.
    pub fn step_physics(&mut self) {
        self.collision_events.clear();
        if self.paused {
            return;
        }
        self.physics.step_into(&mut self.collision_events);

        // Sync Rapier body positions back to entity positions
        for entity in self.scene.iter_mut() {
            if let Some(body) = &entity.body {
                let (pos, rot) = self.physics.body_position(body);
                entity.pos = pos;
                entity.rotation = rot;
            }
        }
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Render context handed to `Game::render`.
pub struct RenderContext<'a> {
    pub scene: &'a Scene,
    pub vectors: &'a mut VectorState,
}

#[cfg(test)]
mod physics_tests {
    use super::*;
    use crate::core::physics::ColliderDesc;

    fn ball_at(ctx: &mut EngineContext, pos: Vec2) -> EntityId {
        let id = ctx.next_id();
        let desc = BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 }).with_position(pos);
        ctx.spawn_with_body(Entity::new(id), desc, ColliderMaterial::default())
    }

    #[test]
    fn spawn_with_body_creates_entity_and_physics() {
        let mut ctx = EngineContext::new();
        let id = ball_at(&mut ctx, Vec2::new(100.0, 200.0));

        assert_eq!(ctx.scene.len(), 1);
        assert_eq!(ctx.physics.body_count(), 1);
        let entity = ctx.scene.get(id).unwrap();
        assert!(entity.body.is_some());
        assert_eq!(entity.pos, Vec2::new(100.0, 200.0));
    }

    #[test]
    fn despawn_cleans_up_physics() {
        let mut ctx = EngineContext::new();
        let id = ball_at(&mut ctx, Vec2::ZERO);
        assert_eq!(ctx.physics.body_count(), 1);

        assert!(ctx.despawn(id));
        assert!(!ctx.despawn(id));
        assert_eq!(ctx.scene.len(), 0);
        assert_eq!(ctx.physics.body_count(), 0);
    }

    #[test]
    fn step_physics_syncs_positions() {
        let mut ctx = EngineContext::from_config(&GameConfig::default());
        let id = ball_at(&mut ctx, Vec2::new(100.0, 0.0));

        for _ in 0..10 {
            ctx.step_physics();
        }

        let entity = ctx.scene.get(id).unwrap();
        assert!(
            entity.pos.y > 0.0,
            "Entity should have moved down: y={}",
            entity.pos.y
        );
    }

    #[test]
    fn paused_world_does_not_move() {
        let mut ctx = EngineContext::from_config(&GameConfig::default());
        let id = ball_at(&mut ctx, Vec2::new(100.0, 0.0));

        ctx.pause_physics();
        for _ in 0..10 {
            ctx.step_physics();
        }
        assert_eq!(ctx.scene.get(id).unwrap().pos, Vec2::new(100.0, 0.0));

        ctx.resume_physics();
        ctx.step_physics();
        assert!(ctx.scene.get(id).unwrap().pos.y > 0.0);
    }

    #[test]
    fn reset_world_keeps_gravity_and_ids_unique() {
        let mut ctx = EngineContext::from_config(&GameConfig::default());
        let first = ball_at(&mut ctx, Vec2::ZERO);
        ctx.reset_world();

        assert!(ctx.scene.is_empty());
        assert_eq!(ctx.physics.body_count(), 0);
        assert_eq!(ctx.physics.gravity(), Vec2::new(0.0, 800.0));
        assert!((ctx.physics.dt() - 1.0 / 60.0).abs() < 1e-6);

        let second = ball_at(&mut ctx, Vec2::ZERO);
        assert_ne!(first, second);
    }

    #[test]
    fn set_rotation_updates_entity_and_body() {
        let mut ctx = EngineContext::new();
        let id = ball_at(&mut ctx, Vec2::ZERO);
        ctx.set_rotation(id, 0.75);
        assert_eq!(ctx.scene.get(id).unwrap().rotation, 0.75);
        ctx.step_physics();
        assert!((ctx.scene.get(id).unwrap().rotation - 0.75).abs() < 1e-4);
    }

    #[test]
    fn frame_data_is_cleared() {
        let mut ctx = EngineContext::new();
        ctx.emit_event(GameEvent::new(1.0, 0.0));
        assert_eq!(ctx.events.len(), 1);
        ctx.clear_frame_data();
        assert!(ctx.events.is_empty());
        assert!(ctx.collisions().is_empty());
    }
}
