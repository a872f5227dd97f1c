pub mod api;
pub mod core;
pub mod components;
pub mod systems;
pub mod bridge;
pub mod input;

// Re-export key types at crate root for convenience
pub use api::game::{Game, GameConfig, EngineContext, RenderContext};
pub use api::types::{EntityId, GameEvent};
pub use components::entity::{BodyKind, Entity};
pub use components::sprite::{Outline, Skin, Sprite};
pub use core::scene::Scene;
pub use core::time::{FixedTimestep, Fired, TimerId, Timers};
pub use input::queue::{InputEvent, InputQueue};
pub use bridge::protocol::ProtocolLayout;

pub use core::physics::{
    PhysicsWorld, PhysicsBody, BodyDesc, BodyType,
    ColliderDesc, ColliderMaterial, CollisionPair,
};

pub use systems::vector::{VectorState, VectorVertex, VectorColor};
