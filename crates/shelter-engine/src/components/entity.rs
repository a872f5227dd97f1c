use glam::Vec2;
use crate::api::types::EntityId;
use crate::components::sprite::Sprite;
use crate::core::physics::PhysicsBody;

/// What role a body plays in a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BodyKind {
    /// The protected body. Exactly one per session.
    Player,
    /// Vertical boundary wall.
    Wall,
    Ground,
    /// Static level geometry other than ground and walls.
    #[default]
    Obstacle,
    /// A shape dropped from the palette.
    Placed,
    Hail,
    Bee,
}

impl BodyKind {
    /// Whether touching the player with this body ends the level.
    pub fn is_hazard(self) -> bool {
        matches!(self, BodyKind::Hail | BodyKind::Bee)
    }
}

/// Fat Entity: a single struct with optional components.
/// Designed for simplicity over ECS purity.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Unique identifier.
    pub id: EntityId,
    pub kind: BodyKind,
    /// Position in world space. Synced from physics after every step.
    pub pos: Vec2,
    /// Rotation in radians.
    pub rotation: f32,
    /// Render descriptor (entities without one are invisible).
    pub sprite: Option<Sprite>,
    /// Physics body, if simulated.
    pub body: Option<PhysicsBody>,
}

impl Entity {
    /// Create a new entity with the given ID at the origin.
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            kind: BodyKind::default(),
            pos: Vec2::ZERO,
            rotation: 0.0,
            sprite: None,
            body: None,
        }
    }

    // -- Builder pattern --

    pub fn with_kind(mut self, kind: BodyKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_sprite(mut self, sprite: Sprite) -> Self {
        self.sprite = Some(sprite);
        self
    }

    pub fn with_body(mut self, body: PhysicsBody) -> Self {
        self.body = Some(body);
        self
    }
}
