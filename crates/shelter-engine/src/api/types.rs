use bytemuck::{Pod, Zeroable};

/// Unique identifier for an entity in the scene.
/// Also stored in the rapier body's `user_data` so collisions resolve back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// A presentation event communicated from Rust to the host page.
/// Generic container: `kind` identifies the event, `a/b/c` carry payload.
/// The game defines the meaning of each kind.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GameEvent {
    pub kind: f32,
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl GameEvent {
    pub const FLOATS: usize = 4;

    /// Event carrying a single payload value.
    pub fn new(kind: f32, a: f32) -> Self {
        Self { kind, a, b: 0.0, c: 0.0 }
    }
}
