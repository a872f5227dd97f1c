/// Flat float buffer layout shared with the host page.
/// Must stay in sync with the host's `protocol.ts`.
///
/// Layout (all values in f32 / 4 bytes):
/// ```text
/// [Header: 8 floats]
/// [Vectors: max_vector_vertices × 6 floats]
/// [Events: max_events × 4 floats]
/// ```
///
/// Capacities are written once into the header at init.
/// The host reads them from the header to compute offsets dynamically.

use crate::api::game::GameConfig;
use crate::api::types::GameEvent;
use crate::systems::vector::VectorVertex;

/// Number of floats in the header section.
pub const HEADER_FLOATS: usize = 8;

/// Header field indices.
pub const HEADER_FRAME_COUNTER: usize = 0;
pub const HEADER_PROTOCOL_VERSION: usize = 1;
pub const HEADER_WORLD_WIDTH: usize = 2;
pub const HEADER_WORLD_HEIGHT: usize = 3;
pub const HEADER_MAX_VECTOR_VERTICES: usize = 4;
pub const HEADER_VECTOR_VERTEX_COUNT: usize = 5;
pub const HEADER_MAX_EVENTS: usize = 6;
pub const HEADER_EVENT_COUNT: usize = 7;

/// Protocol version written into the header.
pub const PROTOCOL_VERSION: f32 = 1.0;

/// Floats per vector vertex: x, y, r, g, b, a (wire format, never changes).
pub const VECTOR_VERTEX_FLOATS: usize = VectorVertex::FLOATS;

/// Floats per game event: kind, a, b, c (wire format, never changes).
pub const EVENT_FLOATS: usize = GameEvent::FLOATS;

/// Runtime-computed buffer layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolLayout {
    /// Maximum vector vertices per frame.
    pub max_vector_vertices: usize,
    /// Maximum game events per frame.
    pub max_events: usize,

    /// Size of vector data section in floats.
    pub vector_data_floats: usize,
    /// Size of event data section in floats.
    pub event_data_floats: usize,

    /// Offset (in floats) where vector data begins.
    pub vector_data_offset: usize,
    /// Offset (in floats) where event data begins.
    pub event_data_offset: usize,

    /// Total buffer size in floats.
    pub buffer_total_floats: usize,
    /// Total buffer size in bytes.
    pub buffer_total_bytes: usize,
}

impl ProtocolLayout {
    /// Compute layout from raw capacity values.
    pub fn new(max_vector_vertices: usize, max_events: usize) -> Self {
        let vector_data_floats = max_vector_vertices * VECTOR_VERTEX_FLOATS;
        let event_data_floats = max_events * EVENT_FLOATS;

        let vector_data_offset = HEADER_FLOATS;
        let event_data_offset = vector_data_offset + vector_data_floats;

        let buffer_total_floats = event_data_offset + event_data_floats;
        let buffer_total_bytes = buffer_total_floats * 4;

        Self {
            max_vector_vertices,
            max_events,
            vector_data_floats,
            event_data_floats,
            vector_data_offset,
            event_data_offset,
            buffer_total_floats,
            buffer_total_bytes,
        }
    }

    /// Compute layout from a GameConfig.
    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.max_vector_vertices, config.max_events)
    }

    /// Write a frame into `out`, which must be `buffer_total_floats` long.
    /// Vertices and events beyond capacity are dropped; the header counts
    /// report what was actually written.
    pub fn write_frame(
        &self,
        out: &mut [f32],
        frame: u32,
        config: &GameConfig,
        vectors: &[f32],
        events: &[GameEvent],
    ) {
        if out.len() < self.buffer_total_floats {
            log::warn!(
                "frame buffer too small: {} < {}",
                out.len(),
                self.buffer_total_floats
            );
            return;
        }

        let vertex_count = (vectors.len() / VECTOR_VERTEX_FLOATS).min(self.max_vector_vertices);
        let event_count = events.len().min(self.max_events);

        out[HEADER_FRAME_COUNTER] = frame as f32;
        out[HEADER_PROTOCOL_VERSION] = PROTOCOL_VERSION;
        out[HEADER_WORLD_WIDTH] = config.world_width;
        out[HEADER_WORLD_HEIGHT] = config.world_height;
        out[HEADER_MAX_VECTOR_VERTICES] = self.max_vector_vertices as f32;
        out[HEADER_VECTOR_VERTEX_COUNT] = vertex_count as f32;
        out[HEADER_MAX_EVENTS] = self.max_events as f32;
        out[HEADER_EVENT_COUNT] = event_count as f32;

        let vector_floats = vertex_count * VECTOR_VERTEX_FLOATS;
        out[self.vector_data_offset..self.vector_data_offset + vector_floats]
            .copy_from_slice(&vectors[..vector_floats]);

        let event_floats: &[f32] = bytemuck::cast_slice(&events[..event_count]);
        out[self.event_data_offset..self.event_data_offset + event_floats.len()]
            .copy_from_slice(event_floats);
    }
}
