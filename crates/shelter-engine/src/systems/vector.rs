//! Lyon-based vector/polygon rendering system.
//!
//! Provides CPU-side tessellation of filled and stroked shapes using Lyon,
//! producing a flat triangle-list vertex buffer the host draws to its canvas.
//!
//! # Usage
//!
//! ```ignore
//! // In your Game::render():
//! ctx.vectors.fill_rect(Vec2::new(300.0, 100.0), 100.0, 50.0, VectorColor::hex(0x8b7355));
//! ctx.vectors.fill_ellipse(center, Vec2::new(17.0, 20.0), angle, VectorColor::WHITE);
//! ctx.vectors.stroke_dashed_polyline(&path_points, 5.0, 5.0, 2.0, VectorColor::BLACK);
//! ```

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use lyon::math::point;
use lyon::path::Path;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, FillVertexConstructor,
    StrokeOptions, StrokeTessellator, StrokeVertex, StrokeVertexConstructor, VertexBuffers,
};

/// Per-vertex data for vector/polygon rendering.
/// 6 floats = 24 bytes per vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
pub struct VectorVertex {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl VectorVertex {
    /// Number of floats per vertex.
    pub const FLOATS: usize = 6;
    /// Stride in bytes.
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4; // 24

    fn at(p: Vec2, color: VectorColor) -> Self {
        Self {
            x: p.x,
            y: p.y,
            r: color.r,
            g: color.g,
            b: color.b,
            a: color.a,
        }
    }
}

/// RGBA color for vector drawing operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl VectorColor {
    /// Create a color from RGBA components (0.0 - 1.0).
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create a fully opaque color from RGB components.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create a fully opaque color from a `0xRRGGBB` literal.
    pub const fn hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as f32 / 255.0,
            g: ((rgb >> 8) & 0xff) as f32 / 255.0,
            b: (rgb & 0xff) as f32 / 255.0,
            a: 1.0,
        }
    }

    /// Create a color with the given alpha value.
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Multiply the alpha channel.
    pub fn faded(self, factor: f32) -> Self {
        Self { a: self.a * factor, ..self }
    }

    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
}

impl Default for VectorColor {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Vertex constructor for lyon fill tessellation.
struct FillVertexCtor {
    color: VectorColor,
}

impl FillVertexConstructor<VectorVertex> for FillVertexCtor {
    fn new_vertex(&mut self, vertex: FillVertex) -> VectorVertex {
        let p = vertex.position();
        VectorVertex::at(Vec2::new(p.x, p.y), self.color)
    }
}

/// Vertex constructor for lyon stroke tessellation.
struct StrokeVertexCtor {
    color: VectorColor,
}

impl StrokeVertexConstructor<VectorVertex> for StrokeVertexCtor {
    fn new_vertex(&mut self, vertex: StrokeVertex) -> VectorVertex {
        let p = vertex.position();
        VectorVertex::at(Vec2::new(p.x, p.y), self.color)
    }
}

/// Default vertex budget when no explicit capacity is given.
const DEFAULT_MAX_VERTICES: usize = 65536;

/// State for vector/polygon rendering.
///
/// Holds lyon tessellators and the output vertex buffer.
/// Cleared each frame and populated by drawing commands. Triangles that would
/// overflow the vertex budget are dropped.
pub struct VectorState {
    fill_tess: FillTessellator,
    stroke_tess: StrokeTessellator,
    geometry: VertexBuffers<VectorVertex, u32>,
    buffer: Vec<f32>,
    max_vertices: usize,
}

impl VectorState {
    /// Create a new VectorState with the default vertex budget.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_VERTICES)
    }

    /// Create a VectorState that holds at most `max_vertices` vertices per frame.
    pub fn with_capacity(max_vertices: usize) -> Self {
        Self {
            fill_tess: FillTessellator::new(),
            stroke_tess: StrokeTessellator::new(),
            geometry: VertexBuffers::new(),
            buffer: Vec::with_capacity(max_vertices.min(16384) * VectorVertex::FLOATS),
            max_vertices,
        }
    }

    /// Clear the vertex buffer. Called at the start of each frame.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Number of vertices currently in the buffer.
    pub fn vertex_count(&self) -> usize {
        self.buffer.len() / VectorVertex::FLOATS
    }

    pub fn max_vertices(&self) -> usize {
        self.max_vertices
    }

    /// Raw pointer to the flat float buffer (for the host to read).
    pub fn buffer_ptr(&self) -> *const f32 {
        self.buffer.as_ptr()
    }

    /// The flat float buffer, `FLOATS` per vertex.
    pub fn as_slice(&self) -> &[f32] {
        &self.buffer
    }

    fn push_triangle(&mut self, tri: [VectorVertex; 3]) {
        if self.vertex_count() + 3 > self.max_vertices {
            return;
        }
        for v in tri {
            self.buffer.extend_from_slice(&[v.x, v.y, v.r, v.g, v.b, v.a]);
        }
    }

    /// Flush indexed geometry to the flat buffer as triangle list.
    fn flush_geometry(&mut self) {
        let vertices = std::mem::take(&mut self.geometry.vertices);
        let indices = std::mem::take(&mut self.geometry.indices);
        for tri in indices.chunks_exact(3) {
            self.push_triangle([
                vertices[tri[0] as usize],
                vertices[tri[1] as usize],
                vertices[tri[2] as usize],
            ]);
        }
        // Hand the allocations back to lyon.
        self.geometry.vertices = vertices;
        self.geometry.indices = indices;
        self.geometry.vertices.clear();
        self.geometry.indices.clear();
    }

    fn polygon_path(points: &[Vec2], closed: bool) -> Path {
        let mut builder = Path::builder();
        builder.begin(point(points[0].x, points[0].y));
        for p in &points[1..] {
            builder.line_to(point(p.x, p.y));
        }
        builder.end(closed);
        builder.build()
    }

    fn ellipse_path(center: Vec2, radii: Vec2, rotation: f32) -> Path {
        let mut builder = Path::builder();
        builder.add_ellipse(
            point(center.x, center.y),
            lyon::math::vector(radii.x, radii.y),
            lyon::math::Angle::radians(rotation),
            lyon::path::Winding::Positive,
        );
        builder.build()
    }

    /// Tessellate and fill a polygon.
    ///
    /// The polygon is closed automatically. Supports convex and concave shapes.
    pub fn fill_polygon(&mut self, points: &[Vec2], color: VectorColor) {
        if points.len() < 3 {
            return;
        }
        let path = Self::polygon_path(points, true);
        self.fill_path(&path, color);
    }

    /// Tessellate and fill an axis-aligned rectangle given its top-left corner.
    pub fn fill_rect(&mut self, pos: Vec2, width: f32, height: f32, color: VectorColor) {
        let points = [
            pos,
            Vec2::new(pos.x + width, pos.y),
            Vec2::new(pos.x + width, pos.y + height),
            Vec2::new(pos.x, pos.y + height),
        ];
        self.fill_polygon(&points, color);
    }

    /// Fill an axis-aligned rectangle blending from `top` to `bottom`.
    pub fn fill_gradient_rect(
        &mut self,
        pos: Vec2,
        width: f32,
        height: f32,
        top: VectorColor,
        bottom: VectorColor,
    ) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let tl = VectorVertex::at(pos, top);
        let tr = VectorVertex::at(Vec2::new(pos.x + width, pos.y), top);
        let br = VectorVertex::at(Vec2::new(pos.x + width, pos.y + height), bottom);
        let bl = VectorVertex::at(Vec2::new(pos.x, pos.y + height), bottom);
        self.push_triangle([tl, tr, br]);
        self.push_triangle([tl, br, bl]);
    }

    /// Tessellate and fill a circle.
    ///
    /// The circle is approximated using lyon's default tolerance.
    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: VectorColor) {
        if radius <= 0.0 {
            return;
        }

        let mut builder = Path::builder();
        builder.add_circle(point(center.x, center.y), radius, lyon::path::Winding::Positive);
        let path = builder.build();

        self.fill_path(&path, color);
    }

    /// Tessellate and fill an ellipse rotated by `rotation` radians.
    pub fn fill_ellipse(&mut self, center: Vec2, radii: Vec2, rotation: f32, color: VectorColor) {
        if radii.x <= 0.0 || radii.y <= 0.0 {
            return;
        }
        let path = Self::ellipse_path(center, radii, rotation);
        self.fill_path(&path, color);
    }

    /// Tessellate and fill an arbitrary lyon Path.
    pub fn fill_path(&mut self, path: &Path, color: VectorColor) {
        let result = self.fill_tess.tessellate_path(
            path,
            &FillOptions::tolerance(0.5),
            &mut BuffersBuilder::new(&mut self.geometry, FillVertexCtor { color }),
        );

        match result {
            Ok(()) => self.flush_geometry(),
            Err(e) => {
                log::debug!("fill tessellation failed: {:?}", e);
                self.geometry.vertices.clear();
                self.geometry.indices.clear();
            }
        }
    }

    /// Tessellate a stroked polyline (open path).
    pub fn stroke_polyline(&mut self, points: &[Vec2], width: f32, color: VectorColor) {
        if points.len() < 2 {
            return;
        }
        let path = Self::polygon_path(points, false);
        self.stroke_path(&path, width, color);
    }

    /// Stroke a polyline as alternating `dash`/`gap` segments measured along its length.
    pub fn stroke_dashed_polyline(
        &mut self,
        points: &[Vec2],
        dash: f32,
        gap: f32,
        width: f32,
        color: VectorColor,
    ) {
        if points.len() < 2 || dash <= 0.0 {
            return;
        }
        for segment in dash_segments(points, dash, gap.max(0.0)) {
            self.stroke_polyline(&segment, width, color);
        }
    }

    /// Tessellate a stroked closed polygon.
    pub fn stroke_polygon(&mut self, points: &[Vec2], width: f32, color: VectorColor) {
        if points.len() < 3 {
            return;
        }
        let path = Self::polygon_path(points, true);
        self.stroke_path(&path, width, color);
    }

    /// Tessellate a stroked circle.
    pub fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: VectorColor) {
        if radius <= 0.0 {
            return;
        }

        let mut builder = Path::builder();
        builder.add_circle(point(center.x, center.y), radius, lyon::path::Winding::Positive);
        let path = builder.build();

        self.stroke_path(&path, width, color);
    }

    /// Tessellate a stroked rotated ellipse.
    pub fn stroke_ellipse(
        &mut self,
        center: Vec2,
        radii: Vec2,
        rotation: f32,
        width: f32,
        color: VectorColor,
    ) {
        if radii.x <= 0.0 || radii.y <= 0.0 {
            return;
        }
        let path = Self::ellipse_path(center, radii, rotation);
        self.stroke_path(&path, width, color);
    }

    /// Tessellate an arbitrary stroked lyon Path.
    pub fn stroke_path(&mut self, path: &Path, width: f32, color: VectorColor) {
        let result = self.stroke_tess.tessellate_path(
            path,
            &StrokeOptions::tolerance(0.5).with_line_width(width),
            &mut BuffersBuilder::new(&mut self.geometry, StrokeVertexCtor { color }),
        );

        match result {
            Ok(()) => self.flush_geometry(),
            Err(e) => {
                log::debug!("stroke tessellation failed: {:?}", e);
                self.geometry.vertices.clear();
                self.geometry.indices.clear();
            }
        }
    }
}

impl Default for VectorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a polyline into the "on" pieces of a dash pattern.
fn dash_segments(points: &[Vec2], dash: f32, gap: f32) -> Vec<Vec<Vec2>> {
    const EPS: f32 = 1e-4;
    let mut segments = Vec::new();
    let mut current = vec![points[0]];
    let mut drawing = true;
    // Length left in the current dash or gap.
    let mut left = dash;

    for pair in points.windows(2) {
        let (mut from, to) = (pair[0], pair[1]);
        let dir = (to - from).normalize_or_zero();
        let mut remaining = from.distance(to);
        while remaining > EPS {
            let step = remaining.min(left);
            from += dir * step;
            remaining -= step;
            left -= step;
            if drawing {
                current.push(from);
            }
            if left <= EPS {
                if drawing {
                    segments.push(std::mem::take(&mut current));
                    if gap > 0.0 {
                        drawing = false;
                        left = gap;
                    } else {
                        current.push(from);
                        left = dash;
                    }
                } else {
                    drawing = true;
                    current.push(from);
                    left = dash;
                }
            }
        }
    }
    if drawing && current.len() >= 2 {
        segments.push(current);
    }
    segments
}
