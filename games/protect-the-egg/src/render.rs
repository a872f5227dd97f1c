//! Vector drawing for a live session.
//!
//! Everything is rebuilt each frame from the scene: background bands, the
//! hail cloud, one sprite per body, and the drag ghost with its drop preview.

use glam::Vec2;
use shelter_engine::{Entity, Outline, Scene, Skin, Sprite, VectorColor, VectorState};

use crate::palette::{Palette, PLACED_FILL};
use crate::scene::{FIELD_HEIGHT, FIELD_WIDTH, GROUND_LINE, SKYLINE};
use crate::session::Session;

const SKY_TOP: VectorColor = VectorColor::hex(0xa8d5e2);
const SKY_BOTTOM: VectorColor = VectorColor::hex(0xd4e9f0);
const FIELD_TOP: VectorColor = VectorColor::hex(0xcbdfbd);
const FIELD_BOTTOM: VectorColor = VectorColor::hex(0xb8c9a8);

const CLOUD_Y: f32 = 50.0;
const CLOUD_FILL: VectorColor = VectorColor::hex(0xd4e4f7);
const CLOUD_EDGE: VectorColor = VectorColor::hex(0xa8c9e8);
const CLOUD_RAIN: VectorColor = VectorColor::new(160.0 / 255.0, 180.0 / 255.0, 200.0 / 255.0, 0.5);
/// Puffs as (offset, radius) from the cloud anchor.
const CLOUD_PUFFS: [(Vec2, f32); 5] = [
    (Vec2::new(0.0, 0.0), 30.0),
    (Vec2::new(25.0, -10.0), 35.0),
    (Vec2::new(50.0, 0.0), 30.0),
    (Vec2::new(70.0, 10.0), 28.0),
    (Vec2::new(35.0, 15.0), 32.0),
];

const OUTLINE_WIDTH: f32 = 2.0;
const HIGHLIGHT: VectorColor = VectorColor::new(1.0, 1.0, 1.0, 0.4);

const GHOST_ALPHA: f32 = 0.5;
const PREVIEW_COLOR: VectorColor = VectorColor::new(139.0 / 255.0, 115.0 / 255.0, 85.0 / 255.0, 0.4);
const PREVIEW_DASH: f32 = 5.0;
const PREVIEW_STEPS: usize = 60;

/// Draw one frame of `session`.
pub fn draw_session(
    session: &Session,
    scene: &Scene,
    vectors: &mut VectorState,
    gravity: f32,
    dt: f32,
) {
    draw_background(vectors);
    if let Some(x) = session.cloud_x() {
        draw_cloud(vectors, Vec2::new(x, CLOUD_Y));
    }
    for entity in scene.iter() {
        if let Some(sprite) = &entity.sprite {
            draw_entity(vectors, entity, sprite);
        }
    }

    let palette = session.palette();
    if let (Some((_, entry)), Some(ghost)) = (palette.dragged(), palette.ghost_position()) {
        draw_ghost(vectors, entry.shape.outline(), ghost);
    }
    if let Some(path) = drop_preview(palette, gravity, dt) {
        vectors.stroke_dashed_polyline(&path, PREVIEW_DASH, PREVIEW_DASH, OUTLINE_WIDTH, PREVIEW_COLOR);
    }
}

/// Preview for the shape being dragged, starting where it would be released.
pub fn drop_preview(palette: &Palette, gravity: f32, dt: f32) -> Option<Vec<Vec2>> {
    let (_, entry) = palette.dragged()?;
    let half_extent = entry.shape.outline().half_height();
    Some(trajectory_preview(palette.drop_point(), half_extent, gravity, dt))
}

/// Ballistic drop path from `start`, one point per fixed step.
///
/// Stops before the shape's lower edge would pass the ground line, or after
/// a fixed number of steps.
pub fn trajectory_preview(start: Vec2, half_extent: f32, gravity: f32, dt: f32) -> Vec<Vec2> {
    let floor = GROUND_LINE - half_extent;
    let mut points = vec![start];
    let mut y = start.y;
    let mut vy = 0.0;
    for _ in 0..PREVIEW_STEPS {
        vy += gravity * dt;
        y += vy * dt;
        if y > floor {
            break;
        }
        points.push(Vec2::new(start.x, y));
    }
    points
}

fn draw_background(v: &mut VectorState) {
    v.fill_gradient_rect(Vec2::ZERO, FIELD_WIDTH, SKYLINE, SKY_TOP, SKY_BOTTOM);
    v.fill_gradient_rect(
        Vec2::new(0.0, SKYLINE),
        FIELD_WIDTH,
        FIELD_HEIGHT - SKYLINE,
        FIELD_TOP,
        FIELD_BOTTOM,
    );
}

fn draw_cloud(v: &mut VectorState, at: Vec2) {
    for (offset, radius) in CLOUD_PUFFS {
        v.fill_circle(at + offset, radius, CLOUD_FILL);
    }
    for (offset, radius) in CLOUD_PUFFS {
        v.stroke_circle(at + offset, radius, OUTLINE_WIDTH, CLOUD_EDGE);
    }
    v.fill_rect(at + Vec2::new(-10.0, 25.0), 90.0, 15.0, CLOUD_RAIN);
}

/// Maps body-local points into the world.
struct Frame {
    pos: Vec2,
    rot: Vec2,
    angle: f32,
}

impl Frame {
    fn of(entity: &Entity) -> Self {
        Self {
            pos: entity.pos,
            rot: Vec2::from_angle(entity.rotation),
            angle: entity.rotation,
        }
    }

    fn at(&self, local: Vec2) -> Vec2 {
        self.pos + self.rot.rotate(local)
    }

    fn rect(&self, corner: Vec2, size: Vec2) -> [Vec2; 4] {
        [
            self.at(corner),
            self.at(corner + Vec2::new(size.x, 0.0)),
            self.at(corner + size),
            self.at(corner + Vec2::new(0.0, size.y)),
        ]
    }
}

fn draw_entity(v: &mut VectorState, entity: &Entity, sprite: &Sprite) {
    let frame = Frame::of(entity);
    let radius = match sprite.outline {
        Outline::Circle { radius } => radius,
        Outline::Rect { half_width, half_height } => half_width.max(half_height),
    };
    match sprite.skin {
        Skin::Egg => draw_egg(v, &frame, radius),
        Skin::Hailstone => draw_hailstone(v, &frame, radius),
        Skin::Bee => draw_bee(v, &frame, radius),
        Skin::Flat => draw_flat(v, sprite, entity.pos, entity.rotation),
    }
}

fn draw_flat(v: &mut VectorState, sprite: &Sprite, pos: Vec2, rotation: f32) {
    let fill = sprite.fill.faded(sprite.alpha);
    let stroke = sprite.stroke.faded(sprite.alpha);
    match sprite.outline {
        Outline::Circle { radius } => {
            v.fill_circle(pos, radius, fill);
            v.stroke_circle(pos, radius, OUTLINE_WIDTH, stroke);
        }
        outline @ Outline::Rect { .. } => {
            if let Some(corners) = outline.corners(pos, rotation) {
                v.fill_polygon(&corners, fill);
                v.stroke_polygon(&corners, OUTLINE_WIDTH, stroke);
            }
        }
    }
}

fn draw_ghost(v: &mut VectorState, outline: Outline, at: Vec2) {
    let sprite = Sprite::flat(outline, PLACED_FILL).with_alpha(GHOST_ALPHA);
    draw_flat(v, &sprite, at, 0.0);
}

/// Shaded shell: dark rim, warm body, pale core toward the light.
fn draw_egg(v: &mut VectorState, f: &Frame, r: f32) {
    let radii = Vec2::new(r * 0.85, r);
    v.fill_ellipse(f.pos, radii, f.angle, VectorColor::hex(0xd4a574));
    v.fill_ellipse(f.at(Vec2::new(-0.1, -0.1) * r), radii * 0.8, f.angle, VectorColor::hex(0xffe4b5));
    v.fill_ellipse(f.at(Vec2::new(-0.2, -0.2) * r), radii * 0.45, f.angle, VectorColor::hex(0xfff5e6));
    v.stroke_ellipse(f.pos, radii, f.angle, OUTLINE_WIDTH, VectorColor::hex(0xc89968));
    v.fill_ellipse(
        f.at(Vec2::new(-0.3, -0.4) * r),
        Vec2::new(0.3, 0.4) * r,
        f.angle,
        HIGHLIGHT,
    );
}

fn draw_hailstone(v: &mut VectorState, f: &Frame, r: f32) {
    v.fill_circle(f.pos, r, VectorColor::hex(0x7ab8e8));
    v.fill_circle(f.at(Vec2::new(-0.1, -0.1) * r), r * 0.75, VectorColor::hex(0xb8d8f0));
    v.fill_circle(f.at(Vec2::new(-0.2, -0.2) * r), r * 0.4, VectorColor::hex(0xe8f4ff));
    v.stroke_circle(f.pos, r, 1.5, VectorColor::hex(0x5a9fc8));
    v.fill_circle(f.at(Vec2::new(-0.3, -0.3) * r), r * 0.3, VectorColor::new(1.0, 1.0, 1.0, 0.7));
    v.fill_circle(f.at(Vec2::new(0.2, 0.2) * r), r * 0.15, HIGHLIGHT);
}

fn draw_bee(v: &mut VectorState, f: &Frame, r: f32) {
    let wing_fill = VectorColor::new(200.0 / 255.0, 230.0 / 255.0, 1.0, 0.6);
    let wing_edge = VectorColor::new(150.0 / 255.0, 200.0 / 255.0, 230.0 / 255.0, 0.8);

    let body = Vec2::new(1.2, 0.8) * r;
    v.fill_ellipse(f.pos, body, f.angle, VectorColor::hex(0xffd700));
    v.stroke_ellipse(f.pos, body, f.angle, 1.0, VectorColor::BLACK);

    for x in [-0.4, 0.4] {
        let stripe = f.rect(Vec2::new(x, -0.8) * r, Vec2::new(0.3, 1.6) * r);
        v.fill_polygon(&stripe, VectorColor::BLACK);
    }

    for (side, tilt) in [(-1.0, -0.3), (1.0, 0.3)] {
        let center = f.at(Vec2::new(0.8 * side, -0.5) * r);
        let radii = Vec2::new(0.8, 0.5) * r;
        v.fill_ellipse(center, radii, f.angle + tilt, wing_fill);
        v.stroke_ellipse(center, radii, f.angle + tilt, 1.0, wing_edge);
    }

    for x in [-0.3, 0.3] {
        v.fill_circle(f.at(Vec2::new(x, -0.2) * r), r * 0.15, VectorColor::BLACK);
    }

    let stinger = [
        f.at(Vec2::new(1.2, 0.0) * r),
        f.at(Vec2::new(1.6, -0.2) * r),
        f.at(Vec2::new(1.6, 0.2) * r),
    ];
    v.fill_polygon(&stinger, VectorColor::hex(0x8b4513));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::{ShapeBudget, ShapeKind};
    use crate::palette::DROP_MAX_X;
    use shelter_engine::{EntityId, GameConfig};

    const G: f32 = 800.0;
    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn preview_stops_above_the_ground() {
        let path = trajectory_preview(Vec2::new(300.0, SKYLINE), 10.0, G, DT);
        assert_eq!(path[0], Vec2::new(300.0, SKYLINE));
        assert!(path.iter().all(|p| p.x == 300.0));
        let last = path.last().unwrap();
        assert!(last.y <= GROUND_LINE - 10.0);
        // Falling 350 px at g*dt^2 = 2/9 px per step squared takes ~56 steps.
        assert!(path.len() > 50 && path.len() <= PREVIEW_STEPS + 1, "{}", path.len());
        assert!(path.windows(2).all(|w| w[1].y > w[0].y));
    }

    #[test]
    fn preview_is_capped_at_sixty_steps() {
        let path = trajectory_preview(Vec2::new(0.0, SKYLINE), 0.0, 1.0, DT);
        assert_eq!(path.len(), PREVIEW_STEPS + 1);
    }

    #[test]
    fn preview_from_below_the_floor_is_just_the_start() {
        let path = trajectory_preview(Vec2::new(0.0, 455.0), 20.0, G, DT);
        assert_eq!(path, vec![Vec2::new(0.0, 455.0)]);
    }

    #[test]
    fn drop_preview_starts_at_the_clamped_release_point() {
        let mut palette = Palette::from_budget(&[ShapeBudget {
            shape: ShapeKind::Box {
                width: 100.0,
                height: 20.0,
            },
            count: 1,
        }]);
        assert!(drop_preview(&palette, G, DT).is_none());

        palette.begin_drag(0);
        palette.pointer_moved(Vec2::new(795.0, 40.0));
        let path = drop_preview(&palette, G, DT).unwrap();
        assert_eq!(path[0], Vec2::new(DROP_MAX_X, SKYLINE));
        assert_eq!(path[0], palette.drop_point());
        assert!(path.iter().all(|p| p.x == DROP_MAX_X));
    }

    #[test]
    fn every_skin_draws_something() {
        let config = GameConfig::default();
        for skin in [Skin::Egg, Skin::Hailstone, Skin::Bee, Skin::Flat] {
            let mut v = VectorState::with_capacity(config.max_vector_vertices);
            let outline = Outline::Circle { radius: 12.0 };
            let sprite = Sprite::skinned(outline, skin);
            let entity = Entity::new(EntityId(1))
                .with_pos(Vec2::new(100.0, 100.0))
                .with_rotation(0.4)
                .with_sprite(sprite);
            draw_entity(&mut v, &entity, &sprite);
            assert!(v.vertex_count() > 0, "{:?} drew nothing", skin);
            assert_eq!(v.vertex_count() % 3, 0);
        }
    }

    #[test]
    fn background_and_cloud_fill_the_buffer() {
        let mut v = VectorState::new();
        draw_background(&mut v);
        assert_eq!(v.vertex_count(), 12);
        draw_cloud(&mut v, Vec2::new(200.0, CLOUD_Y));
        assert!(v.vertex_count() > 12);
    }

    #[test]
    fn frame_rotates_local_points() {
        let entity = Entity::new(EntityId(1))
            .with_pos(Vec2::new(10.0, 10.0))
            .with_rotation(std::f32::consts::FRAC_PI_2);
        let frame = Frame::of(&entity);
        let p = frame.at(Vec2::new(1.0, 0.0));
        assert!((p - Vec2::new(10.0, 11.0)).length() < 1e-5);
    }
}
