//! Level geometry: boundary walls, ground, obstacles and the egg.

use glam::Vec2;
use shelter_engine::{
    BodyDesc, BodyKind, ColliderMaterial, EngineContext, Entity, EntityId, Outline, Skin, Sprite,
    VectorColor,
};

pub const FIELD_WIDTH: f32 = 800.0;
pub const FIELD_HEIGHT: f32 = 500.0;
/// Boundary between sky and field; shapes are dropped from here.
pub const SKYLINE: f32 = 100.0;
/// Top surface of the standard ground slab.
pub const GROUND_LINE: f32 = 460.0;
/// The boundary walls are centred on x = 0 and x = FIELD_WIDTH.
pub const WALL_THICKNESS: f32 = 40.0;

pub const PLAYER_RADIUS: f32 = 20.0;
const PLAYER_MATERIAL: ColliderMaterial = ColliderMaterial {
    restitution: 0.3,
    friction: 0.7,
    density: 0.001,
};

const EARTH: u32 = 0x6b5b4f;
const BARK: u32 = 0x4a3c2b;
const MOSS: u32 = 0x8b9a6b;
const WOOD: u32 = 0x8b7355;
const PETAL: u32 = 0xf19c79;
const HONEY: u32 = 0xd4a574;
const STONE: u32 = 0x8b8b8b;
const CAVE: u32 = 0x4a4a4a;

/// A static rectangle, centre-positioned, as the level data describes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub center: Vec2,
    pub width: f32,
    pub height: f32,
    pub angle: f32,
    pub color: u32,
}

const fn block(x: f32, y: f32, width: f32, height: f32, color: u32) -> Block {
    Block {
        center: Vec2::new(x, y),
        width,
        height,
        angle: 0.0,
        color,
    }
}

const fn tilted(x: f32, y: f32, width: f32, height: f32, angle: f32, color: u32) -> Block {
    Block {
        center: Vec2::new(x, y),
        width,
        height,
        angle,
        color,
    }
}

const WALLS: [Block; 2] = [
    block(0.0, 250.0, WALL_THICKNESS, FIELD_HEIGHT, EARTH),
    block(FIELD_WIDTH, 250.0, WALL_THICKNESS, FIELD_HEIGHT, EARTH),
];

const GROUND: Block = block(400.0, 480.0, 800.0, 40.0, EARTH);

/// Static geometry and egg placement for one level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub name: &'static str,
    pub ground: Block,
    pub obstacles: &'static [Block],
    pub player: Vec2,
    pub terrain_friction: f32,
}

const DEFAULT_FRICTION: f32 = 0.1;

const fn layout(name: &'static str, obstacles: &'static [Block], x: f32, y: f32) -> Layout {
    Layout {
        name,
        ground: GROUND,
        obstacles,
        player: Vec2::new(x, y),
        terrain_friction: DEFAULT_FRICTION,
    }
}

const PIT_BLOCKS: [Block; 4] = [
    block(250.0, 400.0, 25.0, 200.0, EARTH),
    block(550.0, 400.0, 25.0, 200.0, EARTH),
    block(150.0, 380.0, 35.0, 140.0, BARK),
    block(650.0, 380.0, 35.0, 140.0, BARK),
];
const BRANCH: [Block; 2] = [
    block(200.0, 350.0, 40.0, 300.0, BARK),
    block(300.0, 300.0, 200.0, 15.0, BARK),
];
const PLATFORM: [Block; 1] = [block(400.0, 380.0, 150.0, 20.0, EARTH)];
const VALLEY: [Block; 2] = [
    block(150.0, 420.0, 100.0, 120.0, MOSS),
    block(650.0, 420.0, 100.0, 120.0, MOSS),
];
const PEDESTAL: [Block; 1] = [block(400.0, 420.0, 40.0, 120.0, EARTH)];
const NEST: [Block; 2] = [
    tilted(330.0, 440.0, 15.0, 80.0, 0.3, WOOD),
    tilted(470.0, 440.0, 15.0, 80.0, -0.3, WOOD),
];
const BRANCHES: [Block; 2] = [
    block(250.0, 350.0, 150.0, 15.0, BARK),
    block(550.0, 350.0, 150.0, 15.0, BARK),
];
const SUSPENDED: [Block; 1] = [block(400.0, 350.0, 120.0, 15.0, WOOD)];
const FLOWER: [Block; 3] = [
    tilted(350.0, 420.0, 60.0, 10.0, 0.5, PETAL),
    tilted(450.0, 420.0, 60.0, 10.0, -0.5, PETAL),
    tilted(400.0, 380.0, 60.0, 10.0, 1.57, PETAL),
];
const HIVE: [Block; 3] = [
    block(400.0, 450.0, 120.0, 20.0, HONEY),
    block(400.0, 420.0, 100.0, 20.0, HONEY),
    block(400.0, 390.0, 80.0, 20.0, HONEY),
];
const ROCKS: [Block; 2] = [
    block(250.0, 440.0, 60.0, 80.0, STONE),
    block(300.0, 460.0, 60.0, 40.0, STONE),
];
const SLOPE: [Block; 1] = [tilted(350.0, 400.0, 180.0, 20.0, 0.3, STONE)];
const RAVINE: [Block; 2] = [
    tilted(280.0, 400.0, 30.0, 200.0, 0.2, STONE),
    tilted(520.0, 400.0, 30.0, 200.0, -0.2, STONE),
];
const PEAK: [Block; 1] = [block(400.0, 430.0, 100.0, 100.0, STONE)];
const CAVE_BLOCKS: [Block; 3] = [
    block(300.0, 380.0, 40.0, 200.0, CAVE),
    block(500.0, 380.0, 40.0, 200.0, CAVE),
    block(400.0, 300.0, 240.0, 40.0, CAVE),
];

/// Level 1 sinks the egg into a pit cut into a deeper slab.
const PIT: Layout = Layout {
    name: "pit",
    ground: block(400.0, 495.0, 800.0, 70.0, EARTH),
    obstacles: &PIT_BLOCKS,
    player: Vec2::new(400.0, 445.0),
    terrain_friction: 1.0,
};

/// Indexed by level id - 1.
static LAYOUTS: [Layout; 15] = [
    PIT,
    layout("branch", &BRANCH, 380.0, 280.0),
    layout("platform", &PLATFORM, 400.0, 350.0),
    layout("valley", &VALLEY, 400.0, 440.0),
    layout("pedestal", &PEDESTAL, 400.0, 370.0),
    layout("nest", &NEST, 400.0, 430.0),
    layout("branches", &BRANCHES, 400.0, 440.0),
    layout("suspended", &SUSPENDED, 400.0, 330.0),
    layout("flower", &FLOWER, 400.0, 430.0),
    layout("hive", &HIVE, 400.0, 360.0),
    layout("rocks", &ROCKS, 320.0, 430.0),
    layout("slope", &SLOPE, 370.0, 370.0),
    layout("ravine", &RAVINE, 400.0, 440.0),
    layout("peak", &PEAK, 400.0, 370.0),
    layout("cave", &CAVE_BLOCKS, 400.0, 440.0),
];

static FLAT: Layout = layout("flat", &[], 400.0, 400.0);

/// Layout for a level id. Ids without a registered layout get flat ground.
pub fn layout_for(level_id: u32) -> &'static Layout {
    level_id
        .checked_sub(1)
        .and_then(|idx| LAYOUTS.get(idx as usize))
        .unwrap_or(&FLAT)
}

fn spawn_block(ctx: &mut EngineContext, kind: BodyKind, b: &Block, friction: f32) -> EntityId {
    let outline = Outline::rect(b.width, b.height);
    let desc = BodyDesc::fixed(outline.into())
        .with_position(b.center)
        .with_rotation(b.angle);
    let material = ColliderMaterial {
        friction,
        ..ColliderMaterial::default()
    };
    let id = ctx.next_id();
    let entity = Entity::new(id)
        .with_kind(kind)
        .with_sprite(Sprite::flat(outline, VectorColor::hex(b.color)));
    ctx.spawn_with_body(entity, desc, material)
}

/// Populate the world for `level_id` and return the egg's id.
///
/// Always adds the two boundary walls. Unknown ids fall back to the flat layout.
pub fn build_scene(ctx: &mut EngineContext, level_id: u32) -> EntityId {
    let layout = layout_for(level_id);
    log::debug!("building {} layout for level {}", layout.name, level_id);

    for wall in &WALLS {
        spawn_block(ctx, BodyKind::Wall, wall, DEFAULT_FRICTION);
    }
    spawn_block(ctx, BodyKind::Ground, &layout.ground, layout.terrain_friction);
    for obstacle in layout.obstacles {
        spawn_block(ctx, BodyKind::Obstacle, obstacle, layout.terrain_friction);
    }

    let outline = Outline::Circle { radius: PLAYER_RADIUS };
    let id = ctx.next_id();
    let entity = Entity::new(id)
        .with_kind(BodyKind::Player)
        .with_sprite(Sprite::skinned(outline, Skin::Egg));
    let desc = BodyDesc::dynamic(outline.into()).with_position(layout.player);
    ctx.spawn_with_body(entity, desc, PLAYER_MATERIAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelter_engine::GameConfig;

    fn fresh_ctx() -> EngineContext {
        EngineContext::from_config(&GameConfig::default())
    }

    #[test]
    fn every_registered_level_has_one_player_walls_and_geometry() {
        for id in 1..=15 {
            let mut ctx = fresh_ctx();
            let player = build_scene(&mut ctx, id);
            let layout = layout_for(id);

            assert_eq!(ctx.scene.count_kind(BodyKind::Player), 1, "level {}", id);
            assert_eq!(ctx.scene.kind_of(player), Some(BodyKind::Player));
            assert_eq!(ctx.scene.count_kind(BodyKind::Wall), 2, "level {}", id);
            assert_eq!(ctx.scene.count_kind(BodyKind::Ground), 1, "level {}", id);
            assert_eq!(
                ctx.scene.count_kind(BodyKind::Obstacle),
                layout.obstacles.len(),
                "level {}",
                id
            );
            assert!(!layout.obstacles.is_empty(), "level {}", id);
            assert_eq!(ctx.scene.get(player).unwrap().pos, layout.player);
            assert_eq!(ctx.physics.body_count(), ctx.scene.len());
        }
    }

    #[test]
    fn unknown_ids_use_flat_ground() {
        for id in [0, 16, 25, 999] {
            let mut ctx = fresh_ctx();
            let player = build_scene(&mut ctx, id);
            assert_eq!(ctx.scene.len(), 4, "walls, ground and egg only");
            assert_eq!(ctx.scene.get(player).unwrap().pos, Vec2::new(400.0, 400.0));
            let ground = ctx.scene.iter_kind(BodyKind::Ground).next().unwrap();
            assert_eq!(ground.pos, Vec2::new(400.0, 480.0));
        }
    }

    #[test]
    fn walls_sit_on_both_edges() {
        let mut ctx = fresh_ctx();
        build_scene(&mut ctx, 3);
        let mut xs: Vec<f32> = ctx.scene.iter_kind(BodyKind::Wall).map(|w| w.pos.x).collect();
        xs.sort_by(f32::total_cmp);
        assert_eq!(xs, vec![0.0, 800.0]);
    }

    #[test]
    fn tilted_obstacles_keep_their_angle() {
        let mut ctx = fresh_ctx();
        build_scene(&mut ctx, 6);
        let mut angles: Vec<f32> = ctx
            .scene
            .iter_kind(BodyKind::Obstacle)
            .map(|o| o.rotation)
            .collect();
        angles.sort_by(f32::total_cmp);
        assert!((angles[0] + 0.3).abs() < 1e-5);
        assert!((angles[1] - 0.3).abs() < 1e-5);
    }

    #[test]
    fn pit_level_has_deep_ground() {
        let layout = layout_for(1);
        assert_eq!(layout.ground.height, 70.0);
        assert_eq!(layout.ground.center.y - layout.ground.height / 2.0, GROUND_LINE);
        assert_eq!(layout.player, Vec2::new(400.0, 445.0));
    }

    #[test]
    fn egg_rests_on_terrain_without_drifting_away() {
        let mut ctx = fresh_ctx();
        let player = build_scene(&mut ctx, 0);
        for _ in 0..180 {
            ctx.step_physics();
        }
        let pos = ctx.scene.get(player).unwrap().pos;
        assert!(pos.y < GROUND_LINE, "egg fell through the ground: {:?}", pos);
        assert!(pos.y > 400.0, "egg should settle on the ground: {:?}", pos);
    }
}
