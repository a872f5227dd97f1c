//! Shapes the player can drop into the level.

use glam::Vec2;
use shelter_engine::{
    BodyDesc, BodyKind, ColliderMaterial, EngineContext, Entity, EntityId, Sprite, VectorColor,
};

use crate::levels::{ShapeBudget, ShapeKind};
use crate::scene::SKYLINE;

pub const DROP_MIN_X: f32 = 40.0;
pub const DROP_MAX_X: f32 = 760.0;
const GHOST_MIN_Y: f32 = 20.0;

pub const PLACED_FILL: VectorColor = VectorColor::hex(0x8b7355);
const PLACED_DRAG: f32 = 0.005;
const PLACED_MATERIAL: ColliderMaterial = ColliderMaterial {
    restitution: 0.2,
    friction: 1.2,
    density: 0.002,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteEntry {
    pub shape: ShapeKind,
    pub used: bool,
}

/// One entry per granted shape, plus the drag in progress.
#[derive(Debug, Clone, Default)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
    dragging: Option<usize>,
    pointer: Vec2,
}

impl Palette {
    /// Expand a shape budget into individual entries, in budget order.
    pub fn from_budget(budget: &[ShapeBudget]) -> Self {
        let entries = budget
            .iter()
            .flat_map(|b| {
                std::iter::repeat(PaletteEntry {
                    shape: b.shape,
                    used: false,
                })
                .take(b.count as usize)
            })
            .collect();
        Self {
            entries,
            dragging: None,
            pointer: Vec2::ZERO,
        }
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.entries.iter().filter(|e| !e.used).count()
    }

    /// Pick up an entry. Ignored for used or out-of-range entries.
    pub fn begin_drag(&mut self, index: usize) -> bool {
        match self.entries.get(index) {
            Some(entry) if !entry.used => {
                self.dragging = Some(index);
                true
            }
            _ => false,
        }
    }

    pub fn cancel_drag(&mut self) {
        self.dragging = None;
    }

    /// The entry being dragged.
    pub fn dragged(&self) -> Option<(usize, &PaletteEntry)> {
        self.dragging.map(|i| (i, &self.entries[i]))
    }

    pub fn pointer_moved(&mut self, pos: Vec2) {
        self.pointer = pos;
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Where the ghost is drawn while dragging.
    pub fn ghost_position(&self) -> Option<Vec2> {
        self.dragging.map(|_| {
            Vec2::new(
                self.pointer.x.clamp(DROP_MIN_X, DROP_MAX_X),
                self.pointer.y.clamp(GHOST_MIN_Y, SKYLINE),
            )
        })
    }

    /// Shapes always enter the world at the skyline.
    pub fn drop_point(&self) -> Vec2 {
        Vec2::new(self.pointer.x.clamp(DROP_MIN_X, DROP_MAX_X), SKYLINE)
    }

    /// Release the dragged shape into the world.
    /// Returns the entry index and the new body, or `None` without a drag.
    pub fn commit_drag(&mut self, ctx: &mut EngineContext) -> Option<(usize, EntityId)> {
        let index = self.dragging.take()?;
        let entry = &mut self.entries[index];
        entry.used = true;

        let outline = entry.shape.outline();
        let desc = BodyDesc::dynamic(outline.into())
            .with_position(self.drop_point())
            .with_air_drag(PLACED_DRAG);
        let id = ctx.next_id();
        let entity = Entity::new(id)
            .with_kind(BodyKind::Placed)
            .with_sprite(Sprite::flat(outline, PLACED_FILL));
        ctx.spawn_with_body(entity, desc, PLACED_MATERIAL);
        log::debug!("placed palette entry {} as {:?}", index, id);
        Some((index, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelter_engine::GameConfig;

    fn budget() -> Vec<ShapeBudget> {
        vec![
            ShapeBudget {
                shape: ShapeKind::Box { width: 100.0, height: 20.0 },
                count: 2,
            },
            ShapeBudget {
                shape: ShapeKind::Circle { radius: 25.0 },
                count: 1,
            },
        ]
    }

    #[test]
    fn budget_expands_in_order() {
        let palette = Palette::from_budget(&budget());
        assert_eq!(palette.len(), 3);
        assert!(matches!(palette.entries()[1].shape, ShapeKind::Box { .. }));
        assert!(matches!(palette.entries()[2].shape, ShapeKind::Circle { .. }));
        assert_eq!(palette.remaining(), 3);
    }

    #[test]
    fn out_of_range_grab_is_ignored() {
        let mut palette = Palette::from_budget(&budget());
        assert!(!palette.begin_drag(3));
        assert!(palette.dragged().is_none());
        assert!(palette.ghost_position().is_none());
    }

    #[test]
    fn commit_without_drag_does_nothing() {
        let mut ctx = EngineContext::from_config(&GameConfig::default());
        let mut palette = Palette::from_budget(&budget());
        assert_eq!(palette.commit_drag(&mut ctx), None);
        assert!(ctx.scene.is_empty());
    }

    #[test]
    fn ghost_is_clamped_to_the_sky() {
        let mut palette = Palette::from_budget(&budget());
        palette.begin_drag(0);
        palette.pointer_moved(Vec2::new(5.0, 300.0));
        assert_eq!(palette.ghost_position(), Some(Vec2::new(40.0, 100.0)));
        palette.pointer_moved(Vec2::new(900.0, -10.0));
        assert_eq!(palette.ghost_position(), Some(Vec2::new(760.0, 20.0)));
    }

    #[test]
    fn commit_spawns_at_skyline_and_consumes_entry() {
        let mut ctx = EngineContext::from_config(&GameConfig::default());
        let mut palette = Palette::from_budget(&budget());
        assert!(palette.begin_drag(2));
        palette.pointer_moved(Vec2::new(820.0, 400.0));

        let (index, id) = palette.commit_drag(&mut ctx).unwrap();
        assert_eq!(index, 2);
        let body = ctx.scene.get(id).unwrap();
        assert_eq!(body.kind, BodyKind::Placed);
        assert_eq!(body.pos, Vec2::new(760.0, 100.0));
        assert!(palette.entries()[2].used);
        assert_eq!(palette.remaining(), 2);

        // A used entry cannot be picked up again.
        assert!(!palette.begin_drag(2));
        assert_eq!(palette.commit_drag(&mut ctx), None);
        assert_eq!(ctx.scene.count_kind(BodyKind::Placed), 1);
    }

    #[test]
    fn placed_shapes_fall() {
        let mut ctx = EngineContext::from_config(&GameConfig::default());
        let mut palette = Palette::from_budget(&budget());
        palette.begin_drag(0);
        palette.pointer_moved(Vec2::new(400.0, 50.0));
        let (_, id) = palette.commit_drag(&mut ctx).unwrap();
        for _ in 0..20 {
            ctx.step_physics();
        }
        assert!(ctx.scene.get(id).unwrap().pos.y > SKYLINE);
    }
}
