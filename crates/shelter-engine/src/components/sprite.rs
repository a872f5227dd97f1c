use glam::Vec2;

use crate::systems::vector::VectorColor;

/// Body-local outline of a sprite. Matches the collider it was created with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outline {
    Circle { radius: f32 },
    Rect { half_width: f32, half_height: f32 },
}

impl Outline {
    /// Build a rectangle outline from full width and height.
    pub fn rect(width: f32, height: f32) -> Self {
        Outline::Rect {
            half_width: width / 2.0,
            half_height: height / 2.0,
        }
    }

    /// Half of the unrotated vertical extent.
    pub fn half_height(&self) -> f32 {
        match *self {
            Outline::Circle { radius } => radius,
            Outline::Rect { half_height, .. } => half_height,
        }
    }

    /// World-space polygon for a rectangle outline placed at `pos` with `rotation`.
    /// Circles have no corners and return `None`.
    pub fn corners(&self, pos: Vec2, rotation: f32) -> Option<[Vec2; 4]> {
        match *self {
            Outline::Circle { .. } => None,
            Outline::Rect { half_width, half_height } => {
                let rot = Vec2::from_angle(rotation);
                let local = [
                    Vec2::new(-half_width, -half_height),
                    Vec2::new(half_width, -half_height),
                    Vec2::new(half_width, half_height),
                    Vec2::new(-half_width, half_height),
                ];
                Some(local.map(|p| pos + rot.rotate(p)))
            }
        }
    }
}

/// Which drawing routine renders the body.
/// Resolved once when the entity is created; the render pass matches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Skin {
    /// Filled and stroked outline in the sprite colours.
    #[default]
    Flat,
    Egg,
    Hailstone,
    Bee,
}

/// Render descriptor for an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub outline: Outline,
    pub skin: Skin,
    pub fill: VectorColor,
    pub stroke: VectorColor,
    /// Opacity multiplier applied on top of the colours.
    pub alpha: f32,
}

impl Sprite {
    /// Default outline colour for flat shapes (`#5a4a3a`).
    pub const STROKE: VectorColor = VectorColor::hex(0x5a4a3a);

    /// A flat sprite with the default stroke.
    pub fn flat(outline: Outline, fill: VectorColor) -> Self {
        Self {
            outline,
            skin: Skin::Flat,
            fill,
            stroke: Self::STROKE,
            alpha: 1.0,
        }
    }

    /// A skinned sprite. Skins pick their own colours; `fill` is only a fallback.
    pub fn skinned(outline: Outline, skin: Skin) -> Self {
        Self {
            outline,
            skin,
            fill: VectorColor::WHITE,
            stroke: Self::STROKE,
            alpha: 1.0,
        }
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }
}
