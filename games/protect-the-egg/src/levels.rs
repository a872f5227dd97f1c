//! Level catalog.
//!
//! The 25 levels ship as embedded JSON, grouped by category in menu order.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use shelter_engine::Outline;

/// Embed the level table at compile time.
const LEVELS_JSON: &str = include_str!("../assets/levels.json");

/// Circle radius when a circle budget does not name one.
const DEFAULT_CIRCLE_RADIUS: f32 = 25.0;

/// A hazard family a level can release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    Hail,
    Bees,
    Boulders,
    Lasers,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 4] = [
        EnemyKind::Hail,
        EnemyKind::Bees,
        EnemyKind::Boulders,
        EnemyKind::Lasers,
    ];

    pub fn token(self) -> &'static str {
        match self {
            EnemyKind::Hail => "hail",
            EnemyKind::Bees => "bees",
            EnemyKind::Boulders => "boulders",
            EnemyKind::Lasers => "lasers",
        }
    }

    /// Whether a spawner exists for this kind.
    pub fn is_implemented(self) -> bool {
        matches!(self, EnemyKind::Hail | EnemyKind::Bees)
    }

    fn bit(self) -> u8 {
        match self {
            EnemyKind::Hail => 1,
            EnemyKind::Bees => 1 << 1,
            EnemyKind::Boulders => 1 << 2,
            EnemyKind::Lasers => 1 << 3,
        }
    }
}

impl FromStr for EnemyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        EnemyKind::ALL
            .into_iter()
            .find(|k| k.token() == s)
            .with_context(|| format!("unknown enemy kind {:?}", s))
    }
}

/// Set of hazard kinds, written `"hail+bees"` in level data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EnemyKinds(u8);

impl EnemyKinds {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn with(self, kind: EnemyKind) -> Self {
        Self(self.0 | kind.bit())
    }

    pub fn contains(self, kind: EnemyKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = EnemyKind> {
        EnemyKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }

    /// Kinds in the set that have no spawner.
    pub fn unimplemented(self) -> impl Iterator<Item = EnemyKind> {
        self.iter().filter(|k| !k.is_implemented())
    }
}

impl FromIterator<EnemyKind> for EnemyKinds {
    fn from_iter<I: IntoIterator<Item = EnemyKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl FromStr for EnemyKinds {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut kinds = Self::empty();
        for token in s.split('+') {
            kinds = kinds.with(token.trim().parse()?);
        }
        Ok(kinds)
    }
}

impl TryFrom<String> for EnemyKinds {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<EnemyKinds> for String {
    fn from(kinds: EnemyKinds) -> Self {
        kinds.to_string()
    }
}

impl fmt::Display for EnemyKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<&str> = self.iter().map(EnemyKind::token).collect();
        f.write_str(&tokens.join("+"))
    }
}

fn default_radius() -> f32 {
    DEFAULT_CIRCLE_RADIUS
}

/// Geometry of a placeable shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeKind {
    Box { width: f32, height: f32 },
    Circle {
        #[serde(default = "default_radius")]
        radius: f32,
    },
}

impl ShapeKind {
    pub fn outline(&self) -> Outline {
        match *self {
            ShapeKind::Box { width, height } => Outline::rect(width, height),
            ShapeKind::Circle { radius } => Outline::Circle { radius },
        }
    }

    fn is_valid(&self) -> bool {
        match *self {
            ShapeKind::Box { width, height } => width > 0.0 && height > 0.0,
            ShapeKind::Circle { radius } => radius > 0.0,
        }
    }
}

/// `count` copies of one shape granted to the player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeBudget {
    #[serde(flatten)]
    pub shape: ShapeKind,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    pub id: u32,
    pub name: String,
    /// Filled from the enclosing category.
    #[serde(skip)]
    pub category: String,
    pub enemies: EnemyKinds,
    pub shapes: Vec<ShapeBudget>,
    #[serde(rename = "duration")]
    pub duration_ms: u32,
}

impl LevelDescriptor {
    /// Total number of palette entries the budget grants.
    pub fn shape_count(&self) -> u32 {
        self.shapes.iter().map(|b| b.count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelCategory {
    #[serde(rename = "category")]
    pub name: String,
    pub levels: Vec<LevelDescriptor>,
}

/// Read-only catalog of categories and their levels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LevelCatalog {
    categories: Vec<LevelCategory>,
}

impl LevelCatalog {
    /// Load the catalog from the embedded JSON.
    pub fn load() -> Result<Self> {
        Self::from_json(LEVELS_JSON).context("embedded level table")
    }

    /// Parse a catalog from JSON. Level ids must be unique.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut categories: Vec<LevelCategory> =
            serde_json::from_str(json).context("parsing level catalog")?;

        let mut seen = HashSet::new();
        for category in &mut categories {
            for level in &mut category.levels {
                if !seen.insert(level.id) {
                    bail!("duplicate level id {}", level.id);
                }
                if let Some(bad) = level.shapes.iter().find(|b| !b.shape.is_valid()) {
                    bail!("level {} has a degenerate shape {:?}", level.id, bad.shape);
                }
                level.category = category.name.clone();
            }
        }

        Ok(Self { categories })
    }

    pub fn find(&self, id: u32) -> Option<&LevelDescriptor> {
        self.levels().find(|l| l.id == id)
    }

    /// Levels in menu order.
    pub fn levels(&self) -> impl Iterator<Item = &LevelDescriptor> {
        self.categories.iter().flat_map(|c| c.levels.iter())
    }

    pub fn categories(&self) -> &[LevelCategory] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.levels().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize back to the grouped JSON shape for the host menu.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.categories).context("serializing level catalog")
    }
}
