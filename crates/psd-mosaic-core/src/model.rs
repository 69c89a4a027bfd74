use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
///
/// Used for canvas-space tight rects and atlas-space placements. Row 0 is the
/// top row of the canvas everywhere in this crate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
}

/// Float rectangle for sprite records. Sprite rects live in atlas space but can
/// carry fractional edits made by external sprite tooling, so they stay `f32`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl RectF {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

impl From<Rect> for RectF {
    fn from(r: Rect) -> Self {
        Self::new(r.x as f32, r.y as f32, r.w as f32, r.h as f32)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Integer offset, used for `uv_transform` and mosaic positions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct IVec2 {
    pub x: i32,
    pub y: i32,
}

impl IVec2 {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Stable identity token tying a layer to its sprite record across re-imports.
///
/// The nil id means "no sprite assigned yet"; fresh ids are random v4.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct SpriteId(Uuid);

impl SpriteId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl std::fmt::Display for SpriteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Anchor presets for sprite pivots. `Custom` defers to the record's own pivot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpriteAlignment {
    #[default]
    Center,
    TopLeft,
    TopCenter,
    TopRight,
    LeftCenter,
    RightCenter,
    BottomLeft,
    BottomCenter,
    BottomRight,
    Custom,
}

impl SpriteAlignment {
    /// Normalized pivot within the sprite rect (top-left origin canvas).
    pub fn pivot(&self, custom: Vec2) -> Vec2 {
        match self {
            Self::Center => Vec2::new(0.5, 0.5),
            Self::TopLeft => Vec2::new(0.0, 0.0),
            Self::TopCenter => Vec2::new(0.5, 0.0),
            Self::TopRight => Vec2::new(1.0, 0.0),
            Self::LeftCenter => Vec2::new(0.0, 0.5),
            Self::RightCenter => Vec2::new(1.0, 0.5),
            Self::BottomLeft => Vec2::new(0.0, 1.0),
            Self::BottomCenter => Vec2::new(0.5, 1.0),
            Self::BottomRight => Vec2::new(1.0, 1.0),
            Self::Custom => custom,
        }
    }
}

impl std::str::FromStr for SpriteAlignment {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "center" => Ok(Self::Center),
            "topleft" => Ok(Self::TopLeft),
            "topcenter" => Ok(Self::TopCenter),
            "topright" => Ok(Self::TopRight),
            "leftcenter" => Ok(Self::LeftCenter),
            "rightcenter" => Ok(Self::RightCenter),
            "bottomleft" => Ok(Self::BottomLeft),
            "bottomcenter" => Ok(Self::BottomCenter),
            "bottomright" => Ok(Self::BottomRight),
            "custom" => Ok(Self::Custom),
            _ => Err(()),
        }
    }
}

/// Nine-slice border widths in pixels, measured inward from each rect edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Border {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl Border {
    pub fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }
}

/// One sprite's durable metadata.
///
/// Records are what survives between import passes: external tooling may edit
/// `name`, `rect`, `pivot`, `border` or the outline data, and reconciliation is
/// responsible for carrying those edits through a re-import. `uv_transform`
/// maps atlas texels back to canvas texels (`canvas = placed + uv_transform`)
/// and is recomputed every pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpriteRecord {
    pub sprite_id: SpriteId,
    pub name: String,
    pub rect: RectF,
    pub alignment: SpriteAlignment,
    pub pivot: Vec2,
    pub border: Border,
    pub uv_transform: IVec2,
    /// Opaque mesh-outline data authored downstream; carried, never interpreted.
    #[serde(default)]
    pub outline: Vec<Vec<Vec2>>,
    /// Opaque tessellation hint authored downstream; carried, never interpreted.
    #[serde(default)]
    pub tessellation_detail: f32,
}

impl SpriteRecord {
    /// A blank record with a freshly minted id and the given defaults.
    pub fn with_defaults(alignment: SpriteAlignment, pivot: Vec2, border: Border) -> Self {
        Self {
            sprite_id: SpriteId::generate(),
            name: String::new(),
            rect: RectF::default(),
            alignment,
            pivot,
            border,
            uv_transform: IVec2::default(),
            outline: Vec::new(),
            tessellation_detail: 0.0,
        }
    }
}

/// One labelled sprite inside a library category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpriteLabel {
    pub name: String,
    pub sprite_id: SpriteId,
}

/// A named variant group. The first label is the category's main sprite; the
/// rest are variants of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpriteCategory {
    pub name: String,
    pub labels: Vec<SpriteLabel>,
}

/// User-authored variant grouping, carried with the import state. Sprites
/// filed as variants (label index > 0) get no placement node of their own.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SpriteLibrary {
    pub categories: Vec<SpriteCategory>,
}

/// Statistics about one import pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ImportStats {
    /// Number of extracted layer records (groups included).
    pub num_layers: usize,
    /// Number of layers that went through the packer.
    pub num_packed: usize,
    /// Emitted texture dimensions.
    pub width: u32,
    pub height: u32,
    /// Total area used by placed rects.
    pub used_area: u64,
    /// used_area / page area (0.0 to 1.0). Higher is better.
    pub occupancy: f64,
}

impl ImportStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Layers: {}, Packed: {}, Page: {}x{}, Used Area: {} px², Occupancy: {:.2}%",
            self.num_layers,
            self.num_packed,
            self.width,
            self.height,
            self.used_area,
            self.occupancy * 100.0,
        )
    }
}
