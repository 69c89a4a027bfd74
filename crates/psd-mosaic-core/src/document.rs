use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Per-layer blend modes. This is a closed set; documents using any other mode
/// are rejected by the producer before they reach this crate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Additive,
    ColorBurn,
    ColorDodge,
    Reflect,
    Glow,
    Overlay,
    Difference,
    Negation,
    Lighten,
    Darken,
    Screen,
    Xor,
}

impl std::str::FromStr for BlendMode {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "multiply" => Ok(Self::Multiply),
            "additive" => Ok(Self::Additive),
            "colorburn" => Ok(Self::ColorBurn),
            "colordodge" => Ok(Self::ColorDodge),
            "reflect" => Ok(Self::Reflect),
            "glow" => Ok(Self::Glow),
            "overlay" => Ok(Self::Overlay),
            "difference" => Ok(Self::Difference),
            "negation" => Ok(Self::Negation),
            "lighten" => Ok(Self::Lighten),
            "darken" => Ok(Self::Darken),
            "screen" => Ok(Self::Screen),
            "xor" => Ok(Self::Xor),
            _ => Err(()),
        }
    }
}

/// One node of the decoded layer tree.
///
/// `id` comes from the source document and is not guaranteed unique (source
/// editors reuse ids when layers are duplicated); import repairs collisions
/// before anything keys on it. List order is paint order: index 0 is the
/// topmost layer. Leaf `pixels` are canvas-sized RGBA; groups carry `None`.
#[derive(Debug, Clone, Default)]
pub struct LayerNode {
    pub id: i64,
    pub name: String,
    pub blend_mode: BlendMode,
    pub opacity: u8,
    pub visible: bool,
    pub is_group: bool,
    pub pixels: Option<RgbaImage>,
    pub children: Vec<LayerNode>,
}

impl LayerNode {
    /// A visible, fully opaque leaf layer.
    pub fn leaf(id: i64, name: impl Into<String>, pixels: Option<RgbaImage>) -> Self {
        Self {
            id,
            name: name.into(),
            blend_mode: BlendMode::Normal,
            opacity: 255,
            visible: true,
            is_group: false,
            pixels,
            children: Vec::new(),
        }
    }

    /// A visible group node.
    pub fn group(id: i64, name: impl Into<String>, children: Vec<LayerNode>) -> Self {
        Self {
            id,
            name: name.into(),
            blend_mode: BlendMode::Normal,
            opacity: 255,
            visible: true,
            is_group: true,
            pixels: None,
            children,
        }
    }

    /// Total node count of this subtree, this node included.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(LayerNode::subtree_len).sum::<usize>()
    }
}

/// A decoded layered document: canvas size plus the layer forest.
///
/// Producing this from an on-disk format is the caller's job; the importer
/// takes it by value and owns every pixel buffer for the duration of the pass.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub width: u32,
    pub height: u32,
    pub layers: Vec<LayerNode>,
}

impl Document {
    pub fn new(width: u32, height: u32, layers: Vec<LayerNode>) -> Self {
        Self {
            width,
            height,
            layers,
        }
    }

    /// Total number of layer nodes, groups included.
    pub fn layer_count(&self) -> usize {
        self.layers.iter().map(LayerNode::subtree_len).sum()
    }
}
