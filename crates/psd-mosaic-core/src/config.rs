use crate::model::{Border, SpriteAlignment, Vec2};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Import modes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Extract every layer, pack the trimmed rasters into one atlas page and
    /// emit one sprite record per packed layer.
    Mosaic,
    /// Composite the whole document into a single canvas-sized image with one
    /// sprite record covering it.
    Flatten,
}

impl FromStr for ImportMode {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mosaic" => Ok(Self::Mosaic),
            "flatten" => Ok(Self::Flatten),
            _ => Err(()),
        }
    }
}

/// MaxRects placement heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PackHeuristic {
    BestAreaFit,
    BestShortSideFit,
    BestLongSideFit,
    BottomLeft,
}

impl FromStr for PackHeuristic {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baf" | "bestareafit" => Ok(Self::BestAreaFit),
            "bssf" | "bestshortsidefit" => Ok(Self::BestShortSideFit),
            "blsf" | "bestlongsidefit" => Ok(Self::BestLongSideFit),
            "bl" | "bottomleft" => Ok(Self::BottomLeft),
            _ => Err(()),
        }
    }
}

/// Import pass configuration.
/// Key notes:
///   - `mode` selects mosaic (per-layer sprites) or flatten (one sprite)
///   - `padding` is split half/half around each placed rect
///   - reconciliation fields (`keep_duplicate_names`, `reslice`, defaults for
///     new records) only apply in mosaic mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "default_mode")]
    pub mode: ImportMode,
    /// Extract layers that are hidden in the source document (and their
    /// subtrees).
    #[serde(default)]
    pub include_hidden: bool,
    /// Pixels between placed rects and around the page border.
    #[serde(default = "default_padding")]
    pub padding: u32,
    /// Upper bound for either atlas page extent; exceeding it fails the pass.
    #[serde(default = "default_max_atlas_size")]
    pub max_atlas_size: u32,
    #[serde(default = "default_heuristic")]
    pub heuristic: PackHeuristic,
    /// Emit sprite names verbatim instead of disambiguating with `_N`.
    #[serde(default)]
    pub keep_duplicate_names: bool,
    /// Rebuild every sprite rect from the packer output, keeping only
    /// pivot/border/alignment of records matched by id.
    #[serde(default)]
    pub reslice: bool,
    /// Build placement nodes for groups and resolve parent chains; when off,
    /// only sprite-bearing leaves get (flat) nodes.
    #[serde(default = "default_generate_hierarchy")]
    pub generate_hierarchy: bool,

    // defaults stamped onto newly created sprite records
    #[serde(default)]
    pub default_alignment: SpriteAlignment,
    #[serde(default = "default_pivot")]
    pub default_pivot: Vec2,
    #[serde(default)]
    pub default_border: Border,

    /// Dimensions the emitted page will have after a downstream texture
    /// pipeline rescales it, if any. Placement offsets compensate for the
    /// difference; `None` means the page is consumed at full size.
    #[serde(default)]
    pub final_texture_size: Option<(u32, u32)>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            include_hidden: false,
            padding: default_padding(),
            max_atlas_size: default_max_atlas_size(),
            heuristic: default_heuristic(),
            keep_duplicate_names: false,
            reslice: false,
            generate_hierarchy: default_generate_hierarchy(),
            default_alignment: SpriteAlignment::default(),
            default_pivot: default_pivot(),
            default_border: Border::default(),
            final_texture_size: None,
        }
    }
}

impl ImportConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - The atlas size bound is zero or leaves no room after padding
    /// - The default pivot is outside the unit square
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::MosaicError;

        if self.max_atlas_size == 0 {
            return Err(MosaicError::InvalidDimensions {
                width: self.max_atlas_size,
                height: self.max_atlas_size,
            });
        }

        let total_border = self.padding.saturating_mul(2);
        if total_border >= self.max_atlas_size {
            return Err(MosaicError::InvalidConfig(format!(
                "padding ({}) * 2 exceeds the maximum atlas size ({})",
                self.padding, self.max_atlas_size
            )));
        }

        let p = self.default_pivot;
        if !(0.0..=1.0).contains(&p.x) || !(0.0..=1.0).contains(&p.y) {
            return Err(MosaicError::InvalidConfig(format!(
                "default_pivot ({}, {}) is outside [0, 1]",
                p.x, p.y
            )));
        }

        if let Some((w, h)) = self.final_texture_size {
            if w == 0 || h == 0 {
                return Err(MosaicError::InvalidDimensions {
                    width: w,
                    height: h,
                });
            }
        }

        Ok(())
    }
}

fn default_mode() -> ImportMode {
    ImportMode::Mosaic
}
fn default_padding() -> u32 {
    4
}
fn default_max_atlas_size() -> u32 {
    4096
}
fn default_heuristic() -> PackHeuristic {
    PackHeuristic::BestAreaFit
}
fn default_generate_hierarchy() -> bool {
    true
}
fn default_pivot() -> Vec2 {
    Vec2::new(0.5, 0.5)
}

/// Builder for `ImportConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct ImportConfigBuilder {
    cfg: ImportConfig,
}

impl ImportConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: ImportConfig::default(),
        }
    }
    pub fn mode(mut self, v: ImportMode) -> Self {
        self.cfg.mode = v;
        self
    }
    pub fn include_hidden(mut self, v: bool) -> Self {
        self.cfg.include_hidden = v;
        self
    }
    pub fn padding(mut self, v: u32) -> Self {
        self.cfg.padding = v;
        self
    }
    pub fn max_atlas_size(mut self, v: u32) -> Self {
        self.cfg.max_atlas_size = v;
        self
    }
    pub fn heuristic(mut self, v: PackHeuristic) -> Self {
        self.cfg.heuristic = v;
        self
    }
    pub fn keep_duplicate_names(mut self, v: bool) -> Self {
        self.cfg.keep_duplicate_names = v;
        self
    }
    pub fn reslice(mut self, v: bool) -> Self {
        self.cfg.reslice = v;
        self
    }
    pub fn generate_hierarchy(mut self, v: bool) -> Self {
        self.cfg.generate_hierarchy = v;
        self
    }
    pub fn default_alignment(mut self, v: SpriteAlignment) -> Self {
        self.cfg.default_alignment = v;
        self
    }
    pub fn default_pivot(mut self, v: Vec2) -> Self {
        self.cfg.default_pivot = v;
        self
    }
    pub fn default_border(mut self, v: Border) -> Self {
        self.cfg.default_border = v;
        self
    }
    pub fn final_texture_size(mut self, v: Option<(u32, u32)>) -> Self {
        self.cfg.final_texture_size = v;
        self
    }
    pub fn build(self) -> ImportConfig {
        self.cfg
    }
}

impl ImportConfig {
    /// Create a fluent builder for `ImportConfig`.
    pub fn builder() -> ImportConfigBuilder {
        ImportConfigBuilder::new()
    }
}
