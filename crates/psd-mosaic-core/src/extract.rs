use crate::document::{BlendMode, LayerNode};
use crate::model::{IVec2, SpriteId};
use crate::naming::{NameRegistry, name_hash};
use image::RgbaImage;
use tracing::warn;

/// One flattened layer record produced by extraction.
///
/// Records live in an arena `Vec`; `parent_index` points at an earlier entry
/// (groups are appended before their children), `None` for roots. The identity
/// fields (`sprite_id`, `sprite_name`, `mosaic_position`) start blank and are
/// filled in by reconciliation.
#[derive(Debug, Clone)]
pub struct ExtractedLayer {
    pub layer_id: i64,
    pub name: String,
    pub parent_index: Option<usize>,
    pub is_group: bool,
    pub visible: bool,
    pub opacity: u8,
    pub blend_mode: BlendMode,
    pub pixels: Option<RgbaImage>,
    pub sprite_id: SpriteId,
    pub sprite_name: String,
    pub mosaic_position: IVec2,
}

impl ExtractedLayer {
    fn from_node(node: LayerNode, parent_index: Option<usize>) -> Self {
        Self {
            layer_id: node.id,
            name: node.name,
            parent_index,
            is_group: node.is_group,
            visible: node.visible,
            opacity: node.opacity,
            blend_mode: node.blend_mode,
            pixels: node.pixels,
            sprite_id: SpriteId::nil(),
            sprite_name: String::new(),
            mosaic_position: IVec2::default(),
        }
    }
}

/// Repairs duplicated layer ids in place, before anything keys on them.
///
/// Source editors reuse ids when layers are duplicated. A collision gets a
/// replacement id derived from a unique name, so the same tree repairs to the
/// same ids on every pass. Ids and repair names share one registry; hidden
/// layers are validated too, since a later pass may import them.
pub fn validate_layer_ids(layers: &mut [LayerNode]) {
    let mut registry = NameRegistry::new();
    validate_recursive(layers, &mut registry);
}

fn validate_recursive(layers: &mut [LayerNode], registry: &mut NameRegistry) {
    for layer in layers {
        if registry.contains_hash(layer.id) {
            let unique = registry.unique_name(&layer.name);
            let repaired = name_hash(&unique);
            warn!(
                layer = %layer.name,
                old_id = layer.id,
                new_id = repaired,
                "duplicate layer id, regenerating"
            );
            layer.id = repaired;
        } else {
            registry.add_hash(layer.id);
        }
        if !layer.children.is_empty() {
            validate_recursive(&mut layer.children, registry);
        }
    }
}

/// Walks the layer forest depth-first and flattens it into extraction records,
/// moving leaf pixel buffers out of the tree.
///
/// A hidden node is skipped together with its whole subtree unless
/// `include_hidden` is set.
pub fn extract_layers(layers: Vec<LayerNode>, include_hidden: bool) -> Vec<ExtractedLayer> {
    let mut out = Vec::new();
    extract_recursive(&mut out, layers, include_hidden, None);
    out
}

fn extract_recursive(
    out: &mut Vec<ExtractedLayer>,
    layers: Vec<LayerNode>,
    include_hidden: bool,
    parent_index: Option<usize>,
) {
    for mut node in layers {
        if !node.visible && !include_hidden {
            continue;
        }
        if node.is_group {
            let children = std::mem::take(&mut node.children);
            out.push(ExtractedLayer::from_node(node, parent_index));
            let index = out.len() - 1;
            extract_recursive(out, children, include_hidden, Some(index));
        } else {
            out.push(ExtractedLayer::from_node(node, parent_index));
        }
    }
}
