use crate::config::ImportConfig;
use crate::extract::ExtractedLayer;
use crate::model::{SpriteId, SpriteLibrary, SpriteRecord, Vec2};
use crate::naming::NameRegistry;
use serde::{Deserialize, Serialize};

/// One node of the emitted placement tree.
///
/// Sibling order is bottom-to-top paint order: the last child draws on top.
/// `position` is the node's offset from the root's center in final-texture
/// pixels; plain group nodes sit at the origin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlacementNode {
    pub name: String,
    /// Nil for group nodes and for layers whose record is gone.
    pub sprite_id: SpriteId,
    pub position: Vec2,
    pub size: Vec2,
    /// Layer opacity as an alpha multiplier for consumers (0.0 to 1.0).
    pub opacity: f32,
    pub children: Vec<PlacementNode>,
}

impl PlacementNode {
    fn empty(name: String, sprite_id: SpriteId, opacity: f32) -> Self {
        Self {
            name,
            sprite_id,
            position: Vec2::default(),
            size: Vec2::default(),
            opacity,
            children: Vec::new(),
        }
    }
}

/// Hook run on the finished placement tree before it is returned, for callers
/// that post-process nodes (adding engine components, renaming, pruning).
pub trait NodePostProcessor {
    fn process(&self, root: &mut PlacementNode);
}

/// Compensation factor applied to placements when the emitted page gets
/// rescaled downstream: min of final/packed per axis, 1.0 without a rescale.
pub fn definition_scale(final_size: Option<(u32, u32)>, page: (u32, u32)) -> f32 {
    match final_size {
        None => 1.0,
        Some((fw, fh)) => {
            let sw = fw as f32 / page.0 as f32;
            let sh = fh as f32 / page.1 as f32;
            sw.min(sh)
        }
    }
}

/// Category check for the variant rule: the first label of a category is that
/// category's main sprite (the node takes the category name); later labels are
/// variants and get no node. Sprites in no category (and empty categories)
/// default to main.
fn sprite_is_main<'a>(library: &'a SpriteLibrary, id: SpriteId) -> (bool, Option<&'a str>) {
    for category in &library.categories {
        match category.labels.iter().position(|l| l.sprite_id == id) {
            Some(0) => return (true, Some(category.name.as_str())),
            Some(_) => return (false, None),
            None => {}
        }
    }
    (true, None)
}

struct ArenaNode {
    name: String,
    sprite_id: SpriteId,
    position: Vec2,
    size: Vec2,
    opacity: f32,
    children: Vec<usize>,
}

/// Builds the placement tree for one import pass.
///
/// Every layer resolves its parent chain before attaching (parents are always
/// at earlier indices), and each node is inserted as the *first* child of its
/// parent; processing top-most layers first therefore leaves siblings in
/// bottom-to-top order. With `generate_hierarchy` off, only sprite-bearing
/// leaves get nodes and the tree is flat.
pub fn build_hierarchy(
    name: &str,
    layers: &[ExtractedLayer],
    records: &[SpriteRecord],
    doc_size: (u32, u32),
    page_size: (u32, u32),
    library: &SpriteLibrary,
    cfg: &ImportConfig,
    processor: Option<&dyn NodePostProcessor>,
) -> PlacementNode {
    let mut arena = vec![ArenaNode {
        name: name.to_owned(),
        sprite_id: SpriteId::nil(),
        position: Vec2::default(),
        size: Vec2::new(doc_size.0 as f32, doc_size.1 as f32),
        opacity: 1.0,
        children: Vec::new(),
    }];
    let mut node_of: Vec<Option<usize>> = vec![None; layers.len()];
    let mut names = NameRegistry::new();

    for i in 0..layers.len() {
        ensure_node(
            i, layers, records, library, cfg, &mut arena, &mut node_of, &mut names,
        );
    }

    // position pass over sprite leaves
    let scale = definition_scale(cfg.final_texture_size, page_size);
    let half_w = doc_size.0 as f32 / 2.0;
    let half_h = doc_size.1 as f32 / 2.0;
    for (i, layer) in layers.iter().enumerate() {
        let Some(n) = node_of[i] else {
            continue;
        };
        if layer.is_group {
            continue;
        }
        let Some(record) = records.iter().find(|r| r.sprite_id == layer.sprite_id) else {
            continue;
        };
        let pivot = record.alignment.pivot(record.pivot);
        // rect + uv_transform recovers the content's canvas-space origin
        let off_x = (record.rect.x + record.uv_transform.x as f32 + pivot.x * record.rect.w) * scale;
        let off_y = (record.rect.y + record.uv_transform.y as f32 + pivot.y * record.rect.h) * scale;
        arena[n].position = Vec2::new(off_x - half_w, off_y - half_h);
        arena[n].size = Vec2::new(record.rect.w * scale, record.rect.h * scale);
    }

    let mut root = materialize(&arena, 0);
    if let Some(p) = processor {
        p.process(&mut root);
    }
    root
}

#[allow(clippy::too_many_arguments)]
fn ensure_node(
    i: usize,
    layers: &[ExtractedLayer],
    records: &[SpriteRecord],
    library: &SpriteLibrary,
    cfg: &ImportConfig,
    arena: &mut Vec<ArenaNode>,
    node_of: &mut [Option<usize>],
    names: &mut NameRegistry,
) {
    if node_of[i].is_some() {
        return;
    }
    let layer = &layers[i];

    let mut created = None;
    if cfg.generate_hierarchy || (!layer.sprite_id.is_nil() && !layer.is_group) {
        let (is_main, category) = sprite_is_main(library, layer.sprite_id);
        if is_main {
            let record = records.iter().find(|r| r.sprite_id == layer.sprite_id);
            let base = match category {
                Some(c) => c,
                None => record.map(|r| r.name.as_str()).unwrap_or(layer.name.as_str()),
            };
            let sprite_id = if layer.is_group || record.is_none() {
                SpriteId::nil()
            } else {
                layer.sprite_id
            };
            arena.push(ArenaNode {
                name: names.unique_name(base),
                sprite_id,
                position: Vec2::default(),
                size: Vec2::default(),
                opacity: layer.opacity as f32 / 255.0,
                children: Vec::new(),
            });
            created = Some(arena.len() - 1);
        }
    }

    let mut parent = 0usize;
    if let Some(pi) = layer.parent_index {
        if cfg.generate_hierarchy {
            ensure_node(pi, layers, records, library, cfg, arena, node_of, names);
            if let Some(pn) = node_of[pi] {
                parent = pn;
            }
        }
    }

    if let Some(n) = created {
        arena[parent].children.insert(0, n);
        node_of[i] = Some(n);
    }
}

fn materialize(arena: &[ArenaNode], idx: usize) -> PlacementNode {
    let n = &arena[idx];
    let mut node = PlacementNode::empty(n.name.clone(), n.sprite_id, n.opacity);
    node.position = n.position;
    node.size = n.size;
    node.children = n.children.iter().map(|&c| materialize(arena, c)).collect();
    node
}
