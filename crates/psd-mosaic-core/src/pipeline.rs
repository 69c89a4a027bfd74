use crate::compositing;
use crate::config::{ImportConfig, ImportMode};
use crate::document::Document;
use crate::error::{MosaicError, Result};
use crate::extract::{self, ExtractedLayer};
use crate::hierarchy::{self, NodePostProcessor, PlacementNode};
use crate::model::{IVec2, ImportStats, RectF, SpriteId, SpriteRecord, Vec2};
use crate::mosaic;
use crate::reconcile::{self, ImportState};
use image::RgbaImage;
use tracing::{instrument, warn};

/// Everything one import pass produces.
pub struct ImportOutput {
    /// The emitted texture: mosaic page or flattened canvas.
    pub texture: RgbaImage,
    /// Sprite records addressing into `texture`.
    pub sprites: Vec<SpriteRecord>,
    /// Placement tree mirroring the document's layer structure.
    pub hierarchy: PlacementNode,
    /// Snapshot to feed into the next import of the same document.
    pub state: ImportState,
    pub stats: ImportStats,
}

#[instrument(skip_all)]
/// Runs one import pass over `doc` and returns the texture, sprite records,
/// placement tree, and the state snapshot for the next pass.
///
/// `prev` is the state captured by the previous pass of the same document
/// (`ImportState::default()` on first import). Identity carried in `prev` is
/// what keeps sprite ids and manual record edits stable across re-imports.
pub fn import(doc: Document, name: &str, prev: &ImportState, cfg: &ImportConfig) -> Result<ImportOutput> {
    import_with_processor(doc, name, prev, cfg, None)
}

/// Same as [`import`] but runs `processor` over the finished placement tree.
pub fn import_with_processor(
    mut doc: Document,
    name: &str,
    prev: &ImportState,
    cfg: &ImportConfig,
    processor: Option<&dyn NodePostProcessor>,
) -> Result<ImportOutput> {
    cfg.validate()?;
    if doc.width == 0 || doc.height == 0 {
        return Err(MosaicError::InvalidDimensions {
            width: doc.width,
            height: doc.height,
        });
    }

    extract::validate_layer_ids(&mut doc.layers);
    let layers = extract::extract_layers(std::mem::take(&mut doc.layers), cfg.include_hidden);

    match cfg.mode {
        ImportMode::Mosaic => import_mosaic(&doc, name, layers, prev, cfg, processor),
        ImportMode::Flatten => import_flatten(&doc, name, layers, prev, cfg, processor),
    }
}

fn import_mosaic(
    doc: &Document,
    name: &str,
    mut layers: Vec<ExtractedLayer>,
    prev: &ImportState,
    cfg: &ImportConfig,
    processor: Option<&dyn NodePostProcessor>,
) -> Result<ImportOutput> {
    let mut packable: Vec<usize> = Vec::new();
    let mut images: Vec<&RgbaImage> = Vec::new();
    for (i, layer) in layers.iter().enumerate() {
        if layer.is_group {
            continue;
        }
        let Some(px) = layer.pixels.as_ref() else {
            continue;
        };
        if px.dimensions() != (doc.width, doc.height) {
            warn!(
                layer = %layer.name,
                raster_w = px.width(),
                raster_h = px.height(),
                canvas_w = doc.width,
                canvas_h = doc.height,
                "layer raster does not match the canvas, excluded from the mosaic"
            );
            continue;
        }
        packable.push(i);
        images.push(px);
    }
    if packable.is_empty() {
        return Err(MosaicError::EmptyDocument);
    }

    let page = mosaic::pack_layer_images(&images, cfg)?;

    let sprites = reconcile::reconcile(&mut layers, &packable, &page.placements, prev, cfg);

    let mut state = ImportState::capture(&layers, &sprites);
    state.library = prev.library.clone();

    let hierarchy = hierarchy::build_hierarchy(
        name,
        &layers,
        &sprites,
        (doc.width, doc.height),
        (page.width, page.height),
        &state.library,
        cfg,
        processor,
    );

    let used_area: u64 = page.placements.iter().map(|p| p.rect.area()).sum();
    let stats = ImportStats {
        num_layers: layers.len(),
        num_packed: packable.len(),
        width: page.width,
        height: page.height,
        used_area,
        occupancy: used_area as f64 / (page.width as u64 * page.height as u64) as f64,
    };

    Ok(ImportOutput {
        texture: page.image,
        sprites,
        hierarchy,
        state,
        stats,
    })
}

fn import_flatten(
    doc: &Document,
    name: &str,
    layers: Vec<ExtractedLayer>,
    prev: &ImportState,
    cfg: &ImportConfig,
    processor: Option<&dyn NodePostProcessor>,
) -> Result<ImportOutput> {
    let texture = compositing::flatten(&layers, cfg.include_hidden, doc.width, doc.height);

    // One record spanning the canvas. Identity comes from the previous pass so
    // the sprite id survives a re-import; geometry and defaults always reset.
    let mut record = match prev.sprites.first() {
        Some(r) => r.clone(),
        None => SpriteRecord::with_defaults(cfg.default_alignment, cfg.default_pivot, cfg.default_border),
    };
    record.name = format!("{name}_1");
    record.alignment = cfg.default_alignment;
    record.pivot = cfg.default_pivot;
    record.border = cfg.default_border;
    record.rect = RectF::new(0.0, 0.0, doc.width as f32, doc.height as f32);
    record.uv_transform = IVec2::default();
    let sprites = vec![record];

    let mut state = ImportState::capture(&[], &sprites);
    state.library = prev.library.clone();

    let record = &sprites[0];
    let scale = hierarchy::definition_scale(cfg.final_texture_size, (doc.width, doc.height));
    let pivot = record.alignment.pivot(record.pivot);
    let mut root = PlacementNode {
        name: name.to_owned(),
        sprite_id: SpriteId::nil(),
        position: Vec2::default(),
        size: Vec2::new(doc.width as f32, doc.height as f32),
        opacity: 1.0,
        children: Vec::new(),
    };
    root.children.push(PlacementNode {
        name: record.name.clone(),
        sprite_id: record.sprite_id,
        position: Vec2::new(
            pivot.x * record.rect.w * scale - doc.width as f32 / 2.0,
            pivot.y * record.rect.h * scale - doc.height as f32 / 2.0,
        ),
        size: Vec2::new(record.rect.w * scale, record.rect.h * scale),
        opacity: 1.0,
        children: Vec::new(),
    });
    if let Some(p) = processor {
        p.process(&mut root);
    }

    let used_area = doc.width as u64 * doc.height as u64;
    let stats = ImportStats {
        num_layers: layers.len(),
        num_packed: 1,
        width: doc.width,
        height: doc.height,
        used_area,
        occupancy: 1.0,
    };

    Ok(ImportOutput {
        texture,
        sprites,
        hierarchy: root,
        state,
        stats,
    })
}
