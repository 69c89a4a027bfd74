use crate::config::ImportConfig;
use crate::extract::ExtractedLayer;
use crate::model::{IVec2, RectF, SpriteId, SpriteLibrary, SpriteRecord};
use crate::mosaic::Placement;
use crate::naming::NameRegistry;
use serde::{Deserialize, Serialize};

/// Identity snapshot of one extracted layer, persisted between passes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerIdentity {
    pub layer_id: i64,
    pub sprite_id: SpriteId,
    pub sprite_name: String,
    pub mosaic_position: IVec2,
}

/// Durable state handed from one import pass to the next.
///
/// `layers` is the previous pass's layer snapshot keyed by layer id; `sprites`
/// are the previous sprite records, including any edits external tooling made
/// to them and any records users created by hand. An empty state means a first
/// import.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportState {
    #[serde(default)]
    pub layers: Vec<LayerIdentity>,
    #[serde(default)]
    pub sprites: Vec<SpriteRecord>,
    /// Variant grouping authored against this document; passes through import
    /// untouched.
    #[serde(default)]
    pub library: SpriteLibrary,
}

impl ImportState {
    /// Snapshot of the current pass, to be persisted for the next one.
    pub fn capture(layers: &[ExtractedLayer], sprites: &[SpriteRecord]) -> Self {
        Self {
            layers: layers
                .iter()
                .map(|l| LayerIdentity {
                    layer_id: l.layer_id,
                    sprite_id: l.sprite_id,
                    sprite_name: l.sprite_name.clone(),
                    mosaic_position: l.mosaic_position,
                })
                .collect(),
            sprites: sprites.to_vec(),
            library: SpriteLibrary::default(),
        }
    }
}

fn unique_sprite_name(name: &str, registry: &mut NameRegistry, keep_duplicates: bool) -> String {
    if keep_duplicates {
        return name.to_owned();
    }
    registry.unique_name(name)
}

/// Reconciles the freshly packed layers against the previous pass.
///
/// `packed` holds the indices of the layers that went through the packer, in
/// the same order as `placements`. Layer identity fields are filled in on
/// `layers`; the returned records are the new durable sprite list.
///
/// The pass runs in a fixed order:
/// 1. carry sprite id/name/mosaic position onto layers matched by layer id;
/// 2. drop records orphaned by deleted layers (user-created records have no
///    owning layer, so they survive);
/// 3. claim the names of surviving user-created records before anything
///    regenerates, so a regenerated name can never steal one;
/// 4. records whose name still matches their layer's last generated name
///    follow the layer name (re-uniqued); manually renamed records keep their
///    name;
/// 5. layers that are genuinely new (no record, unknown layer id) get a fresh
///    record with the configured defaults;
/// 6. retained rects shift by the difference between old and new mosaic
///    positions, which preserves manual rect edits relative to the layer
///    content; `uv_transform` is always replaced with the packer's value.
pub fn reconcile(
    layers: &mut [ExtractedLayer],
    packed: &[usize],
    placements: &[Placement],
    prev: &ImportState,
    cfg: &ImportConfig,
) -> Vec<SpriteRecord> {
    let mut registry = NameRegistry::new();

    for layer in layers.iter_mut() {
        if let Some(old) = prev.layers.iter().find(|o| o.layer_id == layer.layer_id) {
            layer.sprite_id = old.sprite_id;
            layer.sprite_name = old.sprite_name.clone();
            layer.mosaic_position = old.mosaic_position;
        }
    }

    let removed: Vec<SpriteId> = prev
        .layers
        .iter()
        .filter(|o| !layers.iter().any(|l| l.layer_id == o.layer_id))
        .map(|o| o.sprite_id)
        .collect();

    let mut records = prev.sprites.clone();

    if records.is_empty() || cfg.reslice {
        return reslice_from_layers(layers, packed, placements, &records, &mut registry, cfg);
    }

    records.retain(|r| !removed.contains(&r.sprite_id));

    for record in records.iter() {
        if !layers.iter().any(|l| l.sprite_id == record.sprite_id) {
            registry.add_name(&record.name);
        }
    }

    for record in records.iter_mut() {
        match layers.iter_mut().find(|l| l.sprite_id == record.sprite_id) {
            None => {
                // user-created record: its uv transform points at its own rect
                record.uv_transform =
                    IVec2::new(record.rect.x as i32, record.rect.y as i32);
                registry.add_name(&record.name);
            }
            Some(layer) if layer.sprite_name != record.name => {
                // manually renamed: keep the name, claim its hash
                registry.add_name(&record.name);
            }
            Some(layer) => {
                // still auto-named: follow the (possibly renamed) layer
                layer.sprite_name =
                    unique_sprite_name(&layer.name, &mut registry, cfg.keep_duplicate_names);
                record.name = layer.sprite_name.clone();
            }
        }
    }

    for (k, &i) in packed.iter().enumerate() {
        let mut idx = records
            .iter()
            .position(|r| r.sprite_id == layers[i].sprite_id);
        let in_old = prev
            .layers
            .iter()
            .any(|o| o.layer_id == layers[i].layer_id);
        match idx {
            None if !in_old => {
                let mut record = SpriteRecord::with_defaults(
                    cfg.default_alignment,
                    cfg.default_pivot,
                    cfg.default_border,
                );
                record.rect = RectF::from(placements[k].rect);
                layers[i].sprite_name =
                    unique_sprite_name(&layers[i].name, &mut registry, cfg.keep_duplicate_names);
                record.name = layers[i].sprite_name.clone();
                records.push(record);
                idx = Some(records.len() - 1);
            }
            Some(ri) => {
                // shift by the mosaic delta so manual rect edits stay put
                // relative to the layer content
                let record = &mut records[ri];
                record.rect.x =
                    record.rect.x - layers[i].mosaic_position.x as f32 + placements[k].rect.x as f32;
                record.rect.y =
                    record.rect.y - layers[i].mosaic_position.y as f32 + placements[k].rect.y as f32;
            }
            // the record was deleted by hand while its layer persists;
            // the layer stays sprite-less
            None => {}
        }
        if let Some(ri) = idx {
            records[ri].uv_transform = placements[k].uv_transform;
            layers[i].sprite_id = records[ri].sprite_id;
            layers[i].mosaic_position =
                IVec2::new(placements[k].rect.x as i32, placements[k].rect.y as i32);
        }
    }

    records
}

/// First import, or an explicit reslice: every packed layer gets a record
/// rebuilt from the packer output. Records matched by a carried sprite id keep
/// their pivot/border/alignment; everything else (user-created records
/// included) is dropped.
fn reslice_from_layers(
    layers: &mut [ExtractedLayer],
    packed: &[usize],
    placements: &[Placement],
    prev_records: &[SpriteRecord],
    registry: &mut NameRegistry,
    cfg: &ImportConfig,
) -> Vec<SpriteRecord> {
    let mut fresh = Vec::with_capacity(packed.len());
    for (k, &i) in packed.iter().enumerate() {
        let mut record = prev_records
            .iter()
            .find(|r| r.sprite_id == layers[i].sprite_id)
            .cloned()
            .unwrap_or_else(|| {
                SpriteRecord::with_defaults(
                    cfg.default_alignment,
                    cfg.default_pivot,
                    cfg.default_border,
                )
            });
        layers[i].sprite_name =
            unique_sprite_name(&layers[i].name, registry, cfg.keep_duplicate_names);
        record.name = layers[i].sprite_name.clone();
        record.rect = RectF::from(placements[k].rect);
        record.uv_transform = placements[k].uv_transform;
        layers[i].sprite_id = record.sprite_id;
        layers[i].mosaic_position =
            IVec2::new(placements[k].rect.x as i32, placements[k].rect.y as i32);
        fresh.push(record);
    }
    fresh
}
