use psd_mosaic_core::config::ImportConfig;
use psd_mosaic_core::document::LayerNode;
use psd_mosaic_core::extract::{ExtractedLayer, extract_layers};
use psd_mosaic_core::model::{
    Border, IVec2, Rect, RectF, SpriteAlignment, SpriteId, SpriteRecord, Vec2,
};
use psd_mosaic_core::mosaic::Placement;
use psd_mosaic_core::reconcile::{ImportState, LayerIdentity, reconcile};

fn leaves(entries: &[(i64, &str)]) -> Vec<ExtractedLayer> {
    let nodes = entries
        .iter()
        .map(|&(id, name)| LayerNode::leaf(id, name, None))
        .collect();
    extract_layers(nodes, false)
}

fn place(x: u32, y: u32, w: u32, h: u32) -> Placement {
    Placement {
        rect: Rect::new(x, y, w, h),
        uv_transform: IVec2::new(7 - x as i32, 9 - y as i32),
    }
}

fn record(sid: SpriteId, name: &str, rect: RectF) -> SpriteRecord {
    let mut r = SpriteRecord::with_defaults(
        SpriteAlignment::default(),
        Vec2::new(0.5, 0.5),
        Border::default(),
    );
    r.sprite_id = sid;
    r.name = name.to_owned();
    r.rect = rect;
    r
}

fn identity(layer_id: i64, sid: SpriteId, name: &str, pos: (i32, i32)) -> LayerIdentity {
    LayerIdentity {
        layer_id,
        sprite_id: sid,
        sprite_name: name.to_owned(),
        mosaic_position: IVec2::new(pos.0, pos.1),
    }
}

#[test]
fn first_import_builds_records_from_the_packer() {
    let mut layers = leaves(&[(1, "hero"), (2, "hero")]);
    let placements = [place(2, 2, 10, 10), place(14, 2, 8, 8)];
    let cfg = ImportConfig::default();

    let records = reconcile(&mut layers, &[0, 1], &placements, &ImportState::default(), &cfg);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "hero");
    assert_eq!(records[1].name, "hero_1");
    for (k, rec) in records.iter().enumerate() {
        assert!(!rec.sprite_id.is_nil());
        assert_eq!(rec.rect, RectF::from(placements[k].rect));
        assert_eq!(rec.uv_transform, placements[k].uv_transform);
        assert_eq!(layers[k].sprite_id, rec.sprite_id);
        assert_eq!(layers[k].sprite_name, rec.name);
        assert_eq!(
            layers[k].mosaic_position,
            IVec2::new(placements[k].rect.x as i32, placements[k].rect.y as i32)
        );
    }
    assert_ne!(records[0].sprite_id, records[1].sprite_id);
}

#[test]
fn identity_carries_across_passes() {
    let cfg = ImportConfig::default();
    let mut layers = leaves(&[(1, "hero"), (2, "hero")]);
    let first = [place(2, 2, 10, 10), place(14, 2, 8, 8)];
    let records1 = reconcile(&mut layers, &[0, 1], &first, &ImportState::default(), &cfg);
    let state = ImportState::capture(&layers, &records1);

    // re-import the same document; the packer happens to place things elsewhere
    let mut layers = leaves(&[(1, "hero"), (2, "hero")]);
    let second = [place(30, 8, 10, 10), place(2, 2, 8, 8)];
    let records2 = reconcile(&mut layers, &[0, 1], &second, &state, &cfg);

    assert_eq!(records2.len(), 2);
    for k in 0..2 {
        assert_eq!(records2[k].sprite_id, records1[k].sprite_id);
        assert_eq!(records2[k].name, records1[k].name);
        assert_eq!(records2[k].rect, RectF::from(second[k].rect));
        assert_eq!(records2[k].uv_transform, second[k].uv_transform);
    }
}

#[test]
fn capture_snapshots_the_reconciled_identity() {
    let cfg = ImportConfig::default();
    let mut layers = leaves(&[(5, "fx")]);
    let placements = [place(4, 4, 6, 6)];
    let records = reconcile(&mut layers, &[0], &placements, &ImportState::default(), &cfg);

    let state = ImportState::capture(&layers, &records);
    assert_eq!(state.layers.len(), 1);
    assert_eq!(state.layers[0].layer_id, 5);
    assert_eq!(state.layers[0].sprite_id, records[0].sprite_id);
    assert_eq!(state.layers[0].sprite_name, "fx");
    assert_eq!(state.layers[0].mosaic_position, IVec2::new(4, 4));
    assert_eq!(state.sprites, records);
}

#[test]
fn manual_rect_edits_shift_with_the_layer() {
    let sid = SpriteId::generate();
    let prev = ImportState {
        layers: vec![identity(1, sid, "hero", (10, 10))],
        // rect was nudged by hand: x moved from 10 to 12, size trimmed to 9x9
        sprites: vec![record(sid, "hero", RectF::new(12.0, 10.0, 9.0, 9.0))],
        library: Default::default(),
    };
    let mut layers = leaves(&[(1, "hero")]);
    let placements = [place(32, 16, 11, 11)];

    let records = reconcile(&mut layers, &[0], &placements, &prev, &ImportConfig::default());

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].rect, RectF::new(34.0, 16.0, 9.0, 9.0));
    assert_eq!(records[0].uv_transform, placements[0].uv_transform);
    assert_eq!(layers[0].mosaic_position, IVec2::new(32, 16));
}

#[test]
fn manual_renames_are_preserved() {
    let sid = SpriteId::generate();
    let prev = ImportState {
        layers: vec![identity(1, sid, "hero", (0, 0))],
        sprites: vec![record(sid, "champion", RectF::new(0.0, 0.0, 4.0, 4.0))],
        library: Default::default(),
    };
    let mut layers = leaves(&[(1, "hero")]);
    let placements = [place(2, 2, 4, 4)];

    let records = reconcile(&mut layers, &[0], &placements, &prev, &ImportConfig::default());

    assert_eq!(records[0].name, "champion");
    // the generated name is still what the snapshot remembers
    assert_eq!(layers[0].sprite_name, "hero");
}

#[test]
fn auto_names_follow_a_layer_rename() {
    let sid = SpriteId::generate();
    let prev = ImportState {
        layers: vec![identity(1, sid, "old", (0, 0))],
        sprites: vec![record(sid, "old", RectF::new(0.0, 0.0, 4.0, 4.0))],
        library: Default::default(),
    };
    // the layer was renamed in the source document
    let mut layers = leaves(&[(1, "fresh")]);
    let placements = [place(2, 2, 4, 4)];

    let records = reconcile(&mut layers, &[0], &placements, &prev, &ImportConfig::default());

    assert_eq!(records[0].name, "fresh");
    assert_eq!(layers[0].sprite_name, "fresh");
}

#[test]
fn user_records_survive_layer_deletion() {
    let s1 = SpriteId::generate();
    let s2 = SpriteId::generate();
    let decal = record(
        SpriteId::generate(),
        "decal",
        RectF::new(40.0, 8.0, 16.0, 16.0),
    );
    let prev = ImportState {
        layers: vec![identity(1, s1, "kept", (0, 0)), identity(2, s2, "gone", (20, 0))],
        sprites: vec![
            record(s1, "kept", RectF::new(0.0, 0.0, 8.0, 8.0)),
            record(s2, "gone", RectF::new(20.0, 0.0, 8.0, 8.0)),
            decal.clone(),
        ],
        library: Default::default(),
    };
    // layer 2 was deleted from the document
    let mut layers = leaves(&[(1, "kept")]);
    let placements = [place(0, 0, 8, 8)];

    let records = reconcile(&mut layers, &[0], &placements, &prev, &ImportConfig::default());

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.sprite_id != s2));
    let kept_decal = records
        .iter()
        .find(|r| r.sprite_id == decal.sprite_id)
        .expect("user record survives");
    assert_eq!(kept_decal.name, "decal");
    // a user record's uv transform points at its own rect
    assert_eq!(kept_decal.uv_transform, IVec2::new(40, 8));
}

#[test]
fn user_record_names_are_claimed_before_regeneration() {
    let prev = ImportState {
        layers: Vec::new(),
        sprites: vec![record(
            SpriteId::generate(),
            "slice",
            RectF::new(0.0, 0.0, 4.0, 4.0),
        )],
        library: Default::default(),
    };
    // a brand new layer whose name collides with the user record
    let mut layers = leaves(&[(5, "slice")]);
    let placements = [place(2, 2, 4, 4)];
    let cfg = ImportConfig::default();

    let records = reconcile(&mut layers, &[0], &placements, &prev, &cfg);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "slice");
    assert_eq!(records[1].name, "slice_1");
    assert_eq!(layers[0].sprite_name, "slice_1");
    // the fresh record carries the configured defaults
    assert_eq!(records[1].alignment, cfg.default_alignment);
    assert_eq!(records[1].pivot, cfg.default_pivot);
}

#[test]
fn record_deleted_by_hand_leaves_the_layer_spriteless() {
    let s1 = SpriteId::generate();
    let s2 = SpriteId::generate();
    let prev = ImportState {
        layers: vec![identity(1, s1, "a", (0, 0)), identity(2, s2, "b", (10, 0))],
        // the record for layer 1 was deleted by hand
        sprites: vec![record(s2, "b", RectF::new(10.0, 0.0, 6.0, 6.0))],
        library: Default::default(),
    };
    let mut layers = leaves(&[(1, "a"), (2, "b")]);
    let placements = [place(0, 0, 6, 6), place(8, 0, 6, 6)];

    let records = reconcile(&mut layers, &[0, 1], &placements, &prev, &ImportConfig::default());

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].sprite_id, s2);
    assert!(!records.iter().any(|r| r.sprite_id == s1));
    // the surviving pair is rebound, the orphaned layer is not
    assert_eq!(layers[1].mosaic_position, IVec2::new(8, 0));
    assert_eq!(layers[0].mosaic_position, IVec2::new(0, 0));
}

#[test]
fn reslice_rebuilds_rects_but_keeps_trims() {
    let s1 = SpriteId::generate();
    let mut edited = record(s1, "hand_named", RectF::new(55.0, 55.0, 9.0, 9.0));
    edited.alignment = SpriteAlignment::Custom;
    edited.pivot = Vec2::new(0.2, 0.8);
    edited.border = Border::new(1.0, 2.0, 3.0, 4.0);
    let prev = ImportState {
        layers: vec![identity(1, s1, "a", (3, 3))],
        sprites: vec![
            edited,
            record(SpriteId::generate(), "decal", RectF::new(0.0, 0.0, 2.0, 2.0)),
        ],
        library: Default::default(),
    };
    let mut layers = leaves(&[(1, "a")]);
    let placements = [place(6, 6, 12, 12)];
    let cfg = ImportConfig::builder().reslice(true).build();

    let records = reconcile(&mut layers, &[0], &placements, &prev, &cfg);

    // user records are dropped, matched records are rebuilt in place
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].sprite_id, s1);
    assert_eq!(records[0].name, "a");
    assert_eq!(records[0].rect, RectF::from(placements[0].rect));
    assert_eq!(records[0].alignment, SpriteAlignment::Custom);
    assert_eq!(records[0].pivot, Vec2::new(0.2, 0.8));
    assert_eq!(records[0].border, Border::new(1.0, 2.0, 3.0, 4.0));
}

#[test]
fn keep_duplicate_names_emits_names_verbatim() {
    let mut layers = leaves(&[(1, "part"), (2, "part")]);
    let placements = [place(0, 0, 4, 4), place(8, 0, 4, 4)];
    let cfg = ImportConfig::builder().keep_duplicate_names(true).build();

    let records = reconcile(&mut layers, &[0, 1], &placements, &ImportState::default(), &cfg);

    assert_eq!(records[0].name, "part");
    assert_eq!(records[1].name, "part");
}
