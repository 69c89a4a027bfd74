use image::{Rgba, RgbaImage};
use psd_mosaic_core::config::{ImportConfig, ImportMode};
use psd_mosaic_core::document::{Document, LayerNode};
use psd_mosaic_core::error::MosaicError;
use psd_mosaic_core::model::{IVec2, RectF, Vec2};
use psd_mosaic_core::pipeline::import;
use psd_mosaic_core::reconcile::ImportState;

fn block(w: u32, h: u32, bx: u32, by: u32, bw: u32, bh: u32, c: [u8; 4]) -> RgbaImage {
    let mut img = RgbaImage::new(w, h);
    for y in by..by + bh {
        for x in bx..bx + bw {
            img.put_pixel(x, y, Rgba(c));
        }
    }
    img
}

fn sample_doc(hair_name: &str) -> Document {
    Document::new(
        48,
        48,
        vec![
            LayerNode::leaf(1, hair_name, Some(block(48, 48, 2, 2, 6, 6, [200, 40, 40, 255]))),
            LayerNode::leaf(2, "face", Some(block(48, 48, 20, 12, 10, 8, [40, 200, 40, 255]))),
            LayerNode::leaf(3, "bg", Some(block(48, 48, 0, 0, 48, 48, [40, 40, 200, 255]))),
        ],
    )
}

#[test]
fn reimport_of_an_unchanged_document_is_identity() {
    let cfg = ImportConfig::default();
    let out1 = import(sample_doc("hair"), "doc", &ImportState::default(), &cfg).expect("first pass");
    let out2 = import(sample_doc("hair"), "doc", &out1.state, &cfg).expect("second pass");

    assert_eq!(out1.sprites, out2.sprites);
    assert_eq!(out1.hierarchy, out2.hierarchy);
    assert_eq!(out1.state.layers, out2.state.layers);
    assert_eq!(out1.texture.as_raw(), out2.texture.as_raw());
    assert_eq!(out1.stats.width, out2.stats.width);
    assert_eq!(out1.stats.height, out2.stats.height);
}

#[test]
fn layer_rename_keeps_the_sprite_id() {
    let cfg = ImportConfig::default();
    let out1 = import(sample_doc("old_name"), "doc", &ImportState::default(), &cfg).expect("first pass");
    let renamed = out1
        .sprites
        .iter()
        .find(|r| r.name == "old_name")
        .expect("record for the layer")
        .sprite_id;

    let out2 = import(sample_doc("new_name"), "doc", &out1.state, &cfg).expect("second pass");
    let record = out2
        .sprites
        .iter()
        .find(|r| r.sprite_id == renamed)
        .expect("id survives the rename");
    assert_eq!(record.name, "new_name");
}

#[test]
fn new_layers_join_the_existing_state() {
    let cfg = ImportConfig::default();
    let out1 = import(sample_doc("hair"), "doc", &ImportState::default(), &cfg).expect("first pass");

    let mut doc = sample_doc("hair");
    doc.layers.insert(
        1,
        LayerNode::leaf(9, "belt", Some(block(48, 48, 30, 30, 4, 4, [220, 220, 40, 255]))),
    );
    let out2 = import(doc, "doc", &out1.state, &cfg).expect("second pass");

    assert_eq!(out2.sprites.len(), 4);
    assert!(out2.sprites.iter().any(|r| r.name == "belt"));
    for old in &out1.sprites {
        let carried = out2
            .sprites
            .iter()
            .find(|r| r.sprite_id == old.sprite_id)
            .expect("old record still present");
        assert_eq!(carried.name, old.name);
    }
}

#[test]
fn mismatched_rasters_are_excluded_from_the_mosaic() {
    let doc = Document::new(
        32,
        32,
        vec![
            LayerNode::leaf(1, "good", Some(block(32, 32, 4, 4, 8, 8, [255, 0, 0, 255]))),
            LayerNode::leaf(2, "bad", Some(block(16, 16, 0, 0, 8, 8, [0, 255, 0, 255]))),
        ],
    );
    let out = import(doc, "doc", &ImportState::default(), &ImportConfig::default()).expect("import");

    assert_eq!(out.sprites.len(), 1);
    assert_eq!(out.sprites[0].name, "good");
    assert_eq!(out.stats.num_layers, 2);
    assert_eq!(out.stats.num_packed, 1);
}

#[test]
fn empty_document_is_an_error() {
    let doc = Document::new(32, 32, Vec::new());
    let Err(err) = import(doc, "doc", &ImportState::default(), &ImportConfig::default()) else {
        panic!("expected an error");
    };
    assert!(matches!(err, MosaicError::EmptyDocument));
}

#[test]
fn zero_canvas_is_rejected() {
    let doc = Document::new(0, 32, vec![LayerNode::leaf(1, "a", None)]);
    let Err(err) = import(doc, "doc", &ImportState::default(), &ImportConfig::default()) else {
        panic!("expected an error");
    };
    assert!(matches!(err, MosaicError::InvalidDimensions { width: 0, height: 32 }));
}

#[test]
fn hidden_layers_pack_only_when_requested() {
    let doc = || {
        let mut glow = LayerNode::leaf(2, "glow", Some(block(32, 32, 8, 8, 4, 4, [0, 255, 255, 255])));
        glow.visible = false;
        Document::new(
            32,
            32,
            vec![
                LayerNode::leaf(1, "base", Some(block(32, 32, 0, 0, 16, 16, [255, 0, 0, 255]))),
                glow,
            ],
        )
    };

    let out = import(doc(), "doc", &ImportState::default(), &ImportConfig::default()).expect("import");
    assert_eq!(out.sprites.len(), 1);

    let cfg = ImportConfig::builder().include_hidden(true).build();
    let out = import(doc(), "doc", &ImportState::default(), &cfg).expect("import");
    assert_eq!(out.sprites.len(), 2);
    assert!(out.sprites.iter().any(|r| r.name == "glow"));
}

#[test]
fn flatten_emits_one_canvas_record_and_reuses_it() {
    let cfg = ImportConfig::builder().mode(ImportMode::Flatten).build();
    let doc = || {
        Document::new(
            24,
            24,
            vec![
                LayerNode::leaf(1, "top", Some(block(24, 24, 0, 0, 24, 24, [250, 10, 10, 255]))),
                LayerNode::leaf(2, "bottom", Some(block(24, 24, 0, 0, 24, 24, [10, 10, 250, 255]))),
            ],
        )
    };

    let out1 = import(doc(), "doc", &ImportState::default(), &cfg).expect("first pass");
    assert_eq!(out1.texture.dimensions(), (24, 24));
    assert_eq!(out1.texture.get_pixel(5, 5).0, [250, 10, 10, 255]);
    assert_eq!(out1.sprites.len(), 1);
    assert_eq!(out1.sprites[0].name, "doc_1");
    assert_eq!(out1.sprites[0].rect, RectF::new(0.0, 0.0, 24.0, 24.0));
    assert_eq!(out1.sprites[0].uv_transform, IVec2::default());
    assert!(out1.state.layers.is_empty());
    assert_eq!(out1.stats.num_packed, 1);
    assert_eq!(out1.stats.occupancy, 1.0);

    let child = &out1.hierarchy.children[0];
    assert_eq!(out1.hierarchy.children.len(), 1);
    assert_eq!(child.name, "doc_1");
    assert_eq!(child.sprite_id, out1.sprites[0].sprite_id);
    assert_eq!(child.position, Vec2::default());
    assert_eq!(child.size, Vec2::new(24.0, 24.0));

    let out2 = import(doc(), "doc", &out1.state, &cfg).expect("second pass");
    assert_eq!(out2.sprites[0].sprite_id, out1.sprites[0].sprite_id);
}

#[test]
fn state_round_trips_through_json() {
    let out = import(sample_doc("hair"), "doc", &ImportState::default(), &ImportConfig::default())
        .expect("import");

    let json = serde_json::to_string(&out.state).expect("serialize");
    let back: ImportState = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.layers, out.state.layers);
    assert_eq!(back.sprites, out.state.sprites);
    assert_eq!(back.library, out.state.library);
}
