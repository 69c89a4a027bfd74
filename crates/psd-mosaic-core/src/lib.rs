//! Core library for importing layered documents as sprite mosaics.
//!
//! - Extraction flattens the layer tree into a parent-indexed list with stable layer ids
//! - Mosaic mode packs per-layer rasters into one page (MaxRects, no rotation); flatten mode composites the document instead
//! - Reconciliation carries sprite ids, names, and manual record edits across re-imports
//! - Data model is serde-serializable; persist [`ImportState`] between passes
//!
//! Quick example:
//! ```ignore
//! use psd_mosaic_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let doc = Document::new(64, 64, vec![/* layer tree */]);
//! let cfg = ImportConfig::builder().padding(2).build();
//! let out = import(doc, "character", &ImportState::default(), &cfg)?;
//! println!("{}", out.stats.summary());
//! // feed `out.state` into the next import of the same document
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod hierarchy;
pub mod model;
pub mod mosaic;
pub mod naming;
pub mod packer;
pub mod pipeline;
pub mod reconcile;

pub use config::*;
pub use document::*;
pub use error::*;
pub use model::*;
pub use packer::*;
pub use pipeline::*;
pub use reconcile::*;

/// Convenience prelude for common types and functions.
/// Importing `psd_mosaic_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{ImportConfig, ImportConfigBuilder, ImportMode, PackHeuristic};
    pub use crate::document::{BlendMode, Document, LayerNode};
    pub use crate::hierarchy::{NodePostProcessor, PlacementNode};
    pub use crate::model::{
        Border, ImportStats, Rect, RectF, SpriteAlignment, SpriteId, SpriteLibrary, SpriteRecord,
    };
    pub use crate::reconcile::ImportState;
    pub use crate::{ImportOutput, import, import_with_processor};
}
