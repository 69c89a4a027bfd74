use crate::model::Rect;

pub mod maxrects;

/// A packer places rectangles into a fixed-extent page.
///
/// Implementations must ensure no overlaps and respect the configured padding.
/// `pack` takes the content size and returns the placed content rect, or
/// `None` if the rectangle cannot be placed on the current page. Rotation is
/// never allowed: a rotated placement could not be described by the
/// translation-only uv transform sprite records carry.
pub trait Packer {
    fn can_pack(&self, rect: &Rect) -> bool;
    fn pack(&mut self, rect: &Rect) -> Option<Rect>;
}
