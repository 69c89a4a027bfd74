use crate::compositing::blit_rgba;
use crate::config::ImportConfig;
use crate::error::{MosaicError, Result};
use crate::model::{IVec2, Rect};
use crate::packer::{Packer, maxrects::MaxRectsPacker};
use image::RgbaImage;
use tracing::debug;

/// One packed layer raster.
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    /// Placed content rect in page space.
    pub rect: Rect,
    /// Maps page texels back to canvas texels:
    /// `canvas = page + uv_transform` inside the placed rect.
    pub uv_transform: IVec2,
}

/// A packed page plus per-input placements (aligned with the input order,
/// regardless of packing order).
pub struct MosaicPage {
    pub width: u32,
    pub height: u32,
    pub image: RgbaImage,
    pub placements: Vec<Placement>,
}

/// Tight bounding rect of pixels with alpha > 0, in raster space.
///
/// A fully transparent raster yields a unit rect at the origin, so the layer
/// still packs and its sprite record stays alive. Rasters must be non-empty;
/// the import pipeline guarantees this by validating canvas dimensions.
pub fn compute_tight_rect(rgba: &RgbaImage) -> Rect {
    let (w, h) = rgba.dimensions();
    let mut x1 = 0;
    let mut y1 = 0;
    let mut x2 = w.saturating_sub(1);
    let mut y2 = h.saturating_sub(1);
    // left
    while x1 < w {
        let mut all_transparent = true;
        for y in 0..h {
            if rgba.get_pixel(x1, y)[3] > 0 {
                all_transparent = false;
                break;
            }
        }
        if all_transparent {
            x1 += 1;
        } else {
            break;
        }
    }
    if x1 >= w {
        return Rect::new(0, 0, 1, 1);
    }
    // right
    while x2 > x1 {
        let mut all_transparent = true;
        for y in 0..h {
            if rgba.get_pixel(x2, y)[3] > 0 {
                all_transparent = false;
                break;
            }
        }
        if all_transparent {
            x2 -= 1;
        } else {
            break;
        }
    }
    // top
    while y1 < h {
        let mut all_transparent = true;
        for x in x1..=x2 {
            if rgba.get_pixel(x, y1)[3] > 0 {
                all_transparent = false;
                break;
            }
        }
        if all_transparent {
            y1 += 1;
        } else {
            break;
        }
    }
    // bottom
    while y2 > y1 {
        let mut all_transparent = true;
        for x in x1..=x2 {
            if rgba.get_pixel(x, y2)[3] > 0 {
                all_transparent = false;
                break;
            }
        }
        if all_transparent {
            y2 -= 1;
        } else {
            break;
        }
    }
    Rect::new(x1, y1, x2 - x1 + 1, y2 - y1 + 1)
}

fn next_pow2(mut v: u32) -> u32 {
    if v <= 1 {
        return 1;
    }
    v -= 1;
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v + 1
}

/// Packs layer rasters into a single page, trimming each to its tight rect.
///
/// Placement is deterministic: rects are placed largest trimmed area first
/// (input order breaks ties), and the page starts at the power-of-two bound of
/// the largest rect, growing its smaller extent to the next power of two (and
/// restarting placement) until everything fits. Extents are capped by
/// `max_atlas_size`; running out of room there fails the whole pass.
pub fn pack_layer_images(images: &[&RgbaImage], cfg: &ImportConfig) -> Result<MosaicPage> {
    cfg.validate()?;

    if images.is_empty() {
        return Err(MosaicError::EmptyDocument);
    }

    let tights: Vec<Rect> = images.iter().map(|img| compute_tight_rect(img)).collect();

    // stable largest-area-first placement order
    let mut order: Vec<usize> = (0..tights.len()).collect();
    order.sort_by(|a, b| tights[*b].area().cmp(&tights[*a].area()).then(a.cmp(b)));

    let max = cfg.max_atlas_size;
    let largest = tights[order[0]];
    let mut page_w = next_pow2(largest.w).min(max);
    let mut page_h = next_pow2(largest.h).min(max);

    let placed = loop {
        match try_pack_all(&tights, &order, page_w, page_h, cfg) {
            Ok(placed) => break placed,
            Err(placed_count) => {
                if page_w >= max && page_h >= max {
                    return Err(MosaicError::AtlasOverflow {
                        max_width: max,
                        max_height: max,
                        placed: placed_count,
                        total: tights.len(),
                    });
                }
                // grow the smaller extent, restart placement from scratch
                if page_w <= page_h && page_w < max {
                    page_w = next_pow2(page_w + 1).min(max);
                } else {
                    page_h = next_pow2(page_h + 1).min(max);
                }
                debug!(page_w, page_h, "page too small, growing");
            }
        }
    };

    let mut canvas = RgbaImage::new(page_w, page_h);
    let mut placements = Vec::with_capacity(images.len());
    for (i, img) in images.iter().enumerate() {
        let tight = tights[i];
        let rect = placed[i];
        blit_rgba(
            img,
            &mut canvas,
            rect.x,
            rect.y,
            tight.x,
            tight.y,
            tight.w,
            tight.h,
        );
        placements.push(Placement {
            rect,
            uv_transform: IVec2::new(
                tight.x as i32 - rect.x as i32,
                tight.y as i32 - rect.y as i32,
            ),
        });
    }

    Ok(MosaicPage {
        width: page_w,
        height: page_h,
        image: canvas,
        placements,
    })
}

/// All-or-nothing placement attempt; `Err` carries how many rects fit before
/// the page ran out of room.
fn try_pack_all(
    tights: &[Rect],
    order: &[usize],
    page_w: u32,
    page_h: u32,
    cfg: &ImportConfig,
) -> std::result::Result<Vec<Rect>, usize> {
    let mut packer = MaxRectsPacker::new(page_w, page_h, cfg.padding, cfg.heuristic);
    let mut placed = vec![Rect::new(0, 0, 0, 0); tights.len()];
    for (n, &i) in order.iter().enumerate() {
        match packer.pack(&tights[i]) {
            Some(rect) => placed[i] = rect,
            None => return Err(n),
        }
    }
    Ok(placed)
}
