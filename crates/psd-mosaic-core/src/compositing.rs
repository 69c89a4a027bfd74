use crate::document::BlendMode;
use crate::extract::ExtractedLayer;
use image::{Rgba, RgbaImage};
use tracing::warn;

/// Blit a sub-rectangle from `src` into `canvas` at destination (dx, dy).
///
/// - (sx, sy, sw, sh): source rectangle within `src`
/// - (dx, dy): destination top-left in `canvas`
///
/// Pixels are copied, not blended; out-of-bounds destination texels are
/// dropped.
pub fn blit_rgba(
    src: &RgbaImage,
    canvas: &mut RgbaImage,
    dx: u32,
    dy: u32,
    sx: u32,
    sy: u32,
    sw: u32,
    sh: u32,
) {
    let (cw, ch) = canvas.dimensions();
    for yy in 0..sh {
        for xx in 0..sw {
            if dx + xx < cw && dy + yy < ch {
                let px = *src.get_pixel(sx + xx, sy + yy);
                canvas.put_pixel(dx + xx, dy + yy, px);
            }
        }
    }
}

/// Per-channel transfer for one blend mode, on normalized [0, 1] values.
///
/// `Xor` is absent here: it operates bitwise on the raw bytes and is handled
/// by `compose_pixel` directly.
fn blend_channel(mode: BlendMode, d: f32, s: f32) -> f32 {
    match mode {
        BlendMode::Normal => s,
        BlendMode::Multiply => d * s,
        BlendMode::Additive => (d + s).min(1.0),
        BlendMode::ColorBurn => {
            if s <= 0.0 {
                0.0
            } else {
                (1.0 - (1.0 - d) / s).max(0.0)
            }
        }
        BlendMode::ColorDodge => {
            if s >= 1.0 {
                1.0
            } else {
                (d / (1.0 - s)).min(1.0)
            }
        }
        BlendMode::Reflect => {
            if s >= 1.0 {
                1.0
            } else {
                (d * d / (1.0 - s)).min(1.0)
            }
        }
        BlendMode::Glow => {
            if d >= 1.0 {
                1.0
            } else {
                (s * s / (1.0 - d)).min(1.0)
            }
        }
        BlendMode::Overlay => {
            if d < 0.5 {
                2.0 * d * s
            } else {
                1.0 - 2.0 * (1.0 - d) * (1.0 - s)
            }
        }
        BlendMode::Difference => (d - s).abs(),
        BlendMode::Negation => 1.0 - (1.0 - d - s).abs(),
        BlendMode::Lighten => d.max(s),
        BlendMode::Darken => d.min(s),
        BlendMode::Screen => d + s - d * s,
        BlendMode::Xor => s,
    }
}

/// Composites one source pixel over one destination pixel.
///
/// Coverage is `t = (opacity/255) * (src_alpha/255)`; the blended color is
/// `B(dst, src) * t + dst * (1 - t)` per channel and the output alpha is
/// `t + dst_alpha * (1 - t)` (straight alpha).
pub fn compose_pixel(mode: BlendMode, dst: Rgba<u8>, src: Rgba<u8>, opacity: u8) -> Rgba<u8> {
    let t = (opacity as f32 / 255.0) * (src.0[3] as f32 / 255.0);
    if t <= 0.0 {
        return dst;
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let d = dst.0[c] as f32 / 255.0;
        let b = if mode == BlendMode::Xor {
            (dst.0[c] ^ src.0[c]) as f32 / 255.0
        } else {
            let s = src.0[c] as f32 / 255.0;
            blend_channel(mode, d, s).clamp(0.0, 1.0)
        };
        out[c] = ((b * t + d * (1.0 - t)) * 255.0).round() as u8;
    }
    let da = dst.0[3] as f32 / 255.0;
    out[3] = ((t + da * (1.0 - t)) * 255.0).round() as u8;
    Rgba(out)
}

/// Composites the extracted layers into one canvas-sized image.
///
/// The record list is in paint order (index 0 topmost), so compositing walks it
/// in reverse, bottom-most layer first. Hidden layers are skipped unless
/// `include_hidden` overrides their visibility. Group records contribute
/// nothing themselves; rasters that do not match the canvas are skipped,
/// non-fatally.
pub fn flatten(
    layers: &[ExtractedLayer],
    include_hidden: bool,
    width: u32,
    height: u32,
) -> RgbaImage {
    let mut canvas = RgbaImage::new(width, height);
    for layer in layers.iter().rev() {
        if layer.is_group || layer.opacity == 0 {
            continue;
        }
        if !layer.visible && !include_hidden {
            continue;
        }
        let Some(px) = layer.pixels.as_ref() else {
            continue;
        };
        if px.dimensions() != (width, height) {
            warn!(
                layer = %layer.name,
                raster_w = px.width(),
                raster_h = px.height(),
                "layer raster does not match the canvas, skipping"
            );
            continue;
        }
        for y in 0..height {
            for x in 0..width {
                let d = *canvas.get_pixel(x, y);
                let s = *px.get_pixel(x, y);
                canvas.put_pixel(x, y, compose_pixel(layer.blend_mode, d, s, layer.opacity));
            }
        }
    }
    canvas
}
