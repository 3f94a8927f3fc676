//! Rasterisation of styled symbols
//!
//! Styling is applied only here: the module matrix is read, never changed.
//! Finder patterns ("eyes") are drawn as whole shapes so they can be colored and
//! shaped independently of the data modules.

/// Module and finder shape coverage
pub mod shapes;

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageError, RgbaImage};
use rayon::prelude::*;
use tracing::trace;

use crate::config::{MAX_EXPORT_SCALE, MIN_EXPORT_SCALE};
use crate::models::{Color, QrStyle, QrSymbol};
use shapes::{EyePart, eye_part, module_covers};

/// Side length of a finder pattern in modules
const FINDER_SIZE: usize = 7;

/// Largest pixels-per-module a style can ask for
pub const MAX_MODULE_SCALE: u32 = 128;
/// Widest quiet zone, in modules, a style can ask for
pub const MAX_QUIET_ZONE: u32 = 32;

/// Independently colorable parts of a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Quiet zone and light modules
    Background,
    /// Outer ring of a finder pattern
    EyeOuter,
    /// 3x3 center of a finder pattern
    EyePupil,
    /// Everything else
    Data,
}

impl Region {
    /// Fill color for dark modules of this region
    pub fn color(self, style: &QrStyle) -> Color {
        match self {
            Region::Background => style.background_color,
            Region::EyeOuter => style.eye_color,
            Region::EyePupil => style.pupil_color,
            Region::Data => style.foreground_color,
        }
    }
}

/// Region a dark module at `(x, y)` belongs to in a `size`-module symbol
pub fn region_at(size: usize, x: usize, y: usize) -> Region {
    match finder_origin(size, x, y) {
        Some((ox, oy)) => {
            let (dx, dy) = (x - ox, y - oy);
            if (2..=4).contains(&dx) && (2..=4).contains(&dy) {
                Region::EyePupil
            } else {
                Region::EyeOuter
            }
        }
        None => Region::Data,
    }
}

/// Top-left corner of the finder pattern containing `(x, y)`, if any
fn finder_origin(size: usize, x: usize, y: usize) -> Option<(usize, usize)> {
    let far = size.checked_sub(FINDER_SIZE)?;
    let near_x = x < FINDER_SIZE;
    let near_y = y < FINDER_SIZE;
    let far_x = x >= far;
    let far_y = y >= far;
    if near_x && near_y {
        Some((0, 0))
    } else if far_x && near_y {
        Some((far, 0))
    } else if near_x && far_y {
        Some((0, far))
    } else {
        None
    }
}

/// Consumer of a raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// On-screen preview at the style's own scale
    Preview,
    /// Saved image; scale clamped to 10-15 pixels per module
    Export,
    /// Print cell, drawn at the style's scale and resized by the renderer
    Print,
}

impl Surface {
    /// Pixels per module for this surface
    pub fn scale(self, style: &QrStyle, export_scale: u32) -> u32 {
        match self {
            Surface::Preview | Surface::Print => style.scale.clamp(1, MAX_MODULE_SCALE),
            Surface::Export => export_scale.clamp(MIN_EXPORT_SCALE, MAX_EXPORT_SCALE),
        }
    }
}

/// Quiet zone width actually drawn, capped at [`MAX_QUIET_ZONE`]
pub fn quiet_zone(style: &QrStyle) -> u32 {
    style.quiet_zone.min(MAX_QUIET_ZONE)
}

/// Side length in modules, quiet zone included
pub fn side_modules(symbol: &QrSymbol) -> u32 {
    symbol.size() as u32 + 2 * quiet_zone(&symbol.style)
}

/// Pixel side length of a symbol rasterised at `scale`.
///
/// `scale` is clamped to `1..=MAX_MODULE_SCALE`, so the result always fits a `u32`.
pub fn raster_side(symbol: &QrSymbol, scale: u32) -> u32 {
    side_modules(symbol) * scale.clamp(1, MAX_MODULE_SCALE)
}

/// Render `symbol` with its style at `scale` pixels per module
pub fn rasterize(symbol: &QrSymbol, scale: u32) -> RgbaImage {
    let scale = scale.clamp(1, MAX_MODULE_SCALE);
    let side = raster_side(symbol, scale);
    let style = &symbol.style;
    let size = symbol.size();
    let quiet = quiet_zone(style) as usize;
    let background = Region::Background.color(style).to_rgba();

    let mut img = RgbaImage::new(side, side);
    let row_len = side as usize * 4;
    img.par_chunks_mut(row_len).enumerate().for_each(|(py, row)| {
        for (px, pixel) in row.chunks_exact_mut(4).enumerate() {
            let color = pixel_color(symbol, size, quiet, scale, px, py).unwrap_or(background);
            pixel.copy_from_slice(&color);
        }
    });

    trace!(side, scale, "rasterized symbol");
    img
}

/// Color of one raster pixel, or `None` for background
fn pixel_color(
    symbol: &QrSymbol,
    size: usize,
    quiet: usize,
    scale: u32,
    px: usize,
    py: usize,
) -> Option<[u8; 4]> {
    let scale = scale as usize;
    let (mx, my) = ((px / scale).checked_sub(quiet)?, (py / scale).checked_sub(quiet)?);
    if mx >= size || my >= size {
        return None;
    }
    let style = &symbol.style;

    if let Some((ox, oy)) = finder_origin(size, mx, my) {
        // Finder patterns are drawn from geometry, not from individual modules
        let u = ((px - (ox + quiet) * scale) as f32 + 0.5) / scale as f32;
        let v = ((py - (oy + quiet) * scale) as f32 + 0.5) / scale as f32;
        return match eye_part(style.eye_shape, u, v) {
            EyePart::Ring => Some(Region::EyeOuter.color(style).to_rgba()),
            EyePart::Pupil => Some(Region::EyePupil.color(style).to_rgba()),
            EyePart::Gap => None,
        };
    }

    if !symbol.is_dark(mx, my) {
        return None;
    }
    let u = ((px % scale) as f32 + 0.5) / scale as f32;
    let v = ((py % scale) as f32 + 0.5) / scale as f32;
    module_covers(style.pixel_shape, u, v).then(|| Region::Data.color(style).to_rgba())
}

/// PNG-encode a raster
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, ImageError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(img.as_raw(), img.width(), img.height(), ColorType::Rgba8)?;
    Ok(buf)
}

/// Byte size of the symbol's PNG export at `export_scale`
pub fn rendered_size(symbol: &QrSymbol, export_scale: u32) -> Result<usize, ImageError> {
    let scale = Surface::Export.scale(&symbol.style, export_scale);
    Ok(encode_png(&rasterize(symbol, scale))?.len())
}
