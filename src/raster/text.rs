//! Text measurement and drawing for both font kinds.
//!
//! Positions refer to the top-left corner of the text's ink box, so a string
//! measured as `w x h` and drawn at `(x, y)` covers exactly
//! `[x, x + w) x [y, y + h)`. Text is blended over whatever the overlay
//! canvas already holds.

use super::blend_over;
use crate::fonts::FontHandle;
use ab_glyph::{point, Font, FontVec, Glyph, PxScale, ScaleFont};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgba, RgbaImage};

/// Size of a string's ink box in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextMetrics {
    pub width: u32,
    pub height: u32,
}

/// Ink box relative to the layout origin (baseline at `ascent`).
#[derive(Debug, Clone, Copy)]
struct InkBox {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

/// Measure the tight bounding box of `text` rendered with `font`.
///
/// The bitmap fallback reports its fixed cell box: eight pixels per
/// character times the scale, by eight times the scale.
pub fn measure_text(text: &str, font: &FontHandle) -> TextMetrics {
    if text.is_empty() {
        return TextMetrics::default();
    }

    match font {
        FontHandle::Scalable { font, size, .. } => {
            let (_, ink) = layout(font, *size, text);
            TextMetrics {
                width: (ink.max_x.ceil() - ink.min_x.floor()).max(0.0) as u32,
                height: (ink.max_y.ceil() - ink.min_y.floor()).max(0.0) as u32,
            }
        }
        FontHandle::Bitmap { scale } => TextMetrics {
            width: text.chars().count() as u32 * 8 * scale,
            height: 8 * scale,
        },
    }
}

/// Draw `text` with its ink box's top-left corner at `(x, y)`.
pub fn draw_text(
    canvas: &mut RgbaImage,
    x: i64,
    y: i64,
    text: &str,
    font: &FontHandle,
    color: Rgba<u8>,
) {
    if text.is_empty() {
        return;
    }

    match font {
        FontHandle::Scalable { font, size, .. } => {
            draw_scalable(canvas, x, y, text, font, *size, color)
        }
        FontHandle::Bitmap { scale } => draw_bitmap(canvas, x, y, text, *scale, color),
    }
}

/// Lay out glyphs on a baseline at `ascent` and return them with their ink box.
fn layout(font: &FontVec, size: f32, text: &str) -> (Vec<Glyph>, InkBox) {
    let scale = PxScale::from(size);
    let scaled_font = font.as_scaled(scale);
    let baseline = scaled_font.ascent();

    let mut glyphs = Vec::with_capacity(text.len());
    let mut cursor_x = 0.0f32;
    let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);
        if let Some(prev) = prev_glyph {
            cursor_x += scaled_font.kern(prev, glyph_id);
        }
        glyphs.push(glyph_id.with_scale_and_position(scale, point(cursor_x, baseline)));
        cursor_x += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    let mut ink: Option<InkBox> = None;
    for glyph in &glyphs {
        if let Some(outlined) = font.outline_glyph(glyph.clone()) {
            let b = outlined.px_bounds();
            ink = Some(match ink {
                None => InkBox {
                    min_x: b.min.x,
                    min_y: b.min.y,
                    max_x: b.max.x,
                    max_y: b.max.y,
                },
                Some(acc) => InkBox {
                    min_x: acc.min_x.min(b.min.x),
                    min_y: acc.min_y.min(b.min.y),
                    max_x: acc.max_x.max(b.max.x),
                    max_y: acc.max_y.max(b.max.y),
                },
            });
        }
    }

    // Whitespace only: use the advance box
    let ink = ink.unwrap_or(InkBox {
        min_x: 0.0,
        min_y: 0.0,
        max_x: cursor_x,
        max_y: scaled_font.ascent() - scaled_font.descent(),
    });

    (glyphs, ink)
}

fn draw_scalable(
    canvas: &mut RgbaImage,
    x: i64,
    y: i64,
    text: &str,
    font: &FontVec,
    size: f32,
    color: Rgba<u8>,
) {
    let (glyphs, ink) = layout(font, size, text);
    let origin_x = x as f32 - ink.min_x.floor();
    let origin_y = y as f32 - ink.min_y.floor();
    let (canvas_w, canvas_h) = (canvas.width() as i64, canvas.height() as i64);

    for glyph in glyphs {
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        let left = (origin_x + bounds.min.x) as i64;
        let top = (origin_y + bounds.min.y) as i64;

        outlined.draw(|px, py, coverage| {
            let cx = left + px as i64;
            let cy = top + py as i64;
            if cx < 0 || cy < 0 || cx >= canvas_w || cy >= canvas_h {
                return;
            }
            let alpha = (coverage.clamp(0.0, 1.0) * color[3] as f32).round() as u8;
            if alpha == 0 {
                return;
            }
            let ink = Rgba([color[0], color[1], color[2], alpha]);
            let existing = *canvas.get_pixel(cx as u32, cy as u32);
            canvas.put_pixel(cx as u32, cy as u32, blend_over(existing, ink));
        });
    }
}

fn draw_bitmap(canvas: &mut RgbaImage, x: i64, y: i64, text: &str, scale: u32, color: Rgba<u8>) {
    let scale = scale.max(1) as i64;
    let (canvas_w, canvas_h) = (canvas.width() as i64, canvas.height() as i64);

    for (index, ch) in text.chars().enumerate() {
        // Characters outside the basic set render as '?'
        let glyph = BASIC_FONTS
            .get(ch)
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0u8; 8]);
        let cell_x = x + index as i64 * 8 * scale;

        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..8i64 {
                if (*bits >> col) & 1 == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let px = cell_x + col * scale + dx;
                        let py = y + row as i64 * scale + dy;
                        if px < 0 || py < 0 || px >= canvas_w || py >= canvas_h {
                            continue;
                        }
                        let existing = *canvas.get_pixel(px as u32, py as u32);
                        canvas.put_pixel(px as u32, py as u32, blend_over(existing, color));
                    }
                }
            }
        }
    }
}
