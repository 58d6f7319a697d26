//! Raster primitives shared by every compositor.
//!
//! Compositing always happens on 4-channel RGBA buffers: overlays are drawn
//! onto a transparent canvas of the same size as the base and blended with
//! the Porter-Duff "over" operator in a single pass. Images are flattened to
//! opaque RGB only when they are encoded.
//!
//! File writes go through [`write_atomic`], so a destination path either keeps
//! its previous content or holds the complete new file.

pub mod color;
pub mod encoder;
pub mod error;
pub mod text;

pub use color::{parse_hex_color, rgba, BLACK, TRANSPARENT, WHITE};
pub use encoder::{EncodedImage, JpegEncoder, OutputFormat, PngEncoder, PosterEncoder};
pub use error::RasterError;
pub use text::{draw_text, measure_text, TextMetrics};

use crate::error::PosterError;
use fast_image_resize::{FilterType, Image, MulDiv, PixelType, ResizeAlg, Resizer};
use image::io::Reader as ImageReader;
use image::{DynamicImage, Rgba, RgbImage, RgbaImage};
use std::fs;
use std::io::{Cursor, Write};
use std::num::NonZeroU32;
use std::path::Path;

/// Axis-aligned rectangle in canvas coordinates. May extend past the canvas;
/// drawing clips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i64 {
        self.x + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y + self.height as i64
    }
}

/// Load and decode an image file.
///
/// Fails with `InputError::NotFound` when the path does not exist and
/// `InputError::InvalidImage` when it cannot be decoded or has a zero side.
pub fn load(path: &Path) -> Result<DynamicImage, PosterError> {
    if !path.exists() {
        return Err(PosterError::not_found(path));
    }

    let img = ImageReader::open(path)
        .map_err(|e| PosterError::invalid_image(path, e.to_string()))?
        .with_guessed_format()
        .map_err(|e| PosterError::invalid_image(path, e.to_string()))?
        .decode()
        .map_err(|e| PosterError::invalid_image(path, e.to_string()))?;

    ensure_non_empty(&img).map_err(|e| PosterError::invalid_image(path, e.to_string()))?;
    Ok(img)
}

/// Decode in-memory image bytes, guessing the format from magic bytes.
pub fn decode_bytes(data: &[u8]) -> Result<DynamicImage, RasterError> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| RasterError::decode_failed(e.to_string()))?
        .decode()
        .map_err(|e| RasterError::decode_failed(e.to_string()))?;

    ensure_non_empty(&img)?;
    Ok(img)
}

fn ensure_non_empty(img: &DynamicImage) -> Result<(), RasterError> {
    if img.width() == 0 || img.height() == 0 {
        return Err(RasterError::EmptyImage {
            width: img.width(),
            height: img.height(),
        });
    }
    Ok(())
}

/// Convert any colour mode to RGBA8. Idempotent.
pub fn normalize_to_rgba(img: &DynamicImage) -> RgbaImage {
    match img {
        DynamicImage::ImageRgba8(rgba) => rgba.clone(),
        other => other.to_rgba8(),
    }
}

/// Drop the alpha channel before encoding to a format without transparency.
pub fn flatten_to_rgb(img: &RgbaImage) -> RgbImage {
    DynamicImage::ImageRgba8(img.clone()).to_rgb8()
}

/// Dimensions after scaling `(width, height)` down to at most `max_height`.
///
/// Never upscales. The width is scaled by the same factor and rounded down,
/// but never below one pixel.
pub fn scaled_size(width: u32, height: u32, max_height: u32) -> (u32, u32) {
    if height <= max_height || height == 0 {
        return (width, height);
    }
    let new_width = (width as u64 * max_height as u64 / height as u64) as u32;
    (new_width.max(1), max_height.max(1))
}

/// Resize preserving aspect ratio so the height does not exceed `max_height`.
///
/// Uses a Lanczos3 convolution on premultiplied alpha, so transparent logo
/// edges do not pick up dark fringes.
pub fn resize_preserving_aspect(
    img: &RgbaImage,
    max_height: u32,
) -> Result<RgbaImage, RasterError> {
    if max_height == 0 {
        return Err(RasterError::resize_failed("Maximum height must be positive"));
    }

    let (src_w, src_h) = img.dimensions();
    let (dst_w, dst_h) = scaled_size(src_w, src_h, max_height);
    if (dst_w, dst_h) == (src_w, src_h) {
        return Ok(img.clone());
    }

    let src_width =
        NonZeroU32::new(src_w).ok_or_else(|| RasterError::resize_failed("Source width is 0"))?;
    let src_height =
        NonZeroU32::new(src_h).ok_or_else(|| RasterError::resize_failed("Source height is 0"))?;
    let dst_width =
        NonZeroU32::new(dst_w).ok_or_else(|| RasterError::resize_failed("Target width is 0"))?;
    let dst_height =
        NonZeroU32::new(dst_h).ok_or_else(|| RasterError::resize_failed("Target height is 0"))?;

    let mut src_image =
        Image::from_vec_u8(src_width, src_height, img.as_raw().clone(), PixelType::U8x4)
            .map_err(|e| {
                RasterError::resize_failed(format!("Failed to create source image: {:?}", e))
            })?;

    let alpha_mul_div = MulDiv::default();
    alpha_mul_div
        .multiply_alpha_inplace(&mut src_image.view_mut())
        .map_err(|e| RasterError::resize_failed(format!("Premultiply failed: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);
    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| RasterError::resize_failed(format!("Resize operation failed: {:?}", e)))?;

    alpha_mul_div
        .divide_alpha_inplace(&mut dst_image.view_mut())
        .map_err(|e| RasterError::resize_failed(format!("Unpremultiply failed: {:?}", e)))?;

    RgbaImage::from_raw(dst_w, dst_h, dst_image.into_vec())
        .ok_or_else(|| RasterError::resize_failed("Failed to create output image buffer"))
}

/// Fill a rectangle on an overlay canvas, replacing the pixels it covers.
pub fn draw_rect(canvas: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    let x0 = rect.x.max(0);
    let y0 = rect.y.max(0);
    let x1 = rect.right().min(canvas.width() as i64);
    let y1 = rect.bottom().min(canvas.height() as i64);

    for y in y0..y1 {
        for x in x0..x1 {
            canvas.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// Porter-Duff "over": `overlay` on top of `base`. Both must be the same size.
pub fn alpha_composite(base: &RgbaImage, overlay: &RgbaImage) -> Result<RgbaImage, RasterError> {
    if base.dimensions() != overlay.dimensions() {
        return Err(RasterError::DimensionMismatch {
            base: base.dimensions(),
            overlay: overlay.dimensions(),
        });
    }

    let mut out = base.clone();
    for (dst, src) in out.pixels_mut().zip(overlay.pixels()) {
        *dst = blend_over(*dst, *src);
    }
    Ok(out)
}

/// Paste `image` at `(x, y)` using its own alpha channel as the mask.
///
/// Each pasted pixel is blended over the canvas with the "over" operator, so
/// a partly transparent logo on an opaque canvas leaves the canvas opaque.
/// Parts outside the canvas are clipped.
pub fn paste_masked(canvas: &mut RgbaImage, image: &RgbaImage, x: i64, y: i64) {
    let x_start = x.max(0);
    let y_start = y.max(0);
    let x_end = (x + image.width() as i64).min(canvas.width() as i64);
    let y_end = (y + image.height() as i64).min(canvas.height() as i64);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let src = *image.get_pixel((tx - x) as u32, (ty - y) as u32);
            let dst = canvas.get_pixel_mut(tx as u32, ty as u32);
            *dst = blend_over(*dst, src);
        }
    }
}

/// Blend one pixel over another (straight alpha).
pub(crate) fn blend_over(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    match foreground[3] {
        0 => return background,
        255 => return foreground,
        _ => {}
    }

    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return TRANSPARENT;
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let result = (fg as f32 * fg_alpha + bg as f32 * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        result.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}

/// Write `bytes` to `path` through a sibling temporary file and a rename.
///
/// Creates the parent directory if needed. On failure the destination is
/// left untouched and the temporary file is removed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Byte-for-byte copy with the same atomicity as [`write_atomic`].
pub fn copy_verbatim(source: &Path, destination: &Path) -> std::io::Result<()> {
    let bytes = fs::read(source)?;
    write_atomic(destination, &bytes)
}
