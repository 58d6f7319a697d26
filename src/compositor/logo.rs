//! Logo compositing.
//!
//! The logo is resized to a maximum height, anchored at one of six positions
//! and pasted with its own alpha channel as the mask. An optional backing
//! plate is composited in a separate pass first so it always sits under the
//! logo. An optional company caption can be drawn centred below the logo.

use super::position::{calculate_anchor, Anchor, Dimensions, LogoPosition};
use crate::constants::{
    CAPTION_BOLD_EXTRA, CAPTION_FONT_SIZE, CAPTION_GAP, CAPTION_LINE_PADDING,
    CAPTION_NAME_PADDING, DEFAULT_JPEG_QUALITY, DEFAULT_LOGO_MARGIN, DEFAULT_LOGO_MAX_HEIGHT,
    LOGO_PLATE_PADDING,
};
use crate::error::PosterError;
use crate::fonts::{FontHandle, FontResolver, FontWeight};
use crate::raster::{
    self, alpha_composite, draw_rect, draw_text, measure_text, normalize_to_rgba, paste_masked,
    resize_preserving_aspect, JpegEncoder, OutputFormat, PngEncoder, PosterEncoder,
    RasterError, Rect, BLACK, TRANSPARENT,
};
use image::{DynamicImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Plate colour used when a caller asks for a backing plate without a colour.
pub const DEFAULT_LOGO_BACKING: Rgba<u8> = Rgba([255, 255, 255, 180]);

const CAPTION_NAME_PLATE: Rgba<u8> = Rgba([255, 255, 255, 200]);

/// Plate behind the header logo of [`LogoSpec::poster_top`].
pub const POSTER_TOP_BACKING: Rgba<u8> = Rgba([255, 255, 255, 200]);
const CAPTION_LINE_PLATE: Rgba<u8> = Rgba([255, 255, 255, 180]);

/// Company details printed under a logo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl CompanyInfo {
    fn name(&self) -> Option<&str> {
        non_empty(self.name.as_deref())
    }

    /// `Label: value` lines for every populated contact field.
    fn contact_lines(&self) -> Vec<String> {
        [
            ("Phone", &self.phone),
            ("Email", &self.email),
            ("Website", &self.website),
            ("Address", &self.address),
        ]
        .into_iter()
        .filter_map(|(label, value)| non_empty(value.as_deref()).map(|v| format!("{label}: {v}")))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.name().is_none() && self.contact_lines().is_empty()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// How a logo is placed on a poster.
#[derive(Debug, Clone, PartialEq)]
pub struct LogoSpec {
    /// Logos taller than this are scaled down; smaller ones are left as is
    pub max_height: u32,
    pub position: LogoPosition,
    /// Distance from the canvas edges in pixels
    pub margin: u32,
    /// Colour of the plate behind the logo; `None` draws no plate
    pub backing: Option<Rgba<u8>>,
    pub caption: Option<CompanyInfo>,
}

impl Default for LogoSpec {
    fn default() -> Self {
        Self {
            max_height: DEFAULT_LOGO_MAX_HEIGHT,
            position: LogoPosition::TopRight,
            margin: DEFAULT_LOGO_MARGIN,
            backing: None,
            caption: None,
        }
    }
}

impl LogoSpec {
    /// Smaller logo centred 30px below the top edge on a white plate, used for poster headers.
    pub fn poster_top() -> Self {
        Self {
            max_height: 80,
            position: LogoPosition::TopCenter,
            margin: 30,
            backing: Some(POSTER_TOP_BACKING),
            caption: None,
        }
    }

    pub fn with_backing(mut self, color: Rgba<u8>) -> Self {
        self.backing = Some(color);
        self
    }

    pub fn with_caption(mut self, caption: CompanyInfo) -> Self {
        self.caption = Some(caption);
        self
    }
}

/// Composite `logo` onto `base` according to `spec`.
pub fn composite_logo(
    base: &DynamicImage,
    logo: &DynamicImage,
    spec: &LogoSpec,
    fonts: &FontResolver,
) -> Result<RgbaImage, RasterError> {
    let mut canvas = normalize_to_rgba(base);
    let logo = resize_preserving_aspect(&normalize_to_rgba(logo), spec.max_height)?;
    let (width, height) = canvas.dimensions();

    let anchor = calculate_anchor(
        spec.position,
        Dimensions::new(width, height),
        Dimensions::new(logo.width(), logo.height()),
        spec.margin,
    );

    if let Some(color) = spec.backing {
        let pad = LOGO_PLATE_PADDING;
        let mut plate = RgbaImage::from_pixel(width, height, TRANSPARENT);
        draw_rect(
            &mut plate,
            Rect::new(
                anchor.x - pad as i64,
                anchor.y - pad as i64,
                logo.width() + 2 * pad,
                logo.height() + 2 * pad,
            ),
            color,
        );
        canvas = alpha_composite(&canvas, &plate)?;
    }

    paste_masked(&mut canvas, &logo, anchor.x, anchor.y);

    if let Some(info) = spec.caption.as_ref().filter(|info| !info.is_empty()) {
        let caption = render_caption(
            width,
            height,
            info,
            anchor,
            Dimensions::new(logo.width(), logo.height()),
            fonts,
        );
        canvas = alpha_composite(&canvas, &caption)?;
    }

    Ok(canvas)
}

/// Draw the caption block on a transparent canvas of the poster's size.
fn render_caption(
    width: u32,
    height: u32,
    info: &CompanyInfo,
    anchor: Anchor,
    logo: Dimensions,
    fonts: &FontResolver,
) -> RgbaImage {
    let mut overlay = RgbaImage::from_pixel(width, height, TRANSPARENT);
    let center_x = anchor.x + logo.width as i64 / 2;
    let mut top = anchor.y + logo.height as i64 + CAPTION_GAP as i64;

    if let Some(name) = info.name() {
        let bold = fonts.resolve(FontWeight::Bold, (CAPTION_FONT_SIZE + CAPTION_BOLD_EXTRA) as f32);
        top = draw_caption_line(
            &mut overlay,
            name,
            &bold,
            center_x,
            top,
            CAPTION_NAME_PADDING,
            CAPTION_NAME_PLATE,
        );
    }

    let lines = info.contact_lines();
    if !lines.is_empty() {
        let regular = fonts.resolve(FontWeight::Regular, CAPTION_FONT_SIZE as f32);
        for line in &lines {
            top = draw_caption_line(
                &mut overlay,
                line,
                &regular,
                center_x,
                top,
                CAPTION_LINE_PADDING,
                CAPTION_LINE_PLATE,
            );
        }
    }

    overlay
}

/// Draw one plated line whose plate starts at `top`; returns the plate's bottom edge.
fn draw_caption_line(
    overlay: &mut RgbaImage,
    text: &str,
    font: &FontHandle,
    center_x: i64,
    top: i64,
    padding: u32,
    plate: Rgba<u8>,
) -> i64 {
    let metrics = measure_text(text, font);
    let pad = padding as i64;
    let x = center_x - metrics.width as i64 / 2;
    let y = top + pad;

    draw_rect(
        overlay,
        Rect::new(x - pad, top, metrics.width + 2 * padding, metrics.height + 2 * padding),
        plate,
    );
    draw_text(overlay, x, y, text, font, BLACK);

    y + metrics.height as i64 + pad
}

/// Load `poster` and `logo`, composite them and write the result to `output`.
///
/// Both inputs are loaded before anything is written, so a missing or corrupt
/// file leaves `output` untouched. The output format follows the output
/// extension: `.png` is written losslessly, everything else as JPEG.
pub fn add_logo_to_poster(
    poster: &Path,
    logo: &Path,
    output: &Path,
    spec: &LogoSpec,
    fonts: &FontResolver,
) -> Result<PathBuf, PosterError> {
    let base = raster::load(poster)?;
    let logo_image = raster::load(logo)?;

    let composited = composite_logo(&base, &logo_image, spec, fonts)
        .map_err(|e| PosterError::invalid_image(logo, e.to_string()))?;

    let is_png = output
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(OutputFormat::Png.extension()));
    let encoded = if is_png {
        PngEncoder.encode(&composited)
    } else {
        JpegEncoder::new(DEFAULT_JPEG_QUALITY).encode(&composited)
    }
    .map_err(|e| PosterError::encoding(output, e.to_string()))?;

    raster::write_atomic(output, &encoded.data).map_err(|e| PosterError::io(output, e))?;

    tracing::info!(
        poster = %poster.display(),
        logo = %logo.display(),
        output = %output.display(),
        position = %spec.position,
        "Logo added to poster"
    );

    Ok(output.to_path_buf())
}
