//! Watermark stage.
//!
//! Accounts with unlimited access get a verbatim copy of the source. Everyone
//! else gets a fixed string drawn bottom-right on a translucent plate.
//!
//! Saving walks an ordered list of steps: each configured encoder in turn,
//! then a verbatim copy of the source. The first step that succeeds decides
//! the [`WatermarkKind`]; failures of earlier steps are kept in the outcome.

use crate::constants::{
    DEFAULT_JPEG_QUALITY, DEFAULT_WATERMARK_TEXT, WATERMARK_MAX_FONT_SIZE, WATERMARK_MAX_MARGIN,
    WATERMARK_MIN_FONT_SIZE, WATERMARK_MIN_MARGIN,
};
use crate::error::PosterError;
use crate::fonts::{FontResolver, FontWeight};
use crate::raster::{
    self, alpha_composite, draw_rect, draw_text, measure_text, normalize_to_rgba,
    JpegEncoder, PngEncoder, PosterEncoder, Rect, TRANSPARENT,
};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

const PLATE_COLOR: Rgba<u8> = Rgba([0, 0, 0, 128]);
const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 200]);

/// Watermark settings (YAML `watermark:` section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatermarkOptions {
    #[serde(default = "default_text")]
    pub text: String,

    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            text: default_text(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

fn default_text() -> String {
    DEFAULT_WATERMARK_TEXT.to_string()
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

/// Which step produced the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkKind {
    /// Unlimited access: verbatim copy, no watermark requested
    Unwatermarked,
    /// Watermarked and saved with the lossy encoder
    Lossy,
    /// Watermarked and saved with the lossless encoder at an adjusted path
    Lossless,
    /// Watermarking failed; the output is a verbatim copy of the source
    SourceCopy,
}

impl WatermarkKind {
    pub fn is_watermarked(&self) -> bool {
        matches!(self, WatermarkKind::Lossy | WatermarkKind::Lossless)
    }

    /// Whether a watermark was wanted but the output carries none.
    pub fn is_skipped(&self) -> bool {
        matches!(self, WatermarkKind::SourceCopy)
    }
}

impl fmt::Display for WatermarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WatermarkKind::Unwatermarked => "unwatermarked",
            WatermarkKind::Lossy => "lossy",
            WatermarkKind::Lossless => "lossless",
            WatermarkKind::SourceCopy => "source-copy",
        };
        f.write_str(name)
    }
}

/// A save step that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub step: String,
    pub message: String,
}

#[derive(Debug)]
pub struct WatermarkOutcome {
    /// Path actually written; differs from the requested path after the lossless fallback
    pub path: PathBuf,
    pub kind: WatermarkKind,
    pub failures: Vec<StepFailure>,
}

enum SaveStep<'a> {
    Encode {
        encoder: &'a dyn PosterEncoder,
        image: &'a RgbaImage,
        path: PathBuf,
    },
    CopySource {
        path: PathBuf,
    },
}

impl SaveStep<'_> {
    fn name(&self) -> String {
        match self {
            SaveStep::Encode { encoder, .. } => format!("encode-{}", encoder.format().extension()),
            SaveStep::CopySource { .. } => "copy-source".to_string(),
        }
    }

    fn run(&self, source: &Path) -> Result<(PathBuf, WatermarkKind), String> {
        match self {
            SaveStep::Encode {
                encoder,
                image,
                path,
            } => {
                let encoded = encoder.encode(image).map_err(|e| e.to_string())?;
                raster::write_atomic(path, &encoded.data)
                    .map_err(|e| format!("{}: {}", path.display(), e))?;
                let kind = if encoded.format.is_lossy() {
                    WatermarkKind::Lossy
                } else {
                    WatermarkKind::Lossless
                };
                Ok((path.clone(), kind))
            }
            SaveStep::CopySource { path } => {
                raster::copy_verbatim(source, path)
                    .map_err(|e| format!("{}: {}", path.display(), e))?;
                Ok((path.clone(), WatermarkKind::SourceCopy))
            }
        }
    }
}

/// Applies the watermark and runs the save ladder.
pub struct WatermarkCompositor {
    options: WatermarkOptions,
    encoders: Vec<Box<dyn PosterEncoder>>,
}

impl WatermarkCompositor {
    /// JPEG at the configured quality, then PNG.
    pub fn new(options: WatermarkOptions) -> Self {
        let encoders: Vec<Box<dyn PosterEncoder>> = vec![
            Box::new(JpegEncoder::new(options.jpeg_quality)),
            Box::new(PngEncoder),
        ];
        Self { options, encoders }
    }

    /// Replace the encoder list. Order is the fallback order.
    pub fn with_encoders(mut self, encoders: Vec<Box<dyn PosterEncoder>>) -> Self {
        self.encoders = encoders;
        self
    }

    /// Watermark `source` into `destination`, or copy it when `unlimited_access` is set.
    ///
    /// Fails only when `source` does not exist, or when every step, the
    /// verbatim copy included, failed.
    pub fn apply(
        &self,
        source: &Path,
        destination: &Path,
        unlimited_access: bool,
        fonts: &FontResolver,
    ) -> Result<WatermarkOutcome, PosterError> {
        if !source.exists() {
            return Err(PosterError::not_found(source));
        }

        if unlimited_access {
            raster::copy_verbatim(source, destination)
                .map_err(|e| PosterError::encoding(destination, e.to_string()))?;
            tracing::info!(
                source = %source.display(),
                destination = %destination.display(),
                "Unlimited access, poster copied without watermark"
            );
            return Ok(WatermarkOutcome {
                path: destination.to_path_buf(),
                kind: WatermarkKind::Unwatermarked,
                failures: Vec::new(),
            });
        }

        let mut failures = Vec::new();
        let rendered = match render_watermark(source, &self.options.text, fonts) {
            Ok(image) => Some(image),
            Err(message) => {
                tracing::warn!(source = %source.display(), error = %message, "Watermark rendering failed");
                failures.push(StepFailure {
                    step: "render".to_string(),
                    message,
                });
                None
            }
        };

        let mut steps = Vec::with_capacity(self.encoders.len() + 1);
        if let Some(image) = &rendered {
            for encoder in &self.encoders {
                let format = encoder.format();
                let path = if format.is_lossy() {
                    destination.to_path_buf()
                } else {
                    format.adjust_path(destination)
                };
                steps.push(SaveStep::Encode {
                    encoder: encoder.as_ref(),
                    image,
                    path,
                });
            }
        }
        steps.push(SaveStep::CopySource {
            path: destination.to_path_buf(),
        });

        let result = steps.iter().try_fold(failures, |mut failures, step| {
            match step.run(source) {
                Ok((path, kind)) => ControlFlow::Break((path, kind, failures)),
                Err(message) => {
                    tracing::warn!(step = %step.name(), error = %message, "Save step failed, trying next");
                    failures.push(StepFailure {
                        step: step.name(),
                        message,
                    });
                    ControlFlow::Continue(failures)
                }
            }
        });

        match result {
            ControlFlow::Break((path, kind, failures)) => {
                if kind.is_skipped() {
                    tracing::warn!(path = %path.display(), "Watermark skipped, source copied verbatim");
                } else {
                    tracing::info!(path = %path.display(), kind = %kind, "Watermark applied");
                }
                Ok(WatermarkOutcome {
                    path,
                    kind,
                    failures,
                })
            }
            ControlFlow::Continue(failures) => {
                let message = failures
                    .iter()
                    .map(|f| format!("{}: {}", f.step, f.message))
                    .collect::<Vec<_>>()
                    .join("; ");
                tracing::error!(destination = %destination.display(), error = %message, "No output could be written");
                Err(PosterError::encoding(destination, message))
            }
        }
    }
}

/// Font size for a canvas `width` pixels wide: `width / 40` within 12..=20.
pub fn watermark_font_size(width: u32) -> u32 {
    (width / 40).clamp(WATERMARK_MIN_FONT_SIZE, WATERMARK_MAX_FONT_SIZE)
}

/// Distance from the right and bottom edges: `width / 100` within 10..=20.
pub fn watermark_margin(width: u32) -> u32 {
    (width / 100).clamp(WATERMARK_MIN_MARGIN, WATERMARK_MAX_MARGIN)
}

fn render_watermark(source: &Path, text: &str, fonts: &FontResolver) -> Result<RgbaImage, String> {
    let image = raster::load(source).map_err(|e| e.to_string())?;
    let base = normalize_to_rgba(&image);
    let (width, height) = base.dimensions();

    let font = fonts.resolve(FontWeight::Bold, watermark_font_size(width) as f32);
    let metrics = measure_text(text, &font);
    let margin = watermark_margin(width) as i64;
    let padding = (font.pixel_size() as u32 / 4).max(5);

    // Text wider than the canvas starts at the left edge so its beginning stays visible
    let x = (width as i64 - metrics.width as i64 - margin).max(0);
    let y = (height as i64 - metrics.height as i64 - margin).max(0);

    let mut overlay = RgbaImage::from_pixel(width, height, TRANSPARENT);
    draw_rect(
        &mut overlay,
        Rect::new(
            x - padding as i64,
            y - padding as i64,
            metrics.width + 2 * padding,
            metrics.height + 2 * padding,
        ),
        PLATE_COLOR,
    );
    draw_text(&mut overlay, x, y, text, &font, TEXT_COLOR);

    alpha_composite(&base, &overlay).map_err(|e| e.to_string())
}
