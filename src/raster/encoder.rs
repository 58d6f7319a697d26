//! Image encoder abstraction
//!
//! Encoders turn a composited RGBA buffer into file bytes. The watermark
//! stage walks an ordered list of encoders (lossy first, then lossless), so
//! each encoder is an object-safe trait implementation that can be swapped
//! out in tests.

use super::{flatten_to_rgb, RasterError};
use image::{ColorType, ImageEncoder as _, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Output container formats produced by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    pub fn is_lossy(&self) -> bool {
        matches!(self, OutputFormat::Jpeg)
    }

    /// `path` with its extension replaced by this format's extension.
    pub fn adjust_path(&self, path: &Path) -> PathBuf {
        path.with_extension(self.extension())
    }
}

/// Result of encoding an image
#[derive(Debug)]
pub struct EncodedImage {
    /// The encoded image data
    pub data: Vec<u8>,
    /// The output format
    pub format: OutputFormat,
}

/// Trait for poster encoders
pub trait PosterEncoder: Send + Sync {
    /// The output format this encoder produces
    fn format(&self) -> OutputFormat;

    /// Encode an RGBA buffer. Encoders without alpha support flatten it first.
    fn encode(&self, image: &RgbaImage) -> Result<EncodedImage, RasterError>;
}

/// Baseline JPEG encoder (alpha dropped)
#[derive(Debug, Clone, Copy)]
pub struct JpegEncoder {
    quality: u8,
}

impl JpegEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl PosterEncoder for JpegEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }

    fn encode(&self, image: &RgbaImage) -> Result<EncodedImage, RasterError> {
        use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;

        let rgb = flatten_to_rgb(image);
        let mut output = Cursor::new(Vec::new());
        let encoder = ImageJpegEncoder::new_with_quality(&mut output, self.quality);

        encoder
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
            .map_err(|e| RasterError::encode_failed("jpeg", e.to_string()))?;

        Ok(EncodedImage {
            data: output.into_inner(),
            format: OutputFormat::Jpeg,
        })
    }
}

/// Lossless PNG encoder. Writes RGB because posters are opaque by the time
/// they are saved.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngEncoder;

impl PosterEncoder for PngEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn encode(&self, image: &RgbaImage) -> Result<EncodedImage, RasterError> {
        use image::codecs::png::PngEncoder as ImagePngEncoder;

        let rgb = flatten_to_rgb(image);
        let mut output = Cursor::new(Vec::new());
        let encoder = ImagePngEncoder::new(&mut output);

        encoder
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
            .map_err(|e| RasterError::encode_failed("png", e.to_string()))?;

        Ok(EncodedImage {
            data: output.into_inner(),
            format: OutputFormat::Png,
        })
    }
}
