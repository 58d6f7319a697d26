//! Font resolution with a guaranteed fallback.
//!
//! A [`FontResolver`] holds ordered candidate lists of font files per weight.
//! [`FontResolver::resolve`] returns the first candidate that reads and parses
//! as a scalable font; when none does, it returns the built-in 8x8 bitmap
//! font scaled to a fixed size. Resolution never fails.
//!
//! Fonts are read from disk on every call; nothing is cached between
//! compositing calls.

use crate::constants::{BITMAP_FONT_SCALE, BITMAP_FONT_SIZE, DEFAULT_BOLD_FONTS, DEFAULT_REGULAR_FONTS};
use ab_glyph::FontVec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Font weight requested by a compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// A usable font plus the pixel size text will be rendered at.
pub enum FontHandle {
    /// Scalable outline font loaded from `source`
    Scalable {
        font: FontVec,
        size: f32,
        source: PathBuf,
    },
    /// Built-in 8x8 glyphs scaled by an integer factor
    Bitmap { scale: u32 },
}

impl FontHandle {
    /// The built-in fallback font.
    pub fn fallback() -> Self {
        FontHandle::Bitmap {
            scale: BITMAP_FONT_SCALE,
        }
    }

    /// Actual pixel size text will be measured and drawn at.
    ///
    /// For the bitmap fallback this is its fixed size, not the size that was
    /// requested.
    pub fn pixel_size(&self) -> f32 {
        match self {
            FontHandle::Scalable { size, .. } => *size,
            FontHandle::Bitmap { scale } => (8 * scale) as f32,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, FontHandle::Bitmap { .. })
    }
}

impl fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontHandle::Scalable { size, source, .. } => f
                .debug_struct("Scalable")
                .field("size", size)
                .field("source", source)
                .finish(),
            FontHandle::Bitmap { scale } => f.debug_struct("Bitmap").field("scale", scale).finish(),
        }
    }
}

/// Ordered font candidate lists (YAML `fonts:` section).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FontConfig {
    /// Regular weight candidates, first match wins
    #[serde(default = "default_regular_fonts")]
    pub regular: Vec<PathBuf>,

    /// Bold candidates, first match wins
    #[serde(default = "default_bold_fonts")]
    pub bold: Vec<PathBuf>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            regular: default_regular_fonts(),
            bold: default_bold_fonts(),
        }
    }
}

fn default_regular_fonts() -> Vec<PathBuf> {
    DEFAULT_REGULAR_FONTS.iter().map(PathBuf::from).collect()
}

fn default_bold_fonts() -> Vec<PathBuf> {
    DEFAULT_BOLD_FONTS.iter().map(PathBuf::from).collect()
}

/// First-match resolver over ordered candidate lists.
#[derive(Debug, Clone, Default)]
pub struct FontResolver {
    config: FontConfig,
}

impl FontResolver {
    pub fn new(config: FontConfig) -> Self {
        Self { config }
    }

    /// A resolver with no candidates; always yields the bitmap font.
    pub fn bitmap_only() -> Self {
        Self {
            config: FontConfig {
                regular: Vec::new(),
                bold: Vec::new(),
            },
        }
    }

    pub fn candidates(&self, weight: FontWeight) -> &[PathBuf] {
        match weight {
            FontWeight::Regular => &self.config.regular,
            FontWeight::Bold => &self.config.bold,
        }
    }

    /// Resolve a font of `weight` at `pixel_size`.
    pub fn resolve(&self, weight: FontWeight, pixel_size: f32) -> FontHandle {
        let size = if pixel_size.is_finite() && pixel_size > 0.0 {
            pixel_size
        } else {
            BITMAP_FONT_SIZE as f32
        };

        let resolved = self
            .candidates(weight)
            .iter()
            .find_map(|path| load_scalable(path).map(|font| (font, path)));

        match resolved {
            Some((font, path)) => {
                tracing::debug!(font = %path.display(), size, ?weight, "Resolved font");
                FontHandle::Scalable {
                    font,
                    size,
                    source: path.clone(),
                }
            }
            None => {
                let handle = FontHandle::fallback();
                tracing::debug!(
                    ?weight,
                    requested_size = size,
                    actual_size = handle.pixel_size(),
                    "No font candidate loaded, using bitmap fallback"
                );
                handle
            }
        }
    }
}

fn load_scalable(path: &Path) -> Option<FontVec> {
    let data = std::fs::read(path).ok()?;
    match FontVec::try_from_vec(data) {
        Ok(font) => Some(font),
        Err(e) => {
            tracing::warn!(font = %path.display(), error = %e, "Font file exists but failed to parse");
            None
        }
    }
}
