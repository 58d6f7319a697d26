//! Profile overlay: business identity bands around a poster.
//!
//! The canvas is extended by a header band above and a footer band below the
//! original image, each a sixth of the original height. Contact lines are
//! drawn in the footer, the business or personal name in the header, and an
//! optional logo top-right. Plates, text and logo all go into one overlay
//! buffer that is composited onto the extended canvas in a single pass.

use super::position::{calculate_anchor, Dimensions, LogoPosition};
use super::Degradation;
use crate::constants::{
    DEFAULT_JPEG_QUALITY, PROFILE_BAND_DIVISOR, PROFILE_BLOCK_PADDING, PROFILE_LINE_SPACING,
    PROFILE_LOGO_MARGIN, PROFILE_LOGO_MAX_HEIGHT, PROFILE_PLATE_ALPHA, PROFILE_TEXT_INSET,
};
use crate::error::PosterError;
use crate::fonts::{FontHandle, FontResolver, FontWeight};
use crate::raster::{
    self, alpha_composite, draw_rect, draw_text, flatten_to_rgb, measure_text, normalize_to_rgba,
    paste_masked, resize_preserving_aspect, rgba, JpegEncoder, PosterEncoder, RasterError, Rect,
    TRANSPARENT, WHITE,
};
use image::{DynamicImage, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Profile fields a user can toggle onto a poster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    FullName,
    BusinessName,
    Phone,
    Address,
    Website,
    Facebook,
    Instagram,
    Twitter,
    Linkedin,
    Logo,
}

impl ProfileField {
    /// Footer line order. `Logo` is not a text field.
    pub const RENDER_ORDER: [ProfileField; 9] = [
        ProfileField::FullName,
        ProfileField::BusinessName,
        ProfileField::Phone,
        ProfileField::Address,
        ProfileField::Website,
        ProfileField::Facebook,
        ProfileField::Instagram,
        ProfileField::Twitter,
        ProfileField::Linkedin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullName => "full_name",
            Self::BusinessName => "business_name",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::Website => "website",
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Twitter => "twitter",
            Self::Linkedin => "linkedin",
            Self::Logo => "logo",
        }
    }

    /// Icon printed before the value; names have none.
    pub fn icon(&self) -> Option<&'static str> {
        match self {
            Self::Phone => Some("📞"),
            Self::Address => Some("📍"),
            Self::Website => Some("🌐"),
            Self::Facebook => Some("📘"),
            Self::Instagram => Some("📷"),
            Self::Twitter => Some("🐦"),
            Self::Linkedin => Some("💼"),
            Self::FullName | Self::BusinessName | Self::Logo => None,
        }
    }

    fn format_line(&self, value: &str) -> String {
        match self.icon() {
            Some(icon) => format!("{icon} {value}"),
            None => value.to_string(),
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a field name that is not one of [`ProfileField`]'s names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown profile field '{}'", self.0)
    }
}

impl std::error::Error for UnknownField {}

impl FromStr for ProfileField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::RENDER_ORDER
            .iter()
            .chain(std::iter::once(&ProfileField::Logo))
            .find(|field| field.as_str() == name)
            .copied()
            .ok_or_else(|| UnknownField(name.to_string()))
    }
}

/// Snapshot of a user's business profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileData {
    pub full_name: Option<String>,
    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
    /// Stored logo reference, resolved through a [`LogoResolver`]
    pub logo_filename: Option<String>,
}

impl ProfileData {
    /// Value for `field`, or `None` when absent or blank.
    pub fn get(&self, field: ProfileField) -> Option<&str> {
        let value = match field {
            ProfileField::FullName => &self.full_name,
            ProfileField::BusinessName => &self.business_name,
            ProfileField::Phone => &self.phone,
            ProfileField::Address => &self.address,
            ProfileField::Website => &self.website,
            ProfileField::Facebook => &self.facebook,
            ProfileField::Instagram => &self.instagram,
            ProfileField::Twitter => &self.twitter,
            ProfileField::Linkedin => &self.linkedin,
            ProfileField::Logo => &self.logo_filename,
        };
        value.as_deref().filter(|v| !v.trim().is_empty())
    }
}

/// Maps a stored logo reference to a file on disk.
pub trait LogoResolver {
    fn resolve_logo(&self, reference: &str) -> Option<PathBuf>;
}

impl<F> LogoResolver for F
where
    F: Fn(&str) -> Option<PathBuf>,
{
    fn resolve_logo(&self, reference: &str) -> Option<PathBuf> {
        self(reference)
    }
}

/// Rendered overlay plus anything that had to be left out.
#[derive(Debug)]
pub struct ProfileOverlay {
    pub image: RgbImage,
    pub degradations: Vec<Degradation>,
}

/// Result of [`add_profile_overlay`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileOverlayReport {
    pub path: PathBuf,
    pub degradations: Vec<Degradation>,
}

struct ProfileFonts {
    regular: FontHandle,
    bold: FontHandle,
}

impl ProfileFonts {
    fn resolve(fonts: &FontResolver, width: u32) -> Self {
        let size = (width / 60).max(16);
        Self {
            regular: fonts.resolve(FontWeight::Regular, size as f32),
            bold: fonts.resolve(FontWeight::Bold, (size + 4) as f32),
        }
    }
}

/// Build the expanded canvas with header, footer and optional logo.
///
/// Output height is always `h + 2 * (h / 6)`. Only fields that are both in
/// `selected` and populated in `profile` are drawn. A logo that cannot be
/// resolved or decoded is recorded as a degradation; the text is still drawn.
pub fn compose_profile_overlay(
    base: &DynamicImage,
    profile: &ProfileData,
    selected: &[ProfileField],
    logos: &dyn LogoResolver,
    fonts: &FontResolver,
) -> Result<ProfileOverlay, RasterError> {
    let original = normalize_to_rgba(base);
    let (width, height) = original.dimensions();
    let band = height / PROFILE_BAND_DIVISOR;
    let total_height = height + 2 * band;

    let mut canvas = RgbaImage::from_pixel(width, total_height, WHITE);
    paste_masked(&mut canvas, &original, 0, band as i64);

    let is_shown = |field: ProfileField| {
        selected
            .contains(&field)
            .then(|| profile.get(field))
            .flatten()
    };

    let lines: Vec<String> = ProfileField::RENDER_ORDER
        .iter()
        .filter_map(|field| is_shown(*field).map(|value| field.format_line(value)))
        .collect();
    let title = is_shown(ProfileField::BusinessName).or_else(|| is_shown(ProfileField::FullName));

    let mut overlay = RgbaImage::from_pixel(width, total_height, TRANSPARENT);

    if !lines.is_empty() || title.is_some() {
        let fonts = ProfileFonts::resolve(fonts, width);
        if !lines.is_empty() {
            draw_footer(&mut overlay, &lines, &fonts, band);
        }
        if let Some(title) = title {
            draw_header(&mut overlay, title, &fonts.bold, band);
        }
    }

    let mut degradations = Vec::new();
    if let Some(reference) = is_shown(ProfileField::Logo) {
        if let Err(reason) = draw_logo(&mut overlay, reference, logos) {
            tracing::warn!(
                logo = reference,
                reason = %reason,
                "Logo could not be added to profile overlay, continuing with text only"
            );
            degradations.push(Degradation::LogoOmitted {
                reference: reference.to_string(),
                reason,
            });
        }
    }

    let composited = alpha_composite(&canvas, &overlay)?;
    Ok(ProfileOverlay {
        image: flatten_to_rgb(&composited),
        degradations,
    })
}

/// Footer plate over the whole band (taller if the text needs it) plus centred lines.
fn draw_footer(overlay: &mut RgbaImage, lines: &[String], fonts: &ProfileFonts, band: u32) {
    let (width, total_height) = overlay.dimensions();
    let line_height = fonts.regular.pixel_size() as u32 + PROFILE_LINE_SPACING;
    let block_height = lines.len() as u32 * line_height + PROFILE_BLOCK_PADDING;
    let plate_height = band.max(block_height);
    let plate_top = total_height as i64 - plate_height as i64;

    draw_rect(
        overlay,
        Rect::new(0, plate_top, width, plate_height),
        rgba(0, 0, 0, PROFILE_PLATE_ALPHA),
    );

    let mut y = plate_top + PROFILE_TEXT_INSET as i64;
    for (index, line) in lines.iter().enumerate() {
        // Name and business name lead the list
        let font = if index < 2 { &fonts.bold } else { &fonts.regular };
        let metrics = measure_text(line, font);
        let x = (width as i64 - metrics.width as i64) / 2;
        draw_text(overlay, x, y, line, font, WHITE);
        y += line_height as i64;
    }
}

/// Plate over the top half of the header band with the title centred in it.
fn draw_header(overlay: &mut RgbaImage, title: &str, bold: &FontHandle, band: u32) {
    let width = overlay.width();
    let plate_height = band / 2;

    draw_rect(
        overlay,
        Rect::new(0, 0, width, plate_height),
        rgba(0, 0, 0, PROFILE_PLATE_ALPHA),
    );

    let metrics = measure_text(title, bold);
    let x = (width as i64 - metrics.width as i64) / 2;
    let y = (plate_height as i64 - metrics.height as i64) / 2;
    draw_text(overlay, x, y, title, bold, WHITE);
}

fn draw_logo(
    overlay: &mut RgbaImage,
    reference: &str,
    logos: &dyn LogoResolver,
) -> Result<(), String> {
    let path = logos
        .resolve_logo(reference)
        .ok_or_else(|| format!("no logo file for '{reference}'"))?;
    let logo = raster::load(&path).map_err(|e| e.to_string())?;
    let logo = resize_preserving_aspect(&normalize_to_rgba(&logo), PROFILE_LOGO_MAX_HEIGHT)
        .map_err(|e| e.to_string())?;

    let (width, height) = overlay.dimensions();
    let anchor = calculate_anchor(
        LogoPosition::TopRight,
        Dimensions::new(width, height),
        Dimensions::new(logo.width(), logo.height()),
        PROFILE_LOGO_MARGIN,
    );
    paste_masked(overlay, &logo, anchor.x, anchor.y);
    Ok(())
}

/// Load `input`, add the profile overlay and write it to `output` as JPEG.
///
/// A missing or corrupt input is an input error; nothing is written in that
/// case. A logo problem only shows up in the report's degradations.
pub fn add_profile_overlay(
    input: &Path,
    output: &Path,
    profile: &ProfileData,
    selected: &[ProfileField],
    logos: &dyn LogoResolver,
    fonts: &FontResolver,
) -> Result<ProfileOverlayReport, PosterError> {
    let base = raster::load(input)?;
    let overlay = compose_profile_overlay(&base, profile, selected, logos, fonts)
        .map_err(|e| PosterError::encoding(output, e.to_string()))?;

    let encoded = JpegEncoder::new(DEFAULT_JPEG_QUALITY)
        .encode(&DynamicImage::ImageRgb8(overlay.image).to_rgba8())
        .map_err(|e| PosterError::encoding(output, e.to_string()))?;
    raster::write_atomic(output, &encoded.data).map_err(|e| PosterError::io(output, e))?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        fields = selected.len(),
        degraded = !overlay.degradations.is_empty(),
        "Profile overlay added"
    );

    Ok(ProfileOverlayReport {
        path: output.to_path_buf(),
        degradations: overlay.degradations,
    })
}
