// Constants module - centralized default values for configuration
//
// This module defines the default values used throughout the pipeline.
// Layout numbers that shape the rendered poster live here too, so the
// compositors and their tests agree on them.

// =============================================================================
// Storage defaults
// =============================================================================

/// Default root directory for uploaded and generated files
pub const DEFAULT_UPLOAD_ROOT: &str = "static/uploads";

/// Subdirectory (under the upload root) holding finished posters
pub const POSTERS_DIR: &str = "posters";

/// Subdirectory (under the upload root) holding user logos
pub const LOGOS_DIR: &str = "logos";

/// Upload extensions accepted by `StorageLayout::save_upload`
pub const ALLOWED_UPLOAD_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

// =============================================================================
// Generation defaults
// =============================================================================

/// Default generative image model
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-2.0-flash-preview-image-generation";

/// Default generation API base URL
pub const DEFAULT_GENERATION_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// Default HTTP timeout for a single generation call in seconds
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;

/// Payloads smaller than this are treated as a malformed response
pub const DEFAULT_MIN_IMAGE_BYTES: usize = 1000;

/// Both sides of a generated image must be at least this many pixels
pub const DEFAULT_MIN_IMAGE_DIMENSION: u32 = 100;

/// Minimum prompt length in characters
pub const MIN_PROMPT_CHARS: usize = 10;

/// Maximum prompt length in characters
pub const MAX_PROMPT_CHARS: usize = 1000;

// =============================================================================
// Retry defaults
// =============================================================================

/// Default maximum attempts (including the initial attempt)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default initial backoff in milliseconds
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 2000;

/// Default maximum backoff in milliseconds
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 8000;

// =============================================================================
// Watermark defaults
// =============================================================================

/// Default watermark string for accounts without unlimited access
pub const DEFAULT_WATERMARK_TEXT: &str = "Postasy - Upgrade for Watermark-Free";

/// Default JPEG quality for rendered posters
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Watermark font size bounds (pixels)
pub const WATERMARK_MIN_FONT_SIZE: u32 = 12;
pub const WATERMARK_MAX_FONT_SIZE: u32 = 20;

/// Watermark margin bounds (pixels)
pub const WATERMARK_MIN_MARGIN: u32 = 10;
pub const WATERMARK_MAX_MARGIN: u32 = 20;

// =============================================================================
// Logo defaults
// =============================================================================

/// Padding around a logo inside its backing plate
pub const LOGO_PLATE_PADDING: u32 = 10;

/// Default maximum logo height
pub const DEFAULT_LOGO_MAX_HEIGHT: u32 = 100;

/// Default logo margin from the canvas edges
pub const DEFAULT_LOGO_MARGIN: u32 = 20;

// =============================================================================
// Profile overlay layout
// =============================================================================

/// Header and footer bands are each `height / PROFILE_BAND_DIVISOR`
pub const PROFILE_BAND_DIVISOR: u32 = 6;

/// Extra pixels between footer lines on top of the font size
pub const PROFILE_LINE_SPACING: u32 = 6;

/// Vertical padding included in the footer text block height
pub const PROFILE_BLOCK_PADDING: u32 = 40;

/// Inset of the first footer line from the plate's top edge
pub const PROFILE_TEXT_INSET: u32 = 20;

/// Maximum logo height inside the profile header
pub const PROFILE_LOGO_MAX_HEIGHT: u32 = 100;

/// Logo margin inside the profile header
pub const PROFILE_LOGO_MARGIN: u32 = 20;

/// Alpha of the black plates behind header and footer text
pub const PROFILE_PLATE_ALPHA: u8 = 180;

// =============================================================================
// Fonts
// =============================================================================

/// Regular-weight font candidates, tried in order
pub const DEFAULT_REGULAR_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/usr/share/fonts/TTF/arial.ttf",
];

/// Bold font candidates, tried in order
pub const DEFAULT_BOLD_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/usr/share/fonts/TTF/arialbd.ttf",
];

/// Scale applied to the 8x8 fallback glyphs
pub const BITMAP_FONT_SCALE: u32 = 2;

/// Pixel size of the bitmap fallback font (8 * scale)
pub const BITMAP_FONT_SIZE: u32 = 8 * BITMAP_FONT_SCALE;

// =============================================================================
// Logo caption layout
// =============================================================================

/// Regular font size of the company caption under a logo
pub const CAPTION_FONT_SIZE: u32 = 20;

/// Extra pixels added to the caption font size for the company name
pub const CAPTION_BOLD_EXTRA: u32 = 2;

/// Gap between the logo's bottom edge and the first caption line
pub const CAPTION_GAP: u32 = 20;

/// Plate padding around the company name
pub const CAPTION_NAME_PADDING: u32 = 10;

/// Plate padding around each contact line
pub const CAPTION_LINE_PADDING: u32 = 5;
