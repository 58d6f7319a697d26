// Compositor module - logo, profile overlay and watermark stages

pub mod logo;
pub mod position;
pub mod profile;
pub mod watermark;

pub use logo::{
    add_logo_to_poster, composite_logo, CompanyInfo, LogoSpec, DEFAULT_LOGO_BACKING,
    POSTER_TOP_BACKING,
};
pub use position::{calculate_anchor, Anchor, Dimensions, LogoPosition};
pub use profile::{
    add_profile_overlay, compose_profile_overlay, LogoResolver, ProfileData, ProfileField,
    ProfileOverlay, ProfileOverlayReport,
};
pub use watermark::{
    StepFailure, WatermarkCompositor, WatermarkKind, WatermarkOptions, WatermarkOutcome,
};

use std::fmt;

/// A visual element that was left out while the stage still produced output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// Selected logo could not be resolved or decoded
    LogoOmitted { reference: String, reason: String },
    /// Profile overlay failed as a whole; the raw image was used instead
    OverlaySkipped { reason: String },
    /// Watermark stage fell back from its preferred output
    WatermarkFallback {
        kind: WatermarkKind,
        failures: Vec<StepFailure>,
    },
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degradation::LogoOmitted { reference, reason } => {
                write!(f, "Logo '{}' omitted: {}", reference, reason)
            }
            Degradation::OverlaySkipped { reason } => {
                write!(f, "Profile overlay skipped: {}", reason)
            }
            Degradation::WatermarkFallback { kind, failures } => {
                write!(f, "Watermark saved as {} after {} failed step(s)", kind, failures.len())
            }
        }
    }
}
