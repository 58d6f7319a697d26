//! Anchor calculation for logo placement.
//!
//! Six anchors are supported: the four corners plus top and bottom centre.
//!
//! # Example
//!
//! ```
//! use postasy::compositor::position::{calculate_anchor, Dimensions, LogoPosition};
//!
//! let canvas = Dimensions::new(800, 600);
//! let logo = Dimensions::new(100, 50);
//!
//! let anchor = calculate_anchor(LogoPosition::BottomRight, canvas, logo, 10);
//! assert_eq!((anchor.x, anchor.y), (690, 540)); // 800 - 100 - 10, 600 - 50 - 10
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Where a logo is anchored on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogoPosition {
    TopLeft,
    #[default]
    TopRight,
    TopCenter,
    BottomLeft,
    BottomRight,
    BottomCenter,
}

impl LogoPosition {
    pub const ALL: [LogoPosition; 6] = [
        LogoPosition::TopLeft,
        LogoPosition::TopRight,
        LogoPosition::TopCenter,
        LogoPosition::BottomLeft,
        LogoPosition::BottomRight,
        LogoPosition::BottomCenter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::TopCenter => "top-center",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::BottomCenter => "bottom-center",
        }
    }
}

impl fmt::Display for LogoPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogoPosition {
    type Err = Infallible;

    /// Never fails: unknown values fall back to top-right.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "top-left" => Self::TopLeft,
            "top-center" => Self::TopCenter,
            "bottom-left" => Self::BottomLeft,
            "bottom-right" => Self::BottomRight,
            "bottom-center" => Self::BottomCenter,
            _ => Self::TopRight,
        })
    }
}

// Deserializes through `FromStr` so unknown names in profile files land on top-right
impl<'de> Deserialize<'de> for LogoPosition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        match raw.parse() {
            Ok(position) => Ok(position),
            Err(never) => match never {},
        }
    }
}

/// Width and height of a canvas or placed element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Top-left coordinate where an element should be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub x: i64,
    pub y: i64,
}

/// Calculate the anchor for an element of size `element` on `canvas`.
///
/// Left/top use the margin directly, right/bottom subtract element size and
/// margin from the canvas size, centre positions subtract half the element
/// width from half the canvas width. Coordinates may be negative if the
/// element is larger than the canvas.
pub fn calculate_anchor(
    position: LogoPosition,
    canvas: Dimensions,
    element: Dimensions,
    margin: u32,
) -> Anchor {
    let canvas_w = canvas.width as i64;
    let canvas_h = canvas.height as i64;
    let elem_w = element.width as i64;
    let elem_h = element.height as i64;
    let m = margin as i64;

    let left = m;
    let right = canvas_w - elem_w - m;
    let center = (canvas_w - elem_w) / 2;
    let top = m;
    let bottom = canvas_h - elem_h - m;

    let (x, y) = match position {
        LogoPosition::TopLeft => (left, top),
        LogoPosition::TopRight => (right, top),
        LogoPosition::TopCenter => (center, top),
        LogoPosition::BottomLeft => (left, bottom),
        LogoPosition::BottomRight => (right, bottom),
        LogoPosition::BottomCenter => (center, bottom),
    };

    Anchor { x, y }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LogoPosition::TopLeft, 20, 20)]
    #[case(LogoPosition::TopRight, 680, 20)]
    #[case(LogoPosition::TopCenter, 350, 20)]
    #[case(LogoPosition::BottomLeft, 20, 530)]
    #[case(LogoPosition::BottomRight, 680, 530)]
    #[case(LogoPosition::BottomCenter, 350, 530)]
    fn test_anchor_per_position(
        #[case] position: LogoPosition,
        #[case] x: i64,
        #[case] y: i64,
    ) {
        let anchor = calculate_anchor(
            position,
            Dimensions::new(800, 600),
            Dimensions::new(100, 50),
            20,
        );
        assert_eq!(anchor, Anchor { x, y });
    }

    #[test]
    fn test_anchor_keeps_element_inside_margins() {
        let canvases = [(800, 600), (101, 57), (1024, 1024), (333, 999)];
        let elements = [(1, 1), (50, 20), (80, 40)];
        for (cw, ch) in canvases {
            for (ew, eh) in elements {
                for margin in [0u32, 5, 10] {
                    if ew + 2 * margin > cw || eh + 2 * margin > ch {
                        continue;
                    }
                    for position in LogoPosition::ALL {
                        let a = calculate_anchor(
                            position,
                            Dimensions::new(cw, ch),
                            Dimensions::new(ew, eh),
                            margin,
                        );
                        let m = margin as i64;
                        assert!(a.x >= m && a.y >= m, "{position} at {a:?}");
                        assert!(a.x + ew as i64 <= cw as i64 - m, "{position} at {a:?}");
                        assert!(a.y + eh as i64 <= ch as i64 - m, "{position} at {a:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_parse_known_positions() {
        for position in LogoPosition::ALL {
            assert_eq!(position.as_str().parse::<LogoPosition>().unwrap(), position);
        }
        assert_eq!(
            " Bottom-Center ".parse::<LogoPosition>().unwrap(),
            LogoPosition::BottomCenter
        );
    }

    #[test]
    fn test_unknown_position_defaults_to_top_right() {
        assert_eq!(
            "middle".parse::<LogoPosition>().unwrap(),
            LogoPosition::TopRight
        );
        assert_eq!(LogoPosition::default(), LogoPosition::TopRight);
    }

    #[test]
    fn test_position_serde_kebab_case() {
        let p: LogoPosition = serde_yaml::from_str("bottom-left").unwrap();
        assert_eq!(p, LogoPosition::BottomLeft);
        assert_eq!(
            serde_yaml::to_string(&LogoPosition::TopCenter).unwrap().trim(),
            "top-center"
        );
    }

    #[test]
    fn test_unknown_position_in_yaml_defaults_to_top_right() {
        let p: LogoPosition = serde_yaml::from_str("middle").unwrap();
        assert_eq!(p, LogoPosition::TopRight);
        let p: LogoPosition = serde_json::from_str("\" Bottom-Left \"").unwrap();
        assert_eq!(p, LogoPosition::BottomLeft);
        assert!(serde_yaml::from_str::<LogoPosition>("[1, 2]").is_err());
    }
}
