//! Colour helpers.
//!
//! Backing plates and text are described as straight (non-premultiplied)
//! RGBA. Hex strings accept `#RGB`, `#RRGGBB` and `#RRGGBBAA`.

use super::RasterError;
use image::Rgba;

/// Fully transparent pixel.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Opaque white.
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Opaque black.
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Build a colour from RGB plus alpha.
pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Rgba<u8> {
    Rgba([r, g, b, a])
}

/// Parse a hex colour string into RGBA.
///
/// # Examples
///
/// ```
/// use postasy::raster::parse_hex_color;
///
/// assert_eq!(parse_hex_color("#FFF").unwrap().0, [255, 255, 255, 255]);
/// assert_eq!(parse_hex_color("#FF000080").unwrap().0, [255, 0, 0, 128]);
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Rgba<u8>, RasterError> {
    let hex = hex
        .strip_prefix('#')
        .ok_or_else(|| RasterError::invalid_color("Color must start with '#'"))?;

    if !hex.is_ascii() {
        return Err(RasterError::invalid_color("Invalid hex digit"));
    }

    match hex.len() {
        3 => {
            // #RGB - each digit doubled: 0xF -> 0xFF
            let r = hex_component(&hex[0..1])?;
            let g = hex_component(&hex[1..2])?;
            let b = hex_component(&hex[2..3])?;
            Ok(rgba(r * 17, g * 17, b * 17, 255))
        }
        6 | 8 => {
            let r = hex_component(&hex[0..2])?;
            let g = hex_component(&hex[2..4])?;
            let b = hex_component(&hex[4..6])?;
            let a = if hex.len() == 8 {
                hex_component(&hex[6..8])?
            } else {
                255
            };
            Ok(rgba(r, g, b, a))
        }
        n => Err(RasterError::invalid_color(format!(
            "Color must be #RGB, #RRGGBB or #RRGGBBAA, got {} characters",
            n
        ))),
    }
}

fn hex_component(digits: &str) -> Result<u8, RasterError> {
    u8::from_str_radix(digits, 16).map_err(|_| RasterError::invalid_color("Invalid hex digit"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color_rrggbb() {
        assert_eq!(parse_hex_color("#FF0000").unwrap(), rgba(255, 0, 0, 255));
        assert_eq!(parse_hex_color("#00ff00").unwrap(), rgba(0, 255, 0, 255));
    }

    #[test]
    fn test_parse_hex_color_rgb() {
        // A=10*17=170, B=11*17=187, C=12*17=204
        assert_eq!(parse_hex_color("#ABC").unwrap(), rgba(170, 187, 204, 255));
    }

    #[test]
    fn test_parse_hex_color_with_alpha() {
        assert_eq!(
            parse_hex_color("#FFFFFFB4").unwrap(),
            rgba(255, 255, 255, 180)
        );
    }

    #[test]
    fn test_parse_hex_color_invalid() {
        assert!(parse_hex_color("FF0000").is_err());
        assert!(parse_hex_color("#FF00").is_err());
        assert!(parse_hex_color("#GGGGGG").is_err());
        assert!(parse_hex_color("#ÄÄÄ").is_err());
    }
}
