use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::app::infrastructure::error::AppError;

/// An opaque RGB color written as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LineColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LineColor {
    pub const INDIGO: LineColor = LineColor::rgb(0x4F, 0x46, 0xE5);
    pub const WHITE: LineColor = LineColor::rgb(0xFF, 0xFF, 0xFF);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Hex digits without the leading `#`, as URL overlays expect.
    pub fn hex_digits(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Mix `self` over `background` at `opacity` (0.0 transparent, 1.0 opaque).
    pub fn over(&self, background: LineColor, opacity: f32) -> LineColor {
        let a = opacity.clamp(0.0, 1.0);
        let mix = |fg: u8, bg: u8| (fg as f32 * a + bg as f32 * (1.0 - a)).round() as u8;
        LineColor::rgb(
            mix(self.r, background.r),
            mix(self.g, background.g),
            mix(self.b, background.b),
        )
    }

    pub fn to_rgba(&self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, 255])
    }
}

impl Default for LineColor {
    fn default() -> Self {
        Self::INDIGO
    }
}

impl fmt::Display for LineColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.hex_digits())
    }
}

impl FromStr for LineColor {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');
        let invalid = || AppError::Config(format!("invalid color: {:?}", s));
        if !digits.is_ascii() {
            return Err(invalid());
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(invalid()),
        };
        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| invalid());
        Ok(LineColor::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for LineColor {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LineColor> for String {
    fn from(c: LineColor) -> Self {
        c.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let c: LineColor = "#4f46e5".parse().unwrap();
        assert_eq!(c, LineColor::INDIGO);
        assert_eq!(c.to_string(), "#4F46E5");
        assert_eq!(c.hex_digits(), "4F46E5");
    }

    #[test]
    fn test_parse_shorthand() {
        let c: LineColor = "#f0a".parse().unwrap();
        assert_eq!(c, LineColor::rgb(0xFF, 0x00, 0xAA));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("#12345".parse::<LineColor>().is_err());
        assert!("#zzzzzz".parse::<LineColor>().is_err());
        assert!("".parse::<LineColor>().is_err());
    }

    #[test]
    fn test_over_white() {
        let gray = LineColor::rgb(107, 114, 128);
        assert_eq!(gray.over(LineColor::WHITE, 1.0), gray);
        assert_eq!(gray.over(LineColor::WHITE, 0.0), LineColor::WHITE);
        assert_eq!(gray.over(LineColor::WHITE, 0.8), LineColor::rgb(137, 142, 153));
    }

    #[test]
    fn test_serde_as_hex_string() {
        let json = serde_json::to_string(&LineColor::INDIGO).unwrap();
        assert_eq!(json, "\"#4F46E5\"");
        let back: LineColor = serde_json::from_str("\"#ff0000\"").unwrap();
        assert_eq!(back, LineColor::rgb(255, 0, 0));
    }
}
