use std::fmt;
use std::str::FromStr;

use image::Rgb;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Solid background color a style expects the generated image to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackgroundColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid color '{0}': expected #RRGGBB")]
pub struct ColorParseError(pub String);

impl BackgroundColor {
    pub const WHITE: BackgroundColor = BackgroundColor::new(255, 255, 255);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        BackgroundColor { red, green, blue }
    }

    pub fn to_rgb(self) -> Rgb<u8> {
        Rgb([self.red, self.green, self.blue])
    }

    /// True when every channel of `pixel` is within `tolerance` of this color.
    pub fn is_near(&self, pixel: &Rgb<u8>, tolerance: u8) -> bool {
        let [r, g, b] = pixel.0;
        self.red.abs_diff(r) <= tolerance
            && self.green.abs_diff(g) <= tolerance
            && self.blue.abs_diff(b) <= tolerance
    }
}

impl From<BackgroundColor> for Rgb<u8> {
    fn from(color: BackgroundColor) -> Self {
        color.to_rgb()
    }
}

impl fmt::Display for BackgroundColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

impl FromStr for BackgroundColor {
    type Err = ColorParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError(value.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ColorParseError(value.to_string()))
        };

        Ok(BackgroundColor {
            red: channel(0..2)?,
            green: channel(2..4)?,
            blue: channel(4..6)?,
        })
    }
}

impl Serialize for BackgroundColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for BackgroundColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_with_and_without_hash() {
        assert_eq!("#A8A8A8".parse(), Ok(BackgroundColor::new(168, 168, 168)));
        assert_eq!("ffffff".parse(), Ok(BackgroundColor::WHITE));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!("#FFF".parse::<BackgroundColor>().is_err());
        assert!("#GGGGGG".parse::<BackgroundColor>().is_err());
        assert!("".parse::<BackgroundColor>().is_err());
    }

    #[test]
    fn displays_uppercase_hex() {
        assert_eq!(BackgroundColor::new(96, 96, 96).to_string(), "#606060");
    }

    #[test]
    fn serializes_as_hex_string() {
        let json = serde_json::to_string(&BackgroundColor::WHITE).unwrap();
        assert_eq!(json, "\"#FFFFFF\"");
        let back: BackgroundColor = serde_json::from_str("\"#252525\"").unwrap();
        assert_eq!(back, BackgroundColor::new(37, 37, 37));
    }

    #[test]
    fn near_check_uses_every_channel() {
        let white = BackgroundColor::WHITE;
        assert!(white.is_near(&Rgb([250, 248, 255]), 8));
        assert!(!white.is_near(&Rgb([250, 240, 255]), 8));
    }
}
