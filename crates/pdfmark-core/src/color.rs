//! Hex color handling for annotation styles.

use serde::{Deserialize, Serialize};

/// Color used when none is given or the given one is malformed.
pub const DEFAULT_COLOR: &str = "#E44234";

/// Opaque RGB color decoded from a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` or `#RGB` (the leading `#` is optional).
    pub fn from_hex(input: &str) -> Option<Self> {
        let digits = input.trim();
        let digits = digits.strip_prefix('#').unwrap_or(digits);
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match digits.len() {
            6 => {
                let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
                let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
                let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
                Some(Self::new(r, g, b))
            }
            3 => {
                let expand = |i: usize| u8::from_str_radix(&digits[i..=i], 16).ok().map(|v| v * 17);
                Some(Self::new(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => None,
        }
    }

    /// Format as upper-case `#RRGGBB`.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Normalize a hex color to upper-case `#RRGGBB`.
pub fn normalize_hex(input: &str) -> Option<String> {
    Rgb8::from_hex(input).map(Rgb8::to_hex)
}

/// Normalize `input`, falling back to `fallback` when absent or malformed.
pub fn color_or(input: Option<&str>, fallback: &str) -> String {
    input
        .and_then(normalize_hex)
        .or_else(|| normalize_hex(fallback))
        .unwrap_or_else(|| DEFAULT_COLOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_long_form() {
        assert_eq!(Rgb8::from_hex("#E44234"), Some(Rgb8::new(0xE4, 0x42, 0x34)));
        assert_eq!(Rgb8::from_hex("e44234"), Some(Rgb8::new(0xE4, 0x42, 0x34)));
    }

    #[test]
    fn test_parse_short_form() {
        assert_eq!(Rgb8::from_hex("#f0a"), Some(Rgb8::new(0xFF, 0x00, 0xAA)));
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(Rgb8::from_hex("#12345"), None);
        assert_eq!(Rgb8::from_hex("#GGGGGG"), None);
        assert_eq!(Rgb8::from_hex(""), None);
        assert_eq!(Rgb8::from_hex("#ééé"), None);
    }

    #[test]
    fn test_normalize_uppercases() {
        assert_eq!(normalize_hex("#abcdef").as_deref(), Some("#ABCDEF"));
    }

    #[test]
    fn test_color_or_fallback() {
        assert_eq!(color_or(None, "#00ff00"), "#00FF00");
        assert_eq!(color_or(Some("nope"), "#00ff00"), "#00FF00");
        assert_eq!(color_or(Some("#123"), "#00ff00"), "#112233");
        assert_eq!(color_or(Some("nope"), "also-nope"), DEFAULT_COLOR);
    }
}
