//! 8-bit RGB colors for blobs and backgrounds.
//!
//! Colors travel through configuration files as hex strings (`"ff8800"`),
//! so [`Rgb`] serializes to and from that form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Three-channel 8-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const BLACK: Rgb = Rgb([0, 0, 0]);
    pub const WHITE: Rgb = Rgb([255, 255, 255]);

    /// Create a color from its channels.
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self([red, green, blue])
    }

    /// Parse a hex color code such as `#FF8800` or `ff8800`.
    ///
    /// Leading and trailing `#`, `-` and whitespace are ignored. The value
    /// must fit in 24 bits.
    pub fn from_hex(text: &str) -> Result<Self, ColorParseError> {
        let digits = text.trim_matches(|c: char| c == '#' || c == '-' || c.is_whitespace());
        if digits.is_empty() {
            return Err(ColorParseError::Empty);
        }
        let value = u32::from_str_radix(digits, 16)
            .map_err(|_| ColorParseError::NotHex(text.to_string()))?;
        if value > 0xFF_FFFF {
            return Err(ColorParseError::OutOfRange(value));
        }
        Ok(Self([(value >> 16) as u8, (value >> 8) as u8, value as u8]))
    }

    /// Convert hue, lightness and saturation (all in [0, 1]) to RGB.
    pub fn from_hls(hue: f64, lightness: f64, saturation: f64) -> Self {
        let channel = |value: f64| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        if saturation == 0.0 {
            let gray = channel(lightness);
            return Self([gray, gray, gray]);
        }
        let upper = if lightness <= 0.5 {
            lightness * (1.0 + saturation)
        } else {
            lightness + saturation - lightness * saturation
        };
        let lower = 2.0 * lightness - upper;
        Self([
            channel(hue_to_channel(lower, upper, hue + 1.0 / 3.0)),
            channel(hue_to_channel(lower, upper, hue)),
            channel(hue_to_channel(lower, upper, hue - 1.0 / 3.0)),
        ])
    }

    pub fn red(&self) -> u8 {
        self.0[0]
    }

    pub fn green(&self) -> u8 {
        self.0[1]
    }

    pub fn blue(&self) -> u8 {
        self.0[2]
    }

    /// Channels as floating point values in [0, 255].
    pub fn to_f64_array(&self) -> [f64; 3] {
        [self.0[0] as f64, self.0[1] as f64, self.0[2] as f64]
    }

    /// Lowercase six-digit hex code without a leading `#`.
    pub fn to_hex(&self) -> String {
        format!("{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2])
    }
}

fn hue_to_channel(lower: f64, upper: f64, hue: f64) -> f64 {
    let hue = hue.rem_euclid(1.0);
    if hue < 1.0 / 6.0 {
        lower + (upper - lower) * hue * 6.0
    } else if hue < 0.5 {
        upper
    } else if hue < 2.0 / 3.0 {
        lower + (upper - lower) * (2.0 / 3.0 - hue) * 6.0
    } else {
        lower
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::from_hex(text)
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorParseError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::from_hex(&text)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}

/// Errors produced while parsing a hex color code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    /// Nothing left after trimming
    Empty,
    /// Input contains non-hexadecimal characters
    NotHex(String),
    /// Value exceeds `0xFFFFFF`
    OutOfRange(u32),
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorParseError::Empty => write!(f, "Color code is empty"),
            ColorParseError::NotHex(text) => {
                write!(f, "Color code '{}' is not a hexadecimal number", text)
            }
            ColorParseError::OutOfRange(value) => write!(
                f,
                "Color code must be between #000000 and #FFFFFF, instead got #{:X}",
                value
            ),
        }
    }
}

impl std::error::Error for ColorParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(Rgb::from_hex("ff8800").unwrap(), Rgb::new(255, 136, 0));
        assert_eq!(Rgb::from_hex(" #0A0b0C\n").unwrap(), Rgb::new(10, 11, 12));
        assert_eq!(Rgb::from_hex("fff").unwrap(), Rgb::new(0, 15, 255));
    }

    #[test]
    fn test_parse_hex_rejects_bad_input() {
        assert_eq!(Rgb::from_hex("##"), Err(ColorParseError::Empty));
        assert!(matches!(Rgb::from_hex("zz0000"), Err(ColorParseError::NotHex(_))));
        assert_eq!(
            Rgb::from_hex("1000000"),
            Err(ColorParseError::OutOfRange(0x100_0000))
        );
    }

    #[test]
    fn test_hls_primaries() {
        assert_eq!(Rgb::from_hls(0.0, 0.5, 1.0), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::from_hls(1.0 / 3.0, 0.5, 1.0), Rgb::new(0, 255, 0));
        assert_eq!(Rgb::from_hls(2.0 / 3.0, 0.5, 1.0), Rgb::new(0, 0, 255));
        assert_eq!(Rgb::from_hls(0.3, 0.5, 0.0), Rgb::new(128, 128, 128));
    }

    #[test]
    fn test_serde_as_hex_string() {
        let json = serde_json::to_string(&Rgb::new(1, 2, 255)).unwrap();
        assert_eq!(json, "\"0102ff\"");
        let parsed: Rgb = serde_json::from_str("\"#FFFFFF\"").unwrap();
        assert_eq!(parsed, Rgb::WHITE);
        assert!(serde_json::from_str::<Rgb>("\"nothex\"").is_err());
    }
}
