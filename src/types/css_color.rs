// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CSS color values accepted in the card configuration.
//!
//! Authors may write a color as `#RRGGBB`, `rgb(r, g, b)`,
//! `rgba(r, g, b, a)` or a theme variable such as
//! `var(--state-active-color)`. Variables are opaque to the card: they are
//! stored verbatim and never format-checked.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValueError;

/// A color as written in the card configuration.
///
/// # Examples
///
/// ```
/// use room_card::types::CssColor;
///
/// let hex: CssColor = "#FF8800".parse().unwrap();
/// assert_eq!(hex.to_string(), "#FF8800");
///
/// let rgba: CssColor = "rgba(10, 20, 30, 0.5)".parse().unwrap();
/// assert_eq!(rgba.to_string(), "rgba(10, 20, 30, 0.5)");
///
/// let var: CssColor = "var(--primary-color)".parse().unwrap();
/// assert!(var.is_variable());
///
/// assert!("#FFF".parse::<CssColor>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum CssColor {
    /// `#RRGGBB`.
    Hex {
        /// Red channel.
        red: u8,
        /// Green channel.
        green: u8,
        /// Blue channel.
        blue: u8,
    },
    /// `rgb(r, g, b)`.
    Rgb {
        /// Red channel.
        red: u8,
        /// Green channel.
        green: u8,
        /// Blue channel.
        blue: u8,
    },
    /// `rgba(r, g, b, a)` with alpha in `[0, 1]`.
    Rgba {
        /// Red channel.
        red: u8,
        /// Green channel.
        green: u8,
        /// Blue channel.
        blue: u8,
        /// Opacity.
        alpha: f32,
    },
    /// An opaque theme variable reference, kept verbatim.
    Variable(String),
}

impl CssColor {
    /// Creates a hex color.
    #[must_use]
    pub const fn hex(red: u8, green: u8, blue: u8) -> Self {
        Self::Hex { red, green, blue }
    }

    /// Returns `true` for theme variable references.
    #[must_use]
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    /// Returns the RGB channels, or `None` for variables.
    #[must_use]
    pub fn channels(&self) -> Option<(u8, u8, u8)> {
        match *self {
            Self::Hex { red, green, blue }
            | Self::Rgb { red, green, blue }
            | Self::Rgba {
                red, green, blue, ..
            } => Some((red, green, blue)),
            Self::Variable(_) => None,
        }
    }
}

fn rgb_regex() -> &'static Regex {
    static RGB: OnceLock<Regex> = OnceLock::new();
    RGB.get_or_init(|| {
        Regex::new(r"^rgb\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*\)$")
            .expect("static rgb pattern compiles")
    })
}

fn rgba_regex() -> &'static Regex {
    static RGBA: OnceLock<Regex> = OnceLock::new();
    RGBA.get_or_init(|| {
        Regex::new(
            r"^rgba\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d*\.?\d+)\s*\)$",
        )
        .expect("static rgba pattern compiles")
    })
}

fn channel(s: &str, input: &str) -> Result<u8, ValueError> {
    s.parse::<u8>()
        .map_err(|_| ValueError::InvalidColor(input.to_string()))
}

fn parse_hex(hex: &str, input: &str) -> Result<CssColor, ValueError> {
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValueError::InvalidColor(input.to_string()));
    }
    let pair = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| ValueError::InvalidColor(input.to_string()))
    };
    Ok(CssColor::hex(pair(0..2)?, pair(2..4)?, pair(4..6)?))
}

impl FromStr for CssColor {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if trimmed.starts_with("var(") {
            return Ok(Self::Variable(trimmed.to_string()));
        }

        if let Some(hex) = trimmed.strip_prefix('#') {
            return parse_hex(hex, s);
        }

        if let Some(caps) = rgb_regex().captures(trimmed) {
            return Ok(Self::Rgb {
                red: channel(&caps[1], s)?,
                green: channel(&caps[2], s)?,
                blue: channel(&caps[3], s)?,
            });
        }

        if let Some(caps) = rgba_regex().captures(trimmed) {
            let alpha: f32 = caps[4]
                .parse()
                .map_err(|_| ValueError::InvalidColor(s.to_string()))?;
            if !(0.0..=1.0).contains(&alpha) {
                return Err(ValueError::InvalidColor(s.to_string()));
            }
            return Ok(Self::Rgba {
                red: channel(&caps[1], s)?,
                green: channel(&caps[2], s)?,
                blue: channel(&caps[3], s)?,
                alpha,
            });
        }

        Err(ValueError::InvalidColor(s.to_string()))
    }
}

impl fmt::Display for CssColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hex { red, green, blue } => write!(f, "#{red:02X}{green:02X}{blue:02X}"),
            Self::Rgb { red, green, blue } => write!(f, "rgb({red}, {green}, {blue})"),
            Self::Rgba {
                red,
                green,
                blue,
                alpha,
            } => write!(f, "rgba({red}, {green}, {blue}, {alpha})"),
            Self::Variable(var) => f.write_str(var),
        }
    }
}

impl Serialize for CssColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CssColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex() {
        let color: CssColor = "#1a2B3c".parse().unwrap();
        assert_eq!(color, CssColor::hex(0x1A, 0x2B, 0x3C));
        assert_eq!(color.to_string(), "#1A2B3C");
    }

    #[test]
    fn rejects_short_or_bad_hex() {
        assert!("#FFF".parse::<CssColor>().is_err());
        assert!("#GG0000".parse::<CssColor>().is_err());
        assert!("#FF00000".parse::<CssColor>().is_err());
        assert!("FF0000".parse::<CssColor>().is_err());
    }

    #[test]
    fn parses_rgb_and_rgba() {
        assert_eq!(
            "rgb(1, 2, 3)".parse::<CssColor>().unwrap(),
            CssColor::Rgb {
                red: 1,
                green: 2,
                blue: 3
            }
        );
        let rgba: CssColor = "rgba(255,255,255,.25)".parse().unwrap();
        assert_eq!(rgba.channels(), Some((255, 255, 255)));
        assert!(matches!(
            rgba,
            CssColor::Rgba { alpha, .. } if (alpha - 0.25).abs() < f32::EPSILON
        ));
    }

    #[test]
    fn rejects_out_of_range_channels() {
        assert!("rgb(256, 0, 0)".parse::<CssColor>().is_err());
        assert!("rgba(0, 0, 0, 1.5)".parse::<CssColor>().is_err());
        assert!("rgb(0, 0)".parse::<CssColor>().is_err());
    }

    #[test]
    fn variables_are_opaque() {
        let color: CssColor = "var(--not even(checked".parse().unwrap();
        assert!(color.is_variable());
        assert_eq!(color.channels(), None);
        assert_eq!(color.to_string(), "var(--not even(checked");
    }

    #[test]
    fn serde_uses_css_text() {
        let color: CssColor = serde_json::from_str("\"rgb(4, 5, 6)\"").unwrap();
        assert_eq!(serde_json::to_string(&color).unwrap(), "\"rgb(4, 5, 6)\"");
        assert!(serde_json::from_str::<CssColor>("\"blue\"").is_err());
    }
}
