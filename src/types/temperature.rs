// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Temperature readings and comfort bands.
//!
//! A room's background color follows its temperature. The real line is split
//! into five half-open bands, each owning a display color:
//!
//! | Band | Interval (°C) |
//! |------|---------------|
//! | [`TemperatureBand::Cold`] | (-∞, 17) |
//! | [`TemperatureBand::Cool`] | [17, 18) |
//! | [`TemperatureBand::Comfortable`] | [18, 24) |
//! | [`TemperatureBand::Warm`] | [24, 27) |
//! | [`TemperatureBand::Hot`] | [27, +∞) |
//!
//! A value sitting exactly on a boundary belongs to the upper band.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

use super::CssColor;

/// Unit a temperature sensor reports in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnit {
    /// Degrees Celsius.
    #[default]
    Celsius,
    /// Degrees Fahrenheit.
    Fahrenheit,
}

impl TemperatureUnit {
    /// Interprets a `unit_of_measurement` attribute.
    ///
    /// `°F` and `F` select Fahrenheit; anything else, including a missing
    /// attribute, is treated as Celsius.
    #[must_use]
    pub fn from_unit_of_measurement(unit: Option<&str>) -> Self {
        match unit.map(str::trim) {
            Some("°F" | "F" | "℉") => Self::Fahrenheit,
            _ => Self::Celsius,
        }
    }

    /// Returns the display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }
}

/// A temperature reading with its unit.
///
/// # Examples
///
/// ```
/// use room_card::types::{Temperature, TemperatureBand};
///
/// let reading = Temperature::fahrenheit(82.0).unwrap();
/// assert_eq!(reading.band(), TemperatureBand::Hot);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    value: f64,
    unit: TemperatureUnit,
}

impl Temperature {
    /// Creates a reading.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::NotFinite`] for NaN or infinite readings.
    pub fn new(value: f64, unit: TemperatureUnit) -> Result<Self, ValueError> {
        if !value.is_finite() {
            return Err(ValueError::NotFinite(value));
        }
        Ok(Self { value, unit })
    }

    /// Creates a Celsius reading.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::NotFinite`] for NaN or infinite readings.
    pub fn celsius(value: f64) -> Result<Self, ValueError> {
        Self::new(value, TemperatureUnit::Celsius)
    }

    /// Creates a Fahrenheit reading.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::NotFinite`] for NaN or infinite readings.
    pub fn fahrenheit(value: f64) -> Result<Self, ValueError> {
        Self::new(value, TemperatureUnit::Fahrenheit)
    }

    /// Returns the raw value in the reading's own unit.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Returns the reading's unit.
    #[must_use]
    pub const fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    /// Returns the reading converted to Celsius.
    #[must_use]
    pub fn to_celsius(&self) -> f64 {
        match self.unit {
            TemperatureUnit::Celsius => self.value,
            TemperatureUnit::Fahrenheit => (self.value - 32.0) * 5.0 / 9.0,
        }
    }

    /// Returns the comfort band the reading falls into.
    #[must_use]
    pub fn band(&self) -> TemperatureBand {
        TemperatureBand::for_celsius(self.to_celsius())
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}{}", self.value, self.unit.symbol())
    }
}

/// One of five comfort bands partitioning the temperature axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureBand {
    /// Below 17 °C.
    Cold,
    /// 17 °C up to 18 °C.
    Cool,
    /// 18 °C up to 24 °C.
    Comfortable,
    /// 24 °C up to 27 °C.
    Warm,
    /// 27 °C and above.
    Hot,
}

impl TemperatureBand {
    /// All bands, coldest first.
    pub const ALL: [Self; 5] = [
        Self::Cold,
        Self::Cool,
        Self::Comfortable,
        Self::Warm,
        Self::Hot,
    ];

    /// Classifies a Celsius value.
    ///
    /// NaN is not ordered against any bound and lands in `Hot`; callers
    /// construct readings through [`Temperature::new`], which rejects it.
    #[must_use]
    pub fn for_celsius(celsius: f64) -> Self {
        Self::ALL
            .into_iter()
            .find(|band| {
                let (lower, upper) = band.interval();
                celsius >= lower && celsius < upper
            })
            .unwrap_or(Self::Hot)
    }

    /// Returns the band's `[lower, upper)` interval in Celsius.
    #[must_use]
    pub const fn interval(self) -> (f64, f64) {
        match self {
            Self::Cold => (f64::NEG_INFINITY, 17.0),
            Self::Cool => (17.0, 18.0),
            Self::Comfortable => (18.0, 24.0),
            Self::Warm => (24.0, 27.0),
            Self::Hot => (27.0, f64::INFINITY),
        }
    }

    /// Returns the built-in display color for the band.
    #[must_use]
    pub const fn default_color(self) -> CssColor {
        match self {
            Self::Cold => CssColor::hex(0x4F, 0x8C, 0xD6),
            Self::Cool => CssColor::hex(0x7F, 0xC8, 0xE0),
            Self::Comfortable => CssColor::hex(0x8B, 0xC3, 0x4A),
            Self::Warm => CssColor::hex(0xF5, 0xA6, 0x23),
            Self::Hot => CssColor::hex(0xE5, 0x48, 0x3B),
        }
    }

    /// Returns the band's configuration key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cold => "cold",
            Self::Cool => "cool",
            Self::Comfortable => "comfortable",
            Self::Warm => "warm",
            Self::Hot => "hot",
        }
    }
}

impl fmt::Display for TemperatureBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemperatureBand {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|band| band.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValueError::UnknownBand(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fahrenheit_readings_map_to_bands() {
        assert_eq!(
            Temperature::fahrenheit(60.9).unwrap().band(),
            TemperatureBand::Cold
        );
        assert_eq!(
            Temperature::fahrenheit(65.0).unwrap().band(),
            TemperatureBand::Comfortable
        );
        assert_eq!(
            Temperature::fahrenheit(82.0).unwrap().band(),
            TemperatureBand::Hot
        );
    }

    #[test]
    fn boundary_belongs_to_upper_band() {
        assert_eq!(TemperatureBand::for_celsius(17.0), TemperatureBand::Cool);
        assert_eq!(TemperatureBand::for_celsius(18.0), TemperatureBand::Comfortable);
        assert_eq!(TemperatureBand::for_celsius(24.0), TemperatureBand::Warm);
        assert_eq!(TemperatureBand::for_celsius(27.0), TemperatureBand::Hot);
        assert_eq!(TemperatureBand::for_celsius(16.999), TemperatureBand::Cold);
    }

    #[test]
    fn bands_partition_the_axis() {
        for pair in TemperatureBand::ALL.windows(2) {
            assert!((pair[0].interval().1 - pair[1].interval().0).abs() < f64::EPSILON);
        }
        assert_eq!(TemperatureBand::for_celsius(-273.15), TemperatureBand::Cold);
        assert_eq!(TemperatureBand::for_celsius(1000.0), TemperatureBand::Hot);
    }

    #[test]
    fn non_finite_reading_rejected() {
        assert!(Temperature::celsius(f64::NAN).is_err());
        assert!(Temperature::celsius(f64::INFINITY).is_err());
    }

    #[test]
    fn unit_from_attribute() {
        assert_eq!(
            TemperatureUnit::from_unit_of_measurement(Some("°F")),
            TemperatureUnit::Fahrenheit
        );
        assert_eq!(
            TemperatureUnit::from_unit_of_measurement(Some("°C")),
            TemperatureUnit::Celsius
        );
        assert_eq!(
            TemperatureUnit::from_unit_of_measurement(None),
            TemperatureUnit::Celsius
        );
    }

    #[test]
    fn band_parse_and_display() {
        assert_eq!("Warm".parse::<TemperatureBand>().unwrap(), TemperatureBand::Warm);
        assert!("tepid".parse::<TemperatureBand>().is_err());
        assert_eq!(TemperatureBand::Comfortable.to_string(), "comfortable");
    }

    #[test]
    fn temperature_display() {
        assert_eq!(Temperature::celsius(21.04).unwrap().to_string(), "21.0°C");
    }
}
