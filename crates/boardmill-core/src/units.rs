//! Length quantities
//!
//! All dimensions are carried as integer micrometres until G-code rendering.
//! Keeping the base unit integral makes diameters usable as exact map keys
//! and lets mixed mm/inch/mil inputs coexist without precision loss.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Micrometres per millimetre.
pub const UM_PER_MM: f64 = 1_000.0;
/// Micrometres per inch.
pub const UM_PER_INCH: f64 = 25_400.0;
/// Micrometres per mil (thou).
pub const UM_PER_MIL: f64 = 25.4;

/// A length quantity, stored as integer micrometres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Length(i64);

impl Length {
    /// Zero length.
    pub const ZERO: Length = Length(0);

    /// Create a length from micrometres.
    pub const fn from_um(um: i64) -> Self {
        Length(um)
    }

    /// Create a length from millimetres.
    pub fn from_mm(mm: f64) -> Self {
        Length((mm * UM_PER_MM).round() as i64)
    }

    /// Create a length from inches.
    pub fn from_inches(inches: f64) -> Self {
        Length((inches * UM_PER_INCH).round() as i64)
    }

    /// Create a length from mils (thousandths of an inch).
    pub fn from_mils(mils: f64) -> Self {
        Length((mils * UM_PER_MIL).round() as i64)
    }

    /// The value in micrometres.
    pub const fn as_um(&self) -> i64 {
        self.0
    }

    /// The value in millimetres.
    pub fn as_mm(&self) -> f64 {
        self.0 as f64 / UM_PER_MM
    }

    /// The value in inches.
    pub fn as_inches(&self) -> f64 {
        self.0 as f64 / UM_PER_INCH
    }

    /// Absolute value.
    pub fn abs(&self) -> Length {
        Length(self.0.abs())
    }

    /// True when strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Add for Length {
    type Output = Length;
    fn add(self, rhs: Length) -> Length {
        Length(self.0 + rhs.0)
    }
}

impl Sub for Length {
    type Output = Length;
    fn sub(self, rhs: Length) -> Length {
        Length(self.0 - rhs.0)
    }
}

impl Neg for Length {
    type Output = Length;
    fn neg(self) -> Length {
        Length(-self.0)
    }
}

impl AddAssign for Length {
    fn add_assign(&mut self, rhs: Length) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Length {
    fn sub_assign(&mut self, rhs: Length) {
        self.0 -= rhs.0;
    }
}

impl Mul<f64> for Length {
    type Output = Length;
    fn mul(self, rhs: f64) -> Length {
        Length((self.0 as f64 * rhs).round() as i64)
    }
}

impl Div<f64> for Length {
    type Output = Length;
    fn div(self, rhs: f64) -> Length {
        Length((self.0 as f64 / rhs).round() as i64)
    }
}

/// Ratio of two lengths.
impl Div<Length> for Length {
    type Output = f64;
    fn div(self, rhs: Length) -> f64 {
        self.0 as f64 / rhs.0 as f64
    }
}

impl Sum for Length {
    fn sum<I: Iterator<Item = Length>>(iter: I) -> Length {
        Length(iter.map(|l| l.0).sum())
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}mm", self.as_mm())
    }
}

impl FromStr for Length {
    type Err = crate::error::CoreError;

    /// Parse a length with an optional unit suffix.
    ///
    /// Recognized suffixes: `mm`, `um`, `mil`, `thou`, `in`, `inch`.
    /// A bare number is taken as millimetres.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (value, unit) = match s.find(|c: char| c.is_ascii_alphabetic()) {
            Some(pos) => (&s[..pos], s[pos..].trim()),
            None => (s, "mm"),
        };
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| crate::error::CoreError::InvalidLength(s.to_string()))?;

        match unit {
            "mm" => Ok(Length::from_mm(value)),
            "um" => Ok(Length::from_um(value.round() as i64)),
            "mil" | "thou" => Ok(Length::from_mils(value)),
            "in" | "inch" => Ok(Length::from_inches(value)),
            _ => Err(crate::error::CoreError::InvalidLength(s.to_string())),
        }
    }
}

// Settings and inventory files carry lengths as plain millimetre floats.
impl Serialize for Length {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_mm())
    }
}

impl<'de> Deserialize<'de> for Length {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mm = f64::deserialize(deserializer)?;
        Ok(Length::from_mm(mm))
    }
}

/// Shorthand constructor: `mm(0.8)`.
pub fn mm(value: f64) -> Length {
    Length::from_mm(value)
}

/// Shorthand constructor: `um(800)`.
pub fn um(value: i64) -> Length {
    Length::from_um(value)
}

/// Shorthand constructor: `inches(0.5)`.
pub fn inches(value: f64) -> Length {
    Length::from_inches(value)
}
