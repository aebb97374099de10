//! Fixed-point math utilities for deterministic simulation.
//!
//! All battle simulation uses fixed-point arithmetic so that the same
//! inputs produce bit-identical outcomes on every machine. Floats only
//! appear at the edges (data files, the JSON protocol) and are converted
//! once on entry.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Fixed-point position or displacement on the battlefield.
///
/// `x` runs across the field (lanes are split by its sign), `z` runs
/// along it (the teams' halves are split by its sign) and `y` is height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec3Fixed {
    /// Cross-field coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Height above the ground plane.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
    /// Along-field coordinate.
    #[serde(with = "fixed_serde")]
    pub z: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Serde support for fixed-point numbers written by hand in data files.
///
/// Values are read and written as decimal numbers (`1.5`, not raw bits).
/// Decimal parsing is deterministic, so a given file always yields the same
/// fixed-point value.
pub mod fixed_decimal {
    use super::Fixed;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.to_num::<f64>())
    }

    /// Deserialize a fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| D::Error::custom(format!("{value} is out of fixed-point range")))
    }
}

/// Serde support for optional fixed-point numbers written as decimals.
pub mod option_fixed_decimal {
    use super::Fixed;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    /// Serialize an optional fixed-point number as a decimal.
    pub fn serialize<S>(value: &Option<Fixed>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_some(&v.to_num::<f64>()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize an optional fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Fixed>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<f64>::deserialize(deserializer)? {
            Some(value) => Fixed::checked_from_num(value)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("{value} is out of fixed-point range"))),
            None => Ok(None),
        }
    }
}

impl Vec3Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Self { x, y, z }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
        z: Fixed::ZERO,
    };

    /// Squared straight-line distance over all three axes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let d = self - other;
        d.dot(d)
    }

    /// Squared distance on the ground plane, ignoring height.
    #[must_use]
    pub fn horizontal_distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx * dx + dz * dz
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Copy of this vector with the height zeroed.
    #[must_use]
    pub fn horizontal(self) -> Self {
        Self::new(self.x, Fixed::ZERO, self.z)
    }

    /// Scale every component by `factor`.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Normalize vector using fixed-point math.
    ///
    /// The zero vector normalizes to zero.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len_sq = self.dot(self);

        if len_sq == Fixed::ZERO {
            return Self::ZERO;
        }

        let len = fixed_sqrt(len_sq);
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len, self.z / len)
    }
}

/// Computes the square root of a fixed-point number using binary search.
///
/// Non-positive inputs return zero.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::ONE { value } else { Fixed::ONE };

    for _ in 0..48 {
        let mid = (low + high) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

impl std::ops::Add for Vec3Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl std::ops::Sub for Vec3Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64, z: f64) -> Vec3Fixed {
        Vec3Fixed::new(Fixed::from_num(x), Fixed::from_num(y), Fixed::from_num(z))
    }

    #[test]
    fn test_distance_squared_uses_all_axes() {
        let a = v(3.0, 0.0, 0.0);
        let b = v(0.0, 4.0, 12.0);
        // 3² + 4² + 12² = 169
        assert_eq!(a.distance_squared(b), Fixed::from_num(169));
    }

    #[test]
    fn test_horizontal_distance_ignores_height() {
        let a = v(0.0, 5.0, 0.0);
        let b = v(3.0, 0.0, 4.0);
        assert_eq!(a.horizontal_distance_squared(b), Fixed::from_num(25));
    }

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a, b);
        assert_eq!(a * Fixed::from_num(7), b * Fixed::from_num(7));
    }

    #[test]
    fn test_normalize_unit_length() {
        let norm = v(3.0, 0.0, 4.0).normalize();
        let len_sq = norm.dot(norm);
        let error = (len_sq - Fixed::ONE).abs();
        assert!(error < Fixed::from_num(0.0001), "len_sq = {len_sq}");
        assert!((norm.x - Fixed::from_num(0.6)).abs() < Fixed::from_num(0.0001));
        assert!((norm.z - Fixed::from_num(0.8)).abs() < Fixed::from_num(0.0001));
    }

    #[test]
    fn test_normalize_zero() {
        assert_eq!(Vec3Fixed::ZERO.normalize(), Vec3Fixed::ZERO);
    }

    #[test]
    fn test_fixed_sqrt() {
        assert_eq!(fixed_sqrt(Fixed::from_num(-4)), Fixed::ZERO);
        let root = fixed_sqrt(Fixed::from_num(2.25));
        assert!((root - Fixed::from_num(1.5)).abs() < Fixed::from_num(0.000_001));
        let root = fixed_sqrt(Fixed::from_num(0.25));
        assert!((root - Fixed::from_num(0.5)).abs() < Fixed::from_num(0.000_001));
    }

    #[test]
    fn test_fixed_decimal_round_trip_through_ron() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            #[serde(with = "fixed_decimal")]
            value: Fixed,
            #[serde(default, with = "option_fixed_decimal")]
            radius: Option<Fixed>,
        }

        let parsed: Wrapper = ron::from_str("(value: 1.5, radius: Some(2.0))").unwrap();
        assert_eq!(parsed.value, Fixed::from_num(1.5));
        assert_eq!(parsed.radius, Some(Fixed::from_num(2)));

        let parsed: Wrapper = ron::from_str("(value: 0.25)").unwrap();
        assert_eq!(parsed.radius, None);
    }
}
