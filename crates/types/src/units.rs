//! Fixed-point length unit used by every geometry computation.
//!
//! One point is stored as 1000 internal units in an `i64`. All layout
//! arithmetic and comparisons happen on the integer representation so that
//! repeated passes over the same content produce bit-identical results.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Internal units per typographic point.
pub const UNITS_PER_POINT: i64 = 1000;

/// A length in micro-points (1pt = 1000 units).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pt(i64);

impl Pt {
    pub const ZERO: Pt = Pt(0);
    pub const MAX: Pt = Pt(i64::MAX / 4);

    /// Creates a length from whole points.
    pub const fn pt(points: i64) -> Pt {
        Pt(points * UNITS_PER_POINT)
    }

    /// Creates a length from raw internal units.
    pub const fn from_units(units: i64) -> Pt {
        Pt(units)
    }

    /// Converts a decimal point value, rounding to the nearest unit.
    /// Non-finite input yields zero.
    pub fn from_f64(points: f64) -> Pt {
        if !points.is_finite() {
            return Pt::ZERO;
        }
        let units = (points * UNITS_PER_POINT as f64).round();
        Pt(units.clamp(-(Pt::MAX.0 as f64), Pt::MAX.0 as f64) as i64)
    }

    pub const fn units(self) -> i64 {
        self.0
    }

    /// Lossy conversion for display and for writers that need floats.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / UNITS_PER_POINT as f64
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn max(self, other: Pt) -> Pt {
        if self >= other { self } else { other }
    }

    pub fn min(self, other: Pt) -> Pt {
        if self <= other { self } else { other }
    }

    pub fn clamp_non_negative(self) -> Pt {
        self.max(Pt::ZERO)
    }

    /// `self * num / den` with round-half-away-from-zero, computed in `i128`.
    pub fn mul_ratio(self, num: i64, den: i64) -> Pt {
        if den == 0 {
            return Pt::ZERO;
        }
        Pt(div_round(self.0 as i128 * num as i128, den as i128) as i64)
    }

    /// Resolves a percentage given in basis points (1% = 100).
    pub fn percent_bp(self, basis_points: i64) -> Pt {
        self.mul_ratio(basis_points, 10_000)
    }
}

fn div_round(num: i128, den: i128) -> i128 {
    let half = den.abs() / 2;
    if (num >= 0) == (den > 0) {
        (num + half * den.signum()) / den
    } else {
        (num - half * den.signum()) / den
    }
}

impl Add for Pt {
    type Output = Pt;
    fn add(self, rhs: Pt) -> Pt {
        Pt(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Pt {
    fn add_assign(&mut self, rhs: Pt) {
        *self = *self + rhs;
    }
}

impl Sub for Pt {
    type Output = Pt;
    fn sub(self, rhs: Pt) -> Pt {
        Pt(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Pt {
    fn sub_assign(&mut self, rhs: Pt) {
        *self = *self - rhs;
    }
}

impl Neg for Pt {
    type Output = Pt;
    fn neg(self) -> Pt {
        Pt(-self.0)
    }
}

impl Mul<i64> for Pt {
    type Output = Pt;
    fn mul(self, rhs: i64) -> Pt {
        Pt(self.0.saturating_mul(rhs))
    }
}

impl Div<i64> for Pt {
    type Output = Pt;
    fn div(self, rhs: i64) -> Pt {
        self.mul_ratio(1, rhs)
    }
}

impl Sum for Pt {
    fn sum<I: Iterator<Item = Pt>>(iter: I) -> Pt {
        iter.fold(Pt::ZERO, |acc, v| acc + v)
    }
}

impl fmt::Display for Pt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / UNITS_PER_POINT;
        let frac = (self.0 % UNITS_PER_POINT).abs();
        let sign = if self.0 < 0 && whole == 0 { "-" } else { "" };
        if frac == 0 {
            write!(f, "{sign}{whole}pt")
        } else {
            let digits = format!("{frac:03}");
            write!(f, "{sign}{whole}.{}pt", digits.trim_end_matches('0'))
        }
    }
}

impl Serialize for Pt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Pt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let points = f64::deserialize(deserializer)?;
        Ok(Pt::from_f64(points))
    }
}
