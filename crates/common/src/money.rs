//! Monetary amounts in minor units.

use serde::{Deserialize, Serialize};

/// Money amount held in minor units (kopecks, cents) to avoid float drift.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money {
    minor: i64,
}

impl Money {
    /// Creates an amount from minor units (e.g. 189000 = 1890.00).
    pub const fn from_minor(minor: i64) -> Self {
        Self { minor }
    }

    /// Converts a decimal major-unit amount, rounding to the nearest minor unit.
    ///
    /// Returns `None` for NaN, infinities and values outside the `i64` range.
    pub fn from_major(major: f64) -> Option<Self> {
        let minor = (major * 100.0).round();
        if !minor.is_finite() || minor < i64::MIN as f64 || minor > i64::MAX as f64 {
            return None;
        }
        Some(Self {
            minor: minor as i64,
        })
    }

    /// Returns the amount in major units, for wire formats that carry decimals.
    pub fn to_major(&self) -> f64 {
        self.minor as f64 / 100.0
    }

    /// Returns zero money.
    pub const fn zero() -> Self {
        Self { minor: 0 }
    }

    /// Returns the amount in minor units.
    pub const fn minor(&self) -> i64 {
        self.minor
    }

    /// Returns true if the amount is below zero.
    pub const fn is_negative(&self) -> bool {
        self.minor < 0
    }

    /// Multiplies by a quantity, saturating at the bounds of `i64`.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            minor: self.minor.saturating_mul(i64::from(quantity)),
        }
    }

    /// Multiplies by a quantity, or `None` on overflow.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.minor
            .checked_mul(i64::from(quantity))
            .map(Money::from_minor)
    }

    /// Adds two amounts, or `None` on overflow.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.minor.checked_add(rhs.minor).map(Money::from_minor)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.minor < 0 { "-" } else { "" };
        let abs = self.minor.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            minor: self.minor.saturating_add(rhs.minor),
        }
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}
