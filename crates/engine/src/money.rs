use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};

/// Signed money amount represented as **integer cents**.
///
/// Use this type for **all** monetary values in the engine (expense amounts,
/// balances, transfers, payments) to avoid floating-point drift.
///
/// The value is signed:
/// - positive = is owed money
/// - negative = owes money
///
/// # Examples
///
/// ```rust
/// use engine::MoneyCents;
///
/// let amount = MoneyCents::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Returns the magnitude of the amount.
    #[must_use]
    pub const fn abs(self) -> MoneyCents {
        MoneyCents(self.0.abs())
    }

    /// Returns the smaller of two amounts.
    #[must_use]
    pub fn min(self, other: MoneyCents) -> MoneyCents {
        MoneyCents(self.0.min(other.0))
    }

    /// Divides the amount by `divisor` cents-exactly, rounding half away
    /// from zero.
    ///
    /// This is the rounding used for equal shares and net balances, matching
    /// two-decimal half-up rounding on major units. `divisor` must be
    /// positive; the quotient stays exact for every input that fits in
    /// `i64` cents.
    ///
    /// ```rust
    /// use engine::MoneyCents;
    ///
    /// // 10.00 split three ways -> 3.33 each
    /// assert_eq!(MoneyCents::new(1000).div_round_half_up(3).cents(), 333);
    /// // 1.5 cents rounds away from zero
    /// assert_eq!(MoneyCents::new(3).div_round_half_up(2).cents(), 2);
    /// assert_eq!(MoneyCents::new(-3).div_round_half_up(2).cents(), -2);
    /// ```
    #[must_use]
    pub const fn div_round_half_up(self, divisor: i64) -> MoneyCents {
        let n = self.0;
        let d = divisor;
        let q = n / d;
        let r = n % d;
        // Round the remainder: away from zero on an exact half.
        if 2 * r.abs() >= d {
            if n < 0 {
                MoneyCents(q - 1)
            } else {
                MoneyCents(q + 1)
            }
        } else {
            MoneyCents(q)
        }
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_add(rhs.0).map(MoneyCents)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_sub(rhs.0).map(MoneyCents)
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let major = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}{major}.{cents:02}")
    }
}

impl From<i64> for MoneyCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<MoneyCents> for i64 {
    fn from(value: MoneyCents) -> Self {
        value.0
    }
}

impl Add for MoneyCents {
    type Output = MoneyCents;

    fn add(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0 + rhs.0)
    }
}

impl AddAssign for MoneyCents {
    fn add_assign(&mut self, rhs: MoneyCents) {
        self.0 += rhs.0;
    }
}

impl Sub for MoneyCents {
    type Output = MoneyCents;

    fn sub(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0 - rhs.0)
    }
}

impl SubAssign for MoneyCents {
    fn sub_assign(&mut self, rhs: MoneyCents) {
        self.0 -= rhs.0;
    }
}

impl Neg for MoneyCents {
    type Output = MoneyCents;

    fn neg(self) -> Self::Output {
        MoneyCents(-self.0)
    }
}

impl Sum for MoneyCents {
    fn sum<I: Iterator<Item = MoneyCents>>(iter: I) -> Self {
        iter.fold(MoneyCents::ZERO, |acc, v| acc + v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_minor_units() {
        assert_eq!(MoneyCents::new(0).to_string(), "0.00");
        assert_eq!(MoneyCents::new(1).to_string(), "0.01");
        assert_eq!(MoneyCents::new(10).to_string(), "0.10");
        assert_eq!(MoneyCents::new(1050).to_string(), "10.50");
        assert_eq!(MoneyCents::new(-1050).to_string(), "-10.50");
    }

    #[test]
    fn div_rounds_half_away_from_zero() {
        assert_eq!(MoneyCents::new(1000).div_round_half_up(3).cents(), 333);
        assert_eq!(MoneyCents::new(1001).div_round_half_up(3).cents(), 334);
        assert_eq!(MoneyCents::new(5).div_round_half_up(2).cents(), 3);
        assert_eq!(MoneyCents::new(-5).div_round_half_up(2).cents(), -3);
        assert_eq!(MoneyCents::new(-1000).div_round_half_up(3).cents(), -333);
        assert_eq!(MoneyCents::new(0).div_round_half_up(7).cents(), 0);
    }

    #[test]
    fn sum_over_iterator() {
        let total: MoneyCents = [100, -40, 15].into_iter().map(MoneyCents::new).sum();
        assert_eq!(total.cents(), 75);
    }
}
