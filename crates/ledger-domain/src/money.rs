//! Fixed-point decimal quantities.
//!
//! Two distinct newtypes over [`rust_decimal::Decimal`] so the scale a value
//! is rounded to is part of its type rather than a convention callers have
//! to remember: [`Money`] for currency amounts (2 fractional digits) and
//! [`Units`] for asset quantities (4 fractional digits). Both round
//! half-to-even at their scale, and comparisons are tolerant per §3 of the
//! data model (0.01 for money, 0.0001 for units) rather than exact.
//!
//! Floating point never appears here; the one sanctioned exception in the
//! system is the XIRR solver, which works in `f64` internally and converts
//! back to [`Money`]/rate at its boundary.

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A monetary amount, always carried at 2 fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

/// The tolerance within which two `Money` values are considered equal,
/// per the data model's invariant checks (Σdebit = Σcredit within 0.01).
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// The tolerance within which two `Units` values are considered equal.
pub const UNITS_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Round `value` to 2 fractional digits, half-to-even.
    pub fn new(value: Decimal) -> Self {
        Money(value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
    }

    pub fn from_i64(whole: i64) -> Self {
        Money::new(Decimal::from(whole))
    }

    pub fn raw(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn abs(&self) -> Money {
        Money(self.0.abs())
    }

    pub fn max(self, other: Money) -> Money {
        if self.0 >= other.0 {
            self
        } else {
            other
        }
    }

    pub fn min(self, other: Money) -> Money {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    /// Whether `self` and `other` are equal within the 0.01 money tolerance.
    pub fn approx_eq(&self, other: &Money) -> bool {
        (self.0 - other.0).abs() <= MONEY_TOLERANCE
    }

    pub fn checked_mul_rate(&self, rate: Decimal) -> Money {
        Money::new(self.0 * rate)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money::new(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money::new(self.0 - rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::ZERO
    }
}

/// An asset quantity (units of a mutual-fund scheme, shares, grams of gold
/// bond...), always carried at 4 fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Units(Decimal);

impl Units {
    pub const ZERO: Units = Units(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Units(value.round_dp_with_strategy(4, RoundingStrategy::MidpointNearestEven))
    }

    pub fn raw(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn abs(&self) -> Units {
        Units(self.0.abs())
    }

    pub fn approx_eq(&self, other: &Units) -> bool {
        (self.0 - other.0).abs() <= UNITS_TOLERANCE
    }

    /// `self >= other` within the units tolerance (used for "enough units
    /// remaining to satisfy this sell" checks, per §4.3).
    pub fn at_least(&self, other: Units) -> bool {
        self.0 + UNITS_TOLERANCE >= other.0
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

impl Add for Units {
    type Output = Units;
    fn add(self, rhs: Units) -> Units {
        Units::new(self.0 + rhs.0)
    }
}

impl Sub for Units {
    type Output = Units;
    fn sub(self, rhs: Units) -> Units {
        Units::new(self.0 - rhs.0)
    }
}

impl AddAssign for Units {
    fn add_assign(&mut self, rhs: Units) {
        *self = *self + rhs;
    }
}

impl SubAssign for Units {
    fn sub_assign(&mut self, rhs: Units) {
        *self = *self - rhs;
    }
}

impl Default for Units {
    fn default() -> Self {
        Units::ZERO
    }
}
