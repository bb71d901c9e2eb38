use serde::{Deserialize, Serialize};

/// Monetary amount stored as integer cents to avoid floating point drift.
///
/// Prices travel on the wire as plain `i64` cents (`*_cents` fields), so the
/// type serializes transparently. `Add`/`Sub` are plain `i64` arithmetic;
/// callers that multiply by an untrusted quantity use [`Money::checked_mul`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates an amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates an amount from whole currency units (e.g. dollars or euros).
    pub fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies the amount by a quantity, or `None` on `i64` overflow.
    pub fn checked_mul(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_units_scales_to_cents() {
        assert_eq!(Money::from_units(10).cents(), 1000);
    }

    #[test]
    fn checked_mul_by_quantity() {
        let unit = Money::from_cents(1000);
        assert_eq!(unit.checked_mul(3), Some(Money::from_cents(3000)));
        assert_eq!(unit.checked_mul(0), Some(Money::zero()));
    }

    #[test]
    fn checked_mul_detects_overflow() {
        assert_eq!(Money::from_cents(i64::MAX).checked_mul(2), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_mul(1).unwrap().cents(), i64::MAX);
    }

    #[test]
    fn arithmetic() {
        let a = Money::from_cents(1500);
        let b = Money::from_cents(500);
        assert_eq!((a + b).cents(), 2000);
        assert_eq!((a - b).cents(), 1000);

        let mut total = Money::zero();
        total += a;
        total += b;
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn display_formats_cents() {
        assert_eq!(Money::from_cents(1234).to_string(), "12.34");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-250).to_string(), "-2.50");
    }

    #[test]
    fn serializes_as_plain_cents() {
        let json = serde_json::to_string(&Money::from_cents(999)).unwrap();
        assert_eq!(json, "999");
    }
}
