//! Amount type for handling monetary values.
//!
//! `Amount` wraps `Decimal`. It parses values with or without a dollar sign and thousands
//! separators, and it deserializes leniently: a stored amount that is missing, not a number or
//! beyond `Amount::LIMIT` is read as zero so that totals never fail on a bad row.
//!
//! There are no arithmetic operators. Additions, subtractions and sums saturate at the bounds of
//! `Decimal` instead of overflowing.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::iter::Sum;
use std::str::FromStr;
use tracing::warn;

/// Represents a dollar amount.
///
/// # Examples
///
/// ```
/// # use budget_ledger::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("$1,200.00").unwrap();
/// assert_eq!(amount.to_string(), "$1,200.00");
/// assert_eq!(amount, Amount::from_str("1200").unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// The largest magnitude accepted from user input or storage: one quadrillion.
    pub const LIMIT: Amount = Amount(Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0));

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is below zero. Negative zero is not negative.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    pub fn abs(&self) -> Amount {
        Amount(self.0.abs())
    }

    /// True if the magnitude is at most `Amount::LIMIT`.
    pub fn is_within_limit(&self) -> bool {
        self.0.abs() <= Self::LIMIT.0
    }

    pub fn saturating_add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_sub(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_sub(rhs.0))
    }

    fn checked_new(value: Decimal) -> Result<Self, AmountError> {
        let amount = Amount(value);
        if amount.is_within_limit() {
            Ok(amount)
        } else {
            Err(AmountError::OutOfRange(value))
        }
    }
}

/// An error that can occur when parsing strings into `Amount` values.
#[derive(Debug)]
pub enum AmountError {
    Parse(rust_decimal::Error),
    OutOfRange(Decimal),
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Parse(e) => Display::fmt(e, f),
            AmountError::OutOfRange(value) => {
                write!(f, "{value} is beyond the largest amount allowed ({})", Amount::LIMIT)
            }
        }
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AmountError::Parse(e) => Some(e),
            AmountError::OutOfRange(_) => None,
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::ZERO);
        }

        // "-$50.00", "$50.00", "-50.00" and "50.00" are all accepted
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let digits = unsigned.strip_prefix('$').unwrap_or(unsigned).replace(',', "");

        let value = Decimal::from_str(&digits).map_err(AmountError::Parse)?;
        Amount::checked_new(if negative { -value } else { value })
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let num = self.0.abs().round_dp(2);
        write!(
            f,
            "{sign}${}",
            format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
        )
    }
}

/// Saturates at the bounds of `Decimal`.
impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Amount::saturating_add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, |acc, a| acc.saturating_add(*a))
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount(value)
    }
}

impl From<i32> for Amount {
    fn from(value: i32) -> Self {
        Amount(Decimal::from(value))
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount(Decimal::from(value))
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // A plain decimal string keeps full precision across every backend.
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LenientAmountVisitor)
    }
}

/// Accepts strings, numbers and nulls. Anything unreadable or out of range becomes zero.
struct LenientAmountVisitor;

fn lenient(value: Decimal) -> Amount {
    Amount::checked_new(value).unwrap_or_else(|e| {
        warn!("Treating amount as zero: {e}");
        Amount::ZERO
    })
}

impl<'de> Visitor<'de> for LenientAmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a monetary amount as a string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        Ok(Amount::from_str(v).unwrap_or_else(|e| {
            warn!("Treating unparseable amount '{v}' as zero: {e}");
            Amount::ZERO
        }))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Ok(lenient(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(lenient(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        Ok(Decimal::from_f64(v).map(lenient).unwrap_or_else(|| {
            warn!("Treating non-finite amount {v} as zero");
            Amount::ZERO
        }))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Amount, E> {
        warn!("Treating boolean amount {v} as zero");
        Ok(Amount::ZERO)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Amount, E> {
        Ok(Amount::ZERO)
    }

    fn visit_none<E: de::Error>(self) -> Result<Amount, E> {
        Ok(Amount::ZERO)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Amount, D::Error> {
        deserializer.deserialize_any(LenientAmountVisitor)
    }
}
