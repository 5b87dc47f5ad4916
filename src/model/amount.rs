//! Amount type for handling euro values as the portal sends and displays them.
//!
//! This module provides the `Amount` type which wraps `Decimal`. It parses values that arrive as
//! JSON numbers, plain numeric strings or German-formatted strings, and displays them the way the
//! portal pages did: `-1.234,56 €`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents a euro amount.
///
/// Equality and ordering are numeric. Serialization writes a plain JSON number so that exported
/// data stays machine readable; `Display` is the German currency format.
///
/// # Examples
///
/// ```
/// # use portal_dash::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("-1234.5").unwrap();
/// assert_eq!(amount.to_string(), "-1.234,50 €");
/// ```
///
/// German formatting is accepted on input as well:
/// ```
/// # use portal_dash::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("1.234,56 €").unwrap();
/// let b = Amount::from_str("1234.56").unwrap();
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Creates a new Amount from a Decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is below zero. Zero is neither positive nor negative.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// The amount without its sign.
    pub fn abs(&self) -> Amount {
        Amount(self.0.abs())
    }

    /// A compact rendering for KPI cards: `1,23M €`, `12K €`, otherwise the full format.
    pub fn short(&self) -> String {
        let abs = self.0.abs();
        let sign = if self.is_negative() { "-" } else { "" };
        if abs >= Decimal::from(1_000_000) {
            let millions = (abs / Decimal::from(1_000_000))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            format!("{sign}{}M €", group_digits(millions, 2))
        } else if abs >= Decimal::from(1_000) {
            let thousands = (abs / Decimal::from(1_000))
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
            format!("{sign}{}K €", group_digits(thousands, 0))
        } else {
            self.to_string()
        }
    }
}

/// Formats `value` with German digit grouping (`.`) and decimal comma (`,`), with exactly
/// `precision` fraction digits. Only precisions 0 and 2 are used by the portal.
pub(crate) fn group_digits(value: Decimal, precision: u32) -> String {
    let rounded = value
        .abs()
        .round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    let f = rounded.to_f64().unwrap_or_default();
    let english = if precision == 0 {
        format_num::format_num!(",.0f", f)
    } else {
        format_num::format_num!(",.2f", f)
    };
    let german: String = english
        .chars()
        .map(|c| match c {
            ',' => '.',
            '.' => ',',
            other => other,
        })
        .collect();
    if value.is_sign_negative() && !rounded.is_zero() {
        format!("-{german}")
    } else {
        german
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Remove whitespace and the currency sign
        let trimmed = s.trim().trim_end_matches('€').trim();

        // Handle empty string
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        // A comma means German formatting: dots group thousands and the comma is the decimal mark
        let normalized = if trimmed.contains(',') {
            trimmed.replace('.', "").replace(',', ".")
        } else {
            trimmed.to_string()
        };

        let value = Decimal::from_str(&normalized)
            .or_else(|_| Decimal::from_scientific(&normalized))
            .map_err(AmountError)?;
        Ok(Amount(value))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} €", group_digits(self.0, 2))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.0.to_f64().unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = crate::model::de::opt_decimal(deserializer)?;
        Ok(Amount(value.unwrap_or_default()))
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
