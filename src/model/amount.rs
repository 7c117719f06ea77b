//! Amount type for handling monetary values as they appear in spreadsheets.
//!
//! Spreadsheet cells come back formatted: `$1,200.00`, `-$5.75`, `(42.10)` or plain `12.5`.
//! `Amount` wraps `Decimal`, remembers how the value was written, and writes it back the same way.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Whether a dollar sign and thousands separators were present when the amount was parsed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmountFormat {
    dollar: bool,
    commas: bool,
}

impl AmountFormat {
    pub const PLAIN: AmountFormat = AmountFormat {
        dollar: false,
        commas: false,
    };

    pub const CURRENCY: AmountFormat = AmountFormat {
        dollar: true,
        commas: true,
    };
}

/// A monetary amount.
///
/// Equality includes the format, so compare `value()` when you care about the number only.
///
/// ```
/// # use budgeteer::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("$1,200.00").unwrap();
/// let b = Amount::from_str("1200").unwrap();
/// assert_eq!(a.to_string(), "$1,200.00");
/// assert_eq!(b.to_string(), "1200");
/// assert_eq!(a.value(), b.value());
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount {
    value: Decimal,
    format: AmountFormat,
}

impl Amount {
    pub const ZERO: Amount = Amount::new(Decimal::ZERO);

    /// Creates a plain (no dollar sign, no commas) amount.
    pub const fn new(value: Decimal) -> Self {
        Self {
            value,
            format: AmountFormat::PLAIN,
        }
    }

    pub const fn new_with_format(value: Decimal, format: AmountFormat) -> Self {
        Self { value, format }
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn format(&self) -> AmountFormat {
        self.format
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.value.is_sign_negative()
    }
}

/// An error that can occur when parsing a string into an `Amount`.
pub struct AmountError {
    input: String,
    source: rust_decimal::Error,
}

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "AmountError({:?}, {:?})", self.input, self.source)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not an amount: {}", self.input, self.source)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parses `12.50`, `-12.50`, `$12.50`, `-$12.50`, `$-12.50`, `(12.50)` and any of those with
    /// thousands separators. An empty string is zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::ZERO);
        }

        let (negative, body) = match trimmed
            .strip_prefix('(')
            .and_then(|inner| inner.strip_suffix(')'))
        {
            Some(inner) => (true, inner.trim()),
            None => match trimmed.strip_prefix('-') {
                Some(rest) => (true, rest.trim_start()),
                None => (false, trimmed),
            },
        };

        let (dollar, body) = match body.strip_prefix('$') {
            Some(rest) => (true, rest),
            None => (false, body),
        };

        // `$-12.50` puts the sign after the dollar sign.
        let (negative, body) = match body.strip_prefix('-') {
            Some(rest) => (!negative, rest),
            None => (negative, body),
        };

        let digits = body.replace(',', "");
        let commas = digits.len() < body.len();

        let magnitude = Decimal::from_str(&digits).map_err(|source| AmountError {
            input: s.to_string(),
            source,
        })?;
        let value = if negative { -magnitude } else { magnitude };

        Ok(Amount {
            value,
            format: AmountFormat { dollar, commas },
        })
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let dollar = if self.format.dollar { "$" } else { "" };
        let magnitude = self.value.abs();
        if self.format.commas {
            write!(
                f,
                "{sign}{dollar}{}",
                format_num::format_num!(",.2", magnitude.to_f64().unwrap_or_default())
            )
        } else {
            write!(f, "{sign}{dollar}{magnitude}")
        }
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value
    }
}

impl Add for Amount {
    type Output = Amount;

    /// The result takes the format of the left-hand side.
    fn add(self, rhs: Self) -> Self::Output {
        Amount::new_with_format(self.value + rhs.value, self.format)
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount::new_with_format(self.value - rhs.value, self.format)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}
