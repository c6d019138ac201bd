//! Amount type for expense values.
//!
//! An `Amount` is any finite floating point number. There is no currency, no sign restriction and
//! no limit on decimal places.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::num::ParseFloatError;
use std::str::FromStr;

/// Represents the amount of an expense.
///
/// # Examples
///
/// ```
/// # use expense_tracker::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("54.30").unwrap();
/// assert_eq!(amount.to_string(), "54.3");
/// assert!(Amount::from_str("inf").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Amount(f64);

impl Amount {
    /// Creates a new `Amount`, rejecting values that are not finite.
    pub fn new(value: f64) -> Result<Self, AmountError> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(AmountError::NotFinite)
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// An error that can occur when parsing strings into `Amount` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    Unparseable(ParseFloatError),
    NotFinite,
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Unparseable(e) => Display::fmt(e, f),
            AmountError::NotFinite => f.write_str("amount must be a finite number"),
        }
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AmountError::Unparseable(e) => Some(e),
            AmountError::NotFinite => None,
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = f64::from_str(s.trim()).map_err(AmountError::Unparseable)?;
        Amount::new(value)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
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
