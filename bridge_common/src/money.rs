use std::{fmt::Display, iter::Sum, ops::Add, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A monetary amount in hundredths of a currency unit.
///
/// Shopify reports prices as decimal strings (`"10.00"`), and Bitrix accepts JSON numbers on
/// writes but returns decimal strings on reads. `Cents` keeps the arithmetic and equality
/// comparisons exact by storing an integer count of cents, and converts at the serde boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cents(i64);

#[derive(Debug, Clone, Error)]
#[error("Invalid currency amount: {0}")]
pub struct MoneyParseError(String);

impl Cents {
    pub fn new(cents: i64) -> Self {
        Self(cents)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// The amount in whole currency units, as Bitrix expects it on the wire.
    pub fn to_units(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Add for Cents {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl From<i64> for Cents {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl FromStr for Cents {
    type Err = MoneyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (sign, s) = match s.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, s),
        };
        let mut parts = s.splitn(2, '.');
        let units = parts
            .next()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| MoneyParseError(s.to_string()))?
            .parse::<i64>()
            .map_err(|e| MoneyParseError(format!("{s}: {e}")))?;
        // Fractions are normalized to two digits, so "10.5" means 10.50, not 10.05.
        let cents = match parts.next() {
            None | Some("") => 0,
            Some(frac) => {
                let mut frac = frac.to_string();
                frac.truncate(2);
                let scale = if frac.len() == 1 { 10 } else { 1 };
                frac.parse::<i64>().map_err(|e| MoneyParseError(format!("{s}: {e}")))? * scale
            },
        };
        Ok(Self(sign * (units * 100 + cents)))
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Cents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_units())
    }
}

impl<'de> Deserialize<'de> for Cents {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Float(f64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Int(units) => Ok(Cents(units * 100)),
            Raw::Float(units) => Ok(Cents((units * 100.0).round() as i64)),
            Raw::Text(s) => s.parse().map_err(de::Error::custom),
        }
    }
}
