//! Price - minor-unit amount with decimal serde support
//!
//! Prices travel over the wire as JSON numbers (`0.0004`) or decimal strings
//! (`"0.0004"`) but are always held as an integer count of minor units
//! (6 decimals, same as USDC). Budget arithmetic never touches floats.

use ethers::types::U256;
use ethers::utils::{format_units, parse_units};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number of decimals in one whole unit of the payment asset
pub const PRICE_DECIMALS: u32 = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(u64);

impl Price {
    pub const ZERO: Price = Price(0);

    pub const fn from_minor_units(minor: u64) -> Self {
        Self(minor)
    }

    pub const fn minor_units(&self) -> u64 {
        self.0
    }

    pub fn as_u256(&self) -> U256 {
        U256::from(self.0)
    }

    /// Parse a decimal amount such as "0.0004" or "4"
    pub fn parse_decimal(value: &str) -> Result<Self, String> {
        let cleaned = value.trim().trim_matches('"');
        if cleaned.is_empty() {
            return Err("Empty price".to_string());
        }
        if cleaned.starts_with('-') {
            return Err(format!("Negative price: {}", cleaned));
        }
        // parse_units drops extra fractional digits instead of failing
        if let Some((_, fraction)) = cleaned.split_once('.') {
            if fraction.trim_end_matches('0').len() > PRICE_DECIMALS as usize {
                return Err(format!("Price has more than {} decimals: {}", PRICE_DECIMALS, cleaned));
            }
        }

        let units = parse_units(cleaned, PRICE_DECIMALS)
            .map_err(|e| format!("Invalid price '{}': {}", cleaned, e))?;
        Self::try_from(U256::from(units))
    }

    /// Convert a JSON-style float. Goes through the shortest decimal
    /// representation so 0.0004 stays 400 minor units.
    pub fn from_f64(value: f64) -> Result<Self, String> {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("Invalid price: {}", value));
        }
        Self::parse_decimal(&value.to_string())
    }

    /// Decimal string with trailing zeros trimmed ("0.0004", "4")
    pub fn to_decimal_string(&self) -> String {
        match format_units(self.as_u256(), PRICE_DECIMALS) {
            Ok(s) if s.contains('.') => s.trim_end_matches('0').trim_end_matches('.').to_string(),
            Ok(s) => s,
            Err(_) => format!("{} minor units", self.0),
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 10f64.powi(PRICE_DECIMALS as i32)
    }

    pub fn checked_add(self, other: Price) -> Option<Price> {
        self.0.checked_add(other.0).map(Price)
    }

    pub fn checked_sub(self, other: Price) -> Option<Price> {
        self.0.checked_sub(other.0).map(Price)
    }

    pub fn saturating_sub(self, other: Price) -> Price {
        Price(self.0.saturating_sub(other.0))
    }
}

impl TryFrom<U256> for Price {
    type Error = String;

    fn try_from(value: U256) -> Result<Self, Self::Error> {
        if value > U256::from(u64::MAX) {
            return Err(format!("Price out of range: {}", value));
        }
        Ok(Price(value.as_u64()))
    }
}

impl FromStr for Price {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_decimal(s)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal_string())
    }
}

impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PriceVisitor;

        impl<'de> Visitor<'de> for PriceVisitor {
            type Value = Price;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a non-negative decimal price as a number or string")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Price::parse_decimal(value).map_err(de::Error::custom)
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Price::parse_decimal(&value.to_string()).map_err(de::Error::custom)
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if value < 0 {
                    return Err(de::Error::custom(format!("Negative price: {}", value)));
                }
                self.visit_u64(value as u64)
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Price::from_f64(value).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_any(PriceVisitor)
    }
}
