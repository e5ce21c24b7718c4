use crate::error::DomainError;
use alloy_primitives::Address;
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A listed token.
///
/// The chain's native asset is listed with `is_native` set and the zero
/// address; contract calls route it through the wrapped-native token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(default, rename = "logoURI", skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(default)]
    pub is_native: bool,
}

impl Token {
    pub fn new(
        address: Address,
        symbol: impl Into<String>,
        decimals: u8,
        name: impl Into<String>,
    ) -> Self {
        Self {
            address,
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            logo_uri: None,
            is_native: false,
        }
    }

    /// Creates the native-asset entry for a chain.
    pub fn native(symbol: impl Into<String>, decimals: u8, name: impl Into<String>) -> Self {
        Self {
            is_native: true,
            ..Self::new(Address::ZERO, symbol, decimals, name)
        }
    }

    /// Address used in contract calls, substituting the wrapped-native
    /// token for the native asset.
    pub fn contract_address(&self, wrapped_native: Address) -> Address {
        if self.is_native {
            wrapped_native
        } else {
            self.address
        }
    }
}

/// A raw on-chain amount in the token's smallest unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenAmount(pub U256);

impl TokenAmount {
    pub fn new(amount: impl Into<U256>) -> Self {
        Self(amount.into())
    }

    pub fn zero() -> Self {
        Self(U256::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    /// Parses a human decimal string ("1.5") into raw units.
    ///
    /// Fractions longer than `decimals` are rejected rather than rounded,
    /// matching the behaviour of the wallet libraries the contracts are
    /// usually driven with.
    pub fn parse_units(text: &str, decimals: u8) -> Result<Self, DomainError> {
        let text = text.trim();
        let (whole, fraction) = match text.split_once('.') {
            Some((w, f)) => (w, f),
            None => (text, ""),
        };
        let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction)
        {
            return Err(DomainError::InvalidAmount(text.to_string()));
        }
        if fraction.len() > decimals as usize {
            return Err(DomainError::InvalidAmount(format!(
                "{text} has more than {decimals} decimals"
            )));
        }

        let mut digits = String::with_capacity(whole.len() + decimals as usize);
        digits.push_str(whole);
        digits.push_str(fraction);
        digits.extend(std::iter::repeat_n('0', decimals as usize - fraction.len()));
        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            return Ok(Self::zero());
        }

        U256::from_dec_str(digits)
            .map(Self)
            .map_err(|_| DomainError::InvalidAmount(text.to_string()))
    }

    /// Like [`TokenAmount::parse_units`], but any invalid input reads as
    /// zero. Used for text typed by a user mid-keystroke.
    pub fn parse_units_or_zero(text: &str, decimals: u8) -> Self {
        Self::parse_units(text, decimals).unwrap_or_default()
    }

    /// Formats raw units as a human decimal string with trailing zeros
    /// removed.
    pub fn format_units(&self, decimals: u8) -> String {
        let digits = self.0.to_string();
        let decimals = decimals as usize;
        if decimals == 0 {
            return digits;
        }

        let padded = if digits.len() <= decimals {
            format!("{}{}", "0".repeat(decimals - digits.len() + 1), digits)
        } else {
            digits
        };
        let (whole, fraction) = padded.split_at(padded.len() - decimals);
        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            whole.to_string()
        } else {
            format!("{whole}.{fraction}")
        }
    }

    /// Converts to a human-unit decimal. Values outside `Decimal`'s range
    /// read as zero.
    pub fn to_decimal(&self, decimals: u8) -> Decimal {
        Decimal::from_str(&self.format_units(decimals)).unwrap_or(Decimal::ZERO)
    }

    /// Converts a human-unit decimal back to raw units, truncating digits
    /// beyond the token's precision. Negative values read as zero.
    pub fn from_decimal(value: Decimal, decimals: u8) -> Self {
        if value.is_sign_negative() {
            return Self::zero();
        }
        let truncated = value
            .round_dp_with_strategy(u32::from(decimals), rust_decimal::RoundingStrategy::ToZero)
            .normalize();
        Self::parse_units_or_zero(&truncated.to_string(), decimals)
    }
}

impl From<u64> for TokenAmount {
    fn from(v: u64) -> Self {
        Self(U256::from(v))
    }
}

impl From<u128> for TokenAmount {
    fn from(v: u128) -> Self {
        Self(U256::from(v))
    }
}

impl From<U256> for TokenAmount {
    fn from(v: U256) -> Self {
        Self(v)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
