//! Slippage tolerance and the transaction bounds derived from it.

use crate::error::DomainError;
use crate::math::{BPS_DENOMINATOR, mul_div_floor};
use crate::token::TokenAmount;
use primitive_types::U256;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Highest accepted tolerance, 50%.
pub const MAX_SLIPPAGE_BPS: u32 = 5_000;

/// Default tolerance, 0.5%.
pub const DEFAULT_SLIPPAGE_BPS: u32 = 50;

/// Quick-pick tolerances offered to the user, in basis points.
pub const SLIPPAGE_PRESETS_BPS: [u32; 4] = [10, 50, 100, 300];

/// Below this tolerance a transaction is likely to revert (0.05%).
const LOW_SLIPPAGE_WARNING_BPS: u32 = 5;

/// Above this tolerance the trade may execute at an unfavourable rate (5%).
const HIGH_SLIPPAGE_WARNING_BPS: u32 = 500;

/// User-accepted adverse price movement, stored in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct SlippageTolerance(u32);

/// Advisory shown next to the tolerance setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlippageWarning {
    /// Tolerance so low the transaction may fail.
    TooLow,
    /// Tolerance so high the rate may be unfavourable.
    TooHigh,
}

impl SlippageWarning {
    pub fn message(&self) -> &'static str {
        match self {
            Self::TooLow => "Your transaction may fail due to low slippage tolerance",
            Self::TooHigh => "High slippage tolerance may result in unfavorable rates",
        }
    }
}

impl SlippageTolerance {
    pub fn from_bps(bps: u32) -> Result<Self, DomainError> {
        if bps > MAX_SLIPPAGE_BPS {
            return Err(DomainError::InvalidSlippage(format!(
                "{} exceeds 50%",
                Decimal::new(i64::from(bps), 2)
            )));
        }
        Ok(Self(bps))
    }

    /// Builds a tolerance from a percentage such as `0.5`.
    ///
    /// Percentages finer than one basis point round up to the next basis
    /// point, so the resulting bound is never looser than asked for by
    /// more than that.
    pub fn from_percent(percent: Decimal) -> Result<Self, DomainError> {
        if percent.is_sign_negative() {
            return Err(DomainError::InvalidSlippage(percent.to_string()));
        }
        let bps = percent
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|bps| bps.ceil().to_u32())
            .ok_or_else(|| DomainError::InvalidSlippage(percent.to_string()))?;
        Self::from_bps(bps)
    }

    pub fn bps(&self) -> u32 {
        self.0
    }

    pub fn percent(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 2).normalize()
    }

    pub fn is_preset(&self) -> bool {
        SLIPPAGE_PRESETS_BPS.contains(&self.0)
    }

    pub fn warning(&self) -> Option<SlippageWarning> {
        if self.0 < LOW_SLIPPAGE_WARNING_BPS {
            Some(SlippageWarning::TooLow)
        } else if self.0 > HIGH_SLIPPAGE_WARNING_BPS {
            Some(SlippageWarning::TooHigh)
        } else {
            None
        }
    }

    /// Smallest acceptable counterpart: `amount * (1 - tolerance)`, floored.
    pub fn minimum_amount(&self, amount: TokenAmount) -> TokenAmount {
        TokenAmount(mul_div_floor(
            amount.0,
            U256::from(BPS_DENOMINATOR - self.0),
            U256::from(BPS_DENOMINATOR),
        ))
    }

    /// Largest acceptable input for exact-output trades:
    /// `amount * (1 + tolerance)`, floored.
    pub fn maximum_amount(&self, amount: TokenAmount) -> TokenAmount {
        TokenAmount(mul_div_floor(
            amount.0,
            U256::from(BPS_DENOMINATOR + self.0),
            U256::from(BPS_DENOMINATOR),
        ))
    }
}

impl Default for SlippageTolerance {
    fn default() -> Self {
        Self(DEFAULT_SLIPPAGE_BPS)
    }
}

impl FromStr for SlippageTolerance {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let percent = Decimal::from_str(s.trim().trim_end_matches('%'))
            .map_err(|_| DomainError::InvalidSlippage(s.to_string()))?;
        Self::from_percent(percent)
    }
}

impl TryFrom<Decimal> for SlippageTolerance {
    type Error = DomainError;

    fn try_from(percent: Decimal) -> Result<Self, Self::Error> {
        Self::from_percent(percent)
    }
}

impl From<SlippageTolerance> for Decimal {
    fn from(tolerance: SlippageTolerance) -> Self {
        tolerance.percent()
    }
}

impl fmt::Display for SlippageTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}
