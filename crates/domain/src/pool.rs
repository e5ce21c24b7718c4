use crate::math::ratio_to_decimal;
use crate::token::{Token, TokenAmount};
use alloy_primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Last successful read of a pair contract, oriented to the caller's
/// (A, B) token order rather than the pair's (token0, token1) order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairSnapshot {
    pub pair_address: Address,
    pub reserve_a: TokenAmount,
    pub reserve_b: TokenAmount,
    pub total_supply: TokenAmount,
    pub lp_balance: TokenAmount,
}

impl PairSnapshot {
    /// Builds a snapshot from raw `getReserves` output, swapping the
    /// reserves when token A is the pair's token1.
    pub fn from_pair_order(
        pair_address: Address,
        token_a: Address,
        token0: Address,
        reserves: (TokenAmount, TokenAmount),
        total_supply: TokenAmount,
        lp_balance: TokenAmount,
    ) -> Self {
        let (reserve_a, reserve_b) = if token_a == token0 {
            reserves
        } else {
            (reserves.1, reserves.0)
        };
        Self {
            pair_address,
            reserve_a,
            reserve_b,
            total_supply,
            lp_balance,
        }
    }

    /// A pair whose reserves are both non-zero; otherwise the first deposit
    /// sets the price.
    pub fn has_liquidity(&self) -> bool {
        !self.reserve_a.is_zero() && !self.reserve_b.is_zero()
    }

    /// Raw reserve ratio A / B, zero when B is empty.
    pub fn ratio(&self) -> Decimal {
        ratio_to_decimal(self.reserve_a.0, self.reserve_b.0, 18).unwrap_or(Decimal::ZERO)
    }

    /// Same snapshot seen from the other side.
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            reserve_a: self.reserve_b,
            reserve_b: self.reserve_a,
            ..self.clone()
        }
    }

    /// Caller's share of the pool in percent.
    pub fn pool_share(&self) -> Decimal {
        crate::liquidity::pool_share(self.lp_balance, self.total_supply)
    }
}

/// A pair in which an account holds LP tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityPosition {
    pub pair_address: Address,
    pub token0: Token,
    pub token1: Token,
    pub reserve0: TokenAmount,
    pub reserve1: TokenAmount,
    pub lp_balance: TokenAmount,
    pub total_supply: TokenAmount,
}

impl LiquidityPosition {
    /// Snapshot of this position with token0 as side A.
    pub fn snapshot(&self) -> PairSnapshot {
        PairSnapshot {
            pair_address: self.pair_address,
            reserve_a: self.reserve0,
            reserve_b: self.reserve1,
            total_supply: self.total_supply,
            lp_balance: self.lp_balance,
        }
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.token0.symbol, self.token1.symbol)
    }
}
