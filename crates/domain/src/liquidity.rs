//! Paired amounts for deposits and withdrawals.
//!
//! When one side of a deposit is edited the other side follows the pool's
//! reserve ratio, mirroring the router's `quote` helper. A pool with no
//! reserves leaves both sides to the depositor.

use crate::math::{mul_div_floor, ratio_to_decimal};
use crate::pool::PairSnapshot;
use crate::token::{Token, TokenAmount};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Paired amounts are shown with at most this many fractional digits.
const DISPLAY_DECIMALS: u8 = 6;

/// Amount of the other token matching `amount` at the reserve ratio:
/// `amount * reserve_to / reserve_from`, floored. Zero when either reserve
/// is empty.
pub fn paired_amount(
    amount: TokenAmount,
    reserve_from: TokenAmount,
    reserve_to: TokenAmount,
) -> TokenAmount {
    if reserve_from.is_zero() || reserve_to.is_zero() {
        return TokenAmount::zero();
    }
    TokenAmount(mul_div_floor(amount.0, reserve_to.0, reserve_from.0))
}

/// Share of the pool held by `lp_balance`, in percent with two decimals.
pub fn pool_share(lp_balance: TokenAmount, total_supply: TokenAmount) -> Decimal {
    ratio_to_decimal(lp_balance.0.saturating_mul(U256::from(100u64)), total_supply.0, 2)
        .unwrap_or(Decimal::ZERO)
}

/// LP tokens burned and underlying amounts returned when removing a
/// percentage of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalPreview {
    pub lp_to_burn: TokenAmount,
    pub amount_a: TokenAmount,
    pub amount_b: TokenAmount,
}

/// Computes the amounts received for burning `percent` (clamped to 100) of
/// the caller's LP balance. An empty pool or position yields zeros.
pub fn removal_amounts(snapshot: &PairSnapshot, percent: u8) -> RemovalPreview {
    let percent = U256::from(percent.min(100));
    let lp_to_burn = mul_div_floor(snapshot.lp_balance.0, percent, U256::from(100u64));
    if snapshot.total_supply.is_zero() || lp_to_burn.is_zero() {
        return RemovalPreview {
            lp_to_burn: TokenAmount(lp_to_burn),
            amount_a: TokenAmount::zero(),
            amount_b: TokenAmount::zero(),
        };
    }
    RemovalPreview {
        lp_to_burn: TokenAmount(lp_to_burn),
        amount_a: TokenAmount(mul_div_floor(
            snapshot.reserve_a.0,
            lp_to_burn,
            snapshot.total_supply.0,
        )),
        amount_b: TokenAmount(mul_div_floor(
            snapshot.reserve_b.0,
            lp_to_burn,
            snapshot.total_supply.0,
        )),
    }
}

/// Which side of a two-token entry the user last edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

/// Two-sided deposit entry for a token pair.
#[derive(Debug, Clone)]
pub struct LiquidityInput {
    pub token_a: Token,
    pub token_b: Token,
    pub amount_a: String,
    pub amount_b: String,
    pub active: Option<Side>,
}

impl LiquidityInput {
    pub fn new(token_a: Token, token_b: Token) -> Self {
        Self {
            token_a,
            token_b,
            amount_a: String::new(),
            amount_b: String::new(),
            active: None,
        }
    }

    /// Records user text for one side. With a funded pool the other side is
    /// recomputed at the reserve ratio; clearing one side clears the other.
    /// Text that does not parse updates only the edited side.
    pub fn set_amount(&mut self, side: Side, text: &str, pool: Option<&PairSnapshot>) {
        self.active = Some(side);
        let (edited, other_token, edited_decimals) = match side {
            Side::A => (&mut self.amount_a, &self.token_b, self.token_a.decimals),
            Side::B => (&mut self.amount_b, &self.token_a, self.token_b.decimals),
        };
        *edited = text.to_string();
        let other_decimals = other_token.decimals;

        let paired = if text.is_empty() {
            Some(String::new())
        } else {
            pool.filter(|p| p.has_liquidity()).and_then(|p| {
                let amount = TokenAmount::parse_units(text, edited_decimals).ok()?;
                let (from, to) = match side {
                    Side::A => (p.reserve_a, p.reserve_b),
                    Side::B => (p.reserve_b, p.reserve_a),
                };
                let other = paired_amount(amount, from, to);
                Some(display_truncated(other, other_decimals))
            })
        };

        if let Some(paired) = paired {
            match side {
                Side::A => self.amount_b = paired,
                Side::B => self.amount_a = paired,
            }
        }
    }

    /// Swaps the two sides, keeping each amount with its token.
    pub fn flip(&mut self) {
        std::mem::swap(&mut self.token_a, &mut self.token_b);
        std::mem::swap(&mut self.amount_a, &mut self.amount_b);
        self.active = None;
    }

    /// Raw amounts for submission; unparseable text reads as zero.
    pub fn raw_amounts(&self) -> (TokenAmount, TokenAmount) {
        (
            TokenAmount::parse_units_or_zero(&self.amount_a, self.token_a.decimals),
            TokenAmount::parse_units_or_zero(&self.amount_b, self.token_b.decimals),
        )
    }

    pub fn clear(&mut self) {
        self.amount_a.clear();
        self.amount_b.clear();
        self.active = None;
    }
}

fn display_truncated(amount: TokenAmount, decimals: u8) -> String {
    let keep = decimals.min(DISPLAY_DECIMALS);
    let value = amount.to_decimal(decimals);
    value
        .round_dp_with_strategy(u32::from(keep), rust_decimal::RoundingStrategy::ToZero)
        .normalize()
        .to_string()
}
