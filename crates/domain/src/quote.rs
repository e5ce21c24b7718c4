//! Swap quotes previewed from pair reserves.
//!
//! The router recomputes everything at execution time against the then
//! current reserves; a quote is advisory and the slippage bound it carries
//! is what protects the trade.

use crate::error::DomainError;
use crate::math::constant_product::{
    DEFAULT_FEE_BPS, calculate_fee, calculate_in_amount, calculate_out_amount,
    calculate_price_impact, calculate_spot_price,
};
use crate::slippage::SlippageTolerance;
use crate::token::{Token, TokenAmount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which side of the trade the user fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeType {
    ExactIn,
    ExactOut,
}

/// A computed swap preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub trade_type: TradeType,
    pub amount_in: TokenAmount,
    pub amount_out: TokenAmount,
    /// Percent deviation of the fee-free execution price from the spot
    /// price; the fee is carried in `fee`.
    pub price_impact: Decimal,
    /// Liquidity provider fee, in units of the input token.
    pub fee: TokenAmount,
    /// Token symbols along the swap path.
    pub route: Vec<String>,
    /// Input tokens paid per output token, in human units.
    pub execution_price: Decimal,
    /// Reserve ratio before the trade, in human units.
    pub spot_price: Decimal,
    /// Minimum received for exact-input trades, maximum sold for
    /// exact-output trades.
    pub slippage_bound: TokenAmount,
}

impl Quote {
    /// Bound passed to the router: `amountOutMin` or `amountInMax`.
    pub fn minimum_received(&self) -> Option<TokenAmount> {
        (self.trade_type == TradeType::ExactIn).then_some(self.slippage_bound)
    }

    pub fn maximum_sold(&self) -> Option<TokenAmount> {
        (self.trade_type == TradeType::ExactOut).then_some(self.slippage_bound)
    }
}

/// Mirrors the router's single-hop pricing for preview.
#[derive(Debug, Clone, Copy)]
pub struct QuoteEstimator {
    fee_bps: u32,
    slippage: SlippageTolerance,
}

impl QuoteEstimator {
    pub fn new(slippage: SlippageTolerance) -> Self {
        Self {
            fee_bps: DEFAULT_FEE_BPS,
            slippage,
        }
    }

    /// Overrides the pool fee for deployments that do not charge 0.3%.
    #[must_use]
    pub fn with_fee_bps(mut self, fee_bps: u32) -> Self {
        self.fee_bps = fee_bps.min(crate::math::BPS_DENOMINATOR - 1);
        self
    }

    pub fn fee_bps(&self) -> u32 {
        self.fee_bps
    }

    pub fn slippage(&self) -> SlippageTolerance {
        self.slippage
    }

    /// Quotes selling exactly `amount_in` of `token_in`.
    pub fn exact_in(
        &self,
        token_in: &Token,
        token_out: &Token,
        amount_in: TokenAmount,
        reserve_in: TokenAmount,
        reserve_out: TokenAmount,
    ) -> Result<Quote, DomainError> {
        let amount_out = calculate_out_amount(amount_in, reserve_in, reserve_out, self.fee_bps)?;
        self.build(
            TradeType::ExactIn,
            token_in,
            token_out,
            amount_in,
            amount_out,
            reserve_in,
            reserve_out,
        )
    }

    /// Quotes buying exactly `amount_out` of `token_out`.
    pub fn exact_out(
        &self,
        token_in: &Token,
        token_out: &Token,
        amount_out: TokenAmount,
        reserve_in: TokenAmount,
        reserve_out: TokenAmount,
    ) -> Result<Quote, DomainError> {
        let amount_in = calculate_in_amount(amount_out, reserve_in, reserve_out, self.fee_bps)?;
        self.build(
            TradeType::ExactOut,
            token_in,
            token_out,
            amount_in,
            amount_out,
            reserve_in,
            reserve_out,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        trade_type: TradeType,
        token_in: &Token,
        token_out: &Token,
        amount_in: TokenAmount,
        amount_out: TokenAmount,
        reserve_in: TokenAmount,
        reserve_out: TokenAmount,
    ) -> Result<Quote, DomainError> {
        let spot_price =
            calculate_spot_price(reserve_in, token_in.decimals, reserve_out, token_out.decimals)?;
        let price_impact = calculate_price_impact(
            amount_in,
            reserve_in,
            token_in.decimals,
            reserve_out,
            token_out.decimals,
        )?;
        let execution_price = if amount_out.is_zero() {
            Decimal::ZERO
        } else {
            calculate_spot_price(amount_in, token_in.decimals, amount_out, token_out.decimals)?
        };
        let slippage_bound = match trade_type {
            TradeType::ExactIn => self.slippage.minimum_amount(amount_out),
            TradeType::ExactOut => self.slippage.maximum_amount(amount_in),
        };

        Ok(Quote {
            trade_type,
            amount_in,
            amount_out,
            price_impact,
            fee: calculate_fee(amount_in, self.fee_bps),
            route: vec![token_in.symbol.clone(), token_out.symbol.clone()],
            execution_price,
            spot_price,
            slippage_bound,
        })
    }
}

impl Default for QuoteEstimator {
    fn default() -> Self {
        Self::new(SlippageTolerance::default())
    }
}
