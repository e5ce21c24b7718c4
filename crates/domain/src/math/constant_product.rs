use crate::error::DomainError;
use crate::math::{BPS_DENOMINATOR, ratio_to_decimal};
use crate::token::TokenAmount;
use primitive_types::U256;
use rust_decimal::Decimal;

/// Fee charged by the deployed pair contracts, in basis points (0.3%).
pub const DEFAULT_FEE_BPS: u32 = 30;

/// Calculates the output amount for a given input amount in a constant product pool (x * y = k).
///
/// formula: dy = y * dx / (x + dx)
/// taking fee into account: dy = y * (dx * (1 - fee)) / (x + (dx * (1 - fee)))
pub fn calculate_out_amount(
    amount_in: TokenAmount,
    reserve_in: TokenAmount,
    reserve_out: TokenAmount,
    fee_bps: u32,
) -> Result<TokenAmount, DomainError> {
    let amount_in = amount_in.0;
    let reserve_in = reserve_in.0;
    let reserve_out = reserve_out.0;

    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(DomainError::NoPool);
    }
    if amount_in.is_zero() {
        return Ok(TokenAmount::zero());
    }

    let amount_in_with_fee = amount_in
        .checked_mul(U256::from(BPS_DENOMINATOR - fee_bps))
        .ok_or(DomainError::Overflow)?;
    let numerator = amount_in_with_fee
        .checked_mul(reserve_out)
        .ok_or(DomainError::Overflow)?;
    let denominator = reserve_in
        .checked_mul(U256::from(BPS_DENOMINATOR))
        .ok_or(DomainError::Overflow)?
        .checked_add(amount_in_with_fee)
        .ok_or(DomainError::Overflow)?;

    Ok(TokenAmount(numerator / denominator))
}

/// Calculates the input amount required to receive `amount_out`.
///
/// formula: dx = x * dy / ((y - dy) * (1 - fee)) + 1
/// The trailing +1 rounds up in the pool's favour, as the router does.
pub fn calculate_in_amount(
    amount_out: TokenAmount,
    reserve_in: TokenAmount,
    reserve_out: TokenAmount,
    fee_bps: u32,
) -> Result<TokenAmount, DomainError> {
    let amount_out = amount_out.0;
    let reserve_in = reserve_in.0;
    let reserve_out = reserve_out.0;

    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(DomainError::NoPool);
    }
    if amount_out.is_zero() {
        return Ok(TokenAmount::zero());
    }
    if amount_out >= reserve_out {
        return Err(DomainError::InsufficientLiquidity);
    }

    let numerator = reserve_in
        .checked_mul(amount_out)
        .ok_or(DomainError::Overflow)?
        .checked_mul(U256::from(BPS_DENOMINATOR))
        .ok_or(DomainError::Overflow)?;
    let denominator = (reserve_out - amount_out)
        .checked_mul(U256::from(BPS_DENOMINATOR - fee_bps))
        .ok_or(DomainError::Overflow)?;

    Ok(TokenAmount(numerator / denominator + U256::one()))
}

/// Calculates the spot price of token_out in units of token_in, in human units.
/// Price = (reserve_in / 10^decimals_in) / (reserve_out / 10^decimals_out)
pub fn calculate_spot_price(
    reserve_in: TokenAmount,
    decimals_in: u8,
    reserve_out: TokenAmount,
    decimals_out: u8,
) -> Result<Decimal, DomainError> {
    let numerator = reserve_in
        .0
        .checked_mul(U256::exp10(decimals_out as usize))
        .ok_or(DomainError::Overflow)?;
    let denominator = reserve_out
        .0
        .checked_mul(U256::exp10(decimals_in as usize))
        .ok_or(DomainError::Overflow)?;

    if reserve_in.is_zero() {
        return Err(DomainError::NoPool);
    }
    ratio_to_decimal(numerator, denominator, 18).ok_or(DomainError::NoPool)
}

/// Price impact in percent: `|execution - spot| / spot * 100`.
///
/// The execution price is taken on the fee-free curve, `(x + dx) / y`, so the
/// fee is reported separately and the impact reduces to `dx / x`. Zero for a
/// zero input and non-decreasing in `amount_in`.
pub fn calculate_price_impact(
    amount_in: TokenAmount,
    reserve_in: TokenAmount,
    decimals_in: u8,
    reserve_out: TokenAmount,
    decimals_out: u8,
) -> Result<Decimal, DomainError> {
    let spot = calculate_spot_price(reserve_in, decimals_in, reserve_out, decimals_out)?;
    if amount_in.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let moved = reserve_in
        .0
        .checked_add(amount_in.0)
        .ok_or(DomainError::Overflow)?;
    let execution = calculate_spot_price(TokenAmount(moved), decimals_in, reserve_out, decimals_out)?;

    // spot below decimal resolution: fall back to the closed form
    if spot.is_zero() {
        let ratio = ratio_to_decimal(amount_in.0, reserve_in.0, 18).ok_or(DomainError::NoPool)?;
        return Ok(ratio.saturating_mul(Decimal::ONE_HUNDRED));
    }
    (execution - spot)
        .abs()
        .checked_div(spot)
        .and_then(|d| d.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(DomainError::Overflow)
}

/// Liquidity provider fee paid on `amount_in`.
pub fn calculate_fee(amount_in: TokenAmount, fee_bps: u32) -> TokenAmount {
    TokenAmount(crate::math::mul_div_floor(
        amount_in.0,
        U256::from(fee_bps),
        U256::from(BPS_DENOMINATOR),
    ))
}

/// Calculates the constant product K
pub fn calculate_k(reserve0: TokenAmount, reserve1: TokenAmount) -> U256 {
    reserve0.0.saturating_mul(reserve1.0)
}
