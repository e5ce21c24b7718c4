/// Constant product (x * y = k) formulas mirrored from the router.
pub mod constant_product;

use primitive_types::U256;
use rust_decimal::Decimal;

/// Basis-point denominator used by every fee and tolerance calculation.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Computes `floor(amount * numerator / denominator)` without forming the
/// full product, saturating at `U256::MAX`.
pub fn mul_div_floor(amount: U256, numerator: U256, denominator: U256) -> U256 {
    if denominator.is_zero() {
        return U256::zero();
    }
    let quotient = amount / denominator;
    let remainder = amount % denominator;
    let high = quotient.saturating_mul(numerator);
    // remainder < denominator, so this only overflows for absurd denominators
    let low = remainder
        .checked_mul(numerator)
        .map(|v| v / denominator)
        .unwrap_or(U256::MAX);
    high.saturating_add(low)
}

/// Converts `numerator / denominator` to a decimal with `scale` fractional
/// digits. Returns `None` for a zero denominator; saturates at
/// `Decimal::MAX`.
pub fn ratio_to_decimal(numerator: U256, denominator: U256, scale: u32) -> Option<Decimal> {
    if denominator.is_zero() {
        return None;
    }
    let factor = U256::exp10(scale as usize);
    let scaled = mul_div_floor(numerator, factor, denominator);
    // Decimal mantissas are 96 bits wide
    if scaled.bits() > 96 {
        return Some(Decimal::MAX);
    }
    Some(Decimal::try_from_i128_with_scale(scaled.as_u128() as i128, scale).unwrap_or(Decimal::MAX))
}
