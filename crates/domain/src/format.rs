//! Display formatting for balances, amounts and ratios.
//!
//! Every function accepts whatever the user or the chain produced and
//! degrades to `"0"` instead of failing.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Options for [`format_number`].
#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    pub max_decimals: u32,
    pub min_decimals: u32,
    pub compact: bool,
    pub significant_digits: Option<u32>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            max_decimals: 6,
            min_decimals: 0,
            compact: false,
            significant_digits: None,
        }
    }
}

const ONE_MILLION: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
const SCIENTIFIC_BELOW: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Formats a number for display.
///
/// Large values use compact suffixes when asked, values below 0.0001 use
/// scientific notation, and everything else is grouped with thousands
/// separators.
pub fn format_number(value: Decimal, options: FormatOptions) -> String {
    if value.is_zero() {
        return "0".to_string();
    }
    let abs = value.abs();
    if options.compact && abs >= ONE_MILLION {
        return compact(value);
    }
    if abs < SCIENTIFIC_BELOW {
        return to_exponential(value, 4);
    }
    if let Some(digits) = options.significant_digits {
        return to_precision(value, digits);
    }
    grouped(value, options.min_decimals, options.max_decimals)
}

/// Parses a decimal string; anything unparseable reads as zero.
pub fn parse_or_zero(value: &str) -> Decimal {
    Decimal::from_str(value.trim()).unwrap_or(Decimal::ZERO)
}

/// Formats a token balance with precision chosen by magnitude.
pub fn format_token_balance(balance: &str, compact_large: bool) -> String {
    let value = parse_or_zero(balance);
    if value >= ONE_MILLION && compact_large {
        format_number(
            value,
            FormatOptions {
                compact: true,
                ..Default::default()
            },
        )
    } else if value >= Decimal::ONE {
        format_number(
            value,
            FormatOptions {
                max_decimals: 4,
                min_decimals: 2,
                ..Default::default()
            },
        )
    } else if value >= SCIENTIFIC_BELOW {
        format_number(
            value,
            FormatOptions {
                max_decimals: 6,
                min_decimals: 2,
                ..Default::default()
            },
        )
    } else if value > Decimal::ZERO {
        to_exponential(value, 4)
    } else {
        "0".to_string()
    }
}

/// Formats a price ratio.
pub fn format_ratio(ratio: Decimal) -> String {
    if ratio.is_zero() {
        return "0".to_string();
    }
    if ratio > ONE_MILLION {
        format_number(
            ratio,
            FormatOptions {
                significant_digits: Some(6),
                compact: true,
                ..Default::default()
            },
        )
    } else if ratio > Decimal::ZERO && ratio < Decimal::from_parts(1, 0, 0, false, 6) {
        to_exponential(ratio, 4)
    } else {
        format_number(ratio, FormatOptions::default())
    }
}

/// Shortens a numeric string to roughly `max_len` characters.
pub fn truncate_number(value: &str, max_len: usize) -> String {
    if value.is_empty() {
        return "0".to_string();
    }
    if value.len() <= max_len {
        return value.to_string();
    }
    let compact_opts = FormatOptions {
        compact: true,
        ..Default::default()
    };
    match value.split_once('.') {
        None => format_number(parse_or_zero(value), compact_opts),
        Some((integer, _)) if integer.len() + 2 >= max_len => {
            format_number(parse_or_zero(value), compact_opts)
        }
        Some((integer, fraction)) => {
            let available = max_len - integer.len() - 1;
            let fraction: String = fraction.chars().take(available).collect();
            format!("{integer}.{fraction}")
        }
    }
}

fn compact(value: Decimal) -> String {
    let abs = value.abs();
    let (divisor, suffix) = if abs >= Decimal::from(1_000_000_000_000u64) {
        (Decimal::from(1_000_000_000_000u64), "T")
    } else if abs >= Decimal::from(1_000_000_000u64) {
        (Decimal::from(1_000_000_000u64), "B")
    } else {
        (ONE_MILLION, "M")
    };
    let scaled = (value / divisor)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    format!("{scaled}{suffix}")
}

fn grouped(value: Decimal, min_decimals: u32, max_decimals: u32) -> String {
    let rounded = value
        .round_dp_with_strategy(max_decimals, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = rounded.abs().to_string();
    let (integer, mut fraction) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (text.clone(), String::new()),
    };

    while (fraction.len() as u32) < min_decimals {
        fraction.push('0');
    }

    let mut out = String::new();
    if rounded.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    let len = integer.len();
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(&fraction);
    }
    out
}

/// Mantissa/exponent rendering in the style `1.2346e-5`.
fn to_exponential(value: Decimal, digits: u32) -> String {
    if value.is_zero() {
        return format!("0.{}e+0", "0".repeat(digits as usize));
    }
    let (mut mantissa, mut exponent) = normalise_exponent(value.abs());
    mantissa = mantissa.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);
    if mantissa >= Decimal::TEN {
        mantissa /= Decimal::TEN;
        exponent += 1;
    }
    let sign = if value.is_sign_negative() { "-" } else { "" };
    let exp_sign = if exponent < 0 { "-" } else { "+" };
    format!(
        "{sign}{:.*}e{exp_sign}{}",
        digits as usize,
        mantissa,
        exponent.abs()
    )
}

fn to_precision(value: Decimal, digits: u32) -> String {
    let (_, exponent) = normalise_exponent(value.abs());
    let dp = digits as i32 - 1 - exponent;
    if dp >= 0 {
        let rounded = value.round_dp_with_strategy(dp as u32, RoundingStrategy::MidpointAwayFromZero);
        format!("{:.*}", dp as usize, rounded)
    } else {
        let mut factor = Decimal::ONE;
        for _ in 0..(-dp) {
            factor *= Decimal::TEN;
        }
        let rounded = (value / factor).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            * factor;
        rounded.normalize().to_string()
    }
}

/// Splits a positive value into `mantissa * 10^exponent` with
/// `1 <= mantissa < 10`.
fn normalise_exponent(abs: Decimal) -> (Decimal, i32) {
    let mut mantissa = abs;
    let mut exponent = 0i32;
    while mantissa >= Decimal::TEN {
        mantissa /= Decimal::TEN;
        exponent += 1;
    }
    while mantissa < Decimal::ONE {
        mantissa *= Decimal::TEN;
        exponent -= 1;
    }
    (mantissa, exponent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_number_grouping() {
        assert_eq!(format_number(dec!(1234567.891), FormatOptions::default()), "1,234,567.891");
        assert_eq!(format_number(dec!(0.5), FormatOptions::default()), "0.5");
        assert_eq!(format_number(Decimal::ZERO, FormatOptions::default()), "0");
        assert_eq!(format_number(dec!(-1234.5), FormatOptions::default()), "-1,234.5");
    }

    #[test]
    fn test_format_number_compact_and_scientific() {
        let compact = FormatOptions {
            compact: true,
            ..Default::default()
        };
        assert_eq!(format_number(dec!(1234567), compact), "1.23M");
        assert_eq!(format_number(dec!(2500000000), compact), "2.5B");
        assert_eq!(format_number(dec!(0.0000123456), FormatOptions::default()), "1.2346e-5");
    }

    #[test]
    fn test_format_token_balance() {
        assert_eq!(format_token_balance("1234.56789", true), "1,234.5679");
        assert_eq!(format_token_balance("1", true), "1.00");
        assert_eq!(format_token_balance("0.0012345678", true), "0.001235");
        assert_eq!(format_token_balance("3000000", true), "3M");
        assert_eq!(format_token_balance("garbage", true), "0");
        assert_eq!(format_token_balance("0", true), "0");
    }

    #[test]
    fn test_format_ratio() {
        assert_eq!(format_ratio(dec!(0.5)), "0.5");
        assert_eq!(format_ratio(dec!(0.0000001)), "1.0000e-7");
        assert_eq!(format_ratio(dec!(12345678)), "12.35M");
    }

    #[test]
    fn test_truncate_number() {
        assert_eq!(truncate_number("123.456789012", 10), "123.456789");
        assert_eq!(truncate_number("1.5", 10), "1.5");
        assert_eq!(truncate_number("", 10), "0");
        assert_eq!(truncate_number("123456789012", 10), "123.46B");
    }

    #[test]
    fn test_to_precision() {
        assert_eq!(to_precision(dec!(123.456), 4), "123.5");
        assert_eq!(to_precision(dec!(123456), 2), "120000");
    }
}
