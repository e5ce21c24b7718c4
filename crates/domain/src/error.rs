use thiserror::Error;

/// Errors raised by the estimation logic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The pair does not exist or holds a zero reserve.
    #[error("no liquidity pool for this pair")]
    NoPool,
    /// The requested output is not available in the pool.
    #[error("insufficient liquidity for requested output")]
    InsufficientLiquidity,
    /// The tolerance is outside the accepted 0-50% range or not a number.
    #[error("invalid slippage tolerance: {0}")]
    InvalidSlippage(String),
    /// The amount could not be parsed for the token's precision.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// Intermediate value did not fit in 256 bits.
    #[error("arithmetic overflow")]
    Overflow,
}
