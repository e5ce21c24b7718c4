//! Domain types and client-side estimation logic for constant-product AMMs.
//!
//! Nothing in this crate talks to a chain. It holds the static token and
//! network model, the transient pair snapshot read from a pair contract,
//! and the arithmetic the client mirrors from the router contract for
//! preview purposes:
//! - swap quotes and price impact
//! - slippage bounds
//! - paired deposit and withdrawal amounts

/// Domain error type.
pub mod error;
/// Display formatting for amounts and ratios.
pub mod format;
/// Paired deposit and withdrawal calculations.
pub mod liquidity;
/// Constant-product pricing formulas.
pub mod math;
/// Network and contract configuration.
pub mod network;
/// Pair snapshots and LP positions.
pub mod pool;
/// Swap quotes.
pub mod quote;
/// Slippage tolerance and bounds.
pub mod slippage;
/// Tokens and raw amounts.
pub mod token;

pub use error::DomainError;
