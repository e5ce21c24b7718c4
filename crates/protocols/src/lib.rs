//! Chain access for the AMM client.
//!
//! This crate provides:
//! - The injected wallet provider abstraction (`request` plus event
//!   subscription) and a plain JSON-RPC implementation
//! - ABI bindings for the factory, router, pair and ERC-20 contracts
//! - A reader for pairs, reserves, balances and allowances

/// ABI bindings for the deployed contracts.
pub mod contracts;
/// Conversions between amount representations.
pub mod convert;
/// Read-side access to the factory, pairs and tokens.
pub mod dex;
/// Provider error type.
pub mod error;
/// Wallet provider abstraction and implementations.
pub mod provider;

pub use dex::DexReader;
pub use error::ProviderError;
pub use provider::{Eip1193Provider, ProviderEvent, ProviderExt};

use alloy_primitives::Address;
use amm_client_domain::pool::PairSnapshot;
use amm_client_domain::token::Token;
use async_trait::async_trait;

/// Source of fresh pair snapshots.
#[async_trait]
pub trait PairFetcher: Send + Sync {
    /// Reads the pair for `token_a`/`token_b`, oriented to that order.
    /// Returns `None` when the factory has no pair for them.
    async fn fetch_pair(
        &self,
        token_a: &Token,
        token_b: &Token,
        owner: Option<Address>,
    ) -> Result<Option<PairSnapshot>, ProviderError>;
}
