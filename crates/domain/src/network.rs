use crate::token::Token;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Native currency metadata as expected by `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Addresses of the deployed AMM contracts on one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAddresses {
    pub factory: Address,
    pub router: Address,
    pub wrapped_native: Address,
}

/// Static configuration for a supported chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    pub explorer_url: String,
    pub native_currency: NativeCurrency,
    pub contracts: ContractAddresses,
}

impl NetworkConfig {
    /// Chain id in the `0x`-prefixed hex form wallet methods expect.
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    /// Token-list entry for the chain's native asset.
    pub fn native_token(&self) -> Token {
        Token::native(
            self.native_currency.symbol.clone(),
            self.native_currency.decimals,
            self.native_currency.name.clone(),
        )
    }

    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), tx_hash)
    }
}

/// Ordered set of supported chains. The first entry is the default
/// target when asking the wallet to switch networks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRegistry {
    pub networks: Vec<NetworkConfig>,
}

impl NetworkRegistry {
    pub fn new(networks: Vec<NetworkConfig>) -> Self {
        Self { networks }
    }

    pub fn find(&self, chain_id: u64) -> Option<&NetworkConfig> {
        self.networks.iter().find(|n| n.chain_id == chain_id)
    }

    pub fn is_supported(&self, chain_id: u64) -> bool {
        self.find(chain_id).is_some()
    }

    pub fn default_network(&self) -> Option<&NetworkConfig> {
        self.networks.first()
    }
}
