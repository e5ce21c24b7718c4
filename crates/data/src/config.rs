//! Loading of `networks.json` and `tokens.json`.
//!
//! Both files live in one configuration directory. The token list covers
//! every chain; entries carry a `chainId` and are filtered for the active
//! network, with the network's native asset listed first.

use crate::error::DataError;
use alloy_primitives::Address;
use amm_client_domain::network::{NetworkConfig, NetworkRegistry};
use amm_client_domain::token::Token;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const NETWORKS_FILE: &str = "networks.json";
pub const TOKENS_FILE: &str = "tokens.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenListEntry {
    chain_id: u64,
    #[serde(flatten)]
    token: Token,
}

#[derive(Debug, Deserialize)]
struct TokenList {
    tokens: Vec<TokenListEntry>,
}

/// Reads static configuration from a directory.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read(&self, file: &str) -> Result<(PathBuf, String), DataError> {
        let path = self.dir.join(file);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| DataError::io(&path, e))?;
        Ok((path, text))
    }

    /// Loads the supported networks. An empty list is an error since the
    /// first entry is the default switch target.
    pub async fn networks(&self) -> Result<NetworkRegistry, DataError> {
        let (path, text) = self.read(NETWORKS_FILE).await?;
        let registry = parse_networks(&text).map_err(|e| DataError::json(&path, e))?;
        if registry.networks.is_empty() {
            return Err(DataError::NoNetworks);
        }
        info!(count = registry.networks.len(), path = %path.display(), "Loaded networks");
        Ok(registry)
    }

    /// Loads the tokens listed for `network`.
    pub async fn tokens(&self, network: &NetworkConfig) -> Result<Vec<Token>, DataError> {
        let (path, text) = self.read(TOKENS_FILE).await?;
        let tokens = parse_token_list(&text, network).map_err(|e| DataError::json(&path, e))?;
        debug!(chain_id = network.chain_id, count = tokens.len(), "Loaded token list");
        Ok(tokens)
    }
}

pub fn parse_networks(text: &str) -> Result<NetworkRegistry, serde_json::Error> {
    serde_json::from_str(text)
}

/// Native asset first, then the list entries for the network's chain.
pub fn parse_token_list(text: &str, network: &NetworkConfig) -> Result<Vec<Token>, serde_json::Error> {
    let list: TokenList = serde_json::from_str(text)?;
    let mut tokens = vec![network.native_token()];
    tokens.extend(
        list.tokens
            .into_iter()
            .filter(|e| e.chain_id == network.chain_id)
            .map(|e| e.token),
    );
    Ok(tokens)
}

/// Finds a token by symbol (case-insensitive) or by address.
pub fn find_token<'a>(tokens: &'a [Token], query: &str) -> Option<&'a Token> {
    tokens.iter().find(|t| t.symbol.eq_ignore_ascii_case(query)).or_else(|| {
        let address = query.parse::<Address>().ok()?;
        tokens.iter().find(|t| !t.is_native && t.address == address)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NETWORKS: &str = r#"{
        "networks": [
            {
                "chainId": 1946,
                "name": "Soneium Minato",
                "rpcUrl": "https://rpc.minato.soneium.org",
                "explorerUrl": "https://soneium-minato.blockscout.com",
                "nativeCurrency": { "name": "Ether", "symbol": "ETH", "decimals": 18 },
                "contracts": {
                    "factory": "0x1111111111111111111111111111111111111111",
                    "router": "0x2222222222222222222222222222222222222222",
                    "wrappedNative": "0x3333333333333333333333333333333333333333"
                }
            }
        ]
    }"#;

    const TOKENS: &str = r#"{
        "tokens": [
            {
                "chainId": 1946,
                "address": "0x4444444444444444444444444444444444444444",
                "name": "USD Coin",
                "symbol": "USDC",
                "decimals": 6,
                "logoURI": "/tokens/usdc.png"
            },
            {
                "chainId": 1,
                "address": "0x5555555555555555555555555555555555555555",
                "name": "Other",
                "symbol": "OTH",
                "decimals": 18
            }
        ]
    }"#;

    async fn loader() -> (tempfile::TempDir, ConfigLoader) {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(NETWORKS_FILE), NETWORKS).await.unwrap();
        tokio::fs::write(dir.path().join(TOKENS_FILE), TOKENS).await.unwrap();
        let loader = ConfigLoader::new(dir.path());
        (dir, loader)
    }

    #[tokio::test]
    async fn test_loads_networks_and_filters_tokens() {
        let (_dir, loader) = loader().await;
        let registry = loader.networks().await.unwrap();
        let network = registry.default_network().unwrap();
        assert_eq!(network.chain_id, 1946);
        assert_eq!(network.contracts.router, Address::repeat_byte(0x22));

        let tokens = loader.tokens(network).await.unwrap();
        assert_eq!(tokens.len(), 2);
        assert!(tokens[0].is_native);
        assert_eq!(tokens[0].symbol, "ETH");
        assert_eq!(tokens[1].symbol, "USDC");
        assert_eq!(tokens[1].logo_uri.as_deref(), Some("/tokens/usdc.png"));
    }

    #[tokio::test]
    async fn test_missing_file_and_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path());
        assert!(matches!(loader.networks().await, Err(DataError::Io { .. })));

        tokio::fs::write(dir.path().join(NETWORKS_FILE), r#"{"networks": []}"#)
            .await
            .unwrap();
        assert!(matches!(loader.networks().await, Err(DataError::NoNetworks)));
    }

    #[test]
    fn test_find_token_by_symbol_or_address() {
        let registry = parse_networks(NETWORKS).unwrap();
        let tokens = parse_token_list(TOKENS, &registry.networks[0]).unwrap();
        assert_eq!(find_token(&tokens, "usdc").unwrap().decimals, 6);
        assert_eq!(
            find_token(&tokens, "0x4444444444444444444444444444444444444444")
                .unwrap()
                .symbol,
            "USDC"
        );
        assert!(find_token(&tokens, "OTH").is_none());
    }
}
