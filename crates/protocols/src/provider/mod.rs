//! Wallet provider abstraction.
//!
//! Mirrors the injected-provider interface: a single `request` entry point
//! plus pushed notifications. Subscribing returns a broadcast receiver;
//! dropping it is the equivalent of removing the listener.

mod http;
mod scripted;

pub use http::HttpProvider;
pub use scripted::ScriptedProvider;

use crate::error::ProviderError;
use alloy_primitives::{Address, B256, Bytes, U64, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::broadcast;

/// Notifications a wallet pushes to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The exposed accounts changed; empty when the user disconnected.
    AccountsChanged(Vec<Address>),
    /// The wallet moved to another chain.
    ChainChanged(u64),
    /// The provider lost its connection.
    Disconnect,
}

/// Injected wallet provider.
#[async_trait]
pub trait Eip1193Provider: Send + Sync {
    /// Sends a JSON-RPC style request.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    /// Registers for pushed notifications.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// Transaction submitted through `eth_sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
}

/// Subset of a mined transaction's receipt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<U64>,
    pub status: Option<U64>,
}

impl TransactionReceipt {
    /// Pre-Byzantium receipts carry no status and count as successful.
    pub fn succeeded(&self) -> bool {
        self.status.is_none_or(|s| s == U64::from(1u64))
    }

    pub fn block(&self) -> Option<u64> {
        self.block_number.map(|b| b.to::<u64>())
    }
}

/// Parses a `0x`-prefixed hex quantity such as a chain id.
pub fn parse_quantity(value: &Value) -> Result<u64, ProviderError> {
    match value {
        Value::String(s) => {
            let digits = s.trim_start_matches("0x");
            u64::from_str_radix(digits, 16)
                .map_err(|_| ProviderError::Decode(format!("bad quantity {s}")))
        }
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| ProviderError::Decode(format!("bad quantity {n}"))),
        other => Err(ProviderError::Decode(format!("bad quantity {other}"))),
    }
}

/// Typed wrappers over the raw request method.
#[async_trait]
pub trait ProviderExt: Eip1193Provider {
    /// Asks the wallet to expose accounts, prompting the user if needed.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let value = self.request("eth_requestAccounts", json!([])).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Accounts already exposed, without prompting.
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let value = self.request("eth_accounts", json!([])).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        let value = self.request("eth_chainId", json!([])).await?;
        parse_quantity(&value)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ProviderError> {
        let value = self
            .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn balance(&self, owner: Address) -> Result<U256, ProviderError> {
        let value = self
            .request("eth_getBalance", json!([owner, "latest"]))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, ProviderError> {
        let value = self.request("eth_sendTransaction", json!([tx])).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, ProviderError> {
        let value = self
            .request("eth_getTransactionReceipt", json!([hash]))
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}

impl<P: Eip1193Provider + ?Sized> ProviderExt for P {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(&json!("0x79a")).unwrap(), 1946);
        assert_eq!(parse_quantity(&json!(1)).unwrap(), 1);
        assert!(parse_quantity(&json!("0xzz")).is_err());
        assert!(parse_quantity(&json!(null)).is_err());
    }

    #[test]
    fn test_receipt_status() {
        let ok: TransactionReceipt = serde_json::from_value(json!({
            "transactionHash": B256::repeat_byte(1),
            "blockNumber": "0x10",
            "status": "0x1"
        }))
        .unwrap();
        assert!(ok.succeeded());
        assert_eq!(ok.block(), Some(16));

        let reverted: TransactionReceipt = serde_json::from_value(json!({
            "transactionHash": B256::repeat_byte(1),
            "blockNumber": "0x10",
            "status": "0x0"
        }))
        .unwrap();
        assert!(!reverted.succeeded());
    }

    #[test]
    fn test_transaction_request_omits_missing_value() {
        let tx = TransactionRequest {
            from: Address::repeat_byte(1),
            to: Address::repeat_byte(2),
            data: Bytes::from(vec![0x09, 0x5e]),
            value: None,
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert!(json.get("value").is_none());
        assert_eq!(json["data"], "0x095e");
    }
}
