use super::{Eip1193Provider, ProviderEvent};
use crate::error::{ProviderError, UNSUPPORTED_METHOD_CODE};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

/// Provider backed by a plain JSON-RPC endpoint.
///
/// Stands in for a browser wallet when the node manages the accounts (a
/// local development node, for instance): account access maps to
/// `eth_accounts`, and since nothing pushes notifications the event
/// stream stays silent.
pub struct HttpProvider {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
    events: broadcast::Sender<ProviderEvent>,
}

impl HttpProvider {
    pub fn new(url: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            next_id: AtomicU64::new(1),
            events,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Eip1193Provider for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let method = match method {
            "eth_requestAccounts" => "eth_accounts",
            "wallet_switchEthereumChain" | "wallet_addEthereumChain" => {
                warn!(method, "Wallet method not available over plain RPC");
                return Err(ProviderError::from_rpc(
                    UNSUPPORTED_METHOD_CODE,
                    format!("{method} is not supported by {}", self.url),
                ));
            }
            other => other,
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(id, method, "Sending RPC request");

        let response: RpcResponse = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(ProviderError::from_rpc(err.code, err.message));
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
