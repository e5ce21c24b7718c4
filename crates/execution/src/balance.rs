//! Periodic balance polling.

use alloy_primitives::Address;
use amm_client_domain::token::{Token, TokenAmount};
use amm_client_protocols::{DexReader, Eip1193Provider};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Refresh period for displayed balances.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Latest known balance of one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceUpdate {
    pub raw: TokenAmount,
    /// Human units, unrounded.
    pub formatted: String,
}

impl BalanceUpdate {
    pub fn zero() -> Self {
        Self {
            raw: TokenAmount::zero(),
            formatted: "0".to_string(),
        }
    }
}

/// Background task publishing a token balance on a fixed interval. Each
/// poll replaces the previous value; a failed read publishes zero. The
/// task stops when the watcher is dropped.
pub struct BalanceWatcher {
    updates: watch::Receiver<BalanceUpdate>,
    handle: JoinHandle<()>,
}

impl BalanceWatcher {
    pub fn spawn<P>(reader: DexReader<P>, token: Token, owner: Address, interval: Duration) -> Self
    where
        P: Eip1193Provider + ?Sized + 'static,
    {
        let (tx, updates) = watch::channel(BalanceUpdate::zero());
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let update = match reader.token_balance(&token, owner).await {
                    Ok(raw) => BalanceUpdate {
                        raw,
                        formatted: raw.format_units(token.decimals),
                    },
                    Err(e) => {
                        warn!(token = %token.symbol, error = %e, "Balance read failed");
                        BalanceUpdate::zero()
                    }
                };
                debug!(token = %token.symbol, balance = %update.formatted, "Balance polled");
                tx.send_replace(update);
            }
        });
        Self { updates, handle }
    }

    pub fn latest(&self) -> BalanceUpdate {
        self.updates.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BalanceUpdate> {
        self.updates.clone()
    }

    /// Waits for the next poll and returns its value.
    pub async fn next(&mut self) -> Option<BalanceUpdate> {
        self.updates.changed().await.ok()?;
        Some(self.updates.borrow_and_update().clone())
    }
}

impl Drop for BalanceWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amm_client_domain::network::ContractAddresses;
    use amm_client_protocols::ProviderError;
    use amm_client_protocols::provider::ScriptedProvider;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn contracts() -> ContractAddresses {
        ContractAddresses {
            factory: Address::repeat_byte(1),
            router: Address::repeat_byte(2),
            wrapped_native: Address::repeat_byte(3),
        }
    }

    #[tokio::test]
    async fn test_publishes_each_poll() {
        let polls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&polls);
        let provider = Arc::new(ScriptedProvider::new(move |method, _| match method {
            "eth_getBalance" => {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Ok(json!("0xde0b6b3a7640000"))
                } else {
                    Err(ProviderError::Transport("node unavailable".into()))
                }
            }
            _ => Ok(json!(null)),
        }));
        let reader = DexReader::new(provider, contracts());
        let eth = Token::native("ETH", 18, "Ether");

        let mut watcher = BalanceWatcher::spawn(
            reader,
            eth,
            Address::repeat_byte(0xab),
            Duration::from_millis(5),
        );
        let first = watcher.next().await.unwrap();
        assert_eq!(first.formatted, "1");

        let second = watcher.next().await.unwrap();
        assert_eq!(second, BalanceUpdate::zero());
        assert!(polls.load(Ordering::SeqCst) >= 2);
    }
}
