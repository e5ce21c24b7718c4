use crate::error::ExecutionError;
use crate::guard::{ActionGuard, ActionKind};
use crate::notify::{Notification, Notifier};
use alloy_primitives::Address;
use amm_client_data::SettingsRepository;
use amm_client_domain::network::{NetworkConfig, NetworkRegistry};
use amm_client_protocols::{Eip1193Provider, ProviderError, ProviderEvent, ProviderExt};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Connection state of the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Disconnected,
    Connecting,
    /// Connected on a chain listed in the registry.
    Connected { account: Address, chain_id: u64 },
    /// Connected, but on a chain the client has no contracts for.
    WrongNetwork { account: Address, chain_id: u64 },
}

impl SessionState {
    pub fn account(&self) -> Option<Address> {
        match self {
            Self::Connected { account, .. } | Self::WrongNetwork { account, .. } => Some(*account),
            _ => None,
        }
    }

    pub fn chain_id(&self) -> Option<u64> {
        match self {
            Self::Connected { chain_id, .. } | Self::WrongNetwork { chain_id, .. } => Some(*chain_id),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.account().is_some()
    }
}

/// Flattened view of the session for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
    pub connected: bool,
    pub correct_network: bool,
    pub connecting: bool,
    pub network: Option<NetworkConfig>,
}

/// Wallet connection state machine.
pub struct WalletSession<P: ?Sized> {
    provider: Option<Arc<P>>,
    registry: NetworkRegistry,
    settings: Arc<dyn SettingsRepository>,
    notifier: Arc<dyn Notifier>,
    state: RwLock<SessionState>,
    connect_guard: ActionGuard,
}

impl<P: Eip1193Provider + ?Sized> WalletSession<P> {
    /// Creates a disconnected session. `provider` is `None` when no wallet
    /// is available.
    pub fn new(
        provider: Option<Arc<P>>,
        registry: NetworkRegistry,
        settings: Arc<dyn SettingsRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            provider,
            registry,
            settings,
            notifier,
            state: RwLock::new(SessionState::Disconnected),
            connect_guard: ActionGuard::new(ActionKind::Connect),
        }
    }

    pub fn provider(&self) -> Option<&Arc<P>> {
        self.provider.as_ref()
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn status(&self) -> SessionStatus {
        let state = self.state().await;
        let network = state.chain_id().and_then(|id| self.registry.find(id)).cloned();
        SessionStatus {
            account: state.account(),
            chain_id: state.chain_id(),
            connected: state.is_connected(),
            correct_network: matches!(state, SessionState::Connected { .. }),
            connecting: state == SessionState::Connecting,
            network,
        }
    }

    /// Account and network to transact with, refusing a disconnected
    /// session or an unsupported chain.
    pub async fn require_ready(&self) -> Result<(Address, NetworkConfig), ExecutionError> {
        match self.state().await {
            SessionState::Connected { account, chain_id } => self
                .registry
                .find(chain_id)
                .cloned()
                .map(|network| (account, network))
                .ok_or(ExecutionError::UnsupportedNetwork(chain_id)),
            SessionState::WrongNetwork { chain_id, .. } => {
                Err(ExecutionError::UnsupportedNetwork(chain_id))
            }
            SessionState::Disconnected | SessionState::Connecting => {
                Err(ExecutionError::NotConnected)
            }
        }
    }

    fn classify(&self, account: Address, chain_id: u64) -> SessionState {
        if self.registry.is_supported(chain_id) {
            SessionState::Connected { account, chain_id }
        } else {
            SessionState::WrongNetwork { account, chain_id }
        }
    }

    async fn persist_connected(&self, connected: bool) {
        if let Err(e) = self.settings.set_connected(connected).await {
            warn!(error = %e, "Failed to persist connection flag");
        }
    }

    fn notify_unsupported(&self) {
        self.notifier.notify(Notification::error(
            "Unsupported network",
            "Please switch to a supported network",
        ));
    }

    /// Asks the wallet for account access, prompting the user.
    pub async fn connect(&self) -> Result<SessionState, ExecutionError> {
        self.connect_with(false).await
    }

    async fn connect_with(&self, silent: bool) -> Result<SessionState, ExecutionError> {
        let Some(provider) = self.provider.as_ref() else {
            self.notifier.notify(Notification::error(
                "Wallet not found",
                "Please install an Ethereum wallet",
            ));
            return Err(ExecutionError::WalletNotFound);
        };
        let Some(_ticket) = self.connect_guard.try_begin() else {
            return Err(ExecutionError::Busy(ActionKind::Connect));
        };

        *self.state.write().await = SessionState::Connecting;
        match request_session(provider.as_ref()).await {
            Ok((account, chain_id)) => {
                let state = self.classify(account, chain_id);
                *self.state.write().await = state.clone();
                self.persist_connected(true).await;
                info!(%account, chain_id, silent, "Wallet connected");

                if !silent {
                    self.notifier
                        .notify(Notification::success("Connected", "Wallet connected successfully"));
                }
                if matches!(state, SessionState::WrongNetwork { .. }) {
                    self.notify_unsupported();
                }
                Ok(state)
            }
            Err(e) => {
                *self.state.write().await = SessionState::Disconnected;
                warn!(error = %e, "Wallet connection failed");
                self.notifier
                    .notify(Notification::error("Connection failed", "Failed to connect wallet"));
                Err(e.into())
            }
        }
    }

    /// Restores a previous session without prompting. Only reconnects when
    /// the connection flag is set and the wallet still exposes an account;
    /// otherwise the flag is cleared.
    pub async fn auto_connect(&self) -> Result<SessionState, ExecutionError> {
        if !self.settings.load().await?.connected {
            return Ok(self.state().await);
        }
        let Some(provider) = self.provider.as_ref() else {
            return Ok(self.state().await);
        };

        match provider.accounts().await {
            Ok(accounts) if !accounts.is_empty() => self.connect_with(true).await,
            Ok(_) => {
                debug!("Wallet no longer exposes accounts");
                self.persist_connected(false).await;
                Ok(self.state().await)
            }
            Err(e) => {
                warn!(error = %e, "Auto-connect failed");
                self.persist_connected(false).await;
                Ok(self.state().await)
            }
        }
    }

    /// Clears the session and the persisted flag.
    pub async fn disconnect(&self) {
        *self.state.write().await = SessionState::Disconnected;
        self.on_disconnected().await;
    }

    async fn on_disconnected(&self) {
        self.persist_connected(false).await;
        info!("Wallet disconnected");
        self.notifier
            .notify(Notification::info("Disconnected", "Wallet disconnected"));
    }

    /// Asks the wallet to move to `target`, or to the registry's first
    /// network. A chain the wallet does not know yet is added first.
    pub async fn switch_network(&self, target: Option<u64>) -> Result<(), ExecutionError> {
        let Some(provider) = self.provider.as_ref() else {
            return Err(ExecutionError::WalletNotFound);
        };
        let network = match target {
            Some(chain_id) => self.registry.find(chain_id),
            None => self.registry.default_network(),
        };

        let result = match network {
            Some(network) => request_switch(provider.as_ref(), network)
                .await
                .map_err(ExecutionError::from),
            None => Err(ExecutionError::UnsupportedNetwork(target.unwrap_or_default())),
        };
        if let Err(e) = &result {
            warn!(error = %e, ?target, "Network switch failed");
            self.notifier.notify(Notification::error(
                "Network switch failed",
                "Failed to switch network",
            ));
        }
        result
    }

    /// Applies a provider notification.
    pub async fn handle_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
                None => {
                    let changed = {
                        let mut state = self.state.write().await;
                        let was_connected = state.is_connected();
                        if was_connected {
                            *state = SessionState::Disconnected;
                        }
                        was_connected
                    };
                    if changed {
                        self.on_disconnected().await;
                    }
                }
                Some(&next) => {
                    let mut state = self.state.write().await;
                    match &mut *state {
                        SessionState::Connected { account, .. }
                        | SessionState::WrongNetwork { account, .. }
                            if *account != next =>
                        {
                            info!(from = %account, to = %next, "Account changed");
                            *account = next;
                        }
                        _ => {}
                    }
                }
            },
            ProviderEvent::ChainChanged(chain_id) => {
                let unsupported = {
                    let mut state = self.state.write().await;
                    let Some(account) = state.account() else {
                        return;
                    };
                    *state = self.classify(account, chain_id);
                    info!(chain_id, state = ?*state, "Chain changed");
                    matches!(*state, SessionState::WrongNetwork { .. })
                };
                if unsupported {
                    self.notify_unsupported();
                }
            }
            ProviderEvent::Disconnect => {
                let mut state = self.state.write().await;
                if state.is_connected() {
                    warn!("Provider disconnected");
                    *state = SessionState::Disconnected;
                }
            }
        }
    }

    /// Spawns a task feeding provider notifications into the session until
    /// the provider's event stream closes.
    pub fn listen(self: &Arc<Self>) -> Option<JoinHandle<()>>
    where
        P: 'static,
    {
        let mut events = self.provider.as_ref()?.subscribe();
        let session = Arc::clone(self);
        Some(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => session.handle_event(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Provider events lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("Provider event stream closed");
        }))
    }
}

async fn request_session<P: Eip1193Provider + ?Sized>(
    provider: &P,
) -> Result<(Address, u64), ProviderError> {
    let accounts = provider.request_accounts().await?;
    let account = accounts
        .first()
        .copied()
        .ok_or_else(|| ProviderError::Decode("wallet returned no accounts".into()))?;
    let chain_id = provider.chain_id().await?;
    Ok((account, chain_id))
}

async fn request_switch<P: Eip1193Provider + ?Sized>(
    provider: &P,
    network: &NetworkConfig,
) -> Result<(), ProviderError> {
    let chain_id = network.chain_id_hex();
    match provider
        .request("wallet_switchEthereumChain", json!([{ "chainId": chain_id }]))
        .await
    {
        Ok(_) => Ok(()),
        Err(ProviderError::UnrecognizedChain) => {
            info!(chain_id = network.chain_id, "Adding chain to wallet");
            provider
                .request(
                    "wallet_addEthereumChain",
                    json!([{
                        "chainId": chain_id,
                        "chainName": network.name,
                        "rpcUrls": [network.rpc_url],
                        "nativeCurrency": network.native_currency,
                        "blockExplorerUrls": [network.explorer_url],
                    }]),
                )
                .await
                .map(|_| ())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MemoryNotifier;
    use amm_client_data::{MemorySettingsStore, Settings};
    use amm_client_domain::network::{ContractAddresses, NativeCurrency};
    use amm_client_protocols::provider::ScriptedProvider;
    use serde_json::Value;

    const ACCOUNT: Address = Address::repeat_byte(0xab);
    const SUPPORTED: u64 = 1946;

    fn registry() -> NetworkRegistry {
        NetworkRegistry::new(vec![NetworkConfig {
            chain_id: SUPPORTED,
            name: "Minato".into(),
            rpc_url: "https://rpc.example".into(),
            explorer_url: "https://explorer.example".into(),
            native_currency: NativeCurrency {
                name: "Ether".into(),
                symbol: "ETH".into(),
                decimals: 18,
            },
            contracts: ContractAddresses {
                factory: Address::repeat_byte(1),
                router: Address::repeat_byte(2),
                wrapped_native: Address::repeat_byte(3),
            },
        }])
    }

    struct Harness {
        session: Arc<WalletSession<ScriptedProvider>>,
        provider: Arc<ScriptedProvider>,
        notifier: Arc<MemoryNotifier>,
        settings: Arc<MemorySettingsStore>,
    }

    fn harness(
        settings: Settings,
        handler: impl Fn(&str, &Value) -> Result<Value, ProviderError> + Send + Sync + 'static,
    ) -> Harness {
        let provider = Arc::new(ScriptedProvider::new(handler));
        let notifier = Arc::new(MemoryNotifier::new());
        let settings = Arc::new(MemorySettingsStore::new(settings));
        let session = Arc::new(WalletSession::new(
            Some(Arc::clone(&provider)),
            registry(),
            settings.clone(),
            notifier.clone(),
        ));
        Harness {
            session,
            provider,
            notifier,
            settings,
        }
    }

    fn wallet_on(chain_id: u64) -> impl Fn(&str, &Value) -> Result<Value, ProviderError> + Send + Sync {
        move |method, _| match method {
            "eth_requestAccounts" | "eth_accounts" => Ok(json!([ACCOUNT])),
            "eth_chainId" => Ok(json!(format!("{chain_id:#x}"))),
            _ => Ok(Value::Null),
        }
    }

    #[tokio::test]
    async fn test_connect_on_supported_chain() {
        let h = harness(Settings::default(), wallet_on(SUPPORTED));
        let state = h.session.connect().await.unwrap();
        assert_eq!(
            state,
            SessionState::Connected {
                account: ACCOUNT,
                chain_id: SUPPORTED
            }
        );
        let status = h.session.status().await;
        assert!(status.connected && status.correct_network && !status.connecting);
        assert_eq!(status.network.unwrap().chain_id, SUPPORTED);
        assert!(h.settings.load().await.unwrap().connected);
        assert_eq!(h.notifier.titles(), vec!["Connected"]);
    }

    #[tokio::test]
    async fn test_wrong_network_is_distinct_from_disconnected() {
        let h = harness(Settings::default(), wallet_on(1));
        let state = h.session.connect().await.unwrap();
        assert!(matches!(state, SessionState::WrongNetwork { chain_id: 1, .. }));
        let status = h.session.status().await;
        assert!(status.connected);
        assert!(!status.correct_network);
        assert!(matches!(
            h.session.require_ready().await,
            Err(ExecutionError::UnsupportedNetwork(1))
        ));
        assert_eq!(h.notifier.titles(), vec!["Connected", "Unsupported network"]);
    }

    #[tokio::test]
    async fn test_rejection_leaves_session_disconnected() {
        let h = harness(Settings::default(), |method, _| match method {
            "eth_requestAccounts" => Err(ProviderError::from_rpc(4001, "User rejected")),
            _ => Ok(Value::Null),
        });
        let err = h.session.connect().await.unwrap_err();
        assert!(matches!(err, ExecutionError::Provider(ProviderError::UserRejected)));
        assert_eq!(h.session.state().await, SessionState::Disconnected);
        assert!(!h.settings.load().await.unwrap().connected);
        assert_eq!(h.notifier.titles(), vec!["Connection failed"]);
    }

    #[tokio::test]
    async fn test_missing_wallet() {
        let notifier = Arc::new(MemoryNotifier::new());
        let session: WalletSession<ScriptedProvider> = WalletSession::new(
            None,
            registry(),
            Arc::new(MemorySettingsStore::default()),
            notifier.clone(),
        );
        assert!(matches!(session.connect().await, Err(ExecutionError::WalletNotFound)));
        assert_eq!(session.state().await, SessionState::Disconnected);
        assert_eq!(notifier.titles(), vec!["Wallet not found"]);
    }

    #[tokio::test]
    async fn test_auto_connect_is_silent_and_clears_stale_flag() {
        let remembered = Settings {
            connected: true,
            slippage: None,
        };
        let h = harness(remembered.clone(), wallet_on(SUPPORTED));
        let state = h.session.auto_connect().await.unwrap();
        assert!(state.is_connected());
        assert!(h.notifier.titles().is_empty());
        assert!(!h.provider.methods().is_empty());

        let stale = harness(remembered, |method, _| match method {
            "eth_accounts" => Ok(json!([])),
            _ => Ok(Value::Null),
        });
        let state = stale.session.auto_connect().await.unwrap();
        assert_eq!(state, SessionState::Disconnected);
        assert!(!stale.settings.load().await.unwrap().connected);
        assert!(!stale.provider.methods().contains(&"eth_requestAccounts".to_string()));
    }

    #[tokio::test]
    async fn test_auto_connect_without_flag_does_nothing() {
        let h = harness(Settings::default(), wallet_on(SUPPORTED));
        assert_eq!(h.session.auto_connect().await.unwrap(), SessionState::Disconnected);
        assert!(h.provider.methods().is_empty());
    }

    #[tokio::test]
    async fn test_empty_accounts_disconnects_exactly_once() {
        let h = harness(Settings::default(), wallet_on(SUPPORTED));
        h.session.connect().await.unwrap();
        h.notifier.drain();

        h.session.handle_event(ProviderEvent::AccountsChanged(vec![])).await;
        h.session.handle_event(ProviderEvent::AccountsChanged(vec![])).await;

        assert_eq!(h.session.state().await, SessionState::Disconnected);
        assert_eq!(h.notifier.titles(), vec!["Disconnected"]);
        assert!(!h.settings.load().await.unwrap().connected);
    }

    #[tokio::test]
    async fn test_account_and_chain_changes() {
        let h = harness(Settings::default(), wallet_on(SUPPORTED));
        h.session.connect().await.unwrap();

        let other = Address::repeat_byte(0xcd);
        h.session.handle_event(ProviderEvent::AccountsChanged(vec![other])).await;
        assert_eq!(h.session.state().await.account(), Some(other));

        h.session.handle_event(ProviderEvent::ChainChanged(5)).await;
        assert_eq!(
            h.session.state().await,
            SessionState::WrongNetwork {
                account: other,
                chain_id: 5
            }
        );

        h.session.handle_event(ProviderEvent::ChainChanged(SUPPORTED)).await;
        assert!(h.session.require_ready().await.is_ok());
    }

    #[tokio::test]
    async fn test_chain_change_while_disconnected_is_ignored() {
        let h = harness(Settings::default(), wallet_on(SUPPORTED));
        h.session.handle_event(ProviderEvent::ChainChanged(SUPPORTED)).await;
        assert_eq!(h.session.state().await, SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_switch_adds_unknown_chain() {
        let h = harness(Settings::default(), |method, _| match method {
            "wallet_switchEthereumChain" => Err(ProviderError::from_rpc(4902, "Unrecognized chain")),
            _ => Ok(Value::Null),
        });
        h.session.switch_network(None).await.unwrap();
        assert_eq!(
            h.provider.methods(),
            vec!["wallet_switchEthereumChain", "wallet_addEthereumChain"]
        );

        let added = &h.provider.requests_for("wallet_addEthereumChain")[0][0];
        assert_eq!(added["chainId"], "0x79a");
        assert_eq!(added["rpcUrls"][0], "https://rpc.example");
        assert_eq!(added["nativeCurrency"]["symbol"], "ETH");
        assert!(h.notifier.titles().is_empty());
    }

    #[tokio::test]
    async fn test_switch_failures_notify() {
        let h = harness(Settings::default(), |method, _| match method {
            "wallet_switchEthereumChain" => Err(ProviderError::from_rpc(4001, "User rejected")),
            _ => Ok(Value::Null),
        });
        assert!(h.session.switch_network(None).await.is_err());
        assert!(matches!(
            h.session.switch_network(Some(999)).await,
            Err(ExecutionError::UnsupportedNetwork(999))
        ));
        assert_eq!(
            h.notifier.titles(),
            vec!["Network switch failed", "Network switch failed"]
        );
        assert!(h.provider.requests_for("wallet_addEthereumChain").is_empty());
    }

    #[tokio::test]
    async fn test_listener_applies_pushed_events() {
        let h = harness(Settings::default(), wallet_on(SUPPORTED));
        h.session.connect().await.unwrap();
        let handle = h.session.listen().unwrap();

        h.provider.emit(ProviderEvent::AccountsChanged(vec![]));
        for _ in 0..50 {
            if !h.session.state().await.is_connected() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(h.session.state().await, SessionState::Disconnected);
        handle.abort();
    }
}
