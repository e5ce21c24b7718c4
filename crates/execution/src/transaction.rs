//! Transaction submission for approvals, swaps and liquidity changes.
//!
//! Every submission goes through the wallet's `eth_sendTransaction`, then
//! polls for the receipt. The outcome is reported both as a return value
//! and as a notification; a failed or reverted transaction is not retried.

use crate::error::ExecutionError;
use crate::guard::{ActionGuard, ActionKind};
use crate::notify::{Notification, Notifier};
use crate::wallet::WalletSession;
use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::SolCall;
use amm_client_domain::DomainError;
use amm_client_domain::liquidity::removal_amounts;
use amm_client_domain::network::NetworkConfig;
use amm_client_domain::pool::PairSnapshot;
use amm_client_domain::quote::{Quote, TradeType};
use amm_client_domain::slippage::SlippageTolerance;
use amm_client_domain::token::{Token, TokenAmount};
use amm_client_protocols::contracts::{IERC20, IUniswapV2Router02};
use amm_client_protocols::convert::to_abi;
use amm_client_protocols::provider::{TransactionReceipt, TransactionRequest};
use amm_client_protocols::{Eip1193Provider, ProviderExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Router deadline offset, 20 minutes.
pub const DEFAULT_DEADLINE_SECS: u64 = 20 * 60;

#[derive(Debug, Clone)]
pub struct TransactionConfig {
    /// Seconds from submission until the router rejects the call.
    pub deadline_secs: u64,
    /// Delay between receipt queries.
    pub poll_interval: Duration,
    /// Give up waiting for inclusion after this long.
    pub confirmation_timeout: Duration,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            deadline_secs: DEFAULT_DEADLINE_SECS,
            poll_interval: Duration::from_secs(2),
            confirmation_timeout: Duration::from_secs(300),
        }
    }
}

/// Result of one submitted action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionOutcome {
    pub action: ActionKind,
    pub hash: Option<B256>,
    pub success: bool,
    pub block: Option<u64>,
    pub explorer_url: Option<String>,
    pub error: Option<String>,
}

/// Whether the router must be approved before spending `amount`.
pub fn needs_approval(allowance: TokenAmount, amount: TokenAmount) -> bool {
    allowance < amount
}

/// Unix timestamp `secs` from now.
pub fn deadline(secs: u64) -> U256 {
    let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default();
    U256::from(now.saturating_add(secs))
}

fn titles(action: ActionKind) -> (&'static str, &'static str) {
    match action {
        ActionKind::Approve => ("Approval successful", "Approval failed"),
        ActionKind::Swap => ("Swap successful", "Swap failed"),
        ActionKind::AddLiquidity => ("Liquidity added", "Failed to add liquidity"),
        ActionKind::RemoveLiquidity => ("Liquidity removed", "Failed to remove liquidity"),
        ActionKind::Connect => ("Connected", "Connection failed"),
    }
}

/// Contract call ready for submission.
struct PreparedCall {
    to: Address,
    data: Bytes,
    value: Option<U256>,
}

impl PreparedCall {
    fn new(to: Address, call: impl SolCall, value: Option<TokenAmount>) -> Self {
        Self {
            to,
            data: Bytes::from(call.abi_encode()),
            value: value.map(to_abi),
        }
    }
}

/// Submits router and token transactions for one account on one network.
pub struct TransactionManager<P: ?Sized> {
    provider: Arc<P>,
    account: Address,
    network: NetworkConfig,
    notifier: Arc<dyn Notifier>,
    config: TransactionConfig,
    approve_guard: ActionGuard,
    swap_guard: ActionGuard,
    add_guard: ActionGuard,
    remove_guard: ActionGuard,
}

impl<P: Eip1193Provider + ?Sized> TransactionManager<P> {
    pub fn new(
        provider: Arc<P>,
        account: Address,
        network: NetworkConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            provider,
            account,
            network,
            notifier,
            config: TransactionConfig::default(),
            approve_guard: ActionGuard::new(ActionKind::Approve),
            swap_guard: ActionGuard::new(ActionKind::Swap),
            add_guard: ActionGuard::new(ActionKind::AddLiquidity),
            remove_guard: ActionGuard::new(ActionKind::RemoveLiquidity),
        }
    }

    /// Manager for the session's account, provided the session is
    /// connected to a supported network.
    pub async fn for_session(session: &WalletSession<P>) -> Result<Self, ExecutionError> {
        let provider = session
            .provider()
            .cloned()
            .ok_or(ExecutionError::WalletNotFound)?;
        let (account, network) = session.require_ready().await?;
        Ok(Self::new(provider, account, network, Arc::clone(session.notifier())))
    }

    #[must_use]
    pub fn with_config(mut self, config: TransactionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Loading flag for a transaction action. `Connect` is guarded by the
    /// wallet session, not here.
    pub fn guard(&self, action: ActionKind) -> Option<&ActionGuard> {
        match action {
            ActionKind::Approve => Some(&self.approve_guard),
            ActionKind::Swap => Some(&self.swap_guard),
            ActionKind::AddLiquidity => Some(&self.add_guard),
            ActionKind::RemoveLiquidity => Some(&self.remove_guard),
            ActionKind::Connect => None,
        }
    }

    fn router(&self) -> Address {
        self.network.contracts.router
    }

    fn address_of(&self, token: &Token) -> Address {
        token.contract_address(self.network.contracts.wrapped_native)
    }

    /// Lets the router spend `amount` of an ERC-20, LP tokens included.
    #[instrument(skip(self))]
    pub async fn approve(
        &self,
        token: Address,
        amount: TokenAmount,
    ) -> Result<TransactionOutcome, ExecutionError> {
        let call = IERC20::approveCall {
            spender: self.router(),
            value: to_abi(amount),
        };
        self.submit(ActionKind::Approve, PreparedCall::new(token, call, None))
            .await
    }

    /// Executes a quoted swap through the router, bounded by the quote's
    /// slippage limit.
    #[instrument(skip_all, fields(from = %token_in.symbol, to = %token_out.symbol, trade = ?quote.trade_type))]
    pub async fn swap(
        &self,
        token_in: &Token,
        token_out: &Token,
        quote: &Quote,
    ) -> Result<TransactionOutcome, ExecutionError> {
        if token_in.is_native && token_out.is_native {
            return Err(DomainError::NoPool.into());
        }
        let path = vec![self.address_of(token_in), self.address_of(token_out)];
        let to = self.account;
        let deadline = deadline(self.config.deadline_secs);
        let router = self.router();
        let bound = to_abi(quote.slippage_bound);

        let call = match quote.trade_type {
            TradeType::ExactIn if token_in.is_native => PreparedCall::new(
                router,
                IUniswapV2Router02::swapExactETHForTokensCall {
                    amountOutMin: bound,
                    path,
                    to,
                    deadline,
                },
                Some(quote.amount_in),
            ),
            TradeType::ExactIn if token_out.is_native => PreparedCall::new(
                router,
                IUniswapV2Router02::swapExactTokensForETHCall {
                    amountIn: to_abi(quote.amount_in),
                    amountOutMin: bound,
                    path,
                    to,
                    deadline,
                },
                None,
            ),
            TradeType::ExactIn => PreparedCall::new(
                router,
                IUniswapV2Router02::swapExactTokensForTokensCall {
                    amountIn: to_abi(quote.amount_in),
                    amountOutMin: bound,
                    path,
                    to,
                    deadline,
                },
                None,
            ),
            TradeType::ExactOut if token_in.is_native => PreparedCall::new(
                router,
                IUniswapV2Router02::swapETHForExactTokensCall {
                    amountOut: to_abi(quote.amount_out),
                    path,
                    to,
                    deadline,
                },
                Some(quote.slippage_bound),
            ),
            TradeType::ExactOut if token_out.is_native => PreparedCall::new(
                router,
                IUniswapV2Router02::swapTokensForExactETHCall {
                    amountOut: to_abi(quote.amount_out),
                    amountInMax: bound,
                    path,
                    to,
                    deadline,
                },
                None,
            ),
            TradeType::ExactOut => PreparedCall::new(
                router,
                IUniswapV2Router02::swapTokensForExactTokensCall {
                    amountOut: to_abi(quote.amount_out),
                    amountInMax: bound,
                    path,
                    to,
                    deadline,
                },
                None,
            ),
        };
        self.submit(ActionKind::Swap, call).await
    }

    /// Deposits both tokens. Minimums are the desired amounts reduced by
    /// the slippage tolerance.
    #[instrument(skip_all, fields(a = %token_a.symbol, b = %token_b.symbol))]
    pub async fn add_liquidity(
        &self,
        token_a: &Token,
        token_b: &Token,
        amount_a: TokenAmount,
        amount_b: TokenAmount,
        slippage: SlippageTolerance,
    ) -> Result<TransactionOutcome, ExecutionError> {
        if amount_a.is_zero() || amount_b.is_zero() {
            return Err(DomainError::InvalidAmount("both amounts must be positive".into()).into());
        }
        let to = self.account;
        let deadline = deadline(self.config.deadline_secs);
        let router = self.router();

        let native_leg = if token_a.is_native {
            Some((token_b, amount_b, amount_a))
        } else if token_b.is_native {
            Some((token_a, amount_a, amount_b))
        } else {
            None
        };

        let call = match native_leg {
            Some((token, token_amount, native_amount)) => PreparedCall::new(
                router,
                IUniswapV2Router02::addLiquidityETHCall {
                    token: token.address,
                    amountTokenDesired: to_abi(token_amount),
                    amountTokenMin: to_abi(slippage.minimum_amount(token_amount)),
                    amountETHMin: to_abi(slippage.minimum_amount(native_amount)),
                    to,
                    deadline,
                },
                Some(native_amount),
            ),
            None => PreparedCall::new(
                router,
                IUniswapV2Router02::addLiquidityCall {
                    tokenA: token_a.address,
                    tokenB: token_b.address,
                    amountADesired: to_abi(amount_a),
                    amountBDesired: to_abi(amount_b),
                    amountAMin: to_abi(slippage.minimum_amount(amount_a)),
                    amountBMin: to_abi(slippage.minimum_amount(amount_b)),
                    to,
                    deadline,
                },
                None,
            ),
        };
        self.submit(ActionKind::AddLiquidity, call).await
    }

    /// Burns `percent` of the position in `snapshot`, which must be
    /// oriented to (`token_a`, `token_b`). The LP tokens must already be
    /// approved for the router.
    #[instrument(skip_all, fields(a = %token_a.symbol, b = %token_b.symbol, percent = percent))]
    pub async fn remove_liquidity(
        &self,
        token_a: &Token,
        token_b: &Token,
        snapshot: &PairSnapshot,
        percent: u8,
        slippage: SlippageTolerance,
    ) -> Result<TransactionOutcome, ExecutionError> {
        let preview = removal_amounts(snapshot, percent);
        if preview.lp_to_burn.is_zero() {
            return Err(DomainError::InvalidAmount("no liquidity to remove".into()).into());
        }
        let to = self.account;
        let deadline = deadline(self.config.deadline_secs);
        let router = self.router();
        let liquidity = to_abi(preview.lp_to_burn);

        let native_leg = if token_a.is_native {
            Some((token_b, preview.amount_b, preview.amount_a))
        } else if token_b.is_native {
            Some((token_a, preview.amount_a, preview.amount_b))
        } else {
            None
        };

        let call = match native_leg {
            Some((token, token_amount, native_amount)) => PreparedCall::new(
                router,
                IUniswapV2Router02::removeLiquidityETHCall {
                    token: token.address,
                    liquidity,
                    amountTokenMin: to_abi(slippage.minimum_amount(token_amount)),
                    amountETHMin: to_abi(slippage.minimum_amount(native_amount)),
                    to,
                    deadline,
                },
                None,
            ),
            None => PreparedCall::new(
                router,
                IUniswapV2Router02::removeLiquidityCall {
                    tokenA: token_a.address,
                    tokenB: token_b.address,
                    liquidity,
                    amountAMin: to_abi(slippage.minimum_amount(preview.amount_a)),
                    amountBMin: to_abi(slippage.minimum_amount(preview.amount_b)),
                    to,
                    deadline,
                },
                None,
            ),
        };
        self.submit(ActionKind::RemoveLiquidity, call).await
    }

    async fn submit(
        &self,
        action: ActionKind,
        call: PreparedCall,
    ) -> Result<TransactionOutcome, ExecutionError> {
        let Some(_ticket) = self.guard(action).and_then(ActionGuard::try_begin) else {
            return Err(ExecutionError::Busy(action));
        };

        let request = TransactionRequest {
            from: self.account,
            to: call.to,
            data: call.data,
            value: call.value,
        };
        let mut outcome = TransactionOutcome {
            action,
            hash: None,
            success: false,
            block: None,
            explorer_url: None,
            error: None,
        };

        match self.provider.send_transaction(&request).await {
            Ok(hash) => {
                info!(%hash, %action, "Transaction submitted");
                outcome.hash = Some(hash);
                outcome.explorer_url = Some(self.network.explorer_tx_url(&hash.to_string()));
                match self.wait_for_receipt(hash).await {
                    Ok(receipt) => {
                        outcome.block = receipt.block();
                        outcome.success = receipt.succeeded();
                        if !outcome.success {
                            outcome.error = Some("transaction reverted".into());
                        }
                    }
                    Err(e) => outcome.error = Some(e.to_string()),
                }
            }
            Err(e) => outcome.error = Some(e.to_string()),
        }

        let (success_title, failure_title) = titles(action);
        if outcome.success {
            info!(hash = ?outcome.hash, block = ?outcome.block, %action, "Transaction confirmed");
            let detail = outcome.explorer_url.clone().unwrap_or_default();
            self.notifier.notify(Notification::success(success_title, detail));
        } else {
            let detail = outcome.error.clone().unwrap_or_default();
            warn!(hash = ?outcome.hash, %action, error = %detail, "Transaction failed");
            self.notifier.notify(Notification::error(failure_title, detail));
        }
        Ok(outcome)
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt, ExecutionError> {
        let started = Instant::now();
        loop {
            match self.provider.transaction_receipt(hash).await {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => {}
                // the transaction is already broadcast; keep polling
                Err(e) => warn!(%hash, error = %e, "Receipt lookup failed"),
            }
            if started.elapsed() >= self.config.confirmation_timeout {
                return Err(ExecutionError::Timeout(hash));
            }
            debug!(%hash, "Waiting for receipt");
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MemoryNotifier;
    use amm_client_domain::network::{ContractAddresses, NativeCurrency};
    use amm_client_domain::quote::QuoteEstimator;
    use amm_client_protocols::ProviderError;
    use amm_client_protocols::provider::ScriptedProvider;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ACCOUNT: Address = Address::repeat_byte(0xab);
    const ROUTER: Address = Address::repeat_byte(0x02);
    const WETH: Address = Address::repeat_byte(0x03);
    const USDC: Address = Address::repeat_byte(0x04);
    const DAI: Address = Address::repeat_byte(0x05);
    const HASH: B256 = B256::repeat_byte(0x77);

    fn network() -> NetworkConfig {
        NetworkConfig {
            chain_id: 1946,
            name: "Minato".into(),
            rpc_url: "https://rpc.example".into(),
            explorer_url: "https://explorer.example".into(),
            native_currency: NativeCurrency {
                name: "Ether".into(),
                symbol: "ETH".into(),
                decimals: 18,
            },
            contracts: ContractAddresses {
                factory: Address::repeat_byte(0x01),
                router: ROUTER,
                wrapped_native: WETH,
            },
        }
    }

    fn eth() -> Token {
        Token::native("ETH", 18, "Ether")
    }

    fn usdc() -> Token {
        Token::new(USDC, "USDC", 6, "USD Coin")
    }

    fn dai() -> Token {
        Token::new(DAI, "DAI", 18, "Dai")
    }

    fn chain(status: &'static str) -> impl Fn(&str, &Value) -> Result<Value, ProviderError> + Send + Sync {
        move |method, _| match method {
            "eth_sendTransaction" => Ok(json!(HASH)),
            "eth_getTransactionReceipt" => Ok(json!({
                "transactionHash": HASH,
                "blockNumber": "0x2a",
                "status": status,
            })),
            _ => Ok(Value::Null),
        }
    }

    fn manager(
        provider: &Arc<ScriptedProvider>,
    ) -> (TransactionManager<ScriptedProvider>, Arc<MemoryNotifier>) {
        let notifier = Arc::new(MemoryNotifier::new());
        let manager = TransactionManager::new(Arc::clone(provider), ACCOUNT, network(), notifier.clone())
            .with_config(TransactionConfig {
                deadline_secs: DEFAULT_DEADLINE_SECS,
                poll_interval: Duration::from_millis(1),
                confirmation_timeout: Duration::from_millis(20),
            });
        (manager, notifier)
    }

    fn sent(provider: &ScriptedProvider) -> (Address, Bytes, Option<U256>) {
        let params = provider.requests_for("eth_sendTransaction");
        let tx = &params.last().unwrap()[0];
        let to = serde_json::from_value(tx["to"].clone()).unwrap();
        let data = serde_json::from_value(tx["data"].clone()).unwrap();
        let value = tx.get("value").map(|v| serde_json::from_value(v.clone()).unwrap());
        (to, data, value)
    }

    #[test]
    fn test_needs_approval() {
        assert!(needs_approval(TokenAmount::zero(), 1u64.into()));
        assert!(!needs_approval(100u64.into(), 100u64.into()));
    }

    #[test]
    fn test_deadline_is_twenty_minutes_ahead() {
        let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap();
        let deadline: u64 = deadline(DEFAULT_DEADLINE_SECS).to();
        assert!(deadline >= now + 1200 && deadline <= now + 1205);
    }

    #[tokio::test]
    async fn test_native_exact_in_swap_sends_value() {
        let provider = Arc::new(ScriptedProvider::new(chain("0x1")));
        let (manager, notifier) = manager(&provider);
        let quote = QuoteEstimator::default()
            .exact_in(&eth(), &usdc(), 1_000u64.into(), 1_000_000u64.into(), 2_000_000u64.into())
            .unwrap();

        let outcome = manager.swap(&eth(), &usdc(), &quote).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.block, Some(42));
        assert_eq!(outcome.hash, Some(HASH));
        assert!(outcome.explorer_url.unwrap().starts_with("https://explorer.example/tx/0x7777"));

        let (to, data, value) = sent(&provider);
        assert_eq!(to, ROUTER);
        assert_eq!(value, Some(U256::from(1_000u64)));
        let call = IUniswapV2Router02::swapExactETHForTokensCall::abi_decode(&data, true).unwrap();
        assert_eq!(call.path, vec![WETH, USDC]);
        assert_eq!(call.to, ACCOUNT);
        assert_eq!(call.amountOutMin, to_abi(quote.minimum_received().unwrap()));
        assert_eq!(notifier.titles(), vec!["Swap successful"]);
    }

    #[tokio::test]
    async fn test_exact_out_swap_uses_maximum_sold() {
        let provider = Arc::new(ScriptedProvider::new(chain("0x1")));
        let (manager, _) = manager(&provider);
        let quote = QuoteEstimator::default()
            .exact_out(&dai(), &usdc(), 500u64.into(), 1_000_000u64.into(), 1_000_000u64.into())
            .unwrap();

        manager.swap(&dai(), &usdc(), &quote).await.unwrap();
        let (_, data, value) = sent(&provider);
        assert_eq!(value, None);
        let call = IUniswapV2Router02::swapTokensForExactTokensCall::abi_decode(&data, true).unwrap();
        assert_eq!(call.amountOut, U256::from(500u64));
        assert_eq!(call.amountInMax, to_abi(quote.maximum_sold().unwrap()));
        assert_eq!(call.path, vec![DAI, USDC]);
    }

    #[tokio::test]
    async fn test_reverted_receipt_reports_failure() {
        let provider = Arc::new(ScriptedProvider::new(chain("0x0")));
        let (manager, notifier) = manager(&provider);
        let outcome = manager.approve(USDC, 10u64.into()).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("transaction reverted"));
        assert_eq!(notifier.titles(), vec!["Approval failed"]);

        let (to, data, _) = sent(&provider);
        assert_eq!(to, USDC);
        let call = IERC20::approveCall::abi_decode(&data, true).unwrap();
        assert_eq!(call.spender, ROUTER);
    }

    #[tokio::test]
    async fn test_rejected_submission_has_no_hash() {
        let provider = Arc::new(ScriptedProvider::new(|method, _| match method {
            "eth_sendTransaction" => Err(ProviderError::from_rpc(4001, "User denied")),
            _ => Ok(Value::Null),
        }));
        let (manager, notifier) = manager(&provider);
        let outcome = manager
            .add_liquidity(&dai(), &usdc(), 10u64.into(), 20u64.into(), SlippageTolerance::default())
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(outcome.hash.is_none());
        assert_eq!(notifier.titles(), vec!["Failed to add liquidity"]);
    }

    #[tokio::test]
    async fn test_unmined_transaction_times_out() {
        let provider = Arc::new(ScriptedProvider::new(|method, _| match method {
            "eth_sendTransaction" => Ok(json!(HASH)),
            _ => Ok(Value::Null),
        }));
        let (manager, _) = manager(&provider);
        let outcome = manager.approve(USDC, 1u64.into()).await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("not mined"));
    }

    #[tokio::test]
    async fn test_receipt_lookup_error_keeps_polling() {
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&polls);
        let provider = Arc::new(ScriptedProvider::new(move |method, _| match method {
            "eth_sendTransaction" => Ok(json!(HASH)),
            "eth_getTransactionReceipt" => {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ProviderError::Transport("connection reset".into()))
                } else {
                    Ok(json!({
                        "transactionHash": HASH,
                        "blockNumber": "0x2a",
                        "status": "0x1",
                    }))
                }
            }
            _ => Ok(Value::Null),
        }));
        let (manager, notifier) = manager(&provider);
        let outcome = manager.approve(USDC, 1u64.into()).await.unwrap();

        assert!(outcome.success);
        assert!(outcome.error.is_none());
        assert_eq!(polls.load(Ordering::SeqCst), 2);
        assert_eq!(notifier.titles(), vec!["Approval successful"]);
    }

    #[test]
    fn test_connect_has_no_transaction_guard() {
        let provider = Arc::new(ScriptedProvider::new(chain("0x1")));
        let (manager, _) = manager(&provider);
        assert!(manager.guard(ActionKind::Connect).is_none());
        assert_eq!(
            manager.guard(ActionKind::Approve).map(ActionGuard::kind),
            Some(ActionKind::Approve)
        );
    }

    #[tokio::test]
    async fn test_duplicate_submission_refused() {
        let provider = Arc::new(ScriptedProvider::new(chain("0x1")));
        let (manager, _) = manager(&provider);
        let quote = QuoteEstimator::default()
            .exact_in(&dai(), &usdc(), 10u64.into(), 1_000u64.into(), 1_000u64.into())
            .unwrap();

        let pending = manager.guard(ActionKind::Swap).unwrap().try_begin().unwrap();
        let err = manager.swap(&dai(), &usdc(), &quote).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Busy(ActionKind::Swap)));
        assert!(provider.requests_for("eth_sendTransaction").is_empty());

        drop(pending);
        assert!(manager.swap(&dai(), &usdc(), &quote).await.unwrap().success);
    }

    #[tokio::test]
    async fn test_native_add_liquidity_applies_slippage() {
        let provider = Arc::new(ScriptedProvider::new(chain("0x1")));
        let (manager, _) = manager(&provider);
        let slippage = SlippageTolerance::from_bps(100).unwrap();
        manager
            .add_liquidity(&usdc(), &eth(), 1_000u64.into(), 2_000u64.into(), slippage)
            .await
            .unwrap();

        let (_, data, value) = sent(&provider);
        assert_eq!(value, Some(U256::from(2_000u64)));
        let call = IUniswapV2Router02::addLiquidityETHCall::abi_decode(&data, true).unwrap();
        assert_eq!(call.token, USDC);
        assert_eq!(call.amountTokenMin, U256::from(990u64));
        assert_eq!(call.amountETHMin, U256::from(1_980u64));
    }

    #[tokio::test]
    async fn test_remove_liquidity_burns_share() {
        let provider = Arc::new(ScriptedProvider::new(chain("0x1")));
        let (manager, notifier) = manager(&provider);
        let snapshot = PairSnapshot {
            pair_address: Address::repeat_byte(0x99),
            reserve_a: 1_000u64.into(),
            reserve_b: 4_000u64.into(),
            total_supply: 2_000u64.into(),
            lp_balance: 200u64.into(),
        };
        manager
            .remove_liquidity(&dai(), &usdc(), &snapshot, 50, SlippageTolerance::from_bps(0).unwrap())
            .await
            .unwrap();

        let (_, data, _) = sent(&provider);
        let call = IUniswapV2Router02::removeLiquidityCall::abi_decode(&data, true).unwrap();
        assert_eq!(call.liquidity, U256::from(100u64));
        assert_eq!(call.amountAMin, U256::from(50u64));
        assert_eq!(call.amountBMin, U256::from(200u64));
        assert_eq!(notifier.titles(), vec!["Liquidity removed"]);

        let empty = PairSnapshot {
            lp_balance: TokenAmount::zero(),
            ..snapshot
        };
        assert!(
            manager
                .remove_liquidity(&dai(), &usdc(), &empty, 50, SlippageTolerance::default())
                .await
                .is_err()
        );
    }
}
