//! Read-side access to the factory, router, pairs and tokens.

use crate::PairFetcher;
use crate::contracts::{IERC20, IUniswapV2Factory, IUniswapV2Pair, IUniswapV2Router02};
use crate::convert::{from_abi, to_abi};
use crate::error::ProviderError;
use crate::provider::{Eip1193Provider, ProviderExt};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use amm_client_domain::network::ContractAddresses;
use amm_client_domain::pool::{LiquidityPosition, PairSnapshot};
use amm_client_domain::token::{Token, TokenAmount};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Pairs scanned when listing positions, newest first.
pub const POSITION_SCAN_LIMIT: u64 = 100;

/// Reads DEX state through a wallet provider.
pub struct DexReader<P: ?Sized> {
    provider: Arc<P>,
    contracts: ContractAddresses,
}

impl<P: ?Sized> Clone for DexReader<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            contracts: self.contracts,
        }
    }
}

impl<P: Eip1193Provider + ?Sized> DexReader<P> {
    pub fn new(provider: Arc<P>, contracts: ContractAddresses) -> Self {
        Self {
            provider,
            contracts,
        }
    }

    pub fn contracts(&self) -> &ContractAddresses {
        &self.contracts
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    async fn read<C: SolCall + Send>(&self, to: Address, call: C) -> Result<C::Return, ProviderError> {
        let data = self.provider.call(to, Bytes::from(call.abi_encode())).await?;
        Ok(C::abi_decode_returns(&data, true)?)
    }

    /// Pair contract for two tokens, `None` when the factory has none.
    pub async fn get_pair(&self, token_a: Address, token_b: Address) -> Result<Option<Address>, ProviderError> {
        let pair = self
            .read(
                self.contracts.factory,
                IUniswapV2Factory::getPairCall {
                    tokenA: token_a,
                    tokenB: token_b,
                },
            )
            .await?
            .pair;
        Ok((pair != Address::ZERO).then_some(pair))
    }

    /// Reserves in the pair's own (token0, token1) order.
    pub async fn reserves(&self, pair: Address) -> Result<(TokenAmount, TokenAmount), ProviderError> {
        let r = self.read(pair, IUniswapV2Pair::getReservesCall {}).await?;
        Ok((
            TokenAmount::from(r.reserve0.to::<u128>()),
            TokenAmount::from(r.reserve1.to::<u128>()),
        ))
    }

    pub async fn token0(&self, pair: Address) -> Result<Address, ProviderError> {
        Ok(self.read(pair, IUniswapV2Pair::token0Call {}).await?.token)
    }

    pub async fn token1(&self, pair: Address) -> Result<Address, ProviderError> {
        Ok(self.read(pair, IUniswapV2Pair::token1Call {}).await?.token)
    }

    pub async fn total_supply(&self, pair: Address) -> Result<TokenAmount, ProviderError> {
        let supply = self.read(pair, IUniswapV2Pair::totalSupplyCall {}).await?.supply;
        Ok(from_abi(supply))
    }

    /// Reads a pair oriented to the (A, B) order given. The LP balance is
    /// zero when no owner is supplied.
    #[instrument(skip(self, token_a, token_b), fields(a = %token_a.symbol, b = %token_b.symbol))]
    pub async fn pair_snapshot(
        &self,
        token_a: &Token,
        token_b: &Token,
        owner: Option<Address>,
    ) -> Result<Option<PairSnapshot>, ProviderError> {
        let wrapped = self.contracts.wrapped_native;
        let address_a = token_a.contract_address(wrapped);
        let address_b = token_b.contract_address(wrapped);
        let Some(pair) = self.get_pair(address_a, address_b).await? else {
            debug!("No pair deployed");
            return Ok(None);
        };

        let reserves = self.reserves(pair).await?;
        let token0 = self.token0(pair).await?;
        let total_supply = self.total_supply(pair).await?;
        let lp_balance = match owner {
            Some(owner) => self.erc20_balance(pair, owner).await?,
            None => TokenAmount::zero(),
        };

        Ok(Some(PairSnapshot::from_pair_order(
            pair,
            address_a,
            token0,
            reserves,
            total_supply,
            lp_balance,
        )))
    }

    async fn erc20_balance(&self, token: Address, owner: Address) -> Result<TokenAmount, ProviderError> {
        let balance = self.read(token, IERC20::balanceOfCall { owner }).await?.balance;
        Ok(from_abi(balance))
    }

    /// Balance of `owner`, reading the account balance for the native asset.
    pub async fn token_balance(&self, token: &Token, owner: Address) -> Result<TokenAmount, ProviderError> {
        if token.is_native {
            return self.native_balance(owner).await;
        }
        self.erc20_balance(token.address, owner).await
    }

    pub async fn native_balance(&self, owner: Address) -> Result<TokenAmount, ProviderError> {
        Ok(from_abi(self.provider.balance(owner).await?))
    }

    /// Router allowance granted by `owner`. The native asset needs none
    /// and reads as the maximum.
    pub async fn allowance(&self, token: &Token, owner: Address) -> Result<TokenAmount, ProviderError> {
        if token.is_native {
            return Ok(from_abi(U256::MAX));
        }
        self.lp_allowance(token.address, owner).await
    }

    /// Router allowance on any ERC-20, LP tokens included.
    pub async fn lp_allowance(&self, token: Address, owner: Address) -> Result<TokenAmount, ProviderError> {
        let remaining = self
            .read(
                token,
                IERC20::allowanceCall {
                    owner,
                    spender: self.contracts.router,
                },
            )
            .await?
            .remaining;
        Ok(from_abi(remaining))
    }

    pub async fn all_pairs_length(&self) -> Result<u64, ProviderError> {
        let length = self
            .read(self.contracts.factory, IUniswapV2Factory::allPairsLengthCall {})
            .await?
            .length;
        u64::try_from(length).map_err(|_| ProviderError::Decode(format!("pair count {length}")))
    }

    pub async fn all_pairs(&self, index: u64) -> Result<Address, ProviderError> {
        Ok(self
            .read(
                self.contracts.factory,
                IUniswapV2Factory::allPairsCall {
                    index: U256::from(index),
                },
            )
            .await?
            .pair)
    }

    fn path(&self, tokens: &[&Token]) -> Vec<Address> {
        tokens
            .iter()
            .map(|t| t.contract_address(self.contracts.wrapped_native))
            .collect()
    }

    /// Router quote for selling `amount_in` along `path`.
    pub async fn get_amounts_out(
        &self,
        amount_in: TokenAmount,
        path: &[&Token],
    ) -> Result<Vec<TokenAmount>, ProviderError> {
        let amounts = self
            .read(
                self.contracts.router,
                IUniswapV2Router02::getAmountsOutCall {
                    amountIn: to_abi(amount_in),
                    path: self.path(path),
                },
            )
            .await?
            .amounts;
        Ok(amounts.into_iter().map(from_abi).collect())
    }

    /// Router quote for buying `amount_out` along `path`.
    pub async fn get_amounts_in(
        &self,
        amount_out: TokenAmount,
        path: &[&Token],
    ) -> Result<Vec<TokenAmount>, ProviderError> {
        let amounts = self
            .read(
                self.contracts.router,
                IUniswapV2Router02::getAmountsInCall {
                    amountOut: to_abi(amount_out),
                    path: self.path(path),
                },
            )
            .await?
            .amounts;
        Ok(amounts.into_iter().map(from_abi).collect())
    }

    /// Name, symbol and decimals read from the token contract.
    pub async fn token_metadata(&self, address: Address) -> Result<Token, ProviderError> {
        let name = self.read(address, IERC20::nameCall {}).await?.name;
        let symbol = self.read(address, IERC20::symbolCall {}).await?.symbol;
        let decimals = self.read(address, IERC20::decimalsCall {}).await?.decimals;
        Ok(Token::new(address, symbol, decimals, name))
    }

    async fn resolve_token(&self, address: Address, known: &[Token]) -> Result<Token, ProviderError> {
        if let Some(token) = known
            .iter()
            .find(|t| !t.is_native && t.address == address)
        {
            return Ok(token.clone());
        }
        self.token_metadata(address).await
    }

    /// Pairs in which `owner` holds LP tokens, scanning the `limit` most
    /// recently created pairs newest first. Pairs that fail to read are
    /// skipped.
    #[instrument(skip(self, known))]
    pub async fn liquidity_positions(
        &self,
        owner: Address,
        known: &[Token],
        limit: u64,
    ) -> Result<Vec<LiquidityPosition>, ProviderError> {
        let length = self.all_pairs_length().await?;
        let start = length.saturating_sub(limit);
        let mut positions = Vec::new();

        for index in (start..length).rev() {
            let pair = self.all_pairs(index).await?;
            match self.position(pair, owner, known).await {
                Ok(Some(position)) => positions.push(position),
                Ok(None) => {}
                Err(e) => warn!(%pair, error = %e, "Skipping unreadable pair"),
            }
        }

        debug!(found = positions.len(), scanned = length - start, "Scanned pairs");
        Ok(positions)
    }

    async fn position(
        &self,
        pair: Address,
        owner: Address,
        known: &[Token],
    ) -> Result<Option<LiquidityPosition>, ProviderError> {
        let lp_balance = self.erc20_balance(pair, owner).await?;
        if lp_balance.is_zero() {
            return Ok(None);
        }
        let token0 = self.resolve_token(self.token0(pair).await?, known).await?;
        let token1 = self.resolve_token(self.token1(pair).await?, known).await?;
        let (reserve0, reserve1) = self.reserves(pair).await?;
        let total_supply = self.total_supply(pair).await?;

        Ok(Some(LiquidityPosition {
            pair_address: pair,
            token0,
            token1,
            reserve0,
            reserve1,
            lp_balance,
            total_supply,
        }))
    }
}

#[async_trait]
impl<P: Eip1193Provider + ?Sized> PairFetcher for DexReader<P> {
    async fn fetch_pair(
        &self,
        token_a: &Token,
        token_b: &Token,
        owner: Option<Address>,
    ) -> Result<Option<PairSnapshot>, ProviderError> {
        self.pair_snapshot(token_a, token_b, owner).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ScriptedProvider;
    use alloy_sol_types::SolValue;
    use serde_json::{Value, json};

    const FACTORY: Address = Address::repeat_byte(0xfa);
    const ROUTER: Address = Address::repeat_byte(0xee);
    const WETH: Address = Address::repeat_byte(0x0e);
    const TOKEN_X: Address = Address::repeat_byte(0x01);
    const PAIR: Address = Address::repeat_byte(0x99);
    const OWNER: Address = Address::repeat_byte(0x42);

    fn contracts() -> ContractAddresses {
        ContractAddresses {
            factory: FACTORY,
            router: ROUTER,
            wrapped_native: WETH,
        }
    }

    fn encoded(bytes: Vec<u8>) -> Result<Value, ProviderError> {
        Ok(json!(Bytes::from(bytes)))
    }

    /// Answers `eth_call` for a single WETH/X pair where WETH is token0
    /// holding 1000 against 4000 X.
    fn chain(method: &str, params: &Value) -> Result<Value, ProviderError> {
        match method {
            "eth_getBalance" => Ok(json!("0x64")),
            "eth_call" => {
                let to: Address = serde_json::from_value(params[0]["to"].clone())?;
                let data: Bytes = serde_json::from_value(params[0]["data"].clone())?;
                let selector: [u8; 4] = data[..4].try_into().map_err(|_| ProviderError::Decode("short".into()))?;
                let word = |v: U256| encoded(v.abi_encode());
                match selector {
                    IUniswapV2Factory::getPairCall::SELECTOR if to == FACTORY => {
                        let call = IUniswapV2Factory::getPairCall::abi_decode(&data, true)?;
                        let known = [call.tokenA, call.tokenB];
                        let pair = if known.contains(&WETH) && known.contains(&TOKEN_X) {
                            PAIR
                        } else {
                            Address::ZERO
                        };
                        encoded(pair.abi_encode())
                    }
                    IUniswapV2Factory::allPairsLengthCall::SELECTOR => word(U256::from(1u64)),
                    IUniswapV2Factory::allPairsCall::SELECTOR => encoded(PAIR.abi_encode()),
                    IUniswapV2Pair::getReservesCall::SELECTOR if to == PAIR => encoded(
                        (U256::from(1000u64), U256::from(4000u64), U256::ZERO).abi_encode_params(),
                    ),
                    IUniswapV2Pair::token0Call::SELECTOR => encoded(WETH.abi_encode()),
                    IUniswapV2Pair::token1Call::SELECTOR => encoded(TOKEN_X.abi_encode()),
                    IUniswapV2Pair::totalSupplyCall::SELECTOR => word(U256::from(2000u64)),
                    IERC20::balanceOfCall::SELECTOR if to == PAIR => word(U256::from(500u64)),
                    IERC20::allowanceCall::SELECTOR if to == TOKEN_X => word(U256::from(7u64)),
                    IUniswapV2Router02::getAmountsOutCall::SELECTOR if to == ROUTER => {
                        encoded(vec![U256::from(10u64), U256::from(39u64)].abi_encode())
                    }
                    _ => Err(ProviderError::from_rpc(-32000, "execution reverted")),
                }
            }
            _ => Err(ProviderError::from_rpc(-32601, "method not found")),
        }
    }

    fn reader() -> DexReader<ScriptedProvider> {
        DexReader::new(Arc::new(ScriptedProvider::new(chain)), contracts())
    }

    fn token_x() -> Token {
        Token::new(TOKEN_X, "X", 18, "Token X")
    }

    #[tokio::test]
    async fn test_missing_pair_reads_as_none() {
        let reader = reader();
        assert_eq!(reader.get_pair(TOKEN_X, Address::repeat_byte(0x02)).await.unwrap(), None);
        assert_eq!(reader.get_pair(WETH, TOKEN_X).await.unwrap(), Some(PAIR));
    }

    #[tokio::test]
    async fn test_snapshot_is_oriented_to_caller_order() {
        let reader = reader();
        let eth = Token::native("ETH", 18, "Ether");

        let snapshot = reader
            .pair_snapshot(&token_x(), &eth, Some(OWNER))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.reserve_a, 4000u64.into());
        assert_eq!(snapshot.reserve_b, 1000u64.into());
        assert_eq!(snapshot.lp_balance, 500u64.into());
        assert_eq!(snapshot.total_supply, 2000u64.into());

        let unowned = reader.fetch_pair(&eth, &token_x(), None).await.unwrap().unwrap();
        assert_eq!(unowned.reserve_a, 1000u64.into());
        assert!(unowned.lp_balance.is_zero());
    }

    #[tokio::test]
    async fn test_balances_and_allowances() {
        let reader = reader();
        let eth = Token::native("ETH", 18, "Ether");
        assert_eq!(reader.token_balance(&eth, OWNER).await.unwrap(), 100u64.into());
        assert_eq!(reader.allowance(&token_x(), OWNER).await.unwrap(), 7u64.into());
        assert_eq!(reader.allowance(&eth, OWNER).await.unwrap(), from_abi(U256::MAX));
    }

    #[tokio::test]
    async fn test_router_amounts_out() {
        let reader = reader();
        let eth = Token::native("ETH", 18, "Ether");
        let amounts = reader
            .get_amounts_out(10u64.into(), &[&eth, &token_x()])
            .await
            .unwrap();
        assert_eq!(amounts, vec![10u64.into(), 39u64.into()]);
    }

    #[tokio::test]
    async fn test_liquidity_positions_use_known_tokens() {
        let reader = reader();
        let weth = Token::new(WETH, "WETH", 18, "Wrapped Ether");
        let positions = reader
            .liquidity_positions(OWNER, &[weth, token_x()], POSITION_SCAN_LIMIT)
            .await
            .unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].label(), "WETH/X");
        assert_eq!(positions[0].reserve1, 4000u64.into());
        assert_eq!(positions[0].snapshot().pool_share(), rust_decimal::Decimal::from(25));
    }
}
