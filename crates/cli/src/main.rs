//! Command line interface for the AMM client.
use alloy_primitives::Address;
use amm_client_data::config::find_token;
use amm_client_data::{ConfigLoader, JsonSettingsStore, SettingsRepository};
use amm_client_domain::format::{FormatOptions, format_number, format_ratio, format_token_balance};
use amm_client_domain::liquidity::{LiquidityInput, Side, removal_amounts};
use amm_client_domain::math::constant_product::calculate_spot_price;
use amm_client_domain::network::{NetworkConfig, NetworkRegistry};
use amm_client_domain::pool::PairSnapshot;
use amm_client_domain::quote::{Quote, QuoteEstimator};
use amm_client_domain::slippage::SlippageTolerance;
use amm_client_domain::token::{Token, TokenAmount};
use amm_client_execution::prelude::*;
use amm_client_protocols::dex::POSITION_SCAN_LIMIT;
use amm_client_protocols::provider::HttpProvider;
use amm_client_protocols::{DexReader, PairFetcher};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod output;

#[derive(Parser)]
#[command(name = "amm-cli")]
#[command(about = "Wallet, quote and liquidity client for constant-product AMMs", long_about = None)]
struct Cli {
    /// Directory holding networks.json and tokens.json
    #[arg(long, env = "AMM_CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    /// Settings file remembering the connection and slippage
    #[arg(long, env = "AMM_SETTINGS_PATH", default_value = ".amm-client/settings.json")]
    settings: PathBuf,

    /// JSON-RPC endpoint overriding the network's own
    #[arg(long, env = "AMM_RPC_URL")]
    rpc_url: Option<String>,

    /// Chain to use; defaults to the first configured network
    #[arg(long)]
    chain: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported networks
    Networks,
    /// List tokens for the selected network
    Tokens,
    /// Show or change the slippage tolerance
    Slippage {
        #[command(subcommand)]
        action: Option<SlippageAction>,
    },
    /// Preview a swap from pool reserves
    Quote {
        from: String,
        to: String,
        amount: String,
        /// Treat the amount as the exact output
        #[arg(long)]
        exact_out: bool,
    },
    /// Show reserves, ratio and optionally an account's share of a pair
    Pool {
        token_a: String,
        token_b: String,
        #[arg(long)]
        owner: Option<Address>,
    },
    /// Amount of token B matching an amount of token A at the pool ratio
    Paired {
        token_a: String,
        token_b: String,
        amount_a: String,
    },
    /// List pairs in which an account holds LP tokens
    Positions { owner: Address },
    /// Show a token balance
    Balance {
        token: String,
        owner: Address,
        /// Keep polling until interrupted
        #[arg(long)]
        watch: bool,
    },
    /// Connect the wallet exposed by the RPC node
    Connect,
    /// Forget the wallet connection
    Disconnect,
    /// Restore the previous connection and show the session
    Status,
    /// Ask the wallet to switch networks
    SwitchNetwork { chain_id: Option<u64> },
    /// Approve the router to spend a token
    Approve { token: String, amount: String },
    /// Execute a swap
    Swap {
        from: String,
        to: String,
        amount: String,
        #[arg(long)]
        exact_out: bool,
    },
    /// Deposit liquidity; the second amount follows the pool ratio when omitted
    AddLiquidity {
        token_a: String,
        token_b: String,
        amount_a: String,
        amount_b: Option<String>,
    },
    /// Withdraw a percentage of a liquidity position
    RemoveLiquidity {
        token_a: String,
        token_b: String,
        #[arg(value_parser = clap::value_parser!(u8).range(1..=100))]
        percent: u8,
    },
}

#[derive(Subcommand)]
enum SlippageAction {
    /// Set the tolerance in percent, e.g. 0.5
    Set { value: String },
    /// Restore the default tolerance
    Reset,
}

struct App {
    registry: NetworkRegistry,
    network: NetworkConfig,
    tokens: Vec<Token>,
    settings: Arc<JsonSettingsStore>,
    provider: Arc<HttpProvider>,
    reader: DexReader<HttpProvider>,
}

impl App {
    async fn load(cli: &Cli) -> Result<Self> {
        let loader = ConfigLoader::new(&cli.config_dir);
        let registry = loader.networks().await?;
        let network = match cli.chain {
            Some(id) => registry
                .find(id)
                .with_context(|| format!("chain {id} is not configured"))?,
            None => registry.default_network().context("no networks configured")?,
        }
        .clone();
        let tokens = loader.tokens(&network).await?;
        let rpc_url = cli.rpc_url.clone().unwrap_or_else(|| network.rpc_url.clone());
        debug!(chain_id = network.chain_id, %rpc_url, "Using network");

        let provider = Arc::new(HttpProvider::new(rpc_url));
        let reader = DexReader::new(Arc::clone(&provider), network.contracts);
        Ok(Self {
            settings: Arc::new(JsonSettingsStore::new(&cli.settings)),
            registry,
            network,
            tokens,
            provider,
            reader,
        })
    }

    fn token(&self, query: &str) -> Result<Token> {
        find_token(&self.tokens, query)
            .cloned()
            .with_context(|| format!("unknown token {query} on {}", self.network.name))
    }

    async fn slippage(&self) -> Result<SlippageTolerance> {
        Ok(self.settings.load().await?.slippage_tolerance())
    }

    async fn pair(&self, a: &Token, b: &Token, owner: Option<Address>) -> Result<PairSnapshot> {
        self.reader
            .fetch_pair(a, b, owner)
            .await?
            .with_context(|| format!("no liquidity pool for {}/{}", a.symbol, b.symbol))
    }

    fn session(&self) -> WalletSession<HttpProvider> {
        WalletSession::new(
            Some(Arc::clone(&self.provider)),
            self.registry.clone(),
            self.settings.clone(),
            Arc::new(TracingNotifier),
        )
    }

    async fn transactions(&self) -> Result<TransactionManager<HttpProvider>> {
        let session = self.session();
        session.connect().await?;
        Ok(TransactionManager::for_session(&session).await?)
    }

    async fn quote(&self, from: &Token, to: &Token, amount: &str, exact_out: bool) -> Result<Quote> {
        let pool = self.pair(from, to, None).await?;
        let estimator = QuoteEstimator::new(self.slippage().await?);
        let quote = if exact_out {
            let amount = TokenAmount::parse_units(amount, to.decimals)?;
            estimator.exact_out(from, to, amount, pool.reserve_a, pool.reserve_b)?
        } else {
            let amount = TokenAmount::parse_units(amount, from.decimals)?;
            estimator.exact_in(from, to, amount, pool.reserve_a, pool.reserve_b)?
        };
        Ok(quote)
    }
}

fn amount(value: TokenAmount, token: &Token) -> String {
    format!(
        "{} {}",
        format_token_balance(&value.format_units(token.decimals), false),
        token.symbol
    )
}

fn print_outcome(outcome: &TransactionOutcome) -> Result<()> {
    match (&outcome.explorer_url, outcome.success) {
        (Some(url), true) => println!("✅ {} confirmed in block {:?}: {url}", outcome.action, outcome.block),
        _ => bail!(
            "{} failed: {}",
            outcome.action,
            outcome.error.as_deref().unwrap_or("unknown error")
        ),
    }
    Ok(())
}

fn print_quote(quote: &Quote, from: &Token, to: &Token, slippage: SlippageTolerance) {
    let percent = FormatOptions {
        max_decimals: 2,
        min_decimals: 2,
        ..Default::default()
    };
    println!("Route:           {}", quote.route.join(" → "));
    println!("You pay:         {}", amount(quote.amount_in, from));
    println!("You receive:     {}", amount(quote.amount_out, to));
    println!(
        "Rate:            1 {} = {} {}",
        to.symbol,
        format_ratio(quote.execution_price),
        from.symbol
    );
    println!("Price impact:    {}%", format_number(quote.price_impact, percent));
    println!("LP fee:          {}", amount(quote.fee, from));
    if let Some(min) = quote.minimum_received() {
        println!("Minimum received ({slippage}): {}", amount(min, to));
    }
    if let Some(max) = quote.maximum_sold() {
        println!("Maximum sold ({slippage}):     {}", amount(max, from));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let ctx = App::load(&cli).await?;

    match &cli.command {
        Commands::Networks => {
            output::networks_table(&ctx.registry).printstd();
        }
        Commands::Tokens => {
            println!("Tokens on {} ({})", ctx.network.name, ctx.network.chain_id);
            output::tokens_table(&ctx.tokens).printstd();
        }
        Commands::Slippage { action } => {
            let tolerance = match action {
                None => ctx.slippage().await?,
                Some(SlippageAction::Set { value }) => {
                    let tolerance: SlippageTolerance = value.parse()?;
                    ctx.settings.set_slippage(tolerance).await?;
                    tolerance
                }
                Some(SlippageAction::Reset) => {
                    let tolerance = SlippageTolerance::default();
                    ctx.settings.set_slippage(tolerance).await?;
                    tolerance
                }
            };
            let preset = if tolerance.is_preset() { " (preset)" } else { "" };
            println!("Slippage tolerance: {tolerance}{preset}");
            if let Some(warning) = tolerance.warning() {
                println!("⚠️  {}", warning.message());
            }
        }
        Commands::Quote {
            from,
            to,
            amount,
            exact_out,
        } => {
            let (from, to) = (ctx.token(from)?, ctx.token(to)?);
            let slippage = ctx.slippage().await?;
            let quote = ctx.quote(&from, &to, amount, *exact_out).await?;
            print_quote(&quote, &from, &to, slippage);

            let router = if *exact_out {
                ctx.reader.get_amounts_in(quote.amount_out, &[&from, &to]).await
            } else {
                ctx.reader.get_amounts_out(quote.amount_in, &[&from, &to]).await
            };
            match router {
                Ok(amounts) if amounts.first() == Some(&quote.amount_in) && amounts.last() == Some(&quote.amount_out) => {
                    debug!("Router agrees with the local quote");
                }
                Ok(amounts) => info!(?amounts, "Router quote differs from the local estimate"),
                Err(e) => debug!(error = %e, "Router quote unavailable"),
            }
        }
        Commands::Pool {
            token_a,
            token_b,
            owner,
        } => {
            let (a, b) = (ctx.token(token_a)?, ctx.token(token_b)?);
            let pool = ctx.pair(&a, &b, *owner).await?;
            println!("Pair:      {}", pool.pair_address);
            println!("Reserves:  {} / {}", amount(pool.reserve_a, &a), amount(pool.reserve_b, &b));
            let price = calculate_spot_price(pool.reserve_a, a.decimals, pool.reserve_b, b.decimals)?;
            println!("Price:     1 {} = {} {}", b.symbol, format_ratio(price), a.symbol);
            if owner.is_some() {
                let preview = removal_amounts(&pool, 100);
                println!("LP tokens: {}", format_token_balance(&pool.lp_balance.format_units(18), true));
                println!("Share:     {}%", format_ratio(pool.pool_share()));
                println!("Pooled:    {} / {}", amount(preview.amount_a, &a), amount(preview.amount_b, &b));
            }
        }
        Commands::Paired {
            token_a,
            token_b,
            amount_a,
        } => {
            let (a, b) = (ctx.token(token_a)?, ctx.token(token_b)?);
            let pool = ctx.reader.fetch_pair(&a, &b, None).await?;
            let mut input = LiquidityInput::new(a, b);
            input.set_amount(Side::A, amount_a, pool.as_ref());
            if pool.as_ref().is_some_and(PairSnapshot::has_liquidity) {
                println!("{} {} ↔ {} {}", input.amount_a, input.token_a.symbol, input.amount_b, input.token_b.symbol);
            } else {
                println!("No liquidity yet: the first deposit sets the price");
            }
        }
        Commands::Positions { owner } => {
            let positions = ctx
                .reader
                .liquidity_positions(*owner, &ctx.tokens, POSITION_SCAN_LIMIT)
                .await?;
            if positions.is_empty() {
                println!("No liquidity positions found");
            } else {
                output::positions_table(&positions).printstd();
            }
        }
        Commands::Balance {
            token,
            owner,
            watch,
        } => {
            let token = ctx.token(token)?;
            if *watch {
                let mut watcher = BalanceWatcher::spawn(
                    ctx.reader.clone(),
                    token.clone(),
                    *owner,
                    DEFAULT_POLL_INTERVAL,
                );
                loop {
                    tokio::select! {
                        update = watcher.next() => match update {
                            Some(update) => println!("{} {}", format_token_balance(&update.formatted, true), token.symbol),
                            None => break,
                        },
                        _ = tokio::signal::ctrl_c() => break,
                    }
                }
            } else {
                let balance = ctx.reader.token_balance(&token, *owner).await?;
                println!("{}", amount(balance, &token));
            }
        }
        Commands::Connect => {
            let state = ctx.session().connect().await?;
            println!("{state:?}");
        }
        Commands::Disconnect => {
            ctx.session().disconnect().await;
        }
        Commands::Status => {
            let session = ctx.session();
            session.auto_connect().await?;
            let status = session.status().await;
            match status.account {
                Some(account) => {
                    let network = status
                        .network
                        .as_ref()
                        .map_or("unsupported network".to_string(), |n| n.name.clone());
                    println!("Connected as {account} on {network}");
                }
                None => println!("Not connected"),
            }
        }
        Commands::SwitchNetwork { chain_id } => {
            ctx.session().switch_network(*chain_id).await?;
        }
        Commands::Approve { token, amount } => {
            let token = ctx.token(token)?;
            if token.is_native {
                bail!("{} is the native asset and needs no approval", token.symbol);
            }
            let amount = TokenAmount::parse_units(amount, token.decimals)?;
            let tx = ctx.transactions().await?;
            print_outcome(&tx.approve(token.address, amount).await?)?;
        }
        Commands::Swap {
            from,
            to,
            amount,
            exact_out,
        } => {
            let (from, to) = (ctx.token(from)?, ctx.token(to)?);
            let slippage = ctx.slippage().await?;
            let quote = ctx.quote(&from, &to, amount, *exact_out).await?;
            print_quote(&quote, &from, &to, slippage);

            let tx = ctx.transactions().await?;
            let spend = quote.maximum_sold().unwrap_or(quote.amount_in);
            let allowance = ctx.reader.allowance(&from, tx.account()).await?;
            if needs_approval(allowance, spend) {
                print_outcome(&tx.approve(from.address, spend).await?)?;
            }
            print_outcome(&tx.swap(&from, &to, &quote).await?)?;
        }
        Commands::AddLiquidity {
            token_a,
            token_b,
            amount_a,
            amount_b,
        } => {
            let (a, b) = (ctx.token(token_a)?, ctx.token(token_b)?);
            let pool = ctx.reader.fetch_pair(&a, &b, None).await?;
            let mut input = LiquidityInput::new(a.clone(), b.clone());
            input.set_amount(Side::A, amount_a, pool.as_ref());
            if let Some(amount_b) = amount_b {
                input.set_amount(Side::B, amount_b, None);
            }
            let (raw_a, raw_b) = input.raw_amounts();
            if raw_b.is_zero() {
                bail!("amount of {} required: the pool has no liquidity yet", b.symbol);
            }
            println!("Depositing {} and {}", amount(raw_a, &a), amount(raw_b, &b));

            let tx = ctx.transactions().await?;
            for (token, raw) in [(&a, raw_a), (&b, raw_b)] {
                if needs_approval(ctx.reader.allowance(token, tx.account()).await?, raw) {
                    print_outcome(&tx.approve(token.address, raw).await?)?;
                }
            }
            let slippage = ctx.slippage().await?;
            print_outcome(&tx.add_liquidity(&a, &b, raw_a, raw_b, slippage).await?)?;
        }
        Commands::RemoveLiquidity {
            token_a,
            token_b,
            percent,
        } => {
            let (a, b) = (ctx.token(token_a)?, ctx.token(token_b)?);
            let tx = ctx.transactions().await?;
            let pool = ctx.pair(&a, &b, Some(tx.account())).await?;
            let preview = removal_amounts(&pool, *percent);
            if preview.lp_to_burn.is_zero() {
                bail!("no {}/{} liquidity to remove", a.symbol, b.symbol);
            }
            println!("Withdrawing {} and {}", amount(preview.amount_a, &a), amount(preview.amount_b, &b));

            let allowance = ctx.reader.lp_allowance(pool.pair_address, tx.account()).await?;
            if needs_approval(allowance, preview.lp_to_burn) {
                print_outcome(&tx.approve(pool.pair_address, preview.lp_to_burn).await?)?;
            }
            let slippage = ctx.slippage().await?;
            print_outcome(&tx.remove_liquidity(&a, &b, &pool, *percent, slippage).await?)?;
        }
    }

    Ok(())
}
