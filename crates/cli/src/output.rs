//! Table rendering for list commands.

use amm_client_domain::format::{format_ratio, format_token_balance};
use amm_client_domain::network::NetworkRegistry;
use amm_client_domain::pool::LiquidityPosition;
use amm_client_domain::token::Token;
use prettytable::{Table, row};

pub fn networks_table(registry: &NetworkRegistry) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Chain", "Name", "Native", "Router", "Explorer"]);
    for (i, n) in registry.networks.iter().enumerate() {
        let name = if i == 0 {
            format!("{} (default)", n.name)
        } else {
            n.name.clone()
        };
        table.add_row(row![
            n.chain_id,
            name,
            n.native_currency.symbol,
            n.contracts.router,
            n.explorer_url
        ]);
    }
    table
}

pub fn tokens_table(tokens: &[Token]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Symbol", "Name", "Decimals", "Address"]);
    for t in tokens {
        let address = if t.is_native {
            "native".to_string()
        } else {
            t.address.to_string()
        };
        table.add_row(row![t.symbol, t.name, t.decimals, address]);
    }
    table
}

pub fn positions_table(positions: &[LiquidityPosition]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Pair", "Address", "LP balance", "Share %", "Pooled 0", "Pooled 1"]);
    for p in positions {
        let snapshot = p.snapshot();
        let preview = amm_client_domain::liquidity::removal_amounts(&snapshot, 100);
        table.add_row(row![
            p.label(),
            p.pair_address,
            format_token_balance(&p.lp_balance.format_units(18), true),
            format_ratio(snapshot.pool_share()),
            format_token_balance(&preview.amount_a.format_units(p.token0.decimals), true),
            format_token_balance(&preview.amount_b.format_units(p.token1.decimals), true)
        ]);
    }
    table
}
