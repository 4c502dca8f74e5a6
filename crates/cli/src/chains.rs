use colored::Colorize;
use tabled::{Table, Tabled, settings::Style};
use tokendesk_sdk::{registry::Registry, selection};

pub(crate) fn render_chains(registry: &Registry) -> anyhow::Result<()> {
    let rows = registry.chains().iter().map(|chain| ChainRow {
        chain_id: chain.chain_id(),
        name: chain.name().to_string(),
        native_symbol: chain.native_symbol().to_string(),
        rpc_url: chain.rpc_url().to_string(),
        explorer_url: chain.explorer_url().unwrap_or("-").to_string(),
        exchange: chain.exchange().map(|a| a.to_string()).unwrap_or_else(|| "-".to_string()),
    });
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");
    Ok(())
}

pub(crate) fn render_tokens(registry: &Registry) -> anyhow::Result<()> {
    for (chain, tokens) in registry.tokens_by_chain() {
        println!("{}", format!("{} ({})", chain.name(), chain.chain_id()).blue());
        if tokens.is_empty() {
            println!("    {}\n", selection::NO_TOKENS.dimmed());
            continue;
        }
        let rows = tokens.iter().map(|token| TokenRow {
            name: token.name.clone(),
            address: token.address.to_string(),
            icon_url: token.icon_url(),
        });
        let mut table = Table::new(rows);
        table.with(Style::sharp());
        println!("{table}\n");
    }
    Ok(())
}

#[derive(Tabled)]
struct ChainRow {
    #[tabled(rename = "Chain ID")]
    chain_id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Native")]
    native_symbol: String,
    #[tabled(rename = "RPC")]
    rpc_url: String,
    #[tabled(rename = "Explorer")]
    explorer_url: String,
    #[tabled(rename = "Exchange")]
    exchange: String,
}

#[derive(Tabled)]
struct TokenRow {
    #[tabled(rename = "Token")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Icon")]
    icon_url: String,
}
