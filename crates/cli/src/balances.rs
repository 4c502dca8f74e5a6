use colored::Colorize;
use tabled::{Table, Tabled, settings::Style};
use tokendesk_sdk::{
    Chain, num, read::ReadClient, registry::Registry, selection, token, types::LoadState,
    wallet::WalletSession,
};
use tokio_util::sync::CancellationToken;

use crate::cancellable;

pub(crate) async fn render(
    read: &ReadClient,
    session: &WalletSession,
    registry: &Registry,
    chain: &Chain,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    match session.address() {
        Some(owner) => {
            let native =
                cancellable(&cancellation_token, read.native_balance(chain.chain_id(), owner))
                    .await?;
            println!(
                "{} on {}\n    {}: {}",
                owner.to_string().blue(),
                chain.name(),
                chain.native_symbol(),
                num::Converter::new(18).format(native).green()
            );
        },
        None => println!("{} on {}", "Wallet not connected".yellow(), chain.name()),
    }

    let tokens = registry.tokens_for_chain(chain.chain_id());
    if tokens.is_empty() {
        println!("    {}", selection::NO_TOKENS.dimmed());
        return Ok(());
    }

    let balances = tokio::select! {
        balances = token::balances(read, session, registry, chain.chain_id()) => balances,
        _ = cancellation_token.cancelled() => return Err(anyhow::anyhow!("interrupted")),
    };

    let rows = balances.into_iter().map(|(token, state)| BalanceRow {
        name: token.name.clone(),
        address: token.address.to_string(),
        balance: match state {
            LoadState::Ready(amount) => amount.to_string().green().to_string(),
            LoadState::Failed(err) => err.to_string().red().to_string(),
            other => other.to_string().dimmed().to_string(),
        },
    });
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");

    Ok(())
}

#[derive(Tabled)]
struct BalanceRow {
    #[tabled(rename = "Token")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Balance")]
    balance: String,
}
