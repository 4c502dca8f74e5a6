use alloy::{network::ReceiptResponse, primitives::TxHash, providers::Provider};
use colored::Colorize;
use tokendesk_sdk::{
    Chain,
    error::SdkError,
    read::ReadClient,
    tx::{Confirmation, ConfirmationPolicy, ProviderBackend, TxSequence, TxStep},
    types::{PendingTx, TxStatus},
    wallet::WalletSession,
};
use tokio_util::sync::CancellationToken;

use crate::cancellable;

/// Submits the steps one confirmed transaction at a time, printing progress.
pub(crate) async fn submit(
    session: &WalletSession,
    chain: &Chain,
    steps: Vec<TxStep>,
    policy: ConfirmationPolicy,
) -> anyhow::Result<Vec<Confirmation>> {
    let from = session.require_address()?;
    let provider = session.signer_provider(chain).await?;
    let backend = ProviderBackend::new(provider, from);

    let print_progress = |pending: &PendingTx| {
        let line = pending.to_string();
        match pending.status() {
            TxStatus::Confirmed { .. } => {
                println!("{}", line.green());
                if let Some(url) = chain.explorer_tx_url(pending.hash()) {
                    println!("    {url}");
                }
            },
            TxStatus::Failed(_) => println!("{}", line.red()),
            TxStatus::Submitted | TxStatus::Confirming => println!("{}", line.cyan()),
        }
    };

    match TxSequence::new(steps)
        .with_policy(policy)
        .run(&backend, tokio::time::sleep, print_progress)
        .await
    {
        Ok(confirmed) => Ok(confirmed),
        Err(err) => {
            for confirmation in &err.confirmed {
                println!(
                    "{}",
                    format!("Confirmed before failure: {}", confirmation.tx_hash).yellow()
                );
            }
            Err(err.into())
        },
    }
}

pub(crate) async fn render_status(
    read: &ReadClient,
    chain: &Chain,
    tx_hash: TxHash,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let provider = read.provider(chain.chain_id())?;
    let receipt = cancellable(&cancellation_token, async {
        provider.get_transaction_receipt(tx_hash).await.map_err(SdkError::from)
    })
    .await?;

    println!("\n{}\n", format!("**** Tx {}", tx_hash).bright_blue());
    match receipt {
        None => println!("  {}", "pending or unknown".yellow()),
        Some(receipt) => {
            let status = if receipt.status() { "confirmed".green() } else { "reverted".red() };
            println!("  Status: {status}");
            if let Some(block) = receipt.block_number() {
                println!("  Block: {block}");
            }
            println!("  Gas used: {}", receipt.gas_used());
        },
    }
    if let Some(url) = chain.explorer_tx_url(tx_hash) {
        println!("  {url}");
    }
    println!();

    Ok(())
}
