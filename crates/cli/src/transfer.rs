use alloy::primitives::Address;
use colored::Colorize;
use tokendesk_sdk::{
    Chain,
    read::ReadClient,
    registry::{Registry, Token},
    token::{self, TransferRequest},
    tx::ConfirmationPolicy,
    wallet::WalletSession,
};
use tokio_util::sync::CancellationToken;

use crate::{cancellable, tx};

pub(crate) struct Args<'a> {
    pub token: Address,
    pub to: &'a str,
    pub amount: &'a str,
    /// Submit right away instead of only showing the preview.
    pub submit: bool,
}

pub(crate) async fn run(
    read: &ReadClient,
    session: &WalletSession,
    registry: &Registry,
    chain: &Chain,
    args: Args<'_>,
    policy: ConfirmationPolicy,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let request = TransferRequest {
        chain_id: chain.chain_id(),
        token: args.token,
        recipient: args.to.to_string(),
        amount: args.amount.to_string(),
    };
    let preview = cancellable(
        &cancellation_token,
        token::prepare_transfer(read, session, registry, &request),
    )
    .await?;
    println!("{preview}");

    if !args.submit {
        println!("{}", "Preview only, re-run with --yes to submit".yellow());
        return Ok(());
    }

    tx::submit(session, chain, vec![preview.step.clone()], policy).await?;

    // Show the balance observed after the transfer
    read.invalidate(chain.chain_id(), args.token);
    let token = registry
        .token(chain.chain_id(), args.token)
        .cloned()
        .unwrap_or_else(|| Token::new(args.token, chain.chain_id(), preview.amount.symbol()));
    let balance = token::token_balance(read, session, &token).await;
    println!("Balance: {balance}");

    Ok(())
}
