use colored::Colorize;
use itertools::Itertools;
use tokendesk_sdk::{
    Chain,
    exchange::{Exchange, OfferRequest, OffersView},
    read::ReadClient,
    tx::{ConfirmationPolicy, TxStep},
    types::OfferId,
    wallet::WalletSession,
};
use tokio_util::sync::CancellationToken;

use crate::{cancellable, tx};

pub(crate) async fn render(
    read: &ReadClient,
    session: &WalletSession,
    chain: &Chain,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let exchange = Exchange::for_chain(read, chain)?;
    let entries = cancellable(&cancellation_token, exchange.offers()).await?;

    println!(
        "{}",
        format!("Open offers on {} ({})", chain.name(), exchange.address()).blue()
    );
    print!("{}", OffersView::new(&entries, session.address()));

    let failed = entries.iter().filter(|e| e.is_error()).map(|e| format!("#{}", e.id)).join(", ");
    if !failed.is_empty() {
        println!("{}", format!("Details not loaded for {failed}").yellow());
    }
    Ok(())
}

pub(crate) async fn create(
    read: &ReadClient,
    session: &WalletSession,
    chain: &Chain,
    request: OfferRequest,
    policy: ConfirmationPolicy,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let exchange = Exchange::for_chain(read, chain)?;
    let steps =
        cancellable(&cancellation_token, exchange.create_offer_steps(session, &request)).await?;
    execute(read, session, chain, &exchange, steps, policy, cancellation_token).await
}

pub(crate) async fn fill(
    read: &ReadClient,
    session: &WalletSession,
    chain: &Chain,
    id: OfferId,
    policy: ConfirmationPolicy,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let exchange = Exchange::for_chain(read, chain)?;
    let steps = cancellable(&cancellation_token, exchange.fill_offer_steps(session, id)).await?;
    execute(read, session, chain, &exchange, steps, policy, cancellation_token).await
}

pub(crate) async fn cancel(
    read: &ReadClient,
    session: &WalletSession,
    chain: &Chain,
    id: OfferId,
    policy: ConfirmationPolicy,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let exchange = Exchange::for_chain(read, chain)?;
    let steps = cancellable(&cancellation_token, exchange.cancel_offer_steps(session, id)).await?;
    execute(read, session, chain, &exchange, steps, policy, cancellation_token).await
}

/// Submits the steps, then shows the offer list as observed afterwards.
async fn execute(
    read: &ReadClient,
    session: &WalletSession,
    chain: &Chain,
    exchange: &Exchange<'_>,
    steps: Vec<TxStep>,
    policy: ConfirmationPolicy,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    // Approved tokens have their allowance changed
    let touched: Vec<_> = steps.iter().map(|s| s.to()).unique().collect();

    tx::submit(session, chain, steps, policy).await?;

    for address in touched {
        read.invalidate(chain.chain_id(), address);
    }
    exchange.invalidate();
    println!();
    render(read, session, chain, cancellation_token).await
}
