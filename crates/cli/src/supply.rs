use alloy::primitives::Address;
use tokendesk_sdk::{Chain, read::ReadClient, token};
use tokio_util::sync::CancellationToken;

use crate::cancellable;

pub(crate) async fn render(
    read: &ReadClient,
    chain: &Chain,
    token: Address,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let card = cancellable(&cancellation_token, token::supply_card(read, chain, token)).await?;
    println!("{card}");
    Ok(())
}
