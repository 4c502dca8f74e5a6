pub mod args;
mod balances;
mod chains;
mod offers;
mod supply;
mod transfer;
mod tx;

use anyhow::Context;
use args::Cli;
use tokendesk_sdk::{
    Chain, config::Config, error::SdkError, exchange::OfferRequest, read::ReadClient,
    registry::Registry, tx::ConfirmationPolicy, wallet::WalletSession,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::args::{Commands, OfferCommands};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("parsing log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let mut registry = Registry::default();
    let mut policy = ConfirmationPolicy::default();
    if let Some(path) = &cli.config {
        let config = Config::load(path)?;
        config
            .apply(&mut registry)
            .with_context(|| format!("applying config {}", path.display()))?;
        policy = config.confirmation_policy();
        tracing::debug!(path = %path.display(), "config applied");
    }

    let mut chain =
        registry.chain(cli.chain).cloned().ok_or(SdkError::UnsupportedChain(cli.chain))?;
    if let Some(rpc) = &cli.rpc {
        chain = chain.with_rpc_url(rpc.clone());
    }
    if let Some(exchange) = cli.exchange {
        chain = chain.with_exchange(exchange);
    }
    registry.upsert_chain(chain.clone());
    tracing::debug!(chain_id = chain.chain_id(), rpc = chain.rpc_url(), "chain selected");

    let mut session = WalletSession::disconnected();
    if let Some(private_key) = &cli.private_key {
        session.connect_private_key(private_key, chain.chain_id()).context("connecting wallet")?;
    }

    // Reads are abandoned on Ctrl+C, submitted transactions are awaited
    let cancellation_signal = CancellationToken::new();
    let cancellation_token = cancellation_signal.child_token();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C signal handler");
        cancellation_signal.cancel();
    });

    match &cli.command {
        Commands::Chains => chains::render_chains(&registry)?,
        Commands::Tokens => chains::render_tokens(&registry)?,
        Commands::Balances => {
            let read = connect(&chain, cli.rpc_throttle).await?;
            balances::render(&read, &session, &registry, &chain, cancellation_token).await?
        },
        Commands::Supply { token } => {
            let read = connect(&chain, cli.rpc_throttle).await?;
            supply::render(&read, &chain, *token, cancellation_token).await?
        },
        Commands::Transfer { token, to, amount, yes } => {
            let read = connect(&chain, cli.rpc_throttle).await?;
            transfer::run(
                &read,
                &session,
                &registry,
                &chain,
                transfer::Args { token: *token, to, amount, submit: *yes },
                policy,
                cancellation_token,
            )
            .await?
        },
        Commands::Offers { command } => {
            let read = connect(&chain, cli.rpc_throttle).await?;
            match command {
                OfferCommands::List => {
                    offers::render(&read, &session, &chain, cancellation_token).await?
                },
                OfferCommands::Create { sell_token, sell_amount, buy_token, buy_amount } => {
                    offers::create(
                        &read,
                        &session,
                        &chain,
                        OfferRequest {
                            sell_token: *sell_token,
                            sell_amount: sell_amount.clone(),
                            buy_token: *buy_token,
                            buy_amount: buy_amount.clone(),
                        },
                        policy,
                        cancellation_token,
                    )
                    .await?
                },
                OfferCommands::Fill { id } => {
                    offers::fill(&read, &session, &chain, *id, policy, cancellation_token).await?
                },
                OfferCommands::Cancel { id } => {
                    offers::cancel(&read, &session, &chain, *id, policy, cancellation_token)
                        .await?
                },
            }
        },
        Commands::Status { tx_hash } => {
            let read = connect(&chain, cli.rpc_throttle).await?;
            tx::render_status(&read, &chain, *tx_hash, cancellation_token).await?
        },
    }

    Ok(())
}

async fn connect(chain: &Chain, throttle: Option<u32>) -> anyhow::Result<ReadClient> {
    ReadClient::connect([chain], throttle)
        .await
        .with_context(|| format!("connecting to {}", chain.rpc_url()))
}

/// Awaits the read unless interrupted.
pub(crate) async fn cancellable<T>(
    cancellation_token: &CancellationToken,
    read: impl Future<Output = Result<T, SdkError>>,
) -> anyhow::Result<T> {
    tokio::select! {
        result = read => Ok(result?),
        _ = cancellation_token.cancelled() => Err(anyhow::anyhow!("interrupted")),
    }
}
