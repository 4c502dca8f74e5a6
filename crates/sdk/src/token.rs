//! Token balances, supply and transfers.

use std::str::FromStr;

use alloy::primitives::{Address, U256};
use futures::future::join_all;

use crate::{
    Chain,
    error::SdkError,
    num,
    read::ReadClient,
    registry::{self, Registry, Token},
    tx::TxStep,
    types::{LoadState, TokenAmount, TokenMeta, TokenSupply},
    wallet::WalletSession,
};

/// Decimals of the native currency of all supported chains.
const NATIVE_DECIMALS: u8 = 18;

/// Balance of the token held by the connected account.
///
/// Yields [`LoadState::Disconnected`] without touching the network when no
/// wallet is connected.
pub async fn token_balance(
    read: &ReadClient,
    session: &WalletSession,
    token: &Token,
) -> LoadState<TokenAmount> {
    let Some(owner) = session.address() else {
        return LoadState::Disconnected;
    };
    let result = futures::try_join!(
        read.balance_of(token.chain_id, token.address, owner),
        read.token_meta(token.chain_id, token.address)
    );
    match result {
        Ok((raw, meta)) => LoadState::Ready(amount_of(meta, raw)),
        Err(err) => {
            tracing::warn!(
                chain_id = token.chain_id,
                token = %token.address,
                %err,
                "balance not loaded"
            );
            LoadState::Failed(err)
        },
    }
}

/// Balances of all registry tokens on the chain, in registry order.
pub async fn balances<'t>(
    read: &ReadClient,
    session: &WalletSession,
    registry: &'t Registry,
    chain_id: u64,
) -> Vec<(&'t Token, LoadState<TokenAmount>)> {
    let tokens = registry.tokens_for_chain(chain_id);
    let states = join_all(tokens.iter().map(|token| token_balance(read, session, token))).await;
    tokens.into_iter().zip(states).collect()
}

/// Token metadata and total supply with links for presentation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupplyCard {
    pub supply: TokenSupply,
    pub icon_url: String,
    pub explorer_url: Option<String>,
}

/// Reads the supply card of the token deployed on the chain.
pub async fn supply_card(
    read: &ReadClient,
    chain: &Chain,
    token: Address,
) -> Result<SupplyCard, SdkError> {
    let chain_id = chain.chain_id();
    let (info, total_supply) =
        futures::try_join!(read.token_info(chain_id, token), read.total_supply(chain_id, token))?;
    Ok(SupplyCard {
        supply: TokenSupply { info, total_supply },
        icon_url: registry::icon_url(chain_id, token),
        explorer_url: chain.explorer_token_url(token),
    })
}

#[cfg(feature = "display")]
impl std::fmt::Display for SupplyCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use colored::Colorize;

        let info = &self.supply.info;
        writeln!(f, "{} ({})", info.name.blue(), info.symbol)?;
        writeln!(f, "    Address: {}", info.address)?;
        writeln!(f, "    Decimals: {}", info.decimals)?;
        writeln!(f, "    Total supply: {}", self.supply.total_supply_amount().to_string().green())?;
        writeln!(f, "    Icon: {}", self.icon_url)?;
        if let Some(url) = &self.explorer_url {
            writeln!(f, "    Explorer: {url}")?;
        }
        Ok(())
    }
}

/// Transfer as entered by the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    pub chain_id: u64,
    pub token: Address,
    pub recipient: String,
    /// Amount in whole tokens.
    pub amount: String,
}

/// Validated transfer ready to be submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferPreview {
    pub chain: Chain,
    pub from: Address,
    pub recipient: Address,
    pub amount: TokenAmount,
    /// Estimated gas, `None` if the node could not estimate it.
    pub gas: Option<u64>,
    /// Estimated fee in native currency wei.
    pub fee: Option<U256>,
    pub step: TxStep,
}

impl TransferPreview {
    /// Estimated fee formatted in the native currency of the chain.
    pub fn fee_amount(&self) -> Option<String> {
        let native = num::Converter::new(NATIVE_DECIMALS);
        self.fee.map(|fee| format!("{} {}", native.format(fee), self.chain.native_symbol()))
    }
}

#[cfg(feature = "display")]
impl std::fmt::Display for TransferPreview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use colored::Colorize;

        writeln!(f, "{} {}", "Transfer".blue(), self.amount.to_string().green())?;
        writeln!(f, "    Chain: {} ({})", self.chain.name(), self.chain.chain_id())?;
        writeln!(f, "    Token: {}", self.amount.token())?;
        writeln!(f, "    From: {}", self.from)?;
        writeln!(f, "    To: {}", self.recipient)?;
        match (self.gas, self.fee_amount()) {
            (Some(gas), Some(fee)) => writeln!(f, "    Estimated gas: {gas} (~{fee})"),
            (Some(gas), None) => writeln!(f, "    Estimated gas: {gas}"),
            _ => writeln!(f, "    Estimated gas: {}", "unknown".yellow()),
        }
    }
}

/// Validates the transfer and prepares its step along with fee estimates.
pub async fn prepare_transfer(
    read: &ReadClient,
    session: &WalletSession,
    registry: &Registry,
    request: &TransferRequest,
) -> Result<TransferPreview, SdkError> {
    let from = session.require_address()?;
    let chain =
        registry.chain(request.chain_id).ok_or(SdkError::UnsupportedChain(request.chain_id))?;
    let recipient = parse_recipient(&request.recipient)?;

    let meta = read.token_meta(chain.chain_id(), request.token).await?;
    let raw = meta.converter().parse_positive(&request.amount)?;
    let step = TxStep::transfer(request.token, recipient, raw);

    let (gas, fee) = estimate_fee(read, chain.chain_id(), from, &step).await;

    Ok(TransferPreview {
        chain: chain.clone(),
        from,
        recipient,
        amount: amount_of(meta, raw),
        gas,
        fee,
        step,
    })
}

fn parse_recipient(input: &str) -> Result<Address, SdkError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(SdkError::validation("recipient is required"));
    }
    let recipient = Address::from_str(input)
        .map_err(|err| SdkError::validation(format!("invalid recipient {input:?}: {err}")))?;
    if recipient.is_zero() {
        return Err(SdkError::validation("recipient must not be the zero address"));
    }
    Ok(recipient)
}

fn amount_of(meta: TokenMeta, raw: U256) -> TokenAmount {
    TokenAmount::new(meta.address, meta.symbol, meta.decimals, raw)
}

async fn estimate_fee(
    read: &ReadClient,
    chain_id: u64,
    from: Address,
    step: &TxStep,
) -> (Option<u64>, Option<U256>) {
    let gas = match read.estimate_gas(chain_id, from, step).await {
        Ok(gas) => gas,
        Err(err) => {
            tracing::warn!(chain_id, %err, "gas estimation failed");
            return (None, None);
        },
    };
    match read.gas_price(chain_id).await {
        Ok(price) => (Some(gas), Some(U256::from(gas) * U256::from(price))),
        Err(err) => {
            tracing::warn!(chain_id, %err, "gas price not available");
            (Some(gas), None)
        },
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;
    use alloy_sol_types::SolCall;

    use super::*;
    use crate::{abi::erc20::IERC20, testing};

    const USDC: Address = address!("0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85");
    const RECIPIENT: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
    const PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn connected() -> WalletSession {
        let mut session = WalletSession::disconnected();
        session.connect_private_key(PRIVATE_KEY, 10).unwrap();
        session
    }

    fn request(amount: &str) -> TransferRequest {
        TransferRequest {
            chain_id: 10,
            token: USDC,
            recipient: RECIPIENT.to_string(),
            amount: amount.to_string(),
        }
    }

    /// Caches USDC metadata so that later lookups don't hit the transport.
    async fn usdc_client() -> (ReadClient, alloy::transports::mock::Asserter) {
        let (client, asserter) = testing::mocked_read_client(10);
        asserter.push_success(&testing::encode_return("USDC".to_string()));
        client.symbol(10, USDC).await.unwrap();
        asserter.push_success(&testing::encode_decimals(6));
        client.decimals(10, USDC).await.unwrap();
        (client, asserter)
    }

    #[tokio::test]
    async fn test_balance_disconnected() {
        let token = Token::new(USDC, 10, "USDC");
        let state = token_balance(&ReadClient::new(), &WalletSession::disconnected(), &token).await;
        assert_eq!(state, LoadState::Disconnected);
    }

    #[tokio::test]
    async fn test_balance_loaded() {
        let (client, asserter) = usdc_client().await;
        asserter.push_success(&testing::encode_return(U256::from(1_500_000u64)));

        let token = Token::new(USDC, 10, "USDC");
        let state = token_balance(&client, &connected(), &token).await;
        assert_eq!(state.ready().map(|a| a.to_string()), Some("1.5 USDC".to_string()));
    }

    #[tokio::test]
    async fn test_balance_failure_is_reported() {
        let (client, asserter) = testing::mocked_read_client(10);
        asserter.push_failure_msg("rate limited");

        let token = Token::new(USDC, 10, "USDC");
        let state = token_balance(&client, &connected(), &token).await;
        assert!(matches!(state, LoadState::Failed(_)));
    }

    #[tokio::test]
    async fn test_supply_card() {
        let (client, asserter) = testing::mocked_read_client(10);
        asserter.push_success(&testing::encode_return("USD Coin".to_string()));
        client.name(10, USDC).await.unwrap();
        asserter.push_success(&testing::encode_return("USDC".to_string()));
        client.symbol(10, USDC).await.unwrap();
        asserter.push_success(&testing::encode_decimals(6));
        client.decimals(10, USDC).await.unwrap();
        asserter.push_success(&testing::encode_return(U256::from(2_000_000_000_000u64)));

        let card = supply_card(&client, &Chain::optimism(), USDC).await.unwrap();
        assert_eq!(card.supply.info.name, "USD Coin");
        assert_eq!(card.supply.total_supply_amount().to_string(), "2000000 USDC");
        assert_eq!(
            card.icon_url,
            "https://token-icons.llamao.fi/icons/tokens/10/0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85"
        );
        assert_eq!(
            card.explorer_url.as_deref(),
            Some("https://optimistic.etherscan.io/token/0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85")
        );
    }

    #[tokio::test]
    async fn test_prepare_transfer() {
        let (client, asserter) = usdc_client().await;
        asserter.push_success(&U256::from(52_000u64));
        asserter.push_success(&U256::from(1_000_000_000u64));

        let preview =
            prepare_transfer(&client, &connected(), &Registry::default(), &request("2.25"))
                .await
                .unwrap();

        assert_eq!(preview.amount.to_string(), "2.25 USDC");
        assert_eq!(preview.gas, Some(52_000));
        assert_eq!(preview.fee_amount().as_deref(), Some("0.000052 ETH"));
        let transfer = IERC20::transferCall::abi_decode(preview.step.input()).unwrap();
        assert_eq!(transfer.amount, U256::from(2_250_000u64));
        assert_eq!(preview.step.to(), USDC);
    }

    #[tokio::test]
    async fn test_prepare_transfer_without_estimate() {
        let (client, asserter) = usdc_client().await;
        asserter.push_failure_msg("insufficient funds");

        let preview = prepare_transfer(&client, &connected(), &Registry::default(), &request("1"))
            .await
            .unwrap();
        assert_eq!(preview.gas, None);
        assert_eq!(preview.fee_amount(), None);
    }

    #[tokio::test]
    async fn test_transfer_validation() {
        let (client, _asserter) = usdc_client().await;
        let registry = Registry::default();
        let session = connected();

        for amount in ["", "0", "0.0", "1.1234567", "-1", "1e6", "abc"] {
            let result = prepare_transfer(&client, &session, &registry, &request(amount)).await;
            assert!(matches!(result, Err(SdkError::Validation(_))), "amount {amount:?}");
        }

        for recipient in ["", "0x1234", "0x0000000000000000000000000000000000000000"] {
            let request = TransferRequest { recipient: recipient.to_string(), ..request("1") };
            let result = prepare_transfer(&client, &session, &registry, &request).await;
            assert!(matches!(result, Err(SdkError::Validation(_))), "recipient {recipient:?}");
        }

        let disconnected = WalletSession::disconnected();
        assert_eq!(
            prepare_transfer(&client, &disconnected, &registry, &request("1")).await,
            Err(SdkError::WalletNotConnected)
        );
        let unknown_chain = TransferRequest { chain_id: 42, ..request("1") };
        assert_eq!(
            prepare_transfer(&client, &session, &registry, &unknown_chain).await,
            Err(SdkError::UnsupportedChain(42))
        );
    }
}
