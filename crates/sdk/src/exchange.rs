//! Peer-to-peer exchange: offer list and offer requests.
//!
//! The exchange contract holds offers and settles them, [`Exchange`] only
//! reads its state and prepares the transaction steps. Steps are submitted
//! with [`crate::tx::TxSequence`].

use alloy::primitives::{Address, U256};
use futures::future::join_all;

use crate::{
    Chain,
    abi::p2p::P2PExchange,
    error::SdkError,
    read::ReadClient,
    tx::TxStep,
    types::{Offer, OfferDetails, OfferEntry, OfferId, offer_id},
    wallet::WalletSession,
};

/// Offer to be created, amounts in whole tokens as entered by the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OfferRequest {
    pub sell_token: Address,
    pub sell_amount: String,
    pub buy_token: Address,
    pub buy_amount: String,
}

/// Exchange contract deployed on a chain.
#[derive(Clone, Copy)]
pub struct Exchange<'r> {
    read: &'r ReadClient,
    chain_id: u64,
    address: Address,
}

impl<'r> Exchange<'r> {
    pub fn new(read: &'r ReadClient, chain_id: u64, address: Address) -> Self {
        Self { read, chain_id, address }
    }

    /// Exchange configured for the chain.
    pub fn for_chain(read: &'r ReadClient, chain: &Chain) -> Result<Self, SdkError> {
        let address = chain.exchange().ok_or_else(|| {
            SdkError::InvalidArgument(format!(
                "no exchange contract configured for {} ({})",
                chain.name(),
                chain.chain_id()
            ))
        })?;
        Ok(Self::new(read, chain.chain_id(), address))
    }

    pub fn chain_id(&self) -> u64 { self.chain_id }

    pub fn address(&self) -> Address { self.address }

    /// IDs of open offers in contract order.
    pub async fn open_offer_ids(&self) -> Result<Vec<OfferId>, SdkError> {
        let ids =
            self.read.call(self.chain_id, self.address, &P2PExchange::getOpenOffersCall {}).await?;
        ids.into_iter().map(offer_id).collect()
    }

    pub async fn offer(&self, id: OfferId) -> Result<Offer, SdkError> {
        let call = P2PExchange::getOfferCall { offerId: U256::from(id) };
        self.read.call(self.chain_id, self.address, &call).await?.try_into()
    }

    /// Offer re-read from the contract, bypassing cached state.
    pub async fn fresh_offer(&self, id: OfferId) -> Result<Offer, SdkError> {
        let call = P2PExchange::getOfferCall { offerId: U256::from(id) };
        self.read.refresh(self.chain_id, self.address, &call).await?.try_into()
    }

    /// Offer with symbol and decimals of both tokens.
    pub async fn offer_details(&self, id: OfferId) -> Result<OfferDetails, SdkError> {
        let offer = self.offer(id).await?;
        let (sell, buy) = futures::try_join!(
            self.read.token_meta(self.chain_id, offer.sell_token),
            self.read.token_meta(self.chain_id, offer.buy_token)
        )?;
        Ok(OfferDetails { offer, sell, buy })
    }

    /// Open offers with details.
    ///
    /// Fails only if the list of IDs can't be read, see [`reconcile`].
    pub async fn offers(&self) -> Result<Vec<OfferEntry>, SdkError> {
        let ids = self.open_offer_ids().await?;
        tracing::debug!(chain_id = self.chain_id, offers = ids.len(), "fetching offer details");
        Ok(reconcile(ids, |id| self.offer_details(id)).await)
    }

    /// Steps creating the offer: approval of the sell amount followed by
    /// `createOffer`.
    pub async fn create_offer_steps(
        &self,
        session: &WalletSession,
        request: &OfferRequest,
    ) -> Result<Vec<TxStep>, SdkError> {
        session.require_address()?;
        if request.sell_token.is_zero() || request.buy_token.is_zero() {
            return Err(SdkError::validation("token addresses must not be empty"));
        }
        if request.sell_token == request.buy_token {
            return Err(SdkError::validation("sell and buy tokens must differ"));
        }

        let (sell_decimals, buy_decimals) = futures::try_join!(
            self.read.decimals(self.chain_id, request.sell_token),
            self.read.decimals(self.chain_id, request.buy_token)
        )?;
        let sell_amount =
            crate::num::Converter::new(sell_decimals).parse_positive(&request.sell_amount)?;
        let buy_amount =
            crate::num::Converter::new(buy_decimals).parse_positive(&request.buy_amount)?;

        Ok(vec![
            TxStep::approve(request.sell_token, self.address, sell_amount),
            TxStep::create_offer(
                self.address,
                request.sell_token,
                sell_amount,
                request.buy_token,
                buy_amount,
            ),
        ])
    }

    /// Steps filling the offer: approval of the buy amount followed by
    /// `fillOffer`.
    pub async fn fill_offer_steps(
        &self,
        session: &WalletSession,
        id: OfferId,
    ) -> Result<Vec<TxStep>, SdkError> {
        let filler = session.require_address()?;
        let offer = self.fresh_offer(id).await?;
        if !offer.is_open() {
            return Err(SdkError::validation(format!("offer #{id} is {}", offer.status)));
        }
        if offer.maker == filler {
            return Err(SdkError::validation(format!("offer #{id} is your own, cancel it instead")));
        }
        Ok(vec![
            TxStep::approve(offer.buy_token, self.address, offer.buy_amount),
            TxStep::fill_offer(self.address, id),
        ])
    }

    /// Step cancelling the offer made by the connected account.
    pub async fn cancel_offer_steps(
        &self,
        session: &WalletSession,
        id: OfferId,
    ) -> Result<Vec<TxStep>, SdkError> {
        let sender = session.require_address()?;
        let offer = self.fresh_offer(id).await?;
        if !offer.is_open() {
            return Err(SdkError::validation(format!("offer #{id} is {}", offer.status)));
        }
        if offer.maker != sender {
            return Err(SdkError::validation(format!(
                "offer #{id} was made by {}, only the maker can cancel it",
                offer.maker
            )));
        }
        Ok(vec![TxStep::cancel_offer(self.address, id)])
    }

    /// Drops cached exchange state so the next read observes completed
    /// writes.
    pub fn invalidate(&self) -> usize { self.read.invalidate(self.chain_id, self.address) }
}

/// Fetches details of every offer concurrently.
///
/// The order of `ids` is preserved. An offer whose details can't be fetched
/// stays in the list with its error.
pub async fn reconcile<F, Fut>(ids: Vec<OfferId>, fetch: F) -> Vec<OfferEntry>
where
    F: Fn(OfferId) -> Fut,
    Fut: Future<Output = Result<OfferDetails, SdkError>>,
{
    let details = join_all(ids.iter().map(|id| fetch(*id))).await;
    ids.into_iter()
        .zip(details)
        .map(|(id, details)| {
            if let Err(err) = &details {
                tracing::warn!(offer_id = id, %err, "failed to fetch offer details");
            }
            OfferEntry { id, details }
        })
        .collect()
}

/// Offer list as seen by a viewer, rendered as a table.
#[cfg(feature = "display")]
pub struct OffersView<'a> {
    entries: &'a [OfferEntry],
    viewer: Option<Address>,
}

#[cfg(feature = "display")]
impl<'a> OffersView<'a> {
    pub fn new(entries: &'a [OfferEntry], viewer: Option<Address>) -> Self {
        Self { entries, viewer }
    }
}

#[cfg(feature = "display")]
struct OfferRow<'a> {
    entry: &'a OfferEntry,
    viewer: Option<Address>,
}

#[cfg(feature = "display")]
impl tabled::Tabled for OfferRow<'_> {
    const LENGTH: usize = 6;

    fn fields(&self) -> Vec<std::borrow::Cow<'_, str>> {
        use colored::Colorize;

        use crate::types::OfferAction;

        match &self.entry.details {
            Ok(details) => vec![
                format!("#{}", self.entry.id).into(),
                details.offer.maker.to_string().into(),
                details.sell_amount().to_string().red().to_string().into(),
                details.buy_amount().to_string().green().to_string().into(),
                match details.price() {
                    Some(price) => format!("{price} {}", details.buy.symbol).into(),
                    None => "-".into(),
                },
                match details.offer.action_for(self.viewer) {
                    Some(OfferAction::Fill) => "fill".blue().to_string().into(),
                    Some(OfferAction::Cancel) => "cancel".yellow().to_string().into(),
                    None => "".into(),
                },
            ],
            Err(err) => vec![
                format!("#{}", self.entry.id).into(),
                err.to_string().bright_red().to_string().into(),
                "".into(),
                "".into(),
                "".into(),
                "".into(),
            ],
        }
    }

    fn headers() -> Vec<std::borrow::Cow<'static, str>> {
        vec![
            "Offer".into(),
            "Maker".into(),
            "Sell".into(),
            "Buy".into(),
            "Price".into(),
            "Action".into(),
        ]
    }
}

#[cfg(feature = "display")]
impl std::fmt::Display for OffersView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use tabled::{Table, settings::Style};

        if self.entries.is_empty() {
            return writeln!(f, "No open offers");
        }
        let rows = self.entries.iter().map(|entry| OfferRow { entry, viewer: self.viewer });
        let mut table = Table::new(rows);
        table.with(Style::sharp());
        table.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;
    use alloy_sol_types::SolCall;

    use super::*;
    use crate::{abi::erc20::IERC20, testing, types::OfferStatus};

    const CHAIN_ID: u64 = 10;
    const EXCHANGE: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
    const WETH: Address = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
    const USDC: Address = address!("0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85");
    const MAKER: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");

    // First default Anvil account, 0xf39F...2266
    const PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn connected() -> WalletSession {
        let mut session = WalletSession::disconnected();
        session.connect_private_key(PRIVATE_KEY, CHAIN_ID).unwrap();
        session
    }

    fn raw_offer(maker: Address, status: u8) -> P2PExchange::Offer {
        P2PExchange::Offer {
            id: U256::from(3),
            maker,
            tokenSell: WETH,
            amountSell: U256::from(10).pow(U256::from(18)),
            tokenBuy: USDC,
            amountBuy: U256::from(2_500_000_000u64),
            status,
        }
    }

    fn details(id: OfferId) -> OfferDetails {
        let mut raw = raw_offer(MAKER, 0);
        raw.id = U256::from(id);
        let offer = Offer::try_from(raw).unwrap();
        OfferDetails {
            sell: crate::types::TokenMeta { address: WETH, symbol: "WETH".into(), decimals: 18 },
            buy: crate::types::TokenMeta { address: USDC, symbol: "USDC".into(), decimals: 6 },
            offer,
        }
    }

    #[tokio::test]
    async fn test_reconcile_keeps_failed_offers_in_order() {
        let entries = reconcile(vec![5, 2, 9], |id| async move {
            if id == 2 { Err(SdkError::Decode("garbage".into())) } else { Ok(details(id)) }
        })
        .await;

        let ids: Vec<_> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![5, 2, 9]);
        assert!(!entries[0].is_error());
        assert!(entries[1].is_error());
        assert_eq!(entries[2].details().unwrap().offer.id, 9);
    }

    #[tokio::test]
    async fn test_open_offer_ids() {
        let (client, asserter) = testing::mocked_read_client(CHAIN_ID);
        asserter.push_success(&testing::encode_return(vec![U256::from(1), U256::from(4)]));

        let exchange = Exchange::new(&client, CHAIN_ID, EXCHANGE);
        assert_eq!(exchange.open_offer_ids().await.unwrap(), vec![1, 4]);
    }

    #[tokio::test]
    async fn test_offer_details() {
        let (client, asserter) = testing::mocked_read_client(CHAIN_ID);
        // Token metadata is cached before the concurrent lookups
        for (token, symbol, decimals) in [(WETH, "WETH", 18u8), (USDC, "USDC", 6u8)] {
            asserter.push_success(&testing::encode_return(symbol.to_string()));
            client.symbol(CHAIN_ID, token).await.unwrap();
            asserter.push_success(&testing::encode_decimals(decimals));
            client.decimals(CHAIN_ID, token).await.unwrap();
        }
        asserter.push_success(&testing::encode_return(raw_offer(MAKER, 0)));

        let exchange = Exchange::new(&client, CHAIN_ID, EXCHANGE);
        let details = exchange.offer_details(3).await.unwrap();
        assert_eq!(details.offer.status, OfferStatus::Open);
        assert_eq!(details.sell_amount().to_string(), "1 WETH");
        assert_eq!(details.buy_amount().to_string(), "2500 USDC");
    }

    #[tokio::test]
    async fn test_create_offer_steps() {
        let (client, asserter) = testing::mocked_read_client(CHAIN_ID);
        asserter.push_success(&testing::encode_decimals(18));
        client.decimals(CHAIN_ID, WETH).await.unwrap();
        asserter.push_success(&testing::encode_decimals(6));
        client.decimals(CHAIN_ID, USDC).await.unwrap();

        let exchange = Exchange::new(&client, CHAIN_ID, EXCHANGE);
        let request = OfferRequest {
            sell_token: WETH,
            sell_amount: "1.5".to_string(),
            buy_token: USDC,
            buy_amount: "3000".to_string(),
        };
        let steps = exchange.create_offer_steps(&connected(), &request).await.unwrap();

        assert_eq!(steps.len(), 2);
        let approve = IERC20::approveCall::abi_decode(steps[0].input()).unwrap();
        assert_eq!(steps[0].to(), WETH);
        assert_eq!(approve.spender, EXCHANGE);
        assert_eq!(approve.amount, U256::from(1_500_000_000_000_000_000u128));

        let create = P2PExchange::createOfferCall::abi_decode(steps[1].input()).unwrap();
        assert_eq!(steps[1].to(), EXCHANGE);
        assert_eq!(create.amountBuy, U256::from(3_000_000_000u64));
    }

    #[tokio::test]
    async fn test_create_offer_validation() {
        let (client, _asserter) = testing::mocked_read_client(CHAIN_ID);
        let exchange = Exchange::new(&client, CHAIN_ID, EXCHANGE);
        let request = OfferRequest {
            sell_token: WETH,
            sell_amount: "1".to_string(),
            buy_token: WETH,
            buy_amount: "1".to_string(),
        };

        assert_eq!(
            exchange.create_offer_steps(&WalletSession::disconnected(), &request).await,
            Err(SdkError::WalletNotConnected)
        );
        assert!(matches!(
            exchange.create_offer_steps(&connected(), &request).await,
            Err(SdkError::Validation(_))
        ));

        let empty = OfferRequest { sell_token: Address::ZERO, ..request };
        assert!(matches!(
            exchange.create_offer_steps(&connected(), &empty).await,
            Err(SdkError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_fill_and_cancel_rules() {
        let session = connected();
        let me = session.address().unwrap();

        let (client, asserter) = testing::mocked_read_client(CHAIN_ID);
        let exchange = Exchange::new(&client, CHAIN_ID, EXCHANGE);

        asserter.push_success(&testing::encode_return(raw_offer(MAKER, 0)));
        let steps = exchange.fill_offer_steps(&session, 3).await.unwrap();
        assert_eq!(steps[0].to(), USDC);
        assert_eq!(steps[1].label(), "fill offer #3");

        asserter.push_success(&testing::encode_return(raw_offer(me, 0)));
        assert!(matches!(
            exchange.fill_offer_steps(&session, 3).await,
            Err(SdkError::Validation(_))
        ));

        asserter.push_success(&testing::encode_return(raw_offer(me, 0)));
        let steps = exchange.cancel_offer_steps(&session, 3).await.unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].label(), "cancel offer #3");

        asserter.push_success(&testing::encode_return(raw_offer(MAKER, 0)));
        assert!(matches!(
            exchange.cancel_offer_steps(&session, 3).await,
            Err(SdkError::Validation(_))
        ));

        asserter.push_success(&testing::encode_return(raw_offer(me, 1)));
        assert!(matches!(
            exchange.cancel_offer_steps(&session, 3).await,
            Err(SdkError::Validation(_))
        ));
    }

    #[test]
    fn test_exchange_required() {
        let client = ReadClient::new();
        assert!(matches!(
            Exchange::for_chain(&client, &Chain::mainnet()),
            Err(SdkError::InvalidArgument(_))
        ));
        let chain = Chain::mainnet().with_exchange(EXCHANGE);
        assert_eq!(Exchange::for_chain(&client, &chain).unwrap().address(), EXCHANGE);
    }

    #[cfg(feature = "display")]
    #[test]
    fn test_offers_view() {
        colored::control::set_override(false);
        let entries = vec![
            OfferEntry { id: 1, details: Ok(details(1)) },
            OfferEntry { id: 2, details: Err(SdkError::Network("timeout".into())) },
        ];
        let rendered = OffersView::new(&entries, None).to_string();
        assert!(rendered.contains("1 WETH"));
        assert!(rendered.contains("2500 USDC"));
        assert!(rendered.contains("network error: timeout"));
        assert_eq!(OffersView::new(&[], None).to_string(), "No open offers\n");
    }
}
