use std::fmt::Display;

use alloy::primitives::{Address, U256};
use fastnum::UD256;

use super::{OfferId, TokenAmount, TokenMeta};
use crate::{abi::p2p::P2PExchange, error::SdkError};

/// Status of the offer as tracked by the exchange contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OfferStatus {
    Open,
    Filled,
    Cancelled,
}

impl TryFrom<u8> for OfferStatus {
    type Error = SdkError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OfferStatus::Open),
            1 => Ok(OfferStatus::Filled),
            2 => Ok(OfferStatus::Cancelled),
            _ => Err(SdkError::Decode(format!("unknown offer status {value}"))),
        }
    }
}

impl Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OfferStatus::Open => write!(f, "Open"),
            OfferStatus::Filled => write!(f, "Filled"),
            OfferStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Action available to a viewer of an open offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OfferAction {
    Fill,
    Cancel,
}

/// Offer mirrored from the exchange contract.
///
/// Read-only: changes are requested through transactions and observed by
/// re-reading the offer.
#[derive(Clone, derive_more::Debug, PartialEq, Eq)]
pub struct Offer {
    pub id: OfferId,
    pub maker: Address,
    pub sell_token: Address,
    #[debug("{sell_amount}")]
    pub sell_amount: U256,
    pub buy_token: Address,
    #[debug("{buy_amount}")]
    pub buy_amount: U256,
    pub status: OfferStatus,
}

impl Offer {
    pub fn is_open(&self) -> bool { self.status == OfferStatus::Open }

    /// Action the viewer can take on the offer: the maker can cancel it,
    /// anyone else can fill it. Nothing is available to a disconnected
    /// viewer or on a closed offer.
    pub fn action_for(&self, viewer: Option<Address>) -> Option<OfferAction> {
        let viewer = viewer?;
        if !self.is_open() {
            return None;
        }
        if viewer == self.maker { Some(OfferAction::Cancel) } else { Some(OfferAction::Fill) }
    }
}

impl TryFrom<P2PExchange::Offer> for Offer {
    type Error = SdkError;

    fn try_from(offer: P2PExchange::Offer) -> Result<Self, Self::Error> {
        Ok(Self {
            id: offer_id(offer.id)?,
            maker: offer.maker,
            sell_token: offer.tokenSell,
            sell_amount: offer.amountSell,
            buy_token: offer.tokenBuy,
            buy_amount: offer.amountBuy,
            status: offer.status.try_into()?,
        })
    }
}

/// Converts on-chain offer ID into [`OfferId`].
pub(crate) fn offer_id(id: U256) -> Result<OfferId, SdkError> {
    id.try_into().map_err(|_| SdkError::Decode(format!("offer ID {id} out of range")))
}

/// Offer with both tokens' metadata resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OfferDetails {
    pub offer: Offer,
    pub sell: TokenMeta,
    pub buy: TokenMeta,
}

impl OfferDetails {
    pub fn sell_amount(&self) -> TokenAmount {
        TokenAmount::new(
            self.sell.address,
            self.sell.symbol.clone(),
            self.sell.decimals,
            self.offer.sell_amount,
        )
    }

    pub fn buy_amount(&self) -> TokenAmount {
        TokenAmount::new(
            self.buy.address,
            self.buy.symbol.clone(),
            self.buy.decimals,
            self.offer.buy_amount,
        )
    }

    /// Price of one sell token expressed in buy tokens.
    pub fn price(&self) -> Option<UD256> {
        let sell = self.sell_amount().value();
        if sell == UD256::ZERO {
            return None;
        }
        Some(self.buy_amount().value() / sell)
    }
}

/// Entry of the reconciled offer list.
///
/// An offer whose details could not be fetched stays in the list with the
/// error instead of being dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OfferEntry {
    pub id: OfferId,
    pub details: Result<OfferDetails, SdkError>,
}

impl OfferEntry {
    pub fn is_error(&self) -> bool { self.details.is_err() }

    pub fn details(&self) -> Option<&OfferDetails> { self.details.as_ref().ok() }
}
