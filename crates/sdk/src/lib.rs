//! Tokendesk SDK.
//!
//! # Overview
//!
//! Multi-chain ERC-20 token and peer-to-peer exchange client.
//!
//! Use [`read::ReadClient`] to query token and exchange contracts across the
//! supported chains, [`token`] and [`exchange`] to prepare transfers and offer
//! requests, and [`tx::TxSequence`] to submit them one confirmed step at a
//! time through a connected [`wallet::WalletSession`].
//!
//! All business rules (offer matching, settlement, balances) are enforced by
//! the external contracts, the SDK only mirrors their state and submits
//! transactions.
//!
//! See `./tests` for examples.
//!
//! # Limitations/follow-ups
//!
//! * Confirmation is observed by receipt polling, there is no WebSocket
//!   subscription support.
//!
//! * Only local private key signers are supported by [`wallet::WalletSession`].
//!
//! # Features
//!
//! | Feature | Default | Description |
//! | --- | --- | --- |
//! | `display` | yes | Enables [`std::fmt::Display`] implementation for view types. |
//! | `testing` | yes | Enables [`testing`] module. |
//!
//! # Testing
//!
//! [`testing`] module provides a recording transaction backend and a read
//! client over a mocked transport.

pub mod abi;
pub mod config;
pub mod error;
pub mod exchange;
pub mod num;
pub mod read;
pub mod registry;
pub mod selection;
#[cfg(feature = "testing")]
pub mod testing;
pub mod token;
pub mod tx;
pub mod types;
pub mod wallet;

use alloy::primitives::{Address, TxHash};

/// Chain the tokens and exchange contract are deployed on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chain {
    chain_id: u64,
    name: String,
    native_symbol: String,
    rpc_url: String,
    explorer_url: Option<String>,
    exchange: Option<Address>,
}

impl Chain {
    pub fn mainnet() -> Self {
        Self::custom(1, "Ethereum", "ETH", "https://eth.merkle.io", Some("https://etherscan.io"))
    }

    pub fn optimism() -> Self {
        Self::custom(
            10,
            "OP Mainnet",
            "ETH",
            "https://mainnet.optimism.io",
            Some("https://optimistic.etherscan.io"),
        )
    }

    pub fn bsc() -> Self {
        Self::custom(
            56,
            "BNB Smart Chain",
            "BNB",
            "https://56.rpc.thirdweb.com",
            Some("https://bscscan.com"),
        )
    }

    pub fn sepolia() -> Self {
        Self::custom(
            11155111,
            "Sepolia",
            "ETH",
            "https://sepolia.drpc.org",
            Some("https://sepolia.etherscan.io"),
        )
    }

    /// All chains supported out of the box.
    pub fn supported() -> Vec<Self> {
        vec![Self::mainnet(), Self::optimism(), Self::bsc(), Self::sepolia()]
    }

    /// Looks up one of the [`Self::supported`] chains by ID.
    pub fn by_id(chain_id: u64) -> Option<Self> {
        Self::supported().into_iter().find(|c| c.chain_id == chain_id)
    }

    pub fn custom(
        chain_id: u64,
        name: impl Into<String>,
        native_symbol: impl Into<String>,
        rpc_url: impl Into<String>,
        explorer_url: Option<&str>,
    ) -> Self {
        Self {
            chain_id,
            name: name.into(),
            native_symbol: native_symbol.into(),
            rpc_url: rpc_url.into(),
            explorer_url: explorer_url.map(|url| url.trim_end_matches('/').to_string()),
            exchange: None,
        }
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    pub fn with_exchange(mut self, exchange: Address) -> Self {
        self.exchange = Some(exchange);
        self
    }

    pub fn chain_id(&self) -> u64 { self.chain_id }

    pub fn name(&self) -> &str { &self.name }

    pub fn native_symbol(&self) -> &str { &self.native_symbol }

    pub fn rpc_url(&self) -> &str { &self.rpc_url }

    pub fn explorer_url(&self) -> Option<&str> { self.explorer_url.as_deref() }

    /// P2P exchange contract deployed on the chain, if known.
    pub fn exchange(&self) -> Option<Address> { self.exchange }

    /// Explorer page of the token contract.
    pub fn explorer_token_url(&self, token: Address) -> Option<String> {
        self.explorer_url().map(|url| format!("{url}/token/{token}"))
    }

    /// Explorer page of the transaction.
    pub fn explorer_tx_url(&self, tx_hash: TxHash) -> Option<String> {
        self.explorer_url().map(|url| format!("{url}/tx/{tx_hash}"))
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, b256};

    use super::*;

    #[test]
    fn test_supported_chain_lookup() {
        assert_eq!(Chain::by_id(10).map(|c| c.name().to_string()), Some("OP Mainnet".to_string()));
        assert_eq!(Chain::by_id(11155111), Some(Chain::sepolia()));
        assert_eq!(Chain::by_id(42), None);
    }

    #[test]
    fn test_explorer_urls() {
        let token = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
        assert_eq!(
            Chain::mainnet().explorer_token_url(token).unwrap(),
            "https://etherscan.io/token/0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
        );

        let tx = b256!("0x00000000000000000000000000000000000000000000000000000000000000ff");
        assert_eq!(
            Chain::optimism().explorer_tx_url(tx).unwrap(),
            format!("https://optimistic.etherscan.io/tx/{tx}")
        );

        let local = Chain::custom(31337, "Anvil", "ETH", "http://localhost:8545", None);
        assert!(local.explorer_token_url(token).is_none());
    }
}
