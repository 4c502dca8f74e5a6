//! Known tokens per chain.

use alloy::primitives::{Address, address};
use itertools::Itertools;

use crate::Chain;

/// Host serving token icons keyed by chain ID and token address.
pub const TOKEN_ICONS_URL: &str = "https://token-icons.llamao.fi/icons/tokens";

/// Token known to the registry.
///
/// Only the address, chain and display name are configured, decimals and
/// symbol are always fetched from the contract.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Token {
    pub address: Address,
    pub chain_id: u64,
    pub name: String,
}

impl Token {
    pub fn new(address: Address, chain_id: u64, name: impl Into<String>) -> Self {
        Self { address, chain_id, name: name.into() }
    }

    /// URL of the token icon.
    pub fn icon_url(&self) -> String { icon_url(self.chain_id, self.address) }
}

/// URL of the icon of the token deployed at `address` on `chain_id`.
pub fn icon_url(chain_id: u64, address: Address) -> String {
    format!("{TOKEN_ICONS_URL}/{chain_id}/{address}")
}

/// Registry of supported chains and known tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registry {
    chains: Vec<Chain>,
    tokens: Vec<Token>,
}

impl Default for Registry {
    fn default() -> Self { Self::new(Chain::supported(), default_tokens()) }
}

impl Registry {
    pub fn new(chains: Vec<Chain>, tokens: Vec<Token>) -> Self { Self { chains, tokens } }

    pub fn chains(&self) -> &[Chain] { &self.chains }

    pub fn tokens(&self) -> &[Token] { &self.tokens }

    pub fn chain(&self, chain_id: u64) -> Option<&Chain> {
        self.chains.iter().find(|c| c.chain_id() == chain_id)
    }

    /// Tokens registered on the chain, in registration order.
    pub fn tokens_for_chain(&self, chain_id: u64) -> Vec<&Token> {
        self.tokens.iter().filter(|t| t.chain_id == chain_id).collect()
    }

    pub fn token(&self, chain_id: u64, address: Address) -> Option<&Token> {
        self.tokens.iter().find(|t| t.chain_id == chain_id && t.address == address)
    }

    /// Replaces the chain with the same ID or adds a new one.
    pub fn upsert_chain(&mut self, chain: Chain) {
        match self.chains.iter_mut().find(|c| c.chain_id() == chain.chain_id()) {
            Some(existing) => *existing = chain,
            None => self.chains.push(chain),
        }
    }

    /// Adds the token unless it is already registered on its chain.
    pub fn add_token(&mut self, token: Token) {
        if self.token(token.chain_id, token.address).is_none() {
            self.tokens.push(token);
        }
    }

    /// Known tokens grouped by chain ID, chains in registry order.
    pub fn tokens_by_chain(&self) -> Vec<(&Chain, Vec<&Token>)> {
        let mut by_chain = self.tokens.iter().into_group_map_by(|t| t.chain_id);
        self.chains
            .iter()
            .map(|chain| (chain, by_chain.remove(&chain.chain_id()).unwrap_or_default()))
            .collect()
    }
}

/// Tokens shipped with the SDK.
pub fn default_tokens() -> Vec<Token> {
    vec![
        Token::new(address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"), 1, "WETH"),
        Token::new(address!("0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599"), 1, "WBTC"),
        Token::new(address!("0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85"), 10, "USDC"),
        Token::new(address!("0xCaC524BcA292aaade2DF8A05cC58F0a65B1B3bB9"), 11155111, "PyUSD"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_for_chain() {
        let registry = Registry::default();
        let mainnet: Vec<_> =
            registry.tokens_for_chain(1).iter().map(|t| t.name.as_str()).collect();
        assert_eq!(mainnet, vec!["WETH", "WBTC"]);
        assert_eq!(registry.tokens_for_chain(10).len(), 1);
        assert!(registry.tokens_for_chain(56).is_empty());
        assert!(registry.tokens_for_chain(999).is_empty());
    }

    #[test]
    fn test_tokens_by_chain_covers_chains_without_tokens() {
        let registry = Registry::default();
        let grouped = registry.tokens_by_chain();
        assert_eq!(grouped.len(), 4);
        let (bsc, tokens) = &grouped[2];
        assert_eq!(bsc.chain_id(), 56);
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_add_token_is_idempotent() {
        let mut registry = Registry::default();
        let before = registry.tokens().len();
        registry.add_token(default_tokens()[0].clone());
        assert_eq!(registry.tokens().len(), before);
        registry.add_token(Token::new(Address::repeat_byte(1), 56, "TEST"));
        assert_eq!(registry.tokens_for_chain(56).len(), 1);
    }

    #[test]
    fn test_icon_url() {
        let weth = &default_tokens()[0];
        assert_eq!(
            weth.icon_url(),
            "https://token-icons.llamao.fi/icons/tokens/1/0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
        );
    }
}
