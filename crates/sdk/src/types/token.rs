use std::fmt::Display;

use alloy::primitives::{Address, U256};
use fastnum::UD256;

use crate::num;

/// Token metadata fetched from the token contract.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TokenInfo {
    pub chain_id: u64,
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenInfo {
    pub fn amount(&self, raw: U256) -> TokenAmount {
        TokenAmount::new(self.address, self.symbol.clone(), self.decimals, raw)
    }
}

/// Symbol and decimals of a token, the minimum needed to render amounts.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TokenMeta {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenMeta {
    pub fn converter(&self) -> num::Converter { num::Converter::new(self.decimals) }
}

/// Raw token amount together with what is needed to present it.
#[derive(Clone, derive_more::Debug, PartialEq, Eq)]
pub struct TokenAmount {
    token: Address,
    symbol: String,
    decimals: u8,
    #[debug("{raw}")]
    raw: U256,
}

impl TokenAmount {
    pub fn new(token: Address, symbol: impl Into<String>, decimals: u8, raw: U256) -> Self {
        Self { token, symbol: symbol.into(), decimals, raw }
    }

    pub fn token(&self) -> Address { self.token }

    pub fn symbol(&self) -> &str { &self.symbol }

    pub fn decimals(&self) -> u8 { self.decimals }

    /// Amount in the smallest token units.
    pub fn raw(&self) -> U256 { self.raw }

    /// Amount in whole tokens.
    pub fn value(&self) -> UD256 { num::Converter::new(self.decimals).from_unsigned(self.raw) }
}

impl Display for TokenAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let formatted = num::Converter::new(self.decimals).format(self.raw);
        if self.symbol.is_empty() {
            write!(f, "{formatted}")
        } else {
            write!(f, "{formatted} {}", self.symbol)
        }
    }
}

/// Total supply of a token along with its metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenSupply {
    pub info: TokenInfo,
    pub total_supply: U256,
}

impl TokenSupply {
    pub fn total_supply_amount(&self) -> TokenAmount { self.info.amount(self.total_supply) }
}
