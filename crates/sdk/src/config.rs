//! TOML configuration overriding the built-in registry.
//!
//! ```toml
//! [chains.10]
//! rpc_url = "https://optimism.example.org"
//! exchange = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
//!
//! [chains.31337]
//! name = "Anvil"
//! rpc_url = "http://localhost:8545"
//!
//! [[tokens]]
//! address = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"
//! chain_id = 31337
//! name = "TEST"
//!
//! [transactions]
//! poll_interval_ms = 500
//! max_polls = 240
//! ```

use std::{collections::BTreeMap, path::Path, str::FromStr, time::Duration};

use alloy::primitives::Address;
use serde::Deserialize;

use crate::{
    Chain,
    error::SdkError,
    registry::{Registry, Token},
    tx::ConfirmationPolicy,
};

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Per-chain overrides keyed by chain ID.
    #[serde(default)]
    pub chains: BTreeMap<String, ChainConfig>,
    /// Tokens added to the registry.
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
    #[serde(default)]
    pub transactions: Option<TransactionsConfig>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    pub name: Option<String>,
    pub native_symbol: Option<String>,
    pub rpc_url: Option<String>,
    pub explorer_url: Option<String>,
    pub exchange: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TokenConfig {
    pub address: String,
    pub chain_id: u64,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TransactionsConfig {
    pub poll_interval_ms: Option<u64>,
    pub max_polls: Option<u32>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SdkError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            SdkError::InvalidArgument(format!("reading config {}: {err}", path.display()))
        })?;
        content.parse()
    }

    /// Applies chain overrides and extra tokens to the registry.
    ///
    /// A chain ID unknown to the registry requires at least `rpc_url`.
    pub fn apply(&self, registry: &mut Registry) -> Result<(), SdkError> {
        for (key, overrides) in &self.chains {
            let chain_id = u64::from_str(key)
                .map_err(|_| SdkError::InvalidArgument(format!("invalid chain ID {key:?}")))?;
            let base = match registry.chain(chain_id) {
                Some(chain) => chain.clone(),
                None => {
                    let rpc_url = overrides.rpc_url.as_deref().ok_or_else(|| {
                        SdkError::InvalidArgument(format!("chain {chain_id} requires rpc_url"))
                    })?;
                    Chain::custom(
                        chain_id,
                        overrides.name.clone().unwrap_or_else(|| format!("Chain {chain_id}")),
                        overrides.native_symbol.clone().unwrap_or_else(|| "ETH".to_string()),
                        rpc_url,
                        overrides.explorer_url.as_deref(),
                    )
                },
            };
            registry.upsert_chain(overrides.merge(base)?);
        }

        for token in &self.tokens {
            if registry.chain(token.chain_id).is_none() {
                return Err(SdkError::InvalidArgument(format!(
                    "token {} refers to unknown chain {}",
                    token.name, token.chain_id
                )));
            }
            registry.add_token(Token::new(
                parse_address(&token.address)?,
                token.chain_id,
                token.name.clone(),
            ));
        }

        Ok(())
    }

    /// Confirmation polling policy, defaults for anything not configured.
    pub fn confirmation_policy(&self) -> ConfirmationPolicy {
        let default = ConfirmationPolicy::default();
        match &self.transactions {
            Some(tx) => ConfirmationPolicy {
                poll_interval: tx
                    .poll_interval_ms
                    .map(Duration::from_millis)
                    .unwrap_or(default.poll_interval),
                max_polls: tx.max_polls.unwrap_or(default.max_polls),
            },
            None => default,
        }
    }
}

impl FromStr for Config {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s).map_err(|err| SdkError::InvalidArgument(format!("invalid config: {err}")))
    }
}

impl ChainConfig {
    fn merge(&self, mut chain: Chain) -> Result<Chain, SdkError> {
        if self.name.is_some() || self.native_symbol.is_some() || self.explorer_url.is_some() {
            let exchange = chain.exchange();
            chain = Chain::custom(
                chain.chain_id(),
                self.name.as_deref().unwrap_or(chain.name()),
                self.native_symbol.as_deref().unwrap_or(chain.native_symbol()),
                chain.rpc_url(),
                self.explorer_url.as_deref().or(chain.explorer_url()),
            );
            if let Some(exchange) = exchange {
                chain = chain.with_exchange(exchange);
            }
        }
        if let Some(rpc_url) = &self.rpc_url {
            chain = chain.with_rpc_url(rpc_url.clone());
        }
        if let Some(exchange) = &self.exchange {
            chain = chain.with_exchange(parse_address(exchange)?);
        }
        Ok(chain)
    }
}

fn parse_address(s: &str) -> Result<Address, SdkError> {
    Address::from_str(s.trim())
        .map_err(|err| SdkError::InvalidArgument(format!("invalid address {s:?}: {err}")))
}
