//! Chain and token selection of the transfer and offer forms.

use alloy::primitives::Address;

use crate::{
    Chain,
    error::SdkError,
    registry::{Registry, Token},
};

pub const SELECT_CHAIN: &str = "Select a chain";
pub const NO_TOKENS: &str = "No tokens available";
pub const SELECT_TOKEN: &str = "Select a token";

/// Selected chain and token.
///
/// The token is always one registered on the selected chain: switching the
/// chain clears it.
#[derive(Clone, Debug)]
pub struct TokenSelection<'r> {
    registry: &'r Registry,
    chain_id: Option<u64>,
    token: Option<Address>,
}

impl<'r> TokenSelection<'r> {
    pub fn new(registry: &'r Registry) -> Self { Self { registry, chain_id: None, token: None } }

    pub fn chain(&self) -> Option<&'r Chain> {
        self.chain_id.and_then(|id| self.registry.chain(id))
    }

    pub fn token(&self) -> Option<&'r Token> {
        let chain_id = self.chain_id?;
        self.token.and_then(|address| self.registry.token(chain_id, address))
    }

    /// Selects the chain and clears the token selection.
    pub fn select_chain(&mut self, chain_id: u64) -> Result<(), SdkError> {
        if self.registry.chain(chain_id).is_none() {
            return Err(SdkError::UnsupportedChain(chain_id));
        }
        self.chain_id = Some(chain_id);
        self.token = None;
        Ok(())
    }

    pub fn clear_chain(&mut self) {
        self.chain_id = None;
        self.token = None;
    }

    /// Selects a token registered on the selected chain.
    pub fn select_token(&mut self, address: Address) -> Result<&'r Token, SdkError> {
        let chain_id =
            self.chain_id.ok_or_else(|| SdkError::validation("select a chain before the token"))?;
        let token = self.registry.token(chain_id, address).ok_or_else(|| {
            SdkError::validation(format!("token {address} is not registered on chain {chain_id}"))
        })?;
        self.token = Some(address);
        Ok(token)
    }

    /// Tokens the user can pick from, empty without a selected chain.
    pub fn available_tokens(&self) -> Vec<&'r Token> {
        match self.chain_id {
            Some(chain_id) => self.registry.tokens_for_chain(chain_id),
            None => Vec::new(),
        }
    }

    /// Text of the token picker while no token is selected.
    pub fn placeholder(&self) -> &'static str {
        match self.chain_id {
            None => SELECT_CHAIN,
            Some(chain_id) if self.registry.tokens_for_chain(chain_id).is_empty() => NO_TOKENS,
            Some(_) => SELECT_TOKEN,
        }
    }
}
