//! Contract view reads with result caching.

use std::{collections::HashMap, time::Duration};

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, Bytes, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::{client::RpcClient, types::TransactionRequest},
    transports::layers::{RetryBackoffLayer, ThrottleLayer},
};
use alloy_sol_types::SolCall;
use dashmap::DashMap;

use crate::{
    Chain,
    abi::erc20::IERC20,
    error::SdkError,
    num::MAX_DECIMALS,
    tx::TxStep,
    types::{TokenInfo, TokenMeta},
};

/// Functions whose results never change for a given contract and so survive
/// [`ReadClient::invalidate`].
const IMMUTABLE_FUNCTIONS: [&str; 3] =
    [IERC20::decimalsCall::SIGNATURE, IERC20::symbolCall::SIGNATURE, IERC20::nameCall::SIGNATURE];

/// Connects an RPC client to the chain endpoint.
///
/// Rate-limit errors are retried with backoff, requests are optionally
/// throttled (req/sec).
pub async fn connect_client(chain: &Chain, throttle: Option<u32>) -> Result<RpcClient, SdkError> {
    let client = if let Some(throttle) = throttle {
        RpcClient::builder()
            .layer(ThrottleLayer::new(throttle))
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .connect(chain.rpc_url())
            .await?
    } else {
        RpcClient::builder()
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .connect(chain.rpc_url())
            .await?
    };
    client.set_poll_interval(Duration::from_millis(500));
    Ok(client)
}

/// Key of the cached contract call result.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallKey {
    pub chain_id: u64,
    pub address: Address,
    pub function: &'static str,
    /// ABI-encoded call, selector included.
    pub args: Bytes,
}

/// Read client over a set of chains.
///
/// Results of contract calls are cached by [`CallKey`]. Refresh is
/// pull-based: after a write touching a contract completes, the caller
/// invalidates it with [`ReadClient::invalidate`] and re-reads.
///
/// Unknown or garbage contract addresses produce [`SdkError::Decode`] as
/// they return no data.
#[derive(Clone, Default)]
pub struct ReadClient {
    providers: HashMap<u64, DynProvider>,
    cache: DashMap<CallKey, Bytes>,
}

impl ReadClient {
    pub fn new() -> Self { Self::default() }

    /// Connects to every given chain, e.g. [`crate::registry::Registry::chains`].
    pub async fn connect<'c>(
        chains: impl IntoIterator<Item = &'c Chain>,
        throttle: Option<u32>,
    ) -> Result<Self, SdkError> {
        let mut client = Self::new();
        for chain in chains {
            let rpc = connect_client(chain, throttle).await?;
            let provider = ProviderBuilder::new().connect_client(rpc).erased();
            client = client.with_provider(chain.chain_id(), provider);
        }
        Ok(client)
    }

    pub fn with_provider(mut self, chain_id: u64, provider: DynProvider) -> Self {
        self.providers.insert(chain_id, provider);
        self
    }

    pub fn provider(&self, chain_id: u64) -> Result<&DynProvider, SdkError> {
        self.providers.get(&chain_id).ok_or(SdkError::UnsupportedChain(chain_id))
    }

    /// Performs the contract call, served from cache when possible.
    pub async fn call<C: SolCall>(
        &self,
        chain_id: u64,
        address: Address,
        call: &C,
    ) -> Result<C::Return, SdkError> {
        self.fetch(chain_id, address, call, true).await
    }

    /// Performs the contract call bypassing the cache, replacing the cached
    /// result.
    pub async fn refresh<C: SolCall>(
        &self,
        chain_id: u64,
        address: Address,
        call: &C,
    ) -> Result<C::Return, SdkError> {
        self.fetch(chain_id, address, call, false).await
    }

    /// Drops cached results of the contract except immutable metadata.
    /// Returns number of dropped entries.
    pub fn invalidate(&self, chain_id: u64, address: Address) -> usize {
        let before = self.cache.len();
        self.cache.retain(|key, _| {
            key.chain_id != chain_id
                || key.address != address
                || IMMUTABLE_FUNCTIONS.contains(&key.function)
        });
        let dropped = before.saturating_sub(self.cache.len());
        tracing::debug!(chain_id, %address, dropped, "cache invalidated");
        dropped
    }

    /// Number of cached call results.
    pub fn cached(&self) -> usize { self.cache.len() }

    async fn fetch<C: SolCall>(
        &self,
        chain_id: u64,
        address: Address,
        call: &C,
        use_cache: bool,
    ) -> Result<C::Return, SdkError> {
        let input = Bytes::from(call.abi_encode());
        let key = CallKey { chain_id, address, function: C::SIGNATURE, args: input.clone() };

        let cached = if use_cache { self.cache.get(&key).map(|e| e.value().clone()) } else { None };
        if let Some(data) = cached {
            tracing::trace!(chain_id, %address, function = C::SIGNATURE, "cache hit");
            return decode::<C>(&data);
        }

        tracing::debug!(chain_id, %address, function = C::SIGNATURE, "eth_call");
        let provider = self.provider(chain_id)?;
        let tx = TransactionRequest::default().with_to(address).with_input(input);
        let data = provider.call(tx).await?;
        let result = decode::<C>(&data)?;
        self.cache.insert(key, data);
        Ok(result)
    }

    /// Native currency balance of the account.
    pub async fn native_balance(&self, chain_id: u64, owner: Address) -> Result<U256, SdkError> {
        Ok(self.provider(chain_id)?.get_balance(owner).await?)
    }

    /// Gas the step would consume if sent from `from` now.
    ///
    /// Fails with [`SdkError::Network`] if the call would revert.
    pub async fn estimate_gas(
        &self,
        chain_id: u64,
        from: Address,
        step: &TxStep,
    ) -> Result<u64, SdkError> {
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(step.to())
            .with_input(step.input().clone());
        Ok(self.provider(chain_id)?.estimate_gas(tx).await?)
    }

    /// Current gas price in wei.
    pub async fn gas_price(&self, chain_id: u64) -> Result<u128, SdkError> {
        Ok(self.provider(chain_id)?.get_gas_price().await?)
    }

    /// Fails with [`SdkError::Decode`] if the token reports more decimals
    /// than an amount can be formatted with.
    pub async fn decimals(&self, chain_id: u64, token: Address) -> Result<u8, SdkError> {
        let decimals = self.call(chain_id, token, &IERC20::decimalsCall {}).await?;
        if decimals > MAX_DECIMALS {
            return Err(SdkError::Decode(format!(
                "{} returned {decimals}, more than {MAX_DECIMALS}",
                IERC20::decimalsCall::SIGNATURE
            )));
        }
        Ok(decimals)
    }

    pub async fn symbol(&self, chain_id: u64, token: Address) -> Result<String, SdkError> {
        self.call(chain_id, token, &IERC20::symbolCall {}).await
    }

    pub async fn name(&self, chain_id: u64, token: Address) -> Result<String, SdkError> {
        self.call(chain_id, token, &IERC20::nameCall {}).await
    }

    pub async fn total_supply(&self, chain_id: u64, token: Address) -> Result<U256, SdkError> {
        self.call(chain_id, token, &IERC20::totalSupplyCall {}).await
    }

    pub async fn balance_of(
        &self,
        chain_id: u64,
        token: Address,
        owner: Address,
    ) -> Result<U256, SdkError> {
        self.call(chain_id, token, &IERC20::balanceOfCall { owner }).await
    }

    /// Symbol and decimals of the token, fetched concurrently.
    pub async fn token_meta(&self, chain_id: u64, token: Address) -> Result<TokenMeta, SdkError> {
        let (symbol, decimals) =
            futures::try_join!(self.symbol(chain_id, token), self.decimals(chain_id, token))?;
        Ok(TokenMeta { address: token, symbol, decimals })
    }

    /// Full token metadata, fetched concurrently.
    pub async fn token_info(&self, chain_id: u64, token: Address) -> Result<TokenInfo, SdkError> {
        let (name, symbol, decimals) = futures::try_join!(
            self.name(chain_id, token),
            self.symbol(chain_id, token),
            self.decimals(chain_id, token)
        )?;
        Ok(TokenInfo { chain_id, address: token, name, symbol, decimals })
    }
}

fn decode<C: SolCall>(data: &[u8]) -> Result<C::Return, SdkError> {
    if data.is_empty() {
        return Err(SdkError::Decode(format!(
            "{} returned no data, the address is probably not a contract",
            C::SIGNATURE
        )));
    }
    C::abi_decode_returns(data).map_err(|err| SdkError::Decode(format!("{}: {err}", C::SIGNATURE)))
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;
    use crate::testing;

    const TOKEN: Address = address!("0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85");
    const OWNER: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");

    #[tokio::test]
    async fn test_call_is_cached() {
        let (client, asserter) = testing::mocked_read_client(10);
        asserter.push_success(&testing::encode_decimals(6));

        assert_eq!(client.decimals(10, TOKEN).await.unwrap(), 6);
        // Served from cache, no response is queued for a second request
        assert_eq!(client.decimals(10, TOKEN).await.unwrap(), 6);
        assert_eq!(client.cached(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_keeps_metadata() {
        let (client, asserter) = testing::mocked_read_client(10);
        asserter.push_success(&testing::encode_decimals(6));
        asserter.push_success(&testing::encode_return(U256::from(1_000_000u64)));
        asserter.push_success(&testing::encode_return(U256::from(250_000u64)));

        client.decimals(10, TOKEN).await.unwrap();
        assert_eq!(client.balance_of(10, TOKEN, OWNER).await.unwrap(), U256::from(1_000_000u64));

        assert_eq!(client.invalidate(10, TOKEN), 1);
        assert_eq!(client.invalidate(1, TOKEN), 0);
        assert_eq!(client.cached(), 1);

        assert_eq!(client.balance_of(10, TOKEN, OWNER).await.unwrap(), U256::from(250_000u64));
        assert_eq!(client.decimals(10, TOKEN).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache() {
        let (client, asserter) = testing::mocked_read_client(10);
        asserter.push_success(&testing::encode_return(U256::from(1u64)));
        asserter.push_success(&testing::encode_return(U256::from(2u64)));

        let call = IERC20::totalSupplyCall {};
        assert_eq!(client.call(10, TOKEN, &call).await.unwrap(), U256::from(1u64));
        assert_eq!(client.refresh(10, TOKEN, &call).await.unwrap(), U256::from(2u64));
        assert_eq!(client.call(10, TOKEN, &call).await.unwrap(), U256::from(2u64));
    }

    #[tokio::test]
    async fn test_garbage_address_is_decode_error() {
        let (client, asserter) = testing::mocked_read_client(10);
        asserter.push_success(&Bytes::new());

        let err = client.symbol(10, Address::repeat_byte(0xab)).await.unwrap_err();
        assert!(matches!(err, SdkError::Decode(_)));
        assert_eq!(client.cached(), 0);
    }

    #[tokio::test]
    async fn test_unformattable_decimals_rejected() {
        let (client, asserter) = testing::mocked_read_client(10);
        asserter.push_success(&testing::encode_decimals(80));

        let err = client.decimals(10, TOKEN).await.unwrap_err();
        assert!(matches!(err, SdkError::Decode(_)));
    }

    #[tokio::test]
    async fn test_network_failure() {
        let (client, asserter) = testing::mocked_read_client(10);
        asserter.push_failure_msg("execution reverted");

        let err = client.total_supply(10, TOKEN).await.unwrap_err();
        assert!(matches!(err, SdkError::Network(_)));
    }

    #[tokio::test]
    async fn test_unknown_chain() {
        let (client, _asserter) = testing::mocked_read_client(10);
        assert_eq!(client.decimals(56, TOKEN).await, Err(SdkError::UnsupportedChain(56)));
    }
}
