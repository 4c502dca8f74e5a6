use alloy::{
    primitives::{Bytes, U256},
    providers::{Provider, ProviderBuilder},
    transports::mock::Asserter,
};
use alloy_sol_types::SolValue;

use crate::read::ReadClient;

/// Read client for a single chain whose RPC responses are taken in order
/// from the returned [`Asserter`].
pub fn mocked_read_client(chain_id: u64) -> (ReadClient, Asserter) {
    let asserter = Asserter::new();
    let provider = ProviderBuilder::new().connect_mocked_client(asserter.clone()).erased();
    (ReadClient::new().with_provider(chain_id, provider), asserter)
}

/// ABI-encodes a single function return value as `eth_call` output.
pub fn encode_return<T: SolValue>(value: T) -> Bytes { Bytes::from(value.abi_encode()) }

/// Encodes an ERC-20 `decimals()` result, which the ABI pads to a full word.
pub fn encode_decimals(decimals: u8) -> Bytes { encode_return(U256::from(decimals)) }
