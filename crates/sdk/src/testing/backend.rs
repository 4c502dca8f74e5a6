use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use alloy::primitives::{TxHash, U256};

use crate::{
    error::SdkError,
    tx::{Confirmation, TxBackend, TxStep},
};

/// Call observed by [`MockBackend`], carrying the step index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendCall {
    Submit(usize),
    Poll(usize),
}

/// Transaction backend recording calls in order.
///
/// Steps are numbered by submission order. Every submitted transaction is
/// reported pending for the configured number of polls and mined on the
/// next one, unless it is set up to revert.
#[derive(Clone, Debug, Default)]
pub struct MockBackend {
    pending_polls: usize,
    rejected: HashMap<usize, SdkError>,
    reverted: Vec<usize>,
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<BackendCall>,
    submitted: usize,
    steps: HashMap<TxHash, usize>,
    polls: HashMap<TxHash, usize>,
}

impl MockBackend {
    pub fn new() -> Self { Self::default() }

    /// Number of polls reporting each transaction as not yet mined.
    pub fn with_pending_polls(mut self, polls: usize) -> Self {
        self.pending_polls = polls;
        self
    }

    /// Fails submission of the step with the error, e.g. a wallet rejection.
    pub fn reject_submission(mut self, step: usize, err: SdkError) -> Self {
        self.rejected.insert(step, err);
        self
    }

    /// Mines the step as reverted.
    pub fn revert(mut self, step: usize) -> Self {
        self.reverted.push(step);
        self
    }

    pub fn calls(&self) -> Vec<BackendCall> { self.lock().calls.clone() }

    /// Number of successfully submitted transactions.
    pub fn submitted(&self) -> usize { self.lock().submitted }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn step_hash(step: usize) -> TxHash { TxHash::from(U256::from(step)) }

impl TxBackend for MockBackend {
    async fn submit(&self, _step: &TxStep) -> Result<TxHash, SdkError> {
        let mut state = self.lock();
        let index = state.submitted;
        state.calls.push(BackendCall::Submit(index));
        if let Some(err) = self.rejected.get(&index) {
            return Err(err.clone());
        }
        state.submitted += 1;
        let tx_hash = step_hash(index);
        state.steps.insert(tx_hash, index);
        Ok(tx_hash)
    }

    async fn poll_confirmation(&self, tx_hash: TxHash) -> Result<Option<Confirmation>, SdkError> {
        let mut state = self.lock();
        let Some(&index) = state.steps.get(&tx_hash) else {
            return Err(SdkError::Network(format!("transaction {tx_hash} not found")));
        };
        state.calls.push(BackendCall::Poll(index));
        if self.reverted.contains(&index) {
            return Err(SdkError::Network(format!("transaction {tx_hash} reverted")));
        }
        let polls = state.polls.entry(tx_hash).or_default();
        *polls += 1;
        if *polls <= self.pending_polls {
            return Ok(None);
        }
        Ok(Some(Confirmation { tx_hash, block_number: Some(100 + index as u64), gas_used: 21_000 }))
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::Address;

    use super::*;

    #[tokio::test]
    async fn test_polls_counted_per_transaction() {
        let backend = MockBackend::new().with_pending_polls(1);
        let step =
            TxStep::transfer(Address::repeat_byte(1), Address::repeat_byte(2), U256::from(1));

        let mut hashes = Vec::new();
        for _ in 0..=256 {
            hashes.push(backend.submit(&step).await.unwrap());
        }
        assert_eq!(backend.poll_confirmation(hashes[0]).await.unwrap(), None);
        assert_eq!(backend.poll_confirmation(hashes[256]).await.unwrap(), None);

        let confirmation = backend.poll_confirmation(hashes[256]).await.unwrap().unwrap();
        assert_eq!(confirmation.block_number, Some(356));
        assert_eq!(backend.calls().last(), Some(&BackendCall::Poll(256)));
    }

    #[tokio::test]
    async fn test_unknown_transaction() {
        let backend = MockBackend::new();
        let err = backend.poll_confirmation(TxHash::repeat_byte(7)).await.unwrap_err();
        assert!(matches!(err, SdkError::Network(_)));
    }
}
