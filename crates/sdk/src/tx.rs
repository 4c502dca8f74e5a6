//! Sequencing of dependent on-chain transactions.
//!
//! A typical sequence is an ERC-20 `approve` followed by the exchange call
//! spending the allowance. Each step is submitted only after the previous
//! one is observed mined, so a spend never races an unconfirmed approval.
//!
//! Steps already confirmed when a later step fails stay on chain, they are
//! reported in [`SequenceError::confirmed`].

use std::time::Duration;

use alloy::{
    network::{ReceiptResponse, TransactionBuilder},
    primitives::{Address, Bytes, TxHash, U256},
    providers::Provider,
    rpc::types::TransactionRequest,
};
use alloy_sol_types::SolCall;
use thiserror::Error;

use crate::{
    abi::{erc20::IERC20, p2p::P2PExchange},
    error::SdkError,
    types::{OfferId, PendingTx, TxStatus},
};

/// Single state-changing contract call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxStep {
    label: String,
    to: Address,
    input: Bytes,
}

impl TxStep {
    pub fn new<C: SolCall>(label: impl Into<String>, to: Address, call: &C) -> Self {
        Self { label: label.into(), to, input: call.abi_encode().into() }
    }

    /// ERC-20 `approve(spender, amount)` on `token`.
    pub fn approve(token: Address, spender: Address, amount: U256) -> Self {
        Self::new("approve", token, &IERC20::approveCall { spender, amount })
    }

    /// ERC-20 `transfer(to, amount)` on `token`.
    pub fn transfer(token: Address, to: Address, amount: U256) -> Self {
        Self::new("transfer", token, &IERC20::transferCall { to, amount })
    }

    pub fn create_offer(
        exchange: Address,
        sell_token: Address,
        sell_amount: U256,
        buy_token: Address,
        buy_amount: U256,
    ) -> Self {
        Self::new(
            "create offer",
            exchange,
            &P2PExchange::createOfferCall {
                tokenSell: sell_token,
                amountSell: sell_amount,
                tokenBuy: buy_token,
                amountBuy: buy_amount,
            },
        )
    }

    pub fn fill_offer(exchange: Address, offer_id: OfferId) -> Self {
        Self::new(
            format!("fill offer #{offer_id}"),
            exchange,
            &P2PExchange::fillOfferCall { offerId: U256::from(offer_id) },
        )
    }

    pub fn cancel_offer(exchange: Address, offer_id: OfferId) -> Self {
        Self::new(
            format!("cancel offer #{offer_id}"),
            exchange,
            &P2PExchange::cancelOfferCall { offerId: U256::from(offer_id) },
        )
    }

    pub fn label(&self) -> &str { &self.label }

    /// Target contract.
    pub fn to(&self) -> Address { self.to }

    /// ABI-encoded call.
    pub fn input(&self) -> &Bytes { &self.input }
}

/// Receipt summary of a confirmed step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// How long to wait for a transaction to be mined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub poll_interval: Duration,
    /// Number of receipt polls before the step is reported failed.
    pub max_polls: u32,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self { Self { poll_interval: Duration::from_secs(1), max_polls: 300 } }
}

/// Backend submitting transactions and observing their confirmation.
pub trait TxBackend {
    /// Signs and submits the step, returning its hash once the node
    /// accepted it.
    fn submit(&self, step: &TxStep) -> impl Future<Output = Result<TxHash, SdkError>>;

    /// Returns the receipt summary if the transaction is mined, `None`
    /// otherwise. A mined transaction that reverted is an error.
    fn poll_confirmation(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<Option<Confirmation>, SdkError>>;
}

/// [`TxBackend`] over a provider with a wallet attached, see
/// [`crate::wallet::WalletSession::signer_provider`].
#[derive(Clone, Debug)]
pub struct ProviderBackend<P> {
    provider: P,
    from: Address,
}

impl<P: Provider> ProviderBackend<P> {
    pub fn new(provider: P, from: Address) -> Self { Self { provider, from } }
}

impl<P: Provider> TxBackend for ProviderBackend<P> {
    async fn submit(&self, step: &TxStep) -> Result<TxHash, SdkError> {
        let tx = TransactionRequest::default()
            .with_from(self.from)
            .with_to(step.to)
            .with_input(step.input.clone());
        let pending = self.provider.send_transaction(tx).await?;
        Ok(*pending.tx_hash())
    }

    async fn poll_confirmation(&self, tx_hash: TxHash) -> Result<Option<Confirmation>, SdkError> {
        let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? else {
            return Ok(None);
        };
        if !receipt.status() {
            return Err(SdkError::Network(format!("transaction {tx_hash} reverted")));
        }
        Ok(Some(Confirmation {
            tx_hash,
            block_number: receipt.block_number(),
            gas_used: receipt.gas_used(),
        }))
    }
}

/// Failure of a [`TxSequence`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("step {} ({label}) failed: {source}", .step + 1)]
pub struct SequenceError {
    /// Index of the failed step.
    pub step: usize,
    pub label: String,
    /// Hash of the failed step if it got submitted.
    pub tx_hash: Option<TxHash>,
    /// Steps confirmed before the failure. They are not rolled back.
    pub confirmed: Vec<Confirmation>,
    pub source: SdkError,
}

/// Ordered list of dependent steps.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxSequence {
    steps: Vec<TxStep>,
    policy: ConfirmationPolicy,
}

impl TxSequence {
    pub fn new(steps: Vec<TxStep>) -> Self { Self { steps, policy: ConfirmationPolicy::default() } }

    pub fn with_policy(mut self, policy: ConfirmationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn steps(&self) -> &[TxStep] { &self.steps }

    pub fn is_empty(&self) -> bool { self.steps.is_empty() }

    /// Runs the steps in order.
    ///
    /// Step `k + 1` is submitted only after step `k` is observed mined.
    /// The first failure aborts the remaining steps. `on_progress` receives
    /// every status change of the submitted transactions, `sleep` is used
    /// between receipt polls.
    pub async fn run<B, S, SFut>(
        &self,
        backend: &B,
        sleep: S,
        mut on_progress: impl FnMut(&PendingTx),
    ) -> Result<Vec<Confirmation>, SequenceError>
    where
        B: TxBackend,
        S: Fn(Duration) -> SFut + Copy,
        SFut: Future<Output = ()>,
    {
        let mut confirmed = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let fail = |tx_hash: Option<TxHash>, confirmed: &mut Vec<Confirmation>, source| {
                SequenceError {
                    step: index,
                    label: step.label.clone(),
                    tx_hash,
                    confirmed: std::mem::take(confirmed),
                    source,
                }
            };

            let tx_hash = match backend.submit(step).await {
                Ok(tx_hash) => tx_hash,
                Err(err) => {
                    tracing::warn!(step = index, label = %step.label, %err, "submission failed");
                    return Err(fail(None, &mut confirmed, err));
                },
            };
            tracing::info!(step = index, label = %step.label, %tx_hash, "transaction submitted");

            let mut pending = PendingTx::submitted(index, step.label.clone(), tx_hash);
            on_progress(&pending);
            pending.set_status(TxStatus::Confirming);
            on_progress(&pending);

            match self.wait_confirmation(backend, tx_hash, sleep).await {
                Ok(confirmation) => {
                    tracing::info!(
                        step = index,
                        %tx_hash,
                        block = ?confirmation.block_number,
                        "transaction confirmed"
                    );
                    pending.set_status(TxStatus::Confirmed {
                        block_number: confirmation.block_number,
                    });
                    on_progress(&pending);
                    confirmed.push(confirmation);
                },
                Err(err) => {
                    tracing::warn!(step = index, %tx_hash, %err, "transaction failed");
                    pending.set_status(TxStatus::Failed(err.clone()));
                    on_progress(&pending);
                    return Err(fail(Some(tx_hash), &mut confirmed, err));
                },
            }
        }

        Ok(confirmed)
    }

    async fn wait_confirmation<B, S, SFut>(
        &self,
        backend: &B,
        tx_hash: TxHash,
        sleep: S,
    ) -> Result<Confirmation, SdkError>
    where
        B: TxBackend,
        S: Fn(Duration) -> SFut + Copy,
        SFut: Future<Output = ()>,
    {
        // Polled at least once
        let polls = self.policy.max_polls.max(1);
        for poll in 1..=polls {
            if let Some(confirmation) = backend.poll_confirmation(tx_hash).await? {
                return Ok(confirmation);
            }
            if poll < polls {
                sleep(self.policy.poll_interval).await;
            }
        }
        Err(SdkError::Network(format!("transaction {tx_hash} not confirmed after {polls} polls")))
    }
}
