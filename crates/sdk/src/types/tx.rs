use std::fmt::Display;

use alloy::primitives::TxHash;
use chrono::{DateTime, Utc};

use crate::error::SdkError;

/// Status of a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxStatus {
    /// Accepted by the node, hash known.
    Submitted,
    /// Waiting for the transaction to be mined.
    Confirming,
    /// Mined successfully in the given block.
    Confirmed { block_number: Option<u64> },
    /// Reverted or could not be confirmed.
    Failed(SdkError),
}

impl Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxStatus::Submitted => write!(f, "submitted"),
            TxStatus::Confirming => write!(f, "confirming"),
            TxStatus::Confirmed { block_number: Some(block) } => write!(f, "confirmed in #{block}"),
            TxStatus::Confirmed { block_number: None } => write!(f, "confirmed"),
            TxStatus::Failed(err) => write!(f, "failed: {err}"),
        }
    }
}

/// Transaction submitted as a step of [`crate::tx::TxSequence`].
///
/// Ephemeral: only lives until the caller acknowledges the outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTx {
    step: usize,
    label: String,
    hash: TxHash,
    submitted_at: DateTime<Utc>,
    status: TxStatus,
}

impl PendingTx {
    pub(crate) fn submitted(step: usize, label: impl Into<String>, hash: TxHash) -> Self {
        Self {
            step,
            label: label.into(),
            hash,
            submitted_at: Utc::now(),
            status: TxStatus::Submitted,
        }
    }

    /// Index of the step in the sequence.
    pub fn step(&self) -> usize { self.step }

    pub fn label(&self) -> &str { &self.label }

    pub fn hash(&self) -> TxHash { self.hash }

    pub fn submitted_at(&self) -> DateTime<Utc> { self.submitted_at }

    pub fn status(&self) -> &TxStatus { &self.status }

    pub(crate) fn set_status(&mut self, status: TxStatus) { self.status = status; }
}

impl Display for PendingTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} {} ({}) at {}",
            self.step + 1,
            self.label,
            self.status,
            self.hash,
            self.submitted_at.format("%H:%M:%S")
        )
    }
}
