//! Test doubles for the chain-facing parts of the SDK.
//!
//! [`MockBackend`] records submissions and confirmation polls of
//! [`crate::tx::TxSequence`] runs, [`mocked_read_client`] serves
//! [`crate::read::ReadClient`] calls from queued responses.

mod backend;
mod read;

pub use backend::{BackendCall, MockBackend};
pub use read::{encode_decimals, encode_return, mocked_read_client};
