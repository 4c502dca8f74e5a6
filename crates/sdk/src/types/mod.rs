mod offer;
mod token;
mod tx;

use std::fmt::Display;

pub use offer::*;
pub use token::*;
pub use tx::*;

use crate::error::SdkError;

/// ID of the P2P exchange offer.
pub type OfferId = u64;

/// Load state of a value read from chain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LoadState<T> {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// The value depends on a wallet and none is connected.
    Disconnected,
    Loading,
    Ready(T),
    Failed(SdkError),
}

impl<T> LoadState<T> {
    pub fn is_ready(&self) -> bool { matches!(self, LoadState::Ready(_)) }

    pub fn ready(&self) -> Option<&T> {
        match self {
            LoadState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&SdkError> {
        match self {
            LoadState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LoadState<U> {
        match self {
            LoadState::Idle => LoadState::Idle,
            LoadState::Disconnected => LoadState::Disconnected,
            LoadState::Loading => LoadState::Loading,
            LoadState::Ready(value) => LoadState::Ready(f(value)),
            LoadState::Failed(err) => LoadState::Failed(err),
        }
    }
}

impl<T> From<Result<T, SdkError>> for LoadState<T> {
    fn from(result: Result<T, SdkError>) -> Self {
        match result {
            Ok(value) => LoadState::Ready(value),
            Err(err) => LoadState::Failed(err),
        }
    }
}

impl<T: Display> Display for LoadState<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadState::Idle => Ok(()),
            LoadState::Disconnected => write!(f, "disconnected"),
            LoadState::Loading => write!(f, "loading..."),
            LoadState::Ready(value) => value.fmt(f),
            LoadState::Failed(err) => write!(f, "error: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_state_from_result() {
        let ok: LoadState<u8> = Ok(8).into();
        assert_eq!(ok.ready(), Some(&8));
        assert_eq!(ok.map(|v| v * 2), LoadState::Ready(16));

        let failed: LoadState<u8> = Err(SdkError::Network("timeout".to_string())).into();
        assert!(!failed.is_ready());
        assert_eq!(failed.error(), Some(&SdkError::Network("timeout".to_string())));
        assert_eq!(failed.to_string(), "error: network error: timeout");

        assert_eq!(LoadState::<u8>::default(), LoadState::Idle);
        assert_eq!(LoadState::<u8>::Disconnected.to_string(), "disconnected");
    }
}
