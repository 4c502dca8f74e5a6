use alloy::{
    providers::PendingTransactionError,
    transports::{RpcError, TransportErrorKind},
};
use thiserror::Error;

/// EIP-1193 "User Rejected Request" error code.
const USER_REJECTED_CODE: i64 = 4001;

/// Errors surfaced by SDK operations.
///
/// None of them is fatal: the caller reports the error and the user
/// re-triggers the action. Nothing is retried automatically above the
/// transport layer.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SdkError {
    #[error("wallet is not connected")]
    WalletNotConnected,

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to decode contract response: {0}")]
    Decode(String),

    #[error("request rejected by the wallet: {0}")]
    UserRejected(String),

    #[error("unsupported chain ID: {0}")]
    UnsupportedChain(u64),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl SdkError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }
}

impl From<RpcError<TransportErrorKind>> for SdkError {
    fn from(err: RpcError<TransportErrorKind>) -> Self {
        if let Some(payload) = err.as_error_resp()
            && payload.code == USER_REJECTED_CODE
        {
            return SdkError::UserRejected(payload.message.to_string());
        }
        match err {
            RpcError::DeserError { .. } | RpcError::NullResp => SdkError::Decode(err.to_string()),
            _ => SdkError::Network(err.to_string()),
        }
    }
}

impl From<alloy::contract::Error> for SdkError {
    fn from(err: alloy::contract::Error) -> Self {
        match err {
            alloy::contract::Error::TransportError(err) => err.into(),
            alloy::contract::Error::PendingTransactionError(err) => err.into(),
            alloy::contract::Error::ZeroData(..) | alloy::contract::Error::AbiError(_) => {
                SdkError::Decode(err.to_string())
            },
            other => SdkError::Network(other.to_string()),
        }
    }
}

impl From<PendingTransactionError> for SdkError {
    fn from(err: PendingTransactionError) -> Self {
        match err {
            PendingTransactionError::TransportError(err) => err.into(),
            other => SdkError::Network(other.to_string()),
        }
    }
}

impl From<alloy_sol_types::Error> for SdkError {
    fn from(err: alloy_sol_types::Error) -> Self { SdkError::Decode(err.to_string()) }
}

#[cfg(test)]
mod tests {
    use alloy::rpc::json_rpc::ErrorPayload;

    use super::*;

    #[test]
    fn test_user_rejection_is_recognized() {
        let err: RpcError<TransportErrorKind> = RpcError::ErrorResp(ErrorPayload {
            code: 4001,
            message: "User denied transaction signature".into(),
            data: None,
        });
        assert_eq!(
            SdkError::from(err),
            SdkError::UserRejected("User denied transaction signature".to_string())
        );
    }

    #[test]
    fn test_revert_is_network_error() {
        let err: RpcError<TransportErrorKind> = RpcError::ErrorResp(ErrorPayload {
            code: 3,
            message: "execution reverted".into(),
            data: None,
        });
        assert!(matches!(SdkError::from(err), SdkError::Network(_)));
    }
}
