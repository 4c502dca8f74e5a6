//! Wallet session: connected account, its chain and transaction signing.

use std::str::FromStr;

use alloy::{
    network::EthereumWallet,
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};

use crate::{Chain, error::SdkError, read};

/// Wallet session.
///
/// Starts disconnected. Reads that depend on the account report
/// [`crate::types::LoadState::Disconnected`] and writes fail with
/// [`SdkError::WalletNotConnected`] until [`WalletSession::connect`] is
/// called.
#[derive(Clone, Debug, Default)]
pub struct WalletSession {
    connected: Option<Connected>,
}

#[derive(Clone, Debug)]
struct Connected {
    signer: PrivateKeySigner,
    chain_id: u64,
}

impl WalletSession {
    pub fn disconnected() -> Self { Self::default() }

    /// Connects the signer on the given chain, replacing any previous
    /// connection.
    pub fn connect(&mut self, signer: PrivateKeySigner, chain_id: u64) -> Address {
        let address = signer.address();
        tracing::info!(%address, chain_id, "wallet connected");
        self.connected = Some(Connected { signer, chain_id });
        address
    }

    /// Connects a signer from a hex-encoded private key.
    pub fn connect_private_key(
        &mut self,
        private_key: &str,
        chain_id: u64,
    ) -> Result<Address, SdkError> {
        let signer = PrivateKeySigner::from_str(private_key.trim())
            .map_err(|err| SdkError::validation(format!("invalid private key: {err}")))?;
        Ok(self.connect(signer, chain_id))
    }

    pub fn disconnect(&mut self) {
        if let Some(connected) = self.connected.take() {
            tracing::info!(address = %connected.signer.address(), "wallet disconnected");
        }
    }

    pub fn is_connected(&self) -> bool { self.connected.is_some() }

    /// Address of the connected account.
    pub fn address(&self) -> Option<Address> { self.connected.as_ref().map(|c| c.signer.address()) }

    /// Chain the wallet is currently connected to.
    pub fn chain_id(&self) -> Option<u64> { self.connected.as_ref().map(|c| c.chain_id) }

    /// Address of the connected account or [`SdkError::WalletNotConnected`].
    pub fn require_address(&self) -> Result<Address, SdkError> {
        self.address().ok_or(SdkError::WalletNotConnected)
    }

    /// Switches the connected wallet to another chain.
    pub fn switch_chain(&mut self, chain_id: u64) -> Result<(), SdkError> {
        let connected = self.connected.as_mut().ok_or(SdkError::WalletNotConnected)?;
        if connected.chain_id != chain_id {
            tracing::info!(from = connected.chain_id, to = chain_id, "wallet switched chain");
            connected.chain_id = chain_id;
        }
        Ok(())
    }

    /// Provider signing transactions with the connected account on the given
    /// chain.
    ///
    /// The wallet has to be connected to the same chain, see
    /// [`Self::switch_chain`].
    pub async fn signer_provider(&self, chain: &Chain) -> Result<DynProvider, SdkError> {
        let connected = self.connected.as_ref().ok_or(SdkError::WalletNotConnected)?;
        if connected.chain_id != chain.chain_id() {
            return Err(SdkError::validation(format!(
                "wallet is connected to chain {}, switch to {} ({}) first",
                connected.chain_id,
                chain.chain_id(),
                chain.name()
            )));
        }
        let client = read::connect_client(chain, None).await?;
        Ok(ProviderBuilder::new()
            .wallet(EthereumWallet::from(connected.signer.clone()))
            .connect_client(client)
            .erased())
    }
}
