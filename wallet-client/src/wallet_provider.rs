//! The wallet seam: authentication and signing of contract calls.
//!
//! Key custody stays with the wallet. The client only ever hands it an
//! unsigned [`ContractCallRequest`] and learns whether the user finished or
//! dismissed the prompt.

use naija_network::{ContractCallRequest, StacksAddress, StacksNetwork};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Shown by wallets on their authentication prompt
pub const APP_NAME: &str = "Naija Transfer";

/// An authenticated wallet session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub address: StacksAddress,
}

impl Session {
    pub fn network(&self) -> StacksNetwork {
        self.address.network()
    }
}

/// How a contract-call prompt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCallOutcome {
    /// Signed and broadcast
    Finished { tx_id: String },
    /// Dismissed by the user
    Cancelled,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("No wallet session")]
    NotConnected,

    #[error("Authentication rejected: {0}")]
    AuthRejected(String),

    #[error("Wallet cannot sign transactions: {0}")]
    SigningUnavailable(String),

    #[error("Wallet error: {0}")]
    Provider(String),
}

pub trait WalletProvider: Send + Sync + 'static {
    /// Run the authentication flow and return the resulting session
    fn open_auth(&self) -> impl Future<Output = Result<Session, WalletError>> + Send;

    /// Ask the wallet to sign and broadcast `request`
    fn contract_call(
        &self,
        request: ContractCallRequest,
    ) -> impl Future<Output = Result<ContractCallOutcome, WalletError>> + Send;

    fn is_connected(&self) -> bool;

    fn sign_out(&self);
}

/// A wallet that only knows an address.
///
/// Authentication succeeds immediately for the configured address so balance
/// and history can be followed; every contract call is refused.
#[derive(Debug)]
pub struct WatchOnlyWallet {
    address: Option<StacksAddress>,
    connected: AtomicBool,
}

impl WatchOnlyWallet {
    pub fn new(address: Option<StacksAddress>) -> Self {
        Self {
            address,
            connected: AtomicBool::new(false),
        }
    }
}

impl WalletProvider for WatchOnlyWallet {
    async fn open_auth(&self) -> Result<Session, WalletError> {
        let address = self.address.ok_or_else(|| {
            WalletError::AuthRejected("no stx_address configured to watch".to_string())
        })?;
        self.connected.store(true, Ordering::SeqCst);
        log::info!("👛 Watching {}", address);
        Ok(Session { address })
    }

    async fn contract_call(
        &self,
        request: ContractCallRequest,
    ) -> Result<ContractCallOutcome, WalletError> {
        if !self.is_connected() {
            return Err(WalletError::NotConnected);
        }
        Err(WalletError::SigningUnavailable(format!(
            "{} requires a signing wallet",
            request.function_name
        )))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn sign_out(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}
