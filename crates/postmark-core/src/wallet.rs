//! Wallet capability.
//!
//! Uploads need an owner address and, for signed uploads, a signer. Real key
//! management lives in an external wallet; this module only defines the
//! interface plus a watch-only wallet backed by a configured address.

use crate::storage::BoxFuture;
use thiserror::Error;

/// Length of a storage-network address (base64url of a 32-byte hash).
pub const ADDRESS_LEN: usize = 43;

/// Wallet errors.
#[derive(Debug, Error, PartialEq)]
pub enum WalletError {
    #[error("Wallet not connected")]
    NotConnected,
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Connection rejected: {0}")]
    Rejected(String),
    #[error("Signing failed: {0}")]
    Signing(String),
}

pub type WalletResult<T> = Result<T, WalletError>;

/// Whether `address` has the shape of a storage-network address.
pub fn is_valid_address(address: &str) -> bool {
    address.len() == ADDRESS_LEN
        && address
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Produces signatures for upload payloads.
pub trait Signer: Send + Sync {
    fn address(&self) -> &str;

    fn sign<'a>(&'a self, message: &'a [u8]) -> BoxFuture<'a, WalletResult<Vec<u8>>>;
}

/// A user wallet.
pub trait Wallet: Send + Sync {
    /// Connect and return the active address.
    fn connect(&mut self) -> BoxFuture<'_, WalletResult<String>>;

    fn disconnect(&mut self);

    /// Address of the connected account.
    fn active_address(&self) -> Option<&str>;

    /// Signer for the connected account, when the wallet can sign.
    fn signer(&self) -> Option<&dyn Signer>;

    fn is_connected(&self) -> bool {
        self.active_address().is_some()
    }

    /// The active address or [`WalletError::NotConnected`].
    fn require_address(&self) -> WalletResult<&str> {
        self.active_address().ok_or(WalletError::NotConnected)
    }
}

/// Watch-only wallet for a known address. It can own uploads but cannot sign.
#[derive(Debug, Clone)]
pub struct AddressWallet {
    address: String,
    connected: bool,
}

impl AddressWallet {
    pub fn new(address: impl Into<String>) -> WalletResult<Self> {
        let address = address.into();
        if !is_valid_address(&address) {
            return Err(WalletError::InvalidAddress(address));
        }
        Ok(Self {
            address,
            connected: false,
        })
    }

    /// Construct and mark connected in one step.
    pub fn connected(address: impl Into<String>) -> WalletResult<Self> {
        let mut wallet = Self::new(address)?;
        wallet.connected = true;
        Ok(wallet)
    }
}

impl Wallet for AddressWallet {
    fn connect(&mut self) -> BoxFuture<'_, WalletResult<String>> {
        self.connected = true;
        log::info!("Wallet connected: {}", self.address);
        let address = self.address.clone();
        Box::pin(async move { Ok(address) })
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn active_address(&self) -> Option<&str> {
        self.connected.then_some(self.address.as_str())
    }

    fn signer(&self) -> Option<&dyn Signer> {
        None
    }
}
