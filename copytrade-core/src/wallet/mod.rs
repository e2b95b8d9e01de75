// wallet/mod.rs

pub mod holder;
pub mod signer;

pub use holder::{require_wallet, WalletConnection, WalletHolder, PLACEHOLDER_ADDRESS, PLACEHOLDER_BALANCE};
pub use signer::LocalSigner;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Wallet accessed outside of a wallet provider")]
    MissingProvider,

    #[error("Wallet is not connected")]
    NotConnected,

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}
