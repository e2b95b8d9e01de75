// wallet/holder.rs
// Wallet state shared by everything that needs the user's identity.
// Pass an `Arc<WalletHolder>` explicitly; there is no global instance.

use copytrade_common::WalletState;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

use super::signer::LocalSigner;
use super::WalletError;

/// Address assigned by the simulated connect
pub const PLACEHOLDER_ADDRESS: &str = "0x742d35cc6634c0532925a3b844bc454e4438f44e";
/// Balance assigned by the simulated connect
pub const PLACEHOLDER_BALANCE: Decimal = dec!(1000.00);

/// What connection-aware views need to know about the wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConnection {
    pub is_connected: bool,
    pub address: Option<String>,
}

#[derive(Debug, Default)]
pub struct WalletHolder {
    state: RwLock<WalletState>,
    signer: RwLock<Option<Arc<LocalSigner>>>,
}

impl WalletHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated connect: always succeeds with the placeholder identity
    pub fn connect(&self) -> WalletState {
        let state = WalletState {
            is_connected: true,
            address: Some(PLACEHOLDER_ADDRESS.to_string()),
            balance: Some(PLACEHOLDER_BALANCE),
        };
        *self.write_signer() = None;
        *self.write_state() = state.clone();
        info!(address = PLACEHOLDER_ADDRESS, "wallet connected (simulated)");
        state
    }

    /// Connect with a real key. The balance stays unknown until
    /// `set_balance` is called.
    pub fn connect_with_signer(&self, signer: LocalSigner) -> WalletState {
        let state = WalletState {
            is_connected: true,
            address: Some(signer.address.clone()),
            balance: None,
        };
        info!(address = %signer.address, "wallet connected");
        *self.write_signer() = Some(Arc::new(signer));
        *self.write_state() = state.clone();
        state
    }

    /// Clears address, balance and connection flag
    pub fn disconnect(&self) {
        *self.write_signer() = None;
        *self.write_state() = WalletState::default();
        info!("wallet disconnected");
    }

    pub fn set_balance(&self, balance: Decimal) -> Result<(), WalletError> {
        let mut state = self.write_state();
        if !state.is_connected {
            return Err(WalletError::NotConnected);
        }
        state.balance = Some(balance);
        Ok(())
    }

    pub fn state(&self) -> WalletState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn connection(&self) -> WalletConnection {
        let state = self.state();
        WalletConnection {
            is_connected: state.is_connected,
            address: state.address,
        }
    }

    pub fn signer(&self) -> Option<Arc<LocalSigner>> {
        self.signer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, WalletState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_signer(&self) -> std::sync::RwLockWriteGuard<'_, Option<Arc<LocalSigner>>> {
        self.signer.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fails fast when no holder was provided instead of handing out an empty one
pub fn require_wallet(holder: Option<&WalletHolder>) -> Result<&WalletHolder, WalletError> {
    holder.ok_or(WalletError::MissingProvider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_assigns_placeholder() {
        let wallet = WalletHolder::new();
        let state = wallet.connect();
        assert!(state.is_connected);
        assert_eq!(state.address.as_deref(), Some(PLACEHOLDER_ADDRESS));
        assert_eq!(state.balance, Some(PLACEHOLDER_BALANCE));
        assert_eq!(wallet.state(), state);
    }

    #[test]
    fn test_connect_then_disconnect_restores_initial_state() {
        let wallet = WalletHolder::new();
        let initial = wallet.state();
        wallet.connect();
        wallet.disconnect();
        assert_eq!(wallet.state(), initial);
        assert_eq!(wallet.state(), WalletState::default());
        assert!(wallet.signer().is_none());
    }

    #[test]
    fn test_connection_view() {
        let wallet = WalletHolder::new();
        assert_eq!(
            wallet.connection(),
            WalletConnection {
                is_connected: false,
                address: None
            }
        );
        wallet.connect();
        assert!(wallet.connection().is_connected);
    }

    #[test]
    fn test_real_signer_connect() {
        let wallet = WalletHolder::new();
        let signer = LocalSigner::from_private_key(
            "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        )
        .unwrap();
        let state = wallet.connect_with_signer(signer);
        assert_eq!(
            state.address.as_deref(),
            Some("0x2c7536e3605d9c16a7a3d7b1898e529396a65c23")
        );
        assert_eq!(state.balance, None);
        assert!(wallet.signer().is_some());

        wallet.set_balance(dec!(2.5)).unwrap();
        assert_eq!(wallet.state().balance, Some(dec!(2.5)));
    }

    #[test]
    fn test_balance_requires_connection() {
        let wallet = WalletHolder::new();
        assert!(matches!(
            wallet.set_balance(dec!(1)),
            Err(WalletError::NotConnected)
        ));
    }

    #[test]
    fn test_accessor_outside_provider_fails() {
        assert!(matches!(
            require_wallet(None),
            Err(WalletError::MissingProvider)
        ));
        let wallet = WalletHolder::new();
        assert!(require_wallet(Some(&wallet)).is_ok());
    }
}
