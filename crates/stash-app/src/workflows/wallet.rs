//! Wallet connection for wallet deposits.
//!
//! The launcher owns the connection status the deposit and card-deposit
//! close policies consult, so a modal cannot be dismissed while the wallet
//! popup is in flight.

use super::backend::BackendError;
use super::busy::BusyFlag;
use super::{properties, WorkflowEnv};
use crate::errors::AppError;
use crate::flows::{
    DepositMachine, DepositModal, Navigation, WalletConnection, WalletConnectionStatus,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

/// Wallet SDK connection popup
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Connect and return the wallet address
    async fn connect(&self) -> Result<String, BackendError>;
}

/// Connects the wallet before the network picker
pub struct WalletLauncher {
    deposit: DepositMachine,
    connector: Arc<dyn WalletConnector>,
    env: WorkflowEnv,
    connection: Arc<RwLock<WalletConnection>>,
    busy: BusyFlag,
}

impl std::fmt::Debug for WalletLauncher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletLauncher")
            .field("connection", &*self.connection.read())
            .finish_non_exhaustive()
    }
}

impl WalletLauncher {
    /// Launcher driving `deposit`
    pub fn new(
        deposit: DepositMachine,
        connector: Arc<dyn WalletConnector>,
        env: WorkflowEnv,
    ) -> Self {
        Self {
            deposit,
            connector,
            env,
            connection: Arc::new(RwLock::new(WalletConnection::default())),
            busy: BusyFlag::new(),
        }
    }

    /// Current connection snapshot, the close-policy context
    pub fn connection(&self) -> WalletConnection {
        *self.connection.read()
    }

    /// Status changes reported by the wallet SDK
    pub fn set_status(&self, status: WalletConnectionStatus) {
        let mut connection = self.connection.write();
        if connection.status != status {
            tracing::debug!(from = ?connection.status, to = ?status, "wallet status");
            connection.status = status;
        }
    }

    /// Connect if needed, then show the network picker.
    #[tracing::instrument(skip(self))]
    pub async fn connect_and_continue(&self) -> bool {
        let Some(_guard) = self.busy.try_acquire() else {
            return false;
        };
        if self.connection().status == WalletConnectionStatus::Connected {
            self.deposit.navigate(DepositModal::OpenNetworks);
            return true;
        }

        let origin = self.deposit.current();
        self.set_status(WalletConnectionStatus::Connecting);
        match self.connector.connect().await {
            Ok(address) => {
                self.set_status(WalletConnectionStatus::Connected);
                if self
                    .deposit
                    .navigate_from(origin, DepositModal::OpenNetworks)
                    .is_none()
                {
                    tracing::debug!("deposit modal moved on during wallet connect");
                }
                self.env
                    .analytics
                    .track("wallet_connected", properties([("address", address)]))
                    .await;
                true
            }
            Err(err) => {
                self.set_status(WalletConnectionStatus::Disconnected);
                self.env
                    .report_failure("wallet_connect", "Wallet connection failed", &AppError::from(err))
                    .await;
                false
            }
        }
    }

    /// Ask the deposit modal to close under the current connection status.
    pub fn request_close(&self) -> Navigation<DepositModal> {
        self.deposit.handle_open_change(false, &self.connection())
    }
}
