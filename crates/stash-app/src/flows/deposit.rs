//! # Deposit Flow
//!
//! Deposit into savings from a connected wallet, by bank transfer, by direct
//! deposit to a session address, or by showing the public address.
//!
//! ```text
//! OPTIONS ─┬─ NETWORKS ── FORM ─────────────── TRANSACTION_STATUS
//!          ├─ BUY_CRYPTO_OPTIONS ── BANK_TRANSFER_AMOUNT ─┬─ BANK_TRANSFER_KYC
//!          │                                              └─ BANK_TRANSFER_PAYMENT
//!          ├─ DIRECT_DEPOSIT
//!          └─ PUBLIC_ADDRESS
//! ```
//!
//! The modal refuses to close while a wallet connection popup is in flight.

use super::controller::{CloseDecision, FlowMachine, FlowSpec};
use super::payload::{BankTransferInstructions, DirectDepositSession, KycHandoff, TokenSelection};
use super::registry::{FlowRegistry, RegistryError};
use super::state::define_flow_states;
use super::store::{FieldRules, FlowPayload, FlowStore};
use serde::{Deserialize, Serialize};

define_flow_states! {
    /// Deposit modal states.
    pub enum DepositModal {
        /// Modal hidden
        Close = ("CLOSE", 0),
        /// Choose a deposit method
        OpenOptions = ("OPEN_OPTIONS", 1),
        /// Pick the source network of a wallet deposit
        OpenNetworks = ("OPEN_NETWORKS", 2),
        /// Token and amount from the connected wallet
        OpenForm = ("OPEN_FORM", 3),
        /// Choose how to buy crypto
        OpenBuyCryptoOptions = ("OPEN_BUY_CRYPTO_OPTIONS", 4),
        /// Enter the bank transfer amount
        OpenBankTransferAmount = ("OPEN_BANK_TRANSFER_AMOUNT", 5),
        /// Identity verification hand-off for bank transfers
        OpenBankTransferKyc = ("OPEN_BANK_TRANSFER_KYC", 6),
        /// Wire instructions
        OpenBankTransferPayment = ("OPEN_BANK_TRANSFER_PAYMENT", 7),
        /// Direct deposit session address
        OpenDirectDeposit = ("OPEN_DIRECT_DEPOSIT", 8),
        /// Public receive address
        OpenPublicAddress = ("OPEN_PUBLIC_ADDRESS", 9),
        /// Submitted wallet deposit progress
        OpenTransactionStatus = ("OPEN_TRANSACTION_STATUS", 10),
    }
    closed = Close;
}

/// Views rendered by the deposit modal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DepositView {
    /// Method picker (default)
    DepositOptions,
    /// Network picker
    NetworkSelector,
    /// Wallet deposit form
    DepositForm,
    /// Buy-crypto method picker
    BuyCryptoOptions,
    /// Bank transfer amount entry
    BankTransferAmount,
    /// KYC redirect screen
    BankTransferKyc,
    /// Wire instructions
    BankTransferPayment,
    /// Direct deposit address and status
    DirectDeposit,
    /// Receive address and QR code
    PublicAddress,
    /// Transaction progress
    TransactionStatus,
}

/// State of the wallet connection popup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletConnectionStatus {
    /// No wallet connected
    #[default]
    Disconnected,
    /// Connection popup in flight
    Connecting,
    /// Wallet connected
    Connected,
    /// Re-establishing a dropped session
    Reconnecting,
}

/// External signals consulted when the deposit modal is asked to close.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalletConnection {
    /// Wallet popup status
    pub status: WalletConnectionStatus,
}

impl WalletConnection {
    /// Connection in the given status
    pub fn new(status: WalletConnectionStatus) -> Self {
        Self { status }
    }
}

/// Mutable deposit session fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositPayload {
    /// Source network of a wallet deposit
    pub source_network: Option<String>,
    /// Token to deposit
    pub selected_token: Option<TokenSelection>,
    /// Amount as typed
    pub amount: String,
    /// Wire instructions for the created transfer
    pub bank_transfer: Option<BankTransferInstructions>,
    /// Active direct deposit session
    pub direct_deposit: Option<DirectDepositSession>,
    /// KYC hand-off in progress
    pub kyc: KycHandoff,
    /// Hash of the submitted wallet deposit
    pub transaction_hash: Option<String>,
}

/// Deposit payload fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DepositField {
    /// `source_network`
    SourceNetwork,
    /// `selected_token`
    SelectedToken,
    /// `amount`
    Amount,
    /// `bank_transfer`
    BankTransfer,
    /// `direct_deposit`
    DirectDeposit,
    /// `kyc`
    Kyc,
    /// `transaction_hash`
    TransactionHash,
}

impl FlowPayload for DepositPayload {
    type Field = DepositField;

    fn clear_field(&mut self, field: DepositField) {
        match field {
            DepositField::SourceNetwork => self.source_network = None,
            DepositField::SelectedToken => self.selected_token = None,
            DepositField::Amount => self.amount.clear(),
            DepositField::BankTransfer => self.bank_transfer = None,
            DepositField::DirectDeposit => self.direct_deposit = None,
            DepositField::Kyc => self.kyc = KycHandoff::default(),
            DepositField::TransactionHash => self.transaction_hash = None,
        }
    }

    fn field_rules() -> FieldRules<DepositField> {
        FieldRules::new()
            .when_changed(DepositField::SourceNetwork, &[DepositField::SelectedToken])
            .when_changed(DepositField::SelectedToken, &[DepositField::Amount])
            // Wire instructions are issued for one amount.
            .when_changed(DepositField::Amount, &[DepositField::BankTransfer])
    }
}

/// Deposit flow description.
#[derive(Debug)]
pub struct DepositFlow;

impl FlowSpec for DepositFlow {
    type State = DepositModal;
    type Payload = DepositPayload;
    type View = DepositView;
    type Context = WalletConnection;

    const NAME: &'static str = "deposit";

    fn entry_state() -> DepositModal {
        DepositModal::OpenOptions
    }

    fn registry() -> Result<FlowRegistry<DepositModal, DepositView>, RegistryError> {
        use DepositModal as M;
        use DepositView as V;

        FlowRegistry::builder(Self::NAME, V::DepositOptions)
            .state(M::OpenOptions, "Deposit", V::DepositOptions, M::Close)
            .state(M::OpenNetworks, "Select network", V::NetworkSelector, M::OpenOptions)
            .state(M::OpenForm, "Deposit from wallet", V::DepositForm, M::OpenNetworks)
            .state(M::OpenBuyCryptoOptions, "Buy crypto", V::BuyCryptoOptions, M::OpenOptions)
            .state(
                M::OpenBankTransferAmount,
                "Bank transfer",
                V::BankTransferAmount,
                M::OpenBuyCryptoOptions,
            )
            .state(
                M::OpenBankTransferKyc,
                "Verify your identity",
                V::BankTransferKyc,
                M::OpenBankTransferAmount,
            )
            .state(
                M::OpenBankTransferPayment,
                "Transfer details",
                V::BankTransferPayment,
                M::OpenBankTransferAmount,
            )
            .state(M::OpenDirectDeposit, "Direct deposit", V::DirectDeposit, M::OpenOptions)
            .state(M::OpenPublicAddress, "Receive", V::PublicAddress, M::OpenOptions)
            .state(
                M::OpenTransactionStatus,
                "Deposit status",
                V::TransactionStatus,
                M::Close,
            )
            .build()
    }

    fn close_decision(
        _store: &FlowStore<DepositModal, DepositPayload>,
        ctx: &WalletConnection,
    ) -> CloseDecision<DepositModal> {
        if ctx.status == WalletConnectionStatus::Connecting {
            return CloseDecision::Block {
                reason: "wallet connection in progress",
            };
        }
        CloseDecision::Close
    }
}

/// Deposit flow driven against its store.
pub type DepositMachine = FlowMachine<DepositFlow>;

impl FlowMachine<DepositFlow> {
    /// Pick the source network and continue to the wallet form.
    pub fn choose_network(&self, network: impl Into<String>) {
        let network = network.into();
        self.store()
            .update(DepositField::SourceNetwork, |p| p.source_network = Some(network));
        self.navigate(DepositModal::OpenForm);
    }

    /// Set the typed amount
    pub fn set_amount(&self, amount: impl Into<String>) {
        let amount = amount.into();
        self.store().update(DepositField::Amount, |p| p.amount = amount);
    }

    /// Set the selected token
    pub fn set_selected_token(&self, token: TokenSelection) {
        self.store()
            .update(DepositField::SelectedToken, |p| p.selected_token = Some(token));
    }

    /// Record a submitted wallet deposit and show its status.
    pub fn submitted(&self, transaction_hash: impl Into<String>) {
        let hash = transaction_hash.into();
        self.store()
            .update(DepositField::TransactionHash, |p| p.transaction_hash = Some(hash));
        self.navigate(DepositModal::OpenTransactionStatus);
    }
}
