//! # Card Deposit Flow
//!
//! Top up the card balance from savings or from a connected wallet.
//!
//! ```text
//! OPTIONS ─┬─ SAVINGS_FORM ─────────────────── TRANSACTION_STATUS
//!          └─ WALLET_NETWORKS ── WALLET_FORM ─┘
//! ```

use super::controller::{CloseDecision, FlowMachine, FlowSpec};
use super::deposit::{WalletConnection, WalletConnectionStatus};
use super::payload::TokenSelection;
use super::registry::{FlowRegistry, RegistryError};
use super::state::define_flow_states;
use super::store::{FieldRules, FlowPayload, FlowStore};
use serde::{Deserialize, Serialize};

define_flow_states! {
    /// Card deposit modal states.
    pub enum CardDepositModal {
        /// Modal hidden
        Close = ("CLOSE", 0),
        /// Choose savings or wallet
        OpenOptions = ("OPEN_OPTIONS", 1),
        /// Amount from savings
        OpenSavingsForm = ("OPEN_SAVINGS_FORM", 2),
        /// Source network of a wallet top-up
        OpenWalletNetworks = ("OPEN_WALLET_NETWORKS", 3),
        /// Token and amount from the connected wallet
        OpenWalletForm = ("OPEN_WALLET_FORM", 4),
        /// Submitted top-up progress
        OpenTransactionStatus = ("OPEN_TRANSACTION_STATUS", 5),
    }
    closed = Close;
}

/// Views rendered by the card deposit modal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CardDepositView {
    /// Source picker (default)
    CardDepositOptions,
    /// Savings amount form
    SavingsForm,
    /// Network picker
    WalletNetworks,
    /// Wallet amount form
    WalletForm,
    /// Top-up progress
    TransactionStatus,
}

/// Funding source of a card top-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardDepositSource {
    /// Savings balance
    Savings,
    /// External wallet
    Wallet,
}

/// Mutable card deposit session fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDepositPayload {
    /// Funding source
    pub source: Option<CardDepositSource>,
    /// Network of a wallet top-up
    pub source_network: Option<String>,
    /// Token of a wallet top-up
    pub selected_token: Option<TokenSelection>,
    /// Amount as typed
    pub amount: String,
    /// Hash of the submitted top-up
    pub transaction_hash: Option<String>,
}

/// Card deposit payload fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CardDepositField {
    /// `source`
    Source,
    /// `source_network`
    SourceNetwork,
    /// `selected_token`
    SelectedToken,
    /// `amount`
    Amount,
    /// `transaction_hash`
    TransactionHash,
}

impl FlowPayload for CardDepositPayload {
    type Field = CardDepositField;

    fn clear_field(&mut self, field: CardDepositField) {
        match field {
            CardDepositField::Source => self.source = None,
            CardDepositField::SourceNetwork => self.source_network = None,
            CardDepositField::SelectedToken => self.selected_token = None,
            CardDepositField::Amount => self.amount.clear(),
            CardDepositField::TransactionHash => self.transaction_hash = None,
        }
    }

    fn field_rules() -> FieldRules<CardDepositField> {
        use CardDepositField as F;
        FieldRules::new()
            .when_changed(F::Source, &[F::SourceNetwork, F::Amount])
            .when_changed(F::SourceNetwork, &[F::Amount, F::SelectedToken])
    }
}

/// Card deposit flow description.
#[derive(Debug)]
pub struct CardDepositFlow;

impl FlowSpec for CardDepositFlow {
    type State = CardDepositModal;
    type Payload = CardDepositPayload;
    type View = CardDepositView;
    type Context = WalletConnection;

    const NAME: &'static str = "card_deposit";

    fn entry_state() -> CardDepositModal {
        CardDepositModal::OpenOptions
    }

    fn registry() -> Result<FlowRegistry<CardDepositModal, CardDepositView>, RegistryError> {
        use CardDepositModal as M;
        use CardDepositView as V;

        FlowRegistry::builder(Self::NAME, V::CardDepositOptions)
            .state(M::OpenOptions, "Add funds", V::CardDepositOptions, M::Close)
            .state(M::OpenSavingsForm, "From savings", V::SavingsForm, M::OpenOptions)
            .state(M::OpenWalletNetworks, "Select network", V::WalletNetworks, M::OpenOptions)
            .state(M::OpenWalletForm, "From wallet", V::WalletForm, M::OpenWalletNetworks)
            .state(M::OpenTransactionStatus, "Top-up status", V::TransactionStatus, M::Close)
            .build()
    }

    fn close_decision(
        _store: &FlowStore<CardDepositModal, CardDepositPayload>,
        ctx: &WalletConnection,
    ) -> CloseDecision<CardDepositModal> {
        if ctx.status == WalletConnectionStatus::Connecting {
            return CloseDecision::Block {
                reason: "wallet connection in progress",
            };
        }
        CloseDecision::Close
    }
}

/// Card deposit flow driven against its store.
pub type CardDepositMachine = FlowMachine<CardDepositFlow>;

impl FlowMachine<CardDepositFlow> {
    /// Pick the funding source and continue.
    pub fn choose_source(&self, source: CardDepositSource) {
        self.store()
            .update(CardDepositField::Source, |p| p.source = Some(source));
        let next = match source {
            CardDepositSource::Savings => CardDepositModal::OpenSavingsForm,
            CardDepositSource::Wallet => CardDepositModal::OpenWalletNetworks,
        };
        self.navigate(next);
    }

    /// Pick the wallet network and continue to the wallet form.
    pub fn choose_network(&self, network: impl Into<String>) {
        let network = network.into();
        self.store()
            .update(CardDepositField::SourceNetwork, |p| p.source_network = Some(network));
        self.navigate(CardDepositModal::OpenWalletForm);
    }

    /// Set the selected token
    pub fn set_selected_token(&self, token: TokenSelection) {
        self.store()
            .update(CardDepositField::SelectedToken, |p| p.selected_token = Some(token));
    }

    /// Set the typed amount
    pub fn set_amount(&self, amount: impl Into<String>) {
        let amount = amount.into();
        self.store().update(CardDepositField::Amount, |p| p.amount = amount);
    }

    /// Record the submitted top-up and show its status.
    pub fn submitted(&self, transaction_hash: impl Into<String>) {
        let hash = transaction_hash.into();
        self.store()
            .update(CardDepositField::TransactionHash, |p| p.transaction_hash = Some(hash));
        self.navigate(CardDepositModal::OpenTransactionStatus);
    }
}
