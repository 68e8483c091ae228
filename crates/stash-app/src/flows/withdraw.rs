//! # Withdraw Flow
//!
//! Withdraw savings to an external wallet or to a bank account.
//!
//! ```text
//! OPTIONS ── FORM ─┬─ BANK_ACCOUNT ── REVIEW ── TRANSACTION_STATUS
//!                  └─ REVIEW
//! ```

use super::controller::{CloseDecision, FlowMachine, FlowSpec};
use super::payload::TokenSelection;
use super::registry::{FlowRegistry, RegistryError};
use super::state::define_flow_states;
use super::store::{FieldRules, FlowPayload, FlowStore};
use serde::{Deserialize, Serialize};

define_flow_states! {
    /// Withdraw modal states.
    pub enum WithdrawModal {
        /// Modal hidden
        Close = ("CLOSE", 0),
        /// Choose wallet or bank
        OpenOptions = ("OPEN_OPTIONS", 1),
        /// Token, amount and destination address
        OpenForm = ("OPEN_FORM", 2),
        /// Bank account picker
        OpenBankAccount = ("OPEN_BANK_ACCOUNT", 3),
        /// Final review
        OpenReview = ("OPEN_REVIEW", 4),
        /// Submitted withdrawal progress
        OpenTransactionStatus = ("OPEN_TRANSACTION_STATUS", 5),
    }
    closed = Close;
}

/// Views rendered by the withdraw modal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum WithdrawView {
    /// Rail picker (default)
    WithdrawOptions,
    /// Amount form
    WithdrawForm,
    /// Bank account picker
    BankAccount,
    /// Review screen
    WithdrawReview,
    /// Withdrawal progress
    TransactionStatus,
}

/// Where withdrawn funds go.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawRail {
    /// External wallet address
    Wallet,
    /// Linked bank account
    Bank,
}

/// Mutable withdraw session fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawPayload {
    /// Destination rail
    pub rail: Option<WithdrawRail>,
    /// Token to withdraw
    pub selected_token: Option<TokenSelection>,
    /// Amount as typed
    pub amount: String,
    /// Destination wallet address
    pub address: String,
    /// Linked bank account id
    pub bank_account: Option<String>,
    /// Hash or transfer id of the submitted withdrawal
    pub transaction_hash: Option<String>,
}

/// Withdraw payload fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WithdrawField {
    /// `rail`
    Rail,
    /// `selected_token`
    SelectedToken,
    /// `amount`
    Amount,
    /// `address`
    Address,
    /// `bank_account`
    BankAccount,
    /// `transaction_hash`
    TransactionHash,
}

impl FlowPayload for WithdrawPayload {
    type Field = WithdrawField;

    fn clear_field(&mut self, field: WithdrawField) {
        match field {
            WithdrawField::Rail => self.rail = None,
            WithdrawField::SelectedToken => self.selected_token = None,
            WithdrawField::Amount => self.amount.clear(),
            WithdrawField::Address => self.address.clear(),
            WithdrawField::BankAccount => self.bank_account = None,
            WithdrawField::TransactionHash => self.transaction_hash = None,
        }
    }

    fn field_rules() -> FieldRules<WithdrawField> {
        FieldRules::new()
            .when_changed(
                WithdrawField::Rail,
                &[WithdrawField::BankAccount, WithdrawField::Address],
            )
            .when_changed(WithdrawField::SelectedToken, &[WithdrawField::Amount])
    }
}

/// Withdraw flow description.
#[derive(Debug)]
pub struct WithdrawFlow;

impl FlowSpec for WithdrawFlow {
    type State = WithdrawModal;
    type Payload = WithdrawPayload;
    type View = WithdrawView;
    type Context = ();

    const NAME: &'static str = "withdraw";

    fn entry_state() -> WithdrawModal {
        WithdrawModal::OpenOptions
    }

    fn registry() -> Result<FlowRegistry<WithdrawModal, WithdrawView>, RegistryError> {
        use WithdrawModal as M;
        use WithdrawView as V;

        FlowRegistry::builder(Self::NAME, V::WithdrawOptions)
            .state(M::OpenOptions, "Withdraw", V::WithdrawOptions, M::Close)
            .state(M::OpenForm, "Withdraw", V::WithdrawForm, M::OpenOptions)
            .state(M::OpenBankAccount, "Bank account", V::BankAccount, M::OpenForm)
            .state(M::OpenReview, "Review", V::WithdrawReview, M::OpenForm)
            .state(
                M::OpenTransactionStatus,
                "Withdrawal status",
                V::TransactionStatus,
                M::Close,
            )
            .build()
    }

    fn close_decision(
        _store: &FlowStore<WithdrawModal, WithdrawPayload>,
        _ctx: &(),
    ) -> CloseDecision<WithdrawModal> {
        CloseDecision::Close
    }
}

/// Withdraw flow driven against its store.
pub type WithdrawMachine = FlowMachine<WithdrawFlow>;

impl FlowMachine<WithdrawFlow> {
    /// Pick the destination rail and continue to the form.
    pub fn choose_rail(&self, rail: WithdrawRail) {
        self.store().update(WithdrawField::Rail, |p| p.rail = Some(rail));
        self.navigate(WithdrawModal::OpenForm);
    }

    /// Set the selected token
    pub fn set_selected_token(&self, token: TokenSelection) {
        self.store()
            .update(WithdrawField::SelectedToken, |p| p.selected_token = Some(token));
    }

    /// Set the typed amount
    pub fn set_amount(&self, amount: impl Into<String>) {
        let amount = amount.into();
        self.store().update(WithdrawField::Amount, |p| p.amount = amount);
    }

    /// Set the destination address
    pub fn set_address(&self, address: impl Into<String>) {
        let address = address.into();
        self.store().update(WithdrawField::Address, |p| p.address = address);
    }

    /// Pick a bank account and continue to review.
    pub fn select_bank_account(&self, account_id: impl Into<String>) {
        let id = account_id.into();
        self.store()
            .update(WithdrawField::BankAccount, |p| p.bank_account = Some(id));
        self.navigate(WithdrawModal::OpenReview);
    }

    /// Continue from the form: bank withdrawals pick an account first.
    pub fn next_from_form(&self) -> WithdrawModal {
        let next = match self.payload().rail {
            Some(WithdrawRail::Bank) => WithdrawModal::OpenBankAccount,
            _ => WithdrawModal::OpenReview,
        };
        self.navigate(next).current
    }

    /// Record the submitted withdrawal and show its status.
    pub fn submitted(&self, transaction_hash: impl Into<String>) {
        let hash = transaction_hash.into();
        self.store()
            .update(WithdrawField::TransactionHash, |p| p.transaction_hash = Some(hash));
        self.navigate(WithdrawModal::OpenTransactionStatus);
    }
}
