//! # Send Flow
//!
//! Search a recipient, fill the form, review and submit. Closing the modal
//! with unsaved input asks for confirmation first.
//!
//! ```text
//! SEND_SEARCH ── FORM ─┬─ TOKEN_SELECTOR
//!                      └─ REVIEW ── TRANSACTION_STATUS
//!
//! close with unsaved data ──► DISCARD_CONFIRM ──► (confirm) CLOSE
//!                                   └─(back)──► previous modal
//! ```

use super::controller::{CloseDecision, FlowMachine, FlowSpec, Navigation};
use super::payload::TokenSelection;
use super::registry::{FlowRegistry, RegistryError};
use super::state::{define_flow_states, FlowState};
use super::store::{FieldRules, FlowPayload, FlowStore};
use serde::{Deserialize, Serialize};

define_flow_states! {
    /// Send modal states.
    pub enum SendModal {
        /// Modal hidden
        Close = ("CLOSE", 0),
        /// Recipient search
        OpenSendSearch = ("OPEN_SEND_SEARCH", 1),
        /// Amount and token
        OpenForm = ("OPEN_FORM", 2),
        /// Token picker
        OpenTokenSelector = ("OPEN_TOKEN_SELECTOR", 3),
        /// Final review
        OpenReview = ("OPEN_REVIEW", 4),
        /// Confirm discarding unsaved input
        OpenDiscardConfirm = ("OPEN_DISCARD_CONFIRM", 5),
        /// Submitted transfer progress
        OpenTransactionStatus = ("OPEN_TRANSACTION_STATUS", 6),
    }
    closed = Close;
}

/// Views rendered by the send modal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SendView {
    /// Recipient search (default)
    SendSearch,
    /// Amount form
    SendForm,
    /// Token picker
    TokenSelector,
    /// Review screen
    SendReview,
    /// Discard confirmation
    DiscardConfirm,
    /// Transfer progress
    TransactionStatus,
}

/// Mutable send session fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendPayload {
    /// Text typed into the recipient search
    pub search_query: String,
    /// Recipient address
    pub address: String,
    /// Recipient display name (contact or resolved name)
    pub name: String,
    /// Token to send
    pub selected_token: Option<TokenSelection>,
    /// Amount as typed
    pub amount: String,
    /// Hash of the submitted transfer
    pub transaction_hash: Option<String>,
}

/// Send payload fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SendField {
    /// `search_query`
    SearchQuery,
    /// `address`
    Address,
    /// `name`
    Name,
    /// `selected_token`
    SelectedToken,
    /// `amount`
    Amount,
    /// `transaction_hash`
    TransactionHash,
}

impl FlowPayload for SendPayload {
    type Field = SendField;

    fn clear_field(&mut self, field: SendField) {
        match field {
            SendField::SearchQuery => self.search_query.clear(),
            SendField::Address => self.address.clear(),
            SendField::Name => self.name.clear(),
            SendField::SelectedToken => self.selected_token = None,
            SendField::Amount => self.amount.clear(),
            SendField::TransactionHash => self.transaction_hash = None,
        }
    }

    fn field_rules() -> FieldRules<SendField> {
        FieldRules::new()
            .when_changed(SendField::SearchQuery, &[SendField::Name, SendField::Address])
            .when_changed(SendField::Address, &[SendField::Name])
            .when_changed(SendField::SelectedToken, &[SendField::Amount])
    }
}

impl SendPayload {
    /// Whether closing would lose something the user typed or picked.
    pub fn has_unsaved_send_data(&self) -> bool {
        !self.search_query.trim().is_empty()
            || !self.address.is_empty()
            || self.selected_token.is_some()
            || !self.amount.trim().is_empty()
    }
}

/// Send flow description.
#[derive(Debug)]
pub struct SendFlow;

impl FlowSpec for SendFlow {
    type State = SendModal;
    type Payload = SendPayload;
    type View = SendView;
    type Context = ();

    const NAME: &'static str = "send";

    fn entry_state() -> SendModal {
        SendModal::OpenSendSearch
    }

    fn registry() -> Result<FlowRegistry<SendModal, SendView>, RegistryError> {
        use SendModal as M;
        use SendView as V;

        FlowRegistry::builder(Self::NAME, V::SendSearch)
            .state(M::OpenSendSearch, "Send", V::SendSearch, M::Close)
            .state(M::OpenForm, "Send", V::SendForm, M::OpenSendSearch)
            .state(M::OpenTokenSelector, "Select token", V::TokenSelector, M::OpenForm)
            .state(M::OpenReview, "Review", V::SendReview, M::OpenForm)
            .state_back_to_previous(
                M::OpenDiscardConfirm,
                "Discard transfer?",
                V::DiscardConfirm,
                M::OpenForm,
            )
            .state(M::OpenTransactionStatus, "Transfer status", V::TransactionStatus, M::Close)
            .build()
    }

    fn close_decision(
        store: &FlowStore<SendModal, SendPayload>,
        _ctx: &(),
    ) -> CloseDecision<SendModal> {
        let current = store.current_modal();
        let settled = matches!(
            current,
            SendModal::OpenDiscardConfirm | SendModal::OpenTransactionStatus
        );
        if !settled && store.payload().has_unsaved_send_data() {
            return CloseDecision::Redirect(SendModal::OpenDiscardConfirm);
        }
        CloseDecision::Close
    }
}

/// Send flow driven against its store.
pub type SendMachine = FlowMachine<SendFlow>;

impl FlowMachine<SendFlow> {
    /// Update the search text; clears any picked recipient.
    pub fn set_search_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.store()
            .update(SendField::SearchQuery, |p| p.search_query = query);
    }

    /// Pick a recipient and continue to the form.
    ///
    /// The address is written first so its rule does not wipe the name.
    pub fn select_recipient(&self, address: impl Into<String>, name: impl Into<String>) {
        let address = address.into();
        let name = name.into();
        self.store().update(SendField::Address, |p| p.address = address);
        self.store().update(SendField::Name, |p| p.name = name);
        self.navigate(SendModal::OpenForm);
    }

    /// Pick a token and return to the form.
    pub fn select_token(&self, token: TokenSelection) {
        self.store()
            .update(SendField::SelectedToken, |p| p.selected_token = Some(token));
        self.navigate(SendModal::OpenForm);
    }

    /// Set the typed amount
    pub fn set_amount(&self, amount: impl Into<String>) {
        let amount = amount.into();
        self.store().update(SendField::Amount, |p| p.amount = amount);
    }

    /// Record the submitted transfer and show its status.
    pub fn submitted(&self, transaction_hash: impl Into<String>) {
        let hash = transaction_hash.into();
        self.store()
            .update(SendField::TransactionHash, |p| p.transaction_hash = Some(hash));
        self.navigate(SendModal::OpenTransactionStatus);
    }

    /// Discard unsaved input and close.
    pub fn confirm_discard(&self) -> Navigation<SendModal> {
        if self.current() != SendModal::OpenDiscardConfirm {
            tracing::debug!(state = self.current().name(), "discard confirmed outside confirmation");
        }
        self.close_now()
    }
}
