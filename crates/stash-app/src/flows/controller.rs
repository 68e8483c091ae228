//! # Transition Controller
//!
//! [`FlowSpec`] describes one flow: its states, payload, views, registry and
//! close policy. [`FlowMachine`] drives a flow description against a shared store:
//!
//! ```text
//! UI event → FlowMachine (back / open change / navigate)
//!          → FlowHandle::set_modal → ContentResolver → view
//! ```
//!
//! Illegal transitions never error. Back presses follow the registry table,
//! closing goes through the flow's close policy, and forward navigation is
//! requested directly by child views via [`FlowMachine::navigate`].

use super::registry::{FlowRegistry, RegistryError};
use super::state::{FlowState, ModalTransition};
use super::store::{FlowHandle, FlowPayload, FlowStore};
use std::fmt::Debug;
use std::sync::Arc;

/// What a flow's close policy decides when the modal is asked to close.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseDecision<S> {
    /// Close and clear the payload
    Close,
    /// Stay open; `reason` is logged
    Block {
        /// Why closing is refused
        reason: &'static str,
    },
    /// Show another state instead of closing
    Redirect(S),
}

/// Result of a navigation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation<S> {
    /// Moved to another open state
    Moved(ModalTransition<S>),
    /// Flow closed and payload cleared
    Closed,
    /// Close refused by policy
    Blocked {
        /// Why closing was refused
        reason: &'static str,
    },
    /// Close redirected to another state
    Redirected(ModalTransition<S>),
    /// Nothing to do
    Unchanged,
}

/// Static description of one flow.
pub trait FlowSpec: Send + Sync + 'static {
    /// Modal state enumeration
    type State: FlowState;
    /// Mutable session fields
    type Payload: FlowPayload;
    /// View keys rendered by frontends
    type View: Copy + Eq + Debug + Send + Sync + 'static;
    /// External signals consulted by the close policy
    type Context: Default;

    /// Flow name used in logs
    const NAME: &'static str;

    /// State shown when the flow opens
    fn entry_state() -> Self::State;

    /// Build the state table
    fn registry() -> Result<FlowRegistry<Self::State, Self::View>, RegistryError>;

    /// Decide what `handle_open_change(false)` does
    fn close_decision(
        store: &FlowStore<Self::State, Self::Payload>,
        ctx: &Self::Context,
    ) -> CloseDecision<Self::State>;
}

/// Drives a [`FlowSpec`] against its shared store.
pub struct FlowMachine<F: FlowSpec> {
    registry: Arc<FlowRegistry<F::State, F::View>>,
    store: FlowHandle<F::State, F::Payload>,
}

impl<F: FlowSpec> Clone for FlowMachine<F> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            store: self.store.clone(),
        }
    }
}

impl<F: FlowSpec> Debug for FlowMachine<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowMachine")
            .field("flow", &F::NAME)
            .field("transition", &self.store.transition())
            .finish()
    }
}

impl<F: FlowSpec> FlowMachine<F> {
    /// Validate the registry and start closed with an empty payload.
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_store(FlowHandle::new())
    }

    /// Validate the registry and drive an existing store.
    pub fn with_store(store: FlowHandle<F::State, F::Payload>) -> Result<Self, RegistryError> {
        Ok(Self {
            registry: Arc::new(F::registry()?),
            store,
        })
    }

    /// Shared store handle
    pub fn store(&self) -> &FlowHandle<F::State, F::Payload> {
        &self.store
    }

    /// State table
    pub fn registry(&self) -> &FlowRegistry<F::State, F::View> {
        &self.registry
    }

    /// Current modal
    pub fn current(&self) -> F::State {
        self.store.current_modal()
    }

    /// Whether the modal is open
    pub fn is_open(&self) -> bool {
        !self.current().is_closed()
    }

    /// Payload snapshot
    pub fn payload(&self) -> F::Payload {
        self.store.payload()
    }

    /// View to render for the current modal
    pub fn view(&self) -> F::View {
        self.registry.content().resolve(self.current())
    }

    /// Title for the current modal
    pub fn title(&self) -> &'static str {
        self.registry.title(self.current())
    }

    /// Whether the header shows a back button
    pub fn show_back_button(&self) -> bool {
        let t = self.store.transition();
        self.registry.shows_back_button(t.current, t.previous)
    }

    /// Where a back press leads from the current modal
    pub fn back_target(&self) -> F::State {
        let t = self.store.transition();
        self.registry.resolve_back(t.current, t.previous)
    }

    /// Show `next` without any legality check (forward steps from views).
    pub fn navigate(&self, next: F::State) -> ModalTransition<F::State> {
        self.store.set_modal(next)
    }

    /// Show `next` only if the flow is still at `from`. Used by handlers
    /// finishing after an await, when the user may have moved on.
    pub fn navigate_from(
        &self,
        from: F::State,
        next: F::State,
    ) -> Option<ModalTransition<F::State>> {
        self.store.set_modal_if(from, next)
    }

    /// Follow the back table; going back to the closed state is a close
    /// request and runs through the close policy.
    pub fn handle_back_press(&self, ctx: &F::Context) -> Navigation<F::State> {
        let current = self.current();
        if current.is_closed() {
            return Navigation::Unchanged;
        }
        let target = self.back_target();
        if target.is_closed() {
            return self.handle_open_change(false, ctx);
        }
        Navigation::Moved(self.store.set_modal(target))
    }

    /// Open (`true`) at the entry state, or close (`false`) under the
    /// flow's close policy.
    pub fn handle_open_change(&self, open: bool, ctx: &F::Context) -> Navigation<F::State> {
        if open {
            if self.is_open() {
                return Navigation::Unchanged;
            }
            return Navigation::Moved(self.store.set_modal(F::entry_state()));
        }

        if !self.is_open() {
            return Navigation::Unchanged;
        }

        let decision = self.store.read(|store| F::close_decision(store, ctx));
        match decision {
            CloseDecision::Close => self.close_now(),
            CloseDecision::Block { reason } => {
                tracing::warn!(flow = F::NAME, reason, "close blocked");
                Navigation::Blocked { reason }
            }
            CloseDecision::Redirect(state) => {
                tracing::debug!(flow = F::NAME, state = state.name(), "close redirected");
                Navigation::Redirected(self.store.set_modal(state))
            }
        }
    }

    /// Close immediately and clear the payload, bypassing the close policy.
    pub fn close_now(&self) -> Navigation<F::State> {
        self.store.reset();
        Navigation::Closed
    }
}
