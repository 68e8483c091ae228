//! # Flow Registry
//!
//! Maps each state of a flow to its title, content view and designated
//! back target. Forward edges stay implicit (children call `set_modal`
//! directly); backward edges are an explicit table, checked once when the
//! registry is built instead of falling through at runtime.
//!
//! Validation rules:
//! - the closed state has number 0 and numbers are unique
//! - every non-closed state has a title, a view and a back target
//! - no back target points at its own state
//! - every back target has a strictly smaller number, so repeated back
//!   presses always reach the closed state

use super::content::ContentResolver;
use super::state::FlowState;
use std::collections::HashMap;
use std::fmt::Debug;
use thiserror::Error;

/// Where `handle_back_press` leads from a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackTarget<S> {
    /// Always the given state
    To(S),
    /// The modal shown before this one, or `fallback` when that is the
    /// closed state or this state itself
    Previous {
        /// Target when the previous modal is unusable
        fallback: S,
    },
}

impl<S: FlowState> BackTarget<S> {
    /// Resolve against the store's previous modal.
    pub fn resolve(self, current: S, previous: S) -> S {
        match self {
            Self::To(target) => target,
            Self::Previous { fallback } => {
                if previous.is_closed() || previous == current {
                    fallback
                } else {
                    previous
                }
            }
        }
    }

    /// The statically known target (the fallback for `Previous`).
    pub fn static_target(self) -> S {
        match self {
            Self::To(target) | Self::Previous { fallback: target } => target,
        }
    }
}

/// Registry validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The closed state does not carry number 0
    #[error("{flow}: closed state {state} has number {number}, expected 0")]
    ClosedNotZero {
        /// Flow name
        flow: &'static str,
        /// Closed state name
        state: &'static str,
        /// Its number
        number: u8,
    },
    /// Two states share an ordinal
    #[error("{flow}: states {first} and {second} share number {number}")]
    DuplicateNumber {
        /// Flow name
        flow: &'static str,
        /// First state
        first: &'static str,
        /// Second state
        second: &'static str,
        /// Shared number
        number: u8,
    },
    /// A reachable state was never registered
    #[error("{flow}: state {state} has no registry entry")]
    MissingEntry {
        /// Flow name
        flow: &'static str,
        /// Missing state
        state: &'static str,
    },
    /// The closed state was registered with an entry
    #[error("{flow}: closed state {state} cannot be registered")]
    ClosedRegistered {
        /// Flow name
        flow: &'static str,
        /// Closed state name
        state: &'static str,
    },
    /// A back target points at its own state
    #[error("{flow}: state {state} goes back to itself")]
    SelfLoop {
        /// Flow name
        flow: &'static str,
        /// Offending state
        state: &'static str,
    },
    /// A back target does not move to a lower ordinal
    #[error("{flow}: back target {target} of {state} is not behind it")]
    BackTargetNotBehind {
        /// Flow name
        flow: &'static str,
        /// Offending state
        state: &'static str,
        /// Its back target
        target: &'static str,
    },
}

/// Per-state registry entry.
#[derive(Clone, Debug)]
pub struct StateEntry<S> {
    /// Modal title
    pub title: &'static str,
    /// Back navigation target
    pub back: BackTarget<S>,
}

/// Validated per-flow state table.
#[derive(Clone, Debug)]
pub struct FlowRegistry<S, V> {
    flow: &'static str,
    entries: HashMap<S, StateEntry<S>>,
    content: ContentResolver<S, V>,
}

impl<S: FlowState, V: Copy + Debug> FlowRegistry<S, V> {
    /// Start building a registry for `flow`; `default_view` renders for the
    /// closed state and for unknown state names.
    pub fn builder(flow: &'static str, default_view: V) -> FlowRegistryBuilder<S, V> {
        FlowRegistryBuilder {
            flow,
            default_view,
            states: Vec::new(),
        }
    }

    /// Flow name
    pub fn flow(&self) -> &'static str {
        self.flow
    }

    /// Entry for a non-closed state
    pub fn entry(&self, state: S) -> Option<&StateEntry<S>> {
        self.entries.get(&state)
    }

    /// Back target declared for `state`; the closed state stays closed.
    pub fn back_target(&self, state: S) -> BackTarget<S> {
        self.entries
            .get(&state)
            .map(|e| e.back)
            .unwrap_or(BackTarget::To(S::CLOSED))
    }

    /// Resolve the concrete back destination from `current`.
    pub fn resolve_back(&self, current: S, previous: S) -> S {
        self.back_target(current).resolve(current, previous)
    }

    /// Modal title for `state` (empty for the closed state)
    pub fn title(&self, state: S) -> &'static str {
        self.entries.get(&state).map(|e| e.title).unwrap_or("")
    }

    /// Whether the header shows a back button: only when back leads to
    /// another open state; the entry state shows a close button instead.
    pub fn shows_back_button(&self, state: S, previous: S) -> bool {
        !state.is_closed() && !self.resolve_back(state, previous).is_closed()
    }

    /// State-to-view lookup
    pub fn content(&self) -> &ContentResolver<S, V> {
        &self.content
    }

    /// Registered states in declaration order
    pub fn states(&self) -> impl Iterator<Item = S> + '_ {
        S::all()
            .iter()
            .copied()
            .filter(|s| self.entries.contains_key(s))
    }
}

/// Builder collecting state entries before validation.
#[derive(Debug)]
pub struct FlowRegistryBuilder<S, V> {
    flow: &'static str,
    default_view: V,
    states: Vec<(S, &'static str, V, BackTarget<S>)>,
}

impl<S: FlowState, V: Copy + Debug> FlowRegistryBuilder<S, V> {
    /// Register a state with a fixed back target.
    #[must_use]
    pub fn state(mut self, state: S, title: &'static str, view: V, back: S) -> Self {
        self.states.push((state, title, view, BackTarget::To(back)));
        self
    }

    /// Register a state whose back target is the previous modal.
    #[must_use]
    pub fn state_back_to_previous(
        mut self,
        state: S,
        title: &'static str,
        view: V,
        fallback: S,
    ) -> Self {
        self.states
            .push((state, title, view, BackTarget::Previous { fallback }));
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<FlowRegistry<S, V>, RegistryError> {
        let flow = self.flow;

        if S::CLOSED.number() != 0 {
            return Err(RegistryError::ClosedNotZero {
                flow,
                state: S::CLOSED.name(),
                number: S::CLOSED.number(),
            });
        }

        let mut by_number: HashMap<u8, S> = HashMap::new();
        for state in S::all().iter().copied() {
            if let Some(existing) = by_number.insert(state.number(), state) {
                return Err(RegistryError::DuplicateNumber {
                    flow,
                    first: existing.name(),
                    second: state.name(),
                    number: state.number(),
                });
            }
        }

        let mut entries = HashMap::new();
        let mut views = HashMap::new();
        for (state, title, view, back) in self.states {
            if state.is_closed() {
                return Err(RegistryError::ClosedRegistered {
                    flow,
                    state: state.name(),
                });
            }
            let target = back.static_target();
            if target == state {
                return Err(RegistryError::SelfLoop {
                    flow,
                    state: state.name(),
                });
            }
            if target.number() >= state.number() {
                return Err(RegistryError::BackTargetNotBehind {
                    flow,
                    state: state.name(),
                    target: target.name(),
                });
            }
            entries.insert(state, StateEntry { title, back });
            views.insert(state, view);
        }

        if let Some(missing) = S::all()
            .iter()
            .copied()
            .find(|s| !s.is_closed() && !entries.contains_key(s))
        {
            return Err(RegistryError::MissingEntry {
                flow,
                state: missing.name(),
            });
        }

        tracing::debug!(flow, states = entries.len(), "flow registry validated");

        Ok(FlowRegistry {
            flow,
            entries,
            content: ContentResolver::new(flow, views, self.default_view),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::state::define_flow_states;

    define_flow_states! {
        /// Test flow
        pub enum Wizard {
            Close = ("CLOSE", 0),
            Intro = ("INTRO", 1),
            Form = ("FORM", 2),
            Confirm = ("CONFIRM", 3),
        }
        closed = Close;
    }

    define_flow_states! {
        /// Flow with a numbering mistake
        pub enum Clashing {
            Close = ("CLOSE", 0),
            A = ("A", 1),
            B = ("B", 1),
        }
        closed = Close;
    }

    fn wizard() -> FlowRegistryBuilder<Wizard, u8> {
        FlowRegistry::builder("wizard", 0)
            .state(Wizard::Intro, "Intro", 1, Wizard::Close)
            .state(Wizard::Form, "Form", 2, Wizard::Intro)
    }

    #[test]
    fn test_valid_registry() {
        let registry = wizard()
            .state_back_to_previous(Wizard::Confirm, "Confirm", 3, Wizard::Form)
            .build()
            .unwrap();
        assert_eq!(registry.title(Wizard::Form), "Form");
        assert_eq!(registry.title(Wizard::Close), "");
        assert_eq!(registry.resolve_back(Wizard::Form, Wizard::Intro), Wizard::Intro);
        assert_eq!(registry.resolve_back(Wizard::Close, Wizard::Form), Wizard::Close);
        assert_eq!(registry.states().count(), 3);
    }

    #[test]
    fn test_previous_target_resolution() {
        let registry = wizard()
            .state_back_to_previous(Wizard::Confirm, "Confirm", 3, Wizard::Form)
            .build()
            .unwrap();
        assert_eq!(registry.resolve_back(Wizard::Confirm, Wizard::Intro), Wizard::Intro);
        assert_eq!(registry.resolve_back(Wizard::Confirm, Wizard::Close), Wizard::Form);
        assert_eq!(registry.resolve_back(Wizard::Confirm, Wizard::Confirm), Wizard::Form);
    }

    #[test]
    fn test_back_button_visibility() {
        let registry = wizard()
            .state(Wizard::Confirm, "Confirm", 3, Wizard::Form)
            .build()
            .unwrap();
        assert!(!registry.shows_back_button(Wizard::Intro, Wizard::Close));
        assert!(registry.shows_back_button(Wizard::Form, Wizard::Intro));
        assert!(!registry.shows_back_button(Wizard::Close, Wizard::Close));
    }

    #[test]
    fn test_missing_entry_rejected() {
        let err = wizard().build().unwrap_err();
        assert_eq!(
            err,
            RegistryError::MissingEntry {
                flow: "wizard",
                state: "CONFIRM"
            }
        );
    }

    #[test]
    fn test_self_loop_rejected() {
        let err = wizard()
            .state(Wizard::Confirm, "Confirm", 3, Wizard::Confirm)
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::SelfLoop { state: "CONFIRM", .. }));
    }

    #[test]
    fn test_forward_back_target_rejected() {
        let err = FlowRegistry::builder("wizard", 0)
            .state(Wizard::Intro, "Intro", 1, Wizard::Form)
            .state(Wizard::Form, "Form", 2, Wizard::Intro)
            .state(Wizard::Confirm, "Confirm", 3, Wizard::Form)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::BackTargetNotBehind { state: "INTRO", target: "FORM", .. }
        ));
    }

    #[test]
    fn test_closed_state_cannot_be_registered() {
        let err = wizard()
            .state(Wizard::Confirm, "Confirm", 3, Wizard::Form)
            .state(Wizard::Close, "Closed", 0, Wizard::Intro)
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::ClosedRegistered { .. }));
    }

    #[test]
    fn test_duplicate_numbers_rejected() {
        let err = FlowRegistry::<Clashing, u8>::builder("clashing", 0)
            .state(Clashing::A, "A", 1, Clashing::Close)
            .state(Clashing::B, "B", 2, Clashing::Close)
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateNumber { number: 1, .. }));
    }
}
