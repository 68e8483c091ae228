//! # Flow Store
//!
//! Holds `current_modal`, `previous_modal` and the flow payload.
//!
//! `set_modal` shifts the current modal into `previous_modal` before assigning
//! the new one and never checks legality; controllers decide which
//! transitions to request. Payload writes go through [`FlowStore::update`],
//! which applies the payload's declarative field rules: when a write changes
//! field A, every field listed as depending on A is cleared (transitively).
//!
//! [`FlowHandle`] is the shared, process-wide owner of one store. Writes are
//! last-writer-wins under a lock and every modal transition is published on
//! a watch channel for frontends to subscribe to.

use super::state::{FlowState, ModalTransition};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::watch;

/// Flow-specific mutable fields.
pub trait FlowPayload: Clone + Default + PartialEq + Debug + Send + Sync + 'static {
    /// Field identifiers used by dependency rules
    type Field: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// Reset one field to its empty value
    fn clear_field(&mut self, field: Self::Field);

    /// Cascading-clear rules for this payload
    fn field_rules() -> FieldRules<Self::Field> {
        FieldRules::default()
    }
}

/// Declarative "when A changes, clear {B, C}" rules.
#[derive(Clone, Debug)]
pub struct FieldRules<F> {
    rules: HashMap<F, Vec<F>>,
}

impl<F> Default for FieldRules<F> {
    fn default() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }
}

impl<F: Copy + Eq + Hash> FieldRules<F> {
    /// Empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// When `field` changes, clear `dependents`.
    #[must_use]
    pub fn when_changed(mut self, field: F, dependents: &[F]) -> Self {
        self.rules
            .entry(field)
            .or_default()
            .extend(dependents.iter().copied());
        self
    }

    /// Direct dependents of `field`
    pub fn dependents(&self, field: F) -> &[F] {
        self.rules.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every field cleared when `field` changes, in breadth-first order.
    /// The changed field itself is never cleared.
    pub fn cascade(&self, field: F) -> Vec<F> {
        let mut seen: HashSet<F> = HashSet::from([field]);
        let mut queue: VecDeque<F> = self.dependents(field).iter().copied().collect();
        let mut out = Vec::new();
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next);
            queue.extend(self.dependents(next).iter().copied());
        }
        out
    }
}

/// In-memory state container for one flow.
#[derive(Clone, Debug)]
pub struct FlowStore<S, P: FlowPayload> {
    current: S,
    previous: S,
    payload: P,
    rules: FieldRules<P::Field>,
}

impl<S: FlowState, P: FlowPayload> Default for FlowStore<S, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: FlowState, P: FlowPayload> FlowStore<S, P> {
    /// A closed store with an empty payload
    pub fn new() -> Self {
        Self {
            current: S::CLOSED,
            previous: S::CLOSED,
            payload: P::default(),
            rules: P::field_rules(),
        }
    }

    /// Current modal
    pub fn current_modal(&self) -> S {
        self.current
    }

    /// Modal shown before the current one
    pub fn previous_modal(&self) -> S {
        self.previous
    }

    /// `(current, previous)` pair
    pub fn transition(&self) -> ModalTransition<S> {
        ModalTransition {
            current: self.current,
            previous: self.previous,
        }
    }

    /// Shift current into previous and show `next`.
    pub fn set_modal(&mut self, next: S) -> ModalTransition<S> {
        self.previous = self.current;
        self.current = next;
        self.transition()
    }

    /// Payload snapshot
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Write `field` through `write`. When the payload actually changed the
    /// field's dependents are cleared. Returns whether anything changed.
    pub fn update(&mut self, field: P::Field, write: impl FnOnce(&mut P)) -> bool {
        let before = self.payload.clone();
        write(&mut self.payload);
        if self.payload == before {
            return false;
        }
        for dependent in self.rules.cascade(field) {
            self.payload.clear_field(dependent);
        }
        true
    }

    /// Clear one field and its dependents
    pub fn clear_field(&mut self, field: P::Field) {
        self.payload.clear_field(field);
        for dependent in self.rules.cascade(field) {
            self.payload.clear_field(dependent);
        }
    }

    /// Clear the payload and return to the closed state.
    pub fn reset(&mut self) -> ModalTransition<S> {
        self.payload = P::default();
        self.set_modal(S::CLOSED)
    }
}

/// Shared owner of one flow's store.
#[derive(Clone, Debug)]
pub struct FlowHandle<S, P: FlowPayload> {
    inner: Arc<RwLock<FlowStore<S, P>>>,
    transitions: Arc<watch::Sender<ModalTransition<S>>>,
}

impl<S: FlowState, P: FlowPayload> Default for FlowHandle<S, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: FlowState, P: FlowPayload> FlowHandle<S, P> {
    /// A closed flow with an empty payload
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ModalTransition::closed());
        Self {
            inner: Arc::new(RwLock::new(FlowStore::new())),
            transitions: Arc::new(tx),
        }
    }

    /// Subscribe to modal transitions
    pub fn subscribe(&self) -> watch::Receiver<ModalTransition<S>> {
        self.transitions.subscribe()
    }

    /// Read through the store
    pub fn read<R>(&self, f: impl FnOnce(&FlowStore<S, P>) -> R) -> R {
        f(&self.inner.read())
    }

    /// Current modal
    pub fn current_modal(&self) -> S {
        self.inner.read().current_modal()
    }

    /// Previous modal
    pub fn previous_modal(&self) -> S {
        self.inner.read().previous_modal()
    }

    /// `(current, previous)` pair
    pub fn transition(&self) -> ModalTransition<S> {
        self.inner.read().transition()
    }

    /// Payload snapshot
    pub fn payload(&self) -> P {
        self.inner.read().payload().clone()
    }

    /// See [`FlowStore::set_modal`]
    pub fn set_modal(&self, next: S) -> ModalTransition<S> {
        let transition = self.inner.write().set_modal(next);
        self.publish(transition);
        transition
    }

    /// See [`FlowStore::update`]
    pub fn update(&self, field: P::Field, write: impl FnOnce(&mut P)) -> bool {
        self.inner.write().update(field, write)
    }

    /// Show `next` only while `expected` is still current. `None` when
    /// something else moved the flow first.
    pub fn set_modal_if(&self, expected: S, next: S) -> Option<ModalTransition<S>> {
        let transition = {
            let mut store = self.inner.write();
            if store.current_modal() != expected {
                return None;
            }
            store.set_modal(next)
        };
        self.publish(transition);
        Some(transition)
    }

    /// Write `field` only if `guard` accepts the store, checked under the
    /// same lock as the write. `None` when the guard refused, otherwise
    /// whether anything changed.
    pub fn update_if(
        &self,
        field: P::Field,
        guard: impl FnOnce(&FlowStore<S, P>) -> bool,
        write: impl FnOnce(&mut P),
    ) -> Option<bool> {
        let mut store = self.inner.write();
        if !guard(&*store) {
            return None;
        }
        Some(store.update(field, write))
    }

    /// See [`FlowStore::clear_field`]
    pub fn clear_field(&self, field: P::Field) {
        self.inner.write().clear_field(field);
    }

    /// See [`FlowStore::reset`]
    pub fn reset(&self) -> ModalTransition<S> {
        let transition = self.inner.write().reset();
        self.publish(transition);
        transition
    }

    fn publish(&self, transition: ModalTransition<S>) {
        tracing::debug!(
            current = transition.current.name(),
            previous = transition.previous.name(),
            forward = transition.is_forward(),
            "modal transition"
        );
        self.transitions.send_replace(transition);
    }
}
