//! State-to-view lookup.
//!
//! Pure mapping from a flow state to the key of the view a frontend renders.
//! Unknown names (a stale deep link, a state removed in a newer build) fall
//! back to the flow's default view and leave a breadcrumb in the log.

use super::state::FlowState;
use std::collections::HashMap;
use std::fmt::Debug;

/// Resolves a flow state to its view key.
#[derive(Clone, Debug)]
pub struct ContentResolver<S, V> {
    flow: &'static str,
    views: HashMap<S, V>,
    default_view: V,
}

impl<S: FlowState, V: Copy + Debug> ContentResolver<S, V> {
    pub(crate) fn new(flow: &'static str, views: HashMap<S, V>, default_view: V) -> Self {
        Self {
            flow,
            views,
            default_view,
        }
    }

    /// View for `state`; the closed state renders the default view.
    pub fn resolve(&self, state: S) -> V {
        match self.views.get(&state) {
            Some(view) => *view,
            None => {
                if !state.is_closed() {
                    tracing::warn!(flow = self.flow, state = state.name(), "no view registered, using default");
                }
                self.default_view
            }
        }
    }

    /// View for a state given by name, falling back to the default view.
    pub fn resolve_name(&self, name: &str) -> V {
        match S::from_name(name) {
            Some(state) => self.resolve(state),
            None => {
                tracing::warn!(flow = self.flow, state = name, "unknown state name, using default view");
                self.default_view
            }
        }
    }

    /// The fallback view
    pub fn default_view(&self) -> V {
        self.default_view
    }
}
