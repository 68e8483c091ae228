//! # Modal States
//!
//! Every flow enumerates its modal states as a plain enum implementing
//! [`FlowState`]. Each state carries a display name and an ordinal
//! (`number`). Numbers strictly increase along every forward path starting
//! at the closed state (`CLOSE = 0`), which lets frontends infer the
//! animation direction of a transition without walking a graph.

use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;

/// Name shared by every flow's closed state.
pub const CLOSE: &str = "CLOSE";

/// Plain-data projection of a flow state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ModalState {
    /// Unique name within the flow (e.g. `OPEN_OPTIONS`)
    pub name: &'static str,
    /// Ordinal used for direction inference
    pub number: u8,
}

impl ModalState {
    /// The closed state every flow starts from.
    pub const CLOSE: ModalState = ModalState {
        name: CLOSE,
        number: 0,
    };

    /// Whether this is the closed state.
    #[must_use]
    pub fn is_close(&self) -> bool {
        self.name == CLOSE
    }
}

/// Whether moving from `previous` to `current` is a forward transition.
///
/// ```rust
/// use stash_app::flows::{is_forward, ModalState};
///
/// let options = ModalState { name: "OPEN_OPTIONS", number: 1 };
/// assert!(is_forward(options, ModalState::CLOSE));
/// assert!(!is_forward(ModalState::CLOSE, options));
/// ```
#[must_use]
pub fn is_forward(current: ModalState, previous: ModalState) -> bool {
    current.number > previous.number
}

/// Whether a transition out of `previous` should animate.
///
/// Opening a flow from the closed state shows the modal without a slide.
#[must_use]
pub fn should_animate(previous: ModalState) -> bool {
    !previous.is_close()
}

/// A modal state enumeration belonging to one flow.
pub trait FlowState: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// The closed state (`CLOSE`, number 0)
    const CLOSED: Self;

    /// All states in declaration order
    fn all() -> &'static [Self];

    /// Display name of this state
    fn name(self) -> &'static str;

    /// Ordinal of this state
    fn number(self) -> u8;

    /// Plain-data projection
    fn modal_state(self) -> ModalState {
        ModalState {
            name: self.name(),
            number: self.number(),
        }
    }

    /// Look a state up by name (deep links, restored sessions).
    fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|s| s.name() == name)
    }

    /// Whether this is the closed state
    fn is_closed(self) -> bool {
        self == Self::CLOSED
    }
}

/// The `(current, previous)` pair produced by every `set_modal`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModalTransition<S> {
    /// State after the transition
    pub current: S,
    /// State before the transition
    pub previous: S,
}

impl<S: FlowState> ModalTransition<S> {
    /// The resting transition of a flow that has never been opened.
    pub fn closed() -> Self {
        Self {
            current: S::CLOSED,
            previous: S::CLOSED,
        }
    }

    /// See [`is_forward`]
    pub fn is_forward(&self) -> bool {
        is_forward(self.current.modal_state(), self.previous.modal_state())
    }

    /// See [`should_animate`]
    pub fn should_animate(&self) -> bool {
        should_animate(self.previous.modal_state())
    }
}

/// Declares a flow's state enum and its [`FlowState`] implementation.
///
/// Each variant is paired with its `(name, number)`; the closed variant is
/// named explicitly. Registry validation checks the numbering at startup.
macro_rules! define_flow_states {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = ($label:literal, $number:literal)
            ),+ $(,)?
        }
        closed = $closed:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize,
        )]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $crate::flows::FlowState for $name {
            const CLOSED: Self = Self::$closed;

            fn all() -> &'static [Self] {
                &[$(Self::$variant),+]
            }

            fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            fn number(self) -> u8 {
                match self {
                    $(Self::$variant => $number,)+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::flows::FlowState::name(*self))
            }
        }
    };
}

pub(crate) use define_flow_states;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    define_flow_states! {
        /// Test flow
        pub enum Sample {
            Close = ("CLOSE", 0),
            First = ("FIRST", 1),
            Second = ("SECOND", 2),
        }
        closed = Close;
    }

    #[test]
    fn test_macro_projection() {
        assert_eq!(Sample::CLOSED, Sample::Close);
        assert_eq!(Sample::all().len(), 3);
        assert_eq!(Sample::Second.modal_state(), ModalState { name: "SECOND", number: 2 });
        assert_eq!(Sample::from_name("FIRST"), Some(Sample::First));
        assert_eq!(Sample::from_name("MISSING"), None);
        assert_eq!(Sample::First.to_string(), "FIRST");
    }

    #[test]
    fn test_serde_uses_state_names() {
        assert_eq!(serde_json::to_string(&Sample::First).unwrap(), "\"FIRST\"");
        let back: Sample = serde_json::from_str("\"SECOND\"").unwrap();
        assert_eq!(back, Sample::Second);
    }

    #[test]
    fn test_should_animate_only_from_open_states() {
        assert!(!should_animate(ModalState::CLOSE));
        assert!(should_animate(Sample::First.modal_state()));
    }

    #[test]
    fn test_transition_direction() {
        let t = ModalTransition {
            current: Sample::First,
            previous: Sample::Close,
        };
        assert!(t.is_forward());
        assert!(!t.should_animate());

        let back = ModalTransition {
            current: Sample::First,
            previous: Sample::Second,
        };
        assert!(!back.is_forward());
        assert!(back.should_animate());
    }

    proptest! {
        #[test]
        fn prop_is_forward_matches_numbers(a in 0u8..=255, b in 0u8..=255) {
            let current = ModalState { name: "A", number: a };
            let previous = ModalState { name: "B", number: b };
            prop_assert_eq!(is_forward(current, previous), a > b);
        }

        #[test]
        fn prop_close_is_never_ahead(n in 0u8..=255) {
            let state = ModalState { name: "X", number: n };
            prop_assert!(!is_forward(ModalState::CLOSE, state));
            prop_assert_eq!(is_forward(state, ModalState::CLOSE), n > 0);
        }
    }
}
