//! # Card Activation Steps
//!
//! Derives the ordered activation checklist from status signals:
//!
//! ```text
//! Complete KYC ──► Order card ──► Start spending
//! ```
//!
//! Each step's completion comes purely from its own signal. Gating is shared
//! across issuers: only the first incomplete step (every step before it
//! completed) may carry an action, so users cannot skip ahead. The list is
//! rebuilt on every call; nothing here is persisted.

use super::issuer::strategy_for;
use super::status::{ActivationSignals, CardStatus};
use serde::Serialize;

// =============================================================================
// Step Types
// =============================================================================

/// Activation step identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    /// Identity verification
    CompleteKyc,
    /// Order a card
    OrderCard,
    /// Fund the card
    StartSpending,
}

/// Display status of a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Done
    Completed,
    /// Next step, button enabled
    Actionable,
    /// Next step, waiting on a third party
    Pending,
    /// Next step, disabled for this user or region
    Blocked,
    /// An earlier step is incomplete
    Locked,
}

/// What a step's button does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    /// Start identity verification
    StartKyc,
    /// Continue an unfinished verification
    ResumeKyc,
    /// Open a support conversation
    ContactSupport,
    /// Order the card
    OrderCard,
    /// Open the card deposit flow
    AddFunds,
}

impl StepAction {
    /// Button label
    pub fn label(self) -> &'static str {
        match self {
            StepAction::StartKyc => "Start verification",
            StepAction::ResumeKyc => "Continue verification",
            StepAction::ContactSupport => "Contact support",
            StepAction::OrderCard => "Order card",
            StepAction::AddFunds => "Add funds",
        }
    }
}

/// One row of the activation checklist.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CardActivationStep {
    /// Step identifier
    pub id: StepId,
    /// Title
    pub title: &'static str,
    /// Description for the current signals
    pub description: &'static str,
    /// Whether the step's own signal reports it done
    pub completed: bool,
    /// Button label when the step is actionable
    pub button_text: Option<&'static str>,
    /// Button action when the step is actionable
    pub action: Option<StepAction>,
    /// Display status
    pub status: StepStatus,
}

impl CardActivationStep {
    /// Whether the button is enabled
    pub fn is_actionable(&self) -> bool {
        self.action.is_some()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Ungated step before the first-incomplete rule is applied.
struct Draft {
    id: StepId,
    title: &'static str,
    description: &'static str,
    completed: bool,
    action: Option<StepAction>,
    blocked: bool,
}

fn kyc_step(signals: &ActivationSignals) -> Draft {
    let issuer = strategy_for(signals.issuer);
    Draft {
        id: StepId::CompleteKyc,
        title: "Complete KYC",
        description: issuer.description(signals),
        completed: issuer.is_complete(signals),
        action: issuer.action(signals),
        blocked: false,
    }
}

fn order_card_step(signals: &ActivationSignals) -> Draft {
    let completed = signals.card_status.is_issued() || signals.card_status == CardStatus::Pending;
    let blocked = !completed && signals.card_activation_blocked;
    let description = if completed {
        "Your card is on its way"
    } else if blocked {
        "Cards are not available for your account yet"
    } else if signals.card_status == CardStatus::Canceled {
        "Order a replacement card"
    } else {
        "Get a virtual card in seconds"
    };
    Draft {
        id: StepId::OrderCard,
        title: "Order card",
        description,
        completed,
        action: (!completed && !blocked).then_some(StepAction::OrderCard),
        blocked,
    }
}

fn start_spending_step(signals: &ActivationSignals) -> Draft {
    let completed = signals.has_card_funds;
    Draft {
        id: StepId::StartSpending,
        title: "Start spending",
        description: if completed {
            "Your card is ready to use"
        } else {
            "Add funds to your card to start spending"
        },
        completed,
        action: (!completed).then_some(StepAction::AddFunds),
        blocked: false,
    }
}

/// Build the ordered activation checklist for `signals`.
pub fn build_activation_steps(signals: &ActivationSignals) -> Vec<CardActivationStep> {
    let drafts = [
        kyc_step(signals),
        order_card_step(signals),
        start_spending_step(signals),
    ];
    let completed: Vec<bool> = drafts.iter().map(|d| d.completed).collect();
    let first_incomplete = first_incomplete_index(&completed);

    drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| {
            let is_next = first_incomplete == Some(index);
            let action = if is_next { draft.action } else { None };
            let status = if draft.completed {
                StepStatus::Completed
            } else if !is_next {
                StepStatus::Locked
            } else if draft.blocked {
                StepStatus::Blocked
            } else if action.is_some() {
                StepStatus::Actionable
            } else {
                StepStatus::Pending
            };
            CardActivationStep {
                id: draft.id,
                title: draft.title,
                description: draft.description,
                completed: draft.completed,
                button_text: action.map(StepAction::label),
                action,
                status,
            }
        })
        .collect()
}

/// Index of the first step whose predecessors are all completed and which
/// is not completed itself.
pub fn find_first_incomplete_step(steps: &[CardActivationStep]) -> Option<usize> {
    let completed: Vec<bool> = steps.iter().map(|s| s.completed).collect();
    first_incomplete_index(&completed)
}

fn first_incomplete_index(completed: &[bool]) -> Option<usize> {
    // The first unfinished step is the only one whose predecessors are all done.
    completed.iter().position(|done| !done)
}

/// `(completed, total)` for the progress header.
pub fn activation_progress(steps: &[CardActivationStep]) -> (usize, usize) {
    (steps.iter().filter(|s| s.completed).count(), steps.len())
}

/// Whether every step is completed.
pub fn is_activation_complete(steps: &[CardActivationStep]) -> bool {
    steps.iter().all(|s| s.completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::status::{CardIssuer, RainApplicationStatus};
    use crate::customer::{EndorsementStatus, KycStatus};
    use proptest::prelude::*;

    fn approved_bridge() -> ActivationSignals {
        ActivationSignals {
            issuer: CardIssuer::Bridge,
            kyc_status: KycStatus::Approved,
            cards_endorsement: EndorsementStatus::Approved,
            ..ActivationSignals::default()
        }
    }

    #[test]
    fn test_fresh_user_can_only_start_kyc() {
        let steps = build_activation_steps(&ActivationSignals::default());
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].action, Some(StepAction::StartKyc));
        assert_eq!(steps[0].status, StepStatus::Actionable);
        assert_eq!(steps[1].status, StepStatus::Locked);
        assert_eq!(steps[1].action, None);
        assert_eq!(steps[2].button_text, None);
        assert_eq!(find_first_incomplete_step(&steps), Some(0));
    }

    #[test]
    fn test_kyc_in_review_is_pending_without_button() {
        let signals = ActivationSignals {
            kyc_status: KycStatus::UnderReview,
            ..ActivationSignals::default()
        };
        let steps = build_activation_steps(&signals);
        assert_eq!(steps[0].status, StepStatus::Pending);
        assert!(!steps[0].is_actionable());
        assert!(!steps[1].is_actionable());
    }

    #[test]
    fn test_approval_unlocks_order_card() {
        let steps = build_activation_steps(&approved_bridge());
        assert!(steps[0].completed);
        assert_eq!(steps[1].action, Some(StepAction::OrderCard));
        assert_eq!(steps[1].button_text, Some("Order card"));
        assert_eq!(activation_progress(&steps), (1, 3));
    }

    #[test]
    fn test_blocked_activation_keeps_completion() {
        let signals = ActivationSignals {
            card_activation_blocked: true,
            ..approved_bridge()
        };
        let steps = build_activation_steps(&signals);
        assert_eq!(steps[1].status, StepStatus::Blocked);
        assert_eq!(steps[1].action, None);
        assert!(!steps[1].completed);

        // Already ordered: blocking does not undo completion.
        let ordered = ActivationSignals {
            card_status: CardStatus::Active,
            ..signals
        };
        let steps = build_activation_steps(&ordered);
        assert!(steps[1].completed);
        assert_eq!(steps[2].action, Some(StepAction::AddFunds));
    }

    #[test]
    fn test_funds_without_kyc_do_not_skip_ahead() {
        let signals = ActivationSignals {
            has_card_funds: true,
            ..ActivationSignals::default()
        };
        let steps = build_activation_steps(&signals);
        assert!(steps[2].completed);
        assert_eq!(steps[2].status, StepStatus::Completed);
        assert_eq!(find_first_incomplete_step(&steps), Some(0));
    }

    #[test]
    fn test_rain_issuer_step_text() {
        let signals = ActivationSignals {
            issuer: CardIssuer::Rain,
            rain_status: RainApplicationStatus::NeedsInformation,
            ..ActivationSignals::default()
        };
        let steps = build_activation_steps(&signals);
        assert_eq!(steps[0].action, Some(StepAction::ResumeKyc));
        assert_eq!(steps[0].description, "The card issuer needs a few more details from you.");
    }

    #[test]
    fn test_everything_done() {
        let signals = ActivationSignals {
            card_status: CardStatus::Active,
            has_card_funds: true,
            ..approved_bridge()
        };
        let steps = build_activation_steps(&signals);
        assert!(is_activation_complete(&steps));
        assert_eq!(find_first_incomplete_step(&steps), None);
        assert!(steps.iter().all(|s| s.action.is_none()));
    }

    fn arb_signals() -> impl Strategy<Value = ActivationSignals> {
        (
            prop::sample::select(vec![CardIssuer::Bridge, CardIssuer::Rain]),
            prop::sample::select(vec![
                KycStatus::NotStarted,
                KycStatus::Incomplete,
                KycStatus::UnderReview,
                KycStatus::Approved,
                KycStatus::Rejected,
            ]),
            prop::sample::select(vec![
                EndorsementStatus::NotStarted,
                EndorsementStatus::Incomplete,
                EndorsementStatus::Approved,
                EndorsementStatus::Revoked,
            ]),
            prop::sample::select(vec![
                RainApplicationStatus::NotStarted,
                RainApplicationStatus::Pending,
                RainApplicationStatus::NeedsInformation,
                RainApplicationStatus::Approved,
                RainApplicationStatus::Denied,
            ]),
            prop::sample::select(vec![
                CardStatus::NotIssued,
                CardStatus::Pending,
                CardStatus::Active,
                CardStatus::Canceled,
            ]),
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(|(issuer, kyc, endorsement, rain, card, funds, blocked)| ActivationSignals {
                issuer,
                kyc_status: kyc,
                cards_endorsement: endorsement,
                rain_status: rain,
                card_status: card,
                has_card_funds: funds,
                card_activation_blocked: blocked,
            })
    }

    proptest! {
        #[test]
        fn prop_only_first_incomplete_step_has_action(signals in arb_signals()) {
            let steps = build_activation_steps(&signals);
            let next = find_first_incomplete_step(&steps);
            for (i, step) in steps.iter().enumerate() {
                if step.is_actionable() {
                    prop_assert_eq!(Some(i), next);
                    prop_assert!(steps[..i].iter().all(|s| s.completed));
                    prop_assert!(!step.completed);
                }
                if step.status == StepStatus::Locked {
                    prop_assert!(steps[..i].iter().any(|s| !s.completed));
                }
            }
        }

        #[test]
        fn prop_completing_previous_step_unlocks_next(signals in arb_signals()) {
            // Funds missing and ordering allowed: step 2 has an action once
            // steps 0 and 1 are done.
            let signals = ActivationSignals {
                kyc_status: KycStatus::Approved,
                cards_endorsement: EndorsementStatus::Approved,
                rain_status: RainApplicationStatus::Approved,
                has_card_funds: false,
                ..signals
            };
            let before = build_activation_steps(&ActivationSignals {
                card_status: CardStatus::NotIssued,
                ..signals
            });
            prop_assert!(!before[2].is_actionable());

            let after = build_activation_steps(&ActivationSignals {
                card_status: CardStatus::Active,
                ..signals
            });
            prop_assert!(after[1].completed);
            prop_assert!(after[2].is_actionable());
        }
    }
}
