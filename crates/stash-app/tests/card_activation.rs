//! Card activation checklist over a user's journey

use stash_app::card::{
    activation_progress, build_activation_steps, find_first_incomplete_step,
    is_activation_complete, ActivationSignals, CardIssuer, CardStatus, RainApplicationStatus,
    StepAction, StepId, StepStatus,
};
use stash_app::customer::{EndorsementStatus, KycStatus};

fn actions(signals: &ActivationSignals) -> Vec<Option<StepAction>> {
    build_activation_steps(signals)
        .into_iter()
        .map(|step| step.action)
        .collect()
}

#[test]
fn bridge_journey_unlocks_one_step_at_a_time() {
    let mut signals = ActivationSignals {
        issuer: CardIssuer::Bridge,
        ..ActivationSignals::default()
    };
    assert_eq!(actions(&signals), vec![Some(StepAction::StartKyc), None, None]);

    signals.kyc_status = KycStatus::UnderReview;
    signals.cards_endorsement = EndorsementStatus::Incomplete;
    let steps = build_activation_steps(&signals);
    assert_eq!(steps[0].status, StepStatus::Pending);
    assert_eq!(steps[1].status, StepStatus::Locked);

    signals.kyc_status = KycStatus::Approved;
    signals.cards_endorsement = EndorsementStatus::Approved;
    assert_eq!(actions(&signals), vec![None, Some(StepAction::OrderCard), None]);

    signals.card_status = CardStatus::Active;
    assert_eq!(actions(&signals), vec![None, None, Some(StepAction::AddFunds)]);
    assert_eq!(activation_progress(&build_activation_steps(&signals)), (2, 3));

    signals.has_card_funds = true;
    let steps = build_activation_steps(&signals);
    assert!(is_activation_complete(&steps));
    assert_eq!(find_first_incomplete_step(&steps), None);
}

#[test]
fn later_signals_do_not_skip_identity() {
    // A funded card from an older program does not bypass KYC.
    let signals = ActivationSignals {
        issuer: CardIssuer::Rain,
        rain_status: RainApplicationStatus::NeedsInformation,
        card_status: CardStatus::Active,
        has_card_funds: true,
        ..ActivationSignals::default()
    };
    let steps = build_activation_steps(&signals);
    assert_eq!(find_first_incomplete_step(&steps), Some(0));
    assert_eq!(steps[0].action, Some(StepAction::ResumeKyc));
    assert!(steps[1].completed && steps[1].action.is_none());
    assert!(steps[2].completed && steps[2].action.is_none());
    assert_eq!(activation_progress(&steps), (2, 3));
}

#[test]
fn blocked_region_cannot_order() {
    let signals = ActivationSignals {
        issuer: CardIssuer::Rain,
        rain_status: RainApplicationStatus::Approved,
        card_activation_blocked: true,
        ..ActivationSignals::default()
    };
    let steps = build_activation_steps(&signals);
    assert_eq!(steps[1].id, StepId::OrderCard);
    assert_eq!(steps[1].status, StepStatus::Blocked);
    assert!(!steps[1].is_actionable());
    assert_eq!(steps[2].status, StepStatus::Locked);
}

#[test]
fn steps_serialize_for_frontends() {
    let steps = build_activation_steps(&ActivationSignals::default());
    let json = serde_json::to_value(&steps).unwrap();
    assert_eq!(json[0]["id"], "complete_kyc");
    assert_eq!(json[0]["status"], "actionable");
    assert_eq!(json[0]["action"], "start_kyc");
    assert_eq!(json[0]["button_text"], "Start verification");
    assert_eq!(json[2]["status"], "locked");
}
