//! # Card Issuer Strategies
//!
//! The identity step of card activation differs per issuer: Bridge gates on
//! the `cards` endorsement, Rain on its own application review. Each issuer
//! is a strategy selected once through [`strategy_for`]; the step builder
//! never branches on the issuer itself.

use super::status::{ActivationSignals, CardIssuer, RainApplicationStatus};
use super::steps::StepAction;
use crate::customer::EndorsementStatus;

/// Issuer-specific behavior of the "Complete KYC" step.
pub trait CardIssuerStrategy: Send + Sync {
    /// Issuer this strategy implements
    fn issuer(&self) -> CardIssuer;

    /// Step description for the current signals
    fn description(&self, signals: &ActivationSignals) -> &'static str;

    /// Button label, if the step has a button in this state
    fn button_text(&self, signals: &ActivationSignals) -> Option<&'static str>;

    /// Whether identity verification is done for this issuer
    fn is_complete(&self, signals: &ActivationSignals) -> bool;

    /// Action the button triggers
    fn action(&self, signals: &ActivationSignals) -> Option<StepAction>;
}

/// Bridge: KYC completes when the `cards` endorsement is approved.
#[derive(Debug, Clone, Copy, Default)]
pub struct BridgeIssuer;

impl CardIssuerStrategy for BridgeIssuer {
    fn issuer(&self) -> CardIssuer {
        CardIssuer::Bridge
    }

    fn description(&self, signals: &ActivationSignals) -> &'static str {
        if self.is_complete(signals) {
            return "Identity verified";
        }
        if signals.cards_endorsement == EndorsementStatus::Revoked || signals.kyc_status.needs_support() {
            return "We could not verify your identity. Contact support to continue.";
        }
        if signals.kyc_status.is_in_review() {
            return "Your verification is being reviewed. This usually takes a few minutes.";
        }
        if signals.cards_endorsement == EndorsementStatus::Incomplete {
            return "Finish verifying your identity to unlock your card.";
        }
        "Verify your identity to get a card."
    }

    fn button_text(&self, signals: &ActivationSignals) -> Option<&'static str> {
        self.action(signals).map(StepAction::label)
    }

    fn is_complete(&self, signals: &ActivationSignals) -> bool {
        signals.cards_endorsement == EndorsementStatus::Approved
    }

    fn action(&self, signals: &ActivationSignals) -> Option<StepAction> {
        if self.is_complete(signals) {
            return None;
        }
        if signals.cards_endorsement == EndorsementStatus::Revoked || signals.kyc_status.needs_support() {
            return Some(StepAction::ContactSupport);
        }
        if signals.kyc_status.is_in_review() {
            return None;
        }
        if signals.cards_endorsement == EndorsementStatus::Incomplete {
            return Some(StepAction::ResumeKyc);
        }
        Some(StepAction::StartKyc)
    }
}

/// Rain: KYC completes when the Rain application is approved.
#[derive(Debug, Clone, Copy, Default)]
pub struct RainIssuer;

impl CardIssuerStrategy for RainIssuer {
    fn issuer(&self) -> CardIssuer {
        CardIssuer::Rain
    }

    fn description(&self, signals: &ActivationSignals) -> &'static str {
        let status = signals.rain_status;
        if self.is_complete(signals) {
            "Application approved"
        } else if status.needs_support() {
            "Your card application was not approved. Contact support for help."
        } else if status.is_in_review() {
            "Your card application is under review."
        } else if status.needs_user_input() {
            "The card issuer needs a few more details from you."
        } else {
            "Apply for your card with a quick identity check."
        }
    }

    fn button_text(&self, signals: &ActivationSignals) -> Option<&'static str> {
        self.action(signals).map(StepAction::label)
    }

    fn is_complete(&self, signals: &ActivationSignals) -> bool {
        signals.rain_status == RainApplicationStatus::Approved
    }

    fn action(&self, signals: &ActivationSignals) -> Option<StepAction> {
        let status = signals.rain_status;
        if self.is_complete(signals) || status.is_in_review() {
            None
        } else if status.needs_support() {
            Some(StepAction::ContactSupport)
        } else if status.needs_user_input() {
            Some(StepAction::ResumeKyc)
        } else {
            Some(StepAction::StartKyc)
        }
    }
}

static BRIDGE: BridgeIssuer = BridgeIssuer;
static RAIN: RainIssuer = RainIssuer;

/// Strategy for `issuer`
pub fn strategy_for(issuer: CardIssuer) -> &'static dyn CardIssuerStrategy {
    match issuer {
        CardIssuer::Bridge => &BRIDGE,
        CardIssuer::Rain => &RAIN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer::KycStatus;

    #[test]
    fn test_bridge_button_progression() {
        let bridge = strategy_for(CardIssuer::Bridge);
        let mut signals = ActivationSignals::default();
        assert_eq!(bridge.action(&signals), Some(StepAction::StartKyc));

        signals.cards_endorsement = EndorsementStatus::Incomplete;
        assert_eq!(bridge.action(&signals), Some(StepAction::ResumeKyc));

        signals.kyc_status = KycStatus::UnderReview;
        assert_eq!(bridge.button_text(&signals), None);

        signals.cards_endorsement = EndorsementStatus::Approved;
        assert!(bridge.is_complete(&signals));
        assert_eq!(bridge.description(&signals), "Identity verified");
    }

    #[test]
    fn test_rain_ignores_bridge_endorsement() {
        let rain = strategy_for(CardIssuer::Rain);
        let signals = ActivationSignals {
            issuer: CardIssuer::Rain,
            cards_endorsement: EndorsementStatus::Approved,
            ..ActivationSignals::default()
        };
        assert!(!rain.is_complete(&signals));

        let denied = ActivationSignals {
            rain_status: RainApplicationStatus::Denied,
            ..signals
        };
        assert_eq!(rain.action(&denied), Some(StepAction::ContactSupport));
        assert_eq!(rain.button_text(&denied), Some("Contact support"));
    }
}
