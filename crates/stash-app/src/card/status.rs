//! External status signals that drive card activation.

use crate::customer::{EndorsementStatus, KycStatus};
use serde::{Deserialize, Serialize};

/// Card program application status reported by the Rain issuer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RainApplicationStatus {
    /// No application submitted
    #[default]
    NotStarted,
    /// Submitted, awaiting automated checks
    Pending,
    /// Escalated to manual review
    ManualReview,
    /// Issuer needs more information from the user
    NeedsInformation,
    /// Issuer needs the identity check redone
    NeedsVerification,
    /// Approved for a card
    Approved,
    /// Denied
    Denied,
    /// Locked by the issuer
    Locked,
    /// Canceled by the user or issuer
    Canceled,
    /// Status this build does not know about
    #[serde(other)]
    Unknown,
}

impl RainApplicationStatus {
    /// Whether the user can continue the application themselves.
    pub fn needs_user_input(self) -> bool {
        matches!(self, Self::NeedsInformation | Self::NeedsVerification)
    }

    /// Whether the application waits on the issuer.
    pub fn is_in_review(self) -> bool {
        matches!(self, Self::Pending | Self::ManualReview)
    }

    /// Whether only support can move the application forward.
    pub fn needs_support(self) -> bool {
        matches!(self, Self::Denied | Self::Locked | Self::Canceled)
    }
}

/// Lifecycle of the user's card.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    /// No card ordered
    #[default]
    NotIssued,
    /// Ordered, not yet usable
    Pending,
    /// Usable
    Active,
    /// Temporarily frozen by the user
    Frozen,
    /// Permanently canceled
    Canceled,
}

impl CardStatus {
    /// Whether a card exists for the user (frozen cards still count).
    pub fn is_issued(self) -> bool {
        matches!(self, Self::Active | Self::Frozen)
    }
}

/// Card program provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardIssuer {
    /// Bridge cards, gated by the `cards` endorsement
    #[default]
    Bridge,
    /// Rain cards, gated by the Rain application
    Rain,
}

/// Everything the step builder reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationSignals {
    /// Active card issuer
    pub issuer: CardIssuer,
    /// Identity verification status
    pub kyc_status: KycStatus,
    /// Status of the `cards` endorsement (Bridge)
    pub cards_endorsement: EndorsementStatus,
    /// Rain application status
    pub rain_status: RainApplicationStatus,
    /// Card lifecycle
    pub card_status: CardStatus,
    /// Whether the card balance is non-zero
    pub has_card_funds: bool,
    /// Card ordering disabled for this user or region
    pub card_activation_blocked: bool,
}
