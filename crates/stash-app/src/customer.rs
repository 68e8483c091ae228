//! Customer verification status as reported by the banking backend.
//!
//! These enums mirror the backend's status strings. Unknown strings from a
//! newer backend deserialize to the `Unknown` variant instead of failing.

use serde::{Deserialize, Serialize};

/// Identity verification status of the customer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    /// No verification started
    #[default]
    NotStarted,
    /// Started but not submitted
    Incomplete,
    /// Submitted and awaiting review
    UnderReview,
    /// Waiting on beneficial owner documents
    AwaitingUbo,
    /// Verified
    Approved,
    /// Verification failed
    Rejected,
    /// Paused by compliance
    Paused,
    /// Account offboarded
    Offboarded,
    /// Status added by a newer backend
    #[serde(other)]
    Unknown,
}

impl KycStatus {
    /// Submitted and waiting on the provider
    pub fn is_in_review(self) -> bool {
        matches!(self, Self::UnderReview | Self::AwaitingUbo)
    }

    /// Requires manual support involvement
    pub fn needs_support(self) -> bool {
        matches!(self, Self::Rejected | Self::Paused | Self::Offboarded)
    }
}

/// Product or payment rail gated by an endorsement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endorsement {
    /// US bank transfers (ACH / wire)
    Base,
    /// EUR bank transfers
    Sepa,
    /// MXN bank transfers
    Spei,
    /// Card issuing
    Cards,
}

impl Endorsement {
    /// Backend name of the endorsement
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Sepa => "sepa",
            Self::Spei => "spei",
            Self::Cards => "cards",
        }
    }
}

/// Approval state of one endorsement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndorsementStatus {
    /// Never requested
    #[default]
    NotStarted,
    /// Requested, not yet approved
    Incomplete,
    /// Approved
    Approved,
    /// Revoked by compliance
    Revoked,
    /// Status added by a newer backend
    #[serde(other)]
    Unknown,
}

/// One endorsement row from `get_customer_endorsements`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerEndorsement {
    /// Endorsement name
    pub name: Endorsement,
    /// Approval state
    pub status: EndorsementStatus,
}

/// Status of `endorsement` in `endorsements`, `NotStarted` when absent.
pub fn endorsement_status(
    endorsements: &[CustomerEndorsement],
    endorsement: Endorsement,
) -> EndorsementStatus {
    endorsements
        .iter()
        .find(|e| e.name == endorsement)
        .map(|e| e.status)
        .unwrap_or_default()
}
