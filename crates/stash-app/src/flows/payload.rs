//! Value types shared by several flow payloads.

use crate::customer::Endorsement;
use serde::{Deserialize, Serialize};

/// Token picked in a selector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSelection {
    /// Ticker symbol
    pub symbol: String,
    /// Network the token lives on
    pub network: String,
    /// Contract address (empty for native assets)
    pub contract_address: String,
    /// Decimals
    pub decimals: u8,
}

/// Bank wire instructions returned when a transfer is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransferInstructions {
    /// Backend transfer id
    pub transfer_id: String,
    /// Beneficiary bank name
    pub bank_name: String,
    /// Beneficiary name
    pub beneficiary_name: String,
    /// Account number or IBAN
    pub account_number: String,
    /// Routing number or BIC
    pub routing_code: String,
    /// Payment reference the user must include
    pub reference: String,
    /// Amount as entered
    pub amount: String,
    /// Fiat currency code
    pub currency: String,
}

/// Server-determined state of a direct deposit session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectDepositStatus {
    /// Waiting for funds at the deposit address
    AwaitingFunds,
    /// Funds seen, settling
    Processing,
    /// Deposit credited
    Completed,
    /// Session expired without funds
    Expired,
    /// Deposit failed
    Failed,
}

impl DirectDepositStatus {
    /// Whether polling can stop
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Expired | Self::Failed)
    }
}

/// Direct deposit session descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectDepositSession {
    /// Session id
    pub id: String,
    /// Deposit address for this session
    pub deposit_address: String,
    /// Network of the deposit address
    pub network: String,
    /// Current status
    pub status: DirectDepositStatus,
    /// Amount received so far, if any
    #[serde(default)]
    pub amount_received: Option<String>,
}

/// Which product a KYC hand-off was started for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycMode {
    /// Bank transfer deposit
    BankTransfer,
    /// Card activation
    Card,
}

/// Context kept while the user is away at the KYC provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycHandoff {
    /// Product the hand-off was started for
    pub mode: Option<KycMode>,
    /// Endorsement being requested
    pub endorsement: Option<Endorsement>,
    /// Provider-hosted session URL
    pub link: Option<String>,
    /// Where the provider sends the user back to
    pub redirect_uri: Option<String>,
}

impl KycHandoff {
    /// Whether no hand-off is in progress
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
