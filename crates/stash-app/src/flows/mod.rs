//! # Modal Flows
//!
//! Multi-step modal wizards (deposit, send, withdraw, card deposit) built on
//! one engine:
//!
//! - [`FlowState`]: ordinal-tagged state enumeration per flow
//! - [`FlowRegistry`]: titles, views and the validated back-target table
//! - [`FlowStore`] / [`FlowHandle`]: current/previous modal plus payload
//! - [`FlowMachine`]: back presses, open/close requests and close policies
//!
//! [`FlowSet`] owns one machine per flow and is built once at startup, so a
//! broken state table fails fast instead of misrouting a back press later.

pub mod card_deposit;
pub mod content;
pub mod controller;
pub mod deposit;
pub mod payload;
pub mod registry;
pub mod send;
pub mod state;
pub mod store;
pub mod withdraw;

pub use card_deposit::{CardDepositFlow, CardDepositMachine, CardDepositModal};
pub use content::ContentResolver;
pub use controller::{CloseDecision, FlowMachine, FlowSpec, Navigation};
pub use deposit::{DepositFlow, DepositMachine, DepositModal, WalletConnection, WalletConnectionStatus};
pub use registry::{BackTarget, FlowRegistry, RegistryError};
pub use send::{SendFlow, SendMachine, SendModal};
pub use state::{is_forward, should_animate, FlowState, ModalState, ModalTransition, CLOSE};
pub use store::{FieldRules, FlowHandle, FlowPayload, FlowStore};
pub use withdraw::{WithdrawFlow, WithdrawMachine, WithdrawModal};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The flows this core drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    /// Deposit into savings
    Deposit,
    /// Send to another address
    Send,
    /// Withdraw from savings
    Withdraw,
    /// Top up the card
    CardDeposit,
}

impl FlowKind {
    /// All flows
    pub const ALL: [FlowKind; 4] = [
        FlowKind::Deposit,
        FlowKind::Send,
        FlowKind::Withdraw,
        FlowKind::CardDeposit,
    ];

    /// Flow name used in logs and on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            FlowKind::Deposit => DepositFlow::NAME,
            FlowKind::Send => SendFlow::NAME,
            FlowKind::Withdraw => WithdrawFlow::NAME,
            FlowKind::CardDeposit => CardDepositFlow::NAME,
        }
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        FlowKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("unknown flow: {s}"))
    }
}

/// One machine per flow, each over its own shared store.
#[derive(Clone, Debug)]
pub struct FlowSet {
    /// Deposit flow
    pub deposit: DepositMachine,
    /// Send flow
    pub send: SendMachine,
    /// Withdraw flow
    pub withdraw: WithdrawMachine,
    /// Card deposit flow
    pub card_deposit: CardDepositMachine,
}

impl FlowSet {
    /// Build and validate every flow registry.
    pub fn new() -> Result<Self, RegistryError> {
        let set = Self {
            deposit: DepositMachine::new()?,
            send: SendMachine::new()?,
            withdraw: WithdrawMachine::new()?,
            card_deposit: CardDepositMachine::new()?,
        };
        tracing::info!(flows = FlowKind::ALL.len(), "flow registries validated");
        Ok(set)
    }

    /// Whether any modal is currently open
    pub fn any_open(&self) -> bool {
        self.deposit.is_open()
            || self.send.is_open()
            || self.withdraw.is_open()
            || self.card_deposit.is_open()
    }

    /// Force-close every flow and clear all payloads (sign-out).
    pub fn close_all(&self) {
        self.deposit.close_now();
        self.send.close_now();
        self.withdraw.close_now();
        self.card_deposit.close_now();
    }
}
