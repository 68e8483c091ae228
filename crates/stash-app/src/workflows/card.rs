//! Card activation step actions.

use super::backend::{BankingBackend, TokenRefresher};
use super::busy::BusyFlag;
use super::kyc::request_kyc_handoff;
use super::{properties, Properties, WorkflowEnv};
use crate::card::StepAction;
use crate::customer::Endorsement;
use crate::flows::payload::{KycHandoff, KycMode};
use crate::flows::{CardDepositMachine, Navigation, WalletConnection};
use std::sync::Arc;

/// What the host does after a step button was pressed
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivationEffect {
    /// Open the KYC provider session
    OpenKyc(KycHandoff),
    /// Open the support channel
    ContactSupport,
    /// Show the card order screen
    OrderCard,
    /// The card-deposit modal was opened
    CardDepositOpened,
    /// Another request is running
    Busy,
    /// Failure reported through a toast
    Failed,
}

/// Runs the actions behind card activation step buttons
pub struct CardActivationWorkflow {
    card_deposit: CardDepositMachine,
    backend: Arc<dyn BankingBackend>,
    refresher: Arc<dyn TokenRefresher>,
    env: WorkflowEnv,
    busy: BusyFlag,
}

impl std::fmt::Debug for CardActivationWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardActivationWorkflow")
            .field("card_deposit", &self.card_deposit)
            .finish_non_exhaustive()
    }
}

impl CardActivationWorkflow {
    /// Workflow opening `card_deposit` for the add-funds step
    pub fn new(
        card_deposit: CardDepositMachine,
        backend: Arc<dyn BankingBackend>,
        refresher: Arc<dyn TokenRefresher>,
        env: WorkflowEnv,
    ) -> Self {
        Self {
            card_deposit,
            backend,
            refresher,
            env,
            busy: BusyFlag::new(),
        }
    }

    /// Run `action`; `redirect_uri` is where the KYC provider returns to.
    #[tracing::instrument(skip(self))]
    pub async fn perform(&self, action: StepAction, redirect_uri: &str) -> ActivationEffect {
        let event = match action {
            StepAction::StartKyc | StepAction::ResumeKyc => {
                return self.open_kyc(action, redirect_uri).await;
            }
            StepAction::ContactSupport => "card_support_requested",
            StepAction::OrderCard => "card_order_started",
            StepAction::AddFunds => "card_add_funds_started",
        };
        self.env.analytics.track(event, Properties::new()).await;

        match action {
            StepAction::ContactSupport => ActivationEffect::ContactSupport,
            StepAction::OrderCard => ActivationEffect::OrderCard,
            _ => match self
                .card_deposit
                .handle_open_change(true, &WalletConnection::default())
            {
                Navigation::Moved(_) | Navigation::Unchanged => ActivationEffect::CardDepositOpened,
                other => {
                    tracing::warn!(?other, "card deposit did not open");
                    ActivationEffect::Failed
                }
            },
        }
    }

    async fn open_kyc(&self, action: StepAction, redirect_uri: &str) -> ActivationEffect {
        let Some(_guard) = self.busy.try_acquire() else {
            return ActivationEffect::Busy;
        };
        let handoff = request_kyc_handoff(
            self.backend.as_ref(),
            self.refresher.as_ref(),
            KycMode::Card,
            Endorsement::Cards,
            redirect_uri,
        )
        .await;

        match handoff {
            Ok(handoff) => {
                let resumed = if action == StepAction::ResumeKyc { "true" } else { "false" };
                self.env
                    .analytics
                    .track("card_kyc_started", properties([("resumed", resumed)]))
                    .await;
                ActivationEffect::OpenKyc(handoff)
            }
            Err(err) => {
                self.env
                    .report_failure("card_kyc", "Verification unavailable", &err)
                    .await;
                ActivationEffect::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::CardDepositModal;
    use crate::workflows::test_support::Harness;

    fn workflow(h: &Harness) -> CardActivationWorkflow {
        CardActivationWorkflow::new(
            CardDepositMachine::new().unwrap(),
            h.backend.clone(),
            h.refresher.clone(),
            h.env.clone(),
        )
    }

    #[tokio::test]
    async fn test_kyc_action_returns_handoff() {
        let h = Harness::new();
        *h.backend.kyc_link.lock() = Some("https://kyc.example/card".into());
        let effect = workflow(&h)
            .perform(StepAction::StartKyc, "stash://card")
            .await;

        let handoff = match effect {
            ActivationEffect::OpenKyc(handoff) => handoff,
            other => panic!("expected kyc hand-off, got {other:?}"),
        };
        assert_eq!(handoff.mode, Some(KycMode::Card));
        assert_eq!(handoff.endorsement, Some(Endorsement::Cards));
        assert_eq!(h.analytics.last_named("card_kyc_started").unwrap().properties["resumed"], "false");
    }

    #[tokio::test]
    async fn test_missing_link_reports_failure() {
        let h = Harness::new();
        let effect = workflow(&h)
            .perform(StepAction::ResumeKyc, "stash://card")
            .await;
        assert_eq!(effect, ActivationEffect::Failed);
        assert!(h.analytics.last_named("card_kyc_failed").is_some());
    }

    #[tokio::test]
    async fn test_add_funds_opens_card_deposit() {
        let h = Harness::new();
        let workflow = workflow(&h);
        let effect = workflow.perform(StepAction::AddFunds, "stash://card").await;
        assert_eq!(effect, ActivationEffect::CardDepositOpened);
        assert_eq!(workflow.card_deposit.current(), CardDepositModal::OpenOptions);

        assert_eq!(
            workflow.perform(StepAction::OrderCard, "stash://card").await,
            ActivationEffect::OrderCard
        );
        assert_eq!(
            h.analytics.names(),
            vec!["card_add_funds_started", "card_order_started"]
        );
    }
}
