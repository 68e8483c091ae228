//! Bank transfer deposits.
//!
//! From the amount screen the user either lands on the wire instructions
//! (endorsement approved) or is handed off to KYC. Coming back from the
//! provider re-checks the endorsement before creating the transfer.

use super::backend::{
    with_refresh_token, BackendError, BankTransferRequest, BankingBackend, TokenRefresher,
};
use super::busy::BusyFlag;
use super::kyc::request_kyc_handoff;
use super::{properties, WorkflowEnv};
use crate::customer::{endorsement_status, Endorsement, EndorsementStatus};
use crate::errors::AppError;
use crate::flows::deposit::DepositField;
use crate::flows::payload::KycMode;
use crate::flows::{DepositMachine, DepositModal, FlowState};
use crate::views::notifications::Toast;
use std::sync::Arc;

/// Destination used when no token was picked
pub const DEFAULT_DESTINATION_TOKEN: &str = "USDC";
/// Network of [`DEFAULT_DESTINATION_TOKEN`]
pub const DEFAULT_DESTINATION_NETWORK: &str = "base";

/// Result of a bank transfer step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BankTransferOutcome {
    /// Another request is running; nothing done
    Busy,
    /// Wire instructions stored, payment screen shown
    PaymentReady,
    /// KYC hand-off stored, KYC screen shown
    KycRequired,
    /// Verification submitted but not approved yet
    KycPending,
    /// The modal moved on while the request ran; the response was dropped
    Abandoned,
    /// Failure reported through a toast; screen unchanged
    Failed,
}

/// Validate a typed amount: a positive decimal with at most one point.
pub fn parse_amount(raw: &str) -> Result<String, AppError> {
    let amount = raw.trim();
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if amount.is_empty() || !digits_only(whole) || !digits_only(fraction) || amount == "." {
        return Err(AppError::input("amount", "Enter a valid amount"));
    }
    if !amount.chars().any(|c| ('1'..='9').contains(&c)) {
        return Err(AppError::input("amount", "Enter an amount greater than zero"));
    }
    Ok(amount.to_string())
}

/// Bank transfer deposit handlers
pub struct BankTransferWorkflow {
    deposit: DepositMachine,
    backend: Arc<dyn BankingBackend>,
    refresher: Arc<dyn TokenRefresher>,
    env: WorkflowEnv,
    busy: BusyFlag,
}

impl std::fmt::Debug for BankTransferWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BankTransferWorkflow")
            .field("deposit", &self.deposit)
            .field("busy", &self.busy.is_busy())
            .finish_non_exhaustive()
    }
}

impl BankTransferWorkflow {
    /// Handlers driving `deposit`
    pub fn new(
        deposit: DepositMachine,
        backend: Arc<dyn BankingBackend>,
        refresher: Arc<dyn TokenRefresher>,
        env: WorkflowEnv,
    ) -> Self {
        Self {
            deposit,
            backend,
            refresher,
            env,
            busy: BusyFlag::new(),
        }
    }

    /// Whether a request is in flight
    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Continue from the amount screen.
    #[tracing::instrument(skip(self, endorsement), fields(endorsement = endorsement.as_str()))]
    pub async fn submit_amount(
        &self,
        endorsement: Endorsement,
        currency: &str,
        redirect_uri: &str,
    ) -> BankTransferOutcome {
        let Some(_guard) = self.busy.try_acquire() else {
            return BankTransferOutcome::Busy;
        };
        match self.submit(endorsement, currency, redirect_uri).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.env
                    .report_failure("bank_transfer", "Bank transfer unavailable", &err)
                    .await;
                BankTransferOutcome::Failed
            }
        }
    }

    /// Re-check verification after the user returns from the KYC provider.
    #[tracing::instrument(skip(self))]
    pub async fn resume_after_kyc(&self, currency: &str) -> BankTransferOutcome {
        let Some(_guard) = self.busy.try_acquire() else {
            return BankTransferOutcome::Busy;
        };
        match self.resume(currency).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.env
                    .report_failure("bank_transfer", "Bank transfer unavailable", &err)
                    .await;
                BankTransferOutcome::Failed
            }
        }
    }

    async fn submit(
        &self,
        endorsement: Endorsement,
        currency: &str,
        redirect_uri: &str,
    ) -> Result<BankTransferOutcome, AppError> {
        let origin = self.deposit.current();
        parse_amount(&self.deposit.payload().amount)?;

        match self.endorsement_status(endorsement).await? {
            EndorsementStatus::Approved => self.create_transfer(origin, endorsement, currency).await,
            EndorsementStatus::Revoked => Err(revoked(endorsement)),
            _ => {
                let handoff = request_kyc_handoff(
                    self.backend.as_ref(),
                    self.refresher.as_ref(),
                    KycMode::BankTransfer,
                    endorsement,
                    redirect_uri,
                )
                .await?;
                let stored = self.deposit.store().update_if(
                    DepositField::Kyc,
                    |store| store.current_modal() == origin,
                    |p| p.kyc = handoff,
                );
                if stored.is_none() {
                    return Ok(abandoned(origin, self.deposit.current()));
                }
                self.deposit.navigate(DepositModal::OpenBankTransferKyc);
                self.env
                    .analytics
                    .track(
                        "bank_transfer_kyc_started",
                        properties([("endorsement", endorsement.as_str())]),
                    )
                    .await;
                Ok(BankTransferOutcome::KycRequired)
            }
        }
    }

    async fn resume(&self, currency: &str) -> Result<BankTransferOutcome, AppError> {
        let origin = self.deposit.current();
        let kyc = self.deposit.payload().kyc;
        let endorsement = match (kyc.mode, kyc.endorsement) {
            (Some(KycMode::BankTransfer), Some(endorsement)) => endorsement,
            _ => return Err(AppError::input("kyc", "No verification in progress")),
        };

        match self.endorsement_status(endorsement).await? {
            EndorsementStatus::Approved => {
                let outcome = self.create_transfer(origin, endorsement, currency).await?;
                if outcome == BankTransferOutcome::PaymentReady {
                    self.deposit.store().clear_field(DepositField::Kyc);
                }
                Ok(outcome)
            }
            EndorsementStatus::Revoked => Err(revoked(endorsement)),
            _ => {
                self.env
                    .notify(
                        Toast::info("bank_transfer_kyc", "Verification in review")
                            .with_message("We'll let you know once you're approved"),
                    )
                    .await;
                Ok(BankTransferOutcome::KycPending)
            }
        }
    }

    async fn endorsement_status(
        &self,
        endorsement: Endorsement,
    ) -> Result<EndorsementStatus, AppError> {
        let backend = self.backend.as_ref();
        let endorsements =
            with_refresh_token(self.refresher.as_ref(), || backend.get_customer_endorsements())
                .await?;
        Ok(endorsement_status(&endorsements, endorsement))
    }

    async fn create_transfer(
        &self,
        origin: DepositModal,
        endorsement: Endorsement,
        currency: &str,
    ) -> Result<BankTransferOutcome, AppError> {
        let payload = self.deposit.payload();
        let amount = parse_amount(&payload.amount)?;
        let (destination_token, destination_network) = match &payload.selected_token {
            Some(token) => (token.symbol.clone(), token.network.clone()),
            None => (
                DEFAULT_DESTINATION_TOKEN.to_string(),
                DEFAULT_DESTINATION_NETWORK.to_string(),
            ),
        };
        let request = BankTransferRequest {
            endorsement,
            amount,
            currency: currency.to_string(),
            destination_token,
            destination_network,
        };

        let backend = self.backend.as_ref();
        let instructions =
            with_refresh_token(self.refresher.as_ref(), || backend.create_bridge_transfer(&request))
                .await?;

        let transfer_id = instructions.transfer_id.clone();
        let stored = self.deposit.store().update_if(
            DepositField::BankTransfer,
            |store| store.current_modal() == origin,
            |p| p.bank_transfer = Some(instructions),
        );
        if stored.is_none() {
            tracing::warn!(%transfer_id, "transfer created after the deposit modal moved on");
            return Ok(abandoned(origin, self.deposit.current()));
        }
        self.deposit.navigate(DepositModal::OpenBankTransferPayment);
        self.env
            .analytics
            .track(
                "bank_transfer_created",
                properties([
                    ("transfer_id", transfer_id),
                    ("endorsement", endorsement.as_str().to_string()),
                    ("amount", request.amount.clone()),
                    ("currency", request.currency.clone()),
                ]),
            )
            .await;
        Ok(BankTransferOutcome::PaymentReady)
    }
}

fn abandoned(origin: DepositModal, now: DepositModal) -> BankTransferOutcome {
    tracing::debug!(
        origin = origin.name(),
        current = now.name(),
        "bank transfer response dropped"
    );
    BankTransferOutcome::Abandoned
}

fn revoked(endorsement: Endorsement) -> AppError {
    AppError::Backend(BackendError::Unavailable {
        reason: format!("{} endorsement revoked", endorsement.as_str()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::notifications::ToastLevel;
    use crate::workflows::test_support::Harness;

    fn setup() -> (Harness, BankTransferWorkflow) {
        let h = Harness::new();
        let deposit = DepositMachine::new().unwrap();
        deposit.navigate(DepositModal::OpenOptions);
        deposit.navigate(DepositModal::OpenBuyCryptoOptions);
        deposit.navigate(DepositModal::OpenBankTransferAmount);
        let workflow = BankTransferWorkflow::new(
            deposit,
            h.backend.clone(),
            h.refresher.clone(),
            h.env.clone(),
        );
        (h, workflow)
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 25.50 ").unwrap(), "25.50");
        assert_eq!(parse_amount("0.01").unwrap(), "0.01");
        for bad in ["", ".", "0", "0.00", "1,000", "-5", "1.2.3", "abc"] {
            assert!(parse_amount(bad).is_err(), "{bad:?} accepted");
        }
    }

    #[tokio::test]
    async fn test_approved_endorsement_shows_payment() {
        let (h, workflow) = setup();
        h.backend.approve(Endorsement::Sepa);
        workflow.deposit.set_amount("100");

        let outcome = workflow
            .submit_amount(Endorsement::Sepa, "EUR", "stash://deposit")
            .await;
        assert_eq!(outcome, BankTransferOutcome::PaymentReady);
        assert_eq!(workflow.deposit.current(), DepositModal::OpenBankTransferPayment);
        let instructions = workflow.deposit.payload().bank_transfer.unwrap();
        assert_eq!(instructions.amount, "100");
        assert_eq!(h.analytics.names(), vec!["bank_transfer_created"]);
        assert!(!workflow.is_busy());
    }

    #[tokio::test]
    async fn test_kyc_handoff_then_resume() {
        let (h, workflow) = setup();
        *h.backend.kyc_link.lock() = Some("https://kyc.example/s/1".into());
        workflow.deposit.set_amount("40");

        let outcome = workflow
            .submit_amount(Endorsement::Base, "USD", "stash://deposit")
            .await;
        assert_eq!(outcome, BankTransferOutcome::KycRequired);
        assert_eq!(workflow.deposit.current(), DepositModal::OpenBankTransferKyc);
        let kyc = workflow.deposit.payload().kyc;
        assert_eq!(kyc.mode, Some(KycMode::BankTransfer));
        assert_eq!(kyc.link.as_deref(), Some("https://kyc.example/s/1?redirect_uri=stash://deposit"));

        assert_eq!(workflow.resume_after_kyc("USD").await, BankTransferOutcome::KycPending);
        assert_eq!(workflow.deposit.current(), DepositModal::OpenBankTransferKyc);

        h.backend.approve(Endorsement::Base);
        assert_eq!(workflow.resume_after_kyc("USD").await, BankTransferOutcome::PaymentReady);
        assert!(workflow.deposit.payload().kyc.is_empty());
        assert_eq!(workflow.deposit.current(), DepositModal::OpenBankTransferPayment);
    }

    #[tokio::test]
    async fn test_missing_kyc_link_stays_on_amount() {
        let (h, workflow) = setup();
        workflow.deposit.set_amount("40");

        let outcome = workflow
            .submit_amount(Endorsement::Spei, "MXN", "stash://deposit")
            .await;
        assert_eq!(outcome, BankTransferOutcome::Failed);
        assert_eq!(workflow.deposit.current(), DepositModal::OpenBankTransferAmount);
        let toast = h.env.toasts.latest().unwrap();
        assert_eq!(toast.level, ToastLevel::Warning);
        let failed = h.analytics.last_named("bank_transfer_failed").unwrap();
        assert_eq!(failed.properties["error_code"], "KYC_LINK_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_invalid_amount_never_calls_backend() {
        let (h, workflow) = setup();
        workflow.deposit.set_amount("0");
        let outcome = workflow
            .submit_amount(Endorsement::Sepa, "EUR", "stash://deposit")
            .await;
        assert_eq!(outcome, BankTransferOutcome::Failed);
        assert!(h.backend.calls.lock().is_empty());
        assert_eq!(h.env.toasts.latest().unwrap().level, ToastLevel::Info);
    }

    #[tokio::test]
    async fn test_expired_token_refreshed_once() {
        let (h, workflow) = setup();
        h.backend.approve(Endorsement::Sepa);
        *h.backend.expire_once.lock() = true;
        workflow.deposit.set_amount("10");

        let outcome = workflow
            .submit_amount(Endorsement::Sepa, "EUR", "stash://deposit")
            .await;
        assert_eq!(outcome, BankTransferOutcome::PaymentReady);
        assert_eq!(h.refresher.refreshes.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(h.backend.count("get_customer_endorsements"), 2);
    }

    async fn wait_for_call(h: &Harness, call: &str) {
        for _ in 0..100 {
            if h.backend.count(call) > 0 {
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_close_during_transfer_keeps_modal_closed() {
        let (h, workflow) = setup();
        h.backend.approve(Endorsement::Sepa);
        workflow.deposit.set_amount("100");
        let gate = h.backend.hold();

        let submit = workflow.submit_amount(Endorsement::Sepa, "EUR", "stash://deposit");
        let close = async {
            wait_for_call(&h, "create_bridge_transfer").await;
            workflow.deposit.close_now();
            gate.notify_one();
        };
        let (outcome, ()) = tokio::join!(submit, close);

        assert_eq!(outcome, BankTransferOutcome::Abandoned);
        assert!(!workflow.deposit.is_open());
        assert!(workflow.deposit.payload().bank_transfer.is_none());
        assert!(h.analytics.last_named("bank_transfer_created").is_none());
        assert!(!workflow.is_busy());
    }

    #[tokio::test]
    async fn test_close_during_kyc_handoff_keeps_modal_closed() {
        let (h, workflow) = setup();
        *h.backend.kyc_link.lock() = Some("https://kyc.example/s/1".into());
        workflow.deposit.set_amount("40");
        let gate = h.backend.hold();

        let submit = workflow.submit_amount(Endorsement::Base, "USD", "stash://deposit");
        let close = async {
            wait_for_call(&h, "get_kyc_link").await;
            workflow.deposit.close_now();
            gate.notify_one();
        };
        let (outcome, ()) = tokio::join!(submit, close);

        assert_eq!(outcome, BankTransferOutcome::Abandoned);
        assert!(!workflow.deposit.is_open());
        assert!(workflow.deposit.payload().kyc.is_empty());
        assert!(h.analytics.last_named("bank_transfer_kyc_started").is_none());
    }

    #[tokio::test]
    async fn test_busy_while_running() {
        let (h, workflow) = setup();
        h.backend.approve(Endorsement::Sepa);
        workflow.deposit.set_amount("10");

        let _held = workflow.busy.try_acquire().unwrap();
        let outcome = workflow
            .submit_amount(Endorsement::Sepa, "EUR", "stash://deposit")
            .await;
        assert_eq!(outcome, BankTransferOutcome::Busy);
        assert!(h.backend.calls.lock().is_empty());
        assert!(workflow.deposit.current().number() > 0);
    }
}
