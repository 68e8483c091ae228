//! Scripted collaborators for workflow unit tests.

use super::analytics::RecordingAnalytics;
use super::backend::{BackendError, BankTransferRequest, BankingBackend, TokenRefresher};
use super::WorkflowEnv;
use crate::customer::{CustomerEndorsement, Endorsement, EndorsementStatus};
use crate::flows::payload::{BankTransferInstructions, DirectDepositSession, DirectDepositStatus};
use async_trait::async_trait;
use parking_lot::Mutex;
use stash_effects::SimulatedTimeHandler;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

pub(crate) fn instructions(amount: &str) -> BankTransferInstructions {
    BankTransferInstructions {
        transfer_id: "tr_1".into(),
        bank_name: "Lead Bank".into(),
        beneficiary_name: "Stash Inc".into(),
        account_number: "DE89370400440532013000".into(),
        routing_code: "COBADEFFXXX".into(),
        reference: "STASH-42".into(),
        amount: amount.into(),
        currency: "EUR".into(),
    }
}

pub(crate) fn session(status: DirectDepositStatus) -> DirectDepositSession {
    DirectDepositSession {
        id: "dd_1".into(),
        deposit_address: "0xabc".into(),
        network: "base".into(),
        status,
        amount_received: (status == DirectDepositStatus::Completed).then(|| "25".to_string()),
    }
}

#[derive(Default)]
pub(crate) struct ScriptedBackend {
    pub endorsements: Mutex<Vec<CustomerEndorsement>>,
    pub kyc_link: Mutex<Option<String>>,
    pub transfer_error: Mutex<Option<BackendError>>,
    pub session_error: Mutex<Option<BackendError>>,
    pub poll_results: Mutex<VecDeque<Result<DirectDepositSession, BackendError>>>,
    pub expire_once: Mutex<bool>,
    pub calls: Mutex<Vec<&'static str>>,
    pub gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn approve(&self, endorsement: Endorsement) {
        self.endorsements.lock().push(CustomerEndorsement {
            name: endorsement,
            status: EndorsementStatus::Approved,
        });
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }

    /// Hold transfer, KYC link and poll calls until the returned gate is
    /// notified. The call is counted before it blocks.
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    async fn pass_gate(&self) {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn record(&self, call: &'static str) -> Result<(), BackendError> {
        self.calls.lock().push(call);
        let mut expire = self.expire_once.lock();
        if *expire {
            *expire = false;
            return Err(BackendError::AuthExpired);
        }
        Ok(())
    }
}

#[async_trait]
impl BankingBackend for ScriptedBackend {
    async fn get_customer_endorsements(&self) -> Result<Vec<CustomerEndorsement>, BackendError> {
        self.record("get_customer_endorsements")?;
        Ok(self.endorsements.lock().clone())
    }

    async fn get_kyc_link(
        &self,
        _endorsement: Endorsement,
        redirect_uri: &str,
    ) -> Result<Option<String>, BackendError> {
        self.record("get_kyc_link")?;
        self.pass_gate().await;
        Ok(self
            .kyc_link
            .lock()
            .as_ref()
            .map(|link| format!("{link}?redirect_uri={redirect_uri}")))
    }

    async fn create_bridge_transfer(
        &self,
        request: &BankTransferRequest,
    ) -> Result<BankTransferInstructions, BackendError> {
        self.record("create_bridge_transfer")?;
        self.pass_gate().await;
        match self.transfer_error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(instructions(&request.amount)),
        }
    }

    async fn create_direct_deposit_session(
        &self,
        _network: &str,
    ) -> Result<DirectDepositSession, BackendError> {
        self.record("create_direct_deposit_session")?;
        match self.session_error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(session(DirectDepositStatus::AwaitingFunds)),
        }
    }

    async fn get_direct_deposit_session(
        &self,
        _session_id: &str,
    ) -> Result<DirectDepositSession, BackendError> {
        self.record("get_direct_deposit_session")?;
        self.pass_gate().await;
        let mut results = self.poll_results.lock();
        match results.len() {
            0 => Ok(session(DirectDepositStatus::AwaitingFunds)),
            1 => results.front().cloned().unwrap_or_else(|| Err(BackendError::network("empty"))),
            _ => results.pop_front().unwrap_or_else(|| Err(BackendError::network("empty"))),
        }
    }
}

#[derive(Default)]
pub(crate) struct CountingRefresher {
    pub refreshes: AtomicUsize,
}

#[async_trait]
impl TokenRefresher for CountingRefresher {
    async fn refresh_token(&self) -> Result<(), BackendError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) struct Harness {
    pub env: WorkflowEnv,
    pub analytics: RecordingAnalytics,
    pub time: SimulatedTimeHandler,
    pub backend: Arc<ScriptedBackend>,
    pub refresher: Arc<CountingRefresher>,
}

impl Harness {
    pub fn new() -> Self {
        let analytics = RecordingAnalytics::new();
        let time = SimulatedTimeHandler::new(1_000_000);
        Self {
            env: WorkflowEnv::new(Arc::new(analytics.clone()), Arc::new(time.clone())),
            analytics,
            time,
            backend: ScriptedBackend::new(),
            refresher: Arc::new(CountingRefresher::default()),
        }
    }
}
