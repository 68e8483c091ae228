//! Direct deposit sessions.
//!
//! Opening a session stores it in the deposit payload and starts a polling
//! task. The task refreshes the session every interval until its status is
//! terminal. Dropping the [`PollHandle`] stops polling, which is how a
//! screen going away cancels it.

use super::backend::{with_refresh_token, BankingBackend, TokenRefresher};
use super::busy::BusyFlag;
use super::{properties, WorkflowEnv};
use crate::errors::AppError;
use crate::flows::deposit::{DepositField, DepositPayload};
use crate::flows::payload::{DirectDepositSession, DirectDepositStatus};
use crate::flows::{DepositMachine, DepositModal};
use crate::views::notifications::Toast;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Consecutive poll failures before polling gives up
pub const MAX_CONSECUTIVE_POLL_FAILURES: u32 = 3;

/// Running poll task; aborted on drop.
#[derive(Debug)]
pub struct PollHandle {
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Whether polling has stopped on its own
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for polling to stop on its own.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::warn!(error = %err, "direct deposit poll task ended abnormally");
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Direct deposit handlers
#[derive(Clone)]
pub struct DirectDepositWorkflow {
    deposit: DepositMachine,
    backend: Arc<dyn BankingBackend>,
    refresher: Arc<dyn TokenRefresher>,
    env: WorkflowEnv,
    busy: BusyFlag,
    poll_interval_ms: u64,
}

impl std::fmt::Debug for DirectDepositWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectDepositWorkflow")
            .field("deposit", &self.deposit)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .finish_non_exhaustive()
    }
}

impl DirectDepositWorkflow {
    /// Handlers driving `deposit`, polling every `poll_interval_ms`
    pub fn new(
        deposit: DepositMachine,
        backend: Arc<dyn BankingBackend>,
        refresher: Arc<dyn TokenRefresher>,
        env: WorkflowEnv,
        poll_interval_ms: u64,
    ) -> Self {
        Self {
            deposit,
            backend,
            refresher,
            env,
            busy: BusyFlag::new(),
            poll_interval_ms,
        }
    }

    /// Create a session on `network`, show it and start polling.
    ///
    /// Returns `None` when another request is running or creation failed;
    /// failures are reported through a toast.
    #[tracing::instrument(skip(self))]
    pub async fn open_session(&self, network: &str) -> Option<PollHandle> {
        let _guard = self.busy.try_acquire()?;
        let origin = self.deposit.current();

        let backend = self.backend.as_ref();
        let created = with_refresh_token(self.refresher.as_ref(), || {
            backend.create_direct_deposit_session(network)
        })
        .await;

        match created {
            Ok(session) => {
                let session_id = session.id.clone();
                let stored = self.deposit.store().update_if(
                    DepositField::DirectDeposit,
                    |store| store.current_modal() == origin,
                    |p| p.direct_deposit = Some(session),
                );
                if stored.is_none() {
                    tracing::debug!(%session_id, "deposit modal moved on, session dropped");
                    return None;
                }
                self.deposit.navigate(DepositModal::OpenDirectDeposit);
                self.env
                    .analytics
                    .track(
                        "direct_deposit_session_created",
                        properties([("session_id", session_id.as_str()), ("network", network)]),
                    )
                    .await;
                Some(self.start_polling(session_id))
            }
            Err(err) => {
                self.env
                    .report_failure(
                        "direct_deposit",
                        "Could not start direct deposit",
                        &AppError::from(err),
                    )
                    .await;
                None
            }
        }
    }

    /// Poll `session_id` on a background task.
    pub fn start_polling(&self, session_id: String) -> PollHandle {
        let workflow = self.clone();
        let task = tokio::spawn(async move { workflow.poll(session_id).await });
        PollHandle { task: Some(task) }
    }

    async fn poll(self, session_id: String) {
        let mut failures = 0u32;
        loop {
            if let Err(err) = self.env.time.sleep_ms(self.poll_interval_ms).await {
                tracing::warn!(error = %err, "poll timer failed");
                return;
            }

            // A reset or a newer session ends this poller.
            if !shows_session(&self.deposit.payload(), &session_id) {
                tracing::debug!(%session_id, "session no longer shown, polling stopped");
                return;
            }

            let backend = self.backend.as_ref();
            let fetched = with_refresh_token(self.refresher.as_ref(), || {
                backend.get_direct_deposit_session(&session_id)
            })
            .await;

            match fetched {
                Ok(session) => {
                    failures = 0;
                    let status = session.status;
                    let finished = session.clone();
                    let stored = self.deposit.store().update_if(
                        DepositField::DirectDeposit,
                        |store| shows_session(store.payload(), &session_id),
                        |p| p.direct_deposit = Some(session),
                    );
                    if stored.is_none() {
                        tracing::debug!(%session_id, "session closed during poll, result dropped");
                        return;
                    }
                    if status.is_terminal() {
                        self.finish(&finished).await;
                        return;
                    }
                }
                Err(err) => {
                    failures += 1;
                    tracing::warn!(%session_id, failures, error = %err, "direct deposit poll failed");
                    if failures >= MAX_CONSECUTIVE_POLL_FAILURES {
                        self.env
                            .report_failure(
                                "direct_deposit_poll",
                                "Lost track of your deposit",
                                &AppError::from(err),
                            )
                            .await;
                        return;
                    }
                }
            }
        }
    }

    async fn finish(&self, session: &DirectDepositSession) {
        let status = match session.status {
            DirectDepositStatus::Completed => "completed",
            DirectDepositStatus::Expired => "expired",
            _ => "failed",
        };
        tracing::debug!(session_id = %session.id, status, "direct deposit finished");

        let toast = match session.status {
            DirectDepositStatus::Completed => Toast::success("direct_deposit", "Deposit received"),
            DirectDepositStatus::Expired => {
                Toast::warning("direct_deposit", "Deposit session expired")
                    .with_message("Start a new session to deposit")
            }
            _ => Toast::error("direct_deposit", "Deposit failed"),
        };
        self.env.notify(toast).await;

        let mut props = properties([("session_id", session.id.as_str())]);
        if let Some(amount) = &session.amount_received {
            props.insert("amount".to_string(), amount.clone());
        }
        self.env
            .analytics
            .track(&format!("direct_deposit_session_{status}"), props)
            .await;
    }
}

fn shows_session(payload: &DepositPayload, session_id: &str) -> bool {
    payload
        .direct_deposit
        .as_ref()
        .is_some_and(|s| s.id == session_id)
}
