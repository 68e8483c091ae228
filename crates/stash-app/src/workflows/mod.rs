//! # Workflows
//!
//! Async handlers behind the flow screens. Each handler:
//!
//! - takes its [`BusyFlag`] on entry and drops repeated presses
//! - calls the backend through [`with_refresh_token`]
//! - writes results into the flow payload and navigates forward
//! - on failure pushes a toast, emits `<operation>_failed` and stays put
//!
//! Nothing here returns an error to the view layer; outcomes are reported as
//! plain enums.

pub mod analytics;
pub mod backend;
pub mod bank_transfer;
pub mod busy;
pub mod card;
pub mod card_access;
pub mod direct_deposit;
pub mod kyc;
pub mod wallet;

#[cfg(test)]
mod test_support;

pub use analytics::{
    properties, AnalyticsSink, AttributedAnalytics, Properties, RecordingAnalytics,
    TracingAnalytics, TrackedEvent,
};
pub use backend::{
    with_refresh_token, BackendError, BankTransferRequest, BankingBackend, CardBackend,
    CountryLookup, TokenRefresher,
};
pub use bank_transfer::{BankTransferOutcome, BankTransferWorkflow};
pub use busy::{BusyFlag, BusyGuard};
pub use card::{ActivationEffect, CardActivationWorkflow};
pub use card_access::{CardAccess, CardAccessWorkflow};
pub use direct_deposit::{DirectDepositWorkflow, PollHandle};
pub use kyc::request_kyc_handoff;
pub use wallet::{WalletConnector, WalletLauncher};

use crate::errors::AppError;
use crate::views::notifications::{Toast, ToastQueue, SHARE_ERROR_DURATION_MS};
use stash_core::PhysicalTimeEffects;
use std::sync::Arc;

/// Default lifetime of non-error toasts
pub const DEFAULT_TOAST_DURATION_MS: u64 = 3_000;

/// Collaborators every workflow reports through.
#[derive(Clone)]
pub struct WorkflowEnv {
    /// Visible toasts
    pub toasts: ToastQueue,
    /// Event sink
    pub analytics: Arc<dyn AnalyticsSink>,
    /// Clock for toast timing and polling
    pub time: Arc<dyn PhysicalTimeEffects>,
    toast_duration_ms: u64,
}

impl std::fmt::Debug for WorkflowEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEnv")
            .field("toasts", &self.toasts)
            .field("toast_duration_ms", &self.toast_duration_ms)
            .finish_non_exhaustive()
    }
}

impl WorkflowEnv {
    /// Environment with an empty toast queue
    pub fn new(analytics: Arc<dyn AnalyticsSink>, time: Arc<dyn PhysicalTimeEffects>) -> Self {
        Self {
            toasts: ToastQueue::new(),
            analytics,
            time,
            toast_duration_ms: DEFAULT_TOAST_DURATION_MS,
        }
    }

    /// Lifetime given to non-error toasts pushed without one
    #[must_use]
    pub fn with_toast_duration_ms(mut self, ms: u64) -> Self {
        self.toast_duration_ms = ms;
        self
    }

    /// Show `toast`. Error toasts stay until dismissed unless they carry a
    /// duration; other toasts get the default lifetime.
    pub async fn notify(&self, mut toast: Toast) {
        if toast.duration_ms.is_none() && !toast.is_error() {
            toast.duration_ms = Some(self.toast_duration_ms);
        }
        let now = self.time.current_timestamp_ms().await;
        self.toasts.push(toast, now);
    }

    /// Report a failed `operation`: toast routed by the error category and a
    /// `<operation>_failed` event.
    pub async fn report_failure(&self, operation: &str, title: &str, err: &AppError) {
        let category = err.category();
        tracing::error!(%operation, %category, error = %err, "workflow failed");

        let toast = Toast::new(operation, title)
            .with_level(err.toast_level())
            .with_message(err.user_message());
        self.notify(toast).await;

        self.analytics
            .track(
                &format!("{operation}_failed"),
                properties([
                    ("error_code", err.code().to_string()),
                    ("error_category", category.label().to_string()),
                    ("error_message", err.to_string()),
                ]),
            )
            .await;
    }

    /// Short-lived error toast after the system share sheet failed
    pub async fn share_failed(&self) {
        let toast = Toast::error("share", "Could not share")
            .with_duration_ms(SHARE_ERROR_DURATION_MS);
        self.notify(toast).await;
    }
}
