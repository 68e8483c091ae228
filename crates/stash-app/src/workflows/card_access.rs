//! Card availability, waitlist sign-up and ordering.

use super::backend::{with_refresh_token, CardBackend, TokenRefresher};
use super::busy::BusyFlag;
use super::{properties, WorkflowEnv};
use crate::attribution::is_email;
use crate::errors::AppError;
use crate::views::notifications::Toast;
use serde::Serialize;
use std::sync::Arc;

/// Whether the user can get a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardAccess {
    /// Cards are offered in the user's country
    Available,
    /// Not offered yet; the user is on the waitlist
    Waitlisted,
    /// Not offered yet; the waitlist form should be shown
    NotAvailable,
}

/// Checks card access and handles the waitlist and card order buttons.
pub struct CardAccessWorkflow {
    backend: Arc<dyn CardBackend>,
    refresher: Arc<dyn TokenRefresher>,
    env: WorkflowEnv,
    waitlist_busy: BusyFlag,
    order_busy: BusyFlag,
}

impl std::fmt::Debug for CardAccessWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardAccessWorkflow")
            .field("waitlist_busy", &self.waitlist_busy.is_busy())
            .field("order_busy", &self.order_busy.is_busy())
            .finish_non_exhaustive()
    }
}

impl CardAccessWorkflow {
    /// Workflow over `backend`
    pub fn new(
        backend: Arc<dyn CardBackend>,
        refresher: Arc<dyn TokenRefresher>,
        env: WorkflowEnv,
    ) -> Self {
        Self {
            backend,
            refresher,
            env,
            waitlist_busy: BusyFlag::new(),
            order_busy: BusyFlag::new(),
        }
    }

    /// Whether cards are offered in `country_code`; when they are not and an
    /// email is known, whether it is already waitlisted. `None` after a
    /// reported failure.
    #[tracing::instrument(skip(self, email))]
    pub async fn check_access(&self, country_code: &str, email: Option<&str>) -> Option<CardAccess> {
        let result = self.lookup_access(country_code, email).await;

        match result {
            Ok(access) => {
                tracing::debug!(?access, "card access checked");
                Some(access)
            }
            Err(err) => {
                self.env
                    .report_failure("card_access", "Could not check card availability", &err)
                    .await;
                None
            }
        }
    }

    async fn lookup_access(
        &self,
        country_code: &str,
        email: Option<&str>,
    ) -> Result<CardAccess, AppError> {
        let available = with_refresh_token(self.refresher.as_ref(), || {
            self.backend.check_card_access(country_code)
        })
        .await?;
        if available {
            return Ok(CardAccess::Available);
        }
        let Some(email) = email else {
            return Ok(CardAccess::NotAvailable);
        };
        let waitlisted = with_refresh_token(self.refresher.as_ref(), || {
            self.backend.check_card_waitlist_status(email)
        })
        .await?;
        Ok(if waitlisted {
            CardAccess::Waitlisted
        } else {
            CardAccess::NotAvailable
        })
    }

    /// Join the waitlist. Returns whether the user is now on it.
    #[tracing::instrument(skip(self, email))]
    pub async fn join_waitlist(&self, email: &str, country_code: &str) -> bool {
        let Some(_guard) = self.waitlist_busy.try_acquire() else {
            return false;
        };
        let email = email.trim();
        if !is_email(email) {
            let err = AppError::Input {
                field: "email",
                reason: "enter a valid email address".to_string(),
            };
            self.env
                .report_failure("card_waitlist", "Invalid email", &err)
                .await;
            return false;
        }

        let joined = with_refresh_token(self.refresher.as_ref(), || {
            self.backend.add_to_card_waitlist(email, country_code)
        })
        .await;
        match joined {
            Ok(()) => {
                self.env
                    .notify(
                        Toast::success("card_waitlist", "You're on the list")
                            .with_message("We'll email you when cards launch in your country"),
                    )
                    .await;
                self.env
                    .analytics
                    .track(
                        "card_waitlist_joined",
                        properties([("country_code", country_code)]),
                    )
                    .await;
                true
            }
            Err(err) => {
                self.env
                    .report_failure("card_waitlist", "Could not join the waitlist", &err.into())
                    .await;
                false
            }
        }
    }

    /// Order a virtual card. Returns the new card id.
    #[tracing::instrument(skip(self))]
    pub async fn order_card(&self) -> Option<String> {
        let _guard = self.order_busy.try_acquire()?;
        match with_refresh_token(self.refresher.as_ref(), || self.backend.create_card()).await {
            Ok(card_id) => {
                self.env
                    .notify(Toast::success("card_order", "Card ordered"))
                    .await;
                self.env
                    .analytics
                    .track("card_ordered", properties([("card_id", card_id.as_str())]))
                    .await;
                Some(card_id)
            }
            Err(err) => {
                self.env
                    .report_failure("card_order", "Could not order card", &err.into())
                    .await;
                None
            }
        }
    }
}
