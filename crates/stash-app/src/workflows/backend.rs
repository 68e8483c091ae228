//! External collaborators consumed by the workflows.
//!
//! The banking backend, token refresh and IP geolocation are provided by the
//! host. Tests and the inspection binary use in-memory implementations.

use crate::customer::{CustomerEndorsement, Endorsement};
use crate::flows::payload::{BankTransferInstructions, DirectDepositSession};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Failure reported by a backend call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Access token rejected; a refresh may fix it
    #[error("Authentication expired")]
    AuthExpired,

    /// Request never reached the server
    #[error("Network error: {reason}")]
    Network {
        /// Transport failure description
        reason: String,
    },

    /// Server answered with an error status
    #[error("HTTP {status}: {message}")]
    Http {
        /// Status code
        status: u16,
        /// Body or status text
        message: String,
    },

    /// Requested resource does not exist
    #[error("Not found: {what}")]
    NotFound {
        /// Resource description
        what: String,
    },

    /// Response body did not match the expected shape
    #[error("Decode error: {reason}")]
    Decode {
        /// Decoder message
        reason: String,
    },

    /// Backend deliberately unavailable for this user or region
    #[error("Service unavailable: {reason}")]
    Unavailable {
        /// Why
        reason: String,
    },
}

impl BackendError {
    /// Network failure
    pub fn network(reason: impl Into<String>) -> Self {
        Self::Network {
            reason: reason.into(),
        }
    }

    /// HTTP error status
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Missing resource
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Whether a token refresh followed by a retry may succeed
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired | Self::Http { status: 401, .. })
    }

    /// Human-readable message sent by the server, if any.
    ///
    /// JSON bodies of the form `{"message": ".."}` or `{"error": ".."}` are
    /// unwrapped; other non-empty bodies are returned as is.
    pub fn server_message(&self) -> Option<String> {
        let Self::Http { message, .. } = self else {
            return None;
        };
        let message = message.trim();
        if message.is_empty() {
            return None;
        }
        match serde_json::from_str::<serde_json::Value>(message) {
            Ok(serde_json::Value::Object(body)) => ["message", "error"]
                .iter()
                .find_map(|key| body.get(*key).and_then(|v| v.as_str()))
                .map(str::to_string),
            _ => Some(message.to_string()),
        }
    }
}

/// Bank transfer request sent to `create_bridge_transfer`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransferRequest {
    /// Rail the user pays through
    pub endorsement: Endorsement,
    /// Amount as typed
    pub amount: String,
    /// Fiat currency code
    pub currency: String,
    /// Destination token symbol
    pub destination_token: String,
    /// Destination network
    pub destination_network: String,
}

/// Banking backend (KYC, bank transfers, direct deposits).
#[async_trait]
pub trait BankingBackend: Send + Sync {
    /// Endorsement rows of the signed-in customer
    async fn get_customer_endorsements(&self) -> Result<Vec<CustomerEndorsement>, BackendError>;

    /// Provider-hosted KYC session URL for `endorsement`, or `None` when the
    /// backend has no session to offer.
    async fn get_kyc_link(
        &self,
        endorsement: Endorsement,
        redirect_uri: &str,
    ) -> Result<Option<String>, BackendError>;

    /// Create a bank transfer and return its wire instructions
    async fn create_bridge_transfer(
        &self,
        request: &BankTransferRequest,
    ) -> Result<BankTransferInstructions, BackendError>;

    /// Open a direct deposit session on `network`
    async fn create_direct_deposit_session(
        &self,
        network: &str,
    ) -> Result<DirectDepositSession, BackendError>;

    /// Current state of a direct deposit session
    async fn get_direct_deposit_session(
        &self,
        session_id: &str,
    ) -> Result<DirectDepositSession, BackendError>;
}

/// Access token refresh
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Obtain a fresh token
    async fn refresh_token(&self) -> Result<(), BackendError>;
}

/// Run `call`; when it fails with an expired token, refresh once and retry.
///
/// A failed refresh returns the original auth error. The retry result is
/// returned as is, so a second auth failure is not retried again.
pub async fn with_refresh_token<T, F, Fut>(
    refresher: &dyn TokenRefresher,
    mut call: F,
) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    match call().await {
        Err(err) if err.is_auth_expired() => {
            tracing::debug!("access token expired, refreshing");
            if let Err(refresh_err) = refresher.refresh_token().await {
                tracing::warn!(error = %refresh_err, "token refresh failed");
                return Err(err);
            }
            call().await
        }
        other => other,
    }
}

/// IP geolocation
#[async_trait]
pub trait CountryLookup: Send + Sync {
    /// ISO 3166-1 alpha-2 code of the caller's IP
    async fn get_country_from_ip(&self) -> Result<String, BackendError>;
}

/// Card program endpoints
#[async_trait]
pub trait CardBackend: Send + Sync {
    /// Whether cards are offered in `country_code`
    async fn check_card_access(&self, country_code: &str) -> Result<bool, BackendError>;

    /// Put `email` on the waitlist for `country_code`
    async fn add_to_card_waitlist(&self, email: &str, country_code: &str)
        -> Result<(), BackendError>;

    /// Whether `email` already asked to be notified
    async fn check_card_waitlist_status(&self, email: &str) -> Result<bool, BackendError>;

    /// Order a virtual card and return its id
    async fn create_card(&self) -> Result<String, BackendError>;
}
