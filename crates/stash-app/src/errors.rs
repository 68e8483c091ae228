//! Categorized application errors
//!
//! Workflows never let an error escape to the view layer. They convert it to
//! an [`AppError`], whose [`ErrorCategory`] picks the toast severity and the
//! hint shown to the user.

use crate::attribution::AttributionError;
use crate::config::ConfigError;
use crate::country::CountryError;
use crate::customer::Endorsement;
use crate::flows::RegistryError;
use crate::workflows::backend::BackendError;
use stash_core::{StorageError, TimeError};
use std::fmt;

pub use crate::views::notifications::ToastLevel;

// ============================================================================
// Error Categories
// ============================================================================

/// High-level error categories for frontend error handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// User input validation errors (correctable by user)
    Input,
    /// Configuration errors (correctable by modifying settings)
    Config,
    /// Not allowed for this user: expired session, missing verification
    Capability,
    /// Resource not found errors (transient or permanent)
    NotFound,
    /// Network connectivity errors (often transient)
    Network,
    /// General operation failures (catch-all)
    Operation,
}

impl ErrorCategory {
    /// Whether the user can fix it (input, settings)
    #[must_use]
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Input | Self::Config)
    }

    /// Whether a retry may succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network | Self::NotFound)
    }

    /// Toast severity for this category
    #[must_use]
    pub fn toast_severity(&self) -> ToastLevel {
        match self {
            Self::Input => ToastLevel::Info,
            Self::Config => ToastLevel::Warning,
            Self::Capability => ToastLevel::Error,
            Self::NotFound => ToastLevel::Warning,
            Self::Network => ToastLevel::Warning,
            Self::Operation => ToastLevel::Error,
        }
    }

    /// Short label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Config => "Config",
            Self::Capability => "Permission",
            Self::NotFound => "Not Found",
            Self::Network => "Network",
            Self::Operation => "Operation",
        }
    }

    /// How the user can resolve this category of error
    #[must_use]
    pub fn resolution_hint(&self) -> &'static str {
        match self {
            Self::Input => "Check your input and try again",
            Self::Config => "Review your configuration settings",
            Self::Capability => "Sign in again or complete verification",
            Self::NotFound => "The requested resource could not be found",
            Self::Network => "Check your network connection and retry",
            Self::Operation => "An unexpected error occurred",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Categorized application errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A form value was rejected before reaching the backend
    #[error("{field}: {reason}")]
    Input {
        /// Form field
        field: &'static str,
        /// What is wrong
        reason: String,
    },

    /// The backend had no KYC session to hand out
    #[error("Verification link unavailable for {}", endorsement.as_str())]
    KycLinkUnavailable {
        /// Endorsement that was requested
        endorsement: Endorsement,
    },

    /// Backend call failed
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Attribution capture failed
    #[error(transparent)]
    Attribution(#[from] AttributionError),

    /// Country detection failed
    #[error(transparent)]
    Country(#[from] CountryError),

    /// A flow table is invalid
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Configuration is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Local storage failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Clock failed
    #[error(transparent)]
    Time(#[from] TimeError),
}

fn backend_category(err: &BackendError) -> ErrorCategory {
    match err {
        BackendError::AuthExpired => ErrorCategory::Capability,
        BackendError::Network { .. } => ErrorCategory::Network,
        BackendError::Http { status, .. } => match status {
            400 | 422 => ErrorCategory::Input,
            401 | 403 => ErrorCategory::Capability,
            404 => ErrorCategory::NotFound,
            408 | 429 | 502..=504 => ErrorCategory::Network,
            _ => ErrorCategory::Operation,
        },
        BackendError::NotFound { .. } => ErrorCategory::NotFound,
        BackendError::Decode { .. } => ErrorCategory::Operation,
        BackendError::Unavailable { .. } => ErrorCategory::Capability,
    }
}

impl AppError {
    /// Input validation error
    pub fn input(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Input {
            field,
            reason: reason.into(),
        }
    }

    /// Category driving toast severity and hints
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Input { .. } => ErrorCategory::Input,
            Self::KycLinkUnavailable { .. } => ErrorCategory::NotFound,
            Self::Backend(err) | Self::Country(CountryError::Lookup(err)) => backend_category(err),
            Self::Attribution(AttributionError::InvalidUrl { .. }) => ErrorCategory::Input,
            Self::Registry(_) | Self::Config(_) => ErrorCategory::Config,
            Self::Attribution(_) | Self::Country(_) | Self::Storage(_) | Self::Time(_) => {
                ErrorCategory::Operation
            }
        }
    }

    /// Toast severity for this error
    pub fn toast_level(&self) -> ToastLevel {
        self.category().toast_severity()
    }

    /// Short error code for analytics
    pub fn code(&self) -> &'static str {
        match self {
            Self::Input { .. } => "INPUT",
            Self::KycLinkUnavailable { .. } => "KYC_LINK_UNAVAILABLE",
            Self::Backend(err) => match err {
                BackendError::AuthExpired => "AUTH_EXPIRED",
                BackendError::Network { .. } => "NET_ERROR",
                BackendError::Http { .. } => "HTTP_ERROR",
                BackendError::NotFound { .. } => "NOT_FOUND",
                BackendError::Decode { .. } => "DECODE",
                BackendError::Unavailable { .. } => "UNAVAILABLE",
            },
            Self::Attribution(_) => "ATTRIBUTION",
            Self::Country(_) => "COUNTRY",
            Self::Registry(_) => "REGISTRY",
            Self::Config(_) => "CONFIG",
            Self::Storage(_) => "STORAGE",
            Self::Time(_) => "TIME",
        }
    }

    /// Message for the toast detail line: the server's own message when it
    /// sent one, otherwise the category hint.
    pub fn user_message(&self) -> String {
        extract_server_message(self)
            .unwrap_or_else(|| self.category().resolution_hint().to_string())
    }
}

/// Server-provided message inside `err`, if any
pub fn extract_server_message(err: &AppError) -> Option<String> {
    match err {
        AppError::Backend(backend) | AppError::Country(CountryError::Lookup(backend)) => {
            backend.server_message()
        }
        AppError::Input { reason, .. } => Some(reason.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_routing() {
        let cases = [
            (422, ErrorCategory::Input, ToastLevel::Info),
            (401, ErrorCategory::Capability, ToastLevel::Error),
            (404, ErrorCategory::NotFound, ToastLevel::Warning),
            (503, ErrorCategory::Network, ToastLevel::Warning),
            (500, ErrorCategory::Operation, ToastLevel::Error),
        ];
        for (status, category, level) in cases {
            let err = AppError::from(BackendError::http(status, ""));
            assert_eq!(err.category(), category, "status {status}");
            assert_eq!(err.toast_level(), level, "status {status}");
        }
    }

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = AppError::from(BackendError::http(422, r#"{"error":"Amount too small"}"#));
        assert_eq!(err.user_message(), "Amount too small");
        assert_eq!(err.code(), "HTTP_ERROR");

        let err = AppError::from(BackendError::network("reset by peer"));
        assert_eq!(err.user_message(), ErrorCategory::Network.resolution_hint());
        assert!(err.category().is_transient());
    }

    #[test]
    fn test_missing_kyc_link() {
        let err = AppError::KycLinkUnavailable {
            endorsement: Endorsement::Sepa,
        };
        assert_eq!(err.to_string(), "Verification link unavailable for sepa");
        assert_eq!(err.toast_level(), ToastLevel::Warning);
    }

    #[test]
    fn test_input_and_config_are_user_correctable() {
        let err = AppError::input("amount", "Enter an amount");
        assert!(err.category().is_user_correctable());
        assert_eq!(err.user_message(), "Enter an amount");

        let err = AppError::from(ConfigError::Invalid {
            field: "storage_prefix",
            reason: "must not be empty",
        });
        assert!(err.category().is_user_correctable());
        assert!(!ErrorCategory::Capability.is_user_correctable());
    }

    #[test]
    fn test_country_lookup_uses_backend_category() {
        let err = AppError::from(CountryError::Lookup(BackendError::network("timeout")));
        assert_eq!(err.category(), ErrorCategory::Network);
        let err = AppError::from(CountryError::InvalidCode { code: "??".into() });
        assert_eq!(err.category(), ErrorCategory::Operation);
    }
}
