//! KYC hand-off shared by bank transfers and card activation.

use super::backend::{with_refresh_token, BankingBackend, TokenRefresher};
use crate::customer::Endorsement;
use crate::errors::AppError;
use crate::flows::payload::{KycHandoff, KycMode};

/// Ask the backend for a provider session for `endorsement`.
///
/// A backend answer without a link is [`AppError::KycLinkUnavailable`].
pub async fn request_kyc_handoff(
    backend: &dyn BankingBackend,
    refresher: &dyn TokenRefresher,
    mode: KycMode,
    endorsement: Endorsement,
    redirect_uri: &str,
) -> Result<KycHandoff, AppError> {
    let link = with_refresh_token(refresher, || backend.get_kyc_link(endorsement, redirect_uri))
        .await?
        .map(|link| link.trim().to_string())
        .filter(|link| !link.is_empty())
        .ok_or(AppError::KycLinkUnavailable { endorsement })?;

    tracing::debug!(endorsement = endorsement.as_str(), ?mode, "kyc link issued");
    Ok(KycHandoff {
        mode: Some(mode),
        endorsement: Some(endorsement),
        link: Some(link),
        redirect_uri: Some(redirect_uri.to_string()),
    })
}
