//! Parameters the app reads when launched from a link.

use crate::attribution::params::parse_deep_link;
use crate::attribution::{AttributionError, AttributionParams};
use std::collections::HashMap;

/// Everything a launch link can carry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LaunchParams {
    /// Referral code from any accepted alias
    pub referral_code: Option<String>,
    /// Opaque KYC resume payload, percent-decoded
    pub resume_params: Option<String>,
    /// The user already confirmed their country
    pub country_confirmed: bool,
    /// Marketing parameters
    pub attribution: AttributionParams,
    /// Link path (`/card`, `/deposit`), for routing
    pub path: String,
}

impl LaunchParams {
    /// Parse a web URL, custom-scheme deep link or bare path.
    pub fn parse(link: &str) -> Result<Self, AttributionError> {
        let url = parse_deep_link(link)?;
        let query: HashMap<String, String> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let attribution = AttributionParams::from_query_pairs(url.query_pairs());

        let resume_params = query
            .get("resumeParams")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let country_confirmed = query
            .get("countryConfirmed")
            .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"));

        // Custom schemes put the first segment in the host: stash://card/x
        let path = match url.host_str() {
            Some(host) if !matches!(url.scheme(), "http" | "https") => {
                format!("/{host}{}", url.path()).trim_end_matches('/').to_string()
            }
            _ => url.path().trim_end_matches('/').to_string(),
        };

        Ok(Self {
            referral_code: attribution.referral_code.clone(),
            resume_params,
            country_confirmed,
            attribution,
            path: if path.is_empty() { "/".to_string() } else { path },
        })
    }
}
