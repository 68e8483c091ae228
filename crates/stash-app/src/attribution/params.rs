//! Marketing parameters carried by landing URLs and deep links.

use super::sanitize::{sanitize_referral_code, sanitize_value};
use super::AttributionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Base used to resolve deep links given as a bare path (`/card?ref=X`).
const DEEP_LINK_BASE: &str = "stash:/";

/// Query keys accepted as a referral code, highest priority first.
pub const REFERRAL_KEYS: [&str; 4] = ["ref", "refCode", "referralCode", "referral"];

/// Sanitized marketing parameters of one capture.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionParams {
    /// `utm_source`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    /// `utm_medium`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    /// `utm_campaign`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    /// `utm_content`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_content: Option<String>,
    /// `utm_term`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_term: Option<String>,
    /// Google Ads click id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gclid: Option<String>,
    /// Meta click id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fbclid: Option<String>,
    /// Microsoft Ads click id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msclkid: Option<String>,
    /// TikTok click id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttclid: Option<String>,
    /// Referral code from any of [`REFERRAL_KEYS`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
}

impl AttributionParams {
    /// Parse and sanitize the query of an absolute URL.
    pub fn from_url(raw: &str) -> Result<Self, AttributionError> {
        let url = Url::parse(raw.trim()).map_err(|e| AttributionError::InvalidUrl {
            reason: e.to_string(),
        })?;
        Ok(Self::from_query_pairs(url.query_pairs()))
    }

    /// Parse a deep link: an absolute URL with any scheme, or a bare path.
    pub fn from_deep_link(raw: &str) -> Result<Self, AttributionError> {
        Ok(Self::from_query_pairs(parse_deep_link(raw)?.query_pairs()))
    }

    /// Build from decoded query pairs. The first occurrence of a key wins.
    pub fn from_query_pairs<K, V, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut raw: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in pairs {
            raw.entry(key.as_ref().to_string())
                .or_insert_with(|| value.as_ref().to_string());
        }
        let field = |key: &str| raw.get(key).and_then(|v| sanitize_value(v));

        Self {
            utm_source: field("utm_source"),
            utm_medium: field("utm_medium"),
            utm_campaign: field("utm_campaign"),
            utm_content: field("utm_content"),
            utm_term: field("utm_term"),
            gclid: field("gclid"),
            fbclid: field("fbclid"),
            msclkid: field("msclkid"),
            ttclid: field("ttclid"),
            referral_code: REFERRAL_KEYS
                .iter()
                .find_map(|key| raw.get(*key).and_then(|v| sanitize_referral_code(v))),
        }
    }

    /// Whether no marketing parameter survived sanitization.
    pub fn is_empty(&self) -> bool {
        self.fields().all(|(_, value)| value.is_none())
    }

    /// `(name, value)` for every field, in a stable order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, Option<&str>)> {
        [
            ("utm_source", &self.utm_source),
            ("utm_medium", &self.utm_medium),
            ("utm_campaign", &self.utm_campaign),
            ("utm_content", &self.utm_content),
            ("utm_term", &self.utm_term),
            ("gclid", &self.gclid),
            ("fbclid", &self.fbclid),
            ("msclkid", &self.msclkid),
            ("ttclid", &self.ttclid),
            ("referral_code", &self.referral_code),
        ]
        .into_iter()
        .map(|(name, value)| (name, value.as_deref()))
    }

    /// Copy every present field of `newer` over `self`.
    pub fn merge_present(&mut self, newer: &AttributionParams) {
        fn take(slot: &mut Option<String>, newer: &Option<String>) {
            if let Some(value) = newer {
                *slot = Some(value.clone());
            }
        }
        take(&mut self.utm_source, &newer.utm_source);
        take(&mut self.utm_medium, &newer.utm_medium);
        take(&mut self.utm_campaign, &newer.utm_campaign);
        take(&mut self.utm_content, &newer.utm_content);
        take(&mut self.utm_term, &newer.utm_term);
        take(&mut self.gclid, &newer.gclid);
        take(&mut self.fbclid, &newer.fbclid);
        take(&mut self.msclkid, &newer.msclkid);
        take(&mut self.ttclid, &newer.ttclid);
        take(&mut self.referral_code, &newer.referral_code);
    }
}

/// Parse a deep link into a URL, resolving bare paths against the app scheme.
pub(crate) fn parse_deep_link(raw: &str) -> Result<Url, AttributionError> {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(DEEP_LINK_BASE)
            .and_then(|base| base.join(raw))
            .map_err(|e| AttributionError::InvalidUrl {
                reason: e.to_string(),
            }),
        Err(e) => Err(AttributionError::InvalidUrl {
            reason: e.to_string(),
        }),
    }
}

/// URL with its query and fragment removed, for logging landing pages
/// without their parameters.
pub(crate) fn strip_query(raw: &str) -> Option<String> {
    let mut url = parse_deep_link(raw).ok()?;
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}
