//! # Attribution
//!
//! First-touch/last-touch marketing attribution:
//!
//! - [`params`]: parse UTM parameters, click ids and referral codes from URLs
//! - [`sanitize`]: drop values that look like personal data
//! - [`store`]: persist and merge captures, flatten them for analytics

pub mod params;
pub mod sanitize;
pub mod store;

pub use params::{AttributionParams, REFERRAL_KEYS};
pub use sanitize::{detect_pii, is_email, sanitize_referral_code, sanitize_value, MAX_VALUE_CHARS};
pub use store::{
    AttributionRecord, AttributionStore, CaptureOutcome, CaptureSource, TouchPoint,
    DEFAULT_WINDOW_DAYS,
};

use stash_core::{StorageError, TimeError};
use thiserror::Error;

/// Attribution failures.
#[derive(Debug, Error)]
pub enum AttributionError {
    /// The URL could not be parsed
    #[error("invalid attribution url: {reason}")]
    InvalidUrl {
        /// Parser message
        reason: String,
    },
    /// Persisting or loading the record failed
    #[error("attribution storage: {0}")]
    Storage(#[from] StorageError),
    /// The clock failed
    #[error("attribution clock: {0}")]
    Time(#[from] TimeError),
}
