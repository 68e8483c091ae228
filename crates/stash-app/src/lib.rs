//! # Stash App - Portable Client Core
//!
//! Headless core shared by every Stash frontend (mobile, web, terminal).
//! Frontends render; this crate decides which modal step is shown, which
//! card activation step is actionable and what marketing attribution is
//! attached to analytics events.
//!
//! ## Modules
//!
//! - [`flows`]: deposit, send, withdraw and card-deposit modal state machines
//! - [`card`]: card activation steps derived from verification status
//! - [`attribution`]: first-touch/last-touch marketing attribution
//! - [`referral`], [`country`], [`deep_link`]: launch-link and onboarding state
//! - [`workflows`]: async handlers calling the banking backend
//! - [`views`]: toast notifications
//! - [`config`], [`errors`]: configuration and categorized errors
//!
//! ## Architecture Constraints
//!
//! This crate depends on effect traits from `stash-core` only. Storage and
//! clock handlers are injected as `Arc<dyn StorageEffects>` and
//! `Arc<dyn PhysicalTimeEffects>`; backends as the traits in
//! [`workflows::backend`].

#![forbid(unsafe_code)]

pub mod attribution;
pub mod card;
pub mod config;
pub mod country;
pub mod customer;
pub mod deep_link;
pub mod errors;
pub mod flows;
pub mod referral;
pub mod views;
pub mod workflows;

pub use attribution::{AttributionError, AttributionParams, AttributionStore};
pub use config::{AppConfig, ConfigError};
pub use country::{CountryDetector, CountryError};
pub use deep_link::LaunchParams;
pub use errors::{AppError, ErrorCategory};
pub use flows::{FlowKind, FlowSet};
pub use referral::ReferralStore;
pub use views::{Toast, ToastLevel, ToastQueue};
pub use workflows::WorkflowEnv;
