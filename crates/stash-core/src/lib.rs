//! Stash Core - Effect Interfaces
//!
//! This crate provides the effect interfaces shared by the Stash client core.
//! It contains only trait signatures and plain data types; concrete handlers
//! live in `stash-effects`, application logic lives in `stash-app`.
//!
//! # Effect Interfaces
//! - `StorageEffects`: namespaced key-value persistence (local storage)
//! - `PhysicalTimeEffects`: wall-clock time for expiration and cache TTLs

#![forbid(unsafe_code)]

/// Pure effect interfaces (no implementations)
pub mod effects;

/// Wall-clock time type
pub mod time;

pub use effects::{
    PhysicalTimeEffects, StorageEffects, StorageError, StorageJsonExt, TimeError,
};
pub use time::{PhysicalTime, MS_PER_DAY, MS_PER_HOUR, MS_PER_MINUTE, MS_PER_SECOND};
