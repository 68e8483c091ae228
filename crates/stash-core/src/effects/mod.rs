//! Effect trait definitions.
//!
//! Handlers implementing these traits live in `stash-effects`. Application
//! code depends only on the traits so flows and stores can be exercised in
//! tests with in-memory storage and a simulated clock.

mod storage;
mod time;

pub use storage::{StorageEffects, StorageError, StorageJsonExt};
pub use time::{PhysicalTimeEffects, TimeError};
