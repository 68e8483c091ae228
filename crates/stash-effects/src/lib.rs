//! Stash Effects - Standard Handlers
//!
//! Stateless handlers implementing the effect traits from `stash-core`:
//!
//! - [`MemoryStorageHandler`]: in-process storage for tests and ephemeral sessions
//! - [`FilesystemStorageHandler`]: one file per key under a base directory
//! - [`RealTimeHandler`]: system clock
//! - [`SimulatedTimeHandler`]: manually advanced clock for deterministic tests

#![forbid(unsafe_code)]

pub mod storage;
pub mod time;

pub use storage::{FilesystemStorageHandler, MemoryStorageHandler};
pub use time::{RealTimeHandler, SimulatedTimeHandler};
