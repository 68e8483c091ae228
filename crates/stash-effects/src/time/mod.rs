//! Time effect handlers
//!
//! Standard implementations of `PhysicalTimeEffects` from `stash-core`.

pub mod real;
pub mod simulated;

pub use real::RealTimeHandler;
pub use simulated::SimulatedTimeHandler;
