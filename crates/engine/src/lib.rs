//! Orchestration layer for the PlantOps maintenance workflow.
//!
//! Each module composes the `db` repositories with the pure validation and
//! state machines in `core`, threads the acting user through every mutating
//! call, and publishes audit events on the bus. Multi-step state changes
//! run inside a single transaction; on any failure mid-sequence the whole
//! operation rolls back and the error surfaces to the caller.

pub mod error;
pub mod execution;
pub mod generation;
pub mod runtime;
pub mod versioning;
pub mod work_order;

pub use error::{EngineError, EngineResult};
