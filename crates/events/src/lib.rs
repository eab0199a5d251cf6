//! PlantOps audit event bus and persistence.
//!
//! This crate provides the building blocks for the platform-wide audit
//! trail (PRD-09):
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`] — the canonical audit event envelope, carrying
//!   before/after state for lifecycle transitions.
//! - [`EventPersistence`] — background service that durably writes every
//!   event to the `events` table.
//!
//! Publishing is fire-and-forget: a publisher never fails because the sink
//! is slow, lagging, or absent.

pub mod bus;
pub mod persistence;

pub use bus::{EventBus, PlatformEvent};
pub use persistence::EventPersistence;
