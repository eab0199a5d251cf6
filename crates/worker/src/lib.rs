//! Scheduled worker for the PlantOps maintenance platform.
//!
//! Hosts the periodic work order generation scan. Deployment runs a single
//! worker instance, which supplies the non-overlap guarantee the scan
//! expects; the scan itself is idempotent either way.

pub mod scan;
