//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Multi-step state changes
//! (publish, generation, guarded transitions) run inside a single
//! transaction opened from the pool.

pub mod asset_repo;
pub mod event_repo;
pub mod form_execution_repo;
pub mod form_repo;
pub mod form_version_repo;
pub mod routine_repo;
pub mod runtime_measurement_repo;
pub mod work_order_repo;
pub mod work_order_type_repo;

pub use asset_repo::AssetRepo;
pub use event_repo::EventRepo;
pub use form_execution_repo::FormExecutionRepo;
pub use form_repo::FormRepo;
pub use form_version_repo::FormVersionRepo;
pub use routine_repo::RoutineRepo;
pub use runtime_measurement_repo::RuntimeMeasurementRepo;
pub use work_order_repo::WorkOrderRepo;
pub use work_order_type_repo::WorkOrderTypeRepo;
