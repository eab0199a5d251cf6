use plantops_core::error::CoreError;
use plantops_core::types::DbId;

/// Engine-level error type.
///
/// Wraps [`CoreError`] for domain failures and `sqlx::Error` for persistence
/// failures. A transaction that fails mid-sequence rolls back entirely and
/// surfaces here; the engine never retries internally — the scheduled worker
/// re-runs the whole idempotent operation on its next interval.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A domain-level error from `plantops_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Completion was attempted with required tasks still unanswered.
    /// Carries the missing snapshot task ids so callers can present them.
    #[error("Execution {execution_id} is missing responses for required tasks {missing:?}")]
    MissingRequiredTasks {
        execution_id: DbId,
        missing: Vec<DbId>,
    },
}

impl EngineError {
    /// Shorthand for a validation failure.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Core(CoreError::Validation(msg.into()))
    }

    /// Shorthand for a state conflict.
    pub fn state_conflict(msg: impl Into<String>) -> Self {
        Self::Core(CoreError::StateConflict(msg.into()))
    }

    /// Shorthand for a missing entity.
    pub fn not_found(entity: &'static str, id: DbId) -> Self {
        Self::Core(CoreError::NotFound { entity, id })
    }
}

/// Convenience type alias for engine return values.
pub type EngineResult<T> = Result<T, EngineError>;
