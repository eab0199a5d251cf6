//! Repository for the `events` audit table (PRD-09).
//!
//! Append-only: events are inserted by the persistence service and queried
//! for audit views; no update or delete operations exist.

use plantops_core::types::DbId;
use sqlx::PgPool;

use crate::models::event::{Event, EventQuery};

/// Column list for events queries.
const COLUMNS: &str = "id, event_type, subject_type, subject_id, actor_id, \
    before_state, after_state, payload, created_at";

/// Default page size for event queries.
const DEFAULT_LIMIT: i64 = 100;

/// Provides append/read operations for audit events.
pub struct EventRepo;

impl EventRepo {
    /// Insert a new event row, returning the generated ID.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        pool: &PgPool,
        event_type: &str,
        subject_type: Option<&str>,
        subject_id: Option<DbId>,
        actor_id: Option<DbId>,
        before_state: Option<&str>,
        after_state: Option<&str>,
        payload: &serde_json::Value,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO events \
                (event_type, subject_type, subject_id, actor_id, before_state, after_state, payload) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(event_type)
        .bind(subject_type)
        .bind(subject_id)
        .bind(actor_id)
        .bind(before_state)
        .bind(after_state)
        .bind(payload)
        .fetch_one(pool)
        .await
    }

    /// List recent events ordered newest-first.
    pub async fn list_recent(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events
             ORDER BY created_at DESC, id DESC
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Query events with optional filters, newest first.
    pub async fn query(pool: &PgPool, filter: &EventQuery) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events
             WHERE ($1::text IS NULL OR event_type = $1)
               AND ($2::text IS NULL OR subject_type = $2)
               AND ($3::bigint IS NULL OR subject_id = $3)
               AND ($4::bigint IS NULL OR actor_id = $4)
               AND ($5::timestamptz IS NULL OR created_at >= $5)
               AND ($6::timestamptz IS NULL OR created_at <= $6)
             ORDER BY created_at DESC, id DESC
             LIMIT $7 OFFSET $8"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(&filter.event_type)
            .bind(&filter.subject_type)
            .bind(filter.subject_id)
            .bind(filter.actor_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.limit.unwrap_or(DEFAULT_LIMIT))
            .bind(filter.offset.unwrap_or(0))
            .fetch_all(pool)
            .await
    }

    /// List events for one subject, newest first.
    pub async fn list_for_subject(
        pool: &PgPool,
        subject_type: &str,
        subject_id: DbId,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events
             WHERE subject_type = $1 AND subject_id = $2
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(subject_type)
            .bind(subject_id)
            .fetch_all(pool)
            .await
    }
}
