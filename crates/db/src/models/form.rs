//! Form and draft task entity models and DTOs (PRD-11).
//!
//! Draft tasks (and their instructions) are the mutable side of the form
//! aggregate; published content lives in `form_versions` snapshots and is
//! never touched by these DTOs.

use plantops_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

/// A row from the `forms` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Form {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    /// Latest published version; null until first publish.
    pub current_version_id: Option<DbId>,
    pub is_active: bool,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new form.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateForm {
    pub name: String,
    pub description: Option<String>,
}

/// DTO for updating a form's descriptive fields.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Draft tasks
// ---------------------------------------------------------------------------

/// A row from the `form_tasks` table (mutable draft).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FormTask {
    pub id: DbId,
    pub form_id: DbId,
    pub task_type: String,
    pub description: String,
    pub is_required: bool,
    pub position: i32,
    /// Type-specific configuration: measurement bounds or options list.
    pub config: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new draft task.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFormTask {
    pub form_id: DbId,
    pub task_type: String,
    pub description: String,
    /// Defaults to false if omitted.
    pub is_required: Option<bool>,
    /// Appended after the current last position if omitted.
    pub position: Option<i32>,
    pub config: Option<serde_json::Value>,
}

/// DTO for updating a draft task. All fields are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateFormTask {
    pub description: Option<String>,
    pub is_required: Option<bool>,
    pub config: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Draft task instructions
// ---------------------------------------------------------------------------

/// A row from the `form_task_instructions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FormTaskInstruction {
    pub id: DbId,
    pub form_task_id: DbId,
    pub position: i32,
    pub title: String,
    pub body: String,
    /// Opaque storage path for instruction media.
    pub media_path: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new instruction on a draft task.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFormTaskInstruction {
    pub form_task_id: DbId,
    pub position: Option<i32>,
    pub title: String,
    pub body: String,
    pub media_path: Option<String>,
}

/// DTO for updating an instruction. All fields are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateFormTaskInstruction {
    pub title: Option<String>,
    pub body: Option<String>,
    pub media_path: Option<String>,
}
