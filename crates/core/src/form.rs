//! Inspection form task types and frozen snapshots (PRD-11).
//!
//! Draft tasks are mutable rows owned by a form; publishing freezes them
//! into a [`FormSnapshot`] stored as a JSON value on the version row. The
//! snapshot is an immutable value type, deliberately not a live relation:
//! executions correlate responses against it even after the form moves on.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Task type
// ---------------------------------------------------------------------------

pub const TASK_QUESTION: &str = "question";
pub const TASK_MULTIPLE_CHOICE: &str = "multiple_choice";
pub const TASK_MULTIPLE_SELECT: &str = "multiple_select";
pub const TASK_MEASUREMENT: &str = "measurement";
pub const TASK_PHOTO: &str = "photo";
pub const TASK_CODE_READER: &str = "code_reader";
pub const TASK_FILE_UPLOAD: &str = "file_upload";

/// All valid task type values.
pub const VALID_TASK_TYPES: &[&str] = &[
    TASK_QUESTION,
    TASK_MULTIPLE_CHOICE,
    TASK_MULTIPLE_SELECT,
    TASK_MEASUREMENT,
    TASK_PHOTO,
    TASK_CODE_READER,
    TASK_FILE_UPLOAD,
];

/// What kind of response a form task collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Question,
    MultipleChoice,
    MultipleSelect,
    Measurement,
    Photo,
    CodeReader,
    FileUpload,
}

impl TaskType {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            TASK_QUESTION => Ok(Self::Question),
            TASK_MULTIPLE_CHOICE => Ok(Self::MultipleChoice),
            TASK_MULTIPLE_SELECT => Ok(Self::MultipleSelect),
            TASK_MEASUREMENT => Ok(Self::Measurement),
            TASK_PHOTO => Ok(Self::Photo),
            TASK_CODE_READER => Ok(Self::CodeReader),
            TASK_FILE_UPLOAD => Ok(Self::FileUpload),
            _ => Err(format!(
                "Invalid task type '{s}'. Must be one of: {}",
                VALID_TASK_TYPES.join(", ")
            )),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Question => TASK_QUESTION,
            Self::MultipleChoice => TASK_MULTIPLE_CHOICE,
            Self::MultipleSelect => TASK_MULTIPLE_SELECT,
            Self::Measurement => TASK_MEASUREMENT,
            Self::Photo => TASK_PHOTO,
            Self::CodeReader => TASK_CODE_READER,
            Self::FileUpload => TASK_FILE_UPLOAD,
        }
    }

    /// Whether this task type requires a configured options list.
    pub fn expects_options(&self) -> bool {
        matches!(self, Self::MultipleChoice | Self::MultipleSelect)
    }

    /// Whether responses to this task carry file attachments.
    pub fn expects_attachments(&self) -> bool {
        matches!(self, Self::Photo | Self::FileUpload)
    }
}

// ---------------------------------------------------------------------------
// Snapshot value types
// ---------------------------------------------------------------------------

/// Numeric bounds configured on a measurement task.
///
/// Out-of-range responses are recorded and flagged, never rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementConfig {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub target: Option<f64>,
    pub unit: Option<String>,
}

/// A frozen instruction attached to a task snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionSnapshot {
    pub position: i32,
    pub title: String,
    pub body: String,
    /// Opaque storage path for instruction media; never interpreted here.
    pub media_path: Option<String>,
}

/// A form task as frozen at publish time.
///
/// `id` is the draft task's id at publish time; task responses reference it
/// as `task_snapshot_id` rather than through a live foreign key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: DbId,
    pub task_type: TaskType,
    pub description: String,
    pub is_required: bool,
    pub position: i32,
    pub measurement: Option<MeasurementConfig>,
    pub options: Vec<String>,
    pub instructions: Vec<InstructionSnapshot>,
}

/// The full frozen content of a published form version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSnapshot {
    pub form_id: DbId,
    pub form_name: String,
    pub version_number: i32,
    /// Tasks ordered by position.
    pub tasks: Vec<TaskSnapshot>,
}

impl FormSnapshot {
    /// Look up a task in the snapshot by its frozen id.
    pub fn task(&self, task_snapshot_id: DbId) -> Option<&TaskSnapshot> {
        self.tasks.iter().find(|t| t.id == task_snapshot_id)
    }

    /// Ids of tasks flagged as required.
    pub fn required_task_ids(&self) -> Vec<DbId> {
        self.tasks
            .iter()
            .filter(|t| t.is_required)
            .map(|t| t.id)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Draft config parsing
// ---------------------------------------------------------------------------

/// Parse a draft task's `config` JSON into typed snapshot fields.
///
/// Measurement tasks read `{"min": .., "max": .., "target": .., "unit": ..}`;
/// choice tasks read `{"options": ["..", ..]}`. Other task types carry no
/// config and any JSON present is ignored.
pub fn parse_task_config(
    task_type: TaskType,
    config: Option<&serde_json::Value>,
) -> Result<(Option<MeasurementConfig>, Vec<String>), String> {
    match task_type {
        TaskType::Measurement => {
            let Some(cfg) = config else {
                return Ok((None, Vec::new()));
            };
            let parsed: MeasurementConfig = serde_json::from_value(cfg.clone())
                .map_err(|e| format!("Invalid measurement config: {e}"))?;
            Ok((Some(parsed), Vec::new()))
        }
        TaskType::MultipleChoice | TaskType::MultipleSelect => {
            let Some(cfg) = config else {
                return Ok((None, Vec::new()));
            };
            let options = cfg
                .get("options")
                .and_then(|v| v.as_array())
                .map(|arr| {
                    arr.iter()
                        .map(|item| {
                            item.as_str()
                                .map(str::to_string)
                                .ok_or_else(|| "options entries must be strings".to_string())
                        })
                        .collect::<Result<Vec<_>, _>>()
                })
                .transpose()?
                .unwrap_or_default();
            Ok((None, options))
        }
        _ => Ok((None, Vec::new())),
    }
}

// ---------------------------------------------------------------------------
// Publish validation gate
// ---------------------------------------------------------------------------

/// Validate the frozen task list before a version is created.
///
/// Publishing fails when there are no tasks, when any description is blank,
/// when a measurement range is inverted, or when a choice task has no
/// usable options.
pub fn validate_publish_tasks(tasks: &[TaskSnapshot]) -> Result<(), String> {
    if tasks.is_empty() {
        return Err("Cannot publish a form with no draft tasks".to_string());
    }
    for task in tasks {
        if task.description.trim().is_empty() {
            return Err(format!(
                "Draft task {} has an empty description",
                task.id
            ));
        }
        if let Some(m) = &task.measurement {
            if let (Some(min), Some(max)) = (m.min, m.max) {
                if min > max {
                    return Err(format!(
                        "Draft task {} has an inverted measurement range ({min} > {max})",
                        task.id
                    ));
                }
            }
        }
        if task.task_type.expects_options() {
            if task.options.is_empty() {
                return Err(format!(
                    "Draft task {} is a choice task with no options",
                    task.id
                ));
            }
            if task.options.iter().any(|o| o.trim().is_empty()) {
                return Err(format!("Draft task {} has a blank option", task.id));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(id: DbId, task_type: TaskType, description: &str) -> TaskSnapshot {
        TaskSnapshot {
            id,
            task_type,
            description: description.to_string(),
            is_required: true,
            position: id as i32,
            measurement: None,
            options: Vec::new(),
            instructions: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // TaskType
    // -----------------------------------------------------------------------

    #[test]
    fn task_type_round_trip() {
        for s in VALID_TASK_TYPES {
            assert_eq!(TaskType::from_str_value(s).unwrap().as_str(), *s);
        }
    }

    #[test]
    fn invalid_task_type_rejected() {
        assert!(TaskType::from_str_value("essay").is_err());
    }

    #[test]
    fn choice_types_expect_options() {
        assert!(TaskType::MultipleChoice.expects_options());
        assert!(TaskType::MultipleSelect.expects_options());
        assert!(!TaskType::Question.expects_options());
    }

    #[test]
    fn upload_types_expect_attachments() {
        assert!(TaskType::Photo.expects_attachments());
        assert!(TaskType::FileUpload.expects_attachments());
        assert!(!TaskType::Measurement.expects_attachments());
    }

    // -----------------------------------------------------------------------
    // Config parsing
    // -----------------------------------------------------------------------

    #[test]
    fn parses_measurement_config() {
        let cfg = json!({"min": 3.0, "max": 5.0, "target": 4.0, "unit": "bar"});
        let (m, opts) = parse_task_config(TaskType::Measurement, Some(&cfg)).unwrap();
        let m = m.unwrap();
        assert_eq!(m.min, Some(3.0));
        assert_eq!(m.max, Some(5.0));
        assert_eq!(m.unit.as_deref(), Some("bar"));
        assert!(opts.is_empty());
    }

    #[test]
    fn parses_options_list() {
        let cfg = json!({"options": ["ok", "worn", "replace"]});
        let (m, opts) = parse_task_config(TaskType::MultipleChoice, Some(&cfg)).unwrap();
        assert!(m.is_none());
        assert_eq!(opts, vec!["ok", "worn", "replace"]);
    }

    #[test]
    fn non_string_option_rejected() {
        let cfg = json!({"options": ["ok", 3]});
        assert!(parse_task_config(TaskType::MultipleSelect, Some(&cfg)).is_err());
    }

    #[test]
    fn missing_config_yields_empty() {
        let (m, opts) = parse_task_config(TaskType::Measurement, None).unwrap();
        assert!(m.is_none());
        assert!(opts.is_empty());
    }

    #[test]
    fn question_ignores_config() {
        let cfg = json!({"anything": true});
        let (m, opts) = parse_task_config(TaskType::Question, Some(&cfg)).unwrap();
        assert!(m.is_none());
        assert!(opts.is_empty());
    }

    // -----------------------------------------------------------------------
    // Publish gate
    // -----------------------------------------------------------------------

    #[test]
    fn empty_task_list_fails() {
        let err = validate_publish_tasks(&[]).unwrap_err();
        assert!(err.contains("no draft tasks"));
    }

    #[test]
    fn blank_description_fails() {
        let tasks = vec![task(1, TaskType::Question, "  ")];
        let err = validate_publish_tasks(&tasks).unwrap_err();
        assert!(err.contains("empty description"));
    }

    #[test]
    fn inverted_measurement_range_fails() {
        let mut t = task(1, TaskType::Measurement, "Oil pressure");
        t.measurement = Some(MeasurementConfig {
            min: Some(5.0),
            max: Some(3.0),
            target: None,
            unit: None,
        });
        assert!(validate_publish_tasks(&[t]).is_err());
    }

    #[test]
    fn choice_without_options_fails() {
        let t = task(1, TaskType::MultipleChoice, "Belt condition");
        let err = validate_publish_tasks(&[t]).unwrap_err();
        assert!(err.contains("no options"));
    }

    #[test]
    fn blank_option_fails() {
        let mut t = task(1, TaskType::MultipleChoice, "Belt condition");
        t.options = vec!["ok".to_string(), " ".to_string()];
        assert!(validate_publish_tasks(&[t]).is_err());
    }

    #[test]
    fn valid_tasks_pass() {
        let mut choice = task(2, TaskType::MultipleChoice, "Belt condition");
        choice.options = vec!["ok".to_string(), "worn".to_string()];
        let tasks = vec![task(1, TaskType::Question, "Notes"), choice];
        assert!(validate_publish_tasks(&tasks).is_ok());
    }

    // -----------------------------------------------------------------------
    // Snapshot helpers
    // -----------------------------------------------------------------------

    #[test]
    fn snapshot_task_lookup_and_required_ids() {
        let mut optional = task(2, TaskType::Question, "Optional note");
        optional.is_required = false;
        let snapshot = FormSnapshot {
            form_id: 1,
            form_name: "Pump check".to_string(),
            version_number: 1,
            tasks: vec![task(1, TaskType::Question, "A"), optional, task(3, TaskType::Question, "C")],
        };
        assert_eq!(snapshot.task(3).unwrap().description, "C");
        assert!(snapshot.task(9).is_none());
        assert_eq!(snapshot.required_task_ids(), vec![1, 3]);
    }

    #[test]
    fn snapshot_serde_round_trip() {
        let snapshot = FormSnapshot {
            form_id: 4,
            form_name: "Compressor inspection".to_string(),
            version_number: 2,
            tasks: vec![task(10, TaskType::Measurement, "Pressure")],
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["tasks"][0]["task_type"], "measurement");
        let back: FormSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
    }
}
