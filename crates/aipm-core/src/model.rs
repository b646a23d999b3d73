//! Project memory document and the task entities it holds.
//!
//! One `ProjectMemory` exists per deployment. It is serialized as a single
//! JSON document and always loaded/saved whole.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AipmError;
use crate::issue::CorrelationKey;

/// First id handed out when nothing has been numbered yet.
pub const FIRST_TASK_ID: u64 = 1001;

/// Task priority. Maps one-to-one onto tracker priority names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = AipmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" | "" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(AipmError::Invalid(format!("unknown priority '{other}'"))),
        }
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Local task status. The tracker is asked for a workflow transition with
/// the same name (case-insensitive).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Done")]
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToDo => "To Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = AipmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match folded.as_str() {
            "todo" | "" => Ok(Self::ToDo),
            "inprogress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            _ => Err(AipmError::Invalid(format!("unknown status '{}'", s.trim()))),
        }
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A single action item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub giver: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assignee: String,
    pub task: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub deadline: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub deliverable: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
}

impl Task {
    /// Label that links this task to its tracker issue.
    pub fn correlation_key(&self) -> CorrelationKey {
        CorrelationKey::new(self.id)
    }

    /// Reject tasks without a usable description.
    pub fn validate(&self) -> Result<(), AipmError> {
        if self.task.trim().is_empty() {
            return Err(AipmError::Invalid(format!(
                "task {} has an empty description",
                self.id
            )));
        }
        Ok(())
    }

    /// Overwrite the fields present in `patch`.
    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(v) = patch.giver {
            self.giver = v;
        }
        if let Some(v) = patch.assignee {
            self.assignee = v;
        }
        if let Some(v) = patch.task {
            self.task = v;
        }
        if let Some(v) = patch.deadline {
            self.deadline = non_blank(v);
        }
        if let Some(v) = patch.deliverable {
            self.deliverable = non_blank(v);
        }
        if let Some(v) = patch.priority {
            self.priority = v;
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
    }
}

/// Partial update for an existing task. `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    pub giver: Option<String>,
    pub assignee: Option<String>,
    pub task: Option<String>,
    pub deadline: Option<String>,
    pub deliverable: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A manually entered task. Without an id the next free one is assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub giver: String,
    #[serde(default)]
    pub assignee: String,
    pub task: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub deadline: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub deliverable: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
}

impl NewTask {
    pub fn into_task(self, id: u64) -> Task {
        Task {
            id,
            giver: self.giver,
            assignee: self.assignee,
            task: self.task,
            deadline: self.deadline,
            deliverable: self.deliverable,
            priority: self.priority,
            status: self.status,
        }
    }
}

/// Descriptive project information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default)]
    pub description: String,
    pub start_date: String,
    #[serde(default)]
    pub expected_end_date: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// Bookkeeping for the memory document itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMetadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub meeting_count: u64,
}

/// The single project memory document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMemory {
    #[serde(default)]
    pub project_name: String,
    pub project_info: ProjectInfo,
    #[serde(default)]
    pub team: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub context_notes: Vec<String>,
    pub metadata: MemoryMetadata,
}

impl ProjectMemory {
    /// Fresh document: empty project starting today.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            project_name: String::new(),
            project_info: ProjectInfo {
                description: String::new(),
                start_date: now.format("%Y-%m-%d").to_string(),
                expected_end_date: None,
                notes: Vec::new(),
                updated_at: now,
            },
            team: Vec::new(),
            tasks: Vec::new(),
            context_notes: Vec::new(),
            metadata: MemoryMetadata {
                created_at: now,
                updated_at: now,
                meeting_count: 0,
            },
        }
    }

    /// Mark the document as modified.
    pub fn touch(&mut self) {
        self.metadata.updated_at = Utc::now();
    }

    pub fn task(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn has_task(&self, id: u64) -> bool {
        self.task(id).is_some()
    }
}

impl Default for ProjectMemory {
    fn default() -> Self {
        Self::new()
    }
}

/// Project-info part of a metadata delta.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfoDelta {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: Vec<String>,
}

/// Metadata updates extracted from one transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataDelta {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub project_name: Option<String>,
    #[serde(default)]
    pub project_info: Option<ProjectInfoDelta>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team_add: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team_remove: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub context_notes: Vec<String>,
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// `""` and `null` both mean "not given".
fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.and_then(non_blank))
}

/// Models like to send `null` for empty lists.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
