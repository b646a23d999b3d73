//! Caller-facing entry points.
//!
//! Every call is one load, mutate, save cycle over the project memory,
//! followed by a tracker sync where it applies. Nothing runs in the
//! background and nothing is retried.

use crate::{extract, query};
use aipm_core::{
    config::Prompts,
    error::AipmError,
    issue::CorrelationKey,
    model::{NewTask, ProjectMemory, Task, TaskPatch},
    traits::{IdentityResolver, Provider},
};
use aipm_memory::{
    merge, AuditEntry, AuditLogger, AuditStatus, ExactNameResolver, MemoryAdapter,
};
use aipm_tracker::{DeleteOutcome, SyncPlanner};
use std::sync::Arc;
use tracing::{info, warn};

/// How an entry point ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    NotFound,
    Rejected,
    Error,
}

impl Status {
    fn audit(self) -> AuditStatus {
        match self {
            Self::Success => AuditStatus::Ok,
            Self::NotFound => AuditStatus::NotFound,
            Self::Rejected => AuditStatus::Rejected,
            Self::Error => AuditStatus::Error,
        }
    }
}

/// Status, a human-readable message, and per-item lines for batch work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: Status,
    pub message: String,
    pub items: Vec<String>,
}

impl Outcome {
    pub fn success(message: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
            items,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: Status::NotFound,
            message: message.into(),
            items: Vec::new(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            status: Status::Rejected,
            message: message.into(),
            items: Vec::new(),
        }
    }

    /// A transport or storage failure, for display.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
            items: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Result of `extract`: the outcome plus the merged tasks, for review.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub outcome: Outcome,
    pub tasks: Vec<Task>,
}

/// Ties provider, memory, resolver and (optionally) tracker together.
pub struct Engine {
    provider: Arc<dyn Provider>,
    memory: MemoryAdapter,
    prompts: Prompts,
    resolver: Box<dyn IdentityResolver>,
    sync: Option<SyncPlanner>,
    audit: Option<AuditLogger>,
}

impl Engine {
    pub fn new(provider: Arc<dyn Provider>, memory: MemoryAdapter, prompts: Prompts) -> Self {
        Self {
            provider,
            memory,
            prompts,
            resolver: Box::new(ExactNameResolver),
            sync: None,
            audit: None,
        }
    }

    /// Mirror task changes onto a tracker.
    pub fn with_sync(mut self, planner: SyncPlanner) -> Self {
        self.sync = Some(planner);
        self
    }

    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Run one transcript through extraction and merge it into memory.
    ///
    /// Memory is saved once, after both extraction calls succeed; a
    /// malformed reply leaves it untouched. Nothing is synced: the returned
    /// tasks go to review first.
    pub async fn extract(&self, transcript: &str) -> Result<Extraction, AipmError> {
        if transcript.trim().is_empty() {
            let outcome = Outcome::rejected("transcript is empty");
            self.record("extract", None, &outcome).await;
            return Ok(Extraction {
                outcome,
                tasks: Vec::new(),
            });
        }

        let mut memory = self.memory.load().await?;

        let delta =
            extract::extract_metadata(self.provider.as_ref(), &self.prompts, &memory, transcript)
                .await?;
        merge::apply_metadata(&mut memory, &delta, self.resolver.as_ref());

        let extracted =
            extract::extract_tasks(self.provider.as_ref(), &self.prompts, &memory, transcript)
                .await?;
        let tasks = self.resolver.assign_ids(&memory.tasks, extracted)?;
        let summary = merge::upsert_tasks(&mut memory, tasks.clone());

        self.memory.save(&mut memory).await?;
        info!(
            "engine: meeting {} merged, {} new task(s), {} updated",
            memory.metadata.meeting_count, summary.inserted, summary.updated
        );

        let outcome = Outcome::success(
            format!(
                "Extracted {} task(s): {} new, {} updated",
                tasks.len(),
                summary.inserted,
                summary.updated
            ),
            tasks.iter().map(task_line).collect(),
        );
        self.record("extract", None, &outcome).await;
        Ok(Extraction { outcome, tasks })
    }

    /// Save a reviewed batch. Existing ids are overwritten without
    /// complaint, then the batch is synced.
    pub async fn save_tasks(&self, tasks: Vec<Task>) -> Result<Outcome, AipmError> {
        if let Some(err) = tasks.iter().find_map(|t| t.validate().err()) {
            let outcome = Outcome::rejected(err.to_string());
            self.record("save", None, &outcome).await;
            return Ok(outcome);
        }

        let mut memory = self.memory.load().await?;
        let summary = merge::upsert_tasks(&mut memory, tasks.clone());
        self.memory.save(&mut memory).await?;

        let (items, note) = self.push(&tasks).await;
        let outcome = Outcome::success(
            format!(
                "Saved {} task(s): {} new, {} updated. {note}",
                tasks.len(),
                summary.inserted,
                summary.updated
            ),
            items,
        );
        self.record("save", None, &outcome).await;
        Ok(outcome)
    }

    /// Add one task by hand. An explicit id that is already taken is an
    /// error and memory is left exactly as it was.
    pub async fn add_task(&self, new: NewTask) -> Result<Outcome, AipmError> {
        let mut memory = self.memory.load().await?;
        let id = match new.id {
            Some(id) => id,
            None => match merge::next_task_id(&memory) {
                Ok(id) => id,
                Err(e) => {
                    let outcome = Outcome::rejected(e.to_string());
                    self.record("add", None, &outcome).await;
                    return Ok(outcome);
                }
            },
        };
        let task = new.into_task(id);
        let subject = Some(id.to_string());

        if let Err(e) = task.validate() {
            let outcome = Outcome::rejected(e.to_string());
            self.record("add", subject, &outcome).await;
            return Ok(outcome);
        }

        if let Err(e) = merge::insert_task(&mut memory, task.clone()) {
            warn!("engine: add rejected: {e}");
            self.record("add", subject, &Outcome::rejected(e.to_string()))
                .await;
            return Err(e);
        }
        self.memory.save(&mut memory).await?;

        let (items, note) = self.push(std::slice::from_ref(&task)).await;
        let outcome = Outcome::success(format!("Added task {id}. {note}"), items);
        self.record("add", subject, &outcome).await;
        Ok(outcome)
    }

    /// Patch one task and sync it.
    pub async fn update_task(&self, id: u64, patch: TaskPatch) -> Result<Outcome, AipmError> {
        let subject = Some(id.to_string());
        if patch.is_empty() {
            let outcome = Outcome::rejected("nothing to update");
            self.record("update", subject, &outcome).await;
            return Ok(outcome);
        }

        let mut memory = self.memory.load().await?;
        let updated = match merge::update_task(&mut memory, id, patch) {
            Ok(Some(task)) => task,
            Ok(None) => {
                let outcome = Outcome::not_found(format!("Task {id} not found"));
                self.record("update", subject, &outcome).await;
                return Ok(outcome);
            }
            Err(AipmError::Invalid(reason)) => {
                let outcome = Outcome::rejected(reason);
                self.record("update", subject, &outcome).await;
                return Ok(outcome);
            }
            Err(e) => return Err(e),
        };
        self.memory.save(&mut memory).await?;

        let (items, note) = self.push(std::slice::from_ref(&updated)).await;
        let outcome = Outcome::success(format!("Updated task {id}. {note}"), items);
        self.record("update", subject, &outcome).await;
        Ok(outcome)
    }

    /// Delete a task from the tracker, then from memory.
    ///
    /// A tracker that has no such issue is fine; a tracker that cannot be
    /// reached aborts before memory is touched.
    pub async fn delete_task(&self, id: u64) -> Result<Outcome, AipmError> {
        let mut items = Vec::new();
        let mut found = false;

        if let Some(sync) = &self.sync {
            match sync.delete(id).await? {
                DeleteOutcome::Deleted { key } => {
                    found = true;
                    items.push(format!("Deleted {key} from the tracker"));
                }
                DeleteOutcome::NotFound => {
                    items.push(format!("No tracker issue labelled {}", CorrelationKey::new(id)));
                }
            }
        }

        let mut memory = self.memory.load().await?;
        if merge::remove_task(&mut memory, id).is_some() {
            self.memory.save(&mut memory).await?;
            found = true;
            items.push(format!("Removed task {id} from memory"));
        }

        let outcome = if found {
            Outcome::success(format!("Deleted task {id}"), items)
        } else {
            Outcome {
                status: Status::NotFound,
                message: format!("Task {id} not found locally or in the tracker"),
                items,
            }
        };
        self.record("delete", Some(id.to_string()), &outcome).await;
        Ok(outcome)
    }

    /// One task, rendered field by field.
    pub async fn get_task(&self, id: u64) -> Result<Outcome, AipmError> {
        let memory = self.memory.load().await?;
        Ok(match memory.task(id) {
            Some(task) => Outcome::success(task_line(task), task_fields(task)),
            None => Outcome::not_found(format!("Task {id} not found")),
        })
    }

    /// The whole memory document.
    pub async fn memory(&self) -> Result<ProjectMemory, AipmError> {
        self.memory.load().await
    }

    /// Replace the project notes.
    pub async fn replace_notes(&self, notes: Vec<String>) -> Result<Outcome, AipmError> {
        let mut memory = self.memory.load().await?;
        merge::replace_notes(&mut memory, notes);
        self.memory.save(&mut memory).await?;
        let outcome = Outcome::success(
            format!("{} project note(s) saved", memory.project_info.notes.len()),
            memory.project_info.notes.clone(),
        );
        self.record("notes", None, &outcome).await;
        Ok(outcome)
    }

    /// Answer a question from memory. Never writes.
    pub async fn ask(&self, question: &str) -> Result<Outcome, AipmError> {
        if question.trim().is_empty() {
            return Ok(Outcome::rejected("question is empty"));
        }
        let memory = self.memory.load().await?;
        let answer = query::answer(self.provider.as_ref(), &self.prompts, &memory, question).await;
        Ok(Outcome::success(answer, Vec::new()))
    }

    /// Sync tasks if a tracker is configured. Returns the per-step lines
    /// and a one-sentence note for the message.
    async fn push(&self, tasks: &[Task]) -> (Vec<String>, String) {
        let Some(sync) = &self.sync else {
            return (
                Vec::new(),
                "Tracker not configured, nothing synced.".to_string(),
            );
        };
        let report = sync.sync(tasks).await;
        let note = match report.failures() {
            0 => "Tracker updated.".to_string(),
            n => format!("Tracker updated with {n} failure(s)."),
        };
        (report.lines(), note)
    }

    async fn record(&self, operation: &str, subject: Option<String>, outcome: &Outcome) {
        let Some(audit) = &self.audit else {
            return;
        };
        let entry = AuditEntry {
            operation: operation.to_string(),
            subject,
            status: outcome.status.audit(),
            message: outcome.message.clone(),
            items: outcome.items.clone(),
        };
        if let Err(e) = audit.log(&entry).await {
            warn!("engine: audit write failed: {e}");
        }
    }
}

/// `[1001] Draft spec (Bob Singh, High, In Progress)`.
pub fn task_line(task: &Task) -> String {
    let assignee = if task.assignee.is_empty() {
        "unassigned"
    } else {
        task.assignee.as_str()
    };
    format!(
        "[{}] {} ({assignee}, {}, {})",
        task.id, task.task, task.priority, task.status
    )
}

fn task_fields(task: &Task) -> Vec<String> {
    vec![
        format!("Giver: {}", task.giver),
        format!("Assignee: {}", task.assignee),
        format!("Deliverable: {}", task.deliverable.as_deref().unwrap_or("-")),
        format!("Deadline: {}", task.deadline.as_deref().unwrap_or("-")),
        format!("Priority: {}", task.priority),
        format!("Status: {}", task.status),
    ]
}

#[cfg(test)]
mod tests;
