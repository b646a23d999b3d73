//! Pushes tasks to the tracker, one issue per task.
//!
//! Per task: look the issue up by correlation label, update it or create
//! it, then move it to the task's status if the workflow offers a matching
//! transition. A failing task is recorded and the batch carries on.

use aipm_core::{
    error::AipmError,
    issue::{CorrelationKey, IssueFields, RemoteIssue},
    model::Task,
    traits::Tracker,
};
use std::{fmt, sync::Arc};
use tracing::{info, warn};

/// Where in the per-task pipeline something went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Search,
    Create,
    Update,
    Transition,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Search => "search",
            Self::Create => "create",
            Self::Update => "update",
            Self::Transition => "transition",
        })
    }
}

/// One step of a sync, as reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Created { key: String, summary: String },
    Updated { key: String, summary: String },
    Transitioned { key: String, status: String },
    /// No transition with the wanted name; often the issue is already there.
    TransitionMissing { key: String, status: String },
    Failed {
        task_id: u64,
        stage: SyncStage,
        error: String,
    },
}

impl SyncOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn line(&self) -> String {
        match self {
            Self::Created { key, summary } => format!("Created {key}: {summary}"),
            Self::Updated { key, summary } => format!("Updated {key}: {summary}"),
            Self::Transitioned { key, status } => format!("  {key} moved to {status}"),
            Self::TransitionMissing { key, status } => {
                format!("  could not set {key} to {status} (maybe already correct)")
            }
            Self::Failed {
                task_id,
                stage,
                error,
            } => format!("Task {task_id} failed during {stage}: {error}"),
        }
    }
}

/// Everything a batch sync did, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub outcomes: Vec<SyncOutcome>,
}

impl SyncReport {
    pub fn lines(&self) -> Vec<String> {
        self.outcomes.iter().map(SyncOutcome::line).collect()
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }
}

/// Result of a remote delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { key: String },
    NotFound,
}

/// Drives a [`Tracker`] from local tasks. Never touches project memory.
pub struct SyncPlanner {
    tracker: Arc<dyn Tracker>,
    default_assignee: Option<String>,
}

impl SyncPlanner {
    pub fn new(tracker: Arc<dyn Tracker>, default_assignee: Option<String>) -> Self {
        Self {
            tracker,
            default_assignee: default_assignee.filter(|a| !a.trim().is_empty()),
        }
    }

    /// Sync every task in order.
    pub async fn sync(&self, tasks: &[Task]) -> SyncReport {
        let mut report = SyncReport::default();
        for task in tasks {
            self.sync_one(task, &mut report.outcomes).await;
        }
        info!(
            "sync: {} task(s) pushed to {}, {} failure(s)",
            tasks.len(),
            self.tracker.name(),
            report.failures()
        );
        report
    }

    async fn sync_one(&self, task: &Task, outcomes: &mut Vec<SyncOutcome>) {
        let failed = |stage: SyncStage, e: AipmError| {
            warn!("sync: task {} failed during {stage}: {e}", task.id);
            SyncOutcome::Failed {
                task_id: task.id,
                stage,
                error: e.to_string(),
            }
        };

        let key = task.correlation_key();
        let existing = match self.tracker.find_by_label(key).await {
            Ok(found) => found,
            Err(e) => return outcomes.push(failed(SyncStage::Search, e)),
        };

        let issue_key = match existing {
            Some(issue) => {
                let fields = self.fields(task, None);
                if let Err(e) = self.tracker.update_issue(&issue.key, &fields).await {
                    return outcomes.push(failed(SyncStage::Update, e));
                }
                outcomes.push(SyncOutcome::Updated {
                    key: issue.key.clone(),
                    summary: fields.summary,
                });
                issue.key
            }
            None => {
                let fields = self.fields(task, self.default_assignee.clone());
                let created: RemoteIssue = match self.tracker.create_issue(&fields).await {
                    Ok(issue) => issue,
                    Err(e) => return outcomes.push(failed(SyncStage::Create, e)),
                };
                outcomes.push(SyncOutcome::Created {
                    key: created.key.clone(),
                    summary: fields.summary,
                });
                created.key
            }
        };

        match self.move_to_status(&issue_key, task.status.as_str()).await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => outcomes.push(failed(SyncStage::Transition, e)),
        }
    }

    async fn move_to_status(&self, issue_key: &str, status: &str) -> Result<SyncOutcome, AipmError> {
        let transitions = self.tracker.transitions(issue_key).await?;
        let Some(transition) = transitions
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(status))
        else {
            warn!("sync: no '{status}' transition for {issue_key}");
            return Ok(SyncOutcome::TransitionMissing {
                key: issue_key.to_string(),
                status: status.to_string(),
            });
        };

        self.tracker
            .apply_transition(issue_key, &transition.id)
            .await?;
        Ok(SyncOutcome::Transitioned {
            key: issue_key.to_string(),
            status: status.to_string(),
        })
    }

    /// Delete the issue carrying the task's label. Transport errors propagate.
    pub async fn delete(&self, task_id: u64) -> Result<DeleteOutcome, AipmError> {
        let Some(issue) = self
            .tracker
            .find_by_label(CorrelationKey::new(task_id))
            .await?
        else {
            return Ok(DeleteOutcome::NotFound);
        };
        self.tracker.delete_issue(&issue.key).await?;
        info!("sync: deleted {} for task {task_id}", issue.key);
        Ok(DeleteOutcome::Deleted { key: issue.key })
    }

    fn fields(&self, task: &Task, assignee: Option<String>) -> IssueFields {
        IssueFields {
            summary: issue_summary(task),
            description: issue_description(task),
            priority: task.priority,
            label: task.correlation_key(),
            assignee,
        }
    }
}

/// `[<id>] <task>`.
pub fn issue_summary(task: &Task) -> String {
    format!("[{}] {}", task.id, task.task)
}

/// Issue body in Jira wiki markup. The transcript's assignee and status
/// live here; the tracker's own fields use its identity space.
pub fn issue_description(task: &Task) -> String {
    format!(
        "*Task ID:* {}\n\
         *Giver:* {}\n\
         *Assignee (from transcript):* {}\n\
         *Deliverable:* {}\n\
         *Deadline:* {}\n\
         *Priority:* {}\n\
         *Status (from transcript):* {}\n",
        task.id,
        task.giver,
        task.assignee,
        task.deliverable.as_deref().unwrap_or(""),
        task.deadline.as_deref().unwrap_or(""),
        task.priority,
        task.status,
    )
}
