//! Merging extracted facts and caller edits into project memory.
//!
//! Every function that changes the document refreshes
//! `metadata.updated_at`. Nothing here persists; callers save.

use aipm_core::{
    error::AipmError,
    model::{MetadataDelta, ProjectMemory, Task, TaskPatch, FIRST_TASK_ID},
    traits::IdentityResolver,
};
use chrono::Utc;

/// What a batch upsert did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpsertSummary {
    pub inserted: usize,
    pub updated: usize,
}

/// Fold one transcript's metadata into memory.
///
/// Name and description are last-write-wins, notes are appended without
/// dedup, and the meeting counter goes up by exactly one.
pub fn apply_metadata(
    memory: &mut ProjectMemory,
    delta: &MetadataDelta,
    resolver: &dyn IdentityResolver,
) {
    if let Some(name) = &delta.project_name {
        memory.project_name = name.clone();
    }

    if let Some(info) = &delta.project_info {
        let mut info_changed = false;
        if let Some(description) = &info.description {
            memory.project_info.description = description.clone();
            info_changed = true;
        }
        let notes = non_blank(&info.notes);
        if !notes.is_empty() {
            memory.project_info.notes.extend(notes);
            info_changed = true;
        }
        if info_changed {
            memory.project_info.updated_at = Utc::now();
        }
    }

    memory.context_notes.extend(non_blank(&delta.context_notes));

    resolver.merge_team(&mut memory.team, &delta.team_add, &delta.team_remove);

    memory.metadata.meeting_count += 1;
    memory.touch();
}

/// Batch upsert: a task whose id is already stored replaces it field by
/// field in place, anything else is appended.
pub fn upsert_tasks(memory: &mut ProjectMemory, tasks: Vec<Task>) -> UpsertSummary {
    let mut summary = UpsertSummary::default();
    for task in tasks {
        match memory.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(stored) => {
                *stored = task;
                summary.updated += 1;
            }
            None => {
                memory.tasks.push(task);
                summary.inserted += 1;
            }
        }
    }
    memory.touch();
    summary
}

/// Single explicit add. Refuses to overwrite; memory is untouched on error.
pub fn insert_task(memory: &mut ProjectMemory, task: Task) -> Result<(), AipmError> {
    if memory.has_task(task.id) {
        return Err(AipmError::DuplicateId(task.id));
    }
    memory.tasks.push(task);
    memory.touch();
    Ok(())
}

/// Patch one task. `Ok(None)` when the id is unknown; an update that would
/// leave the task invalid is rejected without changing anything.
pub fn update_task(
    memory: &mut ProjectMemory,
    id: u64,
    patch: TaskPatch,
) -> Result<Option<Task>, AipmError> {
    let Some(index) = memory.tasks.iter().position(|t| t.id == id) else {
        return Ok(None);
    };

    let mut updated = memory.tasks[index].clone();
    updated.apply(patch);
    updated.validate()?;

    memory.tasks[index] = updated.clone();
    memory.touch();
    Ok(Some(updated))
}

/// Drop a task by id.
pub fn remove_task(memory: &mut ProjectMemory, id: u64) -> Option<Task> {
    let index = memory.tasks.iter().position(|t| t.id == id)?;
    let removed = memory.tasks.remove(index);
    memory.touch();
    Some(removed)
}

/// Replace the project notes wholesale.
pub fn replace_notes(memory: &mut ProjectMemory, notes: Vec<String>) {
    memory.project_info.notes = non_blank(&notes);
    memory.project_info.updated_at = Utc::now();
    memory.touch();
}

/// Lowest id above everything stored, never below the first task id.
pub fn next_task_id(memory: &ProjectMemory) -> Result<u64, AipmError> {
    match memory.tasks.iter().map(|t| t.id).max() {
        None => Ok(FIRST_TASK_ID),
        Some(max) => max
            .max(FIRST_TASK_ID - 1)
            .checked_add(1)
            .ok_or_else(|| AipmError::Invalid(format!("no task id left above {max}"))),
    }
}

fn non_blank(items: &[String]) -> Vec<String> {
    items
        .iter()
        .filter(|s| !s.trim().is_empty())
        .cloned()
        .collect()
}
