//! Review file between `extract` and `save`: a JSON array of tasks the
//! facilitator can edit by hand. Not a durable interface.

use aipm_core::{error::AipmError, model::Task};
use std::path::Path;
use tracing::info;

/// Default file name, next to where the command runs.
pub const DEFAULT_STAGING_FILE: &str = "approval.json";

/// Write tasks for review, replacing the file.
pub fn write(path: &Path, tasks: &[Task]) -> Result<(), AipmError> {
    let body = serde_json::to_string_pretty(tasks)?;
    std::fs::write(path, body + "\n")?;
    info!("staging: wrote {} task(s) to {}", tasks.len(), path.display());
    Ok(())
}

/// Read a reviewed batch back. Every task must still be valid.
pub fn read(path: &Path) -> Result<Vec<Task>, AipmError> {
    let body = std::fs::read_to_string(path)?;
    let tasks: Vec<Task> = serde_json::from_str(&body)?;
    for task in &tasks {
        task.validate()?;
    }
    Ok(tasks)
}
