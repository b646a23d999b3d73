//! Free-form questions over project memory. Read-only.

use aipm_core::{
    config::Prompts, context::Context, model::ProjectMemory, sanitize, traits::Provider,
};
use tracing::warn;

/// Compact text rendering of memory for the provider. Empty sections are
/// left out.
pub fn digest(memory: &ProjectMemory) -> String {
    let info = &memory.project_info;
    let mut lines = Vec::new();

    if !info.description.is_empty() {
        lines.push(format!("Project Description: {}", info.description));
    }
    if !info.start_date.is_empty() {
        lines.push(format!("Start Date: {}", info.start_date));
    }
    if let Some(end) = info.expected_end_date.as_deref().filter(|d| !d.is_empty()) {
        lines.push(format!("Expected End Date: {end}"));
    }
    if !info.notes.is_empty() {
        lines.push(format!("Project Notes: {}", info.notes.join("; ")));
    }
    if !memory.team.is_empty() {
        lines.push(format!("Team Members: {}", memory.team.join("; ")));
    }
    if !memory.tasks.is_empty() {
        let tasks: Vec<String> = memory
            .tasks
            .iter()
            .map(|t| {
                format!(
                    "{} (Assigned: {}, Priority: {}, Status: {})",
                    t.task, t.assignee, t.priority, t.status
                )
            })
            .collect();
        lines.push(format!("Tasks: {}", tasks.join("; ")));
    }
    if !memory.context_notes.is_empty() {
        lines.push(format!("Context Notes: {}", memory.context_notes.join("; ")));
    }

    lines.join("\n")
}

/// Answer `question` from memory in a few sentences. Provider failures come
/// back as the answer text.
pub async fn answer(
    provider: &dyn Provider,
    prompts: &Prompts,
    memory: &ProjectMemory,
    question: &str,
) -> String {
    let question = sanitize::sanitize(question).text;
    let message = format!(
        "Project Memory:\n{}\n\nUser Question:\n{question}",
        digest(memory)
    );
    let context = Context::new(&message).with_system(&prompts.query);

    match provider.complete(&context).await {
        Ok(completion) => completion.text.trim().to_string(),
        Err(e) => {
            warn!("query: provider failed: {e}");
            format!("Sorry, I could not answer that right now ({e}).")
        }
    }
}
