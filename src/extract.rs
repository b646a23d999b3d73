//! Entity extraction: one transcript in, a metadata delta and a task list out.
//!
//! The provider is an untrusted producer. Its reply must be exactly the JSON
//! we asked for (one surrounding code fence is tolerated); anything else
//! fails the whole call.

use aipm_core::{
    config::{render, Prompts},
    context::Context,
    error::AipmError,
    model::{MetadataDelta, ProjectMemory, Task},
    sanitize,
    traits::Provider,
};
use aipm_memory::merge::next_task_id;
use serde::de::DeserializeOwned;
use std::fmt::Write;
use tracing::{debug, info, warn};

/// Length of the reply excerpt quoted in parse errors.
const EXCERPT_CHARS: usize = 160;

/// Memory plus transcript, as the provider sees it.
pub fn render_context(memory: &ProjectMemory, transcript: &str) -> String {
    let mut out = String::new();

    if !memory.project_name.is_empty() || !memory.project_info.description.is_empty() {
        out.push_str("Project Info:\n");
        let _ = writeln!(out, "Title: {}", memory.project_name);
        let _ = writeln!(out, "Description: {}\n", memory.project_info.description);
    }

    if !memory.tasks.is_empty() {
        out.push_str("Existing tasks:\n");
        for t in &memory.tasks {
            let _ = writeln!(
                out,
                "{} - {} (Giver: {}, Assignee: {}, Deadline: {}, Priority: {}, Status: {}, Deliverable: {})",
                t.id,
                t.task,
                t.giver,
                t.assignee,
                t.deadline.as_deref().unwrap_or(""),
                t.priority,
                t.status,
                t.deliverable.as_deref().unwrap_or(""),
            );
        }
    }

    if !memory.team.is_empty() {
        out.push_str("Team members:\n");
        for member in &memory.team {
            let _ = writeln!(out, "- {member}");
        }
    }

    out.push_str("\nCurrent Meeting Transcript:\n");
    out.push_str(transcript);
    out
}

/// Ask for project metadata and team changes.
pub async fn extract_metadata(
    provider: &dyn Provider,
    prompts: &Prompts,
    memory: &ProjectMemory,
    transcript: &str,
) -> Result<MetadataDelta, AipmError> {
    let context = render_context(memory, &clean_transcript(transcript));
    let team = team_list(memory);
    let prompt = render(
        &prompts.metadata,
        &[("team", team.as_str()), ("context", context.as_str())],
    );

    let reply = ask(provider, &prompt).await?;
    let delta: MetadataDelta = parse_structured(&reply)?;
    info!(
        "extract: metadata with {} joining, {} leaving",
        delta.team_add.len(),
        delta.team_remove.len()
    );
    Ok(delta)
}

/// Ask for every task in the transcript. Ids are as proposed by the
/// provider; fitting them into memory is the resolver's job.
pub async fn extract_tasks(
    provider: &dyn Provider,
    prompts: &Prompts,
    memory: &ProjectMemory,
    transcript: &str,
) -> Result<Vec<Task>, AipmError> {
    let context = render_context(memory, &clean_transcript(transcript));
    let first_id = next_task_id(memory)?.to_string();
    let team = team_list(memory);
    let prompt = render(
        &prompts.tasks,
        &[
            ("first_id", first_id.as_str()),
            ("team", team.as_str()),
            ("context", context.as_str()),
        ],
    );

    let reply = ask(provider, &prompt).await?;
    let tasks: Vec<Task> = parse_structured(&reply)?;
    for task in &tasks {
        task.validate()
            .map_err(|e| AipmError::MalformedResponse(e.to_string()))?;
    }
    info!("extract: {} task(s)", tasks.len());
    Ok(tasks)
}

/// Strict parse of a provider reply into `T`.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T, AipmError> {
    let body = strip_code_fence(text);
    serde_json::from_str(body).map_err(|e| {
        AipmError::MalformedResponse(format!("{e}; reply began: {}", excerpt(text)))
    })
}

async fn ask(provider: &dyn Provider, prompt: &str) -> Result<String, AipmError> {
    let context = Context::new(prompt).deterministic();
    let completion = provider.complete(&context).await?;
    debug!(
        "extract: {} replied in {}ms",
        completion.metadata.provider_used, completion.metadata.processing_time_ms
    );
    Ok(completion.text)
}

fn clean_transcript(transcript: &str) -> String {
    let result = sanitize::sanitize(transcript);
    if result.was_modified() {
        warn!(
            "extract: neutralized role markers in transcript: {:?}",
            result.neutralized
        );
    }
    result.text
}

fn team_list(memory: &ProjectMemory) -> String {
    if memory.team.is_empty() {
        "(none yet)".to_string()
    } else {
        memory.team.join(", ")
    }
}

/// Remove one surrounding ``` fence (with or without a language tag).
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(EXCERPT_CHARS) {
        Some((end, _)) => format!("{}...", &trimmed[..end]),
        None => trimmed.to_string(),
    }
}
