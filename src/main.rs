mod engine;
mod extract;
mod query;
mod staging;
mod telemetry;

use aipm_core::{
    config::{self, install_bundled_prompts, Config, Prompts},
    model::{NewTask, Priority, TaskPatch, TaskStatus},
    traits::{Provider, Tracker},
};
use aipm_memory::{AuditLogger, MemoryAdapter, Store};
use aipm_providers::{ollama::OllamaProvider, openai::OpenAiProvider};
use aipm_tracker::{JiraClient, SyncPlanner};
use clap::{Args, Parser, Subcommand};
use engine::{task_line, Engine, Outcome, Status};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::warn;

#[derive(Parser)]
#[command(
    name = "aipm",
    version,
    about = "Meeting transcripts to tracked tasks: extract, reconcile, sync"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract metadata and tasks from a transcript and merge them into memory.
    Extract {
        /// Transcript file.
        file: PathBuf,
        /// Where to write the extracted tasks for review.
        #[arg(long, default_value = staging::DEFAULT_STAGING_FILE)]
        out: PathBuf,
        /// Skip review and push the tasks to the tracker right away.
        #[arg(long)]
        sync: bool,
    },
    /// Save a reviewed task file and sync it to the tracker.
    Save {
        #[arg(default_value = staging::DEFAULT_STAGING_FILE)]
        file: PathBuf,
    },
    /// Add one task by hand.
    Add {
        /// Explicit id. Must not be taken.
        #[arg(long)]
        id: Option<u64>,
        /// What needs to be done.
        #[arg(long)]
        task: String,
        #[command(flatten)]
        fields: TaskFields,
    },
    /// Change fields of an existing task.
    Update {
        id: u64,
        #[arg(long)]
        task: Option<String>,
        #[command(flatten)]
        fields: TaskFields,
    },
    /// Delete a task from the tracker and from memory.
    Delete { id: u64 },
    /// Show the project memory, or one task.
    Show { id: Option<u64> },
    /// Replace the project notes.
    Notes {
        #[arg(required = true)]
        notes: Vec<String>,
    },
    /// Ask a question about the project.
    Ask {
        #[arg(trailing_var_arg = true)]
        question: Vec<String>,
    },
    /// Check configuration, provider and tracker.
    Status,
}

#[derive(Args)]
struct TaskFields {
    #[arg(long)]
    giver: Option<String>,
    #[arg(long)]
    assignee: Option<String>,
    #[arg(long)]
    deadline: Option<String>,
    #[arg(long)]
    deliverable: Option<String>,
    /// High, Medium or Low.
    #[arg(long)]
    priority: Option<Priority>,
    /// "To Do", "In Progress" or "Done".
    #[arg(long)]
    status: Option<TaskStatus>,
}

/// Everything a command may need, built once from config.
struct App {
    engine: Engine,
    provider: Arc<dyn Provider>,
    tracker: Option<Arc<dyn Tracker>>,
    audit: AuditLogger,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;
    let _log_guard = telemetry::init(&cfg.aipm.log_level, &cfg.aipm.data_dir);
    install_bundled_prompts(&cfg.aipm.data_dir);

    let app = build_app(&cfg).await?;
    let outcome = match run(&app, &cfg, &cli.config, cli.command).await {
        Ok(outcome) => outcome,
        Err(e) => Outcome::error(format!("{e:#}")),
    };
    print_outcome(&outcome);

    Ok(match outcome.status {
        Status::Success => ExitCode::SUCCESS,
        Status::NotFound | Status::Rejected => ExitCode::from(2),
        Status::Error => ExitCode::FAILURE,
    })
}

async fn run(app: &App, cfg: &Config, config_path: &str, command: Commands) -> anyhow::Result<Outcome> {
    let engine = &app.engine;
    Ok(match command {
        Commands::Extract { file, out, sync } => {
            let transcript = std::fs::read_to_string(&file)
                .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", file.display()))?;
            let extraction = engine.extract(&transcript).await?;
            if !extraction.outcome.is_success() {
                return Ok(extraction.outcome);
            }
            if sync {
                engine.save_tasks(extraction.tasks).await?
            } else {
                staging::write(&out, &extraction.tasks)?;
                let mut outcome = extraction.outcome;
                outcome.message = format!(
                    "{}. Review {} then run `aipm save`.",
                    outcome.message,
                    out.display()
                );
                outcome
            }
        }
        Commands::Save { file } => engine.save_tasks(staging::read(&file)?).await?,
        Commands::Add { id, task, fields } => {
            engine
                .add_task(NewTask {
                    id,
                    giver: fields.giver.unwrap_or_default(),
                    assignee: fields.assignee.unwrap_or_default(),
                    task,
                    deadline: fields.deadline.filter(|d| !d.trim().is_empty()),
                    deliverable: fields.deliverable.filter(|d| !d.trim().is_empty()),
                    priority: fields.priority.unwrap_or_default(),
                    status: fields.status.unwrap_or_default(),
                })
                .await?
        }
        Commands::Update { id, task, fields } => {
            engine
                .update_task(
                    id,
                    TaskPatch {
                        giver: fields.giver,
                        assignee: fields.assignee,
                        task,
                        deadline: fields.deadline,
                        deliverable: fields.deliverable,
                        priority: fields.priority,
                        status: fields.status,
                    },
                )
                .await?
        }
        Commands::Delete { id } => engine.delete_task(id).await?,
        Commands::Show { id: Some(id) } => engine.get_task(id).await?,
        Commands::Show { id: None } => show_memory(engine).await?,
        Commands::Notes { notes } => engine.replace_notes(notes).await?,
        Commands::Ask { question } => engine.ask(&question.join(" ")).await?,
        Commands::Status => status(app, cfg, config_path).await?,
    })
}

async fn show_memory(engine: &Engine) -> anyhow::Result<Outcome> {
    let memory = engine.memory().await?;
    let name = if memory.project_name.is_empty() {
        "(unnamed project)"
    } else {
        memory.project_name.as_str()
    };

    let mut items = Vec::new();
    if !memory.project_info.description.is_empty() {
        items.push(format!("Description: {}", memory.project_info.description));
    }
    items.push(format!("Started: {}", memory.project_info.start_date));
    items.push(format!("Team: {}", memory.team.join(", ")));
    for note in &memory.project_info.notes {
        items.push(format!("Note: {note}"));
    }
    for note in &memory.context_notes {
        items.push(format!("Context: {note}"));
    }
    items.extend(memory.tasks.iter().map(task_line));

    Ok(Outcome::success(
        format!(
            "{name}: {} task(s), {} meeting(s), updated {}",
            memory.tasks.len(),
            memory.metadata.meeting_count,
            memory.metadata.updated_at.format("%Y-%m-%d %H:%M UTC")
        ),
        items,
    ))
}

async fn status(app: &App, cfg: &Config, config_path: &str) -> anyhow::Result<Outcome> {
    let mut items = vec![format!("Config: {config_path}")];

    let provider_ok = app.provider.is_available().await;
    items.push(format!(
        "Provider {}: {}{}",
        app.provider.name(),
        if provider_ok { "available" } else { "not available" },
        if missing_api_key(cfg, app.provider.as_ref()) {
            " (no api key)"
        } else {
            ""
        }
    ));

    match &app.tracker {
        Some(tracker) => {
            let ok = tracker.is_available().await;
            items.push(format!(
                "Tracker {}: {}",
                tracker.name(),
                if ok { "available" } else { "not available" }
            ));
        }
        None => items.push("Tracker: not configured".to_string()),
    }

    let memory = app.engine.memory().await?;
    items.push(format!(
        "Memory ({}): {} task(s), {} team member(s), {} meeting(s)",
        cfg.memory.document_key,
        memory.tasks.len(),
        memory.team.len(),
        memory.metadata.meeting_count
    ));

    for entry in app.audit.recent(5).await? {
        items.push(format!(
            "{} {} {} [{}] {}",
            entry.created_at,
            entry.operation,
            entry.subject.as_deref().unwrap_or("-"),
            entry.status,
            entry.message
        ));
    }

    Ok(Outcome::success(format!("{} status", cfg.aipm.name), items))
}

fn print_outcome(outcome: &Outcome) {
    let tag = match outcome.status {
        Status::Success => "",
        Status::NotFound => "not found: ",
        Status::Rejected => "rejected: ",
        Status::Error => "error: ",
    };
    println!("{tag}{}", outcome.message);
    for item in &outcome.items {
        println!("  {item}");
    }
}

async fn build_app(cfg: &Config) -> anyhow::Result<App> {
    let provider = build_provider(cfg)?;
    let tracker = build_tracker(cfg)?;

    let store = Store::new(&cfg.memory).await?;
    let audit =
        AuditLogger::new(store.pool().clone()).with_retention(cfg.memory.audit_retention);
    let memory = MemoryAdapter::new(Arc::new(store), cfg.memory.document_key.clone());

    let mut engine = Engine::new(
        provider.clone(),
        memory,
        Prompts::load(&cfg.aipm.data_dir),
    )
    .with_audit(audit.clone());

    if let Some(tracker) = &tracker {
        let assignee = cfg
            .tracker
            .jira
            .as_ref()
            .map(|j| j.default_assignee.clone());
        engine = engine.with_sync(SyncPlanner::new(tracker.clone(), assignee));
    }

    Ok(App {
        engine,
        provider,
        tracker,
        audit,
    })
}

/// Build the configured provider.
fn build_provider(cfg: &Config) -> anyhow::Result<Arc<dyn Provider>> {
    let provider: Arc<dyn Provider> = match cfg.provider.default.as_str() {
        "openai" => {
            let oc = cfg.provider.openai.clone().unwrap_or_default();
            Arc::new(OpenAiProvider::from_config(
                oc.base_url,
                oc.api_key,
                oc.model,
                oc.timeout_secs,
            )?)
        }
        "ollama" => {
            let oc = cfg.provider.ollama.clone().unwrap_or_default();
            Arc::new(OllamaProvider::from_config(
                oc.base_url,
                oc.model,
                oc.timeout_secs,
            )?)
        }
        other => anyhow::bail!("unsupported provider: {other}"),
    };

    if missing_api_key(cfg, provider.as_ref()) {
        warn!(
            "{}: no api key; set GROQ_API_KEY or [provider.{}] api_key",
            provider.name(),
            provider.name()
        );
    }
    Ok(provider)
}

/// A keyed provider whose config carries no key.
fn missing_api_key(cfg: &Config, provider: &dyn Provider) -> bool {
    if !provider.requires_api_key() {
        return false;
    }
    cfg.provider
        .openai
        .as_ref()
        .map_or(true, |oc| oc.api_key.trim().is_empty())
}

/// Build the tracker, if one is fully configured.
fn build_tracker(cfg: &Config) -> anyhow::Result<Option<Arc<dyn Tracker>>> {
    match &cfg.tracker.jira {
        Some(jira) if jira.is_configured() => Ok(Some(Arc::new(JiraClient::from_config(jira)?))),
        Some(jira) if jira.enabled => {
            warn!("jira is enabled but base_url, email, api_token or project_key is missing");
            Ok(None)
        }
        _ => Ok(None),
    }
}
