use crate::{
    completion::Completion,
    context::Context,
    error::AipmError,
    issue::{CorrelationKey, IssueFields, RemoteIssue, Transition},
    model::Task,
};
use async_trait::async_trait;

/// Text-completion provider: the oracle.
///
/// Every backend (OpenAI-compatible, Ollama, ...) implements this trait.
/// It is pure text in, text out; parsing is the caller's job.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Whether this provider requires an API key to function.
    fn requires_api_key(&self) -> bool;

    /// Send a prompt to the provider and get its completion.
    async fn complete(&self, context: &Context) -> Result<Completion, AipmError>;

    /// Check if the provider is available and ready.
    async fn is_available(&self) -> bool;
}

/// Remote issue tracker, the system of record for tasks.
///
/// Issues are found only through their correlation label.
#[async_trait]
pub trait Tracker: Send + Sync {
    /// Human-readable tracker name.
    fn name(&self) -> &str;

    /// Find the issue carrying `key` as a label. Zero or one result.
    async fn find_by_label(&self, key: CorrelationKey) -> Result<Option<RemoteIssue>, AipmError>;

    /// Create a new issue.
    async fn create_issue(&self, fields: &IssueFields) -> Result<RemoteIssue, AipmError>;

    /// Update summary, description and priority; keep the label.
    async fn update_issue(&self, issue_key: &str, fields: &IssueFields) -> Result<(), AipmError>;

    /// Transitions available from the issue's current workflow state.
    async fn transitions(&self, issue_key: &str) -> Result<Vec<Transition>, AipmError>;

    /// Move the issue through `transition_id`.
    async fn apply_transition(&self, issue_key: &str, transition_id: &str)
        -> Result<(), AipmError>;

    /// Delete the issue.
    async fn delete_issue(&self, issue_key: &str) -> Result<(), AipmError>;

    /// Check credentials and reachability.
    async fn is_available(&self) -> bool;
}

/// Keyed document store: get and replace-with-upsert, nothing else.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the raw document stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, AipmError>;

    /// Store `body` under `key`, replacing whatever was there.
    async fn put(&self, key: &str, body: &str) -> Result<(), AipmError>;
}

/// Decides who is who and which task is which.
///
/// Team identity is currently the exact name string; keeping it behind this
/// trait lets a durable-id scheme replace it without touching callers.
pub trait IdentityResolver: Send + Sync {
    /// Apply roster additions and removals to `team`.
    fn merge_team(&self, team: &mut Vec<String>, add: &[String], remove: &[String]);

    /// Give freshly extracted tasks ids that fit into `existing`.
    /// Fails when a colliding task cannot be given a fresh id.
    fn assign_ids(
        &self,
        existing: &[Task],
        incoming: Vec<Task>,
    ) -> Result<Vec<Task>, AipmError>;
}
