use super::*;
use aipm_core::{
    completion::{Completion, CompletionMetadata},
    context::Context,
    issue::{CorrelationKey, IssueFields, RemoteIssue, Transition},
    model::{Priority, TaskStatus},
    traits::{DocumentStore, Tracker},
};
use aipm_memory::Store;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

const KEY: &str = "project_ai_pm";

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Replies with canned text in order; records every prompt.
#[derive(Default)]
struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<Context>>,
}

impl ScriptedProvider {
    fn new(replies: &[&str]) -> Self {
        let provider = Self::default();
        for r in replies {
            provider.push(Ok(r.to_string()));
        }
        provider
    }

    fn push(&self, reply: Result<String, String>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn requires_api_key(&self) -> bool {
        false
    }

    async fn complete(&self, context: &Context) -> Result<Completion, AipmError> {
        self.prompts.lock().unwrap().push(context.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("no scripted reply left".to_string()));
        reply
            .map(|text| Completion {
                text,
                metadata: CompletionMetadata {
                    provider_used: "scripted".into(),
                    tokens_used: None,
                    processing_time_ms: 0,
                    model: None,
                },
            })
            .map_err(AipmError::Provider)
    }

    async fn is_available(&self) -> bool {
        true
    }
}

/// Documents in a map.
#[derive(Default)]
struct MapStore {
    docs: Mutex<HashMap<String, String>>,
}

impl MapStore {
    fn raw(&self) -> Option<String> {
        self.docs.lock().unwrap().get(KEY).cloned()
    }
}

#[async_trait]
impl DocumentStore for MapStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AipmError> {
        Ok(self.docs.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, body: &str) -> Result<(), AipmError> {
        self.docs
            .lock()
            .unwrap()
            .insert(key.to_string(), body.to_string());
        Ok(())
    }
}

/// Issues keyed by label, with a fixed workflow.
struct FakeTracker {
    issues: Mutex<Vec<(String, CorrelationKey, String)>>,
    workflow: Vec<&'static str>,
    next: Mutex<u32>,
    offline: bool,
}

impl FakeTracker {
    fn new(workflow: &[&'static str]) -> Self {
        Self {
            issues: Mutex::new(Vec::new()),
            workflow: workflow.to_vec(),
            next: Mutex::new(0),
            offline: false,
        }
    }

    fn offline() -> Self {
        Self {
            offline: true,
            ..Self::new(&[])
        }
    }

    fn seed(&self, key: &str, task_id: u64) {
        self.issues.lock().unwrap().push((
            key.to_string(),
            CorrelationKey::new(task_id),
            "To Do".to_string(),
        ));
    }

    fn count(&self) -> usize {
        self.issues.lock().unwrap().len()
    }

    fn status_of(&self, key: &str) -> Option<String> {
        self.issues
            .lock()
            .unwrap()
            .iter()
            .find(|(k, _, _)| k == key)
            .map(|(_, _, s)| s.clone())
    }

    fn check(&self) -> Result<(), AipmError> {
        if self.offline {
            return Err(AipmError::Tracker("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Tracker for FakeTracker {
    fn name(&self) -> &str {
        "fake"
    }

    async fn find_by_label(&self, key: CorrelationKey) -> Result<Option<RemoteIssue>, AipmError> {
        self.check()?;
        Ok(self
            .issues
            .lock()
            .unwrap()
            .iter()
            .find(|(_, label, _)| *label == key)
            .map(|(k, _, status)| RemoteIssue {
                key: k.clone(),
                summary: String::new(),
                status: Some(status.clone()),
            }))
    }

    async fn create_issue(&self, fields: &IssueFields) -> Result<RemoteIssue, AipmError> {
        self.check()?;
        let mut next = self.next.lock().unwrap();
        *next += 1;
        let key = format!("PM-{}", 100 + *next);
        self.issues
            .lock()
            .unwrap()
            .push((key.clone(), fields.label, "To Do".into()));
        Ok(RemoteIssue {
            key,
            summary: fields.summary.clone(),
            status: None,
        })
    }

    async fn update_issue(&self, _issue_key: &str, _fields: &IssueFields) -> Result<(), AipmError> {
        self.check()
    }

    async fn transitions(&self, _issue_key: &str) -> Result<Vec<Transition>, AipmError> {
        self.check()?;
        Ok(self
            .workflow
            .iter()
            .map(|name| Transition {
                id: name.to_string(),
                name: name.to_string(),
            })
            .collect())
    }

    async fn apply_transition(
        &self,
        issue_key: &str,
        transition_id: &str,
    ) -> Result<(), AipmError> {
        self.check()?;
        if let Some(issue) = self
            .issues
            .lock()
            .unwrap()
            .iter_mut()
            .find(|(k, _, _)| k == issue_key)
        {
            issue.2 = transition_id.to_string();
        }
        Ok(())
    }

    async fn delete_issue(&self, issue_key: &str) -> Result<(), AipmError> {
        self.check()?;
        self.issues.lock().unwrap().retain(|(k, _, _)| k != issue_key);
        Ok(())
    }

    async fn is_available(&self) -> bool {
        !self.offline
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    engine: Engine,
    provider: Arc<ScriptedProvider>,
    store: Arc<MapStore>,
}

fn harness(provider: ScriptedProvider, tracker: Option<Arc<FakeTracker>>) -> Harness {
    let provider = Arc::new(provider);
    let store = Arc::new(MapStore::default());
    let mut engine = Engine::new(
        provider.clone(),
        MemoryAdapter::new(store.clone(), KEY),
        Prompts::default(),
    );
    if let Some(tracker) = tracker {
        engine = engine.with_sync(SyncPlanner::new(tracker, None));
    }
    Harness {
        engine,
        provider,
        store,
    }
}

async fn seed_memory(h: &Harness, edit: impl FnOnce(&mut ProjectMemory)) {
    let mut memory = ProjectMemory::new();
    edit(&mut memory);
    h.store
        .put(KEY, &serde_json::to_string(&memory).unwrap())
        .await
        .unwrap();
}

fn task(id: u64, text: &str, status: TaskStatus) -> Task {
    Task {
        id,
        giver: "Alice Moyo".into(),
        assignee: "Bob Singh".into(),
        task: text.into(),
        deadline: None,
        deliverable: None,
        priority: Priority::High,
        status,
    }
}

const BOB_JOINS: &str = r#"{"project_name": "", "project_info": {"description": "", "notes": []},
    "team_add": ["Bob Singh"], "team_remove": [], "context_notes": []}"#;

const DRAFT_SPEC: &str = r#"[{"id": 1001, "giver": "Alice Moyo", "assignee": "Bob Singh",
    "task": "Draft spec", "deadline": null, "deliverable": null,
    "priority": "High", "status": "In Progress"}]"#;

// ---------------------------------------------------------------------------
// extract
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_extract_alice_and_bob_scenario() {
    let h = harness(ScriptedProvider::new(&[BOB_JOINS, DRAFT_SPEC]), None);
    seed_memory(&h, |m| m.team = vec!["Alice Moyo".into()]).await;

    let extraction = h
        .engine
        .extract("Alice: Bob, welcome. Please draft the spec.")
        .await
        .unwrap();
    assert!(extraction.outcome.is_success());
    assert_eq!(
        extraction.outcome.items,
        vec!["[1001] Draft spec (Bob Singh, High, In Progress)"]
    );

    let memory = h.engine.memory().await.unwrap();
    assert_eq!(memory.team, vec!["Alice Moyo", "Bob Singh"]);
    assert_eq!(memory.tasks, vec![task(1001, "Draft spec", TaskStatus::InProgress)]);
    assert_eq!(memory.metadata.meeting_count, 1);
}

#[tokio::test]
async fn test_extract_prompts_carry_memory_context() {
    let h = harness(ScriptedProvider::new(&[BOB_JOINS, DRAFT_SPEC]), None);
    seed_memory(&h, |m| m.team = vec!["Alice Moyo".into()]).await;
    h.engine.extract("Kickoff.").await.unwrap();

    let prompts = h.provider.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].current_message.contains("Existing team members: Alice Moyo"));
    assert!(prompts[1]
        .current_message
        .contains("Existing team members: Alice Moyo, Bob Singh"));
    assert!(prompts[1].current_message.contains("new tasks start at 1001"));
    assert_eq!(prompts[1].temperature, Some(0.0));
}

#[tokio::test]
async fn test_meeting_count_increments_once_per_transcript() {
    let metadata = r#"{"team_add": ["A B", "C D", "E F"], "team_remove": ["G H"]}"#;
    let tasks = r#"[{"id": 1001, "task": "one"}, {"id": 1002, "task": "two"}, {"id": 1003, "task": "three"}]"#;
    let h = harness(
        ScriptedProvider::new(&[metadata, tasks, metadata, "[]"]),
        None,
    );

    h.engine.extract("first meeting").await.unwrap();
    assert_eq!(h.engine.memory().await.unwrap().metadata.meeting_count, 1);
    h.engine.extract("second meeting").await.unwrap();
    let memory = h.engine.memory().await.unwrap();
    assert_eq!(memory.metadata.meeting_count, 2);
    assert_eq!(memory.team.len(), 3);
}

#[tokio::test]
async fn test_malformed_reply_fails_extract_and_leaves_memory_alone() {
    let h = harness(
        ScriptedProvider::new(&[BOB_JOINS, "Here you go: [{\"id\": 1001}]"]),
        None,
    );
    seed_memory(&h, |m| m.team = vec!["Alice Moyo".into()]).await;
    let before = h.store.raw();

    let err = h.engine.extract("Bob joins.").await.unwrap_err();
    assert!(matches!(err, AipmError::MalformedResponse(_)));
    assert_eq!(h.store.raw(), before);
}

#[tokio::test]
async fn test_one_invalid_task_fails_the_whole_extraction() {
    let tasks = r#"[{"id": 1001, "task": "fine"}, {"id": 1002, "task": ""}]"#;
    let h = harness(ScriptedProvider::new(&[BOB_JOINS, tasks]), None);
    let err = h.engine.extract("meeting").await.unwrap_err();
    assert!(matches!(err, AipmError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_extract_renumbers_ids_that_name_other_tasks() {
    let h = harness(ScriptedProvider::new(&["{}", DRAFT_SPEC]), None);
    seed_memory(&h, |m| {
        m.tasks.push(task(1001, "Book venue", TaskStatus::ToDo));
    })
    .await;

    let extraction = h.engine.extract("meeting").await.unwrap();
    assert_eq!(extraction.tasks[0].id, 1002);
    let memory = h.engine.memory().await.unwrap();
    assert_eq!(memory.tasks.len(), 2);
    assert_eq!(memory.task(1001).unwrap().task, "Book venue");
}

#[tokio::test]
async fn test_extract_fails_when_no_fresh_id_is_left() {
    let tasks = r#"[{"id": 18446744073709551615, "task": "first"},
        {"id": 18446744073709551615, "task": "second"}]"#;
    let h = harness(ScriptedProvider::new(&[BOB_JOINS, tasks]), None);
    seed_memory(&h, |_| {}).await;
    let before = h.store.raw();

    let err = h.engine.extract("meeting").await.unwrap_err();
    assert!(matches!(err, AipmError::MalformedResponse(_)));
    assert_eq!(h.store.raw(), before);
}

#[tokio::test]
async fn test_empty_transcript_is_rejected_without_provider_call() {
    let h = harness(ScriptedProvider::default(), None);
    let extraction = h.engine.extract("   ").await.unwrap();
    assert_eq!(extraction.outcome.status, Status::Rejected);
    assert_eq!(h.provider.calls(), 0);
}

#[tokio::test]
async fn test_extract_does_not_sync() {
    let tracker = Arc::new(FakeTracker::new(&["In Progress"]));
    let h = harness(
        ScriptedProvider::new(&[BOB_JOINS, DRAFT_SPEC]),
        Some(tracker.clone()),
    );
    h.engine.extract("meeting").await.unwrap();
    assert_eq!(tracker.count(), 0);
}

// ---------------------------------------------------------------------------
// save / add / update
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_save_updates_existing_issue_and_moves_it_to_done() {
    let tracker = Arc::new(FakeTracker::new(&["To Do", "In Progress", "Done"]));
    tracker.seed("PM-7", 1001);
    let h = harness(ScriptedProvider::default(), Some(tracker.clone()));

    let outcome = h
        .engine
        .save_tasks(vec![task(1001, "Draft spec", TaskStatus::Done)])
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(
        outcome.items,
        vec!["Updated PM-7: [1001] Draft spec", "  PM-7 moved to Done"]
    );
    assert_eq!(tracker.count(), 1);
    assert_eq!(tracker.status_of("PM-7").as_deref(), Some("Done"));
}

#[tokio::test]
async fn test_save_batch_with_one_missing_transition() {
    let tracker = Arc::new(FakeTracker::new(&["In Progress"]));
    let h = harness(ScriptedProvider::default(), Some(tracker.clone()));

    let outcome = h
        .engine
        .save_tasks(vec![
            task(1001, "a", TaskStatus::InProgress),
            task(1002, "b", TaskStatus::Done),
            task(1003, "c", TaskStatus::InProgress),
        ])
        .await
        .unwrap();

    assert_eq!(outcome.items.len(), 6);
    assert!(outcome.items[3].contains("could not set PM-102 to Done"));
    assert_eq!(tracker.count(), 3);
    assert_eq!(tracker.status_of("PM-103").as_deref(), Some("In Progress"));
}

#[tokio::test]
async fn test_save_silently_overwrites_existing_ids() {
    let h = harness(ScriptedProvider::default(), None);
    seed_memory(&h, |m| m.tasks.push(task(1001, "old", TaskStatus::ToDo))).await;

    let outcome = h
        .engine
        .save_tasks(vec![task(1001, "new", TaskStatus::Done)])
        .await
        .unwrap();
    assert!(outcome.is_success());
    assert!(outcome.message.contains("Tracker not configured"));

    let memory = h.engine.memory().await.unwrap();
    assert_eq!(memory.tasks, vec![task(1001, "new", TaskStatus::Done)]);
}

#[tokio::test]
async fn test_save_rejects_invalid_batch_before_writing() {
    let h = harness(ScriptedProvider::default(), None);
    seed_memory(&h, |_| {}).await;
    let before = h.store.raw();

    let outcome = h
        .engine
        .save_tasks(vec![task(1001, "ok", TaskStatus::ToDo), task(1002, " ", TaskStatus::ToDo)])
        .await
        .unwrap();
    assert_eq!(outcome.status, Status::Rejected);
    assert_eq!(h.store.raw(), before);
}

#[tokio::test]
async fn test_add_with_taken_id_is_rejected_and_memory_unchanged() {
    let tracker = Arc::new(FakeTracker::new(&["To Do"]));
    let h = harness(ScriptedProvider::default(), Some(tracker.clone()));
    seed_memory(&h, |m| m.tasks.push(task(1001, "Draft spec", TaskStatus::ToDo))).await;
    let before = h.store.raw();

    let err = h
        .engine
        .add_task(NewTask {
            id: Some(1001),
            task: "Something else".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AipmError::DuplicateId(1001)));
    assert_eq!(h.store.raw(), before);
    assert_eq!(tracker.count(), 0);
}

#[tokio::test]
async fn test_add_without_id_takes_next_free_and_syncs() {
    let tracker = Arc::new(FakeTracker::new(&["To Do"]));
    let h = harness(ScriptedProvider::default(), Some(tracker.clone()));
    seed_memory(&h, |m| m.tasks.push(task(1004, "x", TaskStatus::ToDo))).await;

    let outcome = h
        .engine
        .add_task(NewTask {
            task: "Set up CI".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(outcome.message, "Added task 1005. Tracker updated.");
    assert!(outcome.items[0].starts_with("Created PM-101: [1005] Set up CI"));
    assert!(h.engine.memory().await.unwrap().has_task(1005));
}

#[tokio::test]
async fn test_add_without_id_is_rejected_when_ids_are_exhausted() {
    let tracker = Arc::new(FakeTracker::new(&["To Do"]));
    let h = harness(ScriptedProvider::default(), Some(tracker.clone()));
    seed_memory(&h, |m| m.tasks.push(task(u64::MAX, "last", TaskStatus::ToDo))).await;
    let before = h.store.raw();

    let outcome = h
        .engine
        .add_task(NewTask {
            task: "One more".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(outcome.status, Status::Rejected);
    assert_eq!(h.store.raw(), before);
    assert_eq!(tracker.count(), 0);
}

#[tokio::test]
async fn test_update_missing_task_is_not_found() {
    let h = harness(ScriptedProvider::default(), None);
    let outcome = h
        .engine
        .update_task(
            4242,
            TaskPatch {
                status: Some(TaskStatus::Done),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome.status, Status::NotFound);
}

#[tokio::test]
async fn test_update_patches_and_syncs() {
    let tracker = Arc::new(FakeTracker::new(&["Done"]));
    tracker.seed("PM-7", 1001);
    let h = harness(ScriptedProvider::default(), Some(tracker.clone()));
    seed_memory(&h, |m| m.tasks.push(task(1001, "Draft spec", TaskStatus::ToDo))).await;

    let outcome = h
        .engine
        .update_task(
            1001,
            TaskPatch {
                status: Some(TaskStatus::Done),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(
        h.engine.memory().await.unwrap().task(1001).unwrap().status,
        TaskStatus::Done
    );
    assert_eq!(tracker.status_of("PM-7").as_deref(), Some("Done"));
}

#[tokio::test]
async fn test_empty_patch_is_rejected() {
    let h = harness(ScriptedProvider::default(), None);
    let outcome = h
        .engine
        .update_task(1001, TaskPatch::default())
        .await
        .unwrap();
    assert_eq!(outcome.status, Status::Rejected);
}

// ---------------------------------------------------------------------------
// delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_delete_removes_one_remote_and_one_local() {
    let tracker = Arc::new(FakeTracker::new(&[]));
    tracker.seed("PM-7", 1001);
    tracker.seed("PM-8", 1002);
    let h = harness(ScriptedProvider::default(), Some(tracker.clone()));
    seed_memory(&h, |m| {
        m.tasks.push(task(1001, "a", TaskStatus::ToDo));
        m.tasks.push(task(1002, "b", TaskStatus::ToDo));
    })
    .await;

    let outcome = h.engine.delete_task(1001).await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(tracker.count(), 1);
    let memory = h.engine.memory().await.unwrap();
    assert_eq!(memory.tasks.len(), 1);
    assert!(!memory.has_task(1001));
}

#[tokio::test]
async fn test_delete_unknown_id_is_not_found() {
    let tracker = Arc::new(FakeTracker::new(&[]));
    let h = harness(ScriptedProvider::default(), Some(tracker));
    let outcome = h.engine.delete_task(9999).await.unwrap();
    assert_eq!(outcome.status, Status::NotFound);
    assert_eq!(outcome.items, vec!["No tracker issue labelled taskid_9999"]);
}

#[tokio::test]
async fn test_delete_local_only_when_remote_missing() {
    let tracker = Arc::new(FakeTracker::new(&[]));
    let h = harness(ScriptedProvider::default(), Some(tracker));
    seed_memory(&h, |m| m.tasks.push(task(1001, "a", TaskStatus::ToDo))).await;

    let outcome = h.engine.delete_task(1001).await.unwrap();
    assert!(outcome.is_success());
    assert!(h.engine.memory().await.unwrap().tasks.is_empty());
}

#[tokio::test]
async fn test_unreachable_tracker_aborts_delete_before_local_change() {
    let tracker = Arc::new(FakeTracker::offline());
    let h = harness(ScriptedProvider::default(), Some(tracker));
    seed_memory(&h, |m| m.tasks.push(task(1001, "a", TaskStatus::ToDo))).await;
    let before = h.store.raw();

    let err = h.engine.delete_task(1001).await.unwrap_err();
    assert!(matches!(err, AipmError::Tracker(_)));
    assert_eq!(h.store.raw(), before);
}

// ---------------------------------------------------------------------------
// read paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_get_task() {
    let h = harness(ScriptedProvider::default(), None);
    seed_memory(&h, |m| m.tasks.push(task(1001, "Draft spec", TaskStatus::InProgress))).await;

    let found = h.engine.get_task(1001).await.unwrap();
    assert_eq!(found.message, "[1001] Draft spec (Bob Singh, High, In Progress)");
    assert!(found.items.contains(&"Deadline: -".to_string()));
    assert_eq!(
        h.engine.get_task(1002).await.unwrap().status,
        Status::NotFound
    );
}

#[tokio::test]
async fn test_ask_answers_without_writing() {
    let h = harness(ScriptedProvider::new(&["  Bob is drafting the spec.  "]), None);
    seed_memory(&h, |m| m.tasks.push(task(1001, "Draft spec", TaskStatus::InProgress))).await;
    let before = h.store.raw();

    let outcome = h.engine.ask("Who is on the spec?").await.unwrap();
    assert_eq!(outcome.message, "Bob is drafting the spec.");
    assert_eq!(h.store.raw(), before);

    let prompts = h.provider.prompts.lock().unwrap();
    assert!(prompts[0].system_prompt.contains("1 to 3 sentences"));
    assert!(prompts[0].current_message.contains("Draft spec (Assigned: Bob Singh"));
}

#[tokio::test]
async fn test_ask_turns_provider_failure_into_answer() {
    let provider = ScriptedProvider::default();
    provider.push(Err("rate limited".into()));
    let h = harness(provider, None);

    let outcome = h.engine.ask("status?").await.unwrap();
    assert!(outcome.is_success());
    assert!(outcome.message.contains("rate limited"));
}

#[tokio::test]
async fn test_replace_notes() {
    let h = harness(ScriptedProvider::default(), None);
    seed_memory(&h, |m| m.project_info.notes = vec!["old".into()]).await;
    let outcome = h
        .engine
        .replace_notes(vec!["Use Postgres".into(), "Weekly demo".into()])
        .await
        .unwrap();
    assert_eq!(outcome.message, "2 project note(s) saved");
    assert_eq!(
        h.engine.memory().await.unwrap().project_info.notes,
        vec!["Use Postgres", "Weekly demo"]
    );
}

#[tokio::test]
async fn test_operations_are_audited() {
    let store = Store::in_memory().await.unwrap();
    let audit = AuditLogger::new(store.pool().clone());
    let engine = Engine::new(
        Arc::new(ScriptedProvider::default()),
        MemoryAdapter::new(Arc::new(store.clone()), KEY),
        Prompts::default(),
    )
    .with_audit(audit.clone());

    engine
        .add_task(NewTask {
            task: "Set up CI".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    engine.delete_task(4242).await.unwrap();

    let rows = audit.recent(10).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].operation, "delete");
    assert_eq!(rows[0].status, "not_found");
    assert_eq!(rows[1].operation, "add");
    assert_eq!(rows[1].subject.as_deref(), Some("1001"));
}
