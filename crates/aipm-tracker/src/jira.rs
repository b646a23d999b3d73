//! Jira REST v2 client.
//!
//! Basic auth with account email and API token. Issues are located only by
//! their `taskid_<id>` label.

use aipm_core::{
    config::JiraConfig,
    error::AipmError,
    issue::{CorrelationKey, IssueFields, RemoteIssue, Transition},
    traits::Tracker,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Jira tracker.
pub struct JiraClient {
    client: reqwest::Client,
    base_url: String,
    email: String,
    api_token: String,
    project_key: String,
    issue_type: String,
}

impl JiraClient {
    /// Create from config values.
    pub fn from_config(config: &JiraConfig) -> Result<Self, AipmError> {
        if !config.is_configured() {
            return Err(AipmError::Config(
                "jira: base_url, email, api_token and project_key are required".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AipmError::Tracker(format!("jira: failed to build client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            email: config.email.clone(),
            api_token: config.api_token.clone(),
            project_key: config.project_key.clone(),
            issue_type: config.issue_type.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest/api/2/{path}", self.base_url)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = self.url(path);
        debug!("jira: {method} {url}");
        self.client
            .request(method, url)
            .basic_auth(&self.email, Some(&self.api_token))
    }

    fn search_jql(&self, key: CorrelationKey) -> String {
        format!("project = {} AND labels = \"{}\"", self.project_key, key.label())
    }
}

/// Send and map transport or non-2xx replies to a tracker error.
async fn send(
    builder: reqwest::RequestBuilder,
    what: &str,
) -> Result<reqwest::Response, AipmError> {
    let resp = builder
        .send()
        .await
        .map_err(|e| AipmError::Tracker(format!("jira {what} failed: {e}")))?;
    check_status(resp, what).await
}

async fn check_status(resp: reqwest::Response, what: &str) -> Result<reqwest::Response, AipmError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    Err(AipmError::Tracker(format!(
        "jira {what} returned {status}: {text}"
    )))
}

// --- Wire types -------------------------------------------------------------

/// Enhanced JQL search. The plain `search` resource is gone from Jira Cloud.
const SEARCH_PATH: &str = "search/jql";

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<IssueRecord>,
}

#[derive(Deserialize)]
struct IssueRecord {
    key: String,
    #[serde(default)]
    fields: Option<IssueRecordFields>,
}

#[derive(Deserialize)]
struct IssueRecordFields {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    status: Option<Named>,
}

#[derive(Serialize, Deserialize)]
struct Named {
    name: String,
}

#[derive(Serialize)]
struct KeyRef<'a> {
    key: &'a str,
}

#[derive(Serialize)]
struct AccountRef<'a> {
    #[serde(rename = "accountId")]
    account_id: &'a str,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    fields: CreateFields<'a>,
}

#[derive(Serialize)]
struct CreateFields<'a> {
    project: KeyRef<'a>,
    summary: &'a str,
    description: &'a str,
    issuetype: Named,
    priority: Named,
    labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee: Option<AccountRef<'a>>,
}

#[derive(Deserialize)]
struct CreateResponse {
    key: String,
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    fields: UpdateFields<'a>,
    update: LabelUpdate,
}

#[derive(Serialize)]
struct UpdateFields<'a> {
    summary: &'a str,
    description: &'a str,
    priority: Named,
}

#[derive(Serialize)]
struct LabelUpdate {
    labels: Vec<LabelOp>,
}

#[derive(Serialize)]
struct LabelOp {
    add: String,
}

#[derive(Deserialize)]
struct TransitionsResponse {
    #[serde(default)]
    transitions: Vec<TransitionRecord>,
}

#[derive(Deserialize)]
struct TransitionRecord {
    id: String,
    name: String,
}

#[derive(Serialize)]
struct TransitionRequest<'a> {
    transition: TransitionId<'a>,
}

#[derive(Serialize)]
struct TransitionId<'a> {
    id: &'a str,
}

impl IssueRecord {
    fn into_remote(self) -> RemoteIssue {
        let fields = self.fields;
        RemoteIssue {
            key: self.key,
            summary: fields
                .as_ref()
                .and_then(|f| f.summary.clone())
                .unwrap_or_default(),
            status: fields.and_then(|f| f.status).map(|s| s.name),
        }
    }
}

fn create_body<'a>(
    project_key: &'a str,
    issue_type: &str,
    fields: &'a IssueFields,
) -> CreateRequest<'a> {
    CreateRequest {
        fields: CreateFields {
            project: KeyRef { key: project_key },
            summary: &fields.summary,
            description: &fields.description,
            issuetype: Named {
                name: issue_type.to_string(),
            },
            priority: Named {
                name: fields.priority.as_str().to_string(),
            },
            labels: vec![fields.label.label()],
            assignee: fields
                .assignee
                .as_deref()
                .filter(|a| !a.is_empty())
                .map(|account_id| AccountRef { account_id }),
        },
    }
}

fn update_body(fields: &IssueFields) -> UpdateRequest<'_> {
    UpdateRequest {
        fields: UpdateFields {
            summary: &fields.summary,
            description: &fields.description,
            priority: Named {
                name: fields.priority.as_str().to_string(),
            },
        },
        update: LabelUpdate {
            labels: vec![LabelOp {
                add: fields.label.label(),
            }],
        },
    }
}

#[async_trait]
impl Tracker for JiraClient {
    fn name(&self) -> &str {
        "jira"
    }

    async fn find_by_label(&self, key: CorrelationKey) -> Result<Option<RemoteIssue>, AipmError> {
        let jql = self.search_jql(key);
        let resp = send(
            self.request(reqwest::Method::GET, SEARCH_PATH).query(&[
                ("jql", jql.as_str()),
                ("maxResults", "1"),
                ("fields", "summary,status"),
            ]),
            "search",
        )
        .await?;

        let parsed: SearchResponse = resp
            .json()
            .await
            .map_err(|e| AipmError::Tracker(format!("jira: failed to parse search: {e}")))?;

        Ok(parsed.issues.into_iter().next().map(IssueRecord::into_remote))
    }

    async fn create_issue(&self, fields: &IssueFields) -> Result<RemoteIssue, AipmError> {
        let body = create_body(&self.project_key, &self.issue_type, fields);
        let resp = send(
            self.request(reqwest::Method::POST, "issue").json(&body),
            "create",
        )
        .await?;

        let created: CreateResponse = resp
            .json()
            .await
            .map_err(|e| AipmError::Tracker(format!("jira: failed to parse create: {e}")))?;

        Ok(RemoteIssue {
            key: created.key,
            summary: fields.summary.clone(),
            status: None,
        })
    }

    async fn update_issue(&self, issue_key: &str, fields: &IssueFields) -> Result<(), AipmError> {
        send(
            self.request(reqwest::Method::PUT, &format!("issue/{issue_key}"))
                .json(&update_body(fields)),
            "update",
        )
        .await?;
        Ok(())
    }

    async fn transitions(&self, issue_key: &str) -> Result<Vec<Transition>, AipmError> {
        let resp = send(
            self.request(
                reqwest::Method::GET,
                &format!("issue/{issue_key}/transitions"),
            ),
            "transitions",
        )
        .await?;

        let parsed: TransitionsResponse = resp.json().await.map_err(|e| {
            AipmError::Tracker(format!("jira: failed to parse transitions: {e}"))
        })?;

        Ok(parsed
            .transitions
            .into_iter()
            .map(|t| Transition {
                id: t.id,
                name: t.name,
            })
            .collect())
    }

    async fn apply_transition(
        &self,
        issue_key: &str,
        transition_id: &str,
    ) -> Result<(), AipmError> {
        let body = TransitionRequest {
            transition: TransitionId { id: transition_id },
        };
        send(
            self.request(
                reqwest::Method::POST,
                &format!("issue/{issue_key}/transitions"),
            )
            .json(&body),
            "transition",
        )
        .await?;
        Ok(())
    }

    async fn delete_issue(&self, issue_key: &str) -> Result<(), AipmError> {
        let resp = self
            .request(reqwest::Method::DELETE, &format!("issue/{issue_key}"))
            .send()
            .await
            .map_err(|e| AipmError::Tracker(format!("jira delete failed: {e}")))?;

        if resp.status() == StatusCode::NOT_FOUND {
            warn!("jira: {issue_key} was already gone");
            return Ok(());
        }
        check_status(resp, "delete").await?;
        Ok(())
    }

    async fn is_available(&self) -> bool {
        match self.request(reqwest::Method::GET, "myself").send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("jira not available: {e}");
                false
            }
        }
    }
}
