//! Tracker-side shapes and the correlation label that ties them to tasks.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::Priority;

const LABEL_PREFIX: &str = "taskid_";

/// Stable link between a local task and its tracker issue.
///
/// The tracker has no field for our ids, so the link is a label of the form
/// `taskid_<id>`. Format and parse only through this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationKey(u64);

impl CorrelationKey {
    pub fn new(task_id: u64) -> Self {
        Self(task_id)
    }

    pub fn task_id(&self) -> u64 {
        self.0
    }

    /// Parse a tracker label. Anything but `taskid_<digits>` is `None`.
    pub fn parse(label: &str) -> Option<Self> {
        let digits = label.strip_prefix(LABEL_PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(Self)
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{LABEL_PREFIX}{}", self.0)
    }
}

/// Fields written to the tracker on create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueFields {
    pub summary: String,
    pub description: String,
    pub priority: Priority,
    pub label: CorrelationKey,
    /// Only used on create; the tracker's identity space is separate from
    /// transcript names.
    pub assignee: Option<String>,
}

/// An issue as seen on the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIssue {
    /// Tracker key, e.g. `PM-42`.
    pub key: String,
    #[serde(default)]
    pub summary: String,
    /// Current workflow state name, if the tracker reported it.
    #[serde(default)]
    pub status: Option<String>,
}

/// A workflow transition available from an issue's current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_label_format() {
        assert_eq!(CorrelationKey::new(1001).label(), "taskid_1001");
        assert_eq!(CorrelationKey::new(7).to_string(), "taskid_7");
    }

    #[test]
    fn test_correlation_parse() {
        assert_eq!(
            CorrelationKey::parse("taskid_1042"),
            Some(CorrelationKey::new(1042))
        );
        assert_eq!(CorrelationKey::parse("taskid_"), None);
        assert_eq!(CorrelationKey::parse("taskid_-3"), None);
        assert_eq!(CorrelationKey::parse("task_1042"), None);
        assert_eq!(CorrelationKey::parse("taskid_10a"), None);
    }
}
