//! # aipm-tracker
//!
//! Issue tracker integration: the Jira client and the sync planner that
//! mirrors local tasks onto it.

pub mod jira;
pub mod sync;

pub use jira::JiraClient;
pub use sync::{DeleteOutcome, SyncOutcome, SyncPlanner, SyncReport};
