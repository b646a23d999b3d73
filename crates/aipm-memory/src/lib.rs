//! # aipm-memory
//!
//! Project memory for aipm: the SQLite document store, the load/save
//! adapter, identity resolution and the merge rules applied on top.

pub mod adapter;
pub mod audit;
pub mod merge;
pub mod resolver;
pub mod store;

pub use adapter::MemoryAdapter;
pub use audit::{AuditEntry, AuditLogger, AuditStatus};
pub use resolver::ExactNameResolver;
pub use store::Store;
