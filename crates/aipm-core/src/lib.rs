//! # aipm-core
//!
//! Core types, traits, configuration, and error handling for aipm.

pub mod completion;
pub mod config;
pub mod context;
pub mod error;
pub mod issue;
pub mod model;
pub mod sanitize;
pub mod traits;

pub use config::shellexpand;
