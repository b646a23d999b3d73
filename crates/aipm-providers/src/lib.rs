//! # aipm-providers
//!
//! Text-completion providers for aipm.

pub mod ollama;
pub mod openai;
