//! Narrative analyzer for per-town traffic summaries.
//!
//! This module provides a trait-based abstraction over completion
//! providers, with the xAI chat-completions API as the primary
//! implementation, plus the retry/backoff and memoization layer around it.

mod analyzer;
mod client;
mod error;

pub use analyzer::{NarrativeAnalyzer, NarrativeOutcome};
pub use client::{Completion, CompletionClient, Role, XaiClient};
pub use error::{classify_http_status, LlmError, LlmErrorKind};
