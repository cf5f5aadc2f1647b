//! OpenAI Assistants integration for FDQ
//!
//! This crate provides the hosted-assistant implementation of the
//! [`AnswerEngine`] trait: file upload, vector-store indexing, a single-turn
//! threaded exchange, annotation rewriting, and cleanup of server-side state.

mod client;
mod config;
mod message;

#[cfg(test)]
mod tests;

pub use client::AssistantClient;
pub use config::AssistantConfig;

// Re-export core types for convenience
pub use fdq_core::{Answer, AnswerEngine, Citation, Error, FetchedFile, QaError, Result};
