//! CLI interface for FDQ
//!
//! Sequences the document-QA run (fetch, answer, clean up) and renders its
//! outcome on the terminal.

mod pipeline;
mod ui;

pub use pipeline::QaPipeline;
pub use ui::{display_banner, parse_selection, prompt, render_outcome, render_submissions};

// Re-export core types
pub use fdq_core::{Error, Result, RunOutcome};
