//! Finance Brief Orchestrator
//!
//! Answers a natural-language finance question by fanning out to collaborator
//! services and assembling their outputs into one brief:
//! - resolves ticker symbols and a live quote
//! - pulls SEC filing text per symbol (and drops it for re-indexing)
//! - retrieves knowledge-base chunks behind a quality gate
//! - asks a language model for the final answer
//!
//! Any collaborator may fail without failing the request.
//!
//! PIPELINE:
//! EXTRACT+QUOTE → FETCH FILINGS → RETRIEVE → BUILD CONTEXT → SYNTHESIZE

pub mod api;
pub mod collaborators;
pub mod config;
pub mod documents;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod state;
pub mod steps;

pub use error::Result;

// Re-export common types
pub use config::OrchestratorConfig;
pub use models::*;
pub use pipeline::{Pipeline, PipelineRun};
