//! Build-Context: assemble the prompt context for synthesis
//!
//! Sections, in order: quote line, filing excerpt, knowledge-base chunks.
//! Sections are separated by a blank line and omitted when their source is empty.

use super::{Step, StepOutcome};
use crate::state::{PartialState, PipelineState};
use async_trait::async_trait;
use tracing::{debug, info};

pub struct BuildContext {
    filing_excerpt_chars: usize,
}

impl BuildContext {
    pub fn new(filing_excerpt_chars: usize) -> Self {
        Self {
            filing_excerpt_chars,
        }
    }

    pub fn assemble(&self, state: &PipelineState) -> String {
        let mut sections = Vec::with_capacity(3);

        if let Some(quote) = state.quote() {
            sections.push(quote.to_string());
        }

        let filing = state.filing_text();
        if !filing.is_empty() {
            let excerpt: String = filing.chars().take(self.filing_excerpt_chars).collect();
            sections.push(format!("Latest SEC Filing: {}", excerpt));
        }

        let chunks = state.retrieved_chunks();
        if !chunks.is_empty() {
            let joined = chunks
                .iter()
                .map(|c| c.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            sections.push(format!("Knowledge Base Chunks:\n{}", joined));
        }

        sections.join("\n\n")
    }
}

#[async_trait]
impl Step for BuildContext {
    fn name(&self) -> &'static str {
        "build_context"
    }

    async fn run(&self, state: &PipelineState) -> StepOutcome {
        if state.has_answer() {
            debug!("Answer already decided; not building context");
            return StepOutcome::Continue(PartialState::empty());
        }

        let context = self.assemble(state);
        info!(length = context.len(), "Built context for synthesis");

        StepOutcome::Continue(PartialState {
            context: Some(context),
            ..PartialState::default()
        })
    }
}
