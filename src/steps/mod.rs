//! Pipeline steps
//!
//! Each step reads the current [`PipelineState`] and returns the fields it
//! produced. A step that decides the final answer early returns
//! [`StepOutcome::Terminal`], and the executor skips everything after it.

use crate::state::{PartialState, PipelineState};
use async_trait::async_trait;

pub mod build_context;
pub mod extract_quote;
pub mod fetch_filings;
pub mod retrieve_context;
pub mod synthesize;

pub use build_context::BuildContext;
pub use extract_quote::ExtractAndQuote;
pub use fetch_filings::FetchFilings;
pub use retrieve_context::{evaluate_retrieval, FallbackReason, RetrieveContext, RetrievalGate};
pub use synthesize::Synthesize;

/// What a step hands back to the executor
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Merge the update and run the next step
    Continue(PartialState),
    /// Merge the update and stop: the answer is decided
    Terminal(PartialState),
}

impl StepOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }

    pub fn into_update(self) -> PartialState {
        match self {
            Self::Continue(update) | Self::Terminal(update) => update,
        }
    }
}

/// One node of the pipeline graph
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, state: &PipelineState) -> StepOutcome;
}
