//! Synthesize: ask the language model for the final brief

use super::{Step, StepOutcome};
use crate::collaborators::SynthesisService;
use crate::state::{PartialState, PipelineState};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};

pub const SYNTHESIS_APOLOGY: &str = "Sorry, there was an error generating your market brief.";

pub struct Synthesize {
    synthesis: Arc<dyn SynthesisService>,
}

impl Synthesize {
    pub fn new(synthesis: Arc<dyn SynthesisService>) -> Self {
        Self { synthesis }
    }
}

#[async_trait]
impl Step for Synthesize {
    fn name(&self) -> &'static str {
        "synthesize"
    }

    async fn run(&self, state: &PipelineState) -> StepOutcome {
        if state.has_answer() {
            debug!("Answer already decided; not calling synthesis");
            return StepOutcome::Continue(PartialState::empty());
        }

        let context = state.context().unwrap_or_default();
        let answer = match self.synthesis.synthesize(state.question(), context).await {
            Ok(answer) => {
                let preview: String = answer.chars().take(200).collect();
                info!(%preview, "Synthesis returned answer");
                answer
            }
            Err(e) => {
                error!(reason = %e, "Synthesis failed; answering with apology");
                SYNTHESIS_APOLOGY.to_string()
            }
        };

        StepOutcome::Terminal(PartialState {
            answer: Some(answer),
            ..PartialState::default()
        })
    }
}
