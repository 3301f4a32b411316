//! Graph executor
//!
//! EXTRACT+QUOTE → FETCH FILINGS → RETRIEVE → BUILD CONTEXT → SYNTHESIZE
//!
//! Steps run strictly in this order. After each step its partial update is
//! merged into the run's state. A `Terminal` outcome ends the run; the
//! remaining steps are recorded as skipped.

use crate::collaborators::Collaborators;
use crate::config::OrchestratorConfig;
use crate::documents::DocumentStore;
use crate::state::{PartialState, PipelineState};
use crate::steps::synthesize::SYNTHESIS_APOLOGY;
use crate::steps::{BuildContext, ExtractAndQuote, FetchFilings, RetrieveContext, Step, Synthesize};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Terminal,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: &'static str,
    pub status: StepStatus,
    pub fields: Vec<&'static str>,
    pub elapsed_ms: u64,
}

/// Everything one run produced
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub run_id: Uuid,
    pub state: PipelineState,
    pub trace: Vec<StepRecord>,
    pub elapsed_ms: u64,
}

impl PipelineRun {
    pub fn answer(&self) -> &str {
        self.state.answer().unwrap_or(SYNTHESIS_APOLOGY)
    }

    pub fn into_answer(self) -> String {
        self.answer().to_string()
    }
}

/// The orchestration pipeline. Holds no per-request state; safe to share.
pub struct Pipeline {
    steps: Vec<Box<dyn Step>>,
}

impl Pipeline {
    /// The standard five-step graph
    pub fn new(
        config: &OrchestratorConfig,
        collaborators: Collaborators,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        let steps: Vec<Box<dyn Step>> = vec![
            Box::new(ExtractAndQuote::new(
                collaborators.symbol_extractor,
                collaborators.quotes,
                config.max_symbols,
                config.default_symbol.clone(),
            )),
            Box::new(FetchFilings::new(collaborators.filings, documents)),
            Box::new(RetrieveContext::new(
                collaborators.retrieval,
                config.retrieval_top_k,
                config.retrieval_score_threshold,
            )),
            Box::new(BuildContext::new(config.filing_excerpt_chars)),
            Box::new(Synthesize::new(collaborators.synthesis)),
        ];
        Self::with_steps(steps)
    }

    pub fn with_steps(steps: Vec<Box<dyn Step>>) -> Self {
        Self { steps }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Answer one question. Never fails: every degraded path still yields an answer.
    pub async fn run(&self, question: &str) -> PipelineRun {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", %run_id);
        self.run_inner(run_id, question).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid, question: &str) -> PipelineRun {
        let start_time = Instant::now();
        let mut state = PipelineState::new(question);
        let mut trace = Vec::with_capacity(self.steps.len());
        let mut terminated = false;

        info!(question = %question, "Pipeline: starting run");

        for step in &self.steps {
            if terminated {
                trace.push(StepRecord {
                    step: step.name(),
                    status: StepStatus::Skipped,
                    fields: Vec::new(),
                    elapsed_ms: 0,
                });
                continue;
            }

            let step_start = Instant::now();
            info!(step = step.name(), "Running step");

            let outcome = step.run(&state).await;
            let status = if outcome.is_terminal() {
                StepStatus::Terminal
            } else {
                StepStatus::Completed
            };
            terminated = outcome.is_terminal();

            let update = outcome.into_update();
            let fields = update.fields();
            let rejected = state.merge(update);
            if !rejected.is_empty() {
                warn!(step = step.name(), ?rejected, "Step tried to overwrite state");
            }

            trace.push(StepRecord {
                step: step.name(),
                status,
                fields,
                elapsed_ms: step_start.elapsed().as_millis() as u64,
            });
        }

        if !state.has_answer() {
            warn!("No step produced an answer; using apology");
            state.merge(PartialState {
                answer: Some(SYNTHESIS_APOLOGY.to_string()),
                ..Default::default()
            });
        }

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!(elapsed_ms, "Pipeline: run complete");

        PipelineRun {
            run_id,
            state,
            trace,
            elapsed_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::stubs::{chunk, StubExtractor, StubRetrieval, StubSet, StubSynthesis};
    use crate::documents::InMemoryDocumentStore;
    use crate::models::SymbolDetail;
    use crate::steps::retrieve_context::CLARIFICATION_MESSAGE;
    use crate::steps::StepOutcome;
    use async_trait::async_trait;

    fn pipeline(stubs: &StubSet) -> Pipeline {
        Pipeline::new(
            &OrchestratorConfig::default(),
            stubs.collaborators(),
            Arc::new(InMemoryDocumentStore::new()),
        )
    }

    #[test]
    fn test_fixed_step_order() {
        let stubs = StubSet::healthy();
        assert_eq!(
            pipeline(&stubs).step_names(),
            vec![
                "extract_and_quote",
                "fetch_filings",
                "retrieve_context",
                "build_context",
                "synthesize"
            ]
        );
    }

    #[tokio::test]
    async fn test_happy_path() {
        let stubs = StubSet::healthy();
        let run = pipeline(&stubs).run("Asia tech exposure?").await;

        assert_eq!(run.answer(), "Asia tech exposure is 22% of AUM.");
        assert_eq!(run.state.filing_text(), "TSMC annual report");
        assert_eq!(run.state.retrieved_chunks().len(), 1);
        assert_eq!(stubs.synthesis.calls(), 1);

        let context = stubs.synthesis.seen_context().unwrap();
        assert!(context.starts_with("Latest quote for TSM: 171.25 at 2024-05-01T16:00:00"));
        assert!(context.contains("Latest SEC Filing: TSMC annual report"));
        assert!(context.contains("Knowledge Base Chunks:\nAsia tech"));

        assert!(run.trace.iter().all(|r| r.status != StepStatus::Skipped));
        assert_eq!(run.trace.last().map(|r| r.status), Some(StepStatus::Terminal));
    }

    #[tokio::test]
    async fn test_completion_when_everything_is_down() {
        let stubs = StubSet::unreachable();
        let run = pipeline(&stubs).run("Asia tech exposure?").await;

        assert!(!run.answer().is_empty());
        assert_eq!(run.answer(), CLARIFICATION_MESSAGE);
        assert_eq!(run.state.symbol_details(), &[SymbolDetail::bare("TSM")]);
        assert_eq!(run.state.quote().map(|q| q.is_available()), Some(false));
        assert_eq!(run.state.filing_text(), "");
    }

    #[tokio::test]
    async fn test_fallback_skips_context_and_synthesis() {
        let mut stubs = StubSet::healthy();
        stubs.retrieval = Arc::new(StubRetrieval::returning(vec![]));
        stubs.synthesis = Arc::new(StubSynthesis::forbidden());

        let run = pipeline(&stubs).run("q").await;

        assert_eq!(run.answer(), CLARIFICATION_MESSAGE);
        assert_eq!(run.state.context(), Some(""));
        assert!(run.state.retrieved_chunks().is_empty());
        assert_eq!(stubs.synthesis.calls(), 0);

        let statuses: Vec<StepStatus> = run.trace.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                StepStatus::Completed,
                StepStatus::Completed,
                StepStatus::Terminal,
                StepStatus::Skipped,
                StepStatus::Skipped
            ]
        );
    }

    #[tokio::test]
    async fn test_low_confidence_skips_synthesis() {
        let mut stubs = StubSet::healthy();
        stubs.retrieval = Arc::new(StubRetrieval::returning(vec![chunk("far", 400.01)]));
        stubs.synthesis = Arc::new(StubSynthesis::forbidden());

        let run = pipeline(&stubs).run("q").await;
        assert_eq!(run.answer(), CLARIFICATION_MESSAGE);
        assert_eq!(stubs.synthesis.calls(), 0);
    }

    #[tokio::test]
    async fn test_synthesis_failure_still_answers() {
        let mut stubs = StubSet::healthy();
        stubs.synthesis = Arc::new(StubSynthesis::failing());

        let run = pipeline(&stubs).run("q").await;
        assert_eq!(run.answer(), SYNTHESIS_APOLOGY);
        assert!(run.state.context().is_some_and(|c| !c.is_empty()));
    }

    #[tokio::test]
    async fn test_default_symbol_scenario() {
        let mut stubs = StubSet::healthy();
        stubs.extractor = Arc::new(StubExtractor::returning(vec![]));

        let run = pipeline(&stubs).run("Asia tech exposure?").await;

        assert_eq!(
            run.state.symbol_details(),
            &[SymbolDetail::new("TSM", "", "")]
        );
        assert_eq!(stubs.filings.calls(), 0);
        assert_eq!(stubs.retrieval.calls(), 1);
        assert_eq!(run.answer(), "Asia tech exposure is 22% of AUM.");
    }

    struct Silent;

    #[async_trait]
    impl Step for Silent {
        fn name(&self) -> &'static str {
            "silent"
        }

        async fn run(&self, _state: &PipelineState) -> StepOutcome {
            StepOutcome::Continue(PartialState::empty())
        }
    }

    #[tokio::test]
    async fn test_answer_guaranteed_even_if_no_step_answers() {
        let steps: Vec<Box<dyn Step>> = vec![Box::new(Silent)];
        let run = Pipeline::with_steps(steps).run("q").await;
        assert_eq!(run.answer(), SYNTHESIS_APOLOGY);
        assert_eq!(run.state.answer(), Some(SYNTHESIS_APOLOGY));
    }

    #[tokio::test]
    async fn test_concurrent_runs_are_independent() {
        let stubs = StubSet::healthy();
        let pipeline = Arc::new(pipeline(&stubs));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let pipeline = pipeline.clone();
                tokio::spawn(async move { pipeline.run(&format!("question {}", i)).await })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let run = handle.await.unwrap();
            assert_eq!(run.state.question(), format!("question {}", i));
            assert_eq!(run.answer(), "Asia tech exposure is 22% of AUM.");
        }
    }
}
