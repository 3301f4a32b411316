//! Retrieve-Context: similarity search plus the retrieval quality gate
//!
//! The gate has two outcomes. `Pass` keeps the ranked chunks and lets the
//! pipeline continue. `Fallback` writes a clarification answer and ends the run.

use super::{Step, StepOutcome};
use crate::collaborators::{CollaboratorResult, RetrievalService};
use crate::models::RetrievedChunk;
use crate::state::{PartialState, PipelineState};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

pub const CLARIFICATION_MESSAGE: &str = "Sorry, I could not confidently answer from our knowledge base. Could you clarify or rephrase your question?";

#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    NoResults,
    CollaboratorFailed(String),
    LowConfidence { score: f64, threshold: f64 },
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoResults => write!(f, "retrieval returned no chunks"),
            Self::CollaboratorFailed(reason) => write!(f, "retrieval failed: {}", reason),
            Self::LowConfidence { score, threshold } => {
                write!(f, "top score {} exceeds threshold {}", score, threshold)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalGate {
    Pass(Vec<RetrievedChunk>),
    Fallback(FallbackReason),
}

/// Decide whether retrieved context is trustworthy.
///
/// Scores are distances, so the gate trips when the best score is strictly above
/// `threshold`. A non-finite score never passes.
pub fn evaluate_retrieval(
    result: CollaboratorResult<Vec<RetrievedChunk>>,
    threshold: f64,
) -> RetrievalGate {
    let chunks = match result {
        Ok(chunks) => chunks,
        Err(e) => return RetrievalGate::Fallback(FallbackReason::CollaboratorFailed(e.to_string())),
    };

    let Some(top) = chunks.first() else {
        return RetrievalGate::Fallback(FallbackReason::NoResults);
    };

    if top.score.is_finite() && top.score <= threshold {
        RetrievalGate::Pass(chunks)
    } else {
        RetrievalGate::Fallback(FallbackReason::LowConfidence {
            score: top.score,
            threshold,
        })
    }
}

pub struct RetrieveContext {
    retrieval: Arc<dyn RetrievalService>,
    top_k: usize,
    threshold: f64,
}

impl RetrieveContext {
    pub fn new(retrieval: Arc<dyn RetrievalService>, top_k: usize, threshold: f64) -> Self {
        Self {
            retrieval,
            top_k,
            threshold,
        }
    }
}

#[async_trait]
impl Step for RetrieveContext {
    fn name(&self) -> &'static str {
        "retrieve_context"
    }

    async fn run(&self, state: &PipelineState) -> StepOutcome {
        let result = self.retrieval.retrieve(state.question(), self.top_k).await;

        match evaluate_retrieval(result, self.threshold) {
            RetrievalGate::Pass(chunks) => {
                info!(
                    chunks = chunks.len(),
                    top_score = chunks.first().map(|c| c.score),
                    "Retrieval passed quality gate"
                );
                StepOutcome::Continue(PartialState {
                    retrieved_chunks: Some(chunks),
                    ..PartialState::default()
                })
            }
            RetrievalGate::Fallback(reason) => {
                warn!(%reason, "Retrieval fallback; short-circuiting");
                StepOutcome::Terminal(PartialState {
                    retrieved_chunks: Some(Vec::new()),
                    context: Some(String::new()),
                    answer: Some(CLARIFICATION_MESSAGE.to_string()),
                    ..PartialState::default()
                })
            }
        }
    }
}
