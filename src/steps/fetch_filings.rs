//! Fetch-Filings: pull filing text for every symbol with a CIK
//!
//! Fetches run concurrently but results are joined back in `symbol_details`
//! order, so the assembled context is reproducible regardless of latency.

use super::{Step, StepOutcome};
use crate::collaborators::FilingService;
use crate::documents::DocumentStore;
use crate::models::{FilingRequest, SymbolDetail};
use crate::state::{PartialState, PipelineState};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const FILING_SEPARATOR: &str = "\n\n";

pub struct FetchFilings {
    filings: Arc<dyn FilingService>,
    documents: Arc<dyn DocumentStore>,
}

impl FetchFilings {
    pub fn new(filings: Arc<dyn FilingService>, documents: Arc<dyn DocumentStore>) -> Self {
        Self { filings, documents }
    }

    /// `None` when the fetch failed or the filing was empty
    async fn fetch_one(&self, detail: &SymbolDetail) -> Option<String> {
        let request = FilingRequest {
            external_id: detail.external_id.clone(),
            filing_kind: detail.filing_kind.clone(),
        };

        let text = match self.filings.get_filing(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(symbol = %detail.symbol, reason = %e, "Filing fetch failed");
                return None;
            }
        };

        info!(symbol = %detail.symbol, length = text.len(), "Fetched filing");
        if text.is_empty() {
            return None;
        }

        // Indexing is best-effort and never blocks the answer
        if let Err(e) = self.documents.save_filing(detail, &text).await {
            warn!(symbol = %detail.symbol, error = %e, "Could not persist filing for indexing");
        }

        Some(text)
    }
}

#[async_trait]
impl Step for FetchFilings {
    fn name(&self) -> &'static str {
        "fetch_filings"
    }

    async fn run(&self, state: &PipelineState) -> StepOutcome {
        let fetchable: Vec<&SymbolDetail> = state
            .symbol_details()
            .iter()
            .filter(|d| {
                let keep = d.has_external_id();
                if !keep {
                    debug!(symbol = %d.symbol, "No CIK; skipping filing fetch");
                }
                keep
            })
            .collect();

        // join_all yields results in input order
        let texts = join_all(fetchable.iter().map(|d| self.fetch_one(d))).await;

        let filing_text = texts
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(FILING_SEPARATOR);

        StepOutcome::Continue(PartialState {
            filing_text: Some(filing_text),
            ..PartialState::default()
        })
    }
}
