//! Extract-and-Quote: resolve ticker symbols, then quote the first one

use super::{Step, StepOutcome};
use crate::collaborators::{QuoteService, SymbolExtractor};
use crate::models::{Quote, SymbolDetail};
use crate::state::{PartialState, PipelineState};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub struct ExtractAndQuote {
    extractor: Arc<dyn SymbolExtractor>,
    quotes: Arc<dyn QuoteService>,
    max_symbols: usize,
    default_symbol: String,
}

impl ExtractAndQuote {
    pub fn new(
        extractor: Arc<dyn SymbolExtractor>,
        quotes: Arc<dyn QuoteService>,
        max_symbols: usize,
        default_symbol: impl Into<String>,
    ) -> Self {
        Self {
            extractor,
            quotes,
            max_symbols,
            default_symbol: default_symbol.into(),
        }
    }

    async fn resolve_symbols(&self, question: &str) -> Vec<SymbolDetail> {
        let mut details = match self.extractor.extract_symbols(question).await {
            Ok(details) => details,
            Err(e) => {
                warn!(reason = %e, "Symbol extraction failed; using default symbol");
                Vec::new()
            }
        };

        details.retain(|d| !d.symbol.trim().is_empty());

        if details.is_empty() {
            info!(symbol = %self.default_symbol, "No symbols resolved; falling back to default");
            return vec![SymbolDetail::bare(self.default_symbol.clone())];
        }

        if details.len() > self.max_symbols {
            info!(
                extracted = details.len(),
                kept = self.max_symbols,
                "Truncating extracted symbols"
            );
            details.truncate(self.max_symbols);
        }

        details
    }
}

#[async_trait]
impl Step for ExtractAndQuote {
    fn name(&self) -> &'static str {
        "extract_and_quote"
    }

    async fn run(&self, state: &PipelineState) -> StepOutcome {
        let details = self.resolve_symbols(state.question()).await;
        let symbols: Vec<&str> = details.iter().map(|d| d.symbol.as_str()).collect();
        info!(?symbols, "Resolved symbols");

        // Only the first symbol is quoted
        let primary = details
            .first()
            .map(|d| d.symbol.clone())
            .unwrap_or_else(|| self.default_symbol.clone());
        let quote = match self.quotes.get_quote(&primary).await {
            Ok(quote) => quote,
            Err(e) => {
                warn!(symbol = %primary, reason = %e, "Quote lookup failed; writing N/A quote");
                Quote::unavailable(primary)
            }
        };

        StepOutcome::Continue(PartialState {
            symbol_details: Some(details),
            quote: Some(quote),
            ..PartialState::default()
        })
    }
}
