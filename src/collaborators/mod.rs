//! Collaborator contracts
//!
//! Each external service the pipeline depends on is one async trait with a
//! single operation. Failures come back as [`CollaboratorError`] values and are
//! handled by the calling step; nothing here panics or propagates past a step.

use crate::error::CollaboratorError;
use crate::models::{FilingRequest, Quote, RetrievedChunk, SymbolDetail};
use async_trait::async_trait;
use std::sync::Arc;

pub mod http;
#[cfg(test)]
pub(crate) mod stubs;

pub use http::{build_http_collaborators, HttpCollaborator};

pub type CollaboratorResult<T> = std::result::Result<T, CollaboratorError>;

pub const SYMBOL_EXTRACTOR: &str = "symbol-extractor";
pub const QUOTE_SERVICE: &str = "quote-service";
pub const FILING_SERVICE: &str = "filing-service";
pub const RETRIEVAL_SERVICE: &str = "retrieval-service";
pub const SYNTHESIS_SERVICE: &str = "synthesis-service";

/// Resolves ticker symbols (and filing identifiers) mentioned in a question
#[async_trait]
pub trait SymbolExtractor: Send + Sync {
    async fn extract_symbols(&self, question: &str) -> CollaboratorResult<Vec<SymbolDetail>>;
}

/// Live market quotes
#[async_trait]
pub trait QuoteService: Send + Sync {
    async fn get_quote(&self, symbol: &str) -> CollaboratorResult<Quote>;
}

/// SEC filing text
#[async_trait]
pub trait FilingService: Send + Sync {
    async fn get_filing(&self, request: &FilingRequest) -> CollaboratorResult<String>;
}

/// Vector similarity search over the knowledge base
#[async_trait]
pub trait RetrievalService: Send + Sync {
    async fn retrieve(&self, query: &str, top_k: usize) -> CollaboratorResult<Vec<RetrievedChunk>>;
}

/// Language-model answer synthesis
#[async_trait]
pub trait SynthesisService: Send + Sync {
    async fn synthesize(&self, question: &str, context: &str) -> CollaboratorResult<String>;
}

/// The full set of collaborators a pipeline is wired with
#[derive(Clone)]
pub struct Collaborators {
    pub symbol_extractor: Arc<dyn SymbolExtractor>,
    pub quotes: Arc<dyn QuoteService>,
    pub filings: Arc<dyn FilingService>,
    pub retrieval: Arc<dyn RetrievalService>,
    pub synthesis: Arc<dyn SynthesisService>,
}
