//! Scripted collaborators for tests. Every stub counts its calls.

use super::{
    CollaboratorResult, Collaborators, FilingService, QuoteService, RetrievalService,
    SymbolExtractor, SynthesisService, FILING_SERVICE, QUOTE_SERVICE, RETRIEVAL_SERVICE,
    SYMBOL_EXTRACTOR, SYNTHESIS_SERVICE,
};
use crate::error::CollaboratorError;
use crate::models::{FilingRequest, Quote, RetrievedChunk, SymbolDetail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn down(collaborator: &'static str) -> CollaboratorError {
    CollaboratorError::unavailable(collaborator, "connection refused")
}

pub fn chunk(text: &str, score: f64) -> RetrievedChunk {
    RetrievedChunk {
        text: text.to_string(),
        source: format!("{}.txt", text.to_lowercase().replace(' ', "_")),
        offset: 0,
        score,
    }
}

pub struct StubExtractor {
    response: CollaboratorResult<Vec<SymbolDetail>>,
    calls: AtomicUsize,
}

impl StubExtractor {
    pub fn returning(details: Vec<SymbolDetail>) -> Self {
        Self {
            response: Ok(details),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: Err(down(SYMBOL_EXTRACTOR)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SymbolExtractor for StubExtractor {
    async fn extract_symbols(&self, _question: &str) -> CollaboratorResult<Vec<SymbolDetail>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

pub struct StubQuotes {
    response: CollaboratorResult<Quote>,
    requested: Mutex<Vec<String>>,
}

impl StubQuotes {
    pub fn returning(price: f64, timestamp: &str) -> Self {
        Self {
            response: Ok(Quote {
                symbol: String::new(),
                price: Some(price),
                timestamp: Some(timestamp.to_string()),
            }),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: Err(down(QUOTE_SERVICE)),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuoteService for StubQuotes {
    async fn get_quote(&self, symbol: &str) -> CollaboratorResult<Quote> {
        self.requested.lock().unwrap().push(symbol.to_string());
        self.response.clone().map(|quote| Quote {
            symbol: symbol.to_string(),
            ..quote
        })
    }
}

/// Filing texts keyed by external id, each with an artificial latency
pub struct StubFilings {
    filings: HashMap<String, (CollaboratorResult<String>, Duration)>,
    requested: Mutex<Vec<String>>,
}

impl StubFilings {
    pub fn new() -> Self {
        Self {
            filings: HashMap::new(),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn with_text(mut self, external_id: &str, text: &str, delay: Duration) -> Self {
        self.filings
            .insert(external_id.to_string(), (Ok(text.to_string()), delay));
        self
    }

    pub fn with_failure(mut self, external_id: &str) -> Self {
        self.filings
            .insert(external_id.to_string(), (Err(down(FILING_SERVICE)), Duration::ZERO));
        self
    }

    pub fn calls(&self) -> usize {
        self.requested.lock().unwrap().len()
    }
}

#[async_trait]
impl FilingService for StubFilings {
    async fn get_filing(&self, request: &FilingRequest) -> CollaboratorResult<String> {
        self.requested
            .lock()
            .unwrap()
            .push(request.external_id.clone());

        match self.filings.get(&request.external_id) {
            Some((response, delay)) => {
                tokio::time::sleep(*delay).await;
                response.clone()
            }
            None => Err(CollaboratorError::unavailable(FILING_SERVICE, "unknown CIK")),
        }
    }
}

pub struct StubRetrieval {
    response: CollaboratorResult<Vec<RetrievedChunk>>,
    calls: AtomicUsize,
}

impl StubRetrieval {
    pub fn returning(chunks: Vec<RetrievedChunk>) -> Self {
        Self {
            response: Ok(chunks),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: Err(down(RETRIEVAL_SERVICE)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RetrievalService for StubRetrieval {
    async fn retrieve(&self, _query: &str, _top_k: usize) -> CollaboratorResult<Vec<RetrievedChunk>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

pub struct StubSynthesis {
    response: Option<CollaboratorResult<String>>,
    seen_context: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl StubSynthesis {
    pub fn returning(answer: &str) -> Self {
        Self {
            response: Some(Ok(answer.to_string())),
            seen_context: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: Some(Err(down(SYNTHESIS_SERVICE))),
            seen_context: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Panics if invoked
    pub fn forbidden() -> Self {
        Self {
            response: None,
            seen_context: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_context(&self) -> Option<String> {
        self.seen_context.lock().unwrap().clone()
    }
}

#[async_trait]
impl SynthesisService for StubSynthesis {
    async fn synthesize(&self, _question: &str, context: &str) -> CollaboratorResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.seen_context.lock().unwrap() = Some(context.to_string());
        match &self.response {
            Some(response) => response.clone(),
            None => panic!("synthesis must not be called on this path"),
        }
    }
}

/// A full stub wiring whose pieces stay inspectable after the run
pub struct StubSet {
    pub extractor: Arc<StubExtractor>,
    pub quotes: Arc<StubQuotes>,
    pub filings: Arc<StubFilings>,
    pub retrieval: Arc<StubRetrieval>,
    pub synthesis: Arc<StubSynthesis>,
}

impl StubSet {
    /// Every collaborator healthy with a confident retrieval hit
    pub fn healthy() -> Self {
        Self {
            extractor: Arc::new(StubExtractor::returning(vec![SymbolDetail::new(
                "TSM",
                "0001046179",
                "20-F",
            )])),
            quotes: Arc::new(StubQuotes::returning(171.25, "2024-05-01T16:00:00")),
            filings: Arc::new(StubFilings::new().with_text(
                "0001046179",
                "TSMC annual report",
                Duration::ZERO,
            )),
            retrieval: Arc::new(StubRetrieval::returning(vec![chunk("Asia tech", 120.0)])),
            synthesis: Arc::new(StubSynthesis::returning("Asia tech exposure is 22% of AUM.")),
        }
    }

    /// Every collaborator unreachable
    pub fn unreachable() -> Self {
        Self {
            extractor: Arc::new(StubExtractor::failing()),
            quotes: Arc::new(StubQuotes::failing()),
            filings: Arc::new(StubFilings::new()),
            retrieval: Arc::new(StubRetrieval::failing()),
            synthesis: Arc::new(StubSynthesis::failing()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            symbol_extractor: self.extractor.clone(),
            quotes: self.quotes.clone(),
            filings: self.filings.clone(),
            retrieval: self.retrieval.clone(),
            synthesis: self.synthesis.clone(),
        }
    }
}
