//! Pipeline state
//!
//! One `PipelineState` is created per question and dropped once the answer is
//! returned. Steps read it and hand back a `PartialState`; only the executor
//! merges. Every field is write-once: a merge never clears or replaces a value
//! that is already present.

use crate::models::{Quote, RetrievedChunk, SymbolDetail};
use serde::Serialize;

/// Accumulated results of one pipeline run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PipelineState {
    question: String,
    symbol_details: Option<Vec<SymbolDetail>>,
    quote: Option<Quote>,
    filing_text: Option<String>,
    retrieved_chunks: Option<Vec<RetrievedChunk>>,
    context: Option<String>,
    answer: Option<String>,
}

/// The fields one step produces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialState {
    pub symbol_details: Option<Vec<SymbolDetail>>,
    pub quote: Option<Quote>,
    pub filing_text: Option<String>,
    pub retrieved_chunks: Option<Vec<RetrievedChunk>>,
    pub context: Option<String>,
    pub answer: Option<String>,
}

impl PartialState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Names of the fields this update writes
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.symbol_details.is_some() {
            fields.push("symbol_details");
        }
        if self.quote.is_some() {
            fields.push("quote");
        }
        if self.filing_text.is_some() {
            fields.push("filing_text");
        }
        if self.retrieved_chunks.is_some() {
            fields.push("retrieved_chunks");
        }
        if self.context.is_some() {
            fields.push("context");
        }
        if self.answer.is_some() {
            fields.push("answer");
        }
        fields
    }
}

fn write_once<T>(
    slot: &mut Option<T>,
    value: Option<T>,
    field: &'static str,
    rejected: &mut Vec<&'static str>,
) {
    let Some(value) = value else {
        return;
    };

    if slot.is_some() {
        rejected.push(field);
    } else {
        *slot = Some(value);
    }
}

impl PipelineState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            symbol_details: None,
            quote: None,
            filing_text: None,
            retrieved_chunks: None,
            context: None,
            answer: None,
        }
    }

    /// Union the update into this state.
    ///
    /// Returns the fields the update tried to overwrite; those writes are dropped.
    pub fn merge(&mut self, update: PartialState) -> Vec<&'static str> {
        let mut rejected = Vec::new();

        write_once(
            &mut self.symbol_details,
            update.symbol_details,
            "symbol_details",
            &mut rejected,
        );
        write_once(&mut self.quote, update.quote, "quote", &mut rejected);
        write_once(
            &mut self.filing_text,
            update.filing_text,
            "filing_text",
            &mut rejected,
        );
        write_once(
            &mut self.retrieved_chunks,
            update.retrieved_chunks,
            "retrieved_chunks",
            &mut rejected,
        );
        write_once(&mut self.context, update.context, "context", &mut rejected);
        write_once(&mut self.answer, update.answer, "answer", &mut rejected);

        rejected
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn symbol_details(&self) -> &[SymbolDetail] {
        self.symbol_details.as_deref().unwrap_or_default()
    }

    pub fn quote(&self) -> Option<&Quote> {
        self.quote.as_ref()
    }

    pub fn filing_text(&self) -> &str {
        self.filing_text.as_deref().unwrap_or_default()
    }

    pub fn retrieved_chunks(&self) -> &[RetrievedChunk] {
        self.retrieved_chunks.as_deref().unwrap_or_default()
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn has_answer(&self) -> bool {
        self.answer.is_some()
    }
}
