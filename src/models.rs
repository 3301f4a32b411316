//! Core data models for the orchestrator
//!
//! Domain records shared by the steps, plus the wire shapes exchanged with the
//! collaborator services and the inbound facade.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Decode an absent or `null` string as empty
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

//
// ================= Domain =================
//

/// A resolved ticker and the identifiers needed to fetch its filing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SymbolDetail {
    pub symbol: String,
    /// SEC CIK; empty when unknown, in which case no filing is fetched
    #[serde(
        rename = "cik",
        alias = "external_id",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub external_id: String,
    #[serde(
        rename = "filing_type",
        alias = "filing_kind",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub filing_kind: String,
}

impl SymbolDetail {
    pub fn new(
        symbol: impl Into<String>,
        external_id: impl Into<String>,
        filing_kind: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            external_id: external_id.into(),
            filing_kind: filing_kind.into(),
        }
    }

    /// A symbol with no filing identifiers
    pub fn bare(symbol: impl Into<String>) -> Self {
        Self::new(symbol, "", "")
    }

    pub fn has_external_id(&self) -> bool {
        !self.external_id.trim().is_empty()
    }
}

/// Latest quote for one symbol. `None` fields render as `N/A`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub price: Option<f64>,
    pub timestamp: Option<String>,
}

impl Quote {
    /// Sentinel written when the quote service could not be reached
    pub fn unavailable(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            price: None,
            timestamp: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.price.is_some()
    }

    pub fn price_display(&self) -> String {
        self.price
            .map(|p| p.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }

    pub fn timestamp_display(&self) -> &str {
        self.timestamp.as_deref().unwrap_or("N/A")
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Latest quote for {}: {} at {}",
            self.symbol,
            self.price_display(),
            self.timestamp_display()
        )
    }
}

fn unscored() -> f64 {
    f64::INFINITY
}

/// One similarity-search hit; lower `score` is a closer match
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedChunk {
    pub text: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source: String,
    #[serde(default)]
    pub offset: u64,
    /// Missing scores decode as the worst possible distance
    #[serde(default = "unscored")]
    pub score: f64,
}

//
// ================= Collaborator Wire Format =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractSymbolsRequest {
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExtractSymbolsResponse {
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub details: Vec<SymbolDetail>,
}

impl ExtractSymbolsResponse {
    /// Resolved details, promoting bare `symbols` when the service sent no details
    pub fn into_details(self) -> Vec<SymbolDetail> {
        if !self.details.is_empty() {
            return self.details;
        }
        self.symbols
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .map(SymbolDetail::bare)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub symbols: Vec<String>,
    #[serde(default)]
    pub history: bool,
    #[serde(default)]
    pub info: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResult {
    pub symbol: String,
    #[serde(default, alias = "price")]
    pub latest_price: Option<f64>,
    #[serde(default, alias = "timestamp")]
    pub latest_timestamp: Option<String>,
}

impl From<QuoteResult> for Quote {
    fn from(result: QuoteResult) -> Self {
        Self {
            symbol: result.symbol,
            price: result.latest_price,
            timestamp: result.latest_timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QuoteResponse {
    #[serde(default)]
    pub results: Vec<QuoteResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilingRequest {
    #[serde(rename = "cik")]
    pub external_id: String,
    #[serde(rename = "filing_type")]
    pub filing_kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingResponse {
    #[serde(default)]
    pub document_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveRequest {
    pub query: String,
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RetrieveResponse {
    #[serde(default)]
    pub results: Vec<RetrievedChunk>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizeRequest {
    pub question: String,
    pub context: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizeResponse {
    pub answer: String,
}

//
// ================= Inbound =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrateRequest {
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrchestrateResponse {
    pub answer: String,
}
