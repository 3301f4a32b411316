//! HTTP-backed collaborators
//!
//! Every collaborator is a JSON-over-POST service. One pooled reqwest client is
//! shared; each call carries its own timeout and the client identity header.

use super::{
    CollaboratorResult, Collaborators, FilingService, QuoteService, RetrievalService,
    SymbolExtractor, SynthesisService, FILING_SERVICE, QUOTE_SERVICE, RETRIEVAL_SERVICE,
    SYMBOL_EXTRACTOR, SYNTHESIS_SERVICE,
};
use crate::config::{Endpoint, OrchestratorConfig};
use crate::error::CollaboratorError;
use crate::models::{
    ExtractSymbolsRequest, ExtractSymbolsResponse, FilingRequest, FilingResponse, Quote,
    QuoteRequest, QuoteResponse, RetrieveRequest, RetrieveResponse, RetrievedChunk,
    SymbolDetail, SynthesizeRequest, SynthesizeResponse,
};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

pub const CLIENT_ID_HEADER: &str = "X-Client-Id";

/// One collaborator endpoint reachable over HTTP
#[derive(Clone)]
pub struct HttpCollaborator {
    name: &'static str,
    client: Client,
    endpoint: Endpoint,
    client_id: String,
}

impl HttpCollaborator {
    pub fn new(name: &'static str, client: Client, endpoint: Endpoint, client_id: String) -> Self {
        Self {
            name,
            client,
            endpoint,
            client_id,
        }
    }

    async fn post_json<B, R>(&self, body: &B) -> CollaboratorResult<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        debug!(collaborator = self.name, url = %self.endpoint.url, "Calling collaborator");

        let response = self
            .client
            .post(&self.endpoint.url)
            .header(CLIENT_ID_HEADER, &self.client_id)
            .timeout(self.endpoint.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    format!("timed out after {:?}", self.endpoint.timeout)
                } else {
                    format!("request failed: {}", e)
                };
                error!(collaborator = self.name, %reason, "Collaborator request failed");
                CollaboratorError::unavailable(self.name, reason)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(collaborator = self.name, %status, "Collaborator returned error status");
            return Err(CollaboratorError::unavailable(
                self.name,
                format!("returned {}: {}", status, truncate(&body, 200)),
            ));
        }

        let bytes = response.bytes().await.map_err(|e| {
            CollaboratorError::unavailable(self.name, format!("failed to read body: {}", e))
        })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            error!(collaborator = self.name, error = %e, "Collaborator response did not decode");
            CollaboratorError::data_invalid(self.name, format!("invalid JSON response: {}", e))
        })
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[async_trait]
impl SymbolExtractor for HttpCollaborator {
    async fn extract_symbols(&self, question: &str) -> CollaboratorResult<Vec<SymbolDetail>> {
        let response: ExtractSymbolsResponse = self
            .post_json(&ExtractSymbolsRequest {
                question: question.to_string(),
            })
            .await?;
        Ok(response.into_details())
    }
}

#[async_trait]
impl QuoteService for HttpCollaborator {
    async fn get_quote(&self, symbol: &str) -> CollaboratorResult<Quote> {
        let response: QuoteResponse = self
            .post_json(&QuoteRequest {
                symbols: vec![symbol.to_string()],
                history: true,
                info: true,
            })
            .await?;

        response
            .results
            .into_iter()
            .next()
            .map(Quote::from)
            .ok_or_else(|| CollaboratorError::data_invalid(self.name, "no quote results"))
    }
}

#[async_trait]
impl FilingService for HttpCollaborator {
    async fn get_filing(&self, request: &FilingRequest) -> CollaboratorResult<String> {
        let response: FilingResponse = self.post_json(request).await?;
        Ok(response.document_text)
    }
}

#[async_trait]
impl RetrievalService for HttpCollaborator {
    async fn retrieve(&self, query: &str, top_k: usize) -> CollaboratorResult<Vec<RetrievedChunk>> {
        let response: RetrieveResponse = self
            .post_json(&RetrieveRequest {
                query: query.to_string(),
                top_k,
            })
            .await?;
        Ok(response.results)
    }
}

#[async_trait]
impl SynthesisService for HttpCollaborator {
    async fn synthesize(&self, question: &str, context: &str) -> CollaboratorResult<String> {
        let response: SynthesizeResponse = self
            .post_json(&SynthesizeRequest {
                question: question.to_string(),
                context: context.to_string(),
            })
            .await?;

        if response.answer.trim().is_empty() {
            return Err(CollaboratorError::data_invalid(self.name, "empty answer"));
        }
        Ok(response.answer)
    }
}

/// Wire all five collaborators to the endpoints in `config`
pub fn build_http_collaborators(config: &OrchestratorConfig) -> Result<Collaborators> {
    let client = Client::builder()
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(8)
        .build()?;

    let collaborator = |name: &'static str, endpoint: &Endpoint| {
        Arc::new(HttpCollaborator::new(
            name,
            client.clone(),
            endpoint.clone(),
            config.client_id.clone(),
        ))
    };

    Ok(Collaborators {
        symbol_extractor: collaborator(SYMBOL_EXTRACTOR, &config.symbol_extractor),
        quotes: collaborator(QUOTE_SERVICE, &config.quote_service),
        filings: collaborator(FILING_SERVICE, &config.filing_service),
        retrieval: collaborator(RETRIEVAL_SERVICE, &config.retrieval_service),
        synthesis: collaborator(SYNTHESIS_SERVICE, &config.synthesis_service),
    })
}
