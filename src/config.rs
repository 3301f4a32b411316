//! Orchestrator configuration
//!
//! Collaborator endpoints, timeouts and quality thresholds are passed into the
//! pipeline at construction time instead of living in process-wide globals.

use crate::error::OrchestrationError;
use crate::Result;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Address and timeout of one collaborator service
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub url: String,
    pub timeout: Duration,
}

impl Endpoint {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

/// Configuration for the orchestration pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    pub symbol_extractor: Endpoint,
    pub quote_service: Endpoint,
    pub filing_service: Endpoint,
    pub retrieval_service: Endpoint,
    pub synthesis_service: Endpoint,

    /// Value of the `X-Client-Id` header sent with every collaborator call
    pub client_id: String,

    /// Number of chunks requested from the retrieval service
    pub retrieval_top_k: usize,
    /// Top-chunk distance above which retrieval falls back.
    /// Tuned for one index configuration; not portable across metrics.
    pub retrieval_score_threshold: f64,

    /// Upper bound on symbols carried into filing fetches
    pub max_symbols: usize,
    /// Symbol used when extraction yields nothing
    pub default_symbol: String,
    /// Characters of filing text kept in the prompt context
    pub filing_excerpt_chars: usize,

    /// Where fetched filings are dropped for the index rebuild job
    pub docs_dir: PathBuf,

    pub port: u16,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            symbol_extractor: Endpoint::new(
                "http://localhost:8004/extract_symbols",
                Duration::from_secs(3),
            ),
            quote_service: Endpoint::new("http://localhost:8001/quote", Duration::from_secs(10)),
            filing_service: Endpoint::new(
                "http://localhost:8002/filing",
                Duration::from_secs(300),
            ),
            retrieval_service: Endpoint::new(
                "http://localhost:8003/retrieve",
                Duration::from_secs(30),
            ),
            synthesis_service: Endpoint::new(
                "http://localhost:8004/analyze_graph",
                Duration::from_secs(300),
            ),
            client_id: "finance-brief-orchestrator".to_string(),
            retrieval_top_k: 5,
            retrieval_score_threshold: 400.0,
            max_symbols: 3,
            default_symbol: "TSM".to_string(),
            filing_excerpt_chars: 2000,
            docs_dir: PathBuf::from("data_ingestion/docs"),
            port: 8000,
        }
    }
}

impl OrchestratorConfig {
    /// Build a configuration from process environment variables.
    ///
    /// Call `dotenv::dotenv()` first if a `.env` file should be honored.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        apply_endpoint(
            &lookup,
            &mut config.symbol_extractor,
            "SYMBOL_EXTRACTOR_URL",
            "SYMBOL_EXTRACTOR_TIMEOUT_SECS",
        )?;
        apply_endpoint(
            &lookup,
            &mut config.quote_service,
            "API_AGENT_URL",
            "API_AGENT_TIMEOUT_SECS",
        )?;
        apply_endpoint(
            &lookup,
            &mut config.filing_service,
            "SCRAPER_AGENT_URL",
            "SCRAPER_AGENT_TIMEOUT_SECS",
        )?;
        apply_endpoint(
            &lookup,
            &mut config.retrieval_service,
            "RETRIEVER_AGENT_URL",
            "RETRIEVER_AGENT_TIMEOUT_SECS",
        )?;
        apply_endpoint(
            &lookup,
            &mut config.synthesis_service,
            "LANGUAGE_AGENT_URL",
            "LANGUAGE_AGENT_TIMEOUT_SECS",
        )?;

        if let Some(client_id) = non_blank(&lookup, "CLIENT_ID") {
            config.client_id = client_id;
        }
        if let Some(top_k) = parse_var(&lookup, "RETRIEVAL_TOP_K")? {
            config.retrieval_top_k = top_k;
        }
        if let Some(threshold) = parse_var(&lookup, "RETRIEVAL_SCORE_THRESHOLD")? {
            config.retrieval_score_threshold = threshold;
        }
        if let Some(max_symbols) = parse_var(&lookup, "MAX_SYMBOLS")? {
            config.max_symbols = max_symbols;
        }
        if let Some(symbol) = non_blank(&lookup, "DEFAULT_SYMBOL") {
            config.default_symbol = symbol.to_uppercase();
        }
        if let Some(chars) = parse_var(&lookup, "FILING_EXCERPT_CHARS")? {
            config.filing_excerpt_chars = chars;
        }
        if let Some(dir) = non_blank(&lookup, "DOCS_DIR") {
            config.docs_dir = PathBuf::from(dir);
        }
        if let Some(port) = parse_var(&lookup, "PORT")? {
            config.port = port;
        } else if let Some(port) = parse_var(&lookup, "API_PORT")? {
            config.port = port;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let endpoints = [
            ("symbol extractor", &self.symbol_extractor),
            ("quote service", &self.quote_service),
            ("filing service", &self.filing_service),
            ("retrieval service", &self.retrieval_service),
            ("synthesis service", &self.synthesis_service),
        ];

        for (name, endpoint) in endpoints {
            if endpoint.url.trim().is_empty() {
                return Err(OrchestrationError::Config(format!("{} URL is empty", name)));
            }
            if endpoint.timeout.is_zero() {
                return Err(OrchestrationError::Config(format!(
                    "{} timeout must be greater than zero",
                    name
                )));
            }
        }

        if self.retrieval_top_k == 0 {
            return Err(OrchestrationError::Config(
                "retrieval top_k must be greater than zero".to_string(),
            ));
        }
        if !self.retrieval_score_threshold.is_finite() {
            return Err(OrchestrationError::Config(
                "retrieval score threshold must be finite".to_string(),
            ));
        }
        if self.max_symbols == 0 {
            return Err(OrchestrationError::Config(
                "max symbols must be greater than zero".to_string(),
            ));
        }
        if self.default_symbol.trim().is_empty() {
            return Err(OrchestrationError::Config(
                "default symbol is empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn non_blank<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_blank(lookup, key) {
        Some(raw) => raw.parse::<T>().map(Some).map_err(|e| {
            OrchestrationError::Config(format!("{}={:?} is invalid: {}", key, raw, e))
        }),
        None => Ok(None),
    }
}

fn apply_endpoint<F>(lookup: &F, endpoint: &mut Endpoint, url_key: &str, timeout_key: &str) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = non_blank(lookup, url_key) {
        endpoint.url = url;
    }
    if let Some(secs) = parse_var::<F, u64>(lookup, timeout_key)? {
        endpoint.timeout = Duration::from_secs(secs);
    }
    Ok(())
}
