//! Side document store for fetched filings
//!
//! Filings are dropped as text files for the out-of-band index rebuild job.
//! The store is append-only; every write gets its own file, so concurrent
//! requests never write the same target.

use crate::error::OrchestrationError;
use crate::models::SymbolDetail;
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Trait for filing persistence
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist one filing text; returns the key it was stored under
    async fn save_filing(&self, detail: &SymbolDetail, text: &str) -> Result<String>;
}

/// Writes `{symbol}_{filingKind}_{timestamp}.txt` under a shared directory
pub struct FsDocumentStore {
    dir: PathBuf,
}

impl FsDocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Keep file names portable: anything outside `[A-Za-z0-9.-]` becomes `_`
fn sanitize(part: &str, fallback: &str) -> String {
    let cleaned: String = part
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

pub fn filing_file_name(detail: &SymbolDetail, timestamp: &str) -> String {
    format!(
        "{}_{}_{}.txt",
        sanitize(&detail.symbol, "UNKNOWN"),
        sanitize(&detail.filing_kind, "filing"),
        timestamp
    )
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn save_filing(&self, detail: &SymbolDetail, text: &str) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S_%6f").to_string();
        let mut name = filing_file_name(detail, &timestamp);

        let mut file = match open_new(&self.dir.join(&name)).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                // Same symbol, same microsecond: disambiguate instead of overwriting
                let suffix = Uuid::new_v4().simple().to_string();
                name = filing_file_name(detail, &format!("{}_{}", timestamp, &suffix[..8]));
                open_new(&self.dir.join(&name)).await?
            }
            Err(e) => return Err(e.into()),
        };

        file.write_all(text.as_bytes()).await?;
        file.flush().await?;

        debug!(file = %name, bytes = text.len(), "Saved filing for indexing");
        Ok(name)
    }
}

async fn open_new(path: &Path) -> std::io::Result<tokio::fs::File> {
    tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
}

/// In-memory document store for tests and dry runs
pub struct InMemoryDocumentStore {
    documents: RwLock<Vec<(String, String)>>,
    fail_writes: bool,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
            fail_writes: false,
        }
    }

    /// A store whose every write fails
    pub fn failing() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
            fail_writes: true,
        }
    }

    pub async fn documents(&self) -> Vec<(String, String)> {
        self.documents.read().await.clone()
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn save_filing(&self, detail: &SymbolDetail, text: &str) -> Result<String> {
        if self.fail_writes {
            return Err(OrchestrationError::DocumentStore(
                "document store is read-only".to_string(),
            ));
        }

        let mut documents = self.documents.write().await;
        let key = filing_file_name(detail, &documents.len().to_string());
        documents.push((key.clone(), text.to_string()));
        Ok(key)
    }
}
