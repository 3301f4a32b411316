//! Error types for the finance brief orchestrator

use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;

/// Errors that can surface outside a single pipeline run.
///
/// A pipeline run itself never returns one of these: collaborator failures are
/// absorbed by the steps as [`CollaboratorError`] and turned into fallbacks.
#[derive(Error, Debug)]
pub enum OrchestrationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Document store error: {0}")]
    DocumentStore(String),

    #[error("Server error: {0}")]
    Server(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Outcome of a failed collaborator call.
///
/// Steps treat this as an expected value, never as something to propagate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    /// Network failure, timeout, or non-2xx status.
    #[error("{collaborator} unavailable: {reason}")]
    Unavailable {
        collaborator: &'static str,
        reason: String,
    },

    /// The collaborator answered, but with a malformed or unusable body.
    #[error("{collaborator} returned invalid data: {reason}")]
    DataInvalid {
        collaborator: &'static str,
        reason: String,
    },
}

impl CollaboratorError {
    pub fn unavailable(collaborator: &'static str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            collaborator,
            reason: reason.into(),
        }
    }

    pub fn data_invalid(collaborator: &'static str, reason: impl Into<String>) -> Self {
        Self::DataInvalid {
            collaborator,
            reason: reason.into(),
        }
    }

    pub fn collaborator(&self) -> &'static str {
        match self {
            Self::Unavailable { collaborator, .. } | Self::DataInvalid { collaborator, .. } => {
                collaborator
            }
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::Unavailable { reason, .. } | Self::DataInvalid { reason, .. } => reason,
        }
    }
}
