use std::fmt;

use thiserror::Error;

use crate::analysis::state::AnalysisState;
use crate::domain::audit::AuditId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
    #[error("invalid analysis run transition: {from} -> {to}")]
    InvalidRunTransition { from: AnalysisState, to: AnalysisState },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collaborator {
    Ingestion,
    Storage,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ingestion => f.write_str("ingestion"),
            Self::Storage => f.write_str("storage"),
        }
    }
}

/// Fatal outcomes of an analysis run. No partial result accompanies any of
/// these.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("no data for analysis in audit `{audit_id}`")]
    NoData { audit_id: AuditId },
    #[error("{collaborator} collaborator did not respond within {timeout_secs}s")]
    UpstreamTimeout { collaborator: Collaborator, timeout_secs: u64 },
    #[error("ingestion failure: {0}")]
    Ingestion(String),
    #[error("invalid analysis options: {0}")]
    InvalidOptions(String),
    #[error("scoring task failed: {0}")]
    ScoringTask(String),
    #[error("storage read failure: {0}")]
    StorageRead(String),
    #[error(transparent)]
    Lifecycle(#[from] DomainError),
}

impl AnalysisError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamTimeout { .. } | Self::Ingestion(_) | Self::StorageRead(_))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "bad_request",
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::Internal { .. } => "internal",
        }
    }
}

impl AnalysisError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let message = self.to_string();
        match self {
            Self::NoData { .. } | Self::InvalidOptions(_) => {
                InterfaceError::BadRequest { message, correlation_id }
            }
            Self::UpstreamTimeout { .. } | Self::Ingestion(_) | Self::StorageRead(_) => {
                InterfaceError::ServiceUnavailable { message, correlation_id }
            }
            Self::ScoringTask(_) | Self::Lifecycle(_) => {
                InterfaceError::Internal { message, correlation_id }
            }
        }
    }
}
