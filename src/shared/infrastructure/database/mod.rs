pub mod document;
pub mod sql;

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatabaseError {
    #[error("a transaction is already active on this adapter")]
    TransactionAlreadyActive,

    #[error("no active transaction on this adapter")]
    NoActiveTransaction,

    #[error("circuit '{0}' is open, calls are rejected until the break duration elapses")]
    CircuitOpen(String),

    #[error("operation failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("operation was cancelled")]
    Cancelled,

    #[error("transient backend failure: {0}")]
    Transient(String),

    #[error("connection resources exhausted: {0}")]
    ResourceExhausted(String),

    #[error("backend failure: {0}")]
    Backend(String),
}

impl DatabaseError {
    pub fn is_transient(&self) -> bool {
        matches!(self, DatabaseError::Transient(_) | DatabaseError::Timeout(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Idle,
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub backend: &'static str,
    pub healthy: bool,
    pub circuit: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Reachability check for whichever backend the service was built with.
#[async_trait::async_trait]
pub trait BackendHealth: Send + Sync {
    async fn check(&self) -> HealthReport;
}
