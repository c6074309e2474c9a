pub mod adapter;
pub mod in_memory;

use crate::shared::infrastructure::database::DatabaseError;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use thiserror::Error;

pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "_id";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentStoreError {
    #[error("document store unreachable: {0}")]
    Connection(String),

    #[error("document store operation timed out")]
    Timeout,

    #[error("write conflict: {0}")]
    WriteConflict(String),

    #[error("duplicate key {key} in collection {collection}")]
    DuplicateKey { collection: String, key: String },

    #[error("transaction already in progress")]
    TransactionInProgress,

    #[error("no transaction in progress")]
    NoTransaction,

    #[error("session has ended")]
    SessionEnded,

    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

impl From<DocumentStoreError> for DatabaseError {
    fn from(error: DocumentStoreError) -> Self {
        match error {
            DocumentStoreError::Connection(_)
            | DocumentStoreError::Timeout
            | DocumentStoreError::WriteConflict(_) => DatabaseError::Transient(error.to_string()),
            DocumentStoreError::TransactionInProgress => DatabaseError::TransactionAlreadyActive,
            DocumentStoreError::NoTransaction => DatabaseError::NoActiveTransaction,
            _ => DatabaseError::Backend(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Eq(String, Value),
    Range { field: String, min: i64, max: i64 },
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn by_id(id: i64) -> Self {
        Filter::eq(ID_FIELD, id)
    }

    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, value) => document.get(field) == Some(value),
            Filter::Range { field, min, max } => document
                .get(field)
                .and_then(Value::as_i64)
                .is_some_and(|value| (*min..=*max).contains(&value)),
            Filter::And(filters) => filters.iter().all(|filter| filter.matches(document)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SortKey {
    field: String,
    descending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    keys: Vec<SortKey>,
}

impl Sort {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self { keys: Vec::new() }.then(field, false)
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self { keys: Vec::new() }.then(field, true)
    }

    pub fn then_ascending(self, field: impl Into<String>) -> Self {
        self.then(field, false)
    }

    pub fn then_descending(self, field: impl Into<String>) -> Self {
        self.then(field, true)
    }

    fn then(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.keys.push(SortKey {
            field: field.into(),
            descending,
        });
        self
    }

    /// Documents missing a field sort first on that key.
    pub fn compare(&self, left: &Document, right: &Document) -> Ordering {
        self.keys
            .iter()
            .map(|key| {
                let value = |document: &Document| document.get(&key.field).and_then(Value::as_i64);
                let ordering = value(left).cmp(&value(right));
                if key.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

#[async_trait::async_trait]
pub trait DocumentSession: Send {
    async fn ping(&mut self) -> Result<(), DocumentStoreError>;

    fn in_transaction(&self) -> bool;

    async fn start_transaction(&mut self) -> Result<(), DocumentStoreError>;

    async fn commit_transaction(&mut self) -> Result<(), DocumentStoreError>;

    async fn abort_transaction(&mut self) -> Result<(), DocumentStoreError>;

    /// Ends the session, discarding any transaction still open on it.
    async fn end_session(&mut self) -> Result<(), DocumentStoreError>;

    async fn insert_one(
        &mut self,
        collection: &str,
        document: Document,
    ) -> Result<(), DocumentStoreError>;

    async fn find_one(
        &mut self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, DocumentStoreError>;

    async fn find(
        &mut self,
        collection: &str,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> Result<Vec<Document>, DocumentStoreError>;

    async fn replace_one(
        &mut self,
        collection: &str,
        filter: &Filter,
        document: Document,
    ) -> Result<u64, DocumentStoreError>;

    async fn delete_one(&mut self, collection: &str, filter: &Filter)
    -> Result<u64, DocumentStoreError>;

    async fn count(&mut self, collection: &str, filter: &Filter) -> Result<u64, DocumentStoreError>;

    /// Next value of a named counter. Counters are not rolled back with transactions.
    async fn next_sequence(&mut self, name: &str) -> Result<i64, DocumentStoreError>;
}

#[async_trait::async_trait]
pub trait DocumentClient: Send + Sync {
    async fn start_session(&self) -> Result<Box<dyn DocumentSession>, DocumentStoreError>;
}
