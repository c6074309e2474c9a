use crate::shared::infrastructure::database::document::{
    Document, DocumentClient, DocumentSession, DocumentStoreError, Filter, ID_FIELD, Sort,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

type Collections = HashMap<String, Vec<Document>>;

#[derive(Default)]
struct StoreState {
    collections: Collections,
    sequences: HashMap<String, i64>,
}

#[derive(Default)]
struct Faults {
    offline: AtomicBool,
    fail_next: AtomicU32,
    delay_ms: AtomicU64,
}

#[derive(Clone, Default)]
pub struct InMemoryDocumentClient {
    state: Arc<RwLock<StoreState>>,
    faults: Arc<Faults>,
}

impl InMemoryDocumentClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_offline(&self) {
        self.faults.offline.fetch_xor(true, Ordering::SeqCst);
    }

    pub fn fail_next(&self, operations: u32) {
        self.faults.fail_next.store(operations, Ordering::SeqCst);
    }

    pub fn set_delay_ms(&self, delay_ms: u64) {
        self.faults.delay_ms.store(delay_ms, Ordering::SeqCst);
    }

    async fn check_faults(&self) -> Result<(), DocumentStoreError> {
        let delay_ms = self.faults.delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        if self.faults.offline.load(Ordering::SeqCst) {
            return Err(DocumentStoreError::Connection(
                "document store offline".to_string(),
            ));
        }
        let injected = self
            .faults
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if injected {
            return Err(DocumentStoreError::Connection(
                "injected connection failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DocumentClient for InMemoryDocumentClient {
    async fn start_session(&self) -> Result<Box<dyn DocumentSession>, DocumentStoreError> {
        self.check_faults().await?;
        Ok(Box::new(InMemoryDocumentSession {
            client: self.clone(),
            transaction: None,
            ended: false,
        }))
    }
}

enum Write {
    Insert {
        collection: String,
        document: Document,
    },
    Replace {
        collection: String,
        filter: Filter,
        document: Document,
    },
    Delete {
        collection: String,
        filter: Filter,
    },
}

impl Write {
    fn apply(&self, collections: &mut Collections) -> Result<u64, DocumentStoreError> {
        match self {
            Write::Insert {
                collection,
                document,
            } => insert(collections, collection, document.clone()).map(|_| 1),
            Write::Replace {
                collection,
                filter,
                document,
            } => Ok(replace(collections, collection, filter, document.clone())),
            Write::Delete { collection, filter } => Ok(delete(collections, collection, filter)),
        }
    }
}

struct PendingTransaction {
    snapshot: Collections,
    writes: Vec<Write>,
}

pub struct InMemoryDocumentSession {
    client: InMemoryDocumentClient,
    transaction: Option<PendingTransaction>,
    ended: bool,
}

impl InMemoryDocumentSession {
    async fn ready(&self) -> Result<(), DocumentStoreError> {
        if self.ended {
            return Err(DocumentStoreError::SessionEnded);
        }
        self.client.check_faults().await
    }

    async fn write(&mut self, write: Write) -> Result<u64, DocumentStoreError> {
        self.ready().await?;
        match self.transaction.as_mut() {
            Some(transaction) => {
                let affected = write.apply(&mut transaction.snapshot)?;
                transaction.writes.push(write);
                Ok(affected)
            }
            None => write.apply(&mut self.client.state.write().await.collections),
        }
    }

    async fn read<R>(
        &self,
        query: impl FnOnce(&Collections) -> R,
    ) -> Result<R, DocumentStoreError> {
        self.ready().await?;
        match self.transaction.as_ref() {
            Some(transaction) => Ok(query(&transaction.snapshot)),
            None => Ok(query(&self.client.state.read().await.collections)),
        }
    }
}

#[async_trait::async_trait]
impl DocumentSession for InMemoryDocumentSession {
    async fn ping(&mut self) -> Result<(), DocumentStoreError> {
        self.ready().await
    }

    fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    async fn start_transaction(&mut self) -> Result<(), DocumentStoreError> {
        self.ready().await?;
        if self.transaction.is_some() {
            return Err(DocumentStoreError::TransactionInProgress);
        }
        let snapshot = self.client.state.read().await.collections.clone();
        self.transaction = Some(PendingTransaction {
            snapshot,
            writes: Vec::new(),
        });
        Ok(())
    }

    async fn commit_transaction(&mut self) -> Result<(), DocumentStoreError> {
        let transaction = self
            .transaction
            .take()
            .ok_or(DocumentStoreError::NoTransaction)?;
        self.ready().await?;

        let mut state = self.client.state.write().await;
        let mut merged = state.collections.clone();
        for write in &transaction.writes {
            write.apply(&mut merged).map_err(|error| match error {
                DocumentStoreError::DuplicateKey { key, .. } => {
                    DocumentStoreError::WriteConflict(format!("key {key} written concurrently"))
                }
                other => other,
            })?;
        }
        state.collections = merged;
        Ok(())
    }

    async fn abort_transaction(&mut self) -> Result<(), DocumentStoreError> {
        self.transaction
            .take()
            .map(|_| ())
            .ok_or(DocumentStoreError::NoTransaction)
    }

    async fn end_session(&mut self) -> Result<(), DocumentStoreError> {
        self.transaction = None;
        self.ended = true;
        Ok(())
    }

    async fn insert_one(
        &mut self,
        collection: &str,
        document: Document,
    ) -> Result<(), DocumentStoreError> {
        self.write(Write::Insert {
            collection: collection.to_string(),
            document,
        })
        .await
        .map(|_| ())
    }

    async fn find_one(
        &mut self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, DocumentStoreError> {
        self.read(|collections| {
            documents(collections, collection)
                .iter()
                .find(|document| filter.matches(document))
                .cloned()
        })
        .await
    }

    async fn find(
        &mut self,
        collection: &str,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> Result<Vec<Document>, DocumentStoreError> {
        let mut found = self
            .read(|collections| {
                documents(collections, collection)
                    .iter()
                    .filter(|document| filter.matches(document))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await?;
        if let Some(sort) = sort {
            found.sort_by(|left, right| sort.compare(left, right));
        }
        Ok(found)
    }

    async fn replace_one(
        &mut self,
        collection: &str,
        filter: &Filter,
        document: Document,
    ) -> Result<u64, DocumentStoreError> {
        self.write(Write::Replace {
            collection: collection.to_string(),
            filter: filter.clone(),
            document,
        })
        .await
    }

    async fn delete_one(
        &mut self,
        collection: &str,
        filter: &Filter,
    ) -> Result<u64, DocumentStoreError> {
        self.write(Write::Delete {
            collection: collection.to_string(),
            filter: filter.clone(),
        })
        .await
    }

    async fn count(
        &mut self,
        collection: &str,
        filter: &Filter,
    ) -> Result<u64, DocumentStoreError> {
        self.read(|collections| {
            documents(collections, collection)
                .iter()
                .filter(|document| filter.matches(document))
                .count() as u64
        })
        .await
    }

    async fn next_sequence(&mut self, name: &str) -> Result<i64, DocumentStoreError> {
        self.ready().await?;
        let mut state = self.client.state.write().await;
        let counter = state.sequences.entry(name.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}

fn documents<'c>(collections: &'c Collections, collection: &str) -> &'c [Document] {
    collections
        .get(collection)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn insert(
    collections: &mut Collections,
    collection: &str,
    document: Document,
) -> Result<(), DocumentStoreError> {
    let id = document
        .get(ID_FIELD)
        .cloned()
        .ok_or_else(|| DocumentStoreError::InvalidDocument(format!("missing {ID_FIELD}")))?;
    let documents = collections.entry(collection.to_string()).or_default();
    if documents
        .iter()
        .any(|existing| existing.get(ID_FIELD) == Some(&id))
    {
        return Err(DocumentStoreError::DuplicateKey {
            collection: collection.to_string(),
            key: id.to_string(),
        });
    }
    documents.push(document);
    Ok(())
}

fn replace(
    collections: &mut Collections,
    collection: &str,
    filter: &Filter,
    document: Document,
) -> u64 {
    let slot = collections
        .get_mut(collection)
        .and_then(|documents| documents.iter_mut().find(|existing| filter.matches(existing)));
    match slot {
        Some(existing) => {
            *existing = document;
            1
        }
        None => 0,
    }
}

fn delete(collections: &mut Collections, collection: &str, filter: &Filter) -> u64 {
    let Some(documents) = collections.get_mut(collection) else {
        return 0;
    };
    match documents.iter().position(|existing| filter.matches(existing)) {
        Some(index) => {
            documents.remove(index);
            1
        }
        None => 0,
    }
}
