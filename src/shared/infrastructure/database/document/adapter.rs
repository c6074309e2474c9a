use crate::shared::infrastructure::database::document::{
    DocumentClient, DocumentSession, DocumentStoreError,
};
use crate::shared::infrastructure::database::{
    BackendHealth, DatabaseError, HealthReport, TransactionState,
};
use crate::shared::infrastructure::resilience::{ResilienceConfig, ResiliencePolicy};
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

pub type SessionHandle<'s> = &'s mut (dyn DocumentSession + 'static);

#[derive(Clone)]
pub struct DocumentBackend {
    client: Arc<dyn DocumentClient>,
    policy: Arc<ResiliencePolicy>,
}

impl DocumentBackend {
    pub fn new(
        client: Arc<dyn DocumentClient>,
        database: impl Into<String>,
        resilience: &ResilienceConfig,
    ) -> Self {
        let database: String = database.into();
        tracing::info!(%database, "document backend ready");
        Self {
            client,
            policy: Arc::new(ResiliencePolicy::new("document", resilience)),
        }
    }

    pub fn adapter(&self, cancel: &CancellationToken) -> DocumentConnectionAdapter {
        DocumentConnectionAdapter {
            client: self.client.clone(),
            policy: self.policy.clone(),
            session: Mutex::new(None),
            cancel: cancel.clone(),
        }
    }

    pub fn policy(&self) -> &ResiliencePolicy {
        &self.policy
    }
}

#[async_trait::async_trait]
impl BackendHealth for DocumentBackend {
    async fn check(&self) -> HealthReport {
        let result = self.adapter(&CancellationToken::new()).ping().await;
        HealthReport {
            backend: "document",
            healthy: result.is_ok(),
            circuit: self.policy.circuit_label(),
            detail: result.err().map(|error| error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Ambient,
    Detached,
    Transaction,
}

/// Per-unit-of-work access to the document store. Holds at most one session; a transaction,
/// when open, lives on that session and the session is ended when the transaction finishes.
pub struct DocumentConnectionAdapter {
    client: Arc<dyn DocumentClient>,
    policy: Arc<ResiliencePolicy>,
    session: Mutex<Option<Box<dyn DocumentSession>>>,
    cancel: CancellationToken,
}

impl DocumentConnectionAdapter {
    pub async fn get_session(
        &self,
    ) -> Result<MappedMutexGuard<'_, dyn DocumentSession>, DatabaseError> {
        let mut slot = self.session.lock().await;
        if !slot.as_ref().is_some_and(|session| session.in_transaction()) {
            ensure_session(self.client.as_ref(), &mut slot).await?;
        }
        MutexGuard::try_map(slot, |slot| slot.as_deref_mut())
            .map_err(|_| DatabaseError::Backend("session unavailable".to_string()))
    }

    pub async fn execute_with_retry<T, F>(&self, operation: F) -> Result<T, DatabaseError>
    where
        F: for<'s> FnMut(SessionHandle<'s>) -> BoxFuture<'s, Result<T, DocumentStoreError>> + Send,
        T: Send,
    {
        self.run(Scope::Ambient, operation).await
    }

    /// With `use_transaction`, runs inside the caller's open transaction without retrying, or
    /// retries a whole begin, run and commit sequence when the caller has none.
    pub async fn execute_async<T, F>(
        &self,
        operation: F,
        use_transaction: bool,
    ) -> Result<T, DatabaseError>
    where
        F: for<'s> FnMut(SessionHandle<'s>) -> BoxFuture<'s, Result<T, DocumentStoreError>> + Send,
        T: Send,
    {
        if !use_transaction {
            return self.run(Scope::Detached, operation).await;
        }
        if self.transaction_state().await == TransactionState::Active {
            return self.run(Scope::Transaction, operation).await;
        }
        self.run_in_implicit_transaction(operation).await
    }

    pub async fn begin_transaction(&self) -> Result<(), DatabaseError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.open_transaction().await {
                Ok(()) => return Ok(()),
                Err(error) => {
                    self.policy
                        .after_failure(attempt, error, &self.cancel)
                        .await?
                }
            }
        }
    }

    pub async fn commit_transaction(&self) -> Result<(), DatabaseError> {
        let mut session = self.take_transaction_session().await?;
        let outcome = self
            .policy
            .attempt(&self.cancel, session.commit_transaction())
            .await;
        match &outcome {
            Ok(()) => tracing::debug!("document transaction committed"),
            Err(error) => tracing::error!(error = %error, "document transaction commit failed"),
        }
        end_quietly(session).await;
        outcome
    }

    pub async fn abort_transaction(&self) -> Result<(), DatabaseError> {
        let mut session = self.take_transaction_session().await?;
        // Not raced against cancellation: an abort has to reach the backend.
        let outcome = session
            .abort_transaction()
            .await
            .map_err(DatabaseError::from);
        match &outcome {
            Ok(()) => tracing::debug!("document transaction aborted"),
            Err(error) => tracing::error!(error = %error, "document transaction abort failed"),
        }
        end_quietly(session).await;
        outcome
    }

    pub async fn transaction_state(&self) -> TransactionState {
        let slot = self.session.lock().await;
        if slot.as_ref().is_some_and(|session| session.in_transaction()) {
            TransactionState::Active
        } else {
            TransactionState::Idle
        }
    }

    pub async fn ping(&self) -> Result<(), DatabaseError> {
        self.run(Scope::Detached, |session| session.ping()).await
    }

    async fn open_transaction(&self) -> Result<(), DatabaseError> {
        let mut slot = self.session.lock().await;
        if slot.as_ref().is_some_and(|session| session.in_transaction()) {
            return Err(DatabaseError::TransactionAlreadyActive);
        }

        let client = self.client.as_ref();
        let outcome = self
            .policy
            .attempt(&self.cancel, async {
                let session = ensure_session(client, &mut slot).await?;
                session.start_transaction().await.map_err(DatabaseError::from)
            })
            .await;
        if let Err(error) = &outcome {
            if error.is_transient() {
                if let Some(stale) = slot.take() {
                    end_quietly(stale).await;
                }
            }
        }
        outcome?;
        tracing::debug!("document transaction started");
        Ok(())
    }

    async fn take_transaction_session(
        &self,
    ) -> Result<Box<dyn DocumentSession>, DatabaseError> {
        let mut slot = self.session.lock().await;
        if !slot.as_ref().is_some_and(|session| session.in_transaction()) {
            return Err(DatabaseError::NoActiveTransaction);
        }
        slot.take().ok_or(DatabaseError::NoActiveTransaction)
    }

    async fn run_in_implicit_transaction<T, F>(
        &self,
        mut operation: F,
    ) -> Result<T, DatabaseError>
    where
        F: for<'s> FnMut(SessionHandle<'s>) -> BoxFuture<'s, Result<T, DocumentStoreError>> + Send,
        T: Send,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.transaction_unit(&mut operation).await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    self.policy
                        .after_failure(attempt, error, &self.cancel)
                        .await?
                }
            }
        }
    }

    async fn transaction_unit<T, F>(&self, operation: &mut F) -> Result<T, DatabaseError>
    where
        F: for<'s> FnMut(SessionHandle<'s>) -> BoxFuture<'s, Result<T, DocumentStoreError>> + Send,
        T: Send,
    {
        self.open_transaction().await?;
        let outcome = {
            let mut slot = self.session.lock().await;
            self.attempt(&mut slot, Scope::Transaction, operation).await
        };
        match outcome {
            Ok(value) => {
                self.commit_transaction().await?;
                Ok(value)
            }
            Err(error) => {
                if let Err(abort_error) = self.abort_transaction().await {
                    tracing::warn!(error = %abort_error, "failed to abort implicit transaction");
                }
                Err(error)
            }
        }
    }

    async fn run<T, F>(&self, scope: Scope, mut operation: F) -> Result<T, DatabaseError>
    where
        F: for<'s> FnMut(SessionHandle<'s>) -> BoxFuture<'s, Result<T, DocumentStoreError>> + Send,
        T: Send,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let (outcome, in_transaction) = {
                let mut slot = self.session.lock().await;
                let in_transaction = slot.as_ref().is_some_and(|session| session.in_transaction());
                let outcome = self.attempt(&mut slot, scope, &mut operation).await;
                (outcome, in_transaction)
            };

            match outcome {
                Ok(value) => return Ok(value),
                // Writes already applied inside the transaction would run twice.
                Err(error) if in_transaction && scope != Scope::Detached => return Err(error),
                Err(error) => {
                    if error.is_transient() {
                        self.discard_idle_session().await;
                    }
                    self.policy
                        .after_failure(attempt, error, &self.cancel)
                        .await?;
                }
            }
        }
    }

    async fn attempt<T, F>(
        &self,
        slot: &mut Option<Box<dyn DocumentSession>>,
        scope: Scope,
        operation: &mut F,
    ) -> Result<T, DatabaseError>
    where
        F: for<'s> FnMut(SessionHandle<'s>) -> BoxFuture<'s, Result<T, DocumentStoreError>> + Send,
    {
        let client = self.client.as_ref();
        let in_transaction = slot.as_ref().is_some_and(|session| session.in_transaction());
        self.policy
            .attempt(&self.cancel, async move {
                match (scope, in_transaction) {
                    (Scope::Transaction, false) => Err(DatabaseError::NoActiveTransaction),
                    (Scope::Ambient | Scope::Transaction, true) => {
                        let session = slot
                            .as_deref_mut()
                            .ok_or(DatabaseError::NoActiveTransaction)?;
                        operation(session).await.map_err(DatabaseError::from)
                    }
                    (Scope::Detached, true) => {
                        let mut temporary = client.start_session().await?;
                        let outcome = operation(&mut *temporary)
                            .await
                            .map_err(DatabaseError::from);
                        end_quietly(temporary).await;
                        outcome
                    }
                    (Scope::Ambient | Scope::Detached, false) => {
                        let session = ensure_session(client, slot).await?;
                        operation(session).await.map_err(DatabaseError::from)
                    }
                }
            })
            .await
    }

    async fn discard_idle_session(&self) {
        let mut slot = self.session.lock().await;
        if slot.as_ref().is_some_and(|session| !session.in_transaction()) {
            if let Some(session) = slot.take() {
                end_quietly(session).await;
            }
        }
    }
}

async fn ensure_session<'s>(
    client: &dyn DocumentClient,
    slot: &'s mut Option<Box<dyn DocumentSession>>,
) -> Result<SessionHandle<'s>, DatabaseError> {
    let usable = match slot.as_mut() {
        Some(session) => session.ping().await.is_ok(),
        None => false,
    };
    if !usable {
        if let Some(stale) = slot.take() {
            tracing::warn!("replacing unusable document session");
            end_quietly(stale).await;
        }
        *slot = Some(client.start_session().await?);
    }
    slot.as_deref_mut()
        .ok_or_else(|| DatabaseError::Backend("session unavailable".to_string()))
}

async fn end_quietly(mut session: Box<dyn DocumentSession>) {
    if let Err(error) = session.end_session().await {
        tracing::warn!(error = %error, "failed to end document session");
    }
}
