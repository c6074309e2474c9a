use crate::shared::infrastructure::database::{
    BackendHealth, DatabaseError, HealthReport, TransactionState,
};
use crate::shared::infrastructure::resilience::{ResilienceConfig, ResiliencePolicy};
use futures::future::BoxFuture;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::{Connection, Sqlite, Transaction};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// SQLite extended result codes (busy/locked variants) and SQLSTATE classes for connection loss,
/// serialization failures, deadlocks and server shutdown.
const TRANSIENT_CODES: &[&str] = &[
    "5", "6", "261", "262", "517", "773", "08001", "08006", "40001", "40P01", "57014", "57P01",
    "57P02", "57P03",
];

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::WorkerCrashed => {
                DatabaseError::Transient(error.to_string())
            }
            sqlx::Error::PoolTimedOut => DatabaseError::ResourceExhausted(error.to_string()),
            sqlx::Error::Database(db)
                if db
                    .code()
                    .is_some_and(|code| TRANSIENT_CODES.contains(&code.as_ref())) =>
            {
                DatabaseError::Transient(error.to_string())
            }
            _ => DatabaseError::Backend(error.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqlPoolSettings {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
}

impl SqlPoolSettings {
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            min_connections: 1,
            max_connections: 1,
            connect_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Clone)]
pub struct SqlBackend {
    pool: SqlitePool,
    policy: Arc<ResiliencePolicy>,
}

impl SqlBackend {
    pub async fn connect(
        settings: &SqlPoolSettings,
        resilience: &ResilienceConfig,
    ) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str(&settings.url)?
            .create_if_missing(true)
            .busy_timeout(settings.command_timeout);

        let mut pool_options = SqlitePoolOptions::new()
            .min_connections(settings.min_connections)
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.connect_timeout);
        // Every in-memory connection is its own database, so keep exactly one alive forever.
        if settings.url.contains(":memory:") {
            pool_options = pool_options
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;
        tracing::info!(url = %settings.url, "sql pool ready");
        Ok(Self {
            pool,
            policy: Arc::new(ResiliencePolicy::new("sql", resilience)),
        })
    }

    pub fn adapter(&self, cancel: &CancellationToken) -> SqlConnectionAdapter {
        SqlConnectionAdapter {
            pool: self.pool.clone(),
            policy: self.policy.clone(),
            session: Mutex::new(SqlSession::default()),
            cancel: cancel.clone(),
        }
    }

    pub fn policy(&self) -> &ResiliencePolicy {
        &self.policy
    }
}

#[async_trait::async_trait]
impl BackendHealth for SqlBackend {
    async fn check(&self) -> HealthReport {
        let result = self.adapter(&CancellationToken::new()).ping().await;
        HealthReport {
            backend: "sql",
            healthy: result.is_ok(),
            circuit: self.policy.circuit_label(),
            detail: result.err().map(|error| error.to_string()),
        }
    }
}

#[derive(Default)]
struct SqlSession {
    connection: Option<PoolConnection<Sqlite>>,
    transaction: Option<Transaction<'static, Sqlite>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Ambient,
    Connection,
    Transaction,
}

pub struct SqlConnectionAdapter {
    pool: SqlitePool,
    policy: Arc<ResiliencePolicy>,
    session: Mutex<SqlSession>,
    cancel: CancellationToken,
}

impl SqlConnectionAdapter {
    pub async fn get_connection(
        &self,
    ) -> Result<MappedMutexGuard<'_, SqliteConnection>, DatabaseError> {
        let mut session = self.session.lock().await;
        ensure_connection(&self.pool, &mut session.connection).await?;
        MutexGuard::try_map(session, |session| session.connection.as_deref_mut())
            .map_err(|_| DatabaseError::Backend("connection unavailable".to_string()))
    }

    pub async fn execute_with_retry<T, F>(&self, operation: F) -> Result<T, DatabaseError>
    where
        F: for<'c> FnMut(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, sqlx::Error>> + Send,
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
        F: for<'c> FnMut(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, sqlx::Error>> + Send,
        T: Send,
    {
        if !use_transaction {
            return self.run(Scope::Connection, operation).await;
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
        let transaction = self
            .session
            .lock()
            .await
            .transaction
            .take()
            .ok_or(DatabaseError::NoActiveTransaction)?;

        let outcome = self.policy.attempt(&self.cancel, transaction.commit()).await;
        match &outcome {
            Ok(()) => tracing::debug!("sql transaction committed"),
            Err(error) => tracing::error!(error = %error, "sql transaction commit failed"),
        }
        outcome
    }

    pub async fn abort_transaction(&self) -> Result<(), DatabaseError> {
        let transaction = self
            .session
            .lock()
            .await
            .transaction
            .take()
            .ok_or(DatabaseError::NoActiveTransaction)?;

        // Not raced against cancellation: an abort has to reach the backend.
        transaction.rollback().await.map_err(|error| {
            tracing::error!(error = %error, "sql transaction rollback failed");
            DatabaseError::from(error)
        })?;
        tracing::debug!("sql transaction aborted");
        Ok(())
    }

    pub async fn transaction_state(&self) -> TransactionState {
        if self.session.lock().await.transaction.is_some() {
            TransactionState::Active
        } else {
            TransactionState::Idle
        }
    }

    pub async fn ping(&self) -> Result<(), DatabaseError> {
        self.run(Scope::Connection, |connection| connection.ping()).await
    }

    async fn open_transaction(&self) -> Result<(), DatabaseError> {
        let mut session = self.session.lock().await;
        if session.transaction.is_some() {
            return Err(DatabaseError::TransactionAlreadyActive);
        }
        // Hand the plain connection back so the transaction can take a pooled one.
        session.connection = None;

        let transaction = self.policy.attempt(&self.cancel, self.pool.begin()).await?;
        session.transaction = Some(transaction);
        tracing::debug!("sql transaction started");
        Ok(())
    }

    async fn run_in_implicit_transaction<T, F>(
        &self,
        mut operation: F,
    ) -> Result<T, DatabaseError>
    where
        F: for<'c> FnMut(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, sqlx::Error>> + Send,
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
        F: for<'c> FnMut(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, sqlx::Error>> + Send,
        T: Send,
    {
        self.open_transaction().await?;
        let outcome = {
            let mut session = self.session.lock().await;
            self.attempt(&mut session, Scope::Transaction, operation).await
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
        F: for<'c> FnMut(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, sqlx::Error>> + Send,
        T: Send,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let (outcome, in_transaction) = {
                let mut session = self.session.lock().await;
                let in_transaction = session.transaction.is_some();
                let outcome = self.attempt(&mut session, scope, &mut operation).await;
                (outcome, in_transaction)
            };

            match outcome {
                Ok(value) => return Ok(value),
                // Statements already applied inside the transaction would run twice.
                Err(error) if in_transaction && scope != Scope::Connection => return Err(error),
                Err(error) => {
                    if error.is_transient() {
                        self.discard_connection().await;
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
        session: &mut SqlSession,
        scope: Scope,
        operation: &mut F,
    ) -> Result<T, DatabaseError>
    where
        F: for<'c> FnMut(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, sqlx::Error>> + Send,
    {
        let pool = &self.pool;
        self.policy
            .attempt(&self.cancel, async move {
                let connection: &mut SqliteConnection =
                    match (scope, session.transaction.as_mut()) {
                        (Scope::Ambient | Scope::Transaction, Some(transaction)) => {
                            &mut **transaction
                        }
                        (Scope::Transaction, None) => {
                            return Err(DatabaseError::NoActiveTransaction);
                        }
                        (Scope::Ambient | Scope::Connection, _) => {
                            ensure_connection(pool, &mut session.connection).await?
                        }
                    };
                operation(connection).await.map_err(DatabaseError::from)
            })
            .await
    }

    async fn discard_connection(&self) {
        let stale = self.session.lock().await.connection.take();
        if let Some(connection) = stale {
            close_quietly(connection).await;
        }
    }
}

async fn ensure_connection<'s>(
    pool: &SqlitePool,
    slot: &'s mut Option<PoolConnection<Sqlite>>,
) -> Result<&'s mut SqliteConnection, DatabaseError> {
    let usable = match slot.as_mut() {
        Some(connection) => connection.ping().await.is_ok(),
        None => false,
    };
    if !usable {
        if let Some(stale) = slot.take() {
            tracing::warn!("replacing unusable sql connection");
            close_quietly(stale).await;
        }
        *slot = Some(pool.acquire().await?);
    }
    slot.as_deref_mut()
        .ok_or_else(|| DatabaseError::Backend("connection unavailable".to_string()))
}

async fn close_quietly(connection: PoolConnection<Sqlite>) {
    if let Err(error) = connection.detach().close().await {
        tracing::warn!(error = %error, "failed to close sql connection");
    }
}
