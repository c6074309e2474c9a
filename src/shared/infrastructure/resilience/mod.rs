use crate::shared::infrastructure::database::DatabaseError;
use futures::future::BoxFuture;
use std::future::Future;
use std::pin::pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tower::{Layer, Service, ServiceExt};
use tower_resilience_circuitbreaker::{
    CircuitBreaker, CircuitBreakerLayer, CircuitState, DefaultClassifier, SlidingWindowType,
};
use tower_resilience_retry::{ExponentialBackoff, IntervalFunction};

#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub failure_threshold: u32,
    pub break_duration: Duration,
    pub operation_timeout: Duration,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            failure_threshold: 5,
            break_duration: Duration::from_secs(60),
            operation_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Verdict {
    Healthy,
    Failed,
}

#[derive(Debug)]
struct TransientFailure;

struct Admission {
    admitted: oneshot::Sender<()>,
    verdict: oneshot::Receiver<Verdict>,
}

/// Inner service of the breaker. The attempt itself runs in the caller, borrowing whatever it
/// needs; this only reports admission and hands the attempt's verdict back to the breaker.
#[derive(Debug, Clone, Copy)]
struct AttemptGate;

impl Service<Admission> for AttemptGate {
    type Response = ();
    type Error = TransientFailure;
    type Future = BoxFuture<'static, Result<(), TransientFailure>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, admission: Admission) -> Self::Future {
        Box::pin(async move {
            if admission.admitted.send(()).is_err() {
                return Ok(());
            }
            match admission.verdict.await {
                Ok(Verdict::Failed) => Err(TransientFailure),
                _ => Ok(()),
            }
        })
    }
}

/// Retry, per-attempt timeout and circuit breaker shared by every adapter of one backend.
pub struct ResiliencePolicy {
    name: String,
    max_attempts: u32,
    backoff: ExponentialBackoff,
    breaker: CircuitBreaker<AttemptGate, DefaultClassifier>,
    operation_timeout: Duration,
}

impl ResiliencePolicy {
    pub fn new(name: impl Into<String>, config: &ResilienceConfig) -> Self {
        let name = name.into();
        let window = config.failure_threshold.max(1) as usize;
        let breaker = CircuitBreakerLayer::builder()
            .name(name.clone())
            .failure_rate_threshold(1.0)
            .sliding_window_type(SlidingWindowType::CountBased)
            .sliding_window_size(window)
            .minimum_number_of_calls(window)
            .wait_duration_in_open(config.break_duration)
            .permitted_calls_in_half_open(1)
            .build()
            .layer(AttemptGate);

        Self {
            name,
            max_attempts: config.max_attempts.max(1),
            backoff: ExponentialBackoff::new(config.base_delay),
            breaker,
            operation_timeout: config.operation_timeout,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state_sync()
    }

    pub fn circuit_label(&self) -> &'static str {
        match self.circuit_state() {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }

    /// Wait after failed attempt `attempt` (1-based): `base * 2^attempt`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff.next_interval(attempt as usize)
    }

    pub async fn attempt<T, E, Fut>(
        &self,
        cancel: &CancellationToken,
        attempt: Fut,
    ) -> Result<T, DatabaseError>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Into<DatabaseError>,
    {
        let (admitted, on_admission) = oneshot::channel();
        let (report, verdict) = oneshot::channel();
        let mut gate = pin!(self.breaker.clone().oneshot(Admission { admitted, verdict }));

        let admitted = tokio::select! {
            _ = &mut gate => false,
            admission = on_admission => admission.is_ok(),
        };
        if !admitted {
            tracing::warn!(circuit = %self.name, "circuit open, call rejected");
            return Err(DatabaseError::CircuitOpen(self.name.clone()));
        }

        let outcome = self.guard(cancel, attempt).await;
        let verdict = match &outcome {
            Ok(_) => Some(Verdict::Healthy),
            Err(error) if error.is_transient() => Some(Verdict::Failed),
            Err(DatabaseError::Cancelled | DatabaseError::ResourceExhausted(_)) => None,
            // The backend answered; the request itself was at fault.
            Err(_) => Some(Verdict::Healthy),
        };
        // Without a verdict the gate is dropped unrecorded, freeing the half-open slot.
        let Some(verdict) = verdict else {
            return outcome;
        };
        let _ = report.send(verdict);
        let _ = gate.await;
        outcome
    }

    /// Decides what follows a failed attempt: waits out the backoff and returns `Ok` when
    /// another attempt should run, otherwise returns the terminal error.
    pub async fn after_failure(
        &self,
        attempt: u32,
        error: DatabaseError,
        cancel: &CancellationToken,
    ) -> Result<(), DatabaseError> {
        if !error.is_transient() {
            return Err(error);
        }
        if attempt >= self.max_attempts {
            tracing::error!(attempts = attempt, error = %error, "retries exhausted");
            return Err(DatabaseError::RetriesExhausted {
                attempts: attempt,
                last_error: error.to_string(),
            });
        }

        let delay = self.backoff_delay(attempt);
        tracing::warn!(
            attempt,
            max_attempts = self.max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "transient failure, retrying"
        );
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DatabaseError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }

    async fn guard<T, E, Fut>(
        &self,
        cancel: &CancellationToken,
        attempt: Fut,
    ) -> Result<T, DatabaseError>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Into<DatabaseError>,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DatabaseError::Cancelled),
            outcome = tokio::time::timeout(self.operation_timeout, attempt) => match outcome {
                Ok(result) => result.map_err(Into::into),
                Err(_) => Err(DatabaseError::Timeout(self.operation_timeout)),
            },
        }
    }
}
