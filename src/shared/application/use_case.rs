use crate::shared::core::correlation_id::CorrelationId;
use crate::shared::core::errors::{AppError, ErrorType};
use crate::shared::core::transaction::Transaction;
use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

pub type ResponseOf<H> = <<H as UseCaseHandler>::Transaction as Transaction>::Response;

#[async_trait]
pub trait UseCaseHandler: Send + Sync + 'static {
    type Transaction: Transaction;
    type Output: Send;

    fn name(&self) -> &'static str;

    fn validate(&self, _transaction: &Self::Transaction) -> Result<(), AppError> {
        Ok(())
    }

    async fn execute_transaction_processing(
        &self,
        transaction: &Self::Transaction,
        cancel: &CancellationToken,
    ) -> Result<Self::Output, AppError>;

    async fn process_success_events(
        &self,
        _transaction: &Self::Transaction,
        _output: &Self::Output,
    ) -> Result<(), AppError> {
        Ok(())
    }

    fn return_success_response(
        &self,
        output: Self::Output,
        correlation_id: &CorrelationId,
    ) -> ResponseOf<Self>;

    fn return_error_response(
        &self,
        error: &AppError,
        correlation_id: &CorrelationId,
    ) -> ResponseOf<Self>;
}

#[async_trait]
pub trait RequestHandler<R: Transaction>: Send + Sync {
    async fn handle(&self, request: R, cancel: &CancellationToken) -> R::Response;
}

#[async_trait]
impl<H: UseCaseHandler> RequestHandler<H::Transaction> for H {
    async fn handle(&self, request: H::Transaction, cancel: &CancellationToken) -> ResponseOf<H> {
        let span = tracing::info_span!(
            "use_case",
            handler = self.name(),
            correlation_id = %request.correlation_id(),
            transaction_code = request.code().value(),
        );
        run_pipeline(self, request, cancel).instrument(span).await
    }
}

async fn run_pipeline<H: UseCaseHandler>(
    handler: &H,
    transaction: H::Transaction,
    cancel: &CancellationToken,
) -> ResponseOf<H> {
    let started = Instant::now();
    let correlation_id = transaction.correlation_id().clone();
    tracing::debug!("use case started");

    let outcome = match handler.validate(&transaction) {
        Ok(()) => AssertUnwindSafe(handler.execute_transaction_processing(&transaction, cancel))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(AppError::internal(panic_message(panic.as_ref())))),
        Err(error) => Err(error),
    };

    let (response, outcome_label) = match outcome {
        Ok(output) => {
            let post_processing =
                AssertUnwindSafe(handler.process_success_events(&transaction, &output))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        Err(AppError::internal(panic_message(panic.as_ref())))
                    });
            if let Err(error) = post_processing {
                tracing::warn!(
                    error = %error,
                    details = ?error.details(),
                    "post-processing failed"
                );
            }
            (
                handler.return_success_response(output, &correlation_id),
                "success",
            )
        }
        Err(error) => {
            log_failure(&error);
            (
                handler.return_error_response(&error, &correlation_id),
                error.error_type().code(),
            )
        }
    };

    let elapsed = started.elapsed();
    metrics::counter!(
        "use_case_requests_total",
        "handler" => handler.name(),
        "outcome" => outcome_label
    )
    .increment(1);
    metrics::histogram!(
        "use_case_duration_seconds",
        "handler" => handler.name(),
        "outcome" => outcome_label
    )
    .record(elapsed.as_secs_f64());
    tracing::info!(
        outcome = outcome_label,
        elapsed_ms = elapsed.as_millis() as u64,
        "use case finished"
    );
    response
}

fn log_failure(error: &AppError) {
    match error.error_type() {
        ErrorType::Validation | ErrorType::Business | ErrorType::NotFound => {
            tracing::info!(error = %error, kind = error.error_type().code(), "use case rejected");
        }
        ErrorType::Internal => {
            tracing::error!(error = %error, details = ?error.details(), "use case failed");
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("panic: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("panic: {message}")
    } else {
        "panic with a non-string payload".to_string()
    }
}

#[cfg(test)]
pub mod use_case_test_support {
    use super::*;
    use crate::shared::core::envelope::BaseReturn;
    use crate::shared::core::errors::ErrorDetail;
    use crate::shared::core::transaction::TransactionCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    pub struct Double {
        pub correlation_id: CorrelationId,
        pub value: i64,
    }

    impl Transaction for Double {
        type Response = BaseReturn<i64>;
        const CODE: TransactionCode = TransactionCode::GetSampleTask;

        fn correlation_id(&self) -> &CorrelationId {
            &self.correlation_id
        }
    }

    #[derive(Default)]
    pub struct DoubleHandler {
        pub executions: AtomicU32,
        pub post_processed: AtomicU32,
        pub fail_post_processing: bool,
    }

    #[async_trait]
    impl UseCaseHandler for DoubleHandler {
        type Transaction = Double;
        type Output = i64;

        fn name(&self) -> &'static str {
            "double"
        }

        fn validate(&self, transaction: &Double) -> Result<(), AppError> {
            if transaction.value < 0 {
                return Err(AppError::validation(vec![ErrorDetail::for_property(
                    "value",
                    "must not be negative",
                )]));
            }
            Ok(())
        }

        async fn execute_transaction_processing(
            &self,
            transaction: &Double,
            _cancel: &CancellationToken,
        ) -> Result<i64, AppError> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            match transaction.value {
                13 => Err(AppError::Business("thirteen is unlucky".into())),
                99 => panic!("ninety-nine"),
                value => Ok(value * 2),
            }
        }

        async fn process_success_events(
            &self,
            _transaction: &Double,
            _output: &i64,
        ) -> Result<(), AppError> {
            self.post_processed.fetch_add(1, Ordering::SeqCst);
            if self.fail_post_processing {
                return Err(AppError::internal("event bus down"));
            }
            Ok(())
        }

        fn return_success_response(
            &self,
            output: i64,
            correlation_id: &CorrelationId,
        ) -> BaseReturn<i64> {
            BaseReturn::success(output, correlation_id)
        }

        fn return_error_response(
            &self,
            error: &AppError,
            correlation_id: &CorrelationId,
        ) -> BaseReturn<i64> {
            BaseReturn::failure(error, correlation_id)
        }
    }

    pub fn double(value: i64) -> Double {
        Double {
            correlation_id: CorrelationId::parse("corr-1").unwrap(),
            value,
        }
    }
}

#[cfg(test)]
mod use_case_pipeline_tests {
    use super::use_case_test_support::{DoubleHandler, double};
    use super::*;
    use crate::shared::core::errors::ErrorType;
    use rstest::{fixture, rstest};
    use std::sync::atomic::Ordering;

    #[fixture]
    fn handler() -> DoubleHandler {
        DoubleHandler::default()
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_run_every_stage_on_success(handler: DoubleHandler) {
        let response = handler.handle(double(21), &CancellationToken::new()).await;

        assert!(response.is_success());
        assert_eq!(response.data(), Some(&42));
        assert_eq!(response.correlation_id().as_str(), "corr-1");
        assert_eq!(handler.executions.load(Ordering::SeqCst), 1);
        assert_eq!(handler.post_processed.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_skip_execution_when_validation_fails(handler: DoubleHandler) {
        let response = handler.handle(double(-1), &CancellationToken::new()).await;

        assert!(!response.is_success());
        assert_eq!(response.error_type(), Some(ErrorType::Validation));
        assert_eq!(response.error_code(), 400);
        assert_eq!(handler.executions.load(Ordering::SeqCst), 0);
        assert_eq!(handler.post_processed.load(Ordering::SeqCst), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_map_business_failures_without_post_processing(handler: DoubleHandler) {
        let response = handler.handle(double(13), &CancellationToken::new()).await;

        assert_eq!(response.error_type(), Some(ErrorType::Business));
        assert_eq!(response.message(), "thirteen is unlucky");
        assert_eq!(handler.post_processed.load(Ordering::SeqCst), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_turn_a_panic_into_an_internal_error(handler: DoubleHandler) {
        let response = handler.handle(double(99), &CancellationToken::new()).await;

        assert_eq!(response.error_type(), Some(ErrorType::Internal));
        assert_eq!(response.error_code(), 500);
    }

    #[tokio::test]
    async fn it_should_ignore_post_processing_failures() {
        let handler = DoubleHandler {
            fail_post_processing: true,
            ..DoubleHandler::default()
        };

        let response = handler.handle(double(5), &CancellationToken::new()).await;

        assert!(response.is_success());
        assert_eq!(response.data(), Some(&10));
        assert_eq!(handler.post_processed.load(Ordering::SeqCst), 1);
    }
}
