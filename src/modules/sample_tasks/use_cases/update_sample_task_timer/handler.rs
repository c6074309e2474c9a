use crate::modules::sample_tasks::core::repository::SampleTaskRepository;
use crate::modules::sample_tasks::core::value_objects::{SampleTaskId, TimerInMilliseconds};
use crate::modules::sample_tasks::use_cases::update_sample_task_timer::{
    transaction::UpdateSampleTaskTimer, validator::UpdateSampleTaskTimerValidator,
};
use crate::shared::application::use_case::UseCaseHandler;
use crate::shared::application::validation::Validator;
use crate::shared::core::correlation_id::CorrelationId;
use crate::shared::core::envelope::BaseReturn;
use crate::shared::core::errors::AppError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct UpdateSampleTaskTimerHandler<TRepository>
where
    TRepository: SampleTaskRepository + 'static,
{
    repository: Arc<TRepository>,
}

impl<TRepository> UpdateSampleTaskTimerHandler<TRepository>
where
    TRepository: SampleTaskRepository + 'static,
{
    pub fn new(repository: Arc<TRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<TRepository> UseCaseHandler for UpdateSampleTaskTimerHandler<TRepository>
where
    TRepository: SampleTaskRepository + 'static,
{
    type Transaction = UpdateSampleTaskTimer;
    type Output = ();

    fn name(&self) -> &'static str {
        "update_sample_task_timer"
    }

    fn validate(&self, transaction: &UpdateSampleTaskTimer) -> Result<(), AppError> {
        UpdateSampleTaskTimerValidator.check(transaction)
    }

    async fn execute_transaction_processing(
        &self,
        transaction: &UpdateSampleTaskTimer,
        cancel: &CancellationToken,
    ) -> Result<(), AppError> {
        let id = SampleTaskId::new(transaction.id)?;
        let timer = TimerInMilliseconds::new(transaction.timer_in_milliseconds)?;

        let task = self.repository.get_by_id(id, cancel).await?;
        let updated = task.with_timer(timer)?;
        self.repository.update(&updated, cancel).await?;
        tracing::info!(%id, timer_ms = timer.value(), "sample task timer updated");
        Ok(())
    }

    fn return_success_response(
        &self,
        _output: (),
        correlation_id: &CorrelationId,
    ) -> BaseReturn<bool> {
        BaseReturn::success(true, correlation_id)
    }

    fn return_error_response(
        &self,
        error: &AppError,
        correlation_id: &CorrelationId,
    ) -> BaseReturn<bool> {
        BaseReturn::failure(error, correlation_id)
    }
}
