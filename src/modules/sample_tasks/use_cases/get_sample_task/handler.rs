use crate::modules::sample_tasks::core::repository::SampleTaskRepository;
use crate::modules::sample_tasks::core::sample_task::SampleTask;
use crate::modules::sample_tasks::core::value_objects::SampleTaskId;
use crate::modules::sample_tasks::core::views::SampleTaskView;
use crate::modules::sample_tasks::use_cases::get_sample_task::transaction::GetSampleTask;
use crate::shared::application::use_case::UseCaseHandler;
use crate::shared::core::correlation_id::CorrelationId;
use crate::shared::core::envelope::BaseReturn;
use crate::shared::core::errors::{AppError, ErrorDetail};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct GetSampleTaskHandler<TRepository>
where
    TRepository: SampleTaskRepository + 'static,
{
    repository: Arc<TRepository>,
}

impl<TRepository> GetSampleTaskHandler<TRepository>
where
    TRepository: SampleTaskRepository + 'static,
{
    pub fn new(repository: Arc<TRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<TRepository> UseCaseHandler for GetSampleTaskHandler<TRepository>
where
    TRepository: SampleTaskRepository + 'static,
{
    type Transaction = GetSampleTask;
    type Output = SampleTask;

    fn name(&self) -> &'static str {
        "get_sample_task"
    }

    fn validate(&self, transaction: &GetSampleTask) -> Result<(), AppError> {
        SampleTaskId::new(transaction.id)
            .map(|_| ())
            .map_err(|error| AppError::validation(vec![ErrorDetail::from(error)]))
    }

    async fn execute_transaction_processing(
        &self,
        transaction: &GetSampleTask,
        cancel: &CancellationToken,
    ) -> Result<SampleTask, AppError> {
        let id = SampleTaskId::new(transaction.id)?;
        Ok(self.repository.get_by_id(id, cancel).await?)
    }

    fn return_success_response(
        &self,
        task: SampleTask,
        correlation_id: &CorrelationId,
    ) -> BaseReturn<SampleTaskView> {
        BaseReturn::success(SampleTaskView::from(&task), correlation_id)
    }

    fn return_error_response(
        &self,
        error: &AppError,
        correlation_id: &CorrelationId,
    ) -> BaseReturn<SampleTaskView> {
        BaseReturn::failure(error, correlation_id)
    }
}
