use crate::modules::sample_tasks::core::repository::SampleTaskRepository;
use crate::modules::sample_tasks::core::sample_task::{NewSampleTask, SampleTask};
use crate::modules::sample_tasks::core::value_objects::{TaskName, TimerInMilliseconds};
use crate::modules::sample_tasks::core::views::SampleTaskView;
use crate::modules::sample_tasks::use_cases::add_sample_task::transaction::AddSampleTask;
use crate::modules::sample_tasks::use_cases::add_sample_task::validator::AddSampleTaskValidator;
use crate::shared::application::use_case::UseCaseHandler;
use crate::shared::application::validation::Validator;
use crate::shared::core::correlation_id::CorrelationId;
use crate::shared::core::envelope::BaseReturn;
use crate::shared::core::errors::AppError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const TASK_CREATED_MESSAGE: &str = "Task created successfully";

pub struct AddSampleTaskHandler<TRepository>
where
    TRepository: SampleTaskRepository + 'static,
{
    repository: Arc<TRepository>,
}

impl<TRepository> AddSampleTaskHandler<TRepository>
where
    TRepository: SampleTaskRepository + 'static,
{
    pub fn new(repository: Arc<TRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<TRepository> UseCaseHandler for AddSampleTaskHandler<TRepository>
where
    TRepository: SampleTaskRepository + 'static,
{
    type Transaction = AddSampleTask;
    type Output = SampleTask;

    fn name(&self) -> &'static str {
        "add_sample_task"
    }

    fn validate(&self, transaction: &AddSampleTask) -> Result<(), AppError> {
        AddSampleTaskValidator.check(transaction)
    }

    async fn execute_transaction_processing(
        &self,
        transaction: &AddSampleTask,
        cancel: &CancellationToken,
    ) -> Result<SampleTask, AppError> {
        let task = NewSampleTask::create(
            TaskName::new(&transaction.name)?,
            TimerInMilliseconds::new(transaction.timer_in_milliseconds)?,
        )?;
        let task = self.repository.add(task, cancel).await?;
        tracing::info!(id = %task.id(), "sample task created");
        Ok(task)
    }

    fn return_success_response(
        &self,
        task: SampleTask,
        correlation_id: &CorrelationId,
    ) -> BaseReturn<SampleTaskView> {
        BaseReturn::success_with_message(
            SampleTaskView::from(&task),
            TASK_CREATED_MESSAGE,
            correlation_id,
        )
    }

    fn return_error_response(
        &self,
        error: &AppError,
        correlation_id: &CorrelationId,
    ) -> BaseReturn<SampleTaskView> {
        BaseReturn::failure(error, correlation_id)
    }
}
