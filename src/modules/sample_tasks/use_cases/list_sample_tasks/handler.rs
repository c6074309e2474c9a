use crate::modules::sample_tasks::core::repository::SampleTaskRepository;
use crate::modules::sample_tasks::core::sample_task::SampleTask;
use crate::modules::sample_tasks::core::value_objects::TimerInMilliseconds;
use crate::modules::sample_tasks::core::views::{SampleTaskListView, SampleTaskView};
use crate::modules::sample_tasks::use_cases::list_sample_tasks::transaction::{
    ListSampleTasks, SampleTaskFilter,
};
use crate::shared::application::use_case::UseCaseHandler;
use crate::shared::application::validation::ValidationErrors;
use crate::shared::core::correlation_id::CorrelationId;
use crate::shared::core::envelope::BaseReturn;
use crate::shared::core::errors::AppError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct ListSampleTasksHandler<TRepository>
where
    TRepository: SampleTaskRepository + 'static,
{
    repository: Arc<TRepository>,
}

impl<TRepository> ListSampleTasksHandler<TRepository>
where
    TRepository: SampleTaskRepository + 'static,
{
    pub fn new(repository: Arc<TRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<TRepository> UseCaseHandler for ListSampleTasksHandler<TRepository>
where
    TRepository: SampleTaskRepository + 'static,
{
    type Transaction = ListSampleTasks;
    type Output = Vec<SampleTask>;

    fn name(&self) -> &'static str {
        "list_sample_tasks"
    }

    fn validate(&self, transaction: &ListSampleTasks) -> Result<(), AppError> {
        let SampleTaskFilter::TimerRange { min, max } = transaction.filter else {
            return Ok(());
        };
        let mut errors = ValidationErrors::new();
        errors.collect("minTimer", TimerInMilliseconds::new(min));
        errors.collect("maxTimer", TimerInMilliseconds::new(max));
        if min > max {
            errors.add("minTimer", "Minimum timer must not be greater than maximum timer");
        }
        let details = errors.into_details();
        if details.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(details))
        }
    }

    async fn execute_transaction_processing(
        &self,
        transaction: &ListSampleTasks,
        cancel: &CancellationToken,
    ) -> Result<Vec<SampleTask>, AppError> {
        let tasks = match transaction.filter {
            SampleTaskFilter::All => self.repository.get_all(cancel).await?,
            SampleTaskFilter::ActiveOnly => self.repository.get_active(cancel).await?,
            SampleTaskFilter::TimerRange { min, max } => {
                self.repository
                    .get_by_timer_range(
                        TimerInMilliseconds::new(min)?,
                        TimerInMilliseconds::new(max)?,
                        cancel,
                    )
                    .await?
            }
        };
        Ok(tasks)
    }

    fn return_success_response(
        &self,
        tasks: Vec<SampleTask>,
        correlation_id: &CorrelationId,
    ) -> BaseReturn<SampleTaskListView> {
        let tasks = tasks.iter().map(SampleTaskView::from).collect();
        BaseReturn::success(SampleTaskListView { tasks }, correlation_id)
    }

    fn return_error_response(
        &self,
        error: &AppError,
        correlation_id: &CorrelationId,
    ) -> BaseReturn<SampleTaskListView> {
        BaseReturn::failure(error, correlation_id)
    }
}
