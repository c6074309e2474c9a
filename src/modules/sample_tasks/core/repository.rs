use crate::modules::sample_tasks::core::sample_task::{NewSampleTask, SampleTask};
use crate::modules::sample_tasks::core::value_objects::{SampleTaskId, TimerInMilliseconds};
use crate::shared::core::errors::{AppError, ErrorDetail};
use crate::shared::infrastructure::database::DatabaseError;
use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("sample task {id} was not found")]
    NotFound { id: SampleTaskId },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("corrupt record: {0}")]
    Mapping(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<RepositoryError> for AppError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { id } => {
                AppError::NotFound(format!("Sample task with id {id} was not found"))
            }
            RepositoryError::InvalidArgument(message) => {
                AppError::validation(vec![ErrorDetail::general(message)])
            }
            RepositoryError::Mapping(_) | RepositoryError::Database(_) => {
                AppError::internal(error)
            }
        }
    }
}

/// Persistence port for sample tasks. Every call runs on its own unit of work and stops when
/// `cancel` fires.
#[async_trait]
pub trait SampleTaskRepository: Send + Sync {
    async fn get_by_id(
        &self,
        id: SampleTaskId,
        cancel: &CancellationToken,
    ) -> Result<SampleTask, RepositoryError>;

    /// Newest first.
    async fn get_all(&self, cancel: &CancellationToken)
    -> Result<Vec<SampleTask>, RepositoryError>;

    async fn get_active(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<SampleTask>, RepositoryError>;

    /// Inclusive on both ends, ordered by timer ascending.
    async fn get_by_timer_range(
        &self,
        min: TimerInMilliseconds,
        max: TimerInMilliseconds,
        cancel: &CancellationToken,
    ) -> Result<Vec<SampleTask>, RepositoryError>;

    async fn add(
        &self,
        task: NewSampleTask,
        cancel: &CancellationToken,
    ) -> Result<SampleTask, RepositoryError>;

    async fn update(
        &self,
        task: &SampleTask,
        cancel: &CancellationToken,
    ) -> Result<(), RepositoryError>;

    async fn update_timer(
        &self,
        id: SampleTaskId,
        timer: TimerInMilliseconds,
        cancel: &CancellationToken,
    ) -> Result<(), RepositoryError> {
        let task = self.get_by_id(id, cancel).await?;
        let updated = task
            .with_timer(timer)
            .map_err(|error| RepositoryError::InvalidArgument(error.to_string()))?;
        self.update(&updated, cancel).await
    }

    async fn delete(&self, id: SampleTaskId, cancel: &CancellationToken)
    -> Result<(), RepositoryError>;

    async fn exists(
        &self,
        id: SampleTaskId,
        cancel: &CancellationToken,
    ) -> Result<bool, RepositoryError>;
}

pub fn ensure_range(
    min: TimerInMilliseconds,
    max: TimerInMilliseconds,
) -> Result<(), RepositoryError> {
    if min > max {
        Err(RepositoryError::InvalidArgument(format!(
            "minimum timer {} is greater than maximum timer {}",
            min.value(),
            max.value()
        )))
    } else {
        Ok(())
    }
}
