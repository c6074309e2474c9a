use crate::modules::sample_tasks::core::repository::{RepositoryError, SampleTaskRepository};
use crate::modules::sample_tasks::use_cases::add_sample_task::handler::AddSampleTaskHandler;
use crate::modules::sample_tasks::use_cases::add_sample_task::transaction::AddSampleTask;
use crate::modules::sample_tasks::use_cases::get_sample_task::handler::GetSampleTaskHandler;
use crate::modules::sample_tasks::use_cases::get_sample_task::transaction::GetSampleTask;
use crate::modules::sample_tasks::use_cases::list_sample_tasks::handler::ListSampleTasksHandler;
use crate::modules::sample_tasks::use_cases::list_sample_tasks::transaction::ListSampleTasks;
use crate::modules::sample_tasks::use_cases::update_sample_task_timer::{
    handler::UpdateSampleTaskTimerHandler, transaction::UpdateSampleTaskTimer,
};
use crate::shared::application::mediator::{Mediator, MediatorError};
use crate::shared::core::envelope::BaseReturn;
use crate::shared::core::errors::AppError;
use crate::shared::core::transaction::Transaction;
use crate::shared::inbound::request_context::RequestContext;
use crate::shared::inbound::responses::{ApiError, respond};
use crate::shared::infrastructure::database::{BackendHealth, DatabaseError};
use crate::shell::config::Settings;
use axum::response::Response;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone)]
pub struct AppState {
    pub mediator: Arc<Mediator>,
    pub health: Arc<dyn BackendHealth>,
    pub diagnostics: bool,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database unavailable: {0}")]
    Database(#[from] DatabaseError),

    #[error("schema setup failed: {0}")]
    Repository(#[from] RepositoryError),

    #[error("handler wiring failed: {0}")]
    Wiring(#[from] MediatorError),
}

pub fn build_mediator<TRepository>(
    repository: Arc<TRepository>,
) -> Result<Mediator, MediatorError>
where
    TRepository: SampleTaskRepository + 'static,
{
    let add = Arc::new(AddSampleTaskHandler::new(repository.clone()));
    let get = Arc::new(GetSampleTaskHandler::new(repository.clone()));
    let list = Arc::new(ListSampleTasksHandler::new(repository.clone()));
    let update_timer = Arc::new(UpdateSampleTaskTimerHandler::new(repository));

    Ok(Mediator::builder()
        .register::<AddSampleTask, _>(add)?
        .register::<GetSampleTask, _>(get)?
        .register::<ListSampleTasks, _>(list)?
        .register::<UpdateSampleTaskTimer, _>(update_timer)?
        .build())
}

impl AppState {
    pub fn new<TRepository>(
        repository: Arc<TRepository>,
        health: Arc<dyn BackendHealth>,
        diagnostics: bool,
    ) -> Result<Self, MediatorError>
    where
        TRepository: SampleTaskRepository + 'static,
    {
        Ok(Self {
            mediator: Arc::new(build_mediator(repository)?),
            health,
            diagnostics,
        })
    }

    pub async fn dispatch<R, T>(
        &self,
        request: R,
        context: &RequestContext,
    ) -> Result<Response, ApiError>
    where
        R: Transaction<Response = BaseReturn<T>>,
        T: Serialize,
    {
        let envelope = self
            .mediator
            .send(request, &context.cancel)
            .await
            .map_err(|error| {
                tracing::error!(error = %error, "request could not be dispatched");
                self.reject(AppError::internal(error), context)
            })?;
        Ok(respond(envelope, self.diagnostics))
    }

    pub fn reject(&self, error: AppError, context: &RequestContext) -> ApiError {
        ApiError::new(error, context.correlation_id.clone(), self.diagnostics)
    }

    pub fn rejected(
        &self,
        rejection: impl std::fmt::Display,
        context: &RequestContext,
    ) -> ApiError {
        ApiError::rejected(rejection, context.correlation_id.clone(), self.diagnostics)
    }

    #[cfg(not(feature = "document-store"))]
    pub async fn from_settings(settings: &Settings) -> Result<Self, StartupError> {
        use crate::modules::sample_tasks::adapters::outbound::sql_repository::{
            SqlSampleTaskRepository,
        };
        use crate::shared::infrastructure::database::sql::SqlBackend;

        let backend =
            SqlBackend::connect(&settings.pool_settings(), &settings.resilience_config()).await?;
        let repository = Arc::new(SqlSampleTaskRepository::new(backend.clone()));
        repository.ensure_schema().await?;
        tracing::info!(backend = "sql", "sample task repository ready");
        Ok(Self::new(
            repository,
            Arc::new(backend),
            settings.environment.include_diagnostics(),
        )?)
    }

    #[cfg(feature = "document-store")]
    pub async fn from_settings(settings: &Settings) -> Result<Self, StartupError> {
        use crate::modules::sample_tasks::adapters::outbound::document_repository::{
            DocumentSampleTaskRepository,
        };
        use crate::shared::infrastructure::database::document::adapter::DocumentBackend;
        use crate::shared::infrastructure::database::document::in_memory::InMemoryDocumentClient;

        let backend = DocumentBackend::new(
            Arc::new(InMemoryDocumentClient::new()),
            settings.database.database_name.clone(),
            &settings.resilience_config(),
        );
        let repository = Arc::new(DocumentSampleTaskRepository::new(backend.clone()));
        tracing::info!(backend = "document", "sample task repository ready");
        Ok(Self::new(
            repository,
            Arc::new(backend),
            settings.environment.include_diagnostics(),
        )?)
    }
}
