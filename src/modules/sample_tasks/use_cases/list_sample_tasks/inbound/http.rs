use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::Response,
};
use serde::Deserialize;

use crate::modules::sample_tasks::core::value_objects::TIMER_MAX_MS;
use crate::modules::sample_tasks::use_cases::list_sample_tasks::transaction::{
    ListSampleTasks, SampleTaskFilter,
};
use crate::shared::core::errors::{AppError, ErrorDetail};
use crate::shared::inbound::request_context::RequestContext;
use crate::shared::inbound::responses::ApiError;
use crate::shell::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSampleTasksQuery {
    #[serde(default)]
    pub active_only: bool,
    pub min_timer: Option<i64>,
    pub max_timer: Option<i64>,
}

impl ListSampleTasksQuery {
    pub fn filter(&self) -> Result<SampleTaskFilter, AppError> {
        match (self.active_only, self.min_timer, self.max_timer) {
            (false, None, None) => Ok(SampleTaskFilter::All),
            (true, None, None) => Ok(SampleTaskFilter::ActiveOnly),
            (false, min, max) => Ok(SampleTaskFilter::TimerRange {
                min: min.unwrap_or(0),
                max: max.unwrap_or(TIMER_MAX_MS),
            }),
            (true, _, _) => Err(AppError::validation(vec![ErrorDetail::for_property(
                "activeOnly",
                "activeOnly cannot be combined with a timer range",
            )])),
        }
    }
}

pub async fn handle(
    State(state): State<AppState>,
    context: RequestContext,
    query: Result<Query<ListSampleTasksQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|rejection| state.rejected(rejection, &context))?;
    let filter = query
        .filter()
        .map_err(|error| state.reject(error, &context))?;

    let transaction = ListSampleTasks {
        correlation_id: context.correlation_id.clone(),
        filter,
    };
    state.dispatch(transaction, &context).await
}
