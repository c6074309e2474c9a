use axum::{
    extract::{Path, State, rejection::PathRejection},
    response::Response,
};

use crate::modules::sample_tasks::use_cases::get_sample_task::transaction::GetSampleTask;
use crate::shared::inbound::request_context::RequestContext;
use crate::shared::inbound::responses::ApiError;
use crate::shell::state::AppState;

pub async fn handle(
    State(state): State<AppState>,
    context: RequestContext,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id.map_err(|rejection| state.rejected(rejection, &context))?;

    let transaction = GetSampleTask {
        correlation_id: context.correlation_id.clone(),
        id,
    };
    state.dispatch(transaction, &context).await
}
