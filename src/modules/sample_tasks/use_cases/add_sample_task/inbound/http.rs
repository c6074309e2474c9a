use axum::{Json, extract::State, extract::rejection::JsonRejection, response::Response};
use serde::Deserialize;

use crate::modules::sample_tasks::use_cases::add_sample_task::transaction::AddSampleTask;
use crate::shared::inbound::request_context::RequestContext;
use crate::shared::inbound::responses::ApiError;
use crate::shell::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSampleTaskBody {
    #[serde(default, alias = "taskName")]
    pub name: String,
    #[serde(default)]
    pub timer_in_milliseconds: i64,
}

pub async fn handle(
    State(state): State<AppState>,
    context: RequestContext,
    body: Result<Json<AddSampleTaskBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|rejection| state.rejected(rejection, &context))?;

    let transaction = AddSampleTask {
        correlation_id: context.correlation_id.clone(),
        name: body.name,
        timer_in_milliseconds: body.timer_in_milliseconds,
    };
    state.dispatch(transaction, &context).await
}
