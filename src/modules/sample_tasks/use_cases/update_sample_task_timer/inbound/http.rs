use axum::{Json, extract::State, extract::rejection::JsonRejection, response::Response};
use serde::Deserialize;

use crate::modules::sample_tasks::use_cases::update_sample_task_timer::{
    transaction::UpdateSampleTaskTimer,
};
use crate::shared::inbound::request_context::RequestContext;
use crate::shared::inbound::responses::ApiError;
use crate::shell::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSampleTaskTimerBody {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub timer_in_milliseconds: i64,
}

pub async fn handle(
    State(state): State<AppState>,
    context: RequestContext,
    body: Result<Json<UpdateSampleTaskTimerBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|rejection| state.rejected(rejection, &context))?;

    let transaction = UpdateSampleTaskTimer {
        correlation_id: context.correlation_id.clone(),
        id: body.id,
        timer_in_milliseconds: body.timer_in_milliseconds,
    };
    state.dispatch(transaction, &context).await
}
