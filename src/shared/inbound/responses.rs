use crate::shared::core::correlation_id::CorrelationId;
use crate::shared::core::envelope::BaseReturn;
use crate::shared::core::errors::{AppError, ErrorDetail, ErrorType};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

pub fn status_for(error_type: ErrorType) -> StatusCode {
    match error_type {
        ErrorType::Validation | ErrorType::Business => StatusCode::BAD_REQUEST,
        ErrorType::NotFound => StatusCode::NOT_FOUND,
        ErrorType::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    success: bool,
    error: ErrorPayload,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorPayload {
    code: &'static str,
    message: String,
    #[serde(rename = "type")]
    error_type: ErrorType,
    correlation_id: CorrelationId,
    timestamp: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<ErrorDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    correlation_id: CorrelationId,
    diagnostics: bool,
}

impl ApiError {
    pub fn new(error: AppError, correlation_id: CorrelationId, diagnostics: bool) -> Self {
        Self {
            error,
            correlation_id,
            diagnostics,
        }
    }

    pub fn rejected(
        rejection: impl std::fmt::Display,
        correlation_id: CorrelationId,
        diagnostics: bool,
    ) -> Self {
        Self::new(
            AppError::validation(vec![ErrorDetail::general(rejection.to_string())]),
            correlation_id,
            diagnostics,
        )
    }

    pub fn status(&self) -> StatusCode {
        status_for(self.error.error_type())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_type = self.error.error_type();
        let (details, trace) = match &self.error {
            AppError::Internal { cause, .. } => {
                (Vec::new(), cause.clone().filter(|_| self.diagnostics))
            }
            other => (other.details(), None),
        };
        let body = ErrorBody {
            success: false,
            error: ErrorPayload {
                code: error_type.code(),
                message: self.error.to_string(),
                error_type,
                correlation_id: self.correlation_id,
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                details,
                trace,
            },
        };
        (status, Json(body)).into_response()
    }
}

pub fn respond<T: Serialize>(envelope: BaseReturn<T>, diagnostics: bool) -> Response {
    if envelope.is_success() {
        return (StatusCode::OK, Json(envelope)).into_response();
    }
    let correlation_id = envelope.correlation_id().clone();
    let error = match envelope.into_result() {
        Err(error) => error,
        Ok(_) => AppError::internal("failed envelope carried data"),
    };
    ApiError::new(error, correlation_id, diagnostics).into_response()
}

#[cfg(test)]
mod responses_tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;
    use serde_json::Value;

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn correlation_id() -> CorrelationId {
        CorrelationId::parse("corr-7").unwrap()
    }

    fn name_required() -> AppError {
        AppError::validation(vec![ErrorDetail::for_property("name", "Name is required")])
    }

    #[rstest]
    #[case(name_required(), StatusCode::BAD_REQUEST)]
    #[case(AppError::Business("rule".into()), StatusCode::BAD_REQUEST)]
    #[case(AppError::NotFound("gone".into()), StatusCode::NOT_FOUND)]
    #[case(AppError::internal("db down"), StatusCode::INTERNAL_SERVER_ERROR)]
    fn it_should_map_error_types_to_statuses(#[case] error: AppError, #[case] status: StatusCode) {
        assert_eq!(ApiError::new(error, correlation_id(), false).status(), status);
    }

    #[tokio::test]
    async fn it_should_render_the_error_body() {
        let response = ApiError::new(name_required(), correlation_id(), false).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["type"], "Validation");
        assert_eq!(body["error"]["message"], "Name is required");
        assert_eq!(body["error"]["correlationId"], "corr-7");
        assert_eq!(body["error"]["details"][0]["propertyName"], "name");
        assert!(body["error"]["timestamp"].is_string());
        assert!(body["error"].get("trace").is_none());
    }

    #[rstest]
    #[case(false, None)]
    #[case(true, Some("db down"))]
    #[tokio::test]
    async fn it_should_only_expose_internal_causes_with_diagnostics(
        #[case] diagnostics: bool,
        #[case] trace: Option<&str>,
    ) {
        let error = AppError::internal("db down");
        let response = ApiError::new(error, correlation_id(), diagnostics).into_response();

        let body = json_body(response).await;
        assert_eq!(body["error"].get("trace").and_then(Value::as_str), trace);
        assert!(body["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn it_should_answer_200_with_the_envelope_on_success() {
        let response = respond(BaseReturn::success(5, &correlation_id()), false);

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], 5);
        assert_eq!(body["errorCode"], 0);
    }

    #[tokio::test]
    async fn it_should_turn_a_failed_envelope_into_the_error_body() {
        let envelope: BaseReturn<i32> =
            BaseReturn::failure(&AppError::NotFound("missing".into()), &correlation_id());
        let response = respond(envelope, false);

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["error"]["message"], "missing");
    }
}
