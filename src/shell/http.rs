use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::modules::sample_tasks::use_cases::add_sample_task::inbound::http as add_http;
use crate::modules::sample_tasks::use_cases::get_sample_task::inbound::http as get_http;
use crate::modules::sample_tasks::use_cases::list_sample_tasks::inbound::http as list_http;
use crate::modules::sample_tasks::use_cases::update_sample_task_timer::inbound::http as timer_http;
use crate::shared::inbound::request_context::{SlowRequestThresholds, track_request};
use crate::shell::state::AppState;

pub fn router(state: AppState, thresholds: SlowRequestThresholds) -> Router {
    Router::new()
        .route("/task", post(add_http::handle).get(list_http::handle))
        .route("/task/timer", put(timer_http::handle))
        .route("/task/{id}", get(get_http::handle))
        .route("/health", get(health))
        .with_state(state)
        .layer(middleware::from_fn_with_state(thresholds, track_request))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health(State(state): State<AppState>) -> Response {
    let report = state.health.check().await;
    let status = if report.healthy {
        StatusCode::OK
    } else {
        tracing::warn!(backend = report.backend, detail = ?report.detail, "health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report)).into_response()
}

#[cfg(test)]
mod http_router_tests {
    use super::*;
    use crate::shared::core::correlation_id::CORRELATION_ID_HEADER;
    use crate::tests::fixtures::app::{InMemoryStores, app, call, document_state, in_memory_stores};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use rstest::rstest;
    use tower::ServiceExt;

    #[rstest]
    #[tokio::test]
    async fn it_should_report_a_healthy_backend(in_memory_stores: InMemoryStores) {
        let app = app(document_state(&in_memory_stores));

        let response = call(&app, Method::GET, "/health", None).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["healthy"], true);
        assert_eq!(response.body["backend"], "document");
        assert_eq!(response.body["circuit"], "closed");
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_answer_503_when_the_backend_is_down(in_memory_stores: InMemoryStores) {
        in_memory_stores.client.toggle_offline();

        let app = app(document_state(&in_memory_stores));

        let response = call(&app, Method::GET, "/health", None).await;

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.body["healthy"], false);
        assert!(response.body["detail"].is_string());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_echo_the_correlation_id_on_every_route(in_memory_stores: InMemoryStores) {
        let response = app(document_state(&in_memory_stores))
            .oneshot(
                Request::get("/task/999")
                    .header(CORRELATION_ID_HEADER, "trace-me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CORRELATION_ID_HEADER], "trace-me");
    }
}
