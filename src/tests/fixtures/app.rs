use crate::modules::sample_tasks::adapters::outbound::{
    document_repository::DocumentSampleTaskRepository, sql_repository::SqlSampleTaskRepository,
};
use crate::shared::inbound::request_context::SlowRequestThresholds;
use crate::shared::infrastructure::database::document::adapter::DocumentBackend;
use crate::shared::infrastructure::database::document::in_memory::InMemoryDocumentClient;
use crate::shared::infrastructure::database::sql::{SqlBackend, SqlPoolSettings};
use crate::shared::infrastructure::resilience::resilience_test_support::fast_config;
use crate::shell::http::router;
use crate::shell::state::AppState;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use rstest::fixture;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub struct InMemoryStores {
    pub client: InMemoryDocumentClient,
    pub repository: Arc<DocumentSampleTaskRepository>,
    pub backend: DocumentBackend,
}

#[fixture]
pub fn in_memory_stores() -> InMemoryStores {
    let client = InMemoryDocumentClient::new();
    let backend = DocumentBackend::new(Arc::new(client.clone()), "tests", &fast_config());
    let repository = Arc::new(DocumentSampleTaskRepository::new(backend.clone()));
    InMemoryStores {
        client,
        repository,
        backend,
    }
}

pub fn document_state(stores: &InMemoryStores) -> AppState {
    AppState::new(
        stores.repository.clone(),
        Arc::new(stores.backend.clone()),
        true,
    )
    .unwrap()
}

pub async fn sql_state() -> AppState {
    let backend = SqlBackend::connect(&SqlPoolSettings::in_memory(), &fast_config())
        .await
        .unwrap();
    let repository = Arc::new(SqlSampleTaskRepository::new(backend.clone()));
    repository.ensure_schema().await.unwrap();
    AppState::new(repository, Arc::new(backend), true).unwrap()
}

pub fn app(state: AppState) -> Router {
    router(state, SlowRequestThresholds::default())
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn call(app: &Router, method: Method, uri: &str, body: Option<&str>) -> TestResponse {
    let mut request = Request::builder().method(method).uri(uri);
    if body.is_some() {
        request = request.header("content-type", "application/json");
    }
    let request = request
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    TestResponse {
        status,
        headers,
        body,
    }
}
