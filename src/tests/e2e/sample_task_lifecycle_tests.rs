use crate::shared::core::correlation_id::CORRELATION_ID_HEADER;
use crate::shell::state::AppState;
use crate::tests::fixtures::app::{app, call, document_state, in_memory_stores, sql_state};
use axum::http::{Method, StatusCode};
use rstest::rstest;

#[derive(Debug, Clone, Copy)]
enum Backend {
    Sql,
    Document,
}

async fn state_for(backend: Backend) -> AppState {
    match backend {
        Backend::Sql => sql_state().await,
        Backend::Document => document_state(&in_memory_stores()),
    }
}

#[rstest]
#[case(Backend::Sql)]
#[case(Backend::Document)]
#[tokio::test]
async fn creates_reads_and_retimes_a_sample_task(#[case] backend: Backend) {
    let app = app(state_for(backend).await);

    let created = call(
        &app,
        Method::POST,
        "/task",
        Some(r#"{"name":"  nightly-report ","timerInMilliseconds":1000}"#),
    )
    .await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.body["errorCode"], 0);
    assert!(created.headers.contains_key(CORRELATION_ID_HEADER));
    let id = created.body["data"]["id"].as_i64().unwrap();
    assert_eq!(created.body["data"]["name"], "nightly-report");

    let fetched = call(&app, Method::GET, &format!("/task/{id}"), None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["data"]["timerOnMiliseconds"], 1000);
    assert!(fetched.body["data"]["updatedAt"].is_null());

    let updated = call(
        &app,
        Method::PUT,
        "/task/timer",
        Some(&format!(r#"{{"id":{id},"timerInMilliseconds":30000}}"#)),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["data"], true);

    let refetched = call(&app, Method::GET, &format!("/task/{id}"), None).await;
    assert_eq!(refetched.body["data"]["timerOnMiliseconds"], 30000);
    assert!(refetched.body["data"]["updatedAt"].is_i64());

    let listed = call(&app, Method::GET, "/task?activeOnly=true", None).await;
    assert_eq!(listed.body["data"]["tasks"].as_array().unwrap().len(), 1);
}

#[rstest]
#[case(Backend::Sql)]
#[case(Backend::Document)]
#[tokio::test]
async fn lists_newest_tasks_first(#[case] backend: Backend) {
    let app = app(state_for(backend).await);
    for name in ["first-task", "second-task", "third-task"] {
        let body = format!(r#"{{"name":"{name}","timerInMilliseconds":750}}"#);
        let response = call(&app, Method::POST, "/task", Some(&body)).await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let listed = call(&app, Method::GET, "/task", None).await;

    let names: Vec<&str> = listed.body["data"]["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|task| task["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["third-task", "second-task", "first-task"]);
}

#[rstest]
#[case(Backend::Sql)]
#[case(Backend::Document)]
#[tokio::test]
async fn rejects_bad_input_and_reports_missing_tasks(#[case] backend: Backend) {
    let app = app(state_for(backend).await);

    let invalid = call(
        &app,
        Method::POST,
        "/task",
        Some(r#"{"name":"","timerInMilliseconds":90000000}"#),
    )
    .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    let properties: Vec<&str> = invalid.body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|detail| detail["propertyName"].as_str().unwrap())
        .collect();
    assert!(properties.contains(&"name"));
    assert!(properties.contains(&"timerInMilliseconds"));

    let missing = call(&app, Method::GET, "/task/12345", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["success"], false);
    assert_eq!(missing.body["error"]["type"], "NotFound");

    let missing_update = call(
        &app,
        Method::PUT,
        "/task/timer",
        Some(r#"{"id":12345,"timerInMilliseconds":1000}"#),
    )
    .await;
    assert_eq!(missing_update.status, StatusCode::NOT_FOUND);

    let health = call(&app, Method::GET, "/health", None).await;
    assert_eq!(health.status, StatusCode::OK);
}
