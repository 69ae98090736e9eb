//! Todo endpoint tests.

mod common;

use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::test_app;
use todoapi_service_shared::test_utils::LogLevel;
use todoapi_service_shared::JSONAPI_MEDIA_TYPE;

#[tokio::test]
async fn test_add_todo_is_created_resource() {
    let app = test_app();
    let response = app
        .server
        .post("/api/v1/todo/todo")
        .json(&json!({"content": "buy milk"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(response.header(CONTENT_TYPE), JSONAPI_MEDIA_TYPE);
    let body: Value = response.json();
    assert_eq!(body["data"]["type"], "todos");
    assert_eq!(body["data"]["id"], "1");
    assert_eq!(body["data"]["attributes"]["content"], "buy milk");
    assert_eq!(body["data"]["attributes"]["isDone"], false);
    assert!(body["data"]["attributes"]["createdate"].is_string());
    assert!(
        body["links"]["self"]
            .as_str()
            .unwrap()
            .ends_with("/api/v1/todo/todo")
    );
}

#[tokio::test]
async fn test_get_todo_by_id() {
    let app = test_app();
    let todo = app.state.todos().add("read a book").unwrap();

    let response = app
        .server
        .get("/api/v1/todo/todo")
        .add_query_param("id", todo.id)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["id"], todo.id.to_string());
    assert_eq!(body["data"]["attributes"]["content"], "read a book");
    assert_eq!(body["meta"]["method"], "GET");
    assert!(body["meta"]["duration"].as_str().unwrap().ends_with("ms"));
}

#[tokio::test]
async fn test_list_todos() {
    let app = test_app();
    let response = app.server.get("/api/v1/todo/todos").await;
    let body: Value = response.json();
    assert_eq!(body["data"], json!([]));

    app.state.todos().add("first").unwrap();
    app.state.todos().add("second").unwrap();
    let response = app.server.get("/api/v1/todo/todos").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[1]["type"], "todos");
    assert_eq!(data[1]["attributes"]["content"], "second");
}

#[tokio::test]
async fn test_update_todo_returns_success_message() {
    let app = test_app();
    let todo = app.state.todos().add("finish report").unwrap();

    let response = app
        .server
        .put("/api/v1/todo/todo")
        .json(&json!({"id": todo.id, "isDone": true}))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(
        body["data"],
        json!({"type": "todos", "id": "1", "attributes": {"message": "success"}})
    );
    assert!(app.state.todos().get(todo.id).unwrap().is_done);
}

#[tokio::test]
async fn test_delete_todo_returns_null_data() {
    let app = test_app();
    let todo = app.state.todos().add("temporary").unwrap();

    let response = app
        .server
        .delete("/api/v1/todo/todo")
        .add_query_param("id", todo.id)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"], Value::Null);
    assert!(body.get("errors").is_none());
    assert!(app.state.todos().list().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_todo_is_normalized_404() {
    let app = test_app();
    let response = app
        .server
        .get("/api/v1/todo/todo")
        .add_query_param("id", 999)
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.header(CONTENT_TYPE), JSONAPI_MEDIA_TYPE);
    let body: Value = response.json();
    let error = &body["errors"][0];
    assert_eq!(error["status"], "404");
    assert_eq!(error["title"], "Not Found");
    assert_eq!(error["detail"], "Todo not found");
    assert_eq!(error["code"], "TODO_NOT_FOUND");
    assert_eq!(error["source"]["pointer"], "/api/v1/todo/todo?id=999");
    assert!(body["meta"]["timestamp"].is_string());

    let entries = app.logger.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].level, LogLevel::Warn);
    assert!(entries[0].message.contains("code_error=TODO_NOT_FOUND"));
}

#[tokio::test]
async fn test_update_of_missing_todo_is_404() {
    let app = test_app();
    let response = app
        .server
        .put("/api/v1/todo/todo")
        .json(&json!({"id": 42, "isDone": false}))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blank_content_is_400() {
    let app = test_app();
    let response = app
        .server
        .post("/api/v1/todo/todo")
        .json(&json!({"content": "   "}))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["errors"][0]["title"], "Bad Request");
    assert!(
        body["errors"][0]["detail"]
            .as_str()
            .unwrap()
            .contains("content")
    );
}

#[tokio::test]
async fn test_missing_query_id_is_400() {
    let app = test_app();
    let response = app.server.get("/api/v1/todo/todo").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["errors"][0]["status"], "400");
    assert!(body["errors"][0]["detail"].is_string());
}

#[tokio::test]
async fn test_malformed_body_is_normalized() {
    let app = test_app();
    let response = app
        .server
        .post("/api/v1/todo/todo")
        .content_type("application/json")
        .text("{not json")
        .await;

    assert!(response.status_code().is_client_error());
    let body: Value = response.json();
    assert!(body["errors"].is_array());
    assert!(body.get("data").is_none());
}
