//! `/api/v1/todo` handlers.

use axum::extract::State;

use todoapi_service_shared::{
    record_todo_mutation, AddTodoDto, ApiResult, AppState, JsonApi, TodoIdQuery, UpdateTodoDto,
    ValidJson, ValidQuery,
};

use crate::presenter::TodoPresenter;

/// GET /api/v1/todo/todo?id=
pub async fn get_todo(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<TodoIdQuery>,
) -> ApiResult {
    let todos = state.todos().clone();
    let todo = tokio::task::spawn_blocking(move || todos.get(query.id)).await??;
    Ok(JsonApi::resource(&TodoPresenter::from(todo)))
}

/// GET /api/v1/todo/todos
pub async fn list_todos(State(state): State<AppState>) -> ApiResult {
    let todos = state.todos().clone();
    let items: Vec<TodoPresenter> = tokio::task::spawn_blocking(move || todos.list())
        .await??
        .into_iter()
        .map(TodoPresenter::from)
        .collect();
    Ok(JsonApi::resources(&items))
}

/// POST /api/v1/todo/todo
pub async fn add_todo(
    State(state): State<AppState>,
    ValidJson(dto): ValidJson<AddTodoDto>,
) -> ApiResult {
    let todos = state.todos().clone();
    let todo = tokio::task::spawn_blocking(move || todos.add(&dto.content)).await??;
    record_todo_mutation("create");
    Ok(JsonApi::resource(&TodoPresenter::from(todo)).created())
}

/// PUT /api/v1/todo/todo
pub async fn update_todo(
    State(state): State<AppState>,
    ValidJson(dto): ValidJson<UpdateTodoDto>,
) -> ApiResult {
    let todos = state.todos().clone();
    tokio::task::spawn_blocking(move || todos.update(dto.id, dto.is_done)).await??;
    record_todo_mutation("update");
    Ok(JsonApi::message("success"))
}

/// DELETE /api/v1/todo/todo?id=
pub async fn delete_todo(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<TodoIdQuery>,
) -> ApiResult {
    let todos = state.todos().clone();
    tokio::task::spawn_blocking(move || todos.delete(query.id)).await??;
    record_todo_mutation("delete");
    Ok(JsonApi::empty())
}
