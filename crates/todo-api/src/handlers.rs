use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use domain::{
    ListTodosQuery, MessageResponse, NewTodo, ServiceEndpoints, ServiceInfo, Todo, TodoChanges,
    TodoId, TodoStats,
};
use tracing::instrument;

use crate::error::ApiError;
use crate::router::{AppState, STATS_PATH, TODOS_PATH};

/// Ids that are not well-formed ULIDs can never be stored, so they resolve to 404.
fn parse_id(id: &str) -> Result<TodoId, ApiError> {
    TodoId::parse(id).map_err(|_| ApiError::NotFound)
}

pub async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Todo API Server is running!".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: ServiceEndpoints {
            todos: TODOS_PATH.to_string(),
            stats: format!("{TODOS_PATH}{STATS_PATH}"),
        },
    })
}

#[instrument(skip(state, query))]
pub async fn list_todos(
    State(state): State<AppState>,
    query: Result<Query<ListTodosQuery>, QueryRejection>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let Query(query) = query?;
    let filter = query.to_filter();
    let sort = query.to_sort();

    let todos = state.store().find(&filter, &sort).await?;
    tracing::debug!(count = todos.len(), ?filter, ?sort, "Listed todos");
    Ok(Json(todos))
}

#[instrument(skip(state))]
pub async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Todo>, ApiError> {
    let id = parse_id(&id)?;
    let todo = state
        .store()
        .find_by_id(&id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(todo))
}

#[instrument(skip(state, body))]
pub async fn create_todo(
    State(state): State<AppState>,
    body: Result<Json<NewTodo>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let Json(input) = body?;
    let todo = state.store().create(input).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

#[instrument(skip(state, body))]
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<TodoChanges>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    let id = parse_id(&id)?;
    let Json(changes) = body?;
    let todo = state.store().update_by_id(&id, changes).await?;
    Ok(Json(todo))
}

#[instrument(skip(state))]
pub async fn toggle_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Todo>, ApiError> {
    let id = parse_id(&id)?;
    let current = state
        .store()
        .find_by_id(&id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let changes = TodoChanges {
        completed: Some(!current.completed),
        ..TodoChanges::default()
    };
    let todo = state.store().update_by_id(&id, changes).await?;
    Ok(Json(todo))
}

#[instrument(skip(state))]
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    state.store().delete_by_id(&id).await?;
    Ok(Json(MessageResponse::new("Todo deleted successfully")))
}

#[instrument(skip(state))]
pub async fn stats_overview(State(state): State<AppState>) -> Result<Json<TodoStats>, ApiError> {
    let stats = state.store().stats(Utc::now()).await?;
    tracing::debug!(total = stats.total, "Computed todo stats");
    Ok(Json(stats))
}

pub async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
