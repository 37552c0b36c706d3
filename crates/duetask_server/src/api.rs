//! REST surface for the task store.
//!
//! # Responsibility
//! - Route `/tasks` CRUD verbs onto `TaskService` use-cases.
//! - Run blocking SQLite work off the async executor.
//!
//! # Invariants
//! - Handlers are stateless; the only shared state is the store connection.
//! - PUT and PATCH share sparse-update semantics.
//! - Ids that are not UUIDs are reported as not found.

use crate::error::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use duetask_core::{
    core_version, NewTask, ServiceResult, SqliteTaskRepository, Task, TaskId, TaskPatch,
    TaskService,
};
use log::error;
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

/// Shared handler state: one SQLite connection guarded for exclusive use.
#[derive(Clone)]
pub struct AppState {
    conn: Arc<Mutex<Connection>>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Builds the application router with permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task)
                .put(update_task)
                .patch(update_task)
                .delete(delete_task),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: core_version(),
    })
}

async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = with_task_service(&state, |service| service.list_tasks()).await?;
    Ok(Json(tasks))
}

async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(input) = payload?;
    let task = with_task_service(&state, move |service| service.create_task(&input)).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_task_id(&raw_id)?;
    let task = with_task_service(&state, move |service| service.get_task(id)).await?;
    Ok(Json(task))
}

async fn update_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<TaskPatch>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_task_id(&raw_id)?;
    let Json(patch) = payload?;
    let task = with_task_service(&state, move |service| service.update_task(id, &patch)).await?;
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_task_id(&raw_id)?;
    with_task_service(&state, move |service| service.delete_task(id)).await?;
    Ok(Json(DeleteResponse { success: true }))
}

fn parse_task_id(raw_id: &str) -> Result<TaskId, ApiError> {
    Uuid::parse_str(raw_id.trim()).map_err(|_| ApiError::task_not_found(raw_id))
}

/// Runs one service call on the blocking pool with the store locked.
async fn with_task_service<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: for<'c> FnOnce(&TaskService<SqliteTaskRepository<'c>>) -> ServiceResult<T> + Send + 'static,
{
    let conn = Arc::clone(&state.conn);
    let joined = tokio::task::spawn_blocking(move || {
        let guard = conn.lock().map_err(|_| {
            error!("event=api_error module=api status=error error_code=store_lock_poisoned");
            ApiError::Store("task store unavailable".to_string())
        })?;
        let service = TaskService::new(SqliteTaskRepository::new(&guard));
        op(&service).map_err(ApiError::from)
    })
    .await;

    match joined {
        Ok(result) => result,
        Err(err) => {
            error!("event=api_error module=api status=error error_code=store_worker_failed error={err}");
            Err(ApiError::Store("task store unavailable".to_string()))
        }
    }
}
