use crate::derive;
use crate::errors::{AppError, AppResult};
use crate::models::{DataResponse, HealthResponse, NotesResponse, Task, UpdateTaskRequest};
use crate::notes;
use crate::workspace;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/data", get(get_data))
        .route("/api/notes", get(get_notes))
        .route("/api/tasks", patch(patch_task))
        .with_state(state)
}

fn error_response(context: &str, error: AppError) -> Response {
    match error {
        AppError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Task not found"})),
        )
            .into_response(),
        AppError::BadRequest(message) => {
            (StatusCode::BAD_REQUEST, Json(json!({"error": message}))).into_response()
        }
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": context, "details": other.to_string()})),
        )
            .into_response(),
    }
}

fn data_response(root: &Path) -> AppResult<DataResponse> {
    workspace::ensure_topology(root)?;
    let snapshot = workspace::load_snapshot(root);
    let today = Utc::now().date_naive();

    let stats = derive::dashboard_stats(&snapshot, today);
    let overdue = derive::overdue_tasks(&snapshot, today);
    let due_today = derive::tasks_due_today(&snapshot, today);

    Ok(DataResponse {
        tasks: snapshot.tasks,
        projects: snapshot.projects,
        facts: snapshot.facts,
        graph: snapshot.graph,
        stats,
        overdue,
        due_today,
    })
}

pub async fn get_data(State(state): State<AppState>) -> Response {
    match data_response(&state.root) {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(error) => {
            tracing::error!(error = %error, "failed to load workspace data");
            error_response("Failed to load data", error)
        }
    }
}

pub async fn patch_task(
    State(state): State<AppState>,
    Json(request): Json<UpdateTaskRequest>,
) -> Response {
    // Status wins when both fields are supplied; exactly one mutation runs.
    let result: AppResult<Task> = if let Some(status) = request.status {
        workspace::set_task_status(&state.root, &request.task_id, status)
    } else if let Some(priority) = request.priority {
        workspace::set_task_priority(&state.root, &request.task_id, priority)
    } else {
        Err(AppError::BadRequest("No valid update provided".to_string()))
    };

    match result {
        Ok(task) => (StatusCode::OK, Json(task)).into_response(),
        Err(error) => {
            if !matches!(error, AppError::NotFound(_) | AppError::BadRequest(_)) {
                tracing::error!(error = %error, task = %request.task_id, "failed to update task");
            }
            error_response("Failed to update task", error)
        }
    }
}

fn notes_response(root: &Path) -> AppResult<NotesResponse> {
    workspace::ensure_topology(root)?;
    let today = Utc::now().date_naive();
    Ok(NotesResponse {
        notes: notes::load_daily_notes(root),
        today: notes::load_today_note(root, today),
    })
}

pub async fn get_notes(State(state): State<AppState>) -> Response {
    match notes_response(&state.root) {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(error) => {
            tracing::error!(error = %error, "failed to load daily notes");
            error_response("Failed to load notes", error)
        }
    }
}

pub async fn healthz(State(state): State<AppState>) -> Response {
    let body = HealthResponse {
        status: "ok",
        workspace: state.root.to_string_lossy().to_string(),
        workspace_exists: state.root.is_dir(),
    };
    (StatusCode::OK, Json(body)).into_response()
}
