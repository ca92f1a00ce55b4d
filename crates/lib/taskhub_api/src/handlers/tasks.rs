//! Task request handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use taskhub_core::authz::Permission;
use taskhub_core::tasks::{self, NewTask, TaskChanges};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentUser;
use crate::models::{CreateTaskRequest, TaskResponse, TasksResponse, UpdateTaskRequest};
use crate::services::guard::require_permissions;

/// `POST /workspace/{workspaceId}/projects/{projectId}/tasks` — create
/// a task.
pub async fn create_task_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path((workspace_id, project_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<CreateTaskRequest>,
) -> AppResult<(StatusCode, Json<TaskResponse>)> {
    require_permissions(&state, user.0.id, workspace_id, &[Permission::CreateTask]).await?;
    if body.title.trim().is_empty() {
        return Err(AppError::Validation("Task title is required".into()));
    }
    let task = tasks::create_task(
        &state.pool,
        workspace_id,
        project_id,
        user.0.id,
        &NewTask {
            title: body.title,
            description: body.description,
            status: body.status.unwrap_or_default(),
            priority: body.priority.unwrap_or_default(),
            assigned_to: body.assigned_to,
            due_date: body.due_date,
        },
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(TaskResponse { task: task.into() }),
    ))
}

/// `GET /workspace/{workspaceId}/tasks` — list the workspace's tasks.
pub async fn list_tasks_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path(workspace_id): Path<Uuid>,
) -> AppResult<Json<TasksResponse>> {
    require_permissions(&state, user.0.id, workspace_id, &[Permission::ViewOnly]).await?;
    let tasks = tasks::list_tasks(&state.pool, workspace_id).await?;
    Ok(Json(TasksResponse {
        tasks: tasks.into_iter().map(Into::into).collect(),
    }))
}

/// `GET /workspace/{workspaceId}/projects/{projectId}/tasks/{id}` —
/// fetch one task.
pub async fn get_task_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path((workspace_id, project_id, task_id)): Path<(Uuid, Uuid, Uuid)>,
) -> AppResult<Json<TaskResponse>> {
    require_permissions(&state, user.0.id, workspace_id, &[Permission::ViewOnly]).await?;
    let task = tasks::get_task(&state.pool, workspace_id, project_id, task_id).await?;
    Ok(Json(TaskResponse { task: task.into() }))
}

/// `PUT /workspace/{workspaceId}/projects/{projectId}/tasks/{id}` —
/// update a task.
pub async fn update_task_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path((workspace_id, project_id, task_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(body): Json<UpdateTaskRequest>,
) -> AppResult<Json<TaskResponse>> {
    require_permissions(&state, user.0.id, workspace_id, &[Permission::EditTask]).await?;
    let task = tasks::update_task(
        &state.pool,
        workspace_id,
        project_id,
        task_id,
        &TaskChanges {
            title: body.title,
            description: body.description,
            status: body.status,
            priority: body.priority,
            assigned_to: body.assigned_to,
            due_date: body.due_date,
        },
    )
    .await?;
    Ok(Json(TaskResponse { task: task.into() }))
}

/// `DELETE /workspace/{workspaceId}/tasks/{id}` — delete a task.
pub async fn delete_task_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path((workspace_id, task_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<serde_json::Value>> {
    require_permissions(&state, user.0.id, workspace_id, &[Permission::DeleteTask]).await?;
    tasks::delete_task(&state.pool, workspace_id, task_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
