//! Project request handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use taskhub_core::authz::Permission;
use taskhub_core::projects;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentUser;
use crate::models::{
    CreateProjectRequest, ProjectResponse, ProjectsResponse, UpdateProjectRequest,
};
use crate::services::guard::require_permissions;

/// `POST /workspace/{workspaceId}/projects` — create a project.
pub async fn create_project_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path(workspace_id): Path<Uuid>,
    Json(body): Json<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<ProjectResponse>)> {
    require_permissions(&state, user.0.id, workspace_id, &[Permission::CreateProject]).await?;
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("Project name is required".into()));
    }
    let project = projects::create_project(
        &state.pool,
        workspace_id,
        user.0.id,
        &body.name,
        body.description.as_deref(),
        body.emoji.as_deref(),
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse {
            project: project.into(),
        }),
    ))
}

/// `GET /workspace/{workspaceId}/projects` — list projects.
pub async fn list_projects_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path(workspace_id): Path<Uuid>,
) -> AppResult<Json<ProjectsResponse>> {
    require_permissions(&state, user.0.id, workspace_id, &[Permission::ViewOnly]).await?;
    let projects = projects::list_projects(&state.pool, workspace_id).await?;
    Ok(Json(ProjectsResponse {
        projects: projects.into_iter().map(Into::into).collect(),
    }))
}

/// `GET /workspace/{workspaceId}/projects/{id}` — fetch one project.
pub async fn get_project_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path((workspace_id, project_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ProjectResponse>> {
    require_permissions(&state, user.0.id, workspace_id, &[Permission::ViewOnly]).await?;
    let project = projects::get_project(&state.pool, workspace_id, project_id).await?;
    Ok(Json(ProjectResponse {
        project: project.into(),
    }))
}

/// `PUT /workspace/{workspaceId}/projects/{id}` — update a project.
pub async fn update_project_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path((workspace_id, project_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateProjectRequest>,
) -> AppResult<Json<ProjectResponse>> {
    require_permissions(&state, user.0.id, workspace_id, &[Permission::EditProject]).await?;
    let project = projects::update_project(
        &state.pool,
        workspace_id,
        project_id,
        body.name.as_deref(),
        body.description.as_deref(),
        body.emoji.as_deref(),
    )
    .await?;
    Ok(Json(ProjectResponse {
        project: project.into(),
    }))
}

/// `DELETE /workspace/{workspaceId}/projects/{id}` — delete a project
/// and its tasks.
pub async fn delete_project_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path((workspace_id, project_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<serde_json::Value>> {
    require_permissions(&state, user.0.id, workspace_id, &[Permission::DeleteProject]).await?;
    projects::delete_project(&state.pool, workspace_id, project_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
