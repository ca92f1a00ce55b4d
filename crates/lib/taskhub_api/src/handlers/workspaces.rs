//! Workspace request handlers.
//!
//! Every workspace-scoped operation resolves the caller's role fresh
//! and passes the route's required permissions through the guard
//! before touching data.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use taskhub_core::authz::{Permission, Role};
use taskhub_core::{members, workspaces};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentUser;
use crate::models::{
    AnalyticsResponse, ChangeMemberRoleRequest, CreateWorkspaceRequest, DeleteWorkspaceResponse,
    MembersResponse, UpdateWorkspaceRequest, WorkspaceResponse, WorkspacesResponse,
};
use crate::services::guard::require_permissions;

/// `POST /workspace` — create a workspace owned by the caller.
pub async fn create_workspace_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Json(body): Json<CreateWorkspaceRequest>,
) -> AppResult<(StatusCode, Json<WorkspaceResponse>)> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("Workspace name is required".into()));
    }
    let workspace = workspaces::create_workspace(
        &state.pool,
        user.0.id,
        &body.name,
        body.description.as_deref(),
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(WorkspaceResponse {
            workspace: workspace.into(),
        }),
    ))
}

/// `GET /workspace/all` — every workspace the caller is a member of.
pub async fn list_workspaces_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
) -> AppResult<Json<WorkspacesResponse>> {
    let workspaces = workspaces::list_user_workspaces(&state.pool, user.0.id).await?;
    Ok(Json(WorkspacesResponse {
        workspaces: workspaces.into_iter().map(Into::into).collect(),
    }))
}

/// `GET /workspace/{id}` — fetch one workspace. Membership is the
/// only requirement.
pub async fn get_workspace_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path(workspace_id): Path<Uuid>,
) -> AppResult<Json<WorkspaceResponse>> {
    require_permissions(&state, user.0.id, workspace_id, &[]).await?;
    let workspace = workspaces::get_workspace(&state.pool, workspace_id).await?;
    Ok(Json(WorkspaceResponse {
        workspace: workspace.into(),
    }))
}

/// `GET /workspace/{id}/members` — list members with roles.
pub async fn workspace_members_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path(workspace_id): Path<Uuid>,
) -> AppResult<Json<MembersResponse>> {
    require_permissions(&state, user.0.id, workspace_id, &[Permission::ViewOnly]).await?;
    let members = members::list_members(&state.pool, workspace_id).await?;
    Ok(Json(MembersResponse {
        members: members.into_iter().map(Into::into).collect(),
        roles: vec![Role::Owner, Role::Admin, Role::Member],
    }))
}

/// `GET /workspace/{id}/analytics` — task counts.
pub async fn workspace_analytics_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path(workspace_id): Path<Uuid>,
) -> AppResult<Json<AnalyticsResponse>> {
    require_permissions(&state, user.0.id, workspace_id, &[Permission::ViewOnly]).await?;
    let analytics = workspaces::workspace_analytics(&state.pool, workspace_id).await?;
    Ok(Json(AnalyticsResponse {
        analytics: analytics.into(),
    }))
}

/// `PUT /workspace/{id}` — update name/description.
pub async fn update_workspace_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path(workspace_id): Path<Uuid>,
    Json(body): Json<UpdateWorkspaceRequest>,
) -> AppResult<Json<WorkspaceResponse>> {
    require_permissions(&state, user.0.id, workspace_id, &[Permission::EditWorkspace]).await?;
    let workspace = workspaces::update_workspace(
        &state.pool,
        workspace_id,
        body.name.as_deref(),
        body.description.as_deref(),
    )
    .await?;
    Ok(Json(WorkspaceResponse {
        workspace: workspace.into(),
    }))
}

/// `PUT /workspace/{id}/member/role` — change a member's role.
pub async fn change_member_role_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path(workspace_id): Path<Uuid>,
    Json(body): Json<ChangeMemberRoleRequest>,
) -> AppResult<Json<serde_json::Value>> {
    require_permissions(
        &state,
        user.0.id,
        workspace_id,
        &[Permission::ChangeMemberRole],
    )
    .await?;
    members::change_member_role(&state.pool, workspace_id, body.member_id, body.role).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// `DELETE /workspace/{id}` — delete the workspace and everything
/// scoped to it.
pub async fn delete_workspace_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path(workspace_id): Path<Uuid>,
) -> AppResult<Json<DeleteWorkspaceResponse>> {
    require_permissions(
        &state,
        user.0.id,
        workspace_id,
        &[Permission::DeleteWorkspace],
    )
    .await?;
    let current_workspace =
        workspaces::delete_workspace(&state.pool, workspace_id, user.0.id).await?;
    Ok(Json(DeleteWorkspaceResponse { current_workspace }))
}
