//! Member request handlers.

use axum::Json;
use axum::extract::{Path, State};

use taskhub_core::members;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::CurrentUser;
use crate::models::JoinWorkspaceResponse;

/// `POST /member/workspace/{inviteCode}/join` — join a workspace as a
/// MEMBER via its invite code.
pub async fn join_workspace_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Path(invite_code): Path<String>,
) -> AppResult<Json<JoinWorkspaceResponse>> {
    let (workspace_id, role) =
        members::join_by_invite(&state.pool, user.0.id, &invite_code).await?;
    Ok(Json(JoinWorkspaceResponse { workspace_id, role }))
}
