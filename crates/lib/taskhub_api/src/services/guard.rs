//! The per-request authorization step every workspace-scoped handler
//! runs before touching data.

use uuid::Uuid;

use taskhub_core::authz::{Permission, Role};
use taskhub_core::members;

use crate::AppState;
use crate::error::AppResult;

/// Resolve the caller's role in the workspace and require ALL of the
/// listed permissions. Membership is looked up fresh on every call.
pub async fn require_permissions(
    state: &AppState,
    user_id: Uuid,
    workspace_id: Uuid,
    required: &[Permission],
) -> AppResult<Role> {
    let role = members::resolve_role(&state.pool, user_id, workspace_id).await?;
    state.permissions.authorize(role, required)?;
    Ok(role)
}
