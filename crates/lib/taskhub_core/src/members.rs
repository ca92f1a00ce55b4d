//! Workspace membership: the authorization boundary for multi-tenant
//! scoping.
//!
//! A user's role is resolved fresh on every request — roles can change
//! between requests, so nothing here is cached.

use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::authz::Role;
use crate::error::DomainError;
use crate::models::workspace::MemberWithUser;
use crate::uuid::uuidv7;

/// Resolve the role a user holds in a workspace.
///
/// `NotFound` when the workspace does not exist; `Forbidden` when the
/// user has no member row there — membership, not workspace existence,
/// is the authorization boundary.
pub async fn resolve_role(
    pool: &PgPool,
    user_id: Uuid,
    workspace_id: Uuid,
) -> Result<Role, DomainError> {
    let workspace_exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM workspaces WHERE id = $1)")
            .bind(workspace_id)
            .fetch_one(pool)
            .await?;
    if !workspace_exists {
        return Err(DomainError::NotFound("Workspace not found".into()));
    }

    let role_name = sqlx::query_scalar::<_, String>(
        "SELECT r.name FROM members m \
         JOIN roles r ON r.id = m.role_id \
         WHERE m.user_id = $1 AND m.workspace_id = $2",
    )
    .bind(user_id)
    .bind(workspace_id)
    .fetch_optional(pool)
    .await?;

    let Some(name) = role_name else {
        return Err(DomainError::Forbidden(
            "You are not a member of this workspace".into(),
        ));
    };

    Role::parse(&name)
        .ok_or_else(|| DomainError::Validation(format!("unknown role in catalog: {name}")))
}

/// Look up a role's catalog id.
pub async fn find_role_id(ex: impl PgExecutor<'_>, role: Role) -> Result<Uuid, DomainError> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM roles WHERE name = $1")
        .bind(role.as_str())
        .fetch_optional(ex)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("{role} role not found")))
}

/// Bind a user to a workspace with the given role.
pub async fn add_member(
    ex: impl PgExecutor<'_>,
    user_id: Uuid,
    workspace_id: Uuid,
    role_id: Uuid,
) -> Result<(), DomainError> {
    sqlx::query(
        "INSERT INTO members (id, user_id, workspace_id, role_id) VALUES ($1, $2, $3, $4)",
    )
    .bind(uuidv7())
    .bind(user_id)
    .bind(workspace_id)
    .bind(role_id)
    .execute(ex)
    .await?;
    Ok(())
}

/// Check whether a user already has a member row in a workspace.
pub async fn is_member(
    ex: impl PgExecutor<'_>,
    user_id: Uuid,
    workspace_id: Uuid,
) -> Result<bool, DomainError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM members WHERE user_id = $1 AND workspace_id = $2)",
    )
    .bind(user_id)
    .bind(workspace_id)
    .fetch_one(ex)
    .await?;
    Ok(exists)
}

/// Join a workspace through its invite code, as a MEMBER.
pub async fn join_by_invite(
    pool: &PgPool,
    user_id: Uuid,
    invite_code: &str,
) -> Result<(Uuid, Role), DomainError> {
    let workspace_id = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM workspaces WHERE invite_code = $1",
    )
    .bind(invite_code)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| {
        DomainError::NotFound("Invalid invite code or workspace not found".into())
    })?;

    if is_member(pool, user_id, workspace_id).await? {
        return Err(DomainError::Validation(
            "You are already a member of this workspace".into(),
        ));
    }

    let role_id = find_role_id(pool, Role::Member).await?;
    add_member(pool, user_id, workspace_id, role_id).await?;

    Ok((workspace_id, Role::Member))
}

/// Change a member's role within a workspace.
pub async fn change_member_role(
    pool: &PgPool,
    workspace_id: Uuid,
    member_user_id: Uuid,
    role: Role,
) -> Result<(), DomainError> {
    let role_id = find_role_id(pool, role).await?;

    let result = sqlx::query(
        "UPDATE members SET role_id = $3 WHERE user_id = $1 AND workspace_id = $2",
    )
    .bind(member_user_id)
    .bind(workspace_id)
    .bind(role_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DomainError::NotFound(
            "Member not found in the workspace".into(),
        ));
    }
    Ok(())
}

/// List a workspace's members with user details and role names.
pub async fn list_members(
    ex: impl PgExecutor<'_>,
    workspace_id: Uuid,
) -> Result<Vec<MemberWithUser>, DomainError> {
    let members = sqlx::query_as::<_, MemberWithUser>(
        "SELECT m.user_id, u.name, u.email, u.profile_picture, r.name AS role, m.joined_at \
         FROM members m \
         JOIN users u ON u.id = m.user_id \
         JOIN roles r ON r.id = m.role_id \
         WHERE m.workspace_id = $1 \
         ORDER BY m.joined_at",
    )
    .bind(workspace_id)
    .fetch_all(ex)
    .await?;
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspaces;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn missing_workspace_is_not_found(pool: PgPool) {
        let (user_id, _) = workspaces::register(&pool, "alice@example.com", "Alice", "s3cretpw")
            .await
            .unwrap();
        let err = resolve_role(&pool, user_id, uuidv7()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[sqlx::test]
    async fn non_member_is_forbidden_even_when_workspace_exists(pool: PgPool) {
        let (_, workspace_id) = workspaces::register(&pool, "alice@example.com", "Alice", "s3cretpw")
            .await
            .unwrap();
        let (outsider, _) = workspaces::register(&pool, "bob@example.com", "Bob", "s3cretpw")
            .await
            .unwrap();
        let err = resolve_role(&pool, outsider, workspace_id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[sqlx::test]
    async fn invite_join_grants_member_role_once(pool: PgPool) {
        let (_, workspace_id) = workspaces::register(&pool, "alice@example.com", "Alice", "s3cretpw")
            .await
            .unwrap();
        let (joiner, _) = workspaces::register(&pool, "bob@example.com", "Bob", "s3cretpw")
            .await
            .unwrap();
        let workspace = workspaces::get_workspace(&pool, workspace_id).await.unwrap();

        let (joined_ws, role) = join_by_invite(&pool, joiner, &workspace.invite_code)
            .await
            .unwrap();
        assert_eq!(joined_ws, workspace_id);
        assert_eq!(role, Role::Member);
        assert_eq!(
            resolve_role(&pool, joiner, workspace_id).await.unwrap(),
            Role::Member
        );

        // Joining twice is rejected; the (user, workspace) pair is unique.
        let err = join_by_invite(&pool, joiner, &workspace.invite_code)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[sqlx::test]
    async fn change_member_role_promotes(pool: PgPool) {
        let (_, workspace_id) = workspaces::register(&pool, "alice@example.com", "Alice", "s3cretpw")
            .await
            .unwrap();
        let (joiner, _) = workspaces::register(&pool, "bob@example.com", "Bob", "s3cretpw")
            .await
            .unwrap();
        let workspace = workspaces::get_workspace(&pool, workspace_id).await.unwrap();
        join_by_invite(&pool, joiner, &workspace.invite_code)
            .await
            .unwrap();

        change_member_role(&pool, workspace_id, joiner, Role::Admin)
            .await
            .unwrap();
        assert_eq!(
            resolve_role(&pool, joiner, workspace_id).await.unwrap(),
            Role::Admin
        );
    }
}
