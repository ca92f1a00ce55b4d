//! Workspace lifecycle: registration, creation, deletion, reads.
//!
//! Registration and deletion are multi-row writes and run inside a
//! single transaction; a failure in any step rolls the whole unit
//! back before the error surfaces.

use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::auth::{password, queries as auth_queries};
use crate::authz::Role;
use crate::error::DomainError;
use crate::members;
use crate::models::workspace::{Workspace, WorkspaceAnalytics};
use crate::uuid::uuidv7;

const WORKSPACE_COLUMNS: &str =
    "id, name, description, owner_id, invite_code, created_at, updated_at";

/// Length of generated invite codes.
const INVITE_CODE_LEN: usize = 8;

fn generate_invite_code() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(INVITE_CODE_LEN)
        .map(char::from)
        .collect()
}

/// Register a new account.
///
/// One transaction: create the user, create their default workspace,
/// bind them as OWNER, point `current_workspace` at it. All four
/// writes succeed or none do. Returns (user id, workspace id).
pub async fn register(
    pool: &PgPool,
    email: &str,
    name: &str,
    plain_password: &str,
) -> Result<(Uuid, Uuid), DomainError> {
    let password_hash = password::hash_password(plain_password)?;

    let mut tx = pool.begin().await?;

    if auth_queries::email_exists(&mut *tx, email).await? {
        return Err(DomainError::Validation("Email already exists".into()));
    }

    let user_id = auth_queries::create_user(&mut *tx, email, name, &password_hash).await?;

    let workspace = insert_workspace(
        &mut *tx,
        "My Workspace",
        Some(&format!("Workspace created for {name}")),
        user_id,
    )
    .await?;

    let owner_role = members::find_role_id(&mut *tx, Role::Owner).await?;
    members::add_member(&mut *tx, user_id, workspace.id, owner_role).await?;

    auth_queries::set_current_workspace(&mut *tx, user_id, Some(workspace.id)).await?;

    tx.commit().await?;

    Ok((user_id, workspace.id))
}

/// Create a workspace owned by `user_id`, binding them as OWNER and
/// repointing their current workspace, in one transaction.
pub async fn create_workspace(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    description: Option<&str>,
) -> Result<Workspace, DomainError> {
    let mut tx = pool.begin().await?;

    let workspace = insert_workspace(&mut *tx, name, description, user_id).await?;

    let owner_role = members::find_role_id(&mut *tx, Role::Owner).await?;
    members::add_member(&mut *tx, user_id, workspace.id, owner_role).await?;

    auth_queries::set_current_workspace(&mut *tx, user_id, Some(workspace.id)).await?;

    tx.commit().await?;

    Ok(workspace)
}

async fn insert_workspace(
    ex: impl PgExecutor<'_>,
    name: &str,
    description: Option<&str>,
    owner_id: Uuid,
) -> Result<Workspace, DomainError> {
    let workspace = sqlx::query_as::<_, Workspace>(&format!(
        "INSERT INTO workspaces (id, name, description, owner_id, invite_code) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {WORKSPACE_COLUMNS}"
    ))
    .bind(uuidv7())
    .bind(name)
    .bind(description)
    .bind(owner_id)
    .bind(generate_invite_code())
    .fetch_one(ex)
    .await?;
    Ok(workspace)
}

/// Fetch a workspace by id.
pub async fn get_workspace(pool: &PgPool, workspace_id: Uuid) -> Result<Workspace, DomainError> {
    sqlx::query_as::<_, Workspace>(&format!(
        "SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE id = $1"
    ))
    .bind(workspace_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DomainError::NotFound("Workspace not found".into()))
}

/// All workspaces the user is a member of.
pub async fn list_user_workspaces(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<Workspace>, DomainError> {
    let workspaces = sqlx::query_as::<_, Workspace>(
        "SELECT w.id, w.name, w.description, w.owner_id, w.invite_code, \
                w.created_at, w.updated_at \
         FROM workspaces w \
         JOIN members m ON m.workspace_id = w.id \
         WHERE m.user_id = $1 \
         ORDER BY w.created_at",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(workspaces)
}

/// Update a workspace's name and/or description.
pub async fn update_workspace(
    pool: &PgPool,
    workspace_id: Uuid,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<Workspace, DomainError> {
    sqlx::query_as::<_, Workspace>(&format!(
        "UPDATE workspaces \
         SET name = COALESCE($2, name), \
             description = COALESCE($3, description), \
             updated_at = now() \
         WHERE id = $1 \
         RETURNING {WORKSPACE_COLUMNS}"
    ))
    .bind(workspace_id)
    .bind(name)
    .bind(description)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DomainError::NotFound("Workspace not found".into()))
}

/// Delete a workspace with everything scoped to it.
///
/// One transaction: tasks, projects and member rows go first, then the
/// workspace row. If the deleting user's current workspace pointed at
/// it, the pointer moves to another workspace they own, or NULL.
/// Returns the new current-workspace pointer.
pub async fn delete_workspace(
    pool: &PgPool,
    workspace_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Uuid>, DomainError> {
    let mut tx = pool.begin().await?;

    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM workspaces WHERE id = $1)")
            .bind(workspace_id)
            .fetch_one(&mut *tx)
            .await?;
    if !exists {
        return Err(DomainError::NotFound("Workspace not found".into()));
    }

    // Capture the pointer before the workspace row disappears.
    let current = sqlx::query_scalar::<_, Option<Uuid>>(
        "SELECT current_workspace FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .flatten();

    sqlx::query("DELETE FROM tasks WHERE workspace_id = $1")
        .bind(workspace_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM projects WHERE workspace_id = $1")
        .bind(workspace_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM members WHERE workspace_id = $1")
        .bind(workspace_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM workspaces WHERE id = $1")
        .bind(workspace_id)
        .execute(&mut *tx)
        .await?;

    let mut new_current = current;
    if current == Some(workspace_id) {
        new_current = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM workspaces WHERE owner_id = $1 AND id <> $2 \
             ORDER BY created_at LIMIT 1",
        )
        .bind(user_id)
        .bind(workspace_id)
        .fetch_optional(&mut *tx)
        .await?;
        auth_queries::set_current_workspace(&mut *tx, user_id, new_current).await?;
    }

    tx.commit().await?;

    Ok(new_current)
}

/// Task counts for the workspace dashboard.
pub async fn workspace_analytics(
    pool: &PgPool,
    workspace_id: Uuid,
) -> Result<WorkspaceAnalytics, DomainError> {
    let (total, overdue, completed) = sqlx::query_as::<_, (i64, i64, i64)>(
        "SELECT count(*), \
                count(*) FILTER (WHERE due_date < now() AND status <> 'DONE'), \
                count(*) FILTER (WHERE status = 'DONE') \
         FROM tasks WHERE workspace_id = $1",
    )
    .bind(workspace_id)
    .fetch_one(pool)
    .await?;
    Ok(WorkspaceAnalytics {
        total_tasks: total,
        overdue_tasks: overdue,
        completed_tasks: completed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    async fn table_count(pool: &PgPool, table: &str, workspace_id: Uuid) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!(
            "SELECT count(*) FROM {table} WHERE workspace_id = $1"
        ))
        .bind(workspace_id)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test]
    async fn register_creates_all_four_rows(pool: PgPool) {
        let (user_id, workspace_id) = register(&pool, "alice@example.com", "Alice", "s3cretpw")
            .await
            .unwrap();

        let workspace = get_workspace(&pool, workspace_id).await.unwrap();
        assert_eq!(workspace.owner_id, user_id);
        assert_eq!(workspace.name, "My Workspace");

        let role = crate::members::resolve_role(&pool, user_id, workspace_id)
            .await
            .unwrap();
        assert_eq!(role, Role::Owner);

        let current = sqlx::query_scalar::<_, Option<Uuid>>(
            "SELECT current_workspace FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(current, Some(workspace_id));
    }

    #[sqlx::test]
    async fn duplicate_email_registers_nothing(pool: PgPool) {
        register(&pool, "alice@example.com", "Alice", "s3cretpw")
            .await
            .unwrap();
        let err = register(&pool, "ALICE@example.com", "Imposter", "otherpw")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let users = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        let workspaces = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM workspaces")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(users, 1);
        assert_eq!(workspaces, 1);
    }

    #[sqlx::test]
    async fn delete_workspace_removes_dependents_and_repoints(pool: PgPool) {
        let (user_id, first_ws) = register(&pool, "alice@example.com", "Alice", "s3cretpw")
            .await
            .unwrap();
        let second = create_workspace(&pool, user_id, "Second", None).await.unwrap();

        // Creating a workspace repoints the current pointer at it.
        let project = crate::projects::create_project(
            &pool, second.id, user_id, "Build", None, None,
        )
        .await
        .unwrap();
        crate::tasks::create_task(
            &pool,
            second.id,
            project.id,
            user_id,
            &crate::tasks::NewTask {
                title: "Ship it".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let new_current = delete_workspace(&pool, second.id, user_id).await.unwrap();
        assert_eq!(new_current, Some(first_ws));

        assert_eq!(table_count(&pool, "tasks", second.id).await, 0);
        assert_eq!(table_count(&pool, "projects", second.id).await, 0);
        assert_eq!(table_count(&pool, "members", second.id).await, 0);
        assert!(matches!(
            get_workspace(&pool, second.id).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[sqlx::test]
    async fn deleting_last_owned_workspace_nulls_pointer(pool: PgPool) {
        let (user_id, workspace_id) = register(&pool, "alice@example.com", "Alice", "s3cretpw")
            .await
            .unwrap();
        let new_current = delete_workspace(&pool, workspace_id, user_id).await.unwrap();
        assert_eq!(new_current, None);

        let current = sqlx::query_scalar::<_, Option<Uuid>>(
            "SELECT current_workspace FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(current, None);
    }

    #[sqlx::test]
    async fn interrupted_deletion_rolls_back_fully(pool: PgPool) {
        let (user_id, workspace_id) = register(&pool, "alice@example.com", "Alice", "s3cretpw")
            .await
            .unwrap();
        let project =
            crate::projects::create_project(&pool, workspace_id, user_id, "Build", None, None)
                .await
                .unwrap();
        crate::tasks::create_task(
            &pool,
            workspace_id,
            project.id,
            user_id,
            &crate::tasks::NewTask {
                title: "Ship it".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        // Run the deletion steps but abandon the transaction mid-way,
        // as a crash between steps would.
        let mut tx = pool.begin().await.unwrap();
        sqlx::query("DELETE FROM tasks WHERE workspace_id = $1")
            .bind(workspace_id)
            .execute(&mut *tx)
            .await
            .unwrap();
        sqlx::query("DELETE FROM projects WHERE workspace_id = $1")
            .bind(workspace_id)
            .execute(&mut *tx)
            .await
            .unwrap();
        drop(tx); // rollback

        assert_eq!(table_count(&pool, "tasks", workspace_id).await, 1);
        assert_eq!(table_count(&pool, "projects", workspace_id).await, 1);
        assert_eq!(table_count(&pool, "members", workspace_id).await, 1);
        assert!(get_workspace(&pool, workspace_id).await.is_ok());
    }
}
