//! Project queries, scoped to one workspace.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::workspace::Project;
use crate::uuid::uuidv7;

const PROJECT_COLUMNS: &str =
    "id, workspace_id, name, description, emoji, created_by, created_at, updated_at";

/// Create a project in a workspace.
pub async fn create_project(
    pool: &PgPool,
    workspace_id: Uuid,
    created_by: Uuid,
    name: &str,
    description: Option<&str>,
    emoji: Option<&str>,
) -> Result<Project, DomainError> {
    let project = sqlx::query_as::<_, Project>(&format!(
        "INSERT INTO projects (id, workspace_id, name, description, emoji, created_by) \
         VALUES ($1, $2, $3, $4, COALESCE($5, '📊'), $6) \
         RETURNING {PROJECT_COLUMNS}"
    ))
    .bind(uuidv7())
    .bind(workspace_id)
    .bind(name)
    .bind(description)
    .bind(emoji)
    .bind(created_by)
    .fetch_one(pool)
    .await?;
    Ok(project)
}

/// All projects in a workspace, newest first.
pub async fn list_projects(
    pool: &PgPool,
    workspace_id: Uuid,
) -> Result<Vec<Project>, DomainError> {
    let projects = sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects \
         WHERE workspace_id = $1 ORDER BY created_at DESC"
    ))
    .bind(workspace_id)
    .fetch_all(pool)
    .await?;
    Ok(projects)
}

/// Fetch a project, requiring it to belong to the workspace.
pub async fn get_project(
    pool: &PgPool,
    workspace_id: Uuid,
    project_id: Uuid,
) -> Result<Project, DomainError> {
    sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1 AND workspace_id = $2"
    ))
    .bind(project_id)
    .bind(workspace_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| {
        DomainError::NotFound("Project not found or does not belong to this workspace".into())
    })
}

/// Update a project's name, description and/or emoji.
pub async fn update_project(
    pool: &PgPool,
    workspace_id: Uuid,
    project_id: Uuid,
    name: Option<&str>,
    description: Option<&str>,
    emoji: Option<&str>,
) -> Result<Project, DomainError> {
    sqlx::query_as::<_, Project>(&format!(
        "UPDATE projects \
         SET name = COALESCE($3, name), \
             description = COALESCE($4, description), \
             emoji = COALESCE($5, emoji), \
             updated_at = now() \
         WHERE id = $1 AND workspace_id = $2 \
         RETURNING {PROJECT_COLUMNS}"
    ))
    .bind(project_id)
    .bind(workspace_id)
    .bind(name)
    .bind(description)
    .bind(emoji)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| {
        DomainError::NotFound("Project not found or does not belong to this workspace".into())
    })
}

/// Delete a project and its tasks.
pub async fn delete_project(
    pool: &PgPool,
    workspace_id: Uuid,
    project_id: Uuid,
) -> Result<(), DomainError> {
    let mut tx = pool.begin().await?;

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1 AND workspace_id = $2)",
    )
    .bind(project_id)
    .bind(workspace_id)
    .fetch_one(&mut *tx)
    .await?;
    if !exists {
        return Err(DomainError::NotFound(
            "Project not found or does not belong to this workspace".into(),
        ));
    }

    sqlx::query("DELETE FROM tasks WHERE project_id = $1")
        .bind(project_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(project_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}
