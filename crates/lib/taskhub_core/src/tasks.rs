//! Task queries, scoped to one workspace and project.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DomainError;
use crate::members;
use crate::models::workspace::{Task, TaskPriority, TaskStatus};
use crate::projects;
use crate::uuid::uuidv7;

const TASK_COLUMNS: &str = "id, workspace_id, project_id, title, description, status, priority, \
                            assigned_to, created_by, due_date, created_at, updated_at";

/// Fields accepted when creating a task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Fields accepted when updating a task; `None` leaves a field as-is.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Create a task in a project.
///
/// The project must belong to the workspace, and an assignee must be a
/// member of it.
pub async fn create_task(
    pool: &PgPool,
    workspace_id: Uuid,
    project_id: Uuid,
    created_by: Uuid,
    task: &NewTask,
) -> Result<Task, DomainError> {
    projects::get_project(pool, workspace_id, project_id).await?;

    if let Some(assignee) = task.assigned_to
        && !members::is_member(pool, assignee, workspace_id).await?
    {
        return Err(DomainError::Validation(
            "Assigned user is not a member of this workspace".into(),
        ));
    }

    let task = sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (id, workspace_id, project_id, title, description, status, \
                            priority, assigned_to, created_by, due_date) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING {TASK_COLUMNS}"
    ))
    .bind(uuidv7())
    .bind(workspace_id)
    .bind(project_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status.as_str())
    .bind(task.priority.as_str())
    .bind(task.assigned_to)
    .bind(created_by)
    .bind(task.due_date)
    .fetch_one(pool)
    .await?;
    Ok(task)
}

/// Apply changes to a task within its project and workspace.
pub async fn update_task(
    pool: &PgPool,
    workspace_id: Uuid,
    project_id: Uuid,
    task_id: Uuid,
    changes: &TaskChanges,
) -> Result<Task, DomainError> {
    projects::get_project(pool, workspace_id, project_id).await?;

    if let Some(assignee) = changes.assigned_to
        && !members::is_member(pool, assignee, workspace_id).await?
    {
        return Err(DomainError::Validation(
            "Assigned user is not a member of this workspace".into(),
        ));
    }

    sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks \
         SET title = COALESCE($4, title), \
             description = COALESCE($5, description), \
             status = COALESCE($6, status), \
             priority = COALESCE($7, priority), \
             assigned_to = COALESCE($8, assigned_to), \
             due_date = COALESCE($9, due_date), \
             updated_at = now() \
         WHERE id = $1 AND project_id = $2 AND workspace_id = $3 \
         RETURNING {TASK_COLUMNS}"
    ))
    .bind(task_id)
    .bind(project_id)
    .bind(workspace_id)
    .bind(changes.title.as_deref())
    .bind(changes.description.as_deref())
    .bind(changes.status.map(TaskStatus::as_str))
    .bind(changes.priority.map(TaskPriority::as_str))
    .bind(changes.assigned_to)
    .bind(changes.due_date)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| {
        DomainError::NotFound("Task not found or does not belong to this project".into())
    })
}

/// All tasks in a workspace, newest first.
pub async fn list_tasks(pool: &PgPool, workspace_id: Uuid) -> Result<Vec<Task>, DomainError> {
    let tasks = sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE workspace_id = $1 ORDER BY created_at DESC"
    ))
    .bind(workspace_id)
    .fetch_all(pool)
    .await?;
    Ok(tasks)
}

/// Fetch a task, requiring workspace and project to match.
pub async fn get_task(
    pool: &PgPool,
    workspace_id: Uuid,
    project_id: Uuid,
    task_id: Uuid,
) -> Result<Task, DomainError> {
    sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks \
         WHERE id = $1 AND project_id = $2 AND workspace_id = $3"
    ))
    .bind(task_id)
    .bind(project_id)
    .bind(workspace_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DomainError::NotFound("Task not found.".into()))
}

/// Delete a task from a workspace.
pub async fn delete_task(
    pool: &PgPool,
    workspace_id: Uuid,
    task_id: Uuid,
) -> Result<(), DomainError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND workspace_id = $2")
        .bind(task_id)
        .bind(workspace_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DomainError::NotFound("Task not found.".into()));
    }
    Ok(())
}
