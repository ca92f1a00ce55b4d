//! # taskhub_api
//!
//! HTTP API library for Taskhub.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use taskhub_core::authz::PermissionMatrix;

use crate::config::ApiConfig;
use crate::handlers::{auth, members, projects, tasks, users, workspaces};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
    /// The role → permission matrix, built once at startup.
    pub permissions: Arc<PermissionMatrix>,
}

/// Run embedded database migrations.
///
/// Delegates to `taskhub_core::migrate::migrate()` which owns the
/// migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    taskhub_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/refresh-token", post(auth::refresh_handler));

    // Protected routes (session validator + per-route role guard)
    let protected = Router::new()
        .route("/auth/logout", post(auth::logout_handler))
        .route("/user/current", get(users::current_user_handler))
        .route("/workspace", post(workspaces::create_workspace_handler))
        .route("/workspace/all", get(workspaces::list_workspaces_handler))
        .route(
            "/workspace/{workspace_id}",
            get(workspaces::get_workspace_handler)
                .put(workspaces::update_workspace_handler)
                .delete(workspaces::delete_workspace_handler),
        )
        .route(
            "/workspace/{workspace_id}/members",
            get(workspaces::workspace_members_handler),
        )
        .route(
            "/workspace/{workspace_id}/analytics",
            get(workspaces::workspace_analytics_handler),
        )
        .route(
            "/workspace/{workspace_id}/member/role",
            put(workspaces::change_member_role_handler),
        )
        .route(
            "/member/workspace/{invite_code}/join",
            post(members::join_workspace_handler),
        )
        .route(
            "/workspace/{workspace_id}/projects",
            post(projects::create_project_handler).get(projects::list_projects_handler),
        )
        .route(
            "/workspace/{workspace_id}/projects/{project_id}",
            get(projects::get_project_handler)
                .put(projects::update_project_handler)
                .delete(projects::delete_project_handler),
        )
        .route(
            "/workspace/{workspace_id}/projects/{project_id}/tasks",
            post(tasks::create_task_handler),
        )
        .route("/workspace/{workspace_id}/tasks", get(tasks::list_tasks_handler))
        .route(
            "/workspace/{workspace_id}/projects/{project_id}/tasks/{task_id}",
            get(tasks::get_task_handler).put(tasks::update_task_handler),
        )
        .route(
            "/workspace/{workspace_id}/tasks/{task_id}",
            delete(tasks::delete_task_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
