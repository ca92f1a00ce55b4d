//! HTTP request handlers.

pub mod auth;
pub mod members;
pub mod projects;
pub mod tasks;
pub mod users;
pub mod workspaces;
