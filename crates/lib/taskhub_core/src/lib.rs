//! # taskhub_core
//!
//! Core domain logic for Taskhub: token issuance and session
//! validation, role-based authorization, workspace membership, and the
//! transactional workspace/project/task lifecycle.

pub mod auth;
pub mod authz;
pub mod error;
pub mod members;
pub mod migrate;
pub mod models;
pub mod projects;
pub mod tasks;
pub mod uuid;
pub mod workspaces;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
