//! API server configuration.

use taskhub_core::auth::jwt::TokenKeys;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3200").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Access/refresh token signing secrets.
    pub token_keys: TokenKeys,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `BIND_ADDR` | `127.0.0.1:3200` |
    /// | `DATABASE_URL` | `postgres://localhost:5432/taskhub` |
    /// | `ACCESS_TOKEN_SECRET` / `REFRESH_TOKEN_SECRET` | generated & persisted to file |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3200".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/taskhub".into()),
            token_keys: TokenKeys::from_env(),
        }
    }
}
