//! Service-layer flows between the HTTP handlers and `taskhub_core`.

pub mod auth;
pub mod cookies;
pub mod guard;
