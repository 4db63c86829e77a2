//! Middleware for Web API.

pub mod auth;
pub mod cors;

pub use auth::{require_token, ApiToken};
pub use cors::create_cors_layer;
