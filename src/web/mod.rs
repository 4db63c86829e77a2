//! HTTP surface.
//!
//! Feeds are public under `/feed/`. Channel management lives under `/api`
//! behind a shared token passed as `?k=`.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
