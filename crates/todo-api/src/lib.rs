//! HTTP API (axum) for the todo app.
//!
//! All routes live under `/api/todos`; `GET /` reports service metadata. The
//! store is injected through [`AppState`] so tests can run against
//! [`infrastructure::InMemoryTodoStore`].

pub mod error;
pub mod handlers;
pub mod router;

pub use error::ApiError;
pub use router::{app, app_with_state, cors_layer, todo_routes, AppState};
