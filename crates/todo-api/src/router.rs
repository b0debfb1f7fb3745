use std::any::Any;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::Router;
use infrastructure::{InMemoryTodoStore, TodoStore};
use shared::Config;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::handlers;

pub const TODOS_PATH: &str = "/api/todos";
pub const STATS_PATH: &str = "/stats/overview";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn TodoStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn TodoStore {
        self.store.as_ref()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryTodoStore::new()))
    }
}

/// Routes mounted under [`TODOS_PATH`]. A known path hit with an unsupported
/// method answers 405 with the usual `{ message }` body.
pub fn todo_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_todos)
                .post(handlers::create_todo)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            STATS_PATH,
            get(handlers::stats_overview).fallback(handlers::method_not_allowed),
        )
        .route(
            "/:id",
            get(handlers::get_todo)
                .put(handlers::update_todo)
                .delete(handlers::delete_todo)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/:id/toggle",
            patch(handlers::toggle_todo).fallback(handlers::method_not_allowed),
        )
}

/// Full application without CORS.
pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::service_info).fallback(handlers::method_not_allowed),
        )
        .nest(TODOS_PATH, todo_routes())
        .fallback(handlers::route_not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}

/// Full application with the CORS policy from `config`.
pub fn app(state: AppState, config: &Config) -> Router {
    app_with_state(state).layer(cors_layer(&config.cors_origins))
}

/// No configured origins allows any origin without credentials; otherwise only
/// the listed origins, with credentials.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return CorsLayer::new()
            .allow_origin(cors::Any)
            .allow_methods(cors::Any)
            .allow_headers(cors::Any);
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };

    ApiError::Internal(detail).into_response()
}
