//! Router assembly.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::http::{agent, browser, monitoring, profile};
use crate::state::AppState;
use crate::websocket::ws_handler;

/// Build the API router.
///
/// ```text
/// POST   /interact                     - Parse and run a command on a pooled driver
/// POST   /extract                      - Run the data extractor
///
/// /config
///   POST|GET|DELETE /config/proxy
///   POST   /config/extension
///   DELETE /config/extension/{name}
///   GET    /config/extensions
///   POST|GET /config/user-agent
///   POST|GET /config/window-size
///   POST|DELETE /config/cookie
///   GET    /config/cookies
///
/// POST   /message                      - Dialog message
/// POST   /task                         - Schedule a task
/// GET    /tasks                        - List tasks
/// POST   /tasks/{task_id}/run          - Run a task now
/// DELETE /tasks/{task_id}              - Delete a task
/// GET|DELETE /conversation/{user_id}
/// GET|DELETE /memory/{user_id}
/// GET    /ws/{user_id}                 - WebSocket dialog
///
/// GET    /health
/// ```
pub fn create_router(state: Arc<AppState>) -> Router {
    let config_routes = Router::new()
        .route(
            "/proxy",
            post(profile::set_proxy)
                .get(profile::get_proxy)
                .delete(profile::disable_proxy),
        )
        .route("/extension", post(profile::add_extension))
        .route("/extension/{name}", delete(profile::remove_extension))
        .route("/extensions", get(profile::list_extensions))
        .route(
            "/user-agent",
            post(profile::set_user_agent).get(profile::get_user_agent),
        )
        .route(
            "/window-size",
            post(profile::set_window_size).get(profile::get_window_size),
        )
        .route(
            "/cookie",
            post(profile::add_cookie).delete(profile::remove_cookie),
        )
        .route("/cookies", get(profile::list_cookies));

    Router::new()
        .route("/interact", post(browser::interact))
        .route("/extract", post(browser::extract))
        .nest("/config", config_routes)
        .route("/message", post(agent::process_message))
        .route("/task", post(agent::schedule_task))
        .route("/tasks", get(agent::list_tasks))
        .route("/tasks/{task_id}/run", post(agent::run_task))
        .route("/tasks/{task_id}", delete(agent::delete_task))
        .route(
            "/conversation/{user_id}",
            get(agent::conversation_history).delete(agent::clear_conversation),
        )
        .route(
            "/memory/{user_id}",
            get(agent::user_memory).delete(agent::clear_memory),
        )
        .route("/ws/{user_id}", get(ws_handler))
        .route("/health", get(monitoring::health))
        .layer(middleware::from_fn_with_state(state.clone(), count_requests))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn count_requests(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    state.increment_requests();
    next.run(request).await
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
