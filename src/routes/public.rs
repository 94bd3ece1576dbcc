use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{any, get},
};

/// Public Router Module
///
/// Endpoints that render the same way for anonymous and signed-in visitors. The content of
/// feed, explore, messages and profile is assembled client-side against the data store, so
/// the server only ships the shell.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for the load balancer.
        .route("/health", get(|| async { "ok" }))
        .route("/", get(handlers::home_page))
        // GET /login?redirect=...
        // Gates send anonymous visitors here with the page they came from.
        .route("/login", get(handlers::login_page))
        .route("/feed", get(handlers::feed_page))
        .route("/explore", get(handlers::explore_page))
        .route("/messages", get(handlers::messages_page))
        .route("/profile", get(handlers::profile_page))
        // ANY /seed
        // Always the static "disabled" page, whatever the method or body.
        .route("/seed", any(handlers::seed_disabled))
}
