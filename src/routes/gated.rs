use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Gated Router Module
///
/// Routes whose handler resolves the identity itself and evaluates a gate before rendering.
pub fn gated_routes() -> Router<AppState> {
    Router::new()
        // GET /banned
        // Ban notice. Rendered only while a ban is active; see `BanGate`.
        .route("/banned", get(handlers::banned_page))
        // GET /api/session
        // JSON view of the caller's session and ban state. 401 without a session.
        .route("/api/session", get(handlers::get_session))
}
