use crate::{AppState, handlers, moderation::require_moderator};
use axum::{Router, middleware, routing::get};

/// Moderation Router Module
///
/// Nested under `/moderation`. The layout guard wraps every route here, including ones
/// added later, so no nested page can render for a non-moderator.
pub fn moderation_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::moderation_dashboard))
        .route("/{*rest}", get(handlers::moderation_section))
        .route_layer(middleware::from_fn_with_state(state, require_moderator))
}
