use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Identity, gating and data access.
pub mod auth;
pub mod config;
pub mod errors;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod moderation;
pub mod repository;
pub mod supabase;
pub mod views;

// Routers grouped by access decision (public, gated, moderation).
pub mod routes;
use routes::{gated, moderation as moderation_router, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use moderation::{ModeratorLookupState, ServiceRoleDirectory, ServiceRoleKey, UnconfiguredDirectory};
pub use repository::{PostgrestRepository, RepositoryState};
pub use views::Views;

/// ApiDoc
///
/// OpenAPI document for the JSON surface, served at `/api-docs/openapi.json`.
/// HTML pages are not part of it.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::get_session),
    components(schemas(models::SessionSummary, models::BanNotice)),
    tags(
        (name = "social-portal", description = "Session and access API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable per-process state.
///
/// The elevated moderator lookup is a private field with no `FromRef` impl: handlers cannot
/// extract it, and only `moderation::require_moderator` reads it.
#[derive(Clone)]
pub struct AppState {
    /// Row-level-scoped profile reads.
    pub repo: RepositoryState,
    /// Immutable configuration.
    pub config: AppConfig,
    /// Template engine for every HTML page.
    pub views: Views,
    pub(crate) moderators: ModeratorLookupState,
}

impl AppState {
    pub fn new(config: AppConfig, repo: RepositoryState, moderators: ModeratorLookupState) -> Self {
        Self {
            repo,
            config,
            views: Views::new(),
            moderators,
        }
    }
}

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for Views {
    fn from_ref(app_state: &AppState) -> Views {
        app_state.views.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles every route group, the moderation layout guard and the observability layers.
///
/// Access is decided per group rather than per handler: public pages carry no check, gated
/// pages evaluate their gate inside the handler, and the whole `/moderation` tree sits
/// behind one `route_layer`.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Swagger UI for the JSON surface.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: no identity needed.
        .merge(public::public_routes())
        // Gated Routes: the handler resolves the identity and runs its gate.
        .merge(gated::gated_routes())
        // Moderation section: the guard is attached inside so it covers every nested route.
        .nest(
            "/moderation",
            moderation_router::moderation_routes(state.clone()),
        )
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID generation (UUID per request).
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request span carrying that id, so gate logs correlate.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS, outermost
        .layer(cors)
}

/// trace_span_logger
///
/// Request span carrying method, uri and the `x-request-id` set by the layer above, so
/// every log line of one request (gate denials included) correlates.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
