use social_portal::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    moderation::{ModeratorLookupState, ServiceRoleDirectory, ServiceRoleKey, UnconfiguredDirectory},
    repository::{PostgrestRepository, RepositoryState},
    supabase::PostgrestClient,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point. Startup order matters: configuration decides the log format, and the
/// service-role key must be resolved (or startup aborted) before the router exists.
///
/// 1. Configuration (fail-fast outside `APP_ENV=local`).
/// 2. Logging filter and subscriber.
/// 3. Data-store clients for both trust levels.
/// 4. State assembly, bind and serve.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    // .env is read first so AppConfig sees it. Without APP_ENV=local this is production.
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise debug for this crate so gate denials show up.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "social_portal=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            // LOCAL: human-readable output.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: one JSON object per line for the log pipeline.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Data Store Initialization (Supabase REST gateway)
    // One HTTP client, shared by both trust levels. Credentials travel per request.
    let client = PostgrestClient::new(config.rest_url(), config.store_timeout)
        .expect("FATAL: Failed to build the data-store HTTP client.");

    // Row-level-scoped reads: anon key plus the caller's own token.
    let repo = Arc::new(PostgrestRepository::new(
        client.clone(),
        config.supabase_anon_key.clone(),
    )) as RepositoryState;

    // Elevated reads: the service-role key goes straight into the directory and nowhere else.
    let moderators: ModeratorLookupState = match ServiceRoleKey::load(&config.env) {
        Some(key) => Arc::new(ServiceRoleDirectory::new(client, key)),
        None => {
            tracing::warn!("SUPABASE_SERVICE_ROLE_KEY not set; moderation section will stay closed");
            Arc::new(UnconfiguredDirectory)
        }
    };

    // 4. Unified State Assembly and Server Startup
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(config, repo, moderators));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
