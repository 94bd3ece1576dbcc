use std::{env, time::Duration};

/// AppConfig
///
/// Holds the non-secret runtime configuration of the portal. Loaded once at startup,
/// immutable afterwards, and pulled into handlers via `FromRef`.
///
/// The Supabase service-role key is deliberately absent from this struct: it is loaded
/// separately as a [`crate::moderation::ServiceRoleKey`] so that cloning the config into a
/// handler never hands that handler the elevated credential.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the local identity bypass and log format.
    pub env: Env,
    // Base URL of the Supabase project (REST lives under `/rest/v1`).
    pub supabase_url: String,
    // Public anon key, sent as `apikey` on every row-level-scoped request.
    pub supabase_anon_key: String,
    // HS256 secret used to validate Supabase-issued access tokens.
    pub jwt_secret: String,
    // Expected `aud` claim on access tokens.
    pub jwt_audience: String,
    // Address the HTTP server binds to.
    pub bind_addr: String,
    // Upper bound for a single data-store call. Timeouts live in the HTTP client, not the gates.
    pub store_timeout: Duration,
}

/// Env
///
/// Runtime context. `Local` enables the `x-user-id` development bypass and pretty logs.
/// `Production` is the default whenever `APP_ENV` does not say otherwise.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Env {
    /// Reads `APP_ENV`.
    ///
    /// Only an explicit `APP_ENV=local` selects `Local`. Unset, empty or unknown values
    /// (`staging`, `prod`, typos) all resolve to `Production`, so a deploy that forgets the
    /// variable gets fail-fast config loading and no `x-user-id` bypass.
    pub fn from_env() -> Self {
        match env::var("APP_ENV").as_deref() {
            Ok("local") => Env::Local,
            _ => Env::Production,
        }
    }
}

pub const DEFAULT_JWT_AUDIENCE: &str = "authenticated";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 5;
const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";
const LOCAL_SUPABASE_URL: &str = "http://localhost:54321";
const LOCAL_ANON_KEY: &str = "local-anon-key";

impl Default for AppConfig {
    /// Non-panicking values for test state setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            supabase_url: LOCAL_SUPABASE_URL.to_string(),
            supabase_anon_key: LOCAL_ANON_KEY.to_string(),
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            jwt_audience: DEFAULT_JWT_AUDIENCE.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            store_timeout: Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every setting from the environment.
    ///
    /// 1. Resolve `Env` first; it decides whether secrets may fall back to local values.
    /// 2. Read the Supabase triple (URL, anon key, JWT secret).
    /// 3. Read the optional knobs (audience, bind address, store timeout) with defaults.
    ///
    /// # Panics
    /// Panics in `Env::Production` when `SUPABASE_URL`, `SUPABASE_ANON_KEY` or
    /// `SUPABASE_JWT_SECRET` is missing. The process must not start half-configured.
    pub fn load() -> Self {
        let env = Env::from_env();

        let (supabase_url, supabase_anon_key, jwt_secret) = match env {
            Env::Production => (
                env::var("SUPABASE_URL").expect("FATAL: SUPABASE_URL required in prod"),
                env::var("SUPABASE_ANON_KEY").expect("FATAL: SUPABASE_ANON_KEY required in prod"),
                env::var("SUPABASE_JWT_SECRET")
                    .expect("FATAL: SUPABASE_JWT_SECRET must be set in production."),
            ),
            Env::Local => (
                env::var("SUPABASE_URL").unwrap_or_else(|_| LOCAL_SUPABASE_URL.to_string()),
                env::var("SUPABASE_ANON_KEY").unwrap_or_else(|_| LOCAL_ANON_KEY.to_string()),
                env::var("SUPABASE_JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
            ),
        };

        // A malformed timeout is not worth refusing to start over.
        let store_timeout = env::var("STORE_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(DEFAULT_STORE_TIMEOUT_SECS);

        Self {
            env,
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_anon_key,
            jwt_secret,
            jwt_audience: env::var("SUPABASE_JWT_AUDIENCE")
                .unwrap_or_else(|_| DEFAULT_JWT_AUDIENCE.to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            store_timeout: Duration::from_secs(store_timeout),
        }
    }

    /// PostgREST root for this project.
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.supabase_url)
    }
}
