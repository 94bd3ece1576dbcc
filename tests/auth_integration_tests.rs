use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use social_portal::{
    AppConfig, AppState, UnconfiguredDirectory,
    auth::{AuthUser, Claims, CurrentUser, resolve_identity},
    config::Env,
    errors::StoreError,
    models::{AuthorizationRecord, Identity},
    repository::ProfileRepository,
};
use async_trait::async_trait;
use std::{sync::Arc, time::SystemTime};
use uuid::Uuid;

// --- Helpers ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: Uuid = Uuid::from_u128(1);

struct EmptyProfiles;

#[async_trait]
impl ProfileRepository for EmptyProfiles {
    async fn fetch_ban_record(
        &self,
        _identity: &Identity,
    ) -> Result<Option<AuthorizationRecord>, StoreError> {
        Ok(None)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn create_token_with(user_id: Uuid, exp: u64, aud: &str, secret: &str) -> String {
    let claims = Claims {
        sub: user_id,
        iat: unix_now() as usize,
        exp: exp as usize,
        aud: Some(aud.to_string()),
        email: Some("someone@example.com".to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn create_token(user_id: Uuid) -> String {
    create_token_with(user_id, unix_now() + 3600, "authenticated", TEST_JWT_SECRET)
}

fn create_config(env: Env) -> AppConfig {
    AppConfig {
        env,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    }
}

fn create_app_state(env: Env) -> AppState {
    AppState::new(
        create_config(env),
        Arc::new(EmptyProfiles),
        Arc::new(UnconfiguredDirectory),
    )
}

fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn with_bearer(token: &str) -> Parts {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    parts
}

// --- Tests ---

#[tokio::test]
async fn test_valid_bearer_token_resolves_identity() {
    let token = create_token(TEST_USER_ID);
    let app_state = create_app_state(Env::Production);
    let mut parts = with_bearer(&token);

    let CurrentUser(identity) = CurrentUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();

    let identity = identity.expect("token should resolve");
    assert_eq!(identity.id, TEST_USER_ID);
    // The caller's own token is kept for row-level-scoped reads.
    assert_eq!(identity.access_token.as_deref(), Some(token.as_str()));
}

#[tokio::test]
async fn test_cookie_token_resolves_identity() {
    let token = create_token(TEST_USER_ID);
    let config = create_config(Env::Production);

    let mut parts = get_request_parts(Method::GET, "/banned".parse().unwrap());
    parts.headers.insert(
        header::COOKIE,
        header::HeaderValue::from_str(&format!("theme=dark; sb-access-token={}", token)).unwrap(),
    );

    let identity = resolve_identity(&parts, &config).expect("cookie should resolve");
    assert_eq!(identity.id, TEST_USER_ID);
}

#[tokio::test]
async fn test_missing_credentials_is_anonymous_not_an_error() {
    let app_state = create_app_state(Env::Production);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let CurrentUser(identity) = CurrentUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();
    assert!(identity.is_none());
}

#[tokio::test]
async fn test_auth_user_rejects_missing_header() {
    let app_state = create_app_state(Env::Production);
    let mut parts = get_request_parts(Method::GET, "/api/session".parse().unwrap());

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_err());
    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_anonymous() {
    // Well past the default 60s leeway.
    let token = create_token_with(
        TEST_USER_ID,
        unix_now() - 600,
        "authenticated",
        TEST_JWT_SECRET,
    );
    let config = create_config(Env::Production);

    assert!(resolve_identity(&with_bearer(&token), &config).is_none());
}

#[tokio::test]
async fn test_wrong_secret_is_anonymous() {
    let token = create_token_with(
        TEST_USER_ID,
        unix_now() + 3600,
        "authenticated",
        "some-other-secret",
    );
    let config = create_config(Env::Production);

    assert!(resolve_identity(&with_bearer(&token), &config).is_none());
}

#[tokio::test]
async fn test_wrong_audience_is_anonymous() {
    let token = create_token_with(TEST_USER_ID, unix_now() + 3600, "anon", TEST_JWT_SECRET);
    let config = create_config(Env::Production);

    assert!(resolve_identity(&with_bearer(&token), &config).is_none());
}

#[tokio::test]
async fn test_local_bypass_success() {
    let mock_user_id = Uuid::new_v4();
    let app_state = create_app_state(Env::Local);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(&mock_user_id.to_string()).unwrap(),
    );

    let AuthUser(identity) = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();
    assert_eq!(identity.id, mock_user_id);
    assert!(identity.access_token.is_none());
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let mock_user_id = Uuid::new_v4();
    let app_state = create_app_state(Env::Production);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(&mock_user_id.to_string()).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_err());
    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[test]
fn test_identity_debug_redacts_token() {
    let identity = Identity::new(TEST_USER_ID, Some("secret-jwt".to_string()));
    let rendered = format!("{:?}", identity);
    assert!(!rendered.contains("secret-jwt"));
    assert!(rendered.contains("redacted"));
}
