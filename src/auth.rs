use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    models::Identity,
};

/// Cookie the Supabase auth helpers store the access token in.
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
/// Development-only header naming the user id directly.
pub const LOCAL_USER_HEADER: &str = "x-user-id";

/// Claims
///
/// The subset of a Supabase access token this service relies on.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): `auth.users.id`.
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
    /// Audience (aud): `authenticated` for signed-in users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// resolve_identity
///
/// The Identity Resolver. Returns `None` for anonymous visitors and for any token that
/// fails validation; an invalid session is indistinguishable from no session.
///
/// Sources, in order:
/// 1. `x-user-id` header, only in `Env::Local` (which requires an explicit `APP_ENV=local`).
///    The resulting identity has no access token and is never enough for the moderation
///    section, which needs a verified token before any service-role read.
/// 2. `Authorization: Bearer <jwt>`.
/// 3. The `sb-access-token` cookie.
///
/// A bearer header wins over the cookie; the cookie is only read when no header is present.
pub fn resolve_identity(parts: &Parts, config: &AppConfig) -> Option<Identity> {
    // 1. Development bypass
    if config.env == Env::Local {
        let bypass = parts
            .headers
            .get(LOCAL_USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| Uuid::parse_str(raw).ok());
        if let Some(user_id) = bypass {
            return Some(Identity::new(user_id, None));
        }
    }

    // 2./3. Header, then cookie
    let token = bearer_token(parts).or_else(|| {
        CookieJar::from_headers(&parts.headers)
            .get(ACCESS_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
    })?;

    let claims = validate_token(&token, config)?;
    Some(Identity::new(claims.sub, Some(token)))
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Decodes and validates an HS256 access token against the project secret and audience.
pub fn validate_token(token: &str, config: &AppConfig) -> Option<Claims> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.set_audience(&[config.jwt_audience.as_str()]);

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("access token expired"),
                other => tracing::debug!(error = ?other, "access token rejected"),
            }
            None
        }
    }
}

/// CurrentUser
///
/// Extractor for pages that decide for themselves what to do with anonymous visitors
/// (the gates). Never rejects.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<Identity>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        Ok(CurrentUser(resolve_identity(parts, &config)))
    }
}

/// AuthUser
///
/// Extractor for JSON endpoints that require a session. Rejects with 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        resolve_identity(parts, &config)
            .map(AuthUser)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
