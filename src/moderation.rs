//! Elevated moderator lookup and the moderation section guard.
//!
//! Deciding whether a visitor may see moderator data requires reading moderator data, which
//! row-level policy may hide from that same visitor. The lookup therefore runs under the
//! service-role key. That key is wrapped in [`ServiceRoleKey`], owned by a
//! [`ServiceRoleDirectory`], and the directory is only reachable from [`require_moderator`].

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::{env, fmt, sync::Arc};
use uuid::Uuid;

use crate::{
    AppState,
    auth::CurrentUser,
    config::Env,
    errors::StoreError,
    gate::{GateDecision, ModeratorGate},
    models::AuthorizationRecord,
    repository::PROFILES_TABLE,
    supabase::{PostgrestClient, RowQuery},
};

/// ServiceRoleKey
///
/// The Supabase service-role key. Not `Clone`, not serializable, redacted in `Debug`.
pub struct ServiceRoleKey(String);

impl ServiceRoleKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// load
    ///
    /// Reads `SUPABASE_SERVICE_ROLE_KEY`.
    ///
    /// # Panics
    /// Panics in `Env::Production` when the variable is missing. Locally a missing key
    /// yields `None` and the moderation section stays closed.
    pub fn load(env: &Env) -> Option<Self> {
        match (env, env::var("SUPABASE_SERVICE_ROLE_KEY")) {
            (_, Ok(key)) if !key.is_empty() => Some(Self(key)),
            (Env::Production, _) => {
                panic!("FATAL: SUPABASE_SERVICE_ROLE_KEY required in prod")
            }
            (Env::Local, _) => None,
        }
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ServiceRoleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServiceRoleKey(<redacted>)")
    }
}

/// ModeratorLookup
///
/// Reads the `is_moderator` flag of any profile, bypassing row-level policy.
#[async_trait]
pub trait ModeratorLookup: Send + Sync {
    async fn fetch_moderator_record(
        &self,
        user_id: Uuid,
    ) -> Result<Option<AuthorizationRecord>, StoreError>;
}

pub type ModeratorLookupState = Arc<dyn ModeratorLookup>;

/// ServiceRoleDirectory
///
/// `ModeratorLookup` over the Supabase REST gateway with the service-role key as both
/// `apikey` and bearer.
pub struct ServiceRoleDirectory {
    client: PostgrestClient,
    key: ServiceRoleKey,
}

impl ServiceRoleDirectory {
    pub fn new(client: PostgrestClient, key: ServiceRoleKey) -> Self {
        Self { client, key }
    }
}

impl fmt::Debug for ServiceRoleDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRoleDirectory")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ModeratorLookup for ServiceRoleDirectory {
    async fn fetch_moderator_record(
        &self,
        user_id: Uuid,
    ) -> Result<Option<AuthorizationRecord>, StoreError> {
        let user_id = user_id.to_string();
        self.client
            .fetch_one(
                RowQuery {
                    table: PROFILES_TABLE,
                    columns: ModeratorGate::COLUMNS,
                    filter_column: "id",
                    filter_value: &user_id,
                },
                self.key.expose(),
                self.key.expose(),
            )
            .await
    }
}

/// UnconfiguredDirectory
///
/// Stand-in used when no service-role key is available. Every lookup fails, so the
/// moderator gate fails closed.
#[derive(Debug, Default)]
pub struct UnconfiguredDirectory;

#[async_trait]
impl ModeratorLookup for UnconfiguredDirectory {
    async fn fetch_moderator_record(
        &self,
        _user_id: Uuid,
    ) -> Result<Option<AuthorizationRecord>, StoreError> {
        Err(StoreError::MissingServiceCredential)
    }
}

/// require_moderator
///
/// Layout guard for the moderation section. Applied with `middleware::from_fn_with_state`
/// so it runs before every nested route; nested handlers only execute on `Allow`.
///
/// Flow:
/// 1. Resolve the identity. Only identities backed by a validated access token count here;
///    the local `x-user-id` bypass carries no token and is treated as anonymous, so an
///    unverified header can never drive a service-role read.
/// 2. Look up the moderator flag through the elevated directory.
/// 3. Settle the fetch under the fail-closed policy and evaluate the gate.
/// 4. Run the nested route on `Allow`, otherwise redirect.
pub async fn require_moderator(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    request: Request,
    next: Next,
) -> Response {
    // 1. Token-backed identities only
    let identity = identity.filter(|identity| {
        let verified = identity.access_token.is_some();
        if !verified {
            tracing::debug!(user_id = %identity.id, "unverified identity at moderation guard");
        }
        verified
    });

    let mut record = None;
    let mut fetch_error = None;

    // 2. Elevated lookup; anonymous visitors never reach it
    if let Some(identity) = identity.as_ref() {
        let fetched = state.moderators.fetch_moderator_record(identity.id).await;
        match ModeratorGate::ON_FETCH_FAILURE.settle(fetched) {
            Ok(found) => record = found,
            Err(error) => {
                tracing::error!(user_id = %identity.id, %error, "moderator lookup failed");
                fetch_error = Some(error);
            }
        }
    }

    // 3./4. Decide and act
    match ModeratorGate::evaluate(identity.as_ref(), record.as_ref(), fetch_error.as_ref()) {
        GateDecision::Allow => next.run(request).await,
        GateDecision::RedirectTo { path, denial } => {
            tracing::debug!(%denial, to = %path, "moderation section denied");
            Redirect::temporary(&path).into_response()
        }
    }
}
