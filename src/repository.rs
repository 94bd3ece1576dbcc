use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    errors::StoreError,
    gate::BanGate,
    models::{AuthorizationRecord, Identity},
    supabase::{PostgrestClient, RowQuery},
};

pub const PROFILES_TABLE: &str = "profiles";

/// ProfileRepository
///
/// Row-level-scoped reads of the caller's own profile. Implementations must read with the
/// caller's credential, never an elevated one: whatever policy hides from the caller stays
/// hidden here too.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Ban attributes (`ban_reason`, `banned_until`) of the identity's profile row.
    async fn fetch_ban_record(
        &self,
        identity: &Identity,
    ) -> Result<Option<AuthorizationRecord>, StoreError>;
}

/// RepositoryState
///
/// The shared handle stored in `AppState`.
pub type RepositoryState = Arc<dyn ProfileRepository>;

/// PostgrestRepository
///
/// `ProfileRepository` backed by the Supabase REST gateway under the anon key.
pub struct PostgrestRepository {
    client: PostgrestClient,
    anon_key: String,
}

impl PostgrestRepository {
    pub fn new(client: PostgrestClient, anon_key: impl Into<String>) -> Self {
        Self {
            client,
            anon_key: anon_key.into(),
        }
    }
}

#[async_trait]
impl ProfileRepository for PostgrestRepository {
    /// Reads as the caller. Without an access token (local bypass) the read runs as the
    /// anon role, which policy will usually refuse, yielding `None`.
    async fn fetch_ban_record(
        &self,
        identity: &Identity,
    ) -> Result<Option<AuthorizationRecord>, StoreError> {
        let user_id = identity.id.to_string();
        let bearer = identity.access_token.as_deref().unwrap_or(&self.anon_key);

        self.client
            .fetch_one(
                RowQuery {
                    table: PROFILES_TABLE,
                    columns: BanGate::COLUMNS,
                    filter_column: "id",
                    filter_value: &user_id,
                },
                &self.anon_key,
                bearer,
            )
            .await
    }
}
