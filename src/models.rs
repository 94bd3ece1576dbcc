use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

/// Identity
///
/// The resolved session identity of one request. Never persisted.
#[derive(Clone, PartialEq)]
pub struct Identity {
    /// `auth.users.id`, also the primary key of `public.profiles`.
    pub id: Uuid,
    /// The caller's own access token. Row-level-scoped reads are made with it so the data
    /// store applies the same policies the browser would get. `None` for the local bypass.
    pub access_token: Option<String>,
}

impl Identity {
    pub fn new(id: Uuid, access_token: Option<String>) -> Self {
        Self { id, access_token }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// AuthorizationRecord
///
/// The gating attributes of a `public.profiles` row. Each gate selects only the columns it
/// needs, so every field is optional and missing columns decode to `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AuthorizationRecord {
    pub ban_reason: Option<String>,
    pub banned_until: Option<DateTime<Utc>>,
    pub is_moderator: Option<bool>,
}

impl AuthorizationRecord {
    /// True only for an explicit `is_moderator = true`.
    pub fn is_moderator(&self) -> bool {
        self.is_moderator.unwrap_or(false)
    }
}

/// BanNotice
///
/// What the `/banned` page and the session API show about an active ban.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct BanNotice {
    pub reason: String,
    /// `None` means the ban is permanent.
    #[ts(type = "string | null")]
    pub banned_until: Option<DateTime<Utc>>,
}

impl BanNotice {
    pub fn is_permanent(&self) -> bool {
        self.banned_until.is_none()
    }
}

/// SessionSummary
///
/// Response of `GET /api/session`: who the caller is and whether a ban applies to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionSummary {
    pub user_id: Uuid,
    pub ban: Option<BanNotice>,
}
