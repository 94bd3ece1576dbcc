//! Route access gates.
//!
//! Each gate is a pure function of (identity presence, authorization record, time or fetch
//! outcome) that yields a [`GateDecision`]. Nothing here performs I/O; the handlers resolve
//! the identity and fetch the record, then hand the pieces over.

use chrono::{DateTime, Utc};

use crate::{
    errors::{Denial, StoreError},
    models::{AuthorizationRecord, BanNotice, Identity},
};

pub const LOGIN_PATH: &str = "/login";
pub const FEED_PATH: &str = "/feed";

/// GateDecision
///
/// `Allow` renders the page; `RedirectTo` terminates rendering with a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    RedirectTo { path: String, denial: Denial },
}

impl GateDecision {
    pub fn redirect(path: impl Into<String>, denial: Denial) -> Self {
        GateDecision::RedirectTo {
            path: path.into(),
            denial,
        }
    }

    /// Redirect to the login page, carrying `return_path` so the visitor lands back here.
    pub fn login(return_path: &str) -> Self {
        Self::redirect(
            format!("{LOGIN_PATH}?redirect={return_path}"),
            Denial::Unauthenticated,
        )
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }

    pub fn redirect_path(&self) -> Option<&str> {
        match self {
            GateDecision::Allow => None,
            GateDecision::RedirectTo { path, .. } => Some(path),
        }
    }

    pub fn denial(&self) -> Option<Denial> {
        match self {
            GateDecision::Allow => None,
            GateDecision::RedirectTo { denial, .. } => Some(*denial),
        }
    }
}

/// FetchFailurePolicy
///
/// What a gate does when its authorization record cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailurePolicy {
    /// Treat the failure as an absent record.
    FailOpen,
    /// Keep the failure; the gate denies.
    FailClosed,
}

impl FetchFailurePolicy {
    /// Applies the policy to a fetch outcome. `FailOpen` never returns `Err`.
    pub fn settle<R>(self, fetched: Result<Option<R>, StoreError>) -> Result<Option<R>, StoreError> {
        match (self, fetched) {
            (_, Ok(record)) => Ok(record),
            (FetchFailurePolicy::FailOpen, Err(error)) => {
                tracing::warn!(%error, "authorization record fetch failed; treating as absent");
                Ok(None)
            }
            (FetchFailurePolicy::FailClosed, Err(error)) => Err(error),
        }
    }
}

/// BanGate
///
/// Guards the ban notice page. The page is only meaningful while a ban is in force, so
/// everyone else is sent back to the feed.
pub struct BanGate;

impl BanGate {
    pub const PAGE: &'static str = "/banned";
    pub const FALLBACK: &'static str = FEED_PATH;
    pub const COLUMNS: &'static [&'static str] = &["ban_reason", "banned_until"];
    pub const ON_FETCH_FAILURE: FetchFailurePolicy = FetchFailurePolicy::FailOpen;

    pub fn evaluate(
        identity: Option<&Identity>,
        record: Option<&AuthorizationRecord>,
        now: DateTime<Utc>,
    ) -> GateDecision {
        if identity.is_none() {
            return GateDecision::login(Self::PAGE);
        }

        match record {
            Some(record) if ban_active(record, now) => GateDecision::Allow,
            _ => GateDecision::redirect(Self::FALLBACK, Denial::BanInactive),
        }
    }
}

/// A ban is active when a reason is recorded and it has no end, or its end is still ahead.
pub fn ban_active(record: &AuthorizationRecord, now: DateTime<Utc>) -> bool {
    record.ban_reason.is_some() && record.banned_until.is_none_or(|until| until > now)
}

/// The notice for an active ban, `None` otherwise.
pub fn active_ban(record: &AuthorizationRecord, now: DateTime<Utc>) -> Option<BanNotice> {
    if !ban_active(record, now) {
        return None;
    }
    record.ban_reason.as_ref().map(|reason| BanNotice {
        reason: reason.clone(),
        banned_until: record.banned_until,
    })
}

/// ModeratorGate
///
/// Guards the moderation section layout and every route nested under it.
pub struct ModeratorGate;

impl ModeratorGate {
    pub const SECTION: &'static str = "/moderation";
    pub const FALLBACK: &'static str = "/";
    pub const COLUMNS: &'static [&'static str] = &["is_moderator"];
    pub const ON_FETCH_FAILURE: FetchFailurePolicy = FetchFailurePolicy::FailClosed;

    pub fn evaluate(
        identity: Option<&Identity>,
        record: Option<&AuthorizationRecord>,
        fetch_error: Option<&StoreError>,
    ) -> GateDecision {
        if identity.is_none() {
            return GateDecision::login(Self::SECTION);
        }
        if fetch_error.is_some() {
            return GateDecision::redirect(Self::FALLBACK, Denial::UpstreamFetchFailure);
        }

        match record {
            None => GateDecision::redirect(Self::FALLBACK, Denial::MissingRecord),
            Some(record) if !record.is_moderator() => {
                GateDecision::redirect(Self::FALLBACK, Denial::Unauthorized)
            }
            Some(_) => GateDecision::Allow,
        }
    }
}

/// Accepts `candidate` as a post-login destination only if it stays on this origin.
///
/// Browsers strip tab and newline characters from URLs before resolving them, so
/// `/\t/evil.example` would turn into the protocol-relative `//evil.example`. Any control
/// character rejects the path.
pub fn sanitize_return_path(candidate: Option<&str>) -> &str {
    match candidate {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.contains("://")
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => FEED_PATH,
    }
}
