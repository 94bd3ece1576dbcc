use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    auth::{AuthUser, CurrentUser},
    gate::{self, BanGate, GateDecision},
    models::{AuthorizationRecord, Identity, SessionSummary},
    repository::RepositoryState,
    views::{ViewResult, Views},
};

/// LoginQuery
///
/// `?redirect=` carries the page the visitor was turned away from.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub redirect: Option<String>,
}

/// render_or_redirect
///
/// The Page Renderer: runs `render` on `Allow`, otherwise issues a temporary redirect
/// and renders nothing.
pub fn render_or_redirect(decision: GateDecision, render: impl FnOnce() -> Response) -> Response {
    match decision {
        GateDecision::Allow => render(),
        GateDecision::RedirectTo { path, denial } => {
            tracing::debug!(%denial, to = %path, "gate redirect");
            Redirect::temporary(&path).into_response()
        }
    }
}

/// Row-level-scoped ban lookup under the ban gate's fail-open policy.
async fn ban_record(repo: &RepositoryState, identity: &Identity) -> Option<AuthorizationRecord> {
    let fetched = repo.fetch_ban_record(identity).await;
    BanGate::ON_FETCH_FAILURE.settle(fetched).ok().flatten()
}

/// banned_page
///
/// `GET /banned`. Shows the ban notice while a ban is in force; sends everyone else to the
/// feed and anonymous visitors to login.
pub async fn banned_page(
    CurrentUser(identity): CurrentUser,
    State(repo): State<RepositoryState>,
    State(views): State<Views>,
) -> Response {
    let record = match identity.as_ref() {
        Some(identity) => ban_record(&repo, identity).await,
        None => None,
    };
    let now = Utc::now();

    let decision = BanGate::evaluate(identity.as_ref(), record.as_ref(), now);
    render_or_redirect(decision, || {
        match record.as_ref().and_then(|record| gate::active_ban(record, now)) {
            Some(notice) => views.banned(&notice).into_response(),
            None => Redirect::temporary(BanGate::FALLBACK).into_response(),
        }
    })
}

/// get_session
///
/// [Authenticated Route] The caller's id and, when one is in force, their ban.
/// Reads with the caller's own credential only.
#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Current session", body = SessionSummary),
        (status = 401, description = "No valid session")
    )
)]
pub async fn get_session(
    AuthUser(identity): AuthUser,
    State(repo): State<RepositoryState>,
) -> Json<SessionSummary> {
    let ban = ban_record(&repo, &identity)
        .await
        .and_then(|record| gate::active_ban(&record, Utc::now()));

    Json(SessionSummary {
        user_id: identity.id,
        ban,
    })
}

/// login_page
///
/// `GET /login`. Only same-origin return paths survive; anything else falls back to the feed.
pub async fn login_page(
    State(views): State<Views>,
    Query(query): Query<LoginQuery>,
) -> ViewResult {
    views.login(gate::sanitize_return_path(query.redirect.as_deref()))
}

pub async fn home_page() -> Redirect {
    Redirect::temporary(gate::FEED_PATH)
}

pub async fn feed_page(State(views): State<Views>) -> ViewResult {
    views.shell("Feed", "feed")
}

pub async fn explore_page(State(views): State<Views>) -> ViewResult {
    views.shell("Explore", "explore-gallery")
}

pub async fn messages_page(State(views): State<Views>) -> ViewResult {
    views.shell("Messages", "chat")
}

pub async fn profile_page(State(views): State<Views>) -> ViewResult {
    views.shell("Profile", "profile")
}

/// seed_disabled
///
/// `/seed`, any method. Seeding is switched off; the input is ignored.
pub async fn seed_disabled(State(views): State<Views>) -> ViewResult {
    views.seeding_disabled()
}

pub async fn moderation_dashboard(State(views): State<Views>) -> ViewResult {
    views.moderation_section("dashboard")
}

/// Nested moderation pages. Only reached after `require_moderator` allowed the request.
pub async fn moderation_section(
    State(views): State<Views>,
    Path(rest): Path<String>,
) -> ViewResult {
    let section = rest.split('/').next().unwrap_or_default();
    views.moderation_section(section)
}
