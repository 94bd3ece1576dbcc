//! Server-rendered HTML.
//!
//! Templates are rendered through [`Handlebars`], whose default escape function covers every
//! `{{value}}` interpolation. Page bodies are rendered first and then placed into [`LAYOUT`]
//! with a triple-stash, which is the only raw insertion.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use handlebars::{Handlebars, RenderError};
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;

use crate::models::BanNotice;

const LAYOUT: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>{{title}}</title></head>
<body>
<main>
{{{body}}}
</main>
</body>
</html>
"#;

const BANNED: &str = r#"<h1>Your account has been suspended</h1>
<p class="ban-reason">Reason: {{reason}}</p>
{{#if until}}
<p class="ban-until">Your ban ends <time datetime="{{until.iso}}">{{until.display}}</time>.</p>
{{else}}
<p class="ban-until">This ban is permanent.</p>
{{/if}}"#;

const LOGIN: &str = r#"<h1>Sign in</h1>
<form method="post" action="/auth/sign-in">
<input type="hidden" name="redirect" value="{{redirect}}">
<input type="email" name="email" required>
<input type="password" name="password" required>
<button type="submit">Sign in</button>
</form>"#;

const SHELL: &str = r#"<h1>{{title}}</h1>
<div id="{{mount_id}}"></div>"#;

const MODERATION: &str = r#"<h1>Moderation</h1>
<nav>{{#each links}}<a href="{{this.href}}">{{this.label}}</a> {{/each}}</nav>
<section id="moderation-{{section}}"></section>"#;

const SEEDING_DISABLED: &str = r#"<h1>Seeding disabled</h1>
<p>Database seeding is not available on this deployment.</p>"#;

/// ViewError
///
/// A template failed to render. Surfaces as a bare 500; the template source never reaches
/// the visitor.
#[derive(Debug, Error)]
#[error("template render failed: {0}")]
pub struct ViewError(#[from] RenderError);

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "page render failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

pub type ViewResult = Result<Html<String>, ViewError>;

/// Views
///
/// Shared template engine, cloned into handlers through `FromRef<AppState>`.
#[derive(Clone)]
pub struct Views {
    handlebars: Arc<Handlebars<'static>>,
}

impl Default for Views {
    fn default() -> Self {
        Self::new()
    }
}

impl Views {
    pub fn new() -> Self {
        Self {
            handlebars: Arc::new(Handlebars::new()),
        }
    }

    fn render_template(&self, template: &str, data: &Value) -> Result<String, ViewError> {
        Ok(self.handlebars.render_template(template, data)?)
    }

    /// Renders `template` with `data` and wraps the result in the shared document layout.
    fn page(&self, title: &str, template: &str, data: &Value) -> ViewResult {
        let body = self.render_template(template, data)?;
        let document = self.render_template(LAYOUT, &json!({ "title": title, "body": body }))?;
        Ok(Html(document))
    }

    pub fn banned(&self, notice: &BanNotice) -> ViewResult {
        let until = notice.banned_until.map(|at| {
            json!({
                "iso": at.to_rfc3339(),
                "display": format_timestamp(at),
            })
        });

        self.page(
            "Account suspended",
            BANNED,
            &json!({ "reason": notice.reason, "until": until }),
        )
    }

    pub fn login(&self, return_path: &str) -> ViewResult {
        self.page("Sign in", LOGIN, &json!({ "redirect": return_path }))
    }

    /// Static shell for pages whose content is assembled client-side.
    pub fn shell(&self, title: &str, mount_id: &str) -> ViewResult {
        self.page(
            title,
            SHELL,
            &json!({ "title": title, "mount_id": mount_id }),
        )
    }

    pub fn moderation_section(&self, section: &str) -> ViewResult {
        let links = json!([
            { "href": "/moderation", "label": "Dashboard" },
            { "href": "/moderation/reports", "label": "Reports" },
            { "href": "/moderation/users", "label": "Users" },
        ]);
        self.page(
            "Moderation",
            MODERATION,
            &json!({ "section": section, "links": links }),
        )
    }

    pub fn seeding_disabled(&self) -> ViewResult {
        self.page("Seeding disabled", SEEDING_DISABLED, &json!({}))
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}
