//! Embedded web UI.
//!
//! The landing page doubles as the OAuth callback: Bungie.net redirects back
//! to it with `code` and `state`, the exchange and first profile run happen
//! server-side, and the browser is redirected to the bare path.

pub mod templates;

use axum::Router;
use axum::extract::{OriginalUri, Query, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use minijinja::{Environment, context};
use serde::Deserialize;
use tracing::{info, warn};

use crate::AppState;
use crate::bungie::CharacterClass;
use crate::error::AppError;
use crate::oauth::{CallbackOutcome, CallbackParams};

// ---------------------------------------------------------------------------
// Template engine
// ---------------------------------------------------------------------------

/// Build a minijinja environment with all embedded templates registered.
fn template_env() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| minijinja::AutoEscape::Html);
    env.add_template("layout", templates::LAYOUT)?;
    env.add_template("index", templates::INDEX)?;
    env.add_template("callback_error", templates::CALLBACK_ERROR)?;
    Ok(env)
}

/// Render a template by name with the given minijinja context.
fn render(template_name: &str, ctx: minijinja::Value) -> Response {
    let rendered = template_env().and_then(|env| {
        let html = env.get_template(template_name)?.render(ctx)?;
        Ok(html)
    });
    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            tracing::error!(template = template_name, error = %err, "Template render error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!(
                    "<h1>Template Error</h1><pre>{}</pre>",
                    html_escape(&err.to_string())
                )),
            )
                .into_response()
        }
    }
}

/// Minimal HTML entity escaping for error messages.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ---------------------------------------------------------------------------
// Public router builder
// ---------------------------------------------------------------------------

/// Build the web UI router.
pub fn build_web_router() -> Router<AppState> {
    Router::new()
        .route("/", get(index_page))
        .route("/callback", get(index_page))
        .route("/login", get(login))
        .route("/logout", get(logout))
        .route("/api/profile", get(api_profile))
        .route("/health", get(health))
}

// ---------------------------------------------------------------------------
// Page handlers
// ---------------------------------------------------------------------------

/// Landing page, or callback handling when the query carries one.
///
/// The raw query is parsed by hand so a malformed or partial redirect is
/// treated like any other page load instead of being rejected.
async fn index_page(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    RawQuery(query): RawQuery,
) -> Response {
    let params = CallbackParams::from_query(query.as_deref().unwrap_or_default());

    match state.callback.handle(&params, &state.session).await {
        CallbackOutcome::NotACallback => landing(&state),
        CallbackOutcome::Completed { profile, .. } => {
            if let Err(e) = &profile {
                warn!(error = %e, "Signed in, but the profile could not be loaded");
            }
            // Drop code and state from the address bar.
            Redirect::to(uri.path()).into_response()
        }
        CallbackOutcome::Failed(err) => {
            let description = err.description().map(str::to_string);
            let message = err.to_string();
            let status = AppError::from(err).status_code();
            let mut response = render(
                "callback_error",
                context! {
                    error => message,
                    description => description,
                },
            );
            *response.status_mut() = status;
            response
        }
    }
}

fn landing(state: &AppState) -> Response {
    let membership_id = match state.session.membership_id() {
        Ok(id) => id,
        Err(e) => return AppError::from(e).into_response(),
    };
    let classes: Vec<String> = CharacterClass::ALL.iter().map(ToString::to_string).collect();
    render(
        "index",
        context! {
            signed_in => membership_id.is_some(),
            membership_id => membership_id,
            classes => classes,
        },
    )
}

/// Start a login: store a fresh state token and send the browser to the
/// authorize endpoint.
async fn login(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let request = state.dispatcher.dispatch(&state.session)?;
    Ok(Redirect::to(&request.url))
}

/// Forget the stored credentials.
async fn logout(State(state): State<AppState>) -> Result<Redirect, AppError> {
    state.session.clear_credentials()?;
    info!("Signed out");
    Ok(Redirect::to("/"))
}

// ---------------------------------------------------------------------------
// JSON handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ProfileQuery {
    class: Option<String>,
}

/// Re-run the profile pipeline for the current selection.
async fn api_profile(
    State(state): State<AppState>,
    Query(query): Query<ProfileQuery>,
) -> Result<Response, AppError> {
    let class = query
        .class
        .as_deref()
        .map(str::parse::<CharacterClass>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    if let Some(class) = class {
        info!(%class, "Character class selected");
    }

    let profile = state.pipeline.run(&state.session).await?;
    Ok(axum::Json(serde_json::json!({
        "class": class,
        "profile": profile,
    }))
    .into_response())
}

/// Liveness plus a summary of the session.
async fn health(State(state): State<AppState>) -> Result<Response, AppError> {
    let signed_in = state.session.access_token()?.is_some();
    Ok(axum::Json(serde_json::json!({
        "status": "ok",
        "signed_in": signed_in,
        "pipeline": state.pipeline.last_state().to_string(),
        "storage": state.session.persistent().name(),
    }))
    .into_response())
}
