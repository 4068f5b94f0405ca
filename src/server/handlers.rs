//! Route handlers

use axum::extract::{Query, Request, State};
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tower::ServiceExt as _;
use tower_http::services::ServeFile;

use crate::auth::guards::{BearerTokenAuth, BrowserSessionAuth};
use crate::auth::identity::{PublicIdentity, UserIdentity};
use crate::auth::random_urlsafe;
use crate::auth::session::SessionData;
use crate::error::{ApiError, RelayError, Result};
use crate::server::{pages, AppState};

/// Query parameters Google appends to the redirect URI.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// `GET /`
pub async fn homepage(State(state): State<AppState>, request: Request) -> Response {
    tracing::info!("Serving homepage");
    ServeFile::new(state.public_dir.join("index.html"))
        .oneshot(request)
        .await
        .into_response()
}

/// `GET /auth/google` -- redirect to the consent screen.
///
/// The CSRF `state` travels in a short-lived cookie; nothing is stored for a
/// sign-in that is never completed.
pub async fn auth_google(
    State(state): State<AppState>,
) -> std::result::Result<Response, ApiError> {
    let nonce = random_urlsafe(16);
    let url = state.provider.authorization_url(&nonce)?;
    let cookie = state.sessions.issue_state(&nonce)?;

    tracing::info!("Redirecting to identity provider consent screen");
    let mut response = found(&url)?;
    response.headers_mut().append(SET_COOKIE, cookie);
    Ok(response)
}

/// `GET /auth/google/callback` -- finish the sign-in.
///
/// Any authentication failure sends the browser back to `/` without detail.
/// On success the token is registered, the browser session is established,
/// the desktop application is notified in the background, and a page that
/// returns to `/` is rendered. The `state` cookie is dropped either way, so a
/// `state` is good for one callback only.
pub async fn auth_google_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> std::result::Result<Response, ApiError> {
    let cleared_state = state.sessions.clear_state()?;
    let pending = state.sessions.pending_state(&headers);

    let identity = match complete_sign_in(&state, pending.as_deref(), params).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("OAuth2 callback: authentication failed: {:#}", e);
            let mut response = found("/")?;
            response.headers_mut().append(SET_COOKIE, cleared_state);
            return Ok(response);
        }
    };
    tracing::info!(
        user_id = %identity.id,
        display_name = %identity.display_name,
        email = %identity.email,
        "OAuth2 callback: user authenticated"
    );

    state.tokens.put(identity.clone()).await;

    let previous = state.sessions.current(&headers).await?;
    let data = SessionData {
        user: Some(identity.clone()),
    };
    let (_, cookie) = state
        .sessions
        .regenerate(previous.as_ref().map(|s| s.id.as_str()), data)
        .await?;

    state.notifier.spawn_notify(identity.token);

    let mut response = Html(pages::callback_page()).into_response();
    response.headers_mut().append(SET_COOKIE, cleared_state);
    response.headers_mut().append(SET_COOKIE, cookie);
    Ok(response)
}

async fn complete_sign_in(
    state: &AppState,
    pending: Option<&str>,
    params: CallbackParams,
) -> Result<UserIdentity> {
    if let Some(error) = params.error {
        return Err(RelayError::Authentication(format!("provider returned error: {error}")).into());
    }

    let expected = pending.ok_or_else(|| {
        RelayError::Authentication("no sign-in pending for this browser".to_string())
    })?;
    if params.state.as_deref() != Some(expected) {
        return Err(RelayError::Authentication("state mismatch in OAuth callback".to_string()).into());
    }

    let code = params
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| RelayError::Authentication("authorization code missing".to_string()))?;

    let grant = state.provider.exchange_code(&code).await?;
    Ok(UserIdentity::from_grant(grant))
}

/// `GET /user` -- identity from the browser session.
pub async fn session_user(BrowserSessionAuth(user): BrowserSessionAuth) -> Json<UserIdentity> {
    tracing::info!(user_id = %user.id, "User endpoint called");
    Json(user)
}

/// `GET /api/user` -- identity from a bearer token.
pub async fn api_user(BearerTokenAuth(user): BearerTokenAuth) -> Json<PublicIdentity> {
    Json(user.public())
}

/// `OPTIONS /api/user` that is not a CORS preflight. Preflights are answered
/// by the CORS layer before reaching the router.
pub async fn api_user_options() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// `GET /logout` -- end the browser session. Issued bearer tokens stay valid.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> std::result::Result<Response, ApiError> {
    let cleared = state.sessions.end(&headers).await?;
    tracing::info!("User logged out");

    let mut response = found("/")?;
    if let Some(cookie) = cleared {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    Ok(response)
}

/// 302 redirect. `axum::response::Redirect` only offers 303/307/308.
fn found(location: &str) -> std::result::Result<Response, ApiError> {
    let location = HeaderValue::from_str(location)
        .map_err(|e| RelayError::Provider(format!("invalid redirect location: {e}")))
        .map_err(anyhow::Error::from)?;
    Ok((StatusCode::FOUND, [(LOCATION, location)]).into_response())
}
