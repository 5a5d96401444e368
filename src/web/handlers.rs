use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::errors::RagChatResult;
use crate::session::{SessionHandle, SESSION_COOKIE};
use crate::web::views::{self, LOGIN_FAILED};
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub query: String,
}

/// Resolves the caller's session, issuing a cookie when a new one is created.
async fn session_for(state: &AppState, jar: CookieJar) -> (CookieJar, SessionHandle) {
    let presented = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let (id, handle, created) = state.sessions.get_or_create(presented.as_deref()).await;
    if !created {
        return (jar, handle);
    }
    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (jar.add(cookie), handle)
}

pub async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
) -> RagChatResult<(CookieJar, Html<String>)> {
    let (jar, handle) = session_for(&state, jar).await;
    let session = handle.lock().await;
    let page = if session.is_logged_in() {
        views::chat_page(&state.ui, session.transcript())?
    } else {
        views::login_page(None)?
    };
    Ok((jar, Html(page)))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> RagChatResult<Response> {
    let (jar, handle) = session_for(&state, jar).await;

    if state.gate.authenticate(&form.username, &form.password) {
        handle.lock().await.log_in();
        return Ok((jar, Redirect::to("/")).into_response());
    }

    tracing::warn!(username = %form.username, "login rejected");
    let page = views::login_page(Some(LOGIN_FAILED))?;
    Ok((StatusCode::UNAUTHORIZED, jar, Html(page)).into_response())
}

pub async fn ask(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<AskForm>,
) -> RagChatResult<(CookieJar, Redirect)> {
    let presented = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let Some((id, handle)) = state.sessions.get(presented.as_deref()).await else {
        tracing::debug!("query without a live session ignored");
        return Ok((jar, Redirect::to("/")));
    };
    let mut session = handle.lock().await;

    if !session.is_logged_in() {
        tracing::debug!(session = %id, "query from logged-out session ignored");
        return Ok((jar, Redirect::to("/")));
    }
    if form.query.is_empty() {
        return Ok((jar, Redirect::to("/")));
    }

    tracing::info!(session = %id, query_len = form.query.len(), "answering query");
    state
        .pipeline
        .answer(&form.query, session.transcript_mut())
        .await?;
    Ok((jar, Redirect::to("/")))
}

pub async fn health() -> &'static str {
    "ok"
}
