mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{pipeline, StubCompletion, StubEmbedder, StubIndex};
use ragchat::auth::CredentialGate;
use ragchat::config::UiConfig;
use ragchat::rag::synthesizer::SynthesisStrategy;
use ragchat::web::{router, AppState};
use secrecy::SecretString;
use tower::ServiceExt;

fn state_with(llm: std::sync::Arc<StubCompletion>) -> AppState {
    AppState::new(
        CredentialGate::new(Some(SecretString::new("s3cret".into()))),
        pipeline(
            StubEmbedder::new(),
            StubIndex::with_texts(&["Refunds are processed within 30 days."]),
            llm,
            SynthesisStrategy::Stuff,
        ),
        UiConfig::default(),
    )
}

async fn send(
    state: &AppState,
    req: Request<Body>,
) -> (StatusCode, axum::http::HeaderMap, String) {
    let resp = ServiceExt::<Request<Body>>::oneshot(router(state.clone()), req)
        .await
        .unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

fn get(cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/");
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn session_cookie(headers: &axum::http::HeaderMap) -> String {
    let raw = headers
        .get(header::SET_COOKIE)
        .expect("session cookie issued")
        .to_str()
        .unwrap();
    assert!(raw.contains("HttpOnly"));
    raw.split(';').next().unwrap().to_string()
}

async fn logged_in_cookie(state: &AppState) -> String {
    let (_, headers, _) = send(state, get(None)).await;
    let cookie = session_cookie(&headers);
    let (status, _, _) = send(
        state,
        post_form("/login", Some(&cookie), "username=talentwunder&password=s3cret"),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    cookie
}

#[tokio::test]
async fn first_visit_shows_login_and_sets_cookie() {
    let state = state_with(StubCompletion::replying("unused"));
    let (status, headers, body) = send(&state, get(None)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(session_cookie(&headers).starts_with("ragchat_session="));
    assert!(body.contains("<h1>Login</h1>"));
    assert!(!body.contains("Incorrect username or password."));
}

#[tokio::test]
async fn wrong_password_shows_error_and_stays_logged_out() {
    let state = state_with(StubCompletion::replying("unused"));
    let (_, headers, _) = send(&state, get(None)).await;
    let cookie = session_cookie(&headers);

    let (status, _, body) = send(
        &state,
        post_form("/login", Some(&cookie), "username=talentwunder&password=nope"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Incorrect username or password."));

    let (_, _, body) = send(&state, get(Some(&cookie))).await;
    assert!(body.contains("<h1>Login</h1>"));
}

#[tokio::test]
async fn login_then_ask_renders_transcript() {
    let llm = StubCompletion::replying("30 days");
    let state = state_with(llm.clone());
    let cookie = logged_in_cookie(&state).await;

    let (_, _, body) = send(&state, get(Some(&cookie))).await;
    assert!(body.contains("How can we help you today?"));

    let (status, headers, _) = send(
        &state,
        post_form("/ask", Some(&cookie), "query=What+is+the+refund+policy%3F"),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers.get(header::LOCATION).unwrap(), "/");

    let (_, _, body) = send(&state, get(Some(&cookie))).await;
    assert!(body.contains("What is the refund policy?"));
    assert!(body.contains("<p>30 days</p>"));
    assert_eq!(llm.calls().len(), 1);
}

#[tokio::test]
async fn empty_query_is_skipped_but_whitespace_is_answered() {
    let llm = StubCompletion::replying("30 days");
    let state = state_with(llm.clone());
    let cookie = logged_in_cookie(&state).await;

    let (status, _, _) = send(&state, post_form("/ask", Some(&cookie), "query=")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert!(llm.calls().is_empty());

    let (status, _, _) = send(&state, post_form("/ask", Some(&cookie), "query=+++")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(llm.calls().len(), 1);
}

#[tokio::test]
async fn logged_out_session_cannot_ask() {
    let llm = StubCompletion::replying("30 days");
    let state = state_with(llm.clone());
    let (_, headers, _) = send(&state, get(None)).await;
    let cookie = session_cookie(&headers);

    let (status, _, _) = send(&state, post_form("/ask", Some(&cookie), "query=hello")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert!(llm.calls().is_empty());
}

#[tokio::test]
async fn cookieless_ask_creates_no_session() {
    let llm = StubCompletion::replying("30 days");
    let state = state_with(llm.clone());

    let (status, headers, _) = send(&state, post_form("/ask", None, "query=hello")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert!(headers.get(header::SET_COOKIE).is_none());
    assert!(state.sessions.is_empty().await);
    assert!(llm.calls().is_empty());
}

#[tokio::test]
async fn idle_sessions_do_not_accumulate() {
    let state = state_with(StubCompletion::replying("unused")).with_session_idle(Duration::ZERO);

    for _ in 0..50 {
        let (status, _, _) = send(&state, get(None)).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(state.sessions.len().await, 1);
}

#[tokio::test]
async fn expired_session_is_logged_out() {
    let state = state_with(StubCompletion::replying("unused")).with_session_idle(Duration::ZERO);
    let cookie = logged_in_cookie(&state).await;

    let (_, headers, body) = send(&state, get(Some(&cookie))).await;
    assert!(body.contains("<h1>Login</h1>"));
    assert_ne!(session_cookie(&headers), cookie);
}

#[tokio::test]
async fn pipeline_failure_renders_error_page() {
    let state = state_with(StubCompletion::failing());
    let cookie = logged_in_cookie(&state).await;

    let (status, _, body) = send(&state, post_form("/ask", Some(&cookie), "query=hello")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Something went wrong"));

    let (_, _, body) = send(&state, get(Some(&cookie))).await;
    assert!(!body.contains("class=\"query\""));
}

#[tokio::test]
async fn sessions_are_isolated() {
    let state = state_with(StubCompletion::replying("30 days"));
    let alice = logged_in_cookie(&state).await;
    let (_, headers, _) = send(&state, get(None)).await;
    let bob = session_cookie(&headers);

    send(&state, post_form("/ask", Some(&alice), "query=refunds%3F")).await;

    let (_, _, body) = send(&state, get(Some(&bob))).await;
    assert!(body.contains("<h1>Login</h1>"));
    assert!(!body.contains("refunds?"));
}

#[tokio::test]
async fn health_is_ok() {
    let state = state_with(StubCompletion::replying("unused"));
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, _, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}
