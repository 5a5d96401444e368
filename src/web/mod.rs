pub mod handlers;
pub mod views;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::CredentialGate;
use crate::config::{UiConfig, DEFAULT_SESSION_IDLE_SECS};
use crate::errors::{RagChatError, RagChatResult};
use crate::rag::pipeline::AnswerPipeline;
use crate::session::SessionStore;

/// Everything a request handler needs; cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<CredentialGate>,
    pub pipeline: Arc<AnswerPipeline>,
    pub sessions: Arc<SessionStore>,
    pub ui: Arc<UiConfig>,
}

impl AppState {
    pub fn new(gate: CredentialGate, pipeline: AnswerPipeline, ui: UiConfig) -> Self {
        Self {
            gate: Arc::new(gate),
            pipeline: Arc::new(pipeline),
            sessions: Arc::new(SessionStore::new(Duration::from_secs(
                DEFAULT_SESSION_IDLE_SECS,
            ))),
            ui: Arc::new(ui),
        }
    }

    pub fn with_session_idle(mut self, ttl: Duration) -> Self {
        self.sessions = Arc::new(SessionStore::new(ttl));
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", post(handlers::login))
        .route("/ask", post(handlers::ask))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, bind: &str) -> RagChatResult<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "web UI listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

impl IntoResponse for RagChatError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        let page = views::error_page().unwrap_or_else(|_| "Something went wrong.".to_string());
        (StatusCode::INTERNAL_SERVER_ERROR, Html(page)).into_response()
    }
}
