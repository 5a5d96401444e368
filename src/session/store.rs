use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::session::state::SessionState;
use crate::session::transcript::Transcript;

/// Cookie carrying the session id. Set without Max-Age, so it ends with the browser session.
pub const SESSION_COOKIE: &str = "ragchat_session";

/// Per-browser state: login flag plus transcript. Never persisted.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    state: SessionState,
    transcript: Transcript,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::LoggedOut,
            transcript: Transcript::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.is_logged_in()
    }

    pub fn log_in(&mut self) {
        if !self.state.is_logged_in() {
            tracing::info!(session = %self.id, "session logged in");
        }
        self.state = SessionState::LoggedIn;
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Held for a whole interaction, so one session never runs two queries at once.
pub type SessionHandle = Arc<Mutex<Session>>;

struct Slot {
    handle: SessionHandle,
    last_seen: Instant,
}

impl Slot {
    /// Idle past `ttl` and not held by any in-flight request.
    fn is_stale(&self, now: Instant, ttl: Duration) -> bool {
        Arc::strong_count(&self.handle) == 1 && now.duration_since(self.last_seen) >= ttl
    }
}

/// Live sessions keyed by cookie id. Sessions idle longer than the TTL are evicted.
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Slot>>,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_ttl,
        }
    }

    /// Returns the live session named by `cookie_value`, refreshing its idle clock.
    pub async fn get(&self, cookie_value: Option<&str>) -> Option<(Uuid, SessionHandle)> {
        let id = cookie_value.and_then(|v| Uuid::parse_str(v).ok())?;
        let mut sessions = self.sessions.lock().await;
        let now = Instant::now();
        let slot = sessions.get_mut(&id)?;
        if slot.is_stale(now, self.idle_ttl) {
            sessions.remove(&id);
            tracing::debug!(session = %id, "expired session presented");
            return None;
        }
        slot.last_seen = now;
        Some((id, slot.handle.clone()))
    }

    /// Like [`get`](Self::get), but creates a fresh session when the cookie is absent,
    /// malformed, unknown, or expired. The flag is `true` for a new session.
    pub async fn get_or_create(&self, cookie_value: Option<&str>) -> (Uuid, SessionHandle, bool) {
        if let Some((id, handle)) = self.get(cookie_value).await {
            return (id, handle, false);
        }

        let mut sessions = self.sessions.lock().await;
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, slot| !slot.is_stale(now, self.idle_ttl));
        let evicted = before - sessions.len();

        let session = Session::new();
        let id = session.id();
        let handle = Arc::new(Mutex::new(session));
        sessions.insert(
            id,
            Slot {
                handle: handle.clone(),
                last_seen: now,
            },
        );
        tracing::debug!(session = %id, evicted, total = sessions.len(), "session created");
        (id, handle, true)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
