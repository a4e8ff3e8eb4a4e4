// In-memory session store keyed by an opaque cookie token, with idle
// expiry swept on access. One GameSession per active player session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use uuid::Uuid;

use crate::engine::game::GameSession;

/// Cookie carrying the opaque session token.
pub const SESSION_COOKIE: &str = "retraction_session";

/// Mint a fresh opaque session token.
pub fn mint_token() -> String {
    Uuid::new_v4().to_string()
}

struct Entry {
    session: GameSession,
    touched: Instant,
}

/// Thread-safe in-memory session store. Entries idle longer than the TTL
/// are dropped on the next access; there is no background reaper.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, Entry>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Create or replace the session for `token`.
    pub fn put(&self, token: &str, session: GameSession) {
        let mut map = self.inner.lock().unwrap();
        let ttl = self.ttl;
        map.retain(|_, e| e.touched.elapsed() < ttl);
        map.insert(
            token.to_string(),
            Entry {
                session,
                touched: Instant::now(),
            },
        );
    }

    /// Run `f` against the live session for `token`, refreshing its idle
    /// timer. Returns None when the token has no live session.
    pub fn with<R>(&self, token: &str, f: impl FnOnce(&mut GameSession) -> R) -> Option<R> {
        let mut map = self.inner.lock().unwrap();
        let ttl = self.ttl;
        map.retain(|_, e| e.touched.elapsed() < ttl);
        let entry = map.get_mut(token)?;
        entry.touched = Instant::now();
        Some(f(&mut entry.session))
    }

    /// Number of live sessions (for diagnostics and tests).
    pub fn len(&self) -> usize {
        let mut map = self.inner.lock().unwrap();
        let ttl = self.ttl;
        map.retain(|_, e| e.touched.elapsed() < ttl);
        map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Axum extractor: SessionToken ─────────────────────────────────────

/// Extracts the session token cookie from the request. Rejects with a 400
/// client error when the cookie is missing: submitting without starting a
/// game is a contract violation, not a server fault.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        match jar.get(SESSION_COOKIE) {
            Some(cookie) => Ok(SessionToken(cookie.value().to_string())),
            None => Err((
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "no active game session; call /start_game first" })),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::story::fallback_story;

    fn store_with_ttl(ttl: Duration) -> SessionStore {
        SessionStore::new(ttl)
    }

    #[test]
    fn test_put_and_with_roundtrip() {
        let store = store_with_ttl(Duration::from_secs(60));
        store.put("tok", GameSession::start(fallback_story()));

        let round = store.with("tok", |s| s.round);
        assert_eq!(round, Some(1));
    }

    #[test]
    fn test_unknown_token_is_none() {
        let store = store_with_ttl(Duration::from_secs(60));
        assert_eq!(store.with("missing", |s| s.round), None);
    }

    #[test]
    fn test_mutation_persists_across_accesses() {
        let store = store_with_ttl(Duration::from_secs(60));
        store.put("tok", GameSession::start(fallback_story()));

        store.with("tok", |s| s.round = 5);
        assert_eq!(store.with("tok", |s| s.round), Some(5));
    }

    #[test]
    fn test_tokens_are_isolated() {
        let store = store_with_ttl(Duration::from_secs(60));
        store.put("a", GameSession::start(fallback_story()));
        store.put("b", GameSession::start(fallback_story()));

        store.with("a", |s| s.round = 9);
        assert_eq!(store.with("b", |s| s.round), Some(1));
    }

    #[test]
    fn test_put_replaces_existing_session() {
        let store = store_with_ttl(Duration::from_secs(60));
        store.put("tok", GameSession::start(fallback_story()));
        store.with("tok", |s| s.round = 7);

        store.put("tok", GameSession::start(fallback_story()));
        assert_eq!(store.with("tok", |s| s.round), Some(1));
    }

    #[test]
    fn test_idle_sessions_expire() {
        let store = store_with_ttl(Duration::from_millis(5));
        store.put("tok", GameSession::start(fallback_story()));
        assert_eq!(store.len(), 1);

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(store.with("tok", |s| s.round), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_access_refreshes_idle_timer() {
        let store = store_with_ttl(Duration::from_millis(50));
        store.put("tok", GameSession::start(fallback_story()));

        for _ in 0..4 {
            std::thread::sleep(Duration::from_millis(20));
            assert!(store.with("tok", |_| ()).is_some());
        }
    }

    #[test]
    fn test_minted_tokens_are_unique() {
        assert_ne!(mint_token(), mint_token());
    }
}
