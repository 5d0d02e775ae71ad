use std::{collections::HashMap, sync::Arc};

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session_token";

/// Per-browser session state. `authenticated` starts false and, once set,
/// is never cleared for the lifetime of the session.
#[derive(Clone, Debug)]
pub struct Session {
    pub token: Uuid,
    pub authenticated: bool,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    fn new(token: Uuid) -> Self {
        let now = Utc::now();
        Self {
            token,
            authenticated: false,
            username: None,
            created_at: now,
            last_seen: now,
        }
    }
}

/// In-memory session table shared by every request of the process.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub async fn start(&self) -> Session {
        let session = Session::new(Uuid::new_v4());
        let mut guard = self.inner.write().await;
        guard.insert(session.token, session.clone());
        session
    }

    /// Looks up a session and refreshes its `last_seen` timestamp.
    pub async fn touch(&self, token: Uuid) -> Option<Session> {
        let mut guard = self.inner.write().await;
        let session = guard.get_mut(&token)?;
        session.last_seen = Utc::now();
        Some(session.clone())
    }

    /// Marks the session authenticated. Returns false if the token is unknown.
    pub async fn authenticate(&self, token: Uuid, username: &str) -> bool {
        let mut guard = self.inner.write().await;
        match guard.get_mut(&token) {
            Some(session) => {
                session.authenticated = true;
                session.username = Some(username.to_string());
                session.last_seen = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Drops unauthenticated sessions idle since before `cutoff`.
    pub async fn purge_idle(&self, cutoff: DateTime<Utc>) -> usize {
        let mut guard = self.inner.write().await;
        let before = guard.len();
        guard.retain(|_, session| session.authenticated || session.last_seen >= cutoff);
        before - guard.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

pub fn session_token(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

pub fn session_cookie(token: Uuid) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

/// Resolves the session named by the cookie, starting a fresh one when the
/// cookie is missing or unknown. The returned jar carries the cookie.
pub async fn resolve_or_start(store: &SessionStore, jar: CookieJar) -> (CookieJar, Session) {
    if let Some(token) = session_token(&jar) {
        if let Some(session) = store.touch(token).await {
            return (jar, session);
        }
    }

    let session = store.start().await;
    let jar = jar.add(session_cookie(session.token));
    (jar, session)
}

/// Authenticates the session named by `token`. If it was purged after being
/// resolved, a replacement session is authenticated and set on the jar.
pub async fn sign_in(
    store: &SessionStore,
    jar: CookieJar,
    token: Uuid,
    username: &str,
) -> CookieJar {
    if store.authenticate(token, username).await {
        return jar;
    }

    let session = store.start().await;
    store.authenticate(session.token, username).await;
    jar.add(session_cookie(session.token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn new_sessions_start_unauthenticated() {
        let store = SessionStore::default();
        let session = store.start().await;
        assert!(!session.authenticated);
        assert!(session.username.is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn authentication_is_scoped_to_one_session() {
        let store = SessionStore::default();
        let first = store.start().await;
        let second = store.start().await;

        assert!(store.authenticate(first.token, "uzair1").await);

        let first = store.touch(first.token).await.expect("first session");
        let second = store.touch(second.token).await.expect("second session");
        assert!(first.authenticated);
        assert_eq!(first.username.as_deref(), Some("uzair1"));
        assert!(!second.authenticated);
    }

    #[tokio::test]
    async fn unknown_tokens_are_rejected() {
        let store = SessionStore::default();
        assert!(!store.authenticate(Uuid::new_v4(), "uzair1").await);
        assert!(store.touch(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn purge_keeps_authenticated_and_recent_sessions() {
        let store = SessionStore::default();
        let idle = store.start().await;
        let signed_in = store.start().await;
        store.authenticate(signed_in.token, "uzair2").await;

        let removed = store.purge_idle(Utc::now() + Duration::minutes(1)).await;

        assert_eq!(removed, 1);
        assert!(store.touch(idle.token).await.is_none());
        assert!(store.touch(signed_in.token).await.is_some());
    }

    #[tokio::test]
    async fn resolve_reuses_known_cookie_and_replaces_unknown_one() {
        let store = SessionStore::default();
        let (jar, session) = resolve_or_start(&store, CookieJar::new()).await;
        assert_eq!(session_token(&jar), Some(session.token));

        let (_, again) = resolve_or_start(&store, jar).await;
        assert_eq!(again.token, session.token);

        let stale = CookieJar::new().add(session_cookie(Uuid::new_v4()));
        let (jar, fresh) = resolve_or_start(&store, stale).await;
        assert_ne!(fresh.token, session.token);
        assert_eq!(session_token(&jar), Some(fresh.token));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn sign_in_keeps_a_live_session() {
        let store = SessionStore::default();
        let (jar, session) = resolve_or_start(&store, CookieJar::new()).await;

        let jar = sign_in(&store, jar, session.token, "uzair1").await;

        assert_eq!(session_token(&jar), Some(session.token));
        let signed_in = store.touch(session.token).await.expect("session");
        assert!(signed_in.authenticated);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn sign_in_replaces_a_session_purged_mid_login() {
        let store = SessionStore::default();
        let (jar, session) = resolve_or_start(&store, CookieJar::new()).await;
        store.purge_idle(Utc::now() + Duration::minutes(1)).await;
        assert_eq!(store.len().await, 0);

        let jar = sign_in(&store, jar, session.token, "uzair1").await;

        let token = session_token(&jar).expect("cookie");
        assert_ne!(token, session.token);
        let replacement = store.touch(token).await.expect("replacement session");
        assert!(replacement.authenticated);
        assert_eq!(replacement.username.as_deref(), Some("uzair1"));
    }
}
