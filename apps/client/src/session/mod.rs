//! Session Store — owns the token and identity lifecycle.
//!
//! `Unauthenticated → Validating → Authenticated`, torn down on logout or
//! on any token-invalidity detection. The invariant this module protects:
//! an identity is only ever present after a token validated over the
//! network in this process lifetime — a persisted token alone proves
//! nothing.

use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::clients::auth::AuthClient;
use crate::errors::{ApiError, AuthErrorKind, Result};
use crate::http::TokenCell;
use crate::models::Identity;
use crate::store::{keys, KeyValueStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Validating,
    Authenticated,
}

/// Outcome of restoring a persisted session at boot.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionBoot {
    /// No token on disk; nothing to validate.
    NoToken,
    /// The persisted token validated; the session is live.
    Authenticated(Identity),
    /// The token was rejected (or could not be validated); it has been
    /// cleared. The kind is for UI messaging only — every kind ends in
    /// the same `Unauthenticated` state.
    Rejected(AuthErrorKind),
}

struct Inner {
    state: SessionState,
    identity: Option<Identity>,
}

pub struct SessionStore {
    auth: AuthClient,
    store: Arc<dyn KeyValueStore>,
    token: TokenCell,
    inner: Mutex<Inner>,
}

impl SessionStore {
    pub fn new(auth: AuthClient, store: Arc<dyn KeyValueStore>, token: TokenCell) -> Self {
        Self {
            auth,
            store,
            token,
            inner: Mutex::new(Inner {
                state: SessionState::Unauthenticated,
                identity: None,
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().unwrap().state
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner.lock().unwrap().identity.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Boot-time restore: reads the persisted token and, if one exists,
    /// validates it via `GET /auth/me`. Any validation failure — auth
    /// rejection or the service being unreachable — clears the token and
    /// lands in `Unauthenticated`.
    pub async fn restore(&self) -> SessionBoot {
        let Some(token) = self.store.get(keys::TOKEN).await else {
            return SessionBoot::NoToken;
        };

        self.inner.lock().unwrap().state = SessionState::Validating;
        self.token.set(token);

        match self.auth.me().await {
            Ok(identity) => {
                self.commit(identity.clone()).await;
                info!("session restored for {}", identity.email);
                SessionBoot::Authenticated(identity)
            }
            Err(e) => {
                let kind = match e {
                    ApiError::Auth(kind) => kind,
                    other => {
                        warn!("token validation failed: {other}");
                        AuthErrorKind::AuthFailed
                    }
                };
                self.clear().await;
                SessionBoot::Rejected(kind)
            }
        }
    }

    /// Direct login, independent of prior state. On failure the error
    /// surfaces verbatim and the session ends `Unauthenticated` with no
    /// leftover token or identity from a previous sign-in.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity> {
        match self.auth.login(email, password).await {
            Ok(session) => {
                self.token.set(session.token.clone());
                self.store.set(keys::TOKEN, &session.token).await;
                self.commit(session.user.clone()).await;
                info!("logged in as {}", session.user.email);
                Ok(session.user)
            }
            Err(e) => {
                self.clear().await;
                Err(e)
            }
        }
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<Identity> {
        match self.auth.register(name, email, password, role).await {
            Ok(session) => {
                self.token.set(session.token.clone());
                self.store.set(keys::TOKEN, &session.token).await;
                self.commit(session.user.clone()).await;
                info!("registered {}", session.user.email);
                Ok(session.user)
            }
            Err(e) => {
                self.clear().await;
                Err(e)
            }
        }
    }

    /// Clears token and identity. The synchronizer clears the user-scoped
    /// cached collections; this module only owns the session keys.
    pub async fn logout(&self) {
        self.clear().await;
        info!("logged out");
    }

    /// Forced teardown after an authenticated call was rejected
    /// mid-session. Same transition as a failed boot-time validation.
    pub async fn invalidate(&self, kind: AuthErrorKind) {
        warn!("session invalidated ({}), signing out", kind.as_str());
        self.clear().await;
    }

    async fn commit(&self, identity: Identity) {
        if let Ok(raw) = serde_json::to_string(&identity) {
            self.store.set(keys::IDENTITY, &raw).await;
        }
        let mut inner = self.inner.lock().unwrap();
        inner.state = SessionState::Authenticated;
        inner.identity = Some(identity);
    }

    async fn clear(&self) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.state = SessionState::Unauthenticated;
            inner.identity = None;
        }
        self.token.clear();
        self.store.remove(keys::TOKEN).await;
        self.store.remove(keys::IDENTITY).await;
    }
}
