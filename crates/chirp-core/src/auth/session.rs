use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use reqwest::header;
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::store::KeyValueStore;

/// Store key for the bearer token
pub const TOKEN_KEY: &str = "token";

/// Store key for the authenticated username
pub const USERNAME_KEY: &str = "username";

/// Current authentication state held by the client.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub username: String,
}

impl Session {
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
        }
    }
}

// Keep tokens out of logs and panic messages
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

/// Owns the session and the only policy for attaching and dropping it.
///
/// Every authorized request reads the token through `authorized_header` and
/// reports its outcome through `handle_response`. Persistence goes to the
/// injected `KeyValueStore`; a failing store is logged and otherwise
/// ignored so that the in-memory session always reflects the last call.
pub struct SessionManager {
    store: Box<dyn KeyValueStore>,
    data: RwLock<Option<Session>>,
}

impl SessionManager {
    /// Create an empty (unauthenticated) manager over `store`
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            data: RwLock::new(None),
        }
    }

    /// Restore a previously persisted session, if any.
    /// Returns true when a session was found.
    pub fn load(&self) -> bool {
        let token = match self.store.get(TOKEN_KEY) {
            Ok(Some(token)) => token,
            Ok(None) => {
                // A username without a token is not a session
                if let Err(e) = self.store.remove(USERNAME_KEY) {
                    warn!(error = %e, "Failed to remove orphaned username");
                }
                debug!("No persisted session found");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token");
                return false;
            }
        };

        let username = match self.store.get(USERNAME_KEY) {
            Ok(username) => username.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted username");
                String::new()
            }
        };

        debug!(username = %username, "Restored persisted session");
        *self.write() = Some(Session { token, username });
        true
    }

    /// Replace the current session. Last write wins.
    pub fn store(&self, token: impl Into<String>, username: impl Into<String>) {
        let session = Session::new(token, username);

        if let Err(e) = self.store.set(TOKEN_KEY, &session.token) {
            warn!(error = %e, "Failed to persist token");
        }
        if let Err(e) = self.store.set(USERNAME_KEY, &session.username) {
            warn!(error = %e, "Failed to persist username");
        }

        info!(username = %session.username, "Session stored");
        *self.write() = Some(session);
    }

    /// The active session, if any
    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    /// Drop the session from memory and from the store. Idempotent.
    pub fn clear(&self) {
        let previous = self.write().take();

        for key in [TOKEN_KEY, USERNAME_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!(error = %e, key, "Failed to remove persisted session key");
            }
        }

        if let Some(session) = previous {
            info!(username = %session.username, "Session cleared");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    pub fn state(&self) -> SessionState {
        if self.is_authenticated() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }

    /// Headers for an authorized request: `Authorization: Bearer <token>`.
    ///
    /// Fails with `Unauthenticated` when there is no session. Callers that
    /// can proceed anonymously should check `current()` instead.
    pub fn authorized_header(&self) -> Result<header::HeaderMap, ApiError> {
        let token = match self.read().as_ref() {
            Some(session) => session.token.clone(),
            None => return Err(ApiError::Unauthenticated),
        };

        let mut value = header::HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::InvalidToken)?;
        value.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value);
        Ok(headers)
    }

    /// Apply the expiry policy to the outcome of an authorized request.
    ///
    /// A 401 clears the session and becomes `SessionExpired`. Everything
    /// else, success or failure, is returned untouched.
    pub fn handle_response<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        match result {
            Err(ApiError::Unauthorized(detail)) => {
                warn!(detail = %detail, "Server rejected token, clearing session");
                self.clear();
                Err(ApiError::SessionExpired)
            }
            other => other,
        }
    }

    // A panic while holding the lock cannot leave the cell half-written,
    // so a poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.data.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.data.write().unwrap_or_else(|e| e.into_inner())
    }
}
