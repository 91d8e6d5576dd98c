//! Session store: who is logged in.
//!
//! State lives in a [`SessionHandle`] shared with the gateway, so a 401 from
//! any endpoint can clear it. [`SessionStore`] holds the actions that talk to
//! the auth service.

mod cache;

use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

pub use cache::{CachedSession, FileSessionCache, MemorySessionCache, SessionCache, SessionCacheError};

use crate::cookies::ACCESS_TOKEN_COOKIE;
use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::models::{AuthResponse, LoginRequest, ProfileUpdate, RegisterRequest, Registration, User};

/// Where the session bootstrap stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Not yet confirmed by the server; state may come from the cache.
    #[default]
    Loading,
    /// The server confirmed the user.
    Resolved,
    /// Nobody is logged in.
    Unauthenticated,
}

/// Snapshot of the session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub user: Option<User>,
    pub authenticated: bool,
    pub status: SessionStatus,
}

/// Shared, lock-protected session state plus its cache.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionHandleInner>,
}

struct SessionHandleInner {
    state: RwLock<SessionState>,
    cache: Arc<dyn SessionCache>,
}

impl SessionHandle {
    /// Start in `Loading` with nothing restored yet.
    #[must_use]
    pub fn new(cache: Arc<dyn SessionCache>) -> Self {
        Self {
            inner: Arc::new(SessionHandleInner {
                state: RwLock::new(SessionState::default()),
                cache,
            }),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.inner.state.read().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.read().authenticated
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.inner.state.read().user.clone()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.inner.state.read().status
    }

    /// Local-only reset: no user, not authenticated, cache forgotten.
    pub fn clear_auth(&self) {
        self.reset_state();
        if let Err(e) = self.inner.cache.clear() {
            tracing::warn!(error = %e, "Failed to clear session cache");
        }
    }

    /// Reset in-memory state only; the cached entry survives for the next run.
    fn reset_state(&self) {
        let mut state = self.inner.state.write();
        state.user = None;
        state.authenticated = false;
        state.status = SessionStatus::Unauthenticated;
    }

    pub(crate) fn set_user(&self, user: User) {
        let mut state = self.inner.state.write();
        state.user = Some(user);
        state.authenticated = true;
        state.status = SessionStatus::Resolved;
    }

    /// Apply a cached session while still `Loading`.
    fn restore(&self, cached: &CachedSession) {
        let mut state = self.inner.state.write();
        state.user.clone_from(&cached.user);
        state.authenticated = cached.authenticated;
        state.status = SessionStatus::Loading;
    }

    fn cache(&self) -> &dyn SessionCache {
        self.inner.cache.as_ref()
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}

/// Auth actions on top of the shared session state.
#[derive(Debug, Clone)]
pub struct SessionStore {
    gateway: ApiGateway,
}

impl SessionStore {
    #[must_use]
    pub const fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    fn handle(&self) -> &SessionHandle {
        self.gateway.session()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.handle().snapshot()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.handle().is_authenticated()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.handle().user()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.handle().status()
    }

    /// Restore the cached session and confirm it with the server.
    ///
    /// Without a stored token this resolves to `Unauthenticated` without a
    /// request. An unreadable cache is logged and treated as empty.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> SessionStatus {
        let cached = self.handle().cache().load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring unreadable session cache");
            None
        });

        if let Some(cached) = cached.filter(|c| c.authenticated) {
            self.handle().restore(&cached);
            if let Some(token) = cached.access_token {
                self.gateway
                    .cookies()
                    .set(ACCESS_TOKEN_COOKIE, SecretString::from(token));
            }
        }

        if self.gateway.cookies().get(ACCESS_TOKEN_COOKIE).is_none() {
            tracing::debug!("No access token, session is anonymous");
            self.handle().clear_auth();
            return SessionStatus::Unauthenticated;
        }

        if self.fetch_user().await.is_some() {
            SessionStatus::Resolved
        } else {
            SessionStatus::Unauthenticated
        }
    }

    /// Log in and remember the returned user.
    ///
    /// # Errors
    ///
    /// Returns the gateway error. Bad credentials come back as `Rejected`
    /// with status 401, after the session has been cleared.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<User, ApiError> {
        let body = LoginRequest {
            username,
            password: password.expose_secret(),
        };
        // The auth service answers bad credentials with 401; the gateway has
        // already cleared the session, the form still needs a message.
        let answer: AuthResponse = self
            .gateway
            .post("/auth/login", &body)
            .await
            .map_err(|e| match e {
                ApiError::Unauthorized => ApiError::Rejected {
                    status: StatusCode::UNAUTHORIZED,
                    message: "Invalid username or password".to_string(),
                },
                other => other,
            })?;
        tracing::info!(user_id = %answer.user.id, "Logged in");
        self.accept(answer.user.clone());
        Ok(answer.user)
    }

    /// Create an account and log in as it.
    ///
    /// # Errors
    ///
    /// Returns the gateway error, e.g. a taken username.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        let answer: AuthResponse = self
            .gateway
            .post("/auth/register", &RegisterRequest::from(registration))
            .await?;
        tracing::info!(user_id = %answer.user.id, "Registered");
        self.accept(answer.user.clone());
        Ok(answer.user)
    }

    /// Log out on the server and forget the session locally.
    ///
    /// Local state is cleared even when the server call fails.
    ///
    /// # Errors
    ///
    /// Returns the gateway error after clearing local state.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self
            .gateway
            .send(reqwest::Method::POST, "/auth/logout")
            .await;
        self.clear_auth();
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Logout request failed, local session cleared anyway");
        }
        result
    }

    /// Ask the server who is logged in.
    ///
    /// Any failure leaves the session unauthenticated and yields `None`. Only
    /// an answer from the server drops the token and the cached entry; when
    /// the server cannot be reached they are kept for the next attempt.
    #[instrument(skip(self))]
    pub async fn fetch_user(&self) -> Option<User> {
        match self.gateway.get::<User>("/auth/info").await {
            Ok(user) => {
                self.accept(user.clone());
                Some(user)
            }
            Err(e @ (ApiError::Unauthorized | ApiError::Rejected { .. })) => {
                tracing::debug!(error = %e, "No confirmed session");
                self.clear_auth();
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not confirm session, keeping cached token");
                self.handle().reset_state();
                None
            }
        }
    }

    /// Forget the session locally, dropping the access token cookie.
    pub fn clear_auth(&self) {
        self.gateway.cookies().remove(ACCESS_TOKEN_COOKIE);
        self.handle().clear_auth();
    }

    /// Change profile fields and store the server's answer.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a request when nobody is logged in,
    /// otherwise the gateway error.
    #[instrument(skip(self, changes))]
    pub async fn update_profile(&self, changes: &ProfileUpdate) -> Result<User, ApiError> {
        if !self.is_authenticated() {
            return Err(ApiError::NotAuthenticated);
        }
        let user: User = self.gateway.put("/user/profile", changes).await?;
        self.accept(user.clone());
        Ok(user)
    }

    /// The current user, if they may use the admin console.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated` when nobody is logged in, `Forbidden` for clients.
    pub fn require_staff(&self) -> Result<User, ApiError> {
        let user = self.user().ok_or(ApiError::NotAuthenticated)?;
        if user.user_role.is_staff() {
            Ok(user)
        } else {
            Err(ApiError::Forbidden(format!(
                "The {} role cannot open the admin console",
                user.user_role
            )))
        }
    }

    fn accept(&self, user: User) {
        self.handle().set_user(user);
        self.persist();
    }

    /// Write the current state to the cache. Failures are logged only.
    fn persist(&self) {
        let state = self.snapshot();
        let cached = CachedSession {
            authenticated: state.authenticated,
            user: state.user,
            access_token: self
                .gateway
                .cookies()
                .get(ACCESS_TOKEN_COOKIE)
                .map(|token| token.expose_secret().to_string()),
            saved_at: Utc::now(),
        };
        if let Err(e) = self.handle().cache().save(&cached) {
            tracing::warn!(error = %e, "Failed to persist session");
        }
    }
}

#[cfg(test)]
mod tests {
    use bakery_core::{UserId, UserRole};

    use super::*;

    fn user() -> User {
        User {
            id: UserId::new(5),
            username: "dora".to_string(),
            email: "dora@bakery.example".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            user_role: UserRole::Client,
        }
    }

    #[test]
    fn test_handle_starts_loading() {
        let handle = SessionHandle::new(Arc::new(MemorySessionCache::new()));
        assert_eq!(handle.status(), SessionStatus::Loading);
        assert!(!handle.is_authenticated());
    }

    #[test]
    fn test_clear_auth_resets_state_and_cache() {
        let cache = Arc::new(MemorySessionCache::new());
        let handle = SessionHandle::new(cache.clone());
        handle.set_user(user());
        cache
            .save(&CachedSession {
                authenticated: true,
                user: Some(user()),
                access_token: None,
                saved_at: Utc::now(),
            })
            .ok();

        handle.clear_auth();

        let state = handle.snapshot();
        assert!(!state.authenticated);
        assert!(state.user.is_none());
        assert_eq!(state.status, SessionStatus::Unauthenticated);
        assert!(matches!(cache.load(), Ok(None)));
    }

    #[test]
    fn test_reset_state_keeps_cache() {
        let cache = Arc::new(MemorySessionCache::new());
        let handle = SessionHandle::new(cache.clone());
        handle.set_user(user());
        cache
            .save(&CachedSession {
                authenticated: true,
                user: Some(user()),
                access_token: Some("\"Bearer abc\"".to_string()),
                saved_at: Utc::now(),
            })
            .ok();

        handle.reset_state();

        assert!(!handle.is_authenticated());
        assert_eq!(handle.status(), SessionStatus::Unauthenticated);
        assert!(matches!(cache.load(), Ok(Some(cached)) if cached.access_token.is_some()));
    }

    #[test]
    fn test_restore_keeps_loading() {
        let handle = SessionHandle::new(Arc::new(MemorySessionCache::new()));
        handle.restore(&CachedSession {
            authenticated: true,
            user: Some(user()),
            access_token: None,
            saved_at: Utc::now(),
        });
        assert_eq!(handle.status(), SessionStatus::Loading);
        assert!(handle.is_authenticated());
    }
}
