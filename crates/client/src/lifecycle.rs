//! Session lifecycle: login, logout, forced expiry and the startup check.
//!
//! All logout paths (manual, idle timeout, backend expiry) go through
//! [`SessionLifecycle::force_logout`], which is idempotent.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use bizops_auth::{AppRoute, ClientStorage, SessionStore, SessionUser, StorageError};

use crate::check::{SessionCheck, SessionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    Manual,
    Idle,
    SessionInactive,
}

impl LogoutReason {
    /// Message shown on the login page after the logout.
    pub fn message(&self) -> &'static str {
        match self {
            LogoutReason::Manual => "You have been logged out.",
            LogoutReason::Idle => {
                "Your session has expired due to inactivity. Please log in again."
            }
            LogoutReason::SessionInactive => "Your session has expired. Please log in again.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogoutNotice {
    pub reason: LogoutReason,
    pub message: String,
    pub redirect: AppRoute,
    pub at: DateTime<Utc>,
}

impl LogoutNotice {
    pub fn new(reason: LogoutReason) -> Self {
        Self {
            reason,
            message: reason.message().to_string(),
            redirect: AppRoute::Login,
            at: Utc::now(),
        }
    }
}

/// The app's authenticated flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Authenticated,
    /// Logged out; carries the notice when a logout just happened.
    LoggedOut(Option<LogoutNotice>),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated)
    }

    pub fn notice(&self) -> Option<&LogoutNotice> {
        match self {
            AuthState::LoggedOut(notice) => notice.as_ref(),
            AuthState::Authenticated => None,
        }
    }
}

/// Owner of the persisted session and the authenticated flag.
///
/// The only writers of session state are this type's methods.
#[derive(Debug)]
pub struct SessionLifecycle<S> {
    store: SessionStore<S>,
    state: watch::Sender<AuthState>,
}

impl<S: ClientStorage> SessionLifecycle<S> {
    /// Start from whatever is persisted: an authenticated flag plus a
    /// readable user means authenticated.
    pub fn new(store: SessionStore<S>) -> Self {
        let initial = if store.is_authenticated() && store.load_user().is_some() {
            AuthState::Authenticated
        } else {
            AuthState::LoggedOut(None)
        };
        let (state, _) = watch::channel(initial);
        Self { store, state }
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn login(&self, user: &SessionUser, session_id: Option<&str>) -> Result<(), StorageError> {
        self.store.save(user, session_id)?;
        tracing::info!(user_id = %user.id, "session started");
        self.state.send_replace(AuthState::Authenticated);
        Ok(())
    }

    pub fn logout(&self) -> bool {
        self.force_logout(LogoutReason::Manual)
    }

    /// Clear the persisted session and flip the flag to logged out.
    ///
    /// Returns `true` if this call ended an authenticated session; later
    /// calls only re-clear storage and return `false`.
    pub fn force_logout(&self, reason: LogoutReason) -> bool {
        if let Err(e) = self.store.clear() {
            tracing::error!(error = %e, "failed to clear persisted session");
        }

        let transitioned = self.state.send_if_modified(|state| {
            if state.is_authenticated() {
                *state = AuthState::LoggedOut(Some(LogoutNotice::new(reason)));
                true
            } else {
                false
            }
        });

        if transitioned {
            tracing::info!(?reason, "session ended");
        }
        transitioned
    }

    /// Startup authentication check against the backend.
    ///
    /// An explicit inactive/rejected answer clears the session. A failed
    /// check leaves the persisted state in charge.
    pub async fn bootstrap<C>(&self, checker: &C) -> AuthState
    where
        C: SessionCheck + ?Sized,
    {
        let session_id = self.store.session_id();
        match checker.check(session_id.as_deref()).await {
            Ok(SessionStatus::Active) => {
                if self.store.load_user().is_some() {
                    if let Err(e) = self.store.set_authenticated(true) {
                        tracing::warn!(error = %e, "failed to persist authenticated flag");
                    }
                    self.state.send_replace(AuthState::Authenticated);
                } else {
                    tracing::warn!("backend session active but no user stored; staying logged out");
                    self.state.send_replace(AuthState::LoggedOut(None));
                }
            }
            Ok(status) => {
                tracing::info!(?status, "backend reports no active session");
                if let Err(e) = self.store.clear() {
                    tracing::error!(error = %e, "failed to clear persisted session");
                }
                self.state.send_replace(AuthState::LoggedOut(None));
            }
            Err(e) => {
                tracing::warn!(error = %e, "startup session check failed; using persisted state");
            }
        }
        self.state()
    }
}
