//! Session store: who is logged in.
//!
//! The persisted session is three keys in client storage (the serialized
//! user, an authentication flag and the backend session id). They are
//! written together at login and cleared together at logout or expiry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bizops_core::{EmployeeId, UserId};

use crate::Role;

/// Storage key of the serialized [`SessionUser`].
pub const USER_KEY: &str = "user";
/// Storage key of the authentication flag (`"true"` when authenticated).
pub const AUTHENTICATED_KEY: &str = "isAuthenticated";
/// Storage key of the backend session identifier.
pub const SESSION_ID_KEY: &str = "sessionId";

/// Every key owned by the session; cleared as a unit.
pub const SESSION_KEYS: [&str; 3] = [USER_KEY, AUTHENTICATED_KEY, SESSION_ID_KEY];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage lock poisoned")]
    Poisoned,

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persisted key/value client storage (the equivalent of a browser's local
/// storage for one profile).
pub trait ClientStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: ClientStorage + ?Sized> ClientStorage for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Non-persistent storage, for tests and short-lived processes.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// The logged-in user as persisted on the client.
///
/// Accepts the backend's camelCase field names as well as snake_case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,

    #[serde(default, alias = "firstName")]
    pub first_name: String,

    #[serde(default, alias = "lastName")]
    pub last_name: String,

    #[serde(default)]
    pub email: String,

    /// Raw role string as issued by the backend (normalized on read).
    #[serde(default)]
    pub role: Option<String>,

    #[serde(default, alias = "loginType")]
    pub login_type: Option<String>,

    #[serde(default, alias = "employeeId")]
    pub employee_id: Option<EmployeeId>,

    #[serde(default, alias = "loggedInAt")]
    pub logged_in_at: Option<DateTime<Utc>>,
}

impl SessionUser {
    pub fn new(id: UserId, role: impl Into<String>) -> Self {
        Self {
            id,
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            role: Some(role.into()),
            login_type: None,
            employee_id: None,
            logged_in_at: None,
        }
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = first.into();
        self.last_name = last.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_login_type(mut self, login_type: impl Into<String>) -> Self {
        self.login_type = Some(login_type.into());
        self
    }

    pub fn with_employee_id(mut self, employee_id: EmployeeId) -> Self {
        self.employee_id = Some(employee_id);
        self
    }

    /// Effective role (login-type override applied).
    pub fn effective_role(&self) -> Option<Role> {
        Role::normalize(self.role.as_deref(), self.login_type.as_deref())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Anything that can answer "who is logged in right now".
///
/// Permission checks take a source instead of reaching into storage, so policy
/// logic can be exercised with a plain `Option<SessionUser>`.
pub trait SessionSource {
    fn current_user(&self) -> Option<SessionUser>;
}

impl SessionSource for Option<SessionUser> {
    fn current_user(&self) -> Option<SessionUser> {
        self.clone()
    }
}

impl SessionSource for SessionUser {
    fn current_user(&self) -> Option<SessionUser> {
        Some(self.clone())
    }
}

impl<T: SessionSource + ?Sized> SessionSource for &T {
    fn current_user(&self) -> Option<SessionUser> {
        (**self).current_user()
    }
}

impl<T: SessionSource + ?Sized> SessionSource for Arc<T> {
    fn current_user(&self) -> Option<SessionUser> {
        (**self).current_user()
    }
}

/// Typed access to the session keys of a [`ClientStorage`].
#[derive(Debug, Clone)]
pub struct SessionStore<S> {
    storage: S,
}

impl<S: ClientStorage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Read and decode the stored user.
    ///
    /// Missing, unreadable or corrupt data all mean "not logged in".
    pub fn load_user(&self) -> Option<SessionUser> {
        let raw = match self.storage.get(USER_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read session user");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "stored session user is corrupt; treating as logged out"
                );
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.storage.get(AUTHENTICATED_KEY), Ok(Some(flag)) if flag == "true")
    }

    pub fn session_id(&self) -> Option<String> {
        self.storage
            .get(SESSION_ID_KEY)
            .ok()
            .flatten()
            .filter(|id| !id.is_empty())
    }

    /// Persist a freshly authenticated session.
    pub fn save(&self, user: &SessionUser, session_id: Option<&str>) -> Result<(), StorageError> {
        let raw = serde_json::to_string(user)?;
        self.storage.set(USER_KEY, raw)?;
        match session_id {
            Some(id) => self.storage.set(SESSION_ID_KEY, id.to_string())?,
            None => self.storage.remove(SESSION_ID_KEY)?,
        }
        self.set_authenticated(true)
    }

    pub fn set_authenticated(&self, authenticated: bool) -> Result<(), StorageError> {
        if authenticated {
            self.storage.set(AUTHENTICATED_KEY, "true".to_string())
        } else {
            self.storage.remove(AUTHENTICATED_KEY)
        }
    }

    /// Remove every session key.
    ///
    /// All keys are attempted even if one removal fails; the first error is
    /// returned. Clearing an already-empty store is a no-op.
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut first_err = None;
        for key in SESSION_KEYS {
            if let Err(e) = self.storage.remove(key) {
                tracing::error!(key, error = %e, "failed to clear session key");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<S: ClientStorage> SessionSource for SessionStore<S> {
    fn current_user(&self) -> Option<SessionUser> {
        self.load_user()
    }
}
