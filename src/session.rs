//! In-memory session state with write-through persistence of the token pair.
//! Locks are never held across `.await`; callers take snapshots instead.

use crate::{
    error::Result,
    storage::{TokenStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

/// Profile record returned by the backend, kept verbatim.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct User(Map<String, Value>);

impl User {
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wraps a JSON value, `None` unless it is an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    #[must_use]
    pub fn id(&self) -> Option<&Value> {
        self.0.get("id")
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.0.get("username").and_then(Value::as_str)
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.0.get("email").and_then(Value::as_str)
    }

    /// Admin flag used by the navigation guard.
    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.0.get("is_staff").and_then(Value::as_bool).unwrap_or(false)
    }

    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.0
            .get("is_verified")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

#[derive(Debug, Default)]
pub struct Session {
    pub access_token: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub user: Option<User>,
}

impl Session {
    /// Authenticated exactly when an access token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_staff)
    }
}

impl Clone for Session {
    fn clone(&self) -> Self {
        Self {
            access_token: self.access_token.as_ref().map(copy_secret),
            refresh_token: self.refresh_token.as_ref().map(copy_secret),
            user: self.user.clone(),
        }
    }
}

pub(crate) fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_owned())
}

/// Shared session handle injected into the transport, the store and the guard.
pub struct SessionState {
    inner: RwLock<Session>,
    storage: Arc<dyn TokenStorage>,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("session", &*self.read())
            .finish_non_exhaustive()
    }
}

impl SessionState {
    /// Builds the session from whatever tokens durable storage holds.
    #[must_use]
    pub fn hydrate(storage: Arc<dyn TokenStorage>) -> Self {
        let session = Session {
            access_token: storage.get(ACCESS_TOKEN_KEY).map(SecretString::from),
            refresh_token: storage.get(REFRESH_TOKEN_KEY).map(SecretString::from),
            user: None,
        };

        debug!(
            authenticated = session.is_authenticated(),
            "session hydrated from storage"
        );

        Self {
            inner: RwLock::new(session),
            storage,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<SecretString> {
        self.read().access_token.as_ref().map(copy_secret)
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<SecretString> {
        self.read().refresh_token.as_ref().map(copy_secret)
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.read().is_admin()
    }

    /// Persists both tokens, then installs them.
    /// # Errors
    /// Returns [`crate::Error::Storage`] if persistence fails; the session is then unchanged.
    pub fn set_tokens(&self, access: SecretString, refresh: SecretString) -> Result<()> {
        self.storage.set(ACCESS_TOKEN_KEY, access.expose_secret())?;
        self.storage.set(REFRESH_TOKEN_KEY, refresh.expose_secret())?;

        let mut session = self.write();
        session.access_token = Some(access);
        session.refresh_token = Some(refresh);
        Ok(())
    }

    /// Installs a refreshed access token, and a rotated refresh token when
    /// given, only if the session still holds `expected` as its refresh token.
    /// Returns `false` and leaves storage untouched when the session was
    /// cleared or replaced in the meantime.
    /// # Errors
    /// Returns [`crate::Error::Storage`] if persistence fails.
    pub fn replace_refreshed(
        &self,
        expected: &SecretString,
        access: SecretString,
        rotated: Option<SecretString>,
    ) -> Result<bool> {
        let mut session = self.write();
        let current = session.refresh_token.as_ref().map(|token| token.expose_secret());
        if current != Some(expected.expose_secret()) {
            debug!("session changed during refresh, discarding new tokens");
            return Ok(false);
        }

        self.storage.set(ACCESS_TOKEN_KEY, access.expose_secret())?;
        if let Some(refresh) = &rotated {
            self.storage.set(REFRESH_TOKEN_KEY, refresh.expose_secret())?;
        }

        session.access_token = Some(access);
        if let Some(refresh) = rotated {
            session.refresh_token = Some(refresh);
        }
        Ok(true)
    }

    pub fn set_user(&self, user: Option<User>) {
        self.write().user = user;
    }

    /// Drops every session field and the persisted tokens. Storage failures
    /// are logged only.
    pub fn clear(&self) {
        let mut session = self.write();
        *session = Session::default();

        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(err) = self.storage.remove(key) {
                warn!("failed to clear {key} from storage: {err}");
            }
        }
    }
}
