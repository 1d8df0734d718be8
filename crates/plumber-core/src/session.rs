//! Credential state shared between the session guard and the auth store.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::{KeyValueStore, MemoryStore, Observable, StorageError};

/// Storage key of the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key of the username.
pub const USERNAME_KEY: &str = "username";
/// Storage key of the user id.
pub const USER_ID_KEY: &str = "userId";

/// Bearer token plus the identity it was issued for.
///
/// The default value (empty token) is the logged-out credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub username: String,
    pub user_id: String,
}

impl Credential {
    #[must_use]
    pub fn new(
        token: impl Into<String>,
        username: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
            user_id: user_id.into(),
        }
    }

    /// A credential authenticates exactly when its token is non-empty.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }
}

/// The process-wide credential with durable backing.
///
/// Created once at start-up and shared by reference with everything that
/// needs it. Logged-in state is always derived from the token and is never
/// stored on its own.
pub struct Session {
    credential: Observable<Credential>,
    storage: Arc<dyn KeyValueStore>,
}

impl Session {
    /// Load the credential persisted in `storage`.
    ///
    /// Unreadable entries are treated as absent.
    #[must_use]
    pub fn restore(storage: Arc<dyn KeyValueStore>) -> Self {
        let read = |key: &str| match storage.get(key) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(key, "Failed to read stored credential: {e}");
                String::new()
            }
        };
        let credential = Credential {
            token: read(TOKEN_KEY),
            username: read(USERNAME_KEY),
            user_id: read(USER_ID_KEY),
        };

        Self {
            credential: Observable::new(credential),
            storage,
        }
    }

    /// Session backed by a fresh in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::restore(Arc::new(MemoryStore::new()))
    }

    /// Snapshot of the held credential.
    #[must_use]
    pub fn credential(&self) -> Credential {
        self.credential.get()
    }

    /// Bearer token, if one is held.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.credential
            .with(|c| c.is_authenticated().then(|| c.token.clone()))
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.credential.with(Credential::is_authenticated)
    }

    /// Watch the credential for changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Credential> {
        self.credential.subscribe()
    }

    /// Persist and hold a freshly issued credential.
    ///
    /// # Errors
    /// Returns error if the credential could not be persisted. The previous
    /// credential is then written back so memory and storage still agree; if
    /// even that fails, both are cleared.
    pub fn establish(&self, credential: Credential) -> Result<(), StorageError> {
        if let Err(e) = self.persist(&credential) {
            let previous = self.credential();
            let restored = if previous.is_authenticated() {
                self.persist(&previous)
            } else {
                self.remove_all()
            };
            if let Err(restore) = restored {
                tracing::warn!("Failed to restore stored credential, logging out: {restore}");
                self.invalidate();
            }
            return Err(e);
        }

        self.credential.set(credential);
        Ok(())
    }

    /// Drop the credential (logout).
    ///
    /// # Errors
    /// Returns the first storage failure. The held credential is cleared and
    /// every key removal is attempted regardless.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.credential.set(Credential::default());
        self.remove_all()
    }

    /// Destroy the credential after the server rejected it.
    ///
    /// Idempotent. Storage failures are logged, never returned.
    pub fn invalidate(&self) {
        self.credential.set(Credential::default());
        self.remove_persisted();
    }

    fn persist(&self, credential: &Credential) -> Result<(), StorageError> {
        self.storage.set(TOKEN_KEY, &credential.token)?;
        self.storage.set(USERNAME_KEY, &credential.username)?;
        self.storage.set(USER_ID_KEY, &credential.user_id)
    }

    /// Remove every key, returning the first failure.
    fn remove_all(&self) -> Result<(), StorageError> {
        let mut first = None;
        for key in [TOKEN_KEY, USERNAME_KEY, USER_ID_KEY] {
            if let Err(e) = self.storage.remove(key) {
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }

    fn remove_persisted(&self) {
        for key in [TOKEN_KEY, USERNAME_KEY, USER_ID_KEY] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key, "Failed to remove stored credential: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Internal("read-only".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    /// Memory store that fails the next write or removal of one key.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_set: Mutex<Option<&'static str>>,
        fail_remove: Mutex<Option<&'static str>>,
    }

    impl FlakyStore {
        fn fail_next_set(&self, key: &'static str) {
            *self.fail_set.lock().unwrap() = Some(key);
        }

        fn fail_next_remove(&self, key: &'static str) {
            *self.fail_remove.lock().unwrap() = Some(key);
        }

        fn trip(slot: &Mutex<Option<&'static str>>, key: &str) -> Result<(), StorageError> {
            let mut slot = slot.lock().unwrap();
            if *slot == Some(key) {
                *slot = None;
                return Err(StorageError::Internal(format!("{key} unavailable")));
            }
            Ok(())
        }
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            Self::trip(&self.fail_set, key)?;
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            Self::trip(&self.fail_remove, key)?;
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_empty_storage_means_logged_out() {
        let session = Session::in_memory();
        assert!(!session.is_logged_in());
        assert_eq!(session.token(), None);
        assert_eq!(session.credential(), Credential::default());
    }

    #[test]
    fn test_restore_from_storage() {
        let storage = Arc::new(MemoryStore::with_entries([
            (TOKEN_KEY, "tok-1"),
            (USERNAME_KEY, "alice"),
            (USER_ID_KEY, "admin"),
        ]));
        let session = Session::restore(storage);
        assert!(session.is_logged_in());
        assert_eq!(session.credential(), Credential::new("tok-1", "alice", "admin"));
    }

    #[test]
    fn test_establish_persists_all_fields() {
        let storage = Arc::new(MemoryStore::new());
        let session = Session::restore(storage.clone());
        session
            .establish(Credential::new("tok-123", "alice", "admin"))
            .unwrap();

        assert!(session.is_logged_in());
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("tok-123"));
        assert_eq!(storage.get(USERNAME_KEY).unwrap().as_deref(), Some("alice"));
        assert_eq!(storage.get(USER_ID_KEY).unwrap().as_deref(), Some("admin"));
    }

    #[test]
    fn test_failed_persist_keeps_previous_state() {
        let session = Session::restore(Arc::new(ReadOnlyStore));
        let result = session.establish(Credential::new("tok", "bob", "u1"));
        assert!(result.is_err());
        assert!(!session.is_logged_in());
    }

    #[test]
    fn test_partial_persist_failure_writes_previous_credential_back() {
        let storage = Arc::new(FlakyStore::default());
        let session = Session::restore(storage.clone());
        session.establish(Credential::new("old-tok", "alice", "admin")).unwrap();

        storage.fail_next_set(USERNAME_KEY);
        let result = session.establish(Credential::new("new-tok", "bob", "u1"));

        assert!(result.is_err());
        assert_eq!(session.credential(), Credential::new("old-tok", "alice", "admin"));
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("old-tok"));
        assert_eq!(storage.get(USERNAME_KEY).unwrap().as_deref(), Some("alice"));

        let reloaded = Session::restore(storage);
        assert_eq!(reloaded.credential(), Credential::new("old-tok", "alice", "admin"));
    }

    #[test]
    fn test_partial_persist_failure_when_logged_out_leaves_nothing_behind() {
        let storage = Arc::new(FlakyStore::default());
        let session = Session::restore(storage.clone());

        storage.fail_next_set(USER_ID_KEY);
        assert!(session.establish(Credential::new("tok", "bob", "u1")).is_err());

        assert!(!session.is_logged_in());
        assert!(storage.inner.is_empty());
    }

    #[test]
    fn test_clear_removes_every_key_before_reporting_failure() {
        let storage = Arc::new(FlakyStore::default());
        let session = Session::restore(storage.clone());
        session.establish(Credential::new("tok", "bob", "u1")).unwrap();

        storage.fail_next_remove(TOKEN_KEY);
        let err = session.clear().unwrap_err();

        assert!(matches!(err, StorageError::Internal(ref m) if m == "token unavailable"));
        assert!(!session.is_logged_in());
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("tok"));
        assert_eq!(storage.get(USERNAME_KEY).unwrap(), None);
        assert_eq!(storage.get(USER_ID_KEY).unwrap(), None);
    }

    #[test]
    fn test_invalidate_is_idempotent() {
        let storage = Arc::new(MemoryStore::new());
        let session = Session::restore(storage.clone());
        session.establish(Credential::new("tok", "bob", "u1")).unwrap();

        session.invalidate();
        session.invalidate();

        assert!(!session.is_logged_in());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_logged_in_tracks_token_only() {
        let session = Session::in_memory();
        session.establish(Credential::new("", "ghost", "u0")).unwrap();
        assert!(!session.is_logged_in());
        assert_eq!(session.token(), None);
    }

    #[tokio::test]
    async fn test_subscribers_see_logout() {
        let session = Session::in_memory();
        session.establish(Credential::new("tok", "bob", "u1")).unwrap();
        let mut rx = session.subscribe();
        rx.borrow_and_update();

        session.clear().unwrap();
        rx.changed().await.unwrap();
        assert!(!rx.borrow().is_authenticated());
    }
}
