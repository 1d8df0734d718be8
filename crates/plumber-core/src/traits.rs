//! Seams to the client's host environment.

use crate::StorageError;

/// Durable string key/value storage backing the credential.
///
/// Methods are synchronous: credential invalidation must complete before the
/// caller yields, so a later call never sees a half-cleared credential.
pub trait KeyValueStore: Send + Sync {
    /// Read a key.
    ///
    /// # Errors
    /// Returns error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a key.
    ///
    /// # Errors
    /// Returns error if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing a missing key is not an error.
    ///
    /// # Errors
    /// Returns error if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Receives forced navigation requests (for example the redirect to the
/// login entry point after a credential rejection).
pub trait Navigator: Send + Sync {
    /// Move the user to `path`.
    fn navigate(&self, path: &str);
}
