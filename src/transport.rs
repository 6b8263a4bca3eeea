//! Storage-primitive boundary consumed by the transaction executor.
//!
//! Backends only need single-object operations. `rename` may be emulated as
//! copy+delete by stores without a native move; the executor tolerates the
//! intermediate state that emulation can leave behind (final written, temp
//! not yet deleted).

use thiserror::Error;

/// Errors surfaced by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("transient storage failure: {0}")]
    Transient(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("storage failure: {0}")]
    Other(String),
}

impl StorageError {
    /// Only transient failures are worth retrying; the rest surface to the
    /// caller as transaction-blocked conditions.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Transient(_))
    }
}

/// Single-object primitives of the remote store.
///
/// Contract notes:
/// - `delete` is idempotent: deleting a missing object succeeds.
/// - `get` on a missing object fails with [`StorageError::NotFound`].
/// - `list` returns the full (finite) set of keys under a prefix.
pub trait StorageTransport: Send + Sync {
    fn put(
        &self,
        key: &str,
        data: Vec<u8>,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn get(&self, key: &str) -> impl Future<Output = Result<Vec<u8>, StorageError>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn rename(
        &self,
        from: &str,
        to: &str,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn exists(&self, key: &str) -> impl Future<Output = Result<bool, StorageError>> + Send;

    fn list(&self, prefix: &str) -> impl Future<Output = Result<Vec<String>, StorageError>> + Send;
}
