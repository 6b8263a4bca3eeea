//! Transaction error types.

use crate::transport::StorageError;
use thiserror::Error;

/// Result type for transaction operations.
pub type TxnResult<T> = Result<T, TxnError>;

/// Errors that can occur while building, committing or recovering a
/// rename transaction.
#[derive(Debug, Error)]
pub enum TxnError {
    /// Two renames in one record target the same temporary object.
    /// Programmer error; the record is left unchanged.
    #[error("duplicate temporary name in transaction: {temp}")]
    DuplicateTemporary { temp: String },

    /// A raw key does not match the temporary-name grammar.
    #[error("not a temporary name: {raw}")]
    NotATemporaryName { raw: String },

    /// A final name falls inside a reserved key namespace.
    #[error("invalid final name: {raw}: {reason}")]
    InvalidFinalName { raw: String, reason: String },

    /// A manifest could not be decoded. The offending object is quarantined,
    /// never deleted, so it stays available for inspection.
    #[error("corrupt manifest {key}: {reason}")]
    CorruptManifest { key: String, reason: String },

    /// Manifest upload failed after retries. No renames have happened yet,
    /// so abandoning the transaction is always safe.
    #[error("manifest upload failed for transaction {token}: {source}")]
    ManifestUploadFailed {
        token: String,
        source: StorageError,
    },

    /// Manifest deletion failed after retries. Non-fatal: the data is fully
    /// promoted and the leftover manifest replays as a series of no-ops.
    #[error("manifest delete failed for transaction {token}: {source}")]
    ManifestDeleteFailed {
        token: String,
        source: StorageError,
    },

    /// A pair could not be applied after retries. The transaction is left
    /// parked with its manifest in place; it is never rolled back.
    #[error("rename failed for {temp} -> {final_name}: {source}")]
    RenameFailed {
        temp: String,
        final_name: String,
        source: StorageError,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
