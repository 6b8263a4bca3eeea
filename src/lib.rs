//! Atomic rename transactions over single-object remote storage.
//!
//! A sync client uploads changed objects under temporary names, then promotes
//! them to their final names as one logical unit. The remote store offers only
//! put/get/delete/move/list, so atomicity comes from a durable manifest
//! object: the manifest's presence is the sole marker of an in-flight
//! transaction, and a fresh session replays any manifest it finds until every
//! rename is confirmed. Replay is idempotent under arbitrary crash points
//! because "already applied" is re-derived from the existence of the final
//! object, never from persisted flags.

pub mod config;
pub mod error;
pub mod executor;
pub mod manifest;
pub mod record;
pub mod remote_name;
pub mod s3_transport;
pub mod transport;

pub use config::TxnConfig;
pub use error::{TxnError, TxnResult};
pub use executor::{RecoveryOutcome, RecoveryReport, TxnExecutor, TxnState};
pub use record::{RenamePair, TransactionRecord};
pub use remote_name::{FinalName, TempName, TransactionToken};
pub use transport::{StorageError, StorageTransport};
