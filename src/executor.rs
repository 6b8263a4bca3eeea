//! Transaction executor: commit pipeline and startup recovery.
//!
//! Commit runs serialize -> upload manifest -> apply renames -> delete
//! manifest. The manifest must be confirmed on the store before the first
//! rename, and is deleted only after every pair has been observed applied;
//! everything between those two points is safe to interrupt, because recovery
//! re-derives "already applied" from the existence of each final object
//! rather than trusting any persisted flag.

use crate::config::TxnConfig;
use crate::error::{TxnError, TxnResult};
use crate::manifest;
use crate::record::TransactionRecord;
use crate::remote_name::{self, MANIFEST_PREFIX, TransactionToken};
use crate::transport::{StorageError, StorageTransport};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle of a transaction as seen by the executor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxnState {
    /// Caller is still adding pairs; nothing has touched the network.
    Building,
    /// Manifest confirmed on the store; renames may begin.
    ManifestUploaded,
    /// At least one pair is pending. A transaction that exhausts retries is
    /// left here, resumable on the next recovery pass.
    Applying,
    /// Every pair applied and the manifest deleted.
    Completed,
}

/// How recovery resolved one discovered manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// All pairs confirmed applied, manifest deleted.
    Replayed,
    /// A pair could not be applied; the manifest stays for the next pass.
    Parked,
    /// Manifest unreadable; moved to the quarantine prefix, never deleted.
    Quarantined,
}

/// Per-manifest result of a recovery pass.
#[derive(Clone, Debug)]
pub struct RecoveryReport {
    pub token: Option<TransactionToken>,
    pub manifest_key: String,
    pub outcome: RecoveryOutcome,
    pub error: Option<String>,
}

/// Owns the lifecycle of a transaction from manifest upload to deletion.
pub struct TxnExecutor<T: StorageTransport> {
    transport: Arc<T>,
    config: TxnConfig,
}

impl<T: StorageTransport> TxnExecutor<T> {
    pub fn new(transport: Arc<T>, config: TxnConfig) -> Self {
        Self { transport, config }
    }

    /// Commits a transaction: uploads the manifest, applies every rename in
    /// insertion order, then deletes the manifest.
    ///
    /// An empty record completes without any network I/O. A record whose
    /// manifest cannot upload is abandoned safely (no renames have
    /// happened). A pair that cannot apply after retries leaves the
    /// transaction `Applying` with the manifest in place; the error is
    /// surfaced, never swallowed, and the next recovery pass resumes it.
    pub async fn commit(&self, record: &mut TransactionRecord) -> TxnResult<TxnState> {
        let token = record.token();

        if record.is_empty() {
            debug!("transaction {token} has no pairs, completing without I/O");
            return Ok(TxnState::Completed);
        }

        let key = remote_name::manifest_key(&token);
        let bytes = manifest::encode(record)?;
        self.put_with_retry(&key, bytes)
            .await
            .map_err(|source| TxnError::ManifestUploadFailed {
                token: token.to_string(),
                source,
            })?;
        debug!("uploaded manifest {key} ({} pairs)", record.len());

        self.apply_and_finish(&key, record).await?;
        info!("transaction {token} committed ({} renames)", record.len());
        Ok(TxnState::Completed)
    }

    /// Scans the store for orphaned manifests and resumes each one.
    ///
    /// Unreadable manifests are quarantined (moved, never deleted) and
    /// reported; one bad transaction never aborts recovery of the rest.
    pub async fn recover(&self) -> TxnResult<Vec<RecoveryReport>> {
        let keys = self.transport.list(MANIFEST_PREFIX).await?;
        if keys.is_empty() {
            debug!("no orphaned transactions found");
            return Ok(Vec::new());
        }
        info!("found {} orphaned transaction manifest(s)", keys.len());

        let mut reports = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(token) = remote_name::parse_manifest_key(&key) else {
                warn!("ignoring non-manifest object under {MANIFEST_PREFIX}: {key}");
                continue;
            };
            reports.push(self.recover_one(&key, token).await);
        }
        Ok(reports)
    }

    async fn recover_one(&self, key: &str, token: TransactionToken) -> RecoveryReport {
        let report = |outcome, error: Option<String>| RecoveryReport {
            token: Some(token),
            manifest_key: key.to_string(),
            outcome,
            error,
        };

        let bytes = match self.get_with_retry(key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("could not fetch manifest {key}: {e}");
                return report(RecoveryOutcome::Parked, Some(e.to_string()));
            }
        };

        let mut record = match manifest::decode(key, &bytes) {
            Ok(record) => record,
            Err(e) => {
                warn!("quarantining corrupt manifest {key}: {e}");
                if let Err(move_err) = self
                    .transport
                    .rename(key, &remote_name::quarantine_key(&token))
                    .await
                {
                    warn!("quarantine move failed for {key}: {move_err}");
                }
                return report(RecoveryOutcome::Quarantined, Some(e.to_string()));
            }
        };

        match self.apply_and_finish(key, &mut record).await {
            Ok(()) => {
                info!("replayed transaction {token} ({} renames)", record.len());
                report(RecoveryOutcome::Replayed, None)
            }
            Err(e) => {
                warn!("transaction {token} left parked: {e}");
                report(RecoveryOutcome::Parked, Some(e.to_string()))
            }
        }
    }

    /// Applies every pending pair in order, then deletes the manifest.
    /// Shared by commit and recovery; entered only with the manifest
    /// confirmed on the store.
    async fn apply_and_finish(
        &self,
        manifest_key: &str,
        record: &mut TransactionRecord,
    ) -> TxnResult<()> {
        let pending: Vec<_> = record
            .pairs()
            .iter()
            .filter(|p| !p.is_applied())
            .map(|p| (p.temp.clone(), p.final_name.clone()))
            .collect();

        for (temp, final_name) in pending {
            self.apply_pair(temp.as_str(), final_name.as_str())
                .await
                .map_err(|source| TxnError::RenameFailed {
                    temp: temp.as_str().into(),
                    final_name: final_name.as_str().into(),
                    source,
                })?;
            record.mark_applied(&temp);
        }

        // Every pair observed applied; only now may the durable marker go.
        debug_assert!(record.is_fully_applied());
        self.delete_with_retry(manifest_key)
            .await
            .map_err(|source| TxnError::ManifestDeleteFailed {
                token: record.token().to_string(),
                source,
            })?;
        debug!("deleted manifest {manifest_key}");
        Ok(())
    }

    /// Promotes one object. If the final object already exists the rename
    /// happened on an earlier attempt, so only the lingering temp object (if
    /// any) needs deleting; otherwise move temp to final. Both paths end
    /// with the same observable state, which is what makes replay a no-op.
    async fn apply_pair(&self, temp: &str, final_name: &str) -> Result<(), StorageError> {
        let already_applied = self
            .retry("exists", final_name, || {
                self.transport.exists(final_name)
            })
            .await?;

        if already_applied {
            debug!("final object {final_name} already present, clearing {temp}");
            self.delete_with_retry(temp).await?;
            return Ok(());
        }

        self.retry("rename", temp, || {
            self.transport.rename(temp, final_name)
        })
        .await?;
        debug!("promoted {temp} -> {final_name}");
        Ok(())
    }

    async fn put_with_retry(&self, key: &str, data: Vec<u8>) -> Result<(), StorageError> {
        self.retry("put", key, || self.transport.put(key, data.clone()))
            .await
    }

    async fn get_with_retry(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.retry("get", key, || self.transport.get(key)).await
    }

    async fn delete_with_retry(&self, key: &str) -> Result<(), StorageError> {
        self.retry("delete", key, || self.transport.delete(key))
            .await
    }

    /// Bounded exponential backoff around one storage operation. Only
    /// transient errors retry; everything else surfaces immediately.
    async fn retry<R, F, Fut>(&self, op: &str, key: &str, mut call: F) -> Result<R, StorageError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, StorageError>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let backoff = self.config.backoff(attempt);
                    warn!("{op} {key} failed transiently, retrying in {backoff:?}: {e}");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
