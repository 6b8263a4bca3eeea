//! In-memory representation of a pending rename batch.

use crate::error::TxnError;
use crate::remote_name::{FinalName, TempName, TransactionToken};

/// One pending promotion from a temp key to its final key.
///
/// `applied` is volatile bookkeeping for the current process only. It is
/// never persisted: after a reload every pair is re-verified against the
/// store, so stale in-flight state can never be trusted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenamePair {
    pub temp: TempName,
    pub final_name: FinalName,
    applied: bool,
}

impl RenamePair {
    pub fn is_applied(&self) -> bool {
        self.applied
    }
}

/// An ordered batch of renames sharing one transaction token.
///
/// Insertion order is preserved so replay is deterministic; temp keys are
/// unique within a record. Built in memory before any network I/O happens,
/// becomes durable once its manifest uploads, and is destroyed only after
/// every pair is applied.
#[derive(Clone, Debug)]
pub struct TransactionRecord {
    token: TransactionToken,
    pairs: Vec<RenamePair>,
}

impl TransactionRecord {
    /// An empty record. Valid: it commits as a no-op.
    pub fn new(token: TransactionToken) -> Self {
        Self {
            token,
            pairs: Vec::new(),
        }
    }

    pub fn token(&self) -> TransactionToken {
        self.token
    }

    /// Appends a rename. Fails if the temp key is already present, leaving
    /// the record unchanged.
    pub fn add_rename(&mut self, temp: TempName, final_name: FinalName) -> Result<(), TxnError> {
        if self.pairs.iter().any(|p| p.temp == temp) {
            return Err(TxnError::DuplicateTemporary {
                temp: temp.as_str().into(),
            });
        }
        self.pairs.push(RenamePair {
            temp,
            final_name,
            applied: false,
        });
        Ok(())
    }

    /// Ordered read-only view of the pending pairs.
    pub fn pairs(&self) -> &[RenamePair] {
        &self.pairs
    }

    /// Looks up the final name a temp object promotes to. The temp key only
    /// carries a digest of the final name, so this record is the one place
    /// the pairing can be recovered from.
    pub fn final_for(&self, temp: &TempName) -> Option<&FinalName> {
        self.pairs
            .iter()
            .find(|p| &p.temp == temp)
            .map(|p| &p.final_name)
    }

    /// Marks a pair as applied. Idempotent: re-marking an applied pair, or
    /// marking a temp key the record does not know, is a no-op rather than
    /// an error, so replay after a partial crash never trips over itself.
    pub fn mark_applied(&mut self, temp: &TempName) {
        if let Some(pair) = self.pairs.iter_mut().find(|p| &p.temp == temp) {
            pair.applied = true;
        }
    }

    /// True once every pair is applied. Trivially true for an empty record.
    pub fn is_fully_applied(&self) -> bool {
        self.pairs.iter().all(|p| p.applied)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
