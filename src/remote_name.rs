//! Remote key namespaces and the temporary-name grammar.
//!
//! Three disjoint namespaces share one flat keyspace:
//! - final objects: any key outside the reserved prefixes
//! - temporary objects: `temp/{token}/{digest}`
//! - manifests: `transactions/{token}.json` (quarantined copies move to
//!   `transactions-corrupt/`)
//!
//! A temp key embeds the transaction token plus a truncated SHA-256 digest of
//! the final key. The digest keeps derivation deterministic and collision-free
//! per token without putting the logical name on the wire; going back from a
//! temp key to its final key requires the manifest entry.

use crate::error::TxnError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Reserved prefix for temporary objects.
pub const TEMP_PREFIX: &str = "temp/";

/// Reserved prefix for in-flight transaction manifests. A `list` over this
/// prefix enumerates exactly the transactions needing recovery.
pub const MANIFEST_PREFIX: &str = "transactions/";

/// Reserved prefix for quarantined (unreadable) manifests.
pub const QUARANTINE_PREFIX: &str = "transactions-corrupt/";

const DIGEST_LEN: usize = 32;

/// Unique identifier correlating the temp objects and manifest of one
/// logical rename batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionToken(Uuid);

impl TransactionToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(Self)
    }
}

impl Default for TransactionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The stable name of a logical file on the remote store.
///
/// Only constructible through [`FinalName::new`]; the wire form carries raw
/// strings and re-validates on decode.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FinalName(String);

impl FinalName {
    /// A final name must never alias a reserved namespace.
    pub fn new(raw: impl Into<String>) -> Result<Self, TxnError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(TxnError::InvalidFinalName {
                raw,
                reason: "empty key".into(),
            });
        }
        for prefix in [TEMP_PREFIX, MANIFEST_PREFIX, QUARANTINE_PREFIX] {
            if raw.starts_with(prefix) {
                return Err(TxnError::InvalidFinalName {
                    raw,
                    reason: format!("key falls under reserved prefix {prefix}"),
                });
            }
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FinalName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The staging name an object lives under until its transaction commits.
/// Only constructible through [`TempName::derive`] or [`TempName::parse`],
/// so the embedded token is always valid.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TempName {
    key: String,
    token: TransactionToken,
}

impl TempName {
    /// Derives the temp key for a final name within a transaction.
    /// Deterministic and injective for a given token; distinct tokens can
    /// never collide because the token is part of the key.
    pub fn derive(final_name: &FinalName, token: &TransactionToken) -> Self {
        let digest = hex::encode(Sha256::digest(final_name.as_str().as_bytes()));
        Self {
            key: format!("{TEMP_PREFIX}{token}/{}", &digest[..DIGEST_LEN]),
            token: *token,
        }
    }

    /// Parses a raw key against the temporary-name grammar. Malformed keys
    /// are rejected, never silently accepted.
    pub fn parse(raw: &str) -> Result<Self, TxnError> {
        let reject = || TxnError::NotATemporaryName { raw: raw.into() };

        let rest = raw.strip_prefix(TEMP_PREFIX).ok_or_else(reject)?;
        let (token, digest) = rest.split_once('/').ok_or_else(reject)?;
        let token = TransactionToken::parse(token).ok_or_else(reject)?;
        if digest.len() != DIGEST_LEN || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(reject());
        }
        Ok(Self {
            key: raw.into(),
            token,
        })
    }

    /// The correlation token embedded in the key.
    pub fn token(&self) -> TransactionToken {
        self.token
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Display for TempName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key)
    }
}

/// Manifest key for a transaction.
pub fn manifest_key(token: &TransactionToken) -> String {
    format!("{MANIFEST_PREFIX}{token}.json")
}

/// Quarantine key for an unreadable manifest.
pub fn quarantine_key(token: &TransactionToken) -> String {
    format!("{QUARANTINE_PREFIX}{token}.json")
}

/// Extracts the token from a manifest key, or `None` for keys that do not
/// follow the manifest naming convention.
pub fn parse_manifest_key(key: &str) -> Option<TransactionToken> {
    let rest = key.strip_prefix(MANIFEST_PREFIX)?;
    let token = rest.strip_suffix(".json")?;
    TransactionToken::parse(token)
}
