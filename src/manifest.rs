//! Durable wire form of a transaction record.
//!
//! Explicit encode/decode functions, called directly by the executor: no
//! serialization-framework hooks, no hidden control flow. The wire form is a
//! small versioned JSON document; unknown fields are ignored for forward
//! compatibility, but truncated or otherwise unreadable input is rejected
//! outright so a caller never sees a partially populated record.
//!
//! A manifest with even one bad entry (unparseable temp key, reserved-prefix
//! final key, token mismatch, duplicate temp) is treated as fully corrupt.
//! Honoring the readable subset could promote some objects while orphaning
//! the rest, which is worse than parking the whole transaction for
//! inspection.

use crate::error::TxnError;
use crate::record::TransactionRecord;
use crate::remote_name::{FinalName, TempName, TransactionToken};
use serde::{Deserialize, Serialize};

const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ManifestDoc {
    version: u32,
    token: String,
    renames: Vec<ManifestEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ManifestEntry {
    temp: String,
    #[serde(rename = "final")]
    final_name: String,
}

/// Serializes a record for upload. Applied flags are deliberately not part
/// of the wire form.
pub fn encode(record: &TransactionRecord) -> Result<Vec<u8>, TxnError> {
    let doc = ManifestDoc {
        version: MANIFEST_VERSION,
        token: record.token().to_string(),
        renames: record
            .pairs()
            .iter()
            .map(|p| ManifestEntry {
                temp: p.temp.as_str().into(),
                final_name: p.final_name.as_str().into(),
            })
            .collect(),
    };
    Ok(serde_json::to_vec(&doc)?)
}

/// Rebuilds a record from manifest bytes fetched off the remote store.
///
/// `key` is the manifest's remote key, used only for error reporting. Every
/// pair in the returned record is un-applied; replay re-verifies each one
/// against the store.
pub fn decode(key: &str, bytes: &[u8]) -> Result<TransactionRecord, TxnError> {
    let corrupt = |reason: String| TxnError::CorruptManifest {
        key: key.into(),
        reason,
    };

    let doc: ManifestDoc =
        serde_json::from_slice(bytes).map_err(|e| corrupt(format!("unreadable JSON: {e}")))?;

    if doc.version > MANIFEST_VERSION {
        return Err(corrupt(format!("unsupported version {}", doc.version)));
    }

    let token = TransactionToken::parse(&doc.token)
        .ok_or_else(|| corrupt(format!("bad transaction token {:?}", doc.token)))?;

    let mut record = TransactionRecord::new(token);
    for entry in &doc.renames {
        let temp = TempName::parse(&entry.temp)
            .map_err(|_| corrupt(format!("bad temporary name {:?}", entry.temp)))?;
        if temp.token() != token {
            return Err(corrupt(format!(
                "entry {:?} belongs to transaction {}",
                entry.temp,
                temp.token()
            )));
        }
        let final_name = FinalName::new(entry.final_name.clone())
            .map_err(|_| corrupt(format!("bad final name {:?}", entry.final_name)))?;
        record
            .add_rename(temp, final_name)
            .map_err(|_| corrupt(format!("duplicate temporary name {:?}", entry.temp)))?;
    }

    Ok(record)
}
