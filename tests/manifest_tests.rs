use pretty_assertions::assert_eq;
use remote_txn::manifest::{decode, encode};
use remote_txn::{FinalName, TempName, TransactionRecord, TransactionToken, TxnError};

const KEY: &str = "transactions/test.json";

fn record_with(finals: &[&str]) -> TransactionRecord {
    let token = TransactionToken::new();
    let mut record = TransactionRecord::new(token);
    for name in finals {
        let final_name = FinalName::new(*name).unwrap();
        let temp = TempName::derive(&final_name, &token);
        record.add_rename(temp, final_name).unwrap();
    }
    record
}

#[test]
fn round_trip_preserves_token_and_pair_order() {
    let record = record_with(&["databases/db-2", "databases/db-1", "multichunks/mc-3"]);
    let decoded = decode(KEY, &encode(&record).unwrap()).unwrap();

    assert_eq!(decoded.token(), record.token());
    let got: Vec<(&str, &str)> = decoded
        .pairs()
        .iter()
        .map(|p| (p.temp.as_str(), p.final_name.as_str()))
        .collect();
    let want: Vec<(&str, &str)> = record
        .pairs()
        .iter()
        .map(|p| (p.temp.as_str(), p.final_name.as_str()))
        .collect();
    assert_eq!(got, want);
}

#[test]
fn decode_resets_applied_state() {
    let mut record = record_with(&["databases/db-1", "databases/db-2"]);
    let temps: Vec<TempName> = record.pairs().iter().map(|p| p.temp.clone()).collect();
    for temp in &temps {
        record.mark_applied(temp);
    }
    assert!(record.is_fully_applied());

    let decoded = decode(KEY, &encode(&record).unwrap()).unwrap();
    assert!(decoded.pairs().iter().all(|p| !p.is_applied()));
}

#[test]
fn garbage_bytes_are_corrupt() {
    for bytes in [&b""[..], &b"not json"[..], &b"{\"version\":1"[..]] {
        let err = decode(KEY, bytes).unwrap_err();
        assert!(matches!(err, TxnError::CorruptManifest { .. }));
    }
}

#[test]
fn truncated_manifest_is_corrupt_not_partial() {
    let bytes = encode(&record_with(&["a", "b", "c"])).unwrap();
    for cut in [1, bytes.len() / 3, bytes.len() - 2] {
        let err = decode(KEY, &bytes[..cut]).unwrap_err();
        assert!(matches!(err, TxnError::CorruptManifest { .. }), "cut at {cut}");
    }
}

#[test]
fn unknown_trailing_fields_are_tolerated() {
    let record = record_with(&["databases/db-1"]);
    let mut doc: serde_json::Value = serde_json::from_slice(&encode(&record).unwrap()).unwrap();
    doc["signature"] = serde_json::json!("ed25519:abcdef");
    doc["renames"][0]["checksum"] = serde_json::json!("sha256:123");

    let decoded = decode(KEY, &serde_json::to_vec(&doc).unwrap()).unwrap();
    assert_eq!(decoded.token(), record.token());
    assert_eq!(decoded.len(), 1);
}

#[test]
fn missing_required_fields_are_corrupt() {
    let mut doc: serde_json::Value =
        serde_json::from_slice(&encode(&record_with(&["x"])).unwrap()).unwrap();
    doc.as_object_mut().unwrap().remove("token");
    let err = decode(KEY, &serde_json::to_vec(&doc).unwrap()).unwrap_err();
    assert!(matches!(err, TxnError::CorruptManifest { .. }));
}

#[test]
fn single_bad_temp_name_rejects_the_whole_manifest() {
    // A partially-corrupt manifest is never partially honored.
    let mut doc: serde_json::Value =
        serde_json::from_slice(&encode(&record_with(&["a", "b"])).unwrap()).unwrap();
    doc["renames"][1]["temp"] = serde_json::json!("temp/broken");
    let err = decode(KEY, &serde_json::to_vec(&doc).unwrap()).unwrap_err();
    assert!(matches!(err, TxnError::CorruptManifest { .. }));
}

#[test]
fn reserved_prefix_final_name_is_corrupt() {
    let record = record_with(&["a"]);
    let mut doc: serde_json::Value = serde_json::from_slice(&encode(&record).unwrap()).unwrap();
    doc["renames"][0]["final"] = serde_json::json!("transactions/evil.json");
    let err = decode(KEY, &serde_json::to_vec(&doc).unwrap()).unwrap_err();
    assert!(matches!(err, TxnError::CorruptManifest { .. }));
}

#[test]
fn duplicate_temp_entries_are_corrupt() {
    let record = record_with(&["a"]);
    let mut doc: serde_json::Value = serde_json::from_slice(&encode(&record).unwrap()).unwrap();
    let entry = doc["renames"][0].clone();
    doc["renames"].as_array_mut().unwrap().push(entry);
    let err = decode(KEY, &serde_json::to_vec(&doc).unwrap()).unwrap_err();
    assert!(matches!(err, TxnError::CorruptManifest { .. }));
}

#[test]
fn future_version_is_corrupt() {
    let mut doc: serde_json::Value =
        serde_json::from_slice(&encode(&record_with(&["x"])).unwrap()).unwrap();
    doc["version"] = serde_json::json!(99);
    let err = decode(KEY, &serde_json::to_vec(&doc).unwrap()).unwrap_err();
    assert!(matches!(err, TxnError::CorruptManifest { .. }));
}

#[test]
fn entry_from_a_foreign_transaction_is_corrupt() {
    // Every temp key embeds its token; a mismatch means the manifest was
    // stitched together wrong and cannot be trusted.
    let record = record_with(&["databases/db-1"]);
    let mut doc: serde_json::Value = serde_json::from_slice(&encode(&record).unwrap()).unwrap();
    let foreign = TempName::derive(
        &FinalName::new("databases/db-1").unwrap(),
        &TransactionToken::new(),
    );
    doc["renames"][0]["temp"] = serde_json::json!(foreign.as_str());
    let err = decode(KEY, &serde_json::to_vec(&doc).unwrap()).unwrap_err();
    assert!(matches!(err, TxnError::CorruptManifest { .. }));
}

#[test]
fn empty_record_round_trips_as_a_noop_transaction() {
    let record = TransactionRecord::new(TransactionToken::new());
    let decoded = decode(KEY, &encode(&record).unwrap()).unwrap();
    assert_eq!(decoded.token(), record.token());
    assert!(decoded.is_empty());
    assert!(decoded.is_fully_applied());
}

#[test]
fn corrupt_error_names_the_manifest_key() {
    let err = decode("transactions/deadbeef.json", b"garbage").unwrap_err();
    match err {
        TxnError::CorruptManifest { key, .. } => assert_eq!(key, "transactions/deadbeef.json"),
        other => panic!("unexpected error: {other}"),
    }
}
