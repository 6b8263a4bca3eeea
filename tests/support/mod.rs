//! Shared test helpers: an in-memory storage transport with fault injection.

use remote_txn::{StorageError, StorageTransport};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Which error an injected fault produces.
#[derive(Clone, Copy, Debug)]
pub enum FaultKind {
    Transient,
    PermissionDenied,
}

struct Fault {
    op: &'static str,
    key_fragment: String,
    remaining: usize,
    kind: FaultKind,
}

/// HashMap-backed transport standing in for the remote store.
///
/// `fail_next` arms a fault that fires on the next N matching operations,
/// which is enough to exercise retry exhaustion and parked transactions
/// without a real network.
#[derive(Default)]
pub struct MemoryTransport {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    faults: Mutex<Vec<Fault>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a fault: the next `times` calls of `op` whose key contains
    /// `key_fragment` fail with the given kind.
    pub fn fail_next(&self, op: &'static str, key_fragment: &str, times: usize, kind: FaultKind) {
        self.faults.lock().unwrap().push(Fault {
            op,
            key_fragment: key_fragment.to_string(),
            remaining: times,
            kind,
        });
    }

    /// Seeds an object directly, bypassing the trait (for building crash
    /// states by hand).
    pub fn seed(&self, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    /// Every key currently on the store, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    fn check_fault(&self, op: &'static str, key: &str) -> Result<(), StorageError> {
        let mut faults = self.faults.lock().unwrap();
        for fault in faults.iter_mut() {
            if fault.op == op && fault.remaining > 0 && key.contains(&fault.key_fragment) {
                fault.remaining -= 1;
                return Err(match fault.kind {
                    FaultKind::Transient => {
                        StorageError::Transient(format!("injected fault: {op} {key}"))
                    }
                    FaultKind::PermissionDenied => {
                        StorageError::PermissionDenied(format!("injected fault: {op} {key}"))
                    }
                });
            }
        }
        Ok(())
    }
}

impl StorageTransport for MemoryTransport {
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), StorageError> {
        self.check_fault("put", key)?;
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.check_fault("get", key)?;
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.check_fault("delete", key)?;
        // Idempotent: removing a missing key succeeds.
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), StorageError> {
        self.check_fault("rename", from)?;
        let mut objects = self.objects.lock().unwrap();
        let data = objects
            .remove(from)
            .ok_or_else(|| StorageError::NotFound(from.to_string()))?;
        objects.insert(to.to_string(), data);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.check_fault("exists", key)?;
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.check_fault("list", prefix)?;
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
