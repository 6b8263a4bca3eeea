//! Transaction layer configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the transaction executor and the S3 transport.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TxnConfig {
    /// S3 bucket name.
    pub s3_bucket: String,

    /// AWS region for S3.
    pub s3_region: String,

    /// Optional S3 endpoint override (for MinIO in testing).
    pub s3_endpoint_override: Option<String>,

    /// Retry attempts per storage operation before a transient failure is
    /// reported as a transaction-blocked condition.
    pub max_retries: u32,

    /// Base delay for exponential backoff, in milliseconds.
    pub retry_base_ms: u64,

    /// Backoff ceiling, in milliseconds.
    pub retry_cap_ms: u64,
}

impl Default for TxnConfig {
    fn default() -> Self {
        Self {
            s3_bucket: "sync-remote".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_endpoint_override: None,
            max_retries: 4,
            retry_base_ms: 250,
            retry_cap_ms: 8_000,
        }
    }
}

impl TxnConfig {
    /// Backoff delay before the given retry attempt (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = self.retry_base_ms.saturating_mul(1u64 << attempt.min(16));
        Duration::from_millis(exp.min(self.retry_cap_ms))
    }

    /// Fast-retry config for tests (and MinIO endpoints).
    pub fn test() -> Self {
        Self {
            s3_bucket: "sync-remote".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_endpoint_override: Some("http://localhost:9000".to_string()),
            max_retries: 3,
            retry_base_ms: 1,
            retry_cap_ms: 10,
        }
    }
}
