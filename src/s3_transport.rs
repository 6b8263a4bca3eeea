//! S3 implementation of the storage-primitive boundary.
//!
//! S3 has no native rename, so `rename` is copy+delete; the executor already
//! tolerates the half-state that leaves behind. Deleting a missing key is a
//! success in S3, which matches the trait's idempotence requirement.

use crate::config::TxnConfig;
use crate::transport::{StorageError, StorageTransport};
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use tracing::debug;

/// S3-backed transport for transaction manifests and staged objects.
pub struct S3Transport {
    client: S3Client,
    bucket: String,
}

impl S3Transport {
    /// Builds a transport from the ambient AWS credential chain.
    pub async fn connect(config: &TxnConfig) -> Self {
        let base = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_types::region::Region::new(config.s3_region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&base);
        if let Some(ref endpoint) = config.s3_endpoint_override {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: S3Client::from_conf(builder.build()),
            bucket: config.s3_bucket.clone(),
        }
    }

    /// Builds a transport from explicit credentials (e.g. MinIO in testing).
    pub fn with_credentials(
        config: &TxnConfig,
        access_key_id: &str,
        secret_access_key: &str,
        session_token: Option<String>,
    ) -> Self {
        let credentials = aws_credential_types::Credentials::new(
            access_key_id,
            secret_access_key,
            session_token,
            None,
            "remote-txn",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .region(aws_types::region::Region::new(config.s3_region.clone()))
            .credentials_provider(credentials)
            .behavior_version_latest();

        if let Some(ref endpoint) = config.s3_endpoint_override {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: S3Client::from_conf(builder.build()),
            bucket: config.s3_bucket.clone(),
        }
    }
}

impl StorageTransport for S3Transport {
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), StorageError> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| classify(key, &e))?;

        debug!("uploaded {size} bytes to s3://{}/{key}", self.bucket);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(key, &e))?;

        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Transient(format!("reading body of {key}: {e}")))?;

        let bytes = body.into_bytes().to_vec();
        debug!("downloaded {} bytes from s3://{}/{key}", bytes.len(), self.bucket);
        Ok(bytes)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        // S3 DeleteObject on a missing key succeeds, so idempotence is free.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(key, &e))?;

        debug!("deleted s3://{}/{key}", self.bucket);
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), StorageError> {
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(format!("{}/{from}", self.bucket))
            .key(to)
            .send()
            .await
            .map_err(|e| classify(from, &e))?;

        self.delete(from).await?;
        debug!("moved s3://{}/{from} -> {to}", self.bucket);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                    Ok(false)
                } else {
                    Err(classify(key, &e))
                }
            }
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| classify(prefix, &e))?;

            keys.extend(
                resp.contents()
                    .iter()
                    .filter_map(|obj| obj.key().map(|k| k.to_string())),
            );

            match resp.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }

        Ok(keys)
    }
}

/// Maps an SDK failure onto the transaction layer's error taxonomy.
/// Connection-level failures and throttling retry; everything else surfaces.
fn classify<E, R>(key: &str, err: &SdkError<E, R>) -> StorageError
where
    E: ProvideErrorMetadata,
{
    let detail = format!("{key}: {err}");
    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => StorageError::Transient(detail),
        _ => match err.as_service_error().and_then(|se| se.code()) {
            Some("NoSuchKey" | "NotFound") => StorageError::NotFound(key.to_string()),
            Some("AccessDenied") => StorageError::PermissionDenied(detail),
            Some("SlowDown" | "RequestTimeout" | "InternalError" | "ServiceUnavailable") => {
                StorageError::Transient(detail)
            }
            _ => StorageError::Other(detail),
        },
    }
}
