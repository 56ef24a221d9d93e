//! Blob storage configuration.

use std::{env, fmt};

use serde::{Deserialize, Serialize};

/// Configuration for blob storage.
#[derive(Clone, Serialize, Deserialize)]
pub struct BlobStorageConfig {
    /// Storage location (e.g., `s3://bucket/prefix`, `gs://bucket`,
    /// `file:///path`, `memory://`).
    #[serde(default = "default_blob_store_path")]
    pub path: String,

    /// AWS region (for S3).
    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint for S3 compatible services (minio, localstack, ...).
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Static S3 access key. Falls back to the `AWS_*` environment when
    /// unset.
    #[serde(default)]
    pub access_key_id: Option<String>,

    #[serde(default)]
    pub secret_access_key: Option<String>,

    /// GCS service account key as JSON text.
    #[serde(default)]
    pub service_account_key: Option<String>,
}

impl Default for BlobStorageConfig {
    fn default() -> Self {
        Self {
            path: default_blob_store_path(),
            region: None,
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            service_account_key: None,
        }
    }
}

impl fmt::Debug for BlobStorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("BlobStorageConfig")
            .field("path", &self.path)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &redacted(&self.access_key_id))
            .field("secret_access_key", &redacted(&self.secret_access_key))
            .field("service_account_key", &redacted(&self.service_account_key))
            .finish()
    }
}

/// Default blob store path (local filesystem).
pub fn default_blob_store_path() -> String {
    format!(
        "file://{}",
        env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join("objectstore_storage/blobs")
            .to_str()
            .unwrap_or("./objectstore_storage/blobs")
    )
}
