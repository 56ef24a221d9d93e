//! Blob store backend implementations.
//!
//! Each backend turns a [`BlobStorageConfig`] into an [`ObjectStore`] client
//! plus the bits of provider knowledge the repository needs: the bucket name,
//! the key prefix and how to render a blob URL.

use std::{fmt, sync::Arc};

use object_store::{path::Path, ObjectStore};
use url::Url;

use crate::{BlobError, BlobResult, BlobStorageConfig};

pub mod gcs;
pub mod local;
pub mod memory;
pub mod s3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    S3,
    Gcs,
    Local,
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::S3 => "s3",
            BackendKind::Gcs => "gcs",
            BackendKind::Local => "local",
            BackendKind::Memory => "memory",
        };
        write!(f, "{}", name)
    }
}

/// A configured object store client.
#[derive(Clone)]
pub struct Backend {
    pub kind: BackendKind,
    pub store: Arc<dyn ObjectStore>,
    /// Bucket (or container) name reported with every blob.
    pub bucket: String,
    /// Key prefix every blob name is resolved under.
    pub prefix: Path,
    url_base: String,
}

impl Backend {
    pub fn new(
        kind: BackendKind,
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        prefix: Path,
        url_base: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            store,
            bucket: bucket.into(),
            prefix,
            url_base: url_base.into(),
        }
    }

    /// Build the backend selected by the scheme of `config.path`.
    pub fn from_config(config: &BlobStorageConfig) -> BlobResult<Self> {
        let url = Url::parse(&config.path).map_err(|e| BlobError::InvalidUri {
            uri: config.path.clone(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "s3" | "s3a" => s3::build(&url, config),
            "gs" => gcs::build(&url, config),
            "file" => local::build(&url),
            "memory" => Ok(memory::build(&url)),
            scheme => Err(BlobError::UnsupportedBackend {
                scheme: scheme.to_string(),
            }),
        }
    }

    /// Local disk can't persist content type or user metadata.
    pub fn supports_attributes(&self) -> bool {
        self.kind != BackendKind::Local
    }

    /// Provider URL for a full object key.
    pub fn blob_url(&self, key: &Path) -> String {
        format!("{}/{}", self.url_base.trim_end_matches('/'), key)
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("kind", &self.kind)
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("url_base", &self.url_base)
            .finish()
    }
}

/// Bucket name from the host part of `scheme://bucket/prefix`.
fn bucket_from_url(url: &Url) -> BlobResult<String> {
    match url.host_str() {
        Some(bucket) if !bucket.is_empty() => Ok(bucket.to_string()),
        _ => Err(BlobError::InvalidUri {
            uri: url.to_string(),
            reason: "missing bucket name".to_string(),
        }),
    }
}

fn provider_error(e: object_store::Error) -> BlobError {
    BlobError::NetworkError {
        source: anyhow::Error::from(e),
    }
}
