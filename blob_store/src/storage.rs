//! Blob repository over a configured backend.

use std::collections::HashMap;

use bytes::Bytes;
use futures::{stream::BoxStream, StreamExt, TryStreamExt};
use object_store::{
    path::Path,
    Attribute,
    AttributeValue,
    Attributes,
    GetOptions,
    ObjectMeta,
    PutOptions,
    PutPayload,
};
use opentelemetry::KeyValue;
use tracing::{debug, warn};

use crate::{
    metrics::Timer,
    Backend,
    BackendKind,
    BlobError,
    BlobMetadata,
    BlobMetrics,
    BlobResult,
    BlobStorageConfig,
};

/// Result of a PUT operation.
#[derive(Debug, Clone)]
pub struct PutResult {
    pub name: String,

    /// Provider URL of the stored blob.
    pub url: String,

    pub size_bytes: u64,

    pub etag: Option<String>,
}

/// A blob being downloaded.
pub struct GetResult {
    pub metadata: BlobMetadata,
    pub stream: BoxStream<'static, BlobResult<Bytes>>,
}

/// Repository for the blobs of one bucket.
///
/// Every method is a single call into [`object_store`], except [`list`]
/// which also fetches the attributes of each listed blob.
///
/// [`list`]: BlobStorage::list
pub struct BlobStorage {
    backend: Backend,
    metrics: BlobMetrics,
}

impl BlobStorage {
    pub fn new(config: BlobStorageConfig) -> BlobResult<Self> {
        debug!(config = ?config, "creating blob storage");
        let backend = Backend::from_config(&config)?;
        Ok(Self::from_backend(backend))
    }

    pub fn from_backend(backend: Backend) -> Self {
        Self {
            backend,
            metrics: BlobMetrics::global(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.backend.bucket
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind
    }

    /// All blobs under the configured prefix, with their metadata.
    pub async fn list(&self) -> BlobResult<Vec<BlobMetadata>> {
        let _timer = self.timer("list");
        let prefix = (!self.backend.prefix.as_ref().is_empty()).then_some(&self.backend.prefix);
        let objects: Vec<ObjectMeta> = self
            .backend
            .store
            .list(prefix)
            .try_collect()
            .await
            .map_err(|e| self.observe_error("list", e))?;

        let mut blobs = Vec::with_capacity(objects.len());
        for object in objects {
            let name = self.name_of(&object.location);
            match self.head_key(&name, &object.location).await {
                Ok(metadata) => blobs.push(metadata),
                // deleted between list and head
                Err(e) if e.is_not_found() => debug!(name = %name, "skipping vanished blob"),
                Err(e) => return Err(e),
            }
        }
        Ok(blobs)
    }

    /// Upload `data` as `name` in a single request.
    pub async fn put(
        &self,
        name: &str,
        data: Bytes,
        content_type: Option<&str>,
        user_metadata: &HashMap<String, String>,
    ) -> BlobResult<PutResult> {
        let _timer = self.timer("put");
        let key = self.key(name)?;
        let size_bytes = data.len() as u64;

        let mut attributes = Attributes::new();
        if self.backend.supports_attributes() {
            if let Some(content_type) = content_type {
                attributes.insert(
                    Attribute::ContentType,
                    AttributeValue::from(content_type.to_string()),
                );
            }
            for (k, v) in user_metadata {
                attributes.insert(
                    Attribute::Metadata(k.clone().into()),
                    AttributeValue::from(v.clone()),
                );
            }
        } else if content_type.is_some() || !user_metadata.is_empty() {
            warn!(
                backend = %self.backend.kind,
                name = %name,
                "backend can't store attributes, dropping content type and user metadata"
            );
        }

        let options = PutOptions {
            attributes,
            ..Default::default()
        };
        let result = self
            .backend
            .store
            .put_opts(&key, PutPayload::from(data), options)
            .await
            .map_err(|e| self.observe_error("put", e))?;

        Ok(PutResult {
            name: name.to_string(),
            url: self.backend.blob_url(&key),
            size_bytes,
            etag: result.e_tag,
        })
    }

    /// Metadata and content stream of `name`.
    ///
    /// Returns `BlobError::NotFound` if the blob doesn't exist.
    pub async fn get(&self, name: &str) -> BlobResult<GetResult> {
        let _timer = self.timer("get");
        let key = self.key(name)?;
        let result = self
            .backend
            .store
            .get(&key)
            .await
            .map_err(|e| self.observe_error("get", e))?;

        let metadata = self.metadata(name.to_string(), &key, &result.meta, &result.attributes);
        let stream = result.into_stream().map_err(BlobError::from).boxed();
        Ok(GetResult { metadata, stream })
    }

    /// Returns `BlobError::NotFound` if the blob doesn't exist.
    pub async fn head(&self, name: &str) -> BlobResult<BlobMetadata> {
        let _timer = self.timer("head");
        let key = self.key(name)?;
        self.head_key(name, &key).await
    }

    pub async fn exists(&self, name: &str) -> BlobResult<bool> {
        match self.head(name).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn delete(&self, name: &str) -> BlobResult<()> {
        let _timer = self.timer("delete");
        let key = self.key(name)?;
        self.backend
            .store
            .delete(&key)
            .await
            .map_err(|e| self.observe_error("delete", e))
    }

    async fn head_key(&self, name: &str, key: &Path) -> BlobResult<BlobMetadata> {
        let options = GetOptions {
            head: true,
            ..Default::default()
        };
        let result = self
            .backend
            .store
            .get_opts(key, options)
            .await
            .map_err(|e| self.observe_error("head", e))?;
        Ok(self.metadata(name.to_string(), key, &result.meta, &result.attributes))
    }

    fn metadata(
        &self,
        name: String,
        key: &Path,
        meta: &ObjectMeta,
        attributes: &Attributes,
    ) -> BlobMetadata {
        BlobMetadata::from_object_meta(
            name,
            self.backend.bucket.clone(),
            self.backend.blob_url(key),
            meta,
            attributes,
        )
    }

    /// Full object key of a blob name.
    fn key(&self, name: &str) -> BlobResult<Path> {
        let invalid = |reason: String| BlobError::InvalidPath {
            name: name.to_string(),
            reason,
        };
        if name.is_empty() {
            return Err(invalid("blob name is empty".to_string()));
        }
        let relative = Path::parse(name).map_err(|e| invalid(e.to_string()))?;
        Ok(Path::from_iter(
            self.backend.prefix.parts().chain(relative.parts()),
        ))
    }

    /// Blob name of a full object key.
    fn name_of(&self, location: &Path) -> String {
        match location.prefix_match(&self.backend.prefix) {
            Some(parts) => parts
                .map(|part| part.as_ref().to_string())
                .collect::<Vec<_>>()
                .join("/"),
            None => location.to_string(),
        }
    }

    fn timer(&self, op: &'static str) -> Timer {
        Timer::start_with_labels(&self.metrics.operations, &[KeyValue::new("op", op)])
    }

    fn observe_error(&self, op: &'static str, e: object_store::Error) -> BlobError {
        let err = BlobError::from(e);
        if !err.is_not_found() {
            self.metrics.record_error(op);
        }
        err
    }
}
