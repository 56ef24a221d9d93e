use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use blob_store::{BlobResult, BlobStorage, GetResult};
use bytes::Bytes;
use tracing::{error, info};

use crate::http_objects::BlobFile;

const DESCRIPTION_KEY: &str = "description";
const DESCRIPTION_VALUE: &str = "sample content";

/// File operations exposed over HTTP.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Uploads `bytes` as `name` and returns a confirmation message.
    async fn upload_file(
        &self,
        bytes: Bytes,
        name: &str,
        content_type: Option<&str>,
    ) -> BlobResult<String>;

    /// Deletes `name`. `Ok(false)` when the file is still there afterwards.
    async fn delete_file(&self, name: &str) -> BlobResult<bool>;

    async fn get_file(&self, name: &str) -> BlobResult<GetResult>;

    async fn list_files(&self) -> BlobResult<Vec<BlobFile>>;

    async fn file_exists(&self, name: &str) -> BlobResult<bool>;
}

/// [`StorageService`] over the configured bucket.
pub struct BucketStorageService {
    storage: Arc<BlobStorage>,
}

impl BucketStorageService {
    pub fn new(storage: Arc<BlobStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl StorageService for BucketStorageService {
    async fn upload_file(
        &self,
        bytes: Bytes,
        name: &str,
        content_type: Option<&str>,
    ) -> BlobResult<String> {
        let user_metadata = HashMap::from([(
            DESCRIPTION_KEY.to_string(),
            DESCRIPTION_VALUE.to_string(),
        )]);
        let result = self
            .storage
            .put(name, bytes, content_type, &user_metadata)
            .await
            .inspect_err(|e| error!("error occurred while uploading the object {}: {}", name, e))?;
        info!(
            name = %result.name,
            size_bytes = result.size_bytes,
            url = %result.url,
            "file uploaded"
        );
        Ok(format!("{} is successfully uploaded.", name))
    }

    async fn delete_file(&self, name: &str) -> BlobResult<bool> {
        self.storage.delete(name).await?;
        let removed = !self.storage.exists(name).await?;
        if removed {
            info!("{} is successfully deleted.", name);
        }
        Ok(removed)
    }

    async fn get_file(&self, name: &str) -> BlobResult<GetResult> {
        let file = self.storage.get(name).await?;
        info!("{} is successfully downloaded.", name);
        Ok(file)
    }

    async fn list_files(&self) -> BlobResult<Vec<BlobFile>> {
        let files = self.storage.list().await?;
        Ok(files.into_iter().map(BlobFile::from).collect())
    }

    async fn file_exists(&self, name: &str) -> BlobResult<bool> {
        self.storage.exists(name).await
    }
}
