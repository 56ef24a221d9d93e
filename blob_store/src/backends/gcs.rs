//! Google Cloud Storage backend.

use std::sync::Arc;

use object_store::{gcp::GoogleCloudStorageBuilder, path::Path};
use tracing::debug;
use url::Url;

use super::{bucket_from_url, provider_error, Backend, BackendKind};
use crate::{BlobResult, BlobStorageConfig};

const GCS_PUBLIC_HOST: &str = "https://storage.googleapis.com";

pub fn build(url: &Url, config: &BlobStorageConfig) -> BlobResult<Backend> {
    let bucket = bucket_from_url(url)?;
    let prefix = Path::from(url.path());

    let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(&bucket);
    if let Some(key) = &config.service_account_key {
        builder = builder.with_service_account_key(key);
    }
    let store = builder.build().map_err(provider_error)?;
    debug!(bucket = %bucket, prefix = %prefix, "created gcs blob store");

    let url_base = format!("{}/{}", GCS_PUBLIC_HOST, bucket);
    Ok(Backend::new(
        BackendKind::Gcs,
        Arc::new(store),
        bucket,
        prefix,
        url_base,
    ))
}
