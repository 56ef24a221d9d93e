//! Amazon S3 backend.

use std::sync::Arc;

use object_store::{
    aws::{AmazonS3Builder, AmazonS3ConfigKey},
    path::Path,
};
use tracing::debug;
use url::Url;

use super::{bucket_from_url, provider_error, Backend, BackendKind};
use crate::{BlobResult, BlobStorageConfig};

const DEFAULT_REGION: &str = "us-east-1";

pub fn build(url: &Url, config: &BlobStorageConfig) -> BlobResult<Backend> {
    let bucket = bucket_from_url(url)?;
    let prefix = Path::from(url.path());

    // Environment first so that explicit credentials from the service
    // binding win over whatever AWS_* variables are around.
    let mut builder = AmazonS3Builder::from_env().with_bucket_name(&bucket);
    if let Some(region) = &config.region {
        builder = builder.with_region(region);
    }
    if let Some(access_key_id) = &config.access_key_id {
        builder = builder.with_access_key_id(access_key_id);
    }
    if let Some(secret_access_key) = &config.secret_access_key {
        builder = builder.with_secret_access_key(secret_access_key);
    }
    // For supporting localstack/minio
    if let Some(endpoint) = &config.endpoint {
        builder = builder.with_endpoint(endpoint);
        if endpoint.starts_with("http://") {
            builder = builder.with_allow_http(true);
        }
    }

    let region = builder
        .get_config_value(&AmazonS3ConfigKey::Region)
        .unwrap_or_else(|| DEFAULT_REGION.to_string());
    let endpoint = builder.get_config_value(&AmazonS3ConfigKey::Endpoint);
    let url_base = url_base(&bucket, &region, endpoint.as_deref());

    let store = builder.build().map_err(provider_error)?;
    debug!(bucket = %bucket, region = %region, prefix = %prefix, "created s3 blob store");

    Ok(Backend::new(
        BackendKind::S3,
        Arc::new(store),
        bucket,
        prefix,
        url_base,
    ))
}

fn url_base(bucket: &str, region: &str, endpoint: Option<&str>) -> String {
    match endpoint {
        Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
        None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_base() {
        assert_eq!(
            url_base("reports", "eu-central-1", None),
            "https://reports.s3.eu-central-1.amazonaws.com"
        );
        assert_eq!(
            url_base("reports", "eu-central-1", Some("http://localhost:9000/")),
            "http://localhost:9000/reports"
        );
    }

    #[test]
    fn test_build_with_static_credentials() {
        let url = Url::parse("s3://reports/tenant-a").unwrap();
        let config = BlobStorageConfig {
            path: url.to_string(),
            region: Some("eu-central-1".to_string()),
            access_key_id: Some("AKIAEXAMPLE".to_string()),
            secret_access_key: Some("secret".to_string()),
            endpoint: Some("http://localhost:9000".to_string()),
            ..Default::default()
        };
        let backend = build(&url, &config).unwrap();
        assert_eq!(backend.kind, BackendKind::S3);
        assert_eq!(backend.bucket, "reports");
        assert_eq!(backend.prefix, Path::from("tenant-a"));
        assert_eq!(
            backend.blob_url(&Path::from("tenant-a/x.txt")),
            "http://localhost:9000/reports/tenant-a/x.txt"
        );
    }
}
