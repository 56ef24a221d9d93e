//! Backend selection from Cloud Foundry service bindings.
//!
//! `VCAP_SERVICES` lists the services bound to the application. The plan of
//! the `objectstore` binding decides which provider is used, and its
//! credentials become the blob storage configuration.

use std::fmt;

use anyhow::{anyhow, Context, Result};
use base64::{prelude::BASE64_STANDARD, Engine};
use blob_store::BlobStorageConfig;
use serde::Deserialize;
use tracing::debug;

pub const VCAP_SERVICES: &str = "VCAP_SERVICES";

const S3_PLAN: &str = "s3-standard";
const GCS_PLAN: &str = "gcs-standard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    CloudAws,
    CloudGcp,
    Local,
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Profile::CloudAws => "cloud-aws",
            Profile::CloudGcp => "cloud-gcp",
            Profile::Local => "local",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Deserialize)]
struct VcapServices {
    #[serde(default)]
    objectstore: Vec<ServiceBinding>,
}

#[derive(Debug, Deserialize)]
struct ServiceBinding {
    plan: String,
    #[serde(default)]
    credentials: Credentials,
}

#[derive(Default, Deserialize)]
struct Credentials {
    bucket: Option<String>,
    // cloud-aws
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    region: Option<String>,
    host: Option<String>,
    // cloud-gcp
    #[serde(rename = "base64EncodedPrivateKeyData")]
    base64_encoded_private_key_data: Option<String>,
    #[serde(rename = "projectId")]
    project_id: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("host", &self.host)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

/// Profile and storage configuration of the object store binding.
///
/// When several object store instances are bound, the last one wins.
pub fn from_vcap_services(vcap_services: &str) -> Result<(Profile, BlobStorageConfig)> {
    let mut services: VcapServices =
        serde_json::from_str(vcap_services).context("VCAP_SERVICES is not valid JSON")?;
    let binding = services
        .objectstore
        .pop()
        .ok_or_else(|| anyhow!("no objectstore service bound"))?;
    debug!(plan = %binding.plan, credentials = ?binding.credentials, "found objectstore binding");

    match binding.plan.as_str() {
        S3_PLAN => Ok((Profile::CloudAws, aws_config(binding.credentials)?)),
        GCS_PLAN => Ok((Profile::CloudGcp, gcp_config(binding.credentials)?)),
        other => Err(anyhow!("unsupported object store service plan: {}", other)),
    }
}

fn aws_config(credentials: Credentials) -> Result<BlobStorageConfig> {
    let bucket = required(credentials.bucket, "bucket")?;
    let access_key_id = required(credentials.access_key_id, "access_key_id")?;
    let secret_access_key = required(credentials.secret_access_key, "secret_access_key")?;

    // Without a region the host is the only hint where the bucket lives.
    let endpoint = match (&credentials.region, credentials.host) {
        (None, Some(host)) if host.contains("://") => Some(host),
        (None, Some(host)) => Some(format!("https://{}", host)),
        _ => None,
    };

    Ok(BlobStorageConfig {
        path: format!("s3://{}", bucket),
        region: credentials.region,
        endpoint,
        access_key_id: Some(access_key_id),
        secret_access_key: Some(secret_access_key),
        service_account_key: None,
    })
}

fn gcp_config(credentials: Credentials) -> Result<BlobStorageConfig> {
    let bucket = required(credentials.bucket, "bucket")?;
    let encoded_key = required(
        credentials.base64_encoded_private_key_data,
        "base64EncodedPrivateKeyData",
    )?;
    let key_bytes = BASE64_STANDARD
        .decode(encoded_key.trim())
        .context("base64EncodedPrivateKeyData is not valid base64")?;
    let service_account_key =
        String::from_utf8(key_bytes).context("service account key is not valid UTF-8")?;
    if let Some(project_id) = &credentials.project_id {
        debug!(project_id = %project_id, "gcs project");
    }

    Ok(BlobStorageConfig {
        path: format!("gs://{}", bucket),
        region: None,
        endpoint: None,
        access_key_id: None,
        secret_access_key: None,
        service_account_key: Some(service_account_key),
    })
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("objectstore credentials are missing '{}'", field))
}
