//! Blob metadata structures.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use object_store::{Attribute, Attributes, ObjectMeta};
use serde::{Deserialize, Serialize};

/// Metadata about a blob, as returned by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlobMetadata {
    /// Blob name relative to the configured prefix.
    pub name: String,

    /// Bucket (or container) holding the blob.
    pub bucket: String,

    /// Provider URL of the blob.
    pub url: String,

    /// Size in bytes.
    pub size_bytes: u64,

    pub last_modified: DateTime<Utc>,

    /// ETag from object store (S3/GCS).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Content type / MIME type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// User defined annotations stored alongside the blob.
    #[serde(default)]
    pub user_metadata: HashMap<String, String>,
}

impl BlobMetadata {
    pub(crate) fn from_object_meta(
        name: String,
        bucket: String,
        url: String,
        meta: &ObjectMeta,
        attributes: &Attributes,
    ) -> Self {
        let mut content_type = None;
        let mut user_metadata = HashMap::new();
        for (attribute, value) in attributes.iter() {
            match attribute {
                Attribute::ContentType => content_type = Some(value.to_string()),
                Attribute::Metadata(key) => {
                    user_metadata.insert(key.to_string(), value.to_string());
                }
                _ => {}
            }
        }

        Self {
            name,
            bucket,
            url,
            size_bytes: meta.size,
            last_modified: meta.last_modified,
            etag: meta.e_tag.clone(),
            content_type,
            user_metadata,
        }
    }
}
