//! Blob storage for the object storage facade.
//!
//! This crate wraps [`object_store`] behind a single [`BlobStorage`]
//! repository. It supports:
//!
//! - Multiple backends: S3, GCS, local filesystem and an in-memory store
//! - Listing with per-blob metadata (etag, size, content type, user metadata)
//! - Single-request uploads with content type and user metadata attributes
//! - Streaming downloads
//!
//! # Usage
//!
//! ```rust,no_run
//! use blob_store::{BlobStorage, BlobStorageConfig};
//!
//! # async fn example() -> Result<(), blob_store::BlobError> {
//! let config = BlobStorageConfig {
//!     path: "s3://my-bucket".to_string(),
//!     region: Some("eu-central-1".to_string()),
//!     ..Default::default()
//! };
//! let storage = BlobStorage::new(config)?;
//!
//! for blob in storage.list().await? {
//!     println!("{} ({} bytes)", blob.name, blob.size_bytes);
//! }
//! # Ok(())
//! # }
//! ```

mod backends;
mod config;
mod error;
mod metadata;
mod metrics;
mod storage;

pub use backends::{Backend, BackendKind};
pub use config::{default_blob_store_path, BlobStorageConfig};
pub use error::{BlobError, BlobResult};
pub use metadata::BlobMetadata;
pub use metrics::{BlobMetrics, Timer};
pub use storage::{BlobStorage, GetResult, PutResult};
