//! Local filesystem backend.

use std::sync::Arc;

use anyhow::Context;
use object_store::{local::LocalFileSystem, path::Path};
use tracing::debug;
use url::Url;

use super::{provider_error, Backend, BackendKind};
use crate::{BlobError, BlobResult};

pub fn build(url: &Url) -> BlobResult<Backend> {
    let root = url.to_file_path().map_err(|_| BlobError::InvalidUri {
        uri: url.to_string(),
        reason: "not an absolute file path".to_string(),
    })?;
    std::fs::create_dir_all(&root)
        .with_context(|| format!("creating blob store directory {}", root.display()))?;

    let store = LocalFileSystem::new_with_prefix(&root).map_err(provider_error)?;
    let bucket = root
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("local")
        .to_string();
    debug!(root = %root.display(), "created local blob store");

    let url_base = format!("file://{}", root.display());
    Ok(Backend::new(
        BackendKind::Local,
        Arc::new(store),
        bucket,
        Path::default(),
        url_base,
    ))
}
