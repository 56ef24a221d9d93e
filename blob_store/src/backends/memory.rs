//! In-memory backend, for development and tests.

use std::sync::Arc;

use object_store::{memory::InMemory, path::Path};
use url::Url;

use super::{Backend, BackendKind};

const DEFAULT_BUCKET: &str = "memory";

pub fn build(url: &Url) -> Backend {
    let bucket = url
        .host_str()
        .filter(|host| !host.is_empty())
        .unwrap_or(DEFAULT_BUCKET)
        .to_string();
    let url_base = format!("memory://{}", bucket);
    Backend::new(
        BackendKind::Memory,
        Arc::new(InMemory::new()),
        bucket,
        Path::from(url.path()),
        url_base,
    )
}
