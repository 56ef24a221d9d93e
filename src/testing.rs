use anyhow::Result;
use blob_store::BlobStorageConfig;
use tracing::subscriber;
use tracing_subscriber::{layer::SubscriberExt, Layer};

use crate::{config::ServerConfig, service::Service};

pub const TEST_BUCKET: &str = "test-bucket";

pub struct TestService {
    pub service: Service,
}

impl TestService {
    pub fn new() -> Result<Self> {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
        let _ = subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_filter(env_filter)),
        );

        let cfg = ServerConfig {
            blob_storage: BlobStorageConfig {
                path: format!("memory://{}", TEST_BUCKET),
                ..Default::default()
            },
            ..Default::default()
        };
        let srv = Service::new(cfg)?;

        Ok(Self { service: srv })
    }

    /// Same service with a smaller upload limit.
    pub fn with_max_upload_bytes(max_upload_bytes: usize) -> Result<Self> {
        let mut test_service = Self::new()?;
        let mut config = (*test_service.service.config).clone();
        config.max_upload_bytes = max_upload_bytes;
        test_service.service.config = config.into();
        Ok(test_service)
    }
}
