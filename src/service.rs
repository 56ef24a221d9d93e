use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum_server::Handle;
use blob_store::BlobStorage;
use tokio::signal;
use tracing::{error, info};

use crate::{
    config::ServerConfig,
    routes::{create_routes, RouteState},
    storage_service::{BucketStorageService, StorageService},
};

#[derive(Clone)]
pub struct Service {
    pub config: Arc<ServerConfig>,
    pub blob_storage: Arc<BlobStorage>,
    pub storage_service: Arc<dyn StorageService>,
}

impl Service {
    pub fn new(mut config: ServerConfig) -> Result<Self> {
        config.resolve_instance_id();
        let blob_storage = Arc::new(
            BlobStorage::new(config.blob_storage.clone())
                .context("error initializing BlobStorage")?,
        );
        info!(
            backend = %blob_storage.kind(),
            bucket = blob_storage.bucket(),
            "blob storage initialized"
        );
        let storage_service = Arc::new(BucketStorageService::new(blob_storage.clone()));

        Ok(Self {
            config: Arc::new(config),
            blob_storage,
            storage_service,
        })
    }

    pub fn route_state(&self) -> RouteState {
        RouteState {
            storage: self.storage_service.clone(),
            config: self.config.clone(),
        }
    }

    pub async fn start(&self) -> Result<()> {
        let handle = Handle::new();
        let handle_sh = handle.clone();
        tokio::spawn(async move {
            shutdown_signal(handle_sh).await;
        });

        let addr: SocketAddr = self.config.listen_addr.parse()?;
        info!("server api listening on {}", self.config.listen_addr);
        let routes = create_routes(self.route_state());
        axum_server::bind(addr)
            .handle(handle)
            .serve(routes.into_make_service())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
        },
        _ = terminate => {
        },
    }
    handle.graceful_shutdown(None);
    info!("signal received, shutting down server gracefully");
}
