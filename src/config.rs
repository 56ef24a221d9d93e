use std::{fmt::Debug, net::SocketAddr, path::Path};

use anyhow::{Context, Result};
use blob_store::BlobStorageConfig;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::profile::{self, Profile};

const LOCAL_ENV: &str = "local";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Prefix of environment variables overriding the config file, e.g.
/// `OBJECTSTORE_LISTEN_ADDR` or `OBJECTSTORE_BLOB_STORAGE__PATH`.
pub const ENV_PREFIX: &str = "OBJECTSTORE_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_env")]
    pub env: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default)]
    pub blob_storage: BlobStorageConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Request body limit for uploads.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            env: default_env(),
            listen_addr: default_listen_addr(),
            blob_storage: Default::default(),
            telemetry: Default::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

fn default_env() -> String {
    LOCAL_ENV.to_string()
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

impl ServerConfig {
    /// Defaults, then the optional YAML file, then `OBJECTSTORE_*` variables.
    pub fn load(path: Option<&Path>) -> Result<ServerConfig> {
        let mut figment = Figment::from(Serialized::defaults(ServerConfig::default()));
        if let Some(path) = path {
            let config_str = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            figment = figment.merge(Yaml::string(&config_str));
        }
        let mut config: ServerConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        config.resolve_instance_id();
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(anyhow::anyhow!(
                "invalid listen address: {}",
                self.listen_addr
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("max_upload_bytes must be greater than 0"));
        }
        Ok(())
    }

    /// Replace the blob storage settings with the bound object store service
    /// from `VCAP_SERVICES`, if there is one.
    pub fn apply_service_bindings(&mut self) -> Result<Profile> {
        let vcap_services = std::env::var(profile::VCAP_SERVICES).ok();
        self.apply_service_bindings_from(vcap_services.as_deref())
    }

    pub fn apply_service_bindings_from(&mut self, vcap_services: Option<&str>) -> Result<Profile> {
        let Some(vcap_services) = vcap_services else {
            return Ok(Profile::Local);
        };
        let (profile, blob_storage) = profile::from_vcap_services(vcap_services)
            .context("error reading object store service binding")?;
        info!(profile = %profile, path = %blob_storage.path, "using bound object store service");
        self.blob_storage = blob_storage;
        Ok(profile)
    }

    pub fn structured_logging(&self) -> bool {
        self.env != LOCAL_ENV
    }

    /// Pin a generated instance id when none is configured, so every span
    /// of this process reports the same one.
    pub fn resolve_instance_id(&mut self) {
        if self.telemetry.instance_id.is_none() {
            self.telemetry.instance_id = Some(format!("{}-{}", self.env, Uuid::new_v4()));
        }
    }

    pub fn instance_id(&self) -> String {
        self.telemetry
            .instance_id
            .clone()
            .unwrap_or_else(|| self.env.clone())
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TracingExporter {
    Otlp,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    // OpenTelemetry collector grpc endpoint.
    // Defaults to OTEL_EXPORTER_OTLP_ENDPOINT or localhost:4317 if empty.
    #[serde(default)]
    pub endpoint: Option<String>,
    // Traces are only exported when an exporter is set.
    #[serde(default)]
    pub tracing_exporter: Option<TracingExporter>,
    #[serde(default)]
    pub instance_id: Option<String>,
}

impl TelemetryConfig {
    pub fn tracing_enabled(&self) -> bool {
        self.tracing_exporter.is_some()
    }
}
