use std::path::PathBuf;

use ::tracing::{error, info, info_span};
use clap::Parser;
use service::Service;
use telemetry::setup_tracing;
use utoipa::OpenApi;

mod config;
mod http_objects;
mod middleware;
mod profile;
mod routes;
mod service;
mod storage_service;
mod telemetry;

#[cfg(test)]
mod integration_test_http_routes;
#[cfg(test)]
mod testing;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "config file", help = "Path to config file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Print the OpenAPI document as YAML and exit")]
    gen_openapi: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.gen_openapi {
        match routes::ApiDoc::openapi().to_yaml() {
            Ok(yaml) => println!("{}", yaml),
            Err(err) => eprintln!("Error generating OpenAPI document: {:?}", err),
        }
        return;
    }

    let mut config = match config::ServerConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading config: {:?}", err);
            std::process::exit(1);
        }
    };

    let tracing_provider = match setup_tracing(&config) {
        Ok(provider) => provider,
        Err(err) => {
            eprintln!("Error setting up tracing: {:?}", err);
            std::process::exit(1);
        }
    };

    match config.apply_service_bindings() {
        Ok(profile) => info!(profile = %profile, "active profile"),
        Err(err) => {
            error!("Error reading service bindings: {:?}", err);
            shutdown_tracer(tracing_provider);
            std::process::exit(1);
        }
    }

    let root_span = info_span!(
        "objectstore",
        env = config.env,
        "objectstore-instance" = config.instance_id()
    );
    let _guard = root_span.enter();

    match Service::new(config) {
        Ok(service) => {
            if let Err(err) = service.start().await {
                error!("Error starting service: {:?}", err);
            }
        }
        Err(err) => error!("Error creating service: {:?}", err),
    }

    shutdown_tracer(tracing_provider);
}

// export traces before shutdown
fn shutdown_tracer(tracer_provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>) {
    if let Some(tracer_provider) = tracer_provider {
        if let Err(err) = tracer_provider.force_flush() {
            error!("Error flushing traces: {:?}", err);
        }
        if let Err(err) = tracer_provider.shutdown() {
            error!("Error shutting down tracer provider: {:?}", err);
        }
    }
}
