mod actors;
mod api;
mod config;
mod errors;
mod policies;
mod repository;

use actix::prelude::*;
use actix_web::{web::Data, App, HttpServer};
use actors::state_store::StateStore;
use api::routes::configure;
use config::AppConfig;
use repository::Repository;
use tokio::sync::RwLock;
use tracing::{error, info};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    let state_store = StateStore::new(config.state_store).start();
    let mut repository = Repository::new(config.experiment, state_store);
    if let Err(err) = repository.load_experiments().await {
        error!(error = %err, "Failed to load experiments from state store");
    }
    let repository = Data::new(RwLock::new(repository));

    info!(host = %config.server.host, port = %config.server.port, "Starting server");
    let app_repository = repository.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(app_repository.clone())
            .wrap(TracingLogger::default())
            .configure(configure)
    })
    .bind((config.server.host, config.server.port))?
    .run()
    .await?;

    info!("Flushing experiments before shutdown");
    if let Err(err) = repository.read().await.flush().await {
        error!(error = %err, "Failed to flush experiments on shutdown");
    }

    Ok(())
}
