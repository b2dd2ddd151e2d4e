//! HTTP service entry-point: route store reads and command publishing.

mod server;

use std::net::SocketAddr;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};

use route_ledger::inbound::http::health::HealthState;
use route_ledger::outbound::persistence::{DbPool, PoolConfig};
use route_ledger::settings::AppSettings;
use route_ledger::telemetry::init_tracing;
use server::{ServerConfig, create_server};

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let settings =
        AppSettings::load().map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let bind_addr: SocketAddr = settings
        .bind_address()
        .parse()
        .wrap_err_with(|| format!("invalid bind address {}", settings.bind_address()))?;

    let pool = DbPool::new(PoolConfig::from_settings(&settings))
        .await
        .map_err(|err| eyre!("failed to build database pool: {err}"))?;
    let config = ServerConfig::new(bind_addr, settings.broker_topic()).with_db_pool(pool);

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)
        .wrap_err_with(|| format!("failed to bind {bind_addr}"))?;
    info!(%bind_addr, topic = settings.broker_topic(), "route ledger HTTP service listening");

    let handle = server.handle();
    let shutdown_health = health_state.clone();
    actix_web::rt::spawn(async move {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "failed to listen for shutdown signal");
            return;
        }
        shutdown_health.mark_unhealthy();
        info!("shutdown requested; draining connections");
        handle.stop(true).await;
    });

    server.await.wrap_err("HTTP server failed")
}
