//! Command processor: consumes route-store commands from the broker and
//! applies them to the store, one at a time.

use std::sync::Arc;

use color_eyre::eyre::{Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio::sync::watch;
use tracing::{info, warn};

use route_ledger::domain::{CommandDispatcher, RouteCommandHandler};
use route_ledger::outbound::broker::DieselCommandConsumer;
use route_ledger::outbound::persistence::{DbPool, DieselRouteStoreRepository, PoolConfig};
use route_ledger::settings::AppSettings;
use route_ledger::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let settings =
        AppSettings::load().map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let pool = DbPool::new(PoolConfig::from_settings(&settings))
        .await
        .map_err(|err| eyre!("failed to build database pool: {err}"))?;

    let clock = Arc::new(DefaultClock);
    let source = Arc::new(DieselCommandConsumer::new(
        settings.database_url(),
        clock.clone(),
        settings.broker_topic(),
        settings.consumer_group(),
        settings.poll_interval(),
    ));
    let handler = RouteCommandHandler::new(
        Arc::new(DieselRouteStoreRepository::new(pool)),
        clock,
    );
    let dispatcher = CommandDispatcher::new(source, handler, settings.poll_retry_delay());

    info!(
        topic = settings.broker_topic(),
        consumer_group = settings.consumer_group(),
        "command processor started"
    );
    let (stop, shutdown) = watch::channel(false);
    let run = dispatcher.run(shutdown);
    tokio::pin!(run);
    tokio::select! {
        () = &mut run => return Err(eyre!("command dispatcher stopped unexpectedly")),
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(|err| eyre!("failed to listen for shutdown signal: {err}"))?;
        }
    }

    info!("shutdown requested; finishing the current message");
    if stop.send(true).is_err() {
        warn!("command dispatcher already stopped");
    }
    run.await;
    Ok(())
}
