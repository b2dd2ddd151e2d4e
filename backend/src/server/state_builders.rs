//! Builds the HTTP handler state from the server configuration.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;

use route_ledger::domain::ports::{
    CommandPublisher, FixtureCommandPublisher, FixtureRouteCatalogQuery, RouteCatalogQuery,
};
use route_ledger::domain::{CommandEncoder, RouteCatalogService};
use route_ledger::inbound::http::state::HttpState;
use route_ledger::outbound::broker::DieselCommandLog;
use route_ledger::outbound::persistence::DieselRouteStoreRepository;

use super::ServerConfig;

/// Wire the read service and command publisher.
///
/// Both are backed by the pool when one is configured, otherwise by fixtures.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let (catalog, commands): (Arc<dyn RouteCatalogQuery>, Arc<dyn CommandPublisher>) =
        match &config.db_pool {
            Some(pool) => {
                let store = Arc::new(DieselRouteStoreRepository::new(pool.clone()));
                let log = Arc::new(DieselCommandLog::new(
                    pool.clone(),
                    Arc::new(DefaultClock),
                ));
                (
                    Arc::new(RouteCatalogService::new(store)),
                    Arc::new(CommandEncoder::new(log, config.broker_topic.clone())),
                )
            }
            None => (
                Arc::new(FixtureRouteCatalogQuery),
                Arc::new(FixtureCommandPublisher),
            ),
        };
    web::Data::new(HttpState::new(catalog, commands))
}
