//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod command_broker;
mod command_publisher;
mod route_catalog_query;
mod route_store_repository;

#[cfg(test)]
pub use command_broker::{MockCommandBroker, MockCommandSource};
pub use command_broker::{BrokerError, BrokerMessage, CommandBroker, CommandSource, Delivery};
#[cfg(test)]
pub use command_publisher::MockCommandPublisher;
pub use command_publisher::{CommandPublisher, FixtureCommandPublisher};
#[cfg(test)]
pub use route_catalog_query::MockRouteCatalogQuery;
pub use route_catalog_query::{FixtureRouteCatalogQuery, RouteCatalogQuery};
#[cfg(test)]
pub use route_store_repository::MockRouteStoreRepository;
pub use route_store_repository::{
    RouteStorePersistenceError, RouteStoreRepository, UserInsertOutcome,
};
