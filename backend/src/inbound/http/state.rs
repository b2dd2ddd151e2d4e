//! Shared HTTP adapter state.
//!
//! Handlers receive this through `actix_web::web::Data` and only see domain
//! ports, so they stay testable without a store or broker.

use std::sync::Arc;

use crate::domain::ports::{
    CommandPublisher, FixtureCommandPublisher, FixtureRouteCatalogQuery, RouteCatalogQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub catalog: Arc<dyn RouteCatalogQuery>,
    pub commands: Arc<dyn CommandPublisher>,
}

impl HttpState {
    pub fn new(catalog: Arc<dyn RouteCatalogQuery>, commands: Arc<dyn CommandPublisher>) -> Self {
        Self { catalog, commands }
    }
}

impl Default for HttpState {
    /// State with no users, no routes and a publisher that drops commands.
    fn default() -> Self {
        Self::new(
            Arc::new(FixtureRouteCatalogQuery),
            Arc::new(FixtureCommandPublisher),
        )
    }
}
