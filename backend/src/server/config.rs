//! HTTP server configuration object.

use std::net::SocketAddr;

use route_ledger::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) broker_topic: String,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(bind_addr: SocketAddr, broker_topic: impl Into<String>) -> Self {
        Self {
            bind_addr,
            broker_topic: broker_topic.into(),
            db_pool: None,
        }
    }

    /// Attach the pool backing the route store reads and the command log.
    ///
    /// Without a pool the server answers reads from empty fixtures and drops
    /// published commands.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}
