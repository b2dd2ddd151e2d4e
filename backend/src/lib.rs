//! Route ledger library: user and route store with a command-driven write
//! path.
//!
//! Reads go straight to the store through [`domain::RouteCatalogService`].
//! Writes are published as [`domain::Command`]s, consumed by
//! [`domain::CommandDispatcher`] and applied by
//! [`domain::RouteCommandHandler`].

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
pub mod telemetry;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::{Trace, TraceId};
