//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories translate between Diesel rows and domain types. Row structs
//! (`models.rs`) and table definitions (`schema.rs`) stay inside the
//! outbound layer; the command log adapter in `outbound::broker` shares them.
//!
//! # Example
//!
//! ```no_run
//! use route_ledger::outbound::persistence::{DbPool, DieselRouteStoreRepository, PoolConfig};
//!
//! # async fn example() -> Result<(), route_ledger::outbound::persistence::PoolError> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/routes")).await?;
//! let repo = DieselRouteStoreRepository::new(pool);
//! # Ok(())
//! # }
//! ```

pub(crate) mod diesel_error_mapping;
mod diesel_route_store_repository;
pub(crate) mod models;
mod pool;
pub(crate) mod schema;

pub use diesel_route_store_repository::DieselRouteStoreRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
