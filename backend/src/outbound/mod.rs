//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL route store using Diesel.
//! - **broker**: command log in PostgreSQL, plus an in-process broker.
//! - **memory**: in-process route store with the same constraints.
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod broker;
pub mod memory;
pub mod persistence;
