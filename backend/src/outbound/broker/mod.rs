//! Broker adapters for the command pipeline.

mod diesel_command_log;
mod in_memory;

pub use diesel_command_log::{DieselCommandConsumer, DieselCommandLog};
pub use in_memory::{InMemoryCommandBroker, InMemoryCommandConsumer};
